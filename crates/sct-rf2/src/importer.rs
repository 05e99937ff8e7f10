//! Parallel, staged RF2 import pipeline.
//!
//! A release directory is walked for importable Snapshot files, which are
//! imported in three phases: core content plus the refset descriptor
//! refset, then a store indexing pass so descriptors are reified, then
//! every remaining refset. Within a phase, files stream through N worker
//! threads over bounded channels in batches; any error cancels the
//! pipeline and surfaces a single structured failure on the caller's
//! thread.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::{bounded, Sender};
use csv::ReaderBuilder;
use rayon::prelude::*;
use sct_types::Component;

use crate::error::{Rf2Error, Rf2Result};
use crate::filename::{classify, ReleaseFile};

/// A destination for parsed component batches.
///
/// The store implements this; the importer stays storage-agnostic.
pub trait ComponentSink: Sync {
    /// Writes a batch of components, resolving version conflicts by
    /// latest effective time.
    fn write_batch(&self, batch: Vec<Component>) -> Rf2Result<()>;

    /// Rebuilds derived indices from the component tables. Called between
    /// the core and refset import phases; requires exclusive write access.
    fn index(&self) -> Rf2Result<()>;
}

/// Importer configuration.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Maximum rows per parsed batch.
    pub batch_size: usize,
    /// Worker threads per phase.
    pub workers: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            batch_size: 5000,
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
        }
    }
}

/// Counters from an import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    /// Files imported.
    pub files: usize,
    /// Components written.
    pub components: usize,
}

/// Enumerates the importable files beneath a release directory.
pub fn find_release_files(dir: &Path) -> Rf2Result<Vec<ReleaseFile>> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(dir) {
        let entry = entry.map_err(std::io::Error::other)?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(file) = classify(entry.path()) {
            if file.importable() {
                files.push(file);
            }
        }
    }
    Ok(files)
}

/// Imports a release directory into the sink, in three phases.
///
/// Phase one covers concepts, descriptions, text definitions,
/// relationships, concrete values and the refset descriptor refset; the
/// sink is then indexed so descriptors are available before phase three
/// imports every remaining refset. Callers wanting queryable derived
/// indices must run a full indexing pass afterwards.
pub fn import_release<S: ComponentSink>(
    dir: &Path,
    sink: &S,
    options: &ImportOptions,
) -> Rf2Result<ImportStats> {
    let files = find_release_files(dir)?;
    let (core, refsets): (Vec<_>, Vec<_>) = files.into_iter().partition(ReleaseFile::is_core);

    tracing::info!(
        core = core.len(),
        refsets = refsets.len(),
        dir = %dir.display(),
        "starting import"
    );

    let mut stats = import_files(&core, sink, options)?;
    sink.index()?;
    let refset_stats = import_files(&refsets, sink, options)?;

    stats.files += refset_stats.files;
    stats.components += refset_stats.components;
    tracing::info!(files = stats.files, components = stats.components, "import complete");
    Ok(stats)
}

/// Imports a set of files concurrently into the sink.
///
/// Files are distributed to worker threads over a bounded channel; each
/// worker parses batches and forwards them over a second bounded channel
/// to the caller's thread, which writes them to the sink. The first error
/// cancels the workers, drains the pipeline and is returned.
pub fn import_files<S: ComponentSink>(
    files: &[ReleaseFile],
    sink: &S,
    options: &ImportOptions,
) -> Rf2Result<ImportStats> {
    if files.is_empty() {
        return Ok(ImportStats::default());
    }

    let workers = options.workers.max(1);
    let (file_tx, file_rx) = bounded::<ReleaseFile>(files.len());
    let (batch_tx, batch_rx) = bounded::<Rf2Result<Vec<Component>>>(workers * 2);
    let cancelled = AtomicBool::new(false);

    for file in files {
        // Capacity equals the file count, so sends cannot block.
        let _ = file_tx.send(file.clone());
    }
    drop(file_tx);

    let mut stats = ImportStats {
        files: files.len(),
        components: 0,
    };

    std::thread::scope(|scope| {
        for _ in 0..workers {
            let file_rx = file_rx.clone();
            let batch_tx = batch_tx.clone();
            let cancelled = &cancelled;
            let batch_size = options.batch_size;
            scope.spawn(move || {
                while let Ok(file) = file_rx.recv() {
                    if cancelled.load(Ordering::Relaxed) {
                        break;
                    }
                    if !stream_file(&file, batch_size, &batch_tx, cancelled) {
                        break;
                    }
                }
            });
        }
        drop(batch_tx);

        let mut first_error: Option<Rf2Error> = None;
        for result in batch_rx.iter() {
            match result {
                Ok(batch) if first_error.is_none() => {
                    stats.components += batch.len();
                    if let Err(e) = sink.write_batch(batch) {
                        cancelled.store(true, Ordering::Relaxed);
                        first_error = Some(e);
                    }
                }
                Ok(_) => {} // draining after failure
                Err(e) => {
                    cancelled.store(true, Ordering::Relaxed);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(stats),
        }
    })
}

/// Streams one file as parsed batches. Returns false when the worker
/// should stop (cancellation or a closed downstream channel).
fn stream_file(
    file: &ReleaseFile,
    batch_size: usize,
    batch_tx: &Sender<Rf2Result<Vec<Component>>>,
    cancelled: &AtomicBool,
) -> bool {
    tracing::debug!(file = %file.filename, "parsing");

    let reader = match ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .from_path(&file.path)
    {
        Ok(reader) => reader,
        Err(e) => {
            let _ = batch_tx.send(Err(e.into()));
            return false;
        }
    };

    let mut raw: Vec<(u64, csv::StringRecord)> = Vec::with_capacity(batch_size);
    let mut line: u64 = 0;
    for record in reader.into_records() {
        line += 1;
        match record {
            Ok(record) => {
                if record.iter().all(|f| f.trim().is_empty()) {
                    continue;
                }
                raw.push((line, record));
            }
            Err(e) => {
                let _ = batch_tx.send(Err(e.into()));
                return false;
            }
        }
        if raw.len() >= batch_size {
            if cancelled.load(Ordering::Relaxed) {
                return false;
            }
            if !flush_batch(file, std::mem::take(&mut raw), batch_tx) {
                return false;
            }
            raw = Vec::with_capacity(batch_size);
        }
    }
    if !raw.is_empty() {
        return flush_batch(file, raw, batch_tx);
    }
    true
}

/// Parses a raw batch in parallel and forwards the outcome.
fn flush_batch(
    file: &ReleaseFile,
    raw: Vec<(u64, csv::StringRecord)>,
    batch_tx: &Sender<Rf2Result<Vec<Component>>>,
) -> bool {
    let parsed: Rf2Result<Vec<Component>> = raw
        .par_iter()
        .map(|(line, record)| {
            crate::records::parse_row(&file.kind, record).map_err(|cause| Rf2Error::Parse {
                file: file.filename.clone(),
                line: *line,
                cause,
            })
        })
        .collect();

    let failed = parsed.is_err();
    if batch_tx.send(parsed).is_err() {
        return false; // consumer gone; treat as cancellation
    }
    !failed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    /// Collects batches in memory for pipeline tests.
    #[derive(Default)]
    struct VecSink {
        batches: Mutex<Vec<Vec<Component>>>,
        indexed: AtomicBool,
    }

    impl ComponentSink for VecSink {
        fn write_batch(&self, batch: Vec<Component>) -> Rf2Result<()> {
            self.batches.lock().unwrap().push(batch);
            Ok(())
        }

        fn index(&self) -> Rf2Result<()> {
            self.indexed.store(true, Ordering::Relaxed);
            Ok(())
        }
    }

    /// Fails every write, to exercise cancellation.
    struct FailingSink;

    impl ComponentSink for FailingSink {
        fn write_batch(&self, _batch: Vec<Component>) -> Rf2Result<()> {
            Err(Rf2Error::Sink {
                message: "disk full".to_string(),
            })
        }

        fn index(&self) -> Rf2Result<()> {
            Ok(())
        }
    }

    fn write_file(dir: &Path, name: &str, content: &str) {
        let mut f = std::fs::File::create(dir.join(name)).unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }

    const CONCEPT_HEADER: &str = "id\teffectiveTime\tactive\tmoduleId\tdefinitionStatusId\n";

    #[test]
    fn test_import_release_runs_phases() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "sct2_Concept_Snapshot_INT_20230131.txt",
            &format!(
                "{}24700007\t20020131\t1\t900000000000207008\t900000000000074008\n\
                 6118003\t20020131\t1\t900000000000207008\t900000000000074008\n",
                CONCEPT_HEADER
            ),
        );
        write_file(
            dir.path(),
            "der2_Refset_SimpleSnapshot_INT_20230131.txt",
            "id\teffectiveTime\tactive\tmoduleId\trefsetId\treferencedComponentId\n\
             80000517-8513-5ca0-a44c-dc66f3c3a1c6\t20200101\t1\t900000000000207008\t991411000000109\t24700007\n",
        );
        // Non-importable noise.
        write_file(dir.path(), "readme.txt", "hello\n");

        let sink = VecSink::default();
        let stats = import_release(dir.path(), &sink, &ImportOptions::default()).unwrap();

        assert_eq!(stats.files, 2);
        assert_eq!(stats.components, 3);
        assert!(sink.indexed.load(Ordering::Relaxed));

        let batches = sink.batches.lock().unwrap();
        let total: usize = batches.iter().map(Vec::len).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn test_parse_error_aborts_import() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "sct2_Concept_Snapshot_INT_20230131.txt",
            &format!("{}notanid\t20020131\t1\t900000000000207008\t900000000000074008\n", CONCEPT_HEADER),
        );

        let sink = VecSink::default();
        let err = import_release(dir.path(), &sink, &ImportOptions::default()).unwrap_err();
        match err {
            Rf2Error::Parse { file, line, .. } => {
                assert_eq!(file, "sct2_Concept_Snapshot_INT_20230131.txt");
                assert_eq!(line, 1);
            }
            other => panic!("expected parse error, got {other}"),
        }
    }

    #[test]
    fn test_sink_error_cancels_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "sct2_Concept_Snapshot_INT_20230131.txt",
            &format!(
                "{}24700007\t20020131\t1\t900000000000207008\t900000000000074008\n",
                CONCEPT_HEADER
            ),
        );

        let err = import_release(dir.path(), &FailingSink, &ImportOptions::default()).unwrap_err();
        assert!(matches!(err, Rf2Error::Sink { .. }));
    }

    #[test]
    fn test_empty_directory_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let sink = VecSink::default();
        let stats = import_release(dir.path(), &sink, &ImportOptions::default()).unwrap();
        assert_eq!(stats, ImportStats { files: 0, components: 0 });
    }

    #[test]
    fn test_batching_splits_large_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut content = String::from(CONCEPT_HEADER);
        for i in 0..25 {
            // Synthetic ids; the importer does not validate check digits.
            content.push_str(&format!(
                "{}\t20020131\t1\t900000000000207008\t900000000000074008\n",
                1000 + i
            ));
        }
        write_file(dir.path(), "sct2_Concept_Snapshot_INT_20230131.txt", &content);

        let sink = VecSink::default();
        let options = ImportOptions {
            batch_size: 10,
            workers: 2,
        };
        let stats = import_release(dir.path(), &sink, &options).unwrap();
        assert_eq!(stats.components, 25);

        let batches = sink.batches.lock().unwrap();
        assert!(batches.len() >= 3);
        assert!(batches.iter().all(|b| b.len() <= 10));
    }
}
