//! Administration: import, indexing, compaction and the one-shot
//! create-service pipeline. These run against the database directory
//! with exclusive write access; they never share a directory with an
//! open query service.

use std::path::Path;

use sct_rf2::{ComponentSink, ImportOptions, ImportStats, Rf2Error, Rf2Result};
use sct_store::{Store, StoreOptions};
use sct_types::Component;

use crate::error::ServiceResult;
use crate::indexer;
use crate::locale::LocaleResolver;
use crate::manifest::Manifest;

/// Adapts the store to the importer's sink seam.
struct StoreSink<'a> {
    store: &'a Store,
}

impl ComponentSink for StoreSink<'_> {
    fn write_batch(&self, batch: Vec<Component>) -> Rf2Result<()> {
        self.store
            .write_components(&batch)
            .map_err(|e| Rf2Error::Sink {
                message: e.to_string(),
            })
    }

    fn index(&self) -> Rf2Result<()> {
        self.store.index().map_err(|e| Rf2Error::Sink {
            message: e.to_string(),
        })
    }
}

fn read_manifest_or_default(root: &Path) -> Manifest {
    Manifest::read(root).unwrap_or_default()
}

/// Imports one or more RF2 release directories into the database at
/// `root`, creating it on first import. Derived store indices are left
/// ready; run [`index`] afterwards to (re)build the search indices.
pub fn import_snomed(
    root: &Path,
    release_dirs: &[&Path],
    options: &ImportOptions,
) -> ServiceResult<ImportStats> {
    let manifest = read_manifest_or_default(root);
    std::fs::create_dir_all(root)?;

    let store = Store::open(&root.join(&manifest.store), &StoreOptions::default())?;
    let sink = StoreSink { store: &store };

    let mut total = ImportStats::default();
    for dir in release_dirs {
        for metadata in sct_rf2::find_metadata(dir) {
            tracing::info!(
                name = metadata.name.as_deref().unwrap_or("unknown"),
                effective_time = metadata.effective_time.as_deref().unwrap_or("unknown"),
                "release package"
            );
        }
        let stats = sct_rf2::import_release(dir, &sink, options)?;
        total.files += stats.files;
        total.components += stats.components;
    }
    store.index()?;

    manifest.write(root)?;
    Ok(total)
}

/// Rebuilds the store's derived indices and both search indices.
///
/// Idempotent: rebuilding over an unchanged store produces indices with
/// identical content. `locale` sets the language priority used to store
/// preferred terms in the description index.
pub fn index(root: &Path, locale: Option<&str>) -> ServiceResult<()> {
    let manifest = read_manifest_or_default(root);
    let store = Store::open(&root.join(&manifest.store), &StoreOptions::default())?;
    store.index()?;

    let installed_locales: Vec<_> = store
        .installed_refsets()?
        .into_iter()
        .filter(|refset| sct_types::well_known::is_language_refset(*refset))
        .collect();
    let resolver = LocaleResolver::new(installed_locales, locale);
    let priority = resolver.default_refsets().to_vec();

    indexer::build_description_index(&store, &root.join(&manifest.search), &resolver, &priority)?;
    indexer::build_members_index(&store, &root.join(&manifest.members))?;

    manifest.write(root)?;
    Ok(())
}

/// Compacts the store database in place. Requires exclusive access.
pub fn compact(root: &Path) -> ServiceResult<()> {
    let manifest = read_manifest_or_default(root);
    Store::compact(&root.join(&manifest.store), &StoreOptions::default())?;
    Ok(())
}

/// One-shot pipeline: import the release directories, then build every
/// index, leaving a database ready to open.
pub fn create_service(
    root: &Path,
    import_from: &[&Path],
    locale: Option<&str>,
) -> ServiceResult<ImportStats> {
    let stats = import_snomed(root, import_from, &ImportOptions::default())?;
    index(root, locale)?;
    Ok(stats)
}
