//! # sct-rf2
//!
//! RF2 release file classification, typed row parsing and the parallel
//! import pipeline.
//!
//! Release files are classified purely by filename (a single grammar);
//! rows are decoded per component kind, with refset extension columns
//! reified from the filename pattern; and a release directory imports in
//! three phases through bounded channels and worker threads into any
//! [`ComponentSink`].
//!
//! ## Usage
//!
//! ```ignore
//! use sct_rf2::{import_release, ImportOptions};
//!
//! let stats = import_release(release_dir, &store, &ImportOptions::default())?;
//! tracing::info!(components = stats.components, "imported");
//! ```

#![warn(missing_docs)]

mod error;
mod filename;
mod importer;
mod metadata;
mod records;

pub use error::{Rf2Error, Rf2Result, RowError};
pub use filename::{classify, ContentKind, ReleaseFile, ReleaseType};
pub use importer::{
    find_release_files, import_files, import_release, ComponentSink, ImportOptions, ImportStats,
};
pub use metadata::{find_metadata, ReleaseMetadata};
pub use records::{parse, parse_refset_item, parse_row};

// Re-export sct-types for convenience
pub use sct_types;
