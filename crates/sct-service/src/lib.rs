//! # sct-service
//!
//! The terminology service facade: a read-optimised SNOMED CT database
//! built from RF2 release files, bound together by a manifest, answering
//! concept lookup, subsumption, transitive walks, preferred terms by
//! locale, historical expansion, free-text and ECL search, and reverse
//! maps from external code systems.
//!
//! ## Usage
//!
//! ```ignore
//! use sct_service::{create_service, Service, ServiceOptions};
//!
//! // One-shot build from a downloaded distribution.
//! create_service(&db_root, &[&release_dir], Some("en-GB"))?;
//!
//! let service = Service::open(&db_root, &ServiceOptions::default())?;
//! let ms = service.preferred_synonym(24700007, "en-GB", true)?;
//! assert_eq!(ms.unwrap().term, "Multiple sclerosis");
//!
//! let demyelinating = service.expand_ecl("<< 6118003", None)?;
//! assert!(demyelinating.contains(&24700007));
//! ```

#![warn(missing_docs)]

mod admin;
mod ecl;
mod error;
mod history;
mod indexer;
mod locale;
mod manifest;
mod mapping;
mod modules;
mod service;

pub use admin::{compact, create_service, import_snomed, index};
pub use error::{ServiceError, ServiceResult};
pub use history::HistoryProfile;
pub use locale::LocaleResolver;
pub use manifest::{Manifest, MANIFEST_VERSION};
pub use mapping::MapTarget;
pub use modules::ModuleDependency;
pub use service::{
    ExtendedConcept, SearchRequest, Service, ServiceOptions, Status, StatusOptions,
};

// Re-exports for callers assembling requests.
pub use sct_rf2::ImportOptions;
pub use sct_search::{SearchHit, SearchParams};
