//! # sct-search
//!
//! Inverted indices over SNOMED CT content: the description text index
//! with length-boosted ranking, and the refset members index with typed
//! pattern columns. Both are tantivy directories; writers are
//! single-writer per index, searchers are shareable across threads.
//!
//! Documents arrive pre-resolved (closures, memberships, preferred
//! terms), so this crate never touches the component store.

#![warn(missing_docs)]

mod descriptions;
mod error;
mod members;

pub use descriptions::{
    DescriptionDoc, DescriptionIndex, DescriptionSearcher, DescriptionWriter, SearchHit,
    SearchParams, DEFAULT_MAX_HITS,
};
pub use error::{SearchError, SearchResult};
pub use members::{
    MemberColumn, MemberDoc, MemberValue, MembersIndex, MembersSearcher, MembersWriter,
};

// Re-export the query type used at the seam with ECL compilation.
pub use tantivy::query::Query;
