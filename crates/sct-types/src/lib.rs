//! # sct-types
//!
//! Component types and identifier codec for SNOMED CT terminology data.
//!
//! This crate defines the data model shared by the store, import pipeline
//! and search layers: the SCTID codec (Verhoeff check digits and partition
//! decoding), the versioned component records, the tagged [`Component`]
//! variant and the pattern-reified reference set item.
//!
//! ## Features
//!
//! - `serde` (default): serialization/deserialization support via serde.
//!
//! ## Usage
//!
//! ```rust
//! use sct_types::{verhoeff, well_known, Concept, SctId};
//! use chrono::NaiveDate;
//!
//! let concept = Concept {
//!     id: 24700007,
//!     effective_time: NaiveDate::from_ymd_opt(2002, 1, 31).unwrap(),
//!     active: true,
//!     module_id: well_known::CORE_MODULE,
//!     definition_status_id: 900000000000074008,
//! };
//!
//! assert!(verhoeff::valid(concept.id));
//! let is_a: SctId = well_known::IS_A;
//! assert_eq!(is_a, 116680003);
//! ```

#![warn(missing_docs)]

mod component;
mod concept;
mod concrete;
mod description;
mod enums;
pub mod mrcm;
pub mod refset;
mod relationship;
mod sctid;
pub mod well_known;

pub use component::Component;
pub use concept::Concept;
pub use concrete::{ConcreteRelationship, ConcreteValue};
pub use description::Description;
pub use enums::{
    Acceptability, CaseSignificance, CharacteristicType, DefinitionStatus, DescriptionType,
    ModifierType,
};
pub use refset::{RefsetField, RefsetItem};
pub use relationship::Relationship;
pub use sctid::{partition, verhoeff, Partition, SctId};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_types_are_exported() {
        let _id: SctId = 73211009;
        let _status = DefinitionStatus::Primitive;
        let _desc_type = DescriptionType::Fsn;
        let _acceptability = Acceptability::Preferred;
        let _partition = Partition::Concept;
    }

    #[test]
    fn test_well_known_accessible() {
        assert_eq!(well_known::IS_A, 116680003);
        assert!(verhoeff::valid(well_known::IS_A));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_roundtrip() {
        let concept = Concept {
            id: 404684003,
            effective_time: chrono::NaiveDate::from_ymd_opt(2002, 1, 31).unwrap(),
            active: true,
            module_id: 900000000000207008,
            definition_status_id: 900000000000074008,
        };

        let json = serde_json::to_string(&concept).unwrap();
        let parsed: Concept = serde_json::from_str(&json).unwrap();
        assert_eq!(concept, parsed);
    }
}
