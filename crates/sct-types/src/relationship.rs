//! SNOMED CT Relationship type.

use chrono::NaiveDate;

use crate::{well_known, CharacteristicType, ModifierType, SctId};

/// A SNOMED CT relationship: a typed directed edge between two concepts.
///
/// Represents the latest observed row for a relationship identifier from
/// `sct2_Relationship_*.txt` files in an RF2 release.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Relationship {
    /// Unique identifier for this relationship (SCTID).
    pub id: SctId,
    /// Effective date of this version.
    pub effective_time: NaiveDate,
    /// Whether this relationship is active.
    pub active: bool,
    /// The module containing this relationship.
    pub module_id: SctId,
    /// Source concept of the edge.
    pub source_id: SctId,
    /// Destination concept of the edge.
    pub destination_id: SctId,
    /// Relationship group; 0 means ungrouped.
    pub relationship_group: u32,
    /// Type of the edge (e.g. IS_A, finding site).
    pub type_id: SctId,
    /// Stated, inferred or additional.
    pub characteristic_type_id: SctId,
    /// Existential or universal quantification.
    pub modifier_id: SctId,
}

impl Relationship {
    /// Returns true if this is an IS_A (taxonomic) relationship.
    pub fn is_a(&self) -> bool {
        self.type_id == well_known::IS_A
    }

    /// Returns the characteristic type enum value.
    pub fn characteristic_type(&self) -> Option<CharacteristicType> {
        CharacteristicType::from_id(self.characteristic_type_id)
    }

    /// Returns the modifier enum value.
    pub fn modifier(&self) -> Option<ModifierType> {
        ModifierType::from_id(self.modifier_id)
    }

    /// Returns true if this relationship is grouped (group > 0).
    pub fn is_grouped(&self) -> bool {
        self.relationship_group > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_relationship(type_id: SctId, group: u32) -> Relationship {
        Relationship {
            id: 3187444026,
            effective_time: NaiveDate::from_ymd_opt(2002, 1, 31).unwrap(),
            active: true,
            module_id: 900000000000207008,
            source_id: 24700007,
            destination_id: 6118003,
            relationship_group: group,
            type_id,
            characteristic_type_id: CharacteristicType::INFERRED_ID,
            modifier_id: ModifierType::EXISTENTIAL_ID,
        }
    }

    #[test]
    fn test_is_a_relationship() {
        let rel = make_relationship(well_known::IS_A, 0);
        assert!(rel.is_a());
        assert!(!rel.is_grouped());
        assert_eq!(
            rel.characteristic_type(),
            Some(CharacteristicType::Inferred)
        );
    }

    #[test]
    fn test_grouped_attribute() {
        let rel = make_relationship(well_known::FINDING_SITE, 1);
        assert!(!rel.is_a());
        assert!(rel.is_grouped());
    }
}
