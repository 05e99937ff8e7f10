//! SNOMED CT Concept type.

use chrono::NaiveDate;

use crate::{DefinitionStatus, SctId};

/// A SNOMED CT concept, versioned by effective time.
///
/// Represents the latest observed row for a concept identifier from
/// `sct2_Concept_*.txt` files in an RF2 release.
///
/// # Examples
///
/// ```
/// use sct_types::{Concept, DefinitionStatus};
/// use chrono::NaiveDate;
///
/// let concept = Concept {
///     id: 73211009,
///     effective_time: NaiveDate::from_ymd_opt(2002, 1, 31).unwrap(),
///     active: true,
///     module_id: 900000000000207008,
///     definition_status_id: 900000000000074008, // Primitive
/// };
///
/// assert!(concept.is_primitive());
/// assert!(!concept.is_fully_defined());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Concept {
    /// Unique identifier for this concept (SCTID).
    pub id: SctId,
    /// Effective date of this version.
    pub effective_time: NaiveDate,
    /// Whether this concept is active (true) or inactive (false).
    pub active: bool,
    /// The module containing this concept.
    pub module_id: SctId,
    /// Whether this concept is primitive or fully defined.
    pub definition_status_id: SctId,
}

impl Concept {
    /// Returns the definition status enum value.
    ///
    /// Returns `None` if the definition status ID is not recognized.
    pub fn definition_status(&self) -> Option<DefinitionStatus> {
        DefinitionStatus::from_id(self.definition_status_id)
    }

    /// Returns true if this concept is primitively defined.
    pub fn is_primitive(&self) -> bool {
        self.definition_status_id == DefinitionStatus::PRIMITIVE_ID
    }

    /// Returns true if this concept is fully defined.
    pub fn is_fully_defined(&self) -> bool {
        self.definition_status_id == DefinitionStatus::FULLY_DEFINED_ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_concept_helpers() {
        let concept = Concept {
            id: 404684003,
            effective_time: date(2002, 1, 31),
            active: true,
            module_id: 900000000000207008,
            definition_status_id: 900000000000074008,
        };

        assert!(concept.is_primitive());
        assert!(!concept.is_fully_defined());
        assert_eq!(
            concept.definition_status(),
            Some(DefinitionStatus::Primitive)
        );
    }

    #[test]
    fn test_fully_defined_concept() {
        let concept = Concept {
            id: 73211009,
            effective_time: date(2002, 1, 31),
            active: true,
            module_id: 900000000000207008,
            definition_status_id: DefinitionStatus::FULLY_DEFINED_ID,
        };

        assert!(!concept.is_primitive());
        assert!(concept.is_fully_defined());
    }
}
