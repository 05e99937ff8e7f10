//! SNOMED CT Description type.

use chrono::NaiveDate;

use crate::{CaseSignificance, DescriptionType, SctId};

/// A SNOMED CT description, versioned by effective time.
///
/// Represents the latest observed row for a description identifier from
/// `sct2_Description_*.txt` or `sct2_TextDefinition_*.txt` files; text
/// definitions share the description column layout and carry the
/// Definition type id.
///
/// # Examples
///
/// ```
/// use sct_types::{Description, DescriptionType};
/// use chrono::NaiveDate;
///
/// let description = Description {
///     id: 754786011,
///     effective_time: NaiveDate::from_ymd_opt(2002, 1, 31).unwrap(),
///     active: true,
///     module_id: 900000000000207008,
///     concept_id: 73211009,
///     language_code: "en".to_string(),
///     type_id: 900000000000003001, // FSN
///     term: "Diabetes mellitus (disorder)".to_string(),
///     case_significance_id: 900000000000448009,
/// };
///
/// assert!(description.is_fsn());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Description {
    /// Unique identifier for this description (SCTID).
    pub id: SctId,
    /// Effective date of this version.
    pub effective_time: NaiveDate,
    /// Whether this description is active.
    pub active: bool,
    /// The module containing this description.
    pub module_id: SctId,
    /// The concept this description belongs to.
    pub concept_id: SctId,
    /// ISO language code (e.g., "en").
    pub language_code: String,
    /// Type of description (FSN, Synonym, Definition).
    pub type_id: SctId,
    /// The description text/term.
    pub term: String,
    /// Case significance rules for this term.
    pub case_significance_id: SctId,
}

impl Description {
    /// Returns the description type enum value.
    ///
    /// Returns `None` if the type ID is not recognized.
    pub fn description_type(&self) -> Option<DescriptionType> {
        DescriptionType::from_id(self.type_id)
    }

    /// Returns true if this is a Fully Specified Name.
    pub fn is_fsn(&self) -> bool {
        self.type_id == DescriptionType::FSN_ID
    }

    /// Returns true if this is a Synonym.
    pub fn is_synonym(&self) -> bool {
        self.type_id == DescriptionType::SYNONYM_ID
    }

    /// Returns true if this is a Definition.
    pub fn is_definition(&self) -> bool {
        self.type_id == DescriptionType::DEFINITION_ID
    }

    /// Returns the case significance enum value.
    pub fn case_significance(&self) -> Option<CaseSignificance> {
        CaseSignificance::from_id(self.case_significance_id)
    }

    /// Extracts the semantic tag from an FSN term.
    ///
    /// The semantic tag is the text between the final parentheses, e.g.
    /// `"Multiple sclerosis (disorder)"` yields `"disorder"`. Returns
    /// `None` for non-FSN descriptions or terms without a tag.
    pub fn semantic_tag(&self) -> Option<&str> {
        if !self.is_fsn() {
            return None;
        }
        let start = self.term.rfind('(')?;
        let end = self.term.rfind(')')?;
        if start < end {
            Some(&self.term[start + 1..end])
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_description(type_id: SctId) -> Description {
        Description {
            id: 754786011,
            effective_time: NaiveDate::from_ymd_opt(2002, 1, 31).unwrap(),
            active: true,
            module_id: 900000000000207008,
            concept_id: 73211009,
            language_code: "en".to_string(),
            type_id,
            term: "Diabetes mellitus (disorder)".to_string(),
            case_significance_id: 900000000000448009,
        }
    }

    #[test]
    fn test_description_fsn() {
        let desc = make_description(DescriptionType::FSN_ID);
        assert!(desc.is_fsn());
        assert!(!desc.is_synonym());
        assert_eq!(desc.description_type(), Some(DescriptionType::Fsn));
    }

    #[test]
    fn test_description_synonym() {
        let desc = make_description(DescriptionType::SYNONYM_ID);
        assert!(!desc.is_fsn());
        assert!(desc.is_synonym());
    }

    #[test]
    fn test_semantic_tag() {
        let fsn = make_description(DescriptionType::FSN_ID);
        assert_eq!(fsn.semantic_tag(), Some("disorder"));

        let synonym = make_description(DescriptionType::SYNONYM_ID);
        assert_eq!(synonym.semantic_tag(), None);

        let mut untagged = make_description(DescriptionType::FSN_ID);
        untagged.term = "No tag here".to_string();
        assert_eq!(untagged.semantic_tag(), None);
    }
}
