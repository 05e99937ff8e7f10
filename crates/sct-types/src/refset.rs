//! SNOMED CT reference set item type.
//!
//! All reference sets share a fixed six-column prefix and extend it with
//! pattern-specific columns. Rather than one struct per refset shape, an
//! item carries its extra columns as reified [`RefsetField`] values decoded
//! from the release filename pattern (`c` concept reference, `i` 32-bit
//! integer, `s` string). Typed accessors expose the well-known shapes.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::SctId;

/// One decoded extension column of a reference set item.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RefsetField {
    /// A concept reference (`c` pattern column).
    Concept(SctId),
    /// A 32-bit signed integer (`i` pattern column).
    Integer(i32),
    /// A raw string (`s` pattern column).
    String(String),
}

impl RefsetField {
    /// Returns the concept id if this is a concept-reference field.
    pub fn as_concept(&self) -> Option<SctId> {
        match self {
            Self::Concept(id) => Some(*id),
            _ => None,
        }
    }

    /// Returns the integer value if this is an integer field.
    pub fn as_integer(&self) -> Option<i32> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string value if this is a string field.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the pattern character for this field.
    pub fn pattern_char(&self) -> char {
        match self {
            Self::Concept(_) => 'c',
            Self::Integer(_) => 'i',
            Self::String(_) => 's',
        }
    }
}

/// A reference set item: the six-column prefix plus pattern-reified fields.
///
/// # Examples
///
/// ```
/// use sct_types::{RefsetField, RefsetItem};
/// use chrono::NaiveDate;
/// use uuid::Uuid;
///
/// // A language refset item marking a description as preferred.
/// let item = RefsetItem {
///     id: Uuid::nil(),
///     effective_time: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
///     active: true,
///     module_id: 900000000000207008,
///     refset_id: 900000000000508004, // GB English
///     referenced_component_id: 754786011,
///     fields: vec![RefsetField::Concept(900000000000548007)],
/// };
///
/// assert_eq!(item.pattern(), "c");
/// assert_eq!(item.acceptability_id(), Some(900000000000548007));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RefsetItem {
    /// Unique identifier for this item (UUID).
    pub id: Uuid,
    /// Effective date of this version.
    pub effective_time: NaiveDate,
    /// Whether this membership is currently active.
    pub active: bool,
    /// Module this item belongs to.
    pub module_id: SctId,
    /// The reference set this item belongs to.
    pub refset_id: SctId,
    /// The component this item references.
    pub referenced_component_id: SctId,
    /// Extension columns, in file order.
    pub fields: Vec<RefsetField>,
}

impl RefsetItem {
    /// Returns the pattern string of the extension columns, e.g. `"iissscc"`.
    pub fn pattern(&self) -> String {
        self.fields.iter().map(RefsetField::pattern_char).collect()
    }

    /// Association refsets: the target component (first `c` column).
    pub fn target_component_id(&self) -> Option<SctId> {
        self.fields.first()?.as_concept()
    }

    /// Language refsets: the acceptability concept (first `c` column).
    pub fn acceptability_id(&self) -> Option<SctId> {
        self.fields.first()?.as_concept()
    }

    /// Attribute-value refsets: the value concept (first `c` column).
    pub fn value_id(&self) -> Option<SctId> {
        self.fields.first()?.as_concept()
    }

    /// OWL expression refsets: the expression text (first `s` column).
    pub fn owl_expression(&self) -> Option<&str> {
        self.fields.first()?.as_str()
    }

    /// Map refsets: the map target code.
    ///
    /// The target is the sole `s` column of a simple map, or the fifth
    /// column of a complex/extended map.
    pub fn map_target(&self) -> Option<&str> {
        match self.fields.len() {
            1 => self.fields[0].as_str(),
            n if n >= 6 => self.fields[4].as_str(),
            _ => None,
        }
    }

    /// Complex/extended map refsets: the map group.
    pub fn map_group(&self) -> Option<i32> {
        self.fields.first()?.as_integer()
    }

    /// Complex/extended map refsets: the map priority.
    pub fn map_priority(&self) -> Option<i32> {
        self.fields.get(1)?.as_integer()
    }

    /// Complex/extended map refsets: the map rule.
    pub fn map_rule(&self) -> Option<&str> {
        self.fields.get(2)?.as_str()
    }

    /// Complex/extended map refsets: the map advice.
    pub fn map_advice(&self) -> Option<&str> {
        self.fields.get(3)?.as_str()
    }

    /// Complex/extended map refsets: the correlation concept.
    pub fn correlation_id(&self) -> Option<SctId> {
        self.fields.get(5)?.as_concept()
    }

    /// Extended map refsets: the map category concept.
    pub fn map_category_id(&self) -> Option<SctId> {
        self.fields.get(6)?.as_concept()
    }

    /// Refset descriptor refsets: the attribute description concept.
    pub fn attribute_description_id(&self) -> Option<SctId> {
        self.fields.first()?.as_concept()
    }

    /// Refset descriptor refsets: the attribute type concept.
    pub fn attribute_type_id(&self) -> Option<SctId> {
        self.fields.get(1)?.as_concept()
    }

    /// Refset descriptor refsets: the attribute order.
    pub fn attribute_order(&self) -> Option<i32> {
        self.fields.get(2)?.as_integer()
    }

    /// Module dependency refsets: the source module version.
    pub fn source_effective_time(&self) -> Option<NaiveDate> {
        parse_basic_iso(self.fields.first()?.as_str()?)
    }

    /// Module dependency refsets: the required target module version.
    pub fn target_effective_time(&self) -> Option<NaiveDate> {
        parse_basic_iso(self.fields.get(1)?.as_str()?)
    }
}

fn parse_basic_iso(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y%m%d").ok()
}

/// Returns the RF2 column names for a refset's extension fields.
///
/// Well-known refset identifiers take their published column names;
/// otherwise the common shapes are named by pattern and anything else
/// falls back to `field0..fieldN`.
pub fn field_names(pattern: &str, refset_id: SctId) -> Vec<String> {
    use crate::well_known;

    let named: Option<&[&str]> = match refset_id {
        id if well_known::is_historical_association(id) => Some(&["targetComponentId"]),
        well_known::OWL_AXIOM_REFSET | well_known::OWL_ONTOLOGY_REFSET => {
            Some(&["owlExpression"])
        }
        well_known::REFSET_DESCRIPTOR_REFSET => Some(&[
            "attributeDescriptionId",
            "attributeTypeId",
            "attributeOrder",
        ]),
        well_known::MODULE_DEPENDENCY_REFSET => {
            Some(&["sourceEffectiveTime", "targetEffectiveTime"])
        }
        _ => None,
    };
    if let Some(names) = named {
        return names.iter().map(|s| s.to_string()).collect();
    }

    let by_pattern: Option<&[&str]> = match pattern {
        "" => Some(&[]),
        // Language refsets dominate the single-`c` shape.
        "c" if well_known::is_language_refset(refset_id) => Some(&["acceptabilityId"]),
        "c" => Some(&["valueId"]),
        "s" => Some(&["mapTarget"]),
        "ss" => Some(&["sourceEffectiveTime", "targetEffectiveTime"]),
        "cci" => Some(&[
            "attributeDescriptionId",
            "attributeTypeId",
            "attributeOrder",
        ]),
        "iisssc" => Some(&[
            "mapGroup",
            "mapPriority",
            "mapRule",
            "mapAdvice",
            "mapTarget",
            "correlationId",
        ]),
        "iissscc" => Some(&[
            "mapGroup",
            "mapPriority",
            "mapRule",
            "mapAdvice",
            "mapTarget",
            "correlationId",
            "mapCategoryId",
        ]),
        "sscc" => Some(&[
            "rangeConstraint",
            "attributeRule",
            "ruleStrengthId",
            "contentTypeId",
        ]),
        "cisscc" => Some(&[
            "domainId",
            "grouped",
            "attributeCardinality",
            "attributeInGroupCardinality",
            "ruleStrengthId",
            "contentTypeId",
        ]),
        "sssssss" => Some(&[
            "domainConstraint",
            "parentDomain",
            "proximalPrimitiveConstraint",
            "proximalPrimitiveRefinement",
            "domainTemplateForPrecoordination",
            "domainTemplateForPostcoordination",
            "guideURL",
        ]),
        _ => None,
    };
    match by_pattern {
        Some(names) => names.iter().map(|s| s.to_string()).collect(),
        None => (0..pattern.len()).map(|i| format!("field{}", i)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::well_known;

    fn make_item(refset_id: SctId, fields: Vec<RefsetField>) -> RefsetItem {
        RefsetItem {
            id: Uuid::nil(),
            effective_time: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            active: true,
            module_id: 900000000000207008,
            refset_id,
            referenced_component_id: 24700007,
            fields,
        }
    }

    #[test]
    fn test_pattern_string() {
        let item = make_item(
            447562003,
            vec![
                RefsetField::Integer(1),
                RefsetField::Integer(1),
                RefsetField::String("TRUE".into()),
                RefsetField::String("".into()),
                RefsetField::String("G35".into()),
                RefsetField::Concept(447561005),
            ],
        );
        assert_eq!(item.pattern(), "iisssc");
    }

    #[test]
    fn test_simple_map_target() {
        let item = make_item(447562003, vec![RefsetField::String("G35".into())]);
        assert_eq!(item.map_target(), Some("G35"));
    }

    #[test]
    fn test_complex_map_accessors() {
        let item = make_item(
            447562003,
            vec![
                RefsetField::Integer(1),
                RefsetField::Integer(2),
                RefsetField::String("OTHERWISE TRUE".into()),
                RefsetField::String("advice".into()),
                RefsetField::String("G35".into()),
                RefsetField::Concept(447561005),
            ],
        );
        assert_eq!(item.map_group(), Some(1));
        assert_eq!(item.map_priority(), Some(2));
        assert_eq!(item.map_rule(), Some("OTHERWISE TRUE"));
        assert_eq!(item.map_advice(), Some("advice"));
        assert_eq!(item.map_target(), Some("G35"));
        assert_eq!(item.correlation_id(), Some(447561005));
        assert_eq!(item.map_category_id(), None);
    }

    #[test]
    fn test_association_target() {
        let item = make_item(
            well_known::SAME_AS_REFSET,
            vec![RefsetField::Concept(24700007)],
        );
        assert_eq!(item.target_component_id(), Some(24700007));
    }

    #[test]
    fn test_module_dependency_times() {
        let item = make_item(
            well_known::MODULE_DEPENDENCY_REFSET,
            vec![
                RefsetField::String("20230131".into()),
                RefsetField::String("20220731".into()),
            ],
        );
        assert_eq!(
            item.source_effective_time(),
            NaiveDate::from_ymd_opt(2023, 1, 31)
        );
        assert_eq!(
            item.target_effective_time(),
            NaiveDate::from_ymd_opt(2022, 7, 31)
        );
    }

    #[test]
    fn test_field_names_well_known() {
        assert_eq!(
            field_names("c", well_known::SAME_AS_REFSET),
            vec!["targetComponentId"]
        );
        assert_eq!(
            field_names("c", well_known::GB_ENGLISH_LANG_REFSET),
            vec!["acceptabilityId"]
        );
        assert_eq!(field_names("s", 447562003), vec!["mapTarget"]);
    }

    #[test]
    fn test_field_names_fallback() {
        assert_eq!(field_names("sci", 12345), vec!["field0", "field1", "field2"]);
        assert!(field_names("", 12345).is_empty());
    }
}
