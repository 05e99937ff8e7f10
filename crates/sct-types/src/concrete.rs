//! SNOMED CT concrete-value relationship type.

use chrono::NaiveDate;

use crate::SctId;

/// A literal value on the source side of a concrete relationship.
///
/// RF2 encodes concrete values as `#` prefixed numerics or double-quoted
/// strings in `sct2_RelationshipConcreteValues_*.txt`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConcreteValue {
    /// A decimal literal, e.g. `#2.5`.
    Decimal(f64),
    /// An integer literal, e.g. `#500`.
    Integer(i64),
    /// A string literal, e.g. `"mg"`.
    String(String),
}

impl ConcreteValue {
    /// Parses an RF2 concrete-value literal.
    ///
    /// Returns `None` when the literal matches none of the three forms.
    ///
    /// # Examples
    ///
    /// ```
    /// use sct_types::ConcreteValue;
    ///
    /// assert_eq!(ConcreteValue::parse("#500"), Some(ConcreteValue::Integer(500)));
    /// assert_eq!(ConcreteValue::parse("#2.5"), Some(ConcreteValue::Decimal(2.5)));
    /// assert_eq!(
    ///     ConcreteValue::parse("\"mg\""),
    ///     Some(ConcreteValue::String("mg".to_string()))
    /// );
    /// assert_eq!(ConcreteValue::parse("unquoted"), None);
    /// ```
    pub fn parse(literal: &str) -> Option<Self> {
        if let Some(numeric) = literal.strip_prefix('#') {
            if numeric.contains('.') {
                return numeric.parse::<f64>().ok().map(Self::Decimal);
            }
            return numeric.parse::<i64>().ok().map(Self::Integer);
        }
        if literal.len() >= 2 && literal.starts_with('"') && literal.ends_with('"') {
            return Some(Self::String(literal[1..literal.len() - 1].to_string()));
        }
        None
    }

    /// Returns the value as an f64 where numeric, for range comparisons.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Decimal(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            Self::String(_) => None,
        }
    }
}

/// A concrete relationship: a typed edge from a concept to a literal value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConcreteRelationship {
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
    /// The literal value on the destination side.
    pub value: ConcreteValue,
    /// Relationship group; 0 means ungrouped.
    pub relationship_group: u32,
    /// Type of the edge (e.g. has presentation strength value).
    pub type_id: SctId,
    /// Stated, inferred or additional.
    pub characteristic_type_id: SctId,
    /// Existential or universal quantification.
    pub modifier_id: SctId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_integer_literal() {
        assert_eq!(ConcreteValue::parse("#500"), Some(ConcreteValue::Integer(500)));
        assert_eq!(ConcreteValue::parse("#-3"), Some(ConcreteValue::Integer(-3)));
    }

    #[test]
    fn test_parse_decimal_literal() {
        assert_eq!(ConcreteValue::parse("#2.5"), Some(ConcreteValue::Decimal(2.5)));
    }

    #[test]
    fn test_parse_string_literal() {
        assert_eq!(
            ConcreteValue::parse("\"milligram\""),
            Some(ConcreteValue::String("milligram".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(ConcreteValue::parse("500"), None);
        assert_eq!(ConcreteValue::parse("#"), None);
        assert_eq!(ConcreteValue::parse("\""), None);
    }

    #[test]
    fn test_as_f64() {
        assert_eq!(ConcreteValue::Integer(500).as_f64(), Some(500.0));
        assert_eq!(ConcreteValue::Decimal(2.5).as_f64(), Some(2.5));
        assert_eq!(ConcreteValue::String("mg".into()).as_f64(), None);
    }
}
