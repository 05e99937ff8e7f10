//! Typed row parsers for RF2 components.
//!
//! One parser per component kind, converting a tab-separated record into
//! the typed component. Refset rows share a fixed six-column prefix; their
//! extension columns are decoded by the filename pattern (`c` concept
//! reference, `i` 32-bit integer, `s` raw string). Parsing is per-row and
//! purely functional.

use csv::StringRecord;
use sct_types::{
    Component, Concept, ConcreteRelationship, ConcreteValue, Description, RefsetField, RefsetItem,
    Relationship,
};

use crate::error::RowError;
use crate::filename::ContentKind;

/// Field-level parse helpers shared by the row parsers.
pub mod parse {
    use chrono::NaiveDate;
    use sct_types::SctId;
    use uuid::Uuid;

    use crate::error::RowError;

    /// Parses an SCTID from a string.
    pub fn sctid(value: &str) -> Result<SctId, RowError> {
        value.parse::<u64>().map_err(|_| RowError::InvalidSctId {
            value: value.to_string(),
        })
    }

    /// Parses a refset item UUID.
    pub fn uuid(value: &str) -> Result<Uuid, RowError> {
        Uuid::parse_str(value).map_err(|_| RowError::InvalidUuid {
            value: value.to_string(),
        })
    }

    /// Parses a boolean from "0" or "1".
    pub fn boolean(value: &str) -> Result<bool, RowError> {
        match value {
            "0" => Ok(false),
            "1" => Ok(true),
            _ => Err(RowError::InvalidBoolean {
                value: value.to_string(),
            }),
        }
    }

    /// Parses a basic-ISO (YYYYMMDD) effective time.
    pub fn effective_time(value: &str) -> Result<NaiveDate, RowError> {
        NaiveDate::parse_from_str(value, "%Y%m%d").map_err(|_| RowError::InvalidDate {
            value: value.to_string(),
        })
    }

    /// Parses an integer value.
    pub fn integer<T: std::str::FromStr>(value: &str) -> Result<T, RowError> {
        value.parse::<T>().map_err(|_| RowError::InvalidInteger {
            value: value.to_string(),
        })
    }
}

fn field<'a>(record: &'a StringRecord, index: usize) -> Result<&'a str, RowError> {
    record.get(index).ok_or(RowError::MissingColumn { index })
}

/// Parses a concept row (5 columns).
pub fn parse_concept(record: &StringRecord) -> Result<Concept, RowError> {
    Ok(Concept {
        id: parse::sctid(field(record, 0)?)?,
        effective_time: parse::effective_time(field(record, 1)?)?,
        active: parse::boolean(field(record, 2)?)?,
        module_id: parse::sctid(field(record, 3)?)?,
        definition_status_id: parse::sctid(field(record, 4)?)?,
    })
}

/// Parses a description or text-definition row (9 columns).
pub fn parse_description(record: &StringRecord) -> Result<Description, RowError> {
    Ok(Description {
        id: parse::sctid(field(record, 0)?)?,
        effective_time: parse::effective_time(field(record, 1)?)?,
        active: parse::boolean(field(record, 2)?)?,
        module_id: parse::sctid(field(record, 3)?)?,
        concept_id: parse::sctid(field(record, 4)?)?,
        language_code: field(record, 5)?.to_string(),
        type_id: parse::sctid(field(record, 6)?)?,
        term: field(record, 7)?.to_string(),
        case_significance_id: parse::sctid(field(record, 8)?)?,
    })
}

/// Parses a relationship row (10 columns).
pub fn parse_relationship(record: &StringRecord) -> Result<Relationship, RowError> {
    Ok(Relationship {
        id: parse::sctid(field(record, 0)?)?,
        effective_time: parse::effective_time(field(record, 1)?)?,
        active: parse::boolean(field(record, 2)?)?,
        module_id: parse::sctid(field(record, 3)?)?,
        source_id: parse::sctid(field(record, 4)?)?,
        destination_id: parse::sctid(field(record, 5)?)?,
        relationship_group: parse::integer(field(record, 6)?)?,
        type_id: parse::sctid(field(record, 7)?)?,
        characteristic_type_id: parse::sctid(field(record, 8)?)?,
        modifier_id: parse::sctid(field(record, 9)?)?,
    })
}

/// Parses a concrete-value relationship row (10 columns).
pub fn parse_concrete_relationship(
    record: &StringRecord,
) -> Result<ConcreteRelationship, RowError> {
    let literal = field(record, 5)?;
    let value = ConcreteValue::parse(literal).ok_or_else(|| RowError::InvalidConcreteValue {
        value: literal.to_string(),
    })?;
    Ok(ConcreteRelationship {
        id: parse::sctid(field(record, 0)?)?,
        effective_time: parse::effective_time(field(record, 1)?)?,
        active: parse::boolean(field(record, 2)?)?,
        module_id: parse::sctid(field(record, 3)?)?,
        source_id: parse::sctid(field(record, 4)?)?,
        value,
        relationship_group: parse::integer(field(record, 6)?)?,
        type_id: parse::sctid(field(record, 7)?)?,
        characteristic_type_id: parse::sctid(field(record, 8)?)?,
        modifier_id: parse::sctid(field(record, 9)?)?,
    })
}

/// Parses a refset item row: the six-column prefix plus pattern fields.
pub fn parse_refset_item(pattern: &str, record: &StringRecord) -> Result<RefsetItem, RowError> {
    let mut fields = Vec::with_capacity(pattern.len());
    for (offset, ch) in pattern.chars().enumerate() {
        let raw = field(record, 6 + offset)?;
        let decoded = match ch {
            'c' => RefsetField::Concept(parse::sctid(raw)?),
            'i' => RefsetField::Integer(parse::integer(raw)?),
            // 's' and anything the filename grammar let through
            _ => RefsetField::String(raw.to_string()),
        };
        fields.push(decoded);
    }
    Ok(RefsetItem {
        id: parse::uuid(field(record, 0)?)?,
        effective_time: parse::effective_time(field(record, 1)?)?,
        active: parse::boolean(field(record, 2)?)?,
        module_id: parse::sctid(field(record, 3)?)?,
        refset_id: parse::sctid(field(record, 4)?)?,
        referenced_component_id: parse::sctid(field(record, 5)?)?,
        fields,
    })
}

/// Parses a row according to the file's content kind.
///
/// Kinds without a parser are rejected upstream by
/// [`ReleaseFile::importable`](crate::ReleaseFile::importable); reaching
/// here with one is a programming error, reported as a missing column.
pub fn parse_row(kind: &ContentKind, record: &StringRecord) -> Result<Component, RowError> {
    match kind {
        ContentKind::Concept => parse_concept(record).map(Component::Concept),
        ContentKind::Description | ContentKind::TextDefinition => {
            parse_description(record).map(Component::Description)
        }
        ContentKind::Relationship => parse_relationship(record).map(Component::Relationship),
        ContentKind::ConcreteRelationship => {
            parse_concrete_relationship(record).map(Component::ConcreteRelationship)
        }
        ContentKind::Refset { pattern, .. } => {
            parse_refset_item(pattern, record).map(Component::RefsetItem)
        }
        ContentKind::StatedRelationship | ContentKind::Identifier | ContentKind::Other(_) => {
            Err(RowError::MissingColumn { index: 0 })
        }
    }
}
