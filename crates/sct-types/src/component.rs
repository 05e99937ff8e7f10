//! Tagged component variant.
//!
//! The import pipeline and store operate over batches of heterogeneous
//! components; this enum is the common currency between them.

use chrono::NaiveDate;

use crate::{Concept, ConcreteRelationship, Description, RefsetItem, Relationship};

/// Any RF2 component, tagged by kind.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Component {
    /// A concept row.
    Concept(Concept),
    /// A description or text-definition row.
    Description(Description),
    /// A relationship row.
    Relationship(Relationship),
    /// A concrete-value relationship row.
    ConcreteRelationship(ConcreteRelationship),
    /// A reference set item row of any pattern.
    RefsetItem(RefsetItem),
}

impl Component {
    /// Returns the effective time of the wrapped component.
    pub fn effective_time(&self) -> NaiveDate {
        match self {
            Self::Concept(c) => c.effective_time,
            Self::Description(d) => d.effective_time,
            Self::Relationship(r) => r.effective_time,
            Self::ConcreteRelationship(r) => r.effective_time,
            Self::RefsetItem(i) => i.effective_time,
        }
    }

    /// Returns whether the wrapped component is active.
    pub fn active(&self) -> bool {
        match self {
            Self::Concept(c) => c.active,
            Self::Description(d) => d.active,
            Self::Relationship(r) => r.active,
            Self::ConcreteRelationship(r) => r.active,
            Self::RefsetItem(i) => i.active,
        }
    }

    /// Returns the module of the wrapped component.
    pub fn module_id(&self) -> crate::SctId {
        match self {
            Self::Concept(c) => c.module_id,
            Self::Description(d) => d.module_id,
            Self::Relationship(r) => r.module_id,
            Self::ConcreteRelationship(r) => r.module_id,
            Self::RefsetItem(i) => i.module_id,
        }
    }

    /// A short name for the component kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Concept(_) => "concept",
            Self::Description(_) => "description",
            Self::Relationship(_) => "relationship",
            Self::ConcreteRelationship(_) => "concrete-relationship",
            Self::RefsetItem(_) => "refset-item",
        }
    }
}

impl From<Concept> for Component {
    fn from(value: Concept) -> Self {
        Self::Concept(value)
    }
}

impl From<Description> for Component {
    fn from(value: Description) -> Self {
        Self::Description(value)
    }
}

impl From<Relationship> for Component {
    fn from(value: Relationship) -> Self {
        Self::Relationship(value)
    }
}

impl From<ConcreteRelationship> for Component {
    fn from(value: ConcreteRelationship) -> Self {
        Self::ConcreteRelationship(value)
    }
}

impl From<RefsetItem> for Component {
    fn from(value: RefsetItem) -> Self {
        Self::RefsetItem(value)
    }
}
