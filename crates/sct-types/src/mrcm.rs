//! MRCM (Machine Readable Concept Model) domain view.
//!
//! The MRCM domain reference set constrains which semantic domains exist
//! and how they are defined. Rows arrive as generic [`RefsetItem`]s; the
//! typed view here decodes the domain refset's column layout for the
//! domain classifier.

use crate::{RefsetItem, SctId};

/// Typed view of an MRCM Domain refset item (pattern `sssssss`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MrcmDomain {
    /// The domain concept.
    pub domain_id: SctId,
    /// ECL constraint defining the domain.
    pub domain_constraint: String,
    /// Parent domain expression, if any.
    pub parent_domain: String,
    /// ECL constraint for proximal primitive supertypes.
    pub proximal_primitive_constraint: String,
}

impl MrcmDomain {
    /// Decodes a domain refset item; returns `None` on a shape mismatch.
    pub fn from_item(item: &RefsetItem) -> Option<Self> {
        if item.fields.len() < 3 {
            return None;
        }
        Some(Self {
            domain_id: item.referenced_component_id,
            domain_constraint: item.fields[0].as_str()?.to_string(),
            parent_domain: item.fields[1].as_str()?.to_string(),
            proximal_primitive_constraint: item.fields[2].as_str()?.to_string(),
        })
    }
}
