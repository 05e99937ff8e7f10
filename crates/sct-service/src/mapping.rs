//! Cross-map and map-into operations.

use std::collections::{HashMap, HashSet};

use sct_ecl::parse_ecl;
use sct_types::{RefsetItem, SctId};

use crate::error::ServiceResult;
use crate::service::Service;

/// The target universe for [`Service::map_into`].
#[derive(Debug, Clone)]
pub enum MapTarget {
    /// An ECL expression describing the target set.
    Ecl(String),
    /// Members of a reference set.
    Refset(SctId),
    /// An explicit concept set.
    Ids(HashSet<SctId>),
}

impl Service {
    /// Refset items of a map refset whose map target equals the code.
    ///
    /// The members index finds the referenced components; the items are
    /// then fetched from the store and filtered to the exact code.
    pub fn reverse_map(&self, refset_id: SctId, code: &str) -> ServiceResult<Vec<RefsetItem>> {
        let components = self.member_field(refset_id, "mapTarget", code)?;
        let mut out = Vec::new();
        for component in components {
            for item in self.store().items_for_refset(component, refset_id)? {
                if item.map_target() == Some(code) {
                    out.push(item);
                }
            }
        }
        Ok(out)
    }

    /// Refset items of a map refset whose map target starts with the
    /// prefix.
    pub fn reverse_map_prefix(
        &self,
        refset_id: SctId,
        prefix: &str,
    ) -> ServiceResult<Vec<RefsetItem>> {
        let components = self.member_field_prefix(refset_id, "mapTarget", prefix)?;
        let mut out = Vec::new();
        for component in components {
            for item in self.store().items_for_refset(component, refset_id)? {
                if item.map_target().is_some_and(|t| t.starts_with(prefix)) {
                    out.push(item);
                }
            }
        }
        Ok(out)
    }

    /// Maps each source concept into the target universe: the members of
    /// the target reachable through the source's ancestor closure,
    /// restricted to leaves (no result is a proper ancestor of another).
    pub fn map_into(
        &self,
        source_ids: &[SctId],
        target: &MapTarget,
    ) -> ServiceResult<HashMap<SctId, HashSet<SctId>>> {
        let universe: HashSet<SctId> = match target {
            MapTarget::Ecl(ecl) => {
                let constraint = parse_ecl(ecl)?;
                self.ecl_context().evaluate(&constraint)?
            }
            MapTarget::Refset(refset_id) => self.refset_members(&[*refset_id])?,
            MapTarget::Ids(ids) => ids.clone(),
        };

        let mut out = HashMap::with_capacity(source_ids.len());
        for &source in source_ids {
            let ancestors = self.all_parents(&[source], None)?;
            let reachable: HashSet<SctId> =
                ancestors.intersection(&universe).copied().collect();
            let leaves = self.store().leaves_only(&reachable)?;
            out.insert(source, leaves);
        }
        Ok(out)
    }
}
