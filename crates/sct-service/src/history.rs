//! Historical association expansion.
//!
//! Inactive concepts carry association refset items linking them to their
//! modern replacements. Both directions are answered from inverted
//! indices in the store (items by referenced component, and the
//! association-targets index), never by chasing pointers.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use sct_types::{well_known, SctId};

use crate::error::ServiceResult;
use crate::service::Service;

/// How much history to include when expanding concept sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryProfile {
    /// SAME AS only.
    Min,
    /// SAME AS, REPLACED BY, WAS A and PARTIALLY EQUIVALENT TO.
    #[default]
    Mod,
    /// Every historical association refset.
    Max,
}

impl HistoryProfile {
    /// The association refsets this profile includes.
    pub fn refset_ids(self) -> Vec<SctId> {
        match self {
            Self::Min => vec![well_known::SAME_AS_REFSET],
            Self::Mod => vec![
                well_known::SAME_AS_REFSET,
                well_known::REPLACED_BY_REFSET,
                well_known::WAS_A_REFSET,
                well_known::PARTIALLY_EQUIVALENT_TO_REFSET,
            ],
            Self::Max => vec![
                well_known::SAME_AS_REFSET,
                well_known::REPLACED_BY_REFSET,
                well_known::WAS_A_REFSET,
                well_known::PARTIALLY_EQUIVALENT_TO_REFSET,
                well_known::POSSIBLY_EQUIVALENT_TO_REFSET,
                well_known::POSSIBLY_REPLACED_BY_REFSET,
                well_known::MOVED_TO_REFSET,
                well_known::MOVED_FROM_REFSET,
                well_known::ALTERNATIVE_REFSET,
                well_known::REFERS_TO_REFSET,
            ],
        }
    }
}

impl Service {
    /// Outgoing historical associations of a component: association
    /// refset id to target components.
    pub fn historical_associations(
        &self,
        component_id: SctId,
    ) -> ServiceResult<BTreeMap<SctId, BTreeSet<SctId>>> {
        let mut out: BTreeMap<SctId, BTreeSet<SctId>> = BTreeMap::new();
        for item in self.store().items_for(component_id)? {
            if !well_known::is_historical_association(item.refset_id) {
                continue;
            }
            if let Some(target) = item.target_component_id() {
                out.entry(item.refset_id).or_default().insert(target);
            }
        }
        Ok(out)
    }

    /// Incoming historical associations: association refset id to the
    /// source components that point at this one.
    pub fn source_historical_associations(
        &self,
        component_id: SctId,
    ) -> ServiceResult<BTreeMap<SctId, BTreeSet<SctId>>> {
        let mut out: BTreeMap<SctId, BTreeSet<SctId>> = BTreeMap::new();
        for item in self.store().association_items_to(component_id)? {
            out.entry(item.refset_id)
                .or_default()
                .insert(item.referenced_component_id);
        }
        Ok(out)
    }

    /// The source components historically associated with this one,
    /// restricted to the given association refsets (the moderate history
    /// profile when `None`).
    pub fn source_historical(
        &self,
        component_id: SctId,
        refset_ids: Option<&[SctId]>,
    ) -> ServiceResult<HashSet<SctId>> {
        let default = HistoryProfile::default().refset_ids();
        let allowed: HashSet<SctId> = refset_ids
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_else(|| default.into_iter().collect());
        let mut out = HashSet::new();
        for item in self.store().association_items_to(component_id)? {
            if allowed.contains(&item.refset_id) {
                out.insert(item.referenced_component_id);
            }
        }
        Ok(out)
    }

    /// Expands a concept set with its historical associates, both
    /// directions, under the given association refsets (the moderate
    /// profile when `None`).
    pub fn with_historical(
        &self,
        ids: &[SctId],
        refset_ids: Option<&[SctId]>,
    ) -> ServiceResult<HashSet<SctId>> {
        let default = HistoryProfile::default().refset_ids();
        let allowed: HashSet<SctId> = refset_ids
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_else(|| default.into_iter().collect());

        let mut out: HashSet<SctId> = ids.iter().copied().collect();
        for &id in ids {
            for item in self.store().association_items_to(id)? {
                if allowed.contains(&item.refset_id) {
                    out.insert(item.referenced_component_id);
                }
            }
            for item in self.store().items_for(id)? {
                if allowed.contains(&item.refset_id) {
                    if let Some(target) = item.target_component_id() {
                        out.insert(target);
                    }
                }
            }
        }
        Ok(out)
    }

    /// The association refsets included by a history profile,
    /// intersected with what is installed.
    pub fn history_profile(&self, profile: HistoryProfile) -> ServiceResult<Vec<SctId>> {
        let installed = self.installed_refsets()?;
        Ok(profile
            .refset_ids()
            .into_iter()
            .filter(|id| installed.contains(id))
            .collect())
    }
}
