//! Derived index maintenance.

use std::collections::HashMap;

use chrono::NaiveDate;
use sct_types::{well_known, SctId};

use crate::error::StoreResult;
use crate::keys;
use crate::store::Store;

impl Store {
    /// (Re)builds every derived index from the component tables.
    ///
    /// Idempotent: the index databases are cleared and refilled from the
    /// current component state, so re-running on an unchanged store yields
    /// identical indices. Required between the core and refset import
    /// phases, and again after a full import. Requires exclusive write
    /// access.
    pub fn index(&self) -> StoreResult<()> {
        let rtxn = self.env.read_txn()?;
        let mut wtxn = self.env.write_txn()?;

        self.concept_descriptions.clear(&mut wtxn)?;
        self.parent_edges.clear(&mut wtxn)?;
        self.child_edges.clear(&mut wtxn)?;
        self.component_refsets.clear(&mut wtxn)?;
        self.association_targets.clear(&mut wtxn)?;
        self.installed_refsets.clear(&mut wtxn)?;
        self.modules.clear(&mut wtxn)?;

        let mut descriptions = 0u64;
        for entry in self.descriptions.iter(&rtxn)? {
            let (_, description) = entry?;
            // Inactive descriptions stay reachable from their concept.
            self.concept_descriptions.put(
                &mut wtxn,
                &keys::pair(description.concept_id, description.id),
                &(),
            )?;
            descriptions += 1;
        }

        let mut edges = 0u64;
        for entry in self.relationships.iter(&rtxn)? {
            let (_, rel) = entry?;
            if !rel.active {
                continue;
            }
            self.parent_edges.put(
                &mut wtxn,
                &keys::edge(
                    rel.source_id,
                    rel.type_id,
                    rel.relationship_group,
                    rel.destination_id,
                ),
                &(),
            )?;
            self.child_edges.put(
                &mut wtxn,
                &keys::triple(rel.destination_id, rel.type_id, rel.source_id),
                &(),
            )?;
            edges += 1;
        }

        let mut memberships = 0u64;
        for entry in self.refset_items.iter(&rtxn)? {
            let (_, item) = entry?;
            if !item.active {
                continue;
            }
            self.component_refsets.put(
                &mut wtxn,
                &keys::membership(item.referenced_component_id, item.refset_id, &item.id),
                &(),
            )?;
            self.installed_refsets.put(&mut wtxn, &item.refset_id, &())?;
            if well_known::is_historical_association(item.refset_id) {
                if let Some(target) = item.target_component_id() {
                    self.association_targets.put(
                        &mut wtxn,
                        &keys::membership(target, item.refset_id, &item.id),
                        &(),
                    )?;
                }
            }
            memberships += 1;
        }

        let mut module_versions: HashMap<SctId, NaiveDate> = HashMap::new();
        for entry in self.concepts.iter(&rtxn)? {
            let (_, concept) = entry?;
            module_versions
                .entry(concept.module_id)
                .and_modify(|date| {
                    if *date < concept.effective_time {
                        *date = concept.effective_time;
                    }
                })
                .or_insert(concept.effective_time);
        }
        for (module_id, date) in &module_versions {
            self.modules.put(&mut wtxn, module_id, date)?;
        }

        wtxn.commit()?;
        tracing::info!(descriptions, edges, memberships, "indexed store");
        Ok(())
    }
}
