//! The persistent component store.
//!
//! One LMDB environment holds a named database per component kind (keyed
//! by identifier) plus the derived index databases (composite byte keys,
//! unit values). Every component id stores the latest version observed
//! across all imported files; an equal effective time replaces the
//! incumbent. LMDB serialises writers; readers are lock-free snapshots.

use std::path::Path;

use crossbeam_channel::Sender;
use heed::byteorder::BigEndian;
use heed::types::{Bytes, SerdeBincode, Unit, U64};
use heed::{CompactionOption, Database, Env, EnvOpenOptions};
use sct_types::{Component, Concept, ConcreteRelationship, Description, RefsetItem, Relationship, SctId};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::keys;

type U64BE = U64<BigEndian>;

const WRITE_RETRIES: usize = 3;

/// Store configuration.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Maximum size of the memory map.
    pub map_size: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            // Virtual reservation only; pages are allocated on demand.
            map_size: 8 * 1024 * 1024 * 1024,
        }
    }
}

/// Component counts, for status reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComponentCounts {
    /// Number of stored concepts.
    pub concepts: u64,
    /// Number of stored descriptions.
    pub descriptions: u64,
    /// Number of stored relationships.
    pub relationships: u64,
    /// Number of stored concrete relationships.
    pub concrete_relationships: u64,
    /// Number of stored refset items.
    pub refset_items: u64,
}

/// Persistent store over SNOMED CT components and their derived indices.
pub struct Store {
    pub(crate) env: Env,
    pub(crate) concepts: Database<U64BE, SerdeBincode<Concept>>,
    pub(crate) descriptions: Database<U64BE, SerdeBincode<Description>>,
    pub(crate) relationships: Database<U64BE, SerdeBincode<Relationship>>,
    pub(crate) concrete_relationships: Database<U64BE, SerdeBincode<ConcreteRelationship>>,
    pub(crate) refset_items: Database<Bytes, SerdeBincode<RefsetItem>>,
    /// (conceptId, descriptionId) for every description, active or not.
    pub(crate) concept_descriptions: Database<Bytes, Unit>,
    /// (sourceId, typeId, group, destinationId) for every active relationship.
    pub(crate) parent_edges: Database<Bytes, Unit>,
    /// (destinationId, typeId, sourceId) for every active relationship.
    pub(crate) child_edges: Database<Bytes, Unit>,
    /// (componentId, refsetId, itemId) for every active refset item.
    pub(crate) component_refsets: Database<Bytes, Unit>,
    /// (targetComponentId, refsetId, itemId) for active association items.
    pub(crate) association_targets: Database<Bytes, Unit>,
    /// Refsets with at least one active item.
    pub(crate) installed_refsets: Database<U64BE, Unit>,
    /// Latest concept effective time per module.
    pub(crate) modules: Database<U64BE, SerdeBincode<chrono::NaiveDate>>,
}

impl Store {
    /// Opens (creating when absent) the store at a directory.
    pub fn open(path: &Path, options: &StoreOptions) -> StoreResult<Self> {
        std::fs::create_dir_all(path)?;
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(options.map_size)
                .max_dbs(16)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let concepts = env.create_database(&mut wtxn, Some("concepts"))?;
        let descriptions = env.create_database(&mut wtxn, Some("descriptions"))?;
        let relationships = env.create_database(&mut wtxn, Some("relationships"))?;
        let concrete_relationships =
            env.create_database(&mut wtxn, Some("concrete-relationships"))?;
        let refset_items = env.create_database(&mut wtxn, Some("refset-items"))?;
        let concept_descriptions =
            env.create_database(&mut wtxn, Some("concept-descriptions"))?;
        let parent_edges = env.create_database(&mut wtxn, Some("parent-edges"))?;
        let child_edges = env.create_database(&mut wtxn, Some("child-edges"))?;
        let component_refsets = env.create_database(&mut wtxn, Some("component-refsets"))?;
        let association_targets =
            env.create_database(&mut wtxn, Some("association-targets"))?;
        let installed_refsets = env.create_database(&mut wtxn, Some("installed-refsets"))?;
        let modules = env.create_database(&mut wtxn, Some("modules"))?;
        wtxn.commit()?;

        Ok(Self {
            env,
            concepts,
            descriptions,
            relationships,
            concrete_relationships,
            refset_items,
            concept_descriptions,
            parent_edges,
            child_edges,
            component_refsets,
            association_targets,
            installed_refsets,
            modules,
        })
    }

    /// Writes a batch of components atomically, latest effective time wins.
    ///
    /// A failed batch is retried, then written row-by-row to isolate the
    /// offending component, which surfaces as
    /// [`StoreError::BadComponent`].
    pub fn write_components(&self, batch: &[Component]) -> StoreResult<()> {
        for attempt in 1..=WRITE_RETRIES {
            match self.write_batch_txn(batch) {
                Ok(()) => return Ok(()),
                Err(e) if attempt < WRITE_RETRIES => {
                    tracing::warn!(attempt, error = %e, "batch write failed, retrying");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "batch write failed, falling back to per-row writes");
                }
            }
        }
        for component in batch {
            if let Err(e) = self.write_batch_txn(std::slice::from_ref(component)) {
                let source = match e {
                    StoreError::Storage(err) => err,
                    other => return Err(other),
                };
                return Err(StoreError::BadComponent {
                    kind: component.kind(),
                    id: component_id(component),
                    source,
                });
            }
        }
        Ok(())
    }

    fn write_batch_txn(&self, batch: &[Component]) -> StoreResult<()> {
        let mut wtxn = self.env.write_txn()?;
        for component in batch {
            match component {
                Component::Concept(c) => {
                    let keep = match self.concepts.get(&wtxn, &c.id)? {
                        Some(existing) => existing.effective_time <= c.effective_time,
                        None => true,
                    };
                    if keep {
                        self.concepts.put(&mut wtxn, &c.id, c)?;
                    }
                }
                Component::Description(d) => {
                    let keep = match self.descriptions.get(&wtxn, &d.id)? {
                        Some(existing) => existing.effective_time <= d.effective_time,
                        None => true,
                    };
                    if keep {
                        self.descriptions.put(&mut wtxn, &d.id, d)?;
                    }
                }
                Component::Relationship(r) => {
                    let keep = match self.relationships.get(&wtxn, &r.id)? {
                        Some(existing) => existing.effective_time <= r.effective_time,
                        None => true,
                    };
                    if keep {
                        self.relationships.put(&mut wtxn, &r.id, r)?;
                    }
                }
                Component::ConcreteRelationship(r) => {
                    let keep = match self.concrete_relationships.get(&wtxn, &r.id)? {
                        Some(existing) => existing.effective_time <= r.effective_time,
                        None => true,
                    };
                    if keep {
                        self.concrete_relationships.put(&mut wtxn, &r.id, r)?;
                    }
                }
                Component::RefsetItem(item) => {
                    let key = item.id.into_bytes();
                    let keep = match self.refset_items.get(&wtxn, &key)? {
                        Some(existing) => existing.effective_time <= item.effective_time,
                        None => true,
                    };
                    if keep {
                        self.refset_items.put(&mut wtxn, &key, item)?;
                    }
                }
            }
        }
        wtxn.commit()?;
        Ok(())
    }

    /// Point lookup of a concept.
    pub fn concept(&self, id: SctId) -> StoreResult<Option<Concept>> {
        let rtxn = self.env.read_txn()?;
        Ok(self.concepts.get(&rtxn, &id)?)
    }

    /// Point lookup of a description.
    pub fn description(&self, id: SctId) -> StoreResult<Option<Description>> {
        let rtxn = self.env.read_txn()?;
        Ok(self.descriptions.get(&rtxn, &id)?)
    }

    /// Point lookup of a relationship.
    pub fn relationship(&self, id: SctId) -> StoreResult<Option<Relationship>> {
        let rtxn = self.env.read_txn()?;
        Ok(self.relationships.get(&rtxn, &id)?)
    }

    /// Point lookup of a concrete relationship.
    pub fn concrete_relationship(&self, id: SctId) -> StoreResult<Option<ConcreteRelationship>> {
        let rtxn = self.env.read_txn()?;
        Ok(self.concrete_relationships.get(&rtxn, &id)?)
    }

    /// Point lookup of a refset item.
    pub fn refset_item(&self, id: &Uuid) -> StoreResult<Option<RefsetItem>> {
        let rtxn = self.env.read_txn()?;
        Ok(self.refset_items.get(&rtxn, id.as_bytes())?)
    }

    /// All descriptions for a concept, active or not.
    pub fn descriptions_for(&self, concept_id: SctId) -> StoreResult<Vec<Description>> {
        let rtxn = self.env.read_txn()?;
        let mut out = Vec::new();
        for entry in self
            .concept_descriptions
            .prefix_iter(&rtxn, &keys::one(concept_id))?
        {
            let (key, ()) = entry?;
            let description_id = keys::read_u64(key, 8);
            if let Some(description) = self.descriptions.get(&rtxn, &description_id)? {
                out.push(description);
            }
        }
        Ok(out)
    }

    /// Concrete relationships for a source concept.
    ///
    /// The concrete table is small; a full scan keeps the schema free of
    /// another index.
    pub fn concrete_relationships_for(
        &self,
        source_id: SctId,
    ) -> StoreResult<Vec<ConcreteRelationship>> {
        let rtxn = self.env.read_txn()?;
        let mut out = Vec::new();
        for entry in self.concrete_relationships.iter(&rtxn)? {
            let (_, rel) = entry?;
            if rel.active && rel.source_id == source_id {
                out.push(rel);
            }
        }
        Ok(out)
    }

    /// Pushes every stored concept to a consumer channel.
    ///
    /// Stops silently when the receiver disconnects.
    pub fn stream_all_concepts(&self, sender: &Sender<Concept>) -> StoreResult<()> {
        let rtxn = self.env.read_txn()?;
        for entry in self.concepts.iter(&rtxn)? {
            let (_, concept) = entry?;
            if sender.send(concept).is_err() {
                break;
            }
        }
        Ok(())
    }

    /// All concept identifiers in the store.
    pub fn concept_ids(&self) -> StoreResult<Vec<SctId>> {
        let rtxn = self.env.read_txn()?;
        let mut out = Vec::new();
        for entry in self.concepts.iter(&rtxn)? {
            let (id, _) = entry?;
            out.push(id);
        }
        Ok(out)
    }

    /// Distinct relationship type ids across the active relationships.
    pub fn relationship_type_ids(&self) -> StoreResult<std::collections::BTreeSet<SctId>> {
        let rtxn = self.env.read_txn()?;
        let mut out = std::collections::BTreeSet::new();
        for entry in self.relationships.iter(&rtxn)? {
            let (_, rel) = entry?;
            if rel.active {
                out.insert(rel.type_id);
            }
        }
        Ok(out)
    }

    /// Applies a function to every stored refset item.
    pub fn for_each_refset_item<F>(&self, mut f: F) -> StoreResult<()>
    where
        F: FnMut(RefsetItem) -> StoreResult<()>,
    {
        let rtxn = self.env.read_txn()?;
        for entry in self.refset_items.iter(&rtxn)? {
            let (_, item) = entry?;
            f(item)?;
        }
        Ok(())
    }

    /// Component counts across the KV tables.
    pub fn counts(&self) -> StoreResult<ComponentCounts> {
        let rtxn = self.env.read_txn()?;
        Ok(ComponentCounts {
            concepts: self.concepts.len(&rtxn)?,
            descriptions: self.descriptions.len(&rtxn)?,
            relationships: self.relationships.len(&rtxn)?,
            concrete_relationships: self.concrete_relationships.len(&rtxn)?,
            refset_items: self.refset_items.len(&rtxn)?,
        })
    }

    /// Latest concept effective time per module, built by [`Store::index`].
    pub fn module_versions(
        &self,
    ) -> StoreResult<std::collections::BTreeMap<SctId, chrono::NaiveDate>> {
        let rtxn = self.env.read_txn()?;
        let mut out = std::collections::BTreeMap::new();
        for entry in self.modules.iter(&rtxn)? {
            let (module_id, date) = entry?;
            out.insert(module_id, date);
        }
        Ok(out)
    }

    /// Rewrites the database file through LMDB's compacting copy.
    ///
    /// Must run while no other process holds the environment open; the
    /// store is opened, copied and swapped in place.
    pub fn compact(path: &Path, options: &StoreOptions) -> StoreResult<()> {
        let compacted = path.join("data.mdb.compacting");
        {
            let store = Self::open(path, options)?;
            store
                .env
                .copy_to_file(&compacted, CompactionOption::Enabled)?;
        }
        std::fs::rename(&compacted, path.join("data.mdb"))?;
        tracing::info!(path = %path.display(), "store compacted");
        Ok(())
    }
}

fn component_id(component: &Component) -> String {
    match component {
        Component::Concept(c) => c.id.to_string(),
        Component::Description(d) => d.id.to_string(),
        Component::Relationship(r) => r.id.to_string(),
        Component::ConcreteRelationship(r) => r.id.to_string(),
        Component::RefsetItem(i) => i.id.to_string(),
    }
}
