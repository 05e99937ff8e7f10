//! Parent and child relationship walks.
//!
//! The relationship edges are precomputed into the `parent-edges` and
//! `child-edges` databases by [`Store::index`]; transitive closures are
//! walked lazily per query so memory stays bounded by the visited set.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use sct_types::{well_known, SctId};

use crate::error::StoreResult;
use crate::keys;
use crate::store::Store;

impl Store {
    /// Direct destinations of the given relationship type for a source.
    pub fn parents_of(&self, source_id: SctId, type_id: SctId) -> StoreResult<Vec<SctId>> {
        let rtxn = self.env.read_txn()?;
        // The same destination may recur across relationship groups.
        let mut out = BTreeSet::new();
        for entry in self
            .parent_edges
            .prefix_iter(&rtxn, &keys::pair(source_id, type_id))?
        {
            let (key, ()) = entry?;
            out.insert(keys::read_u64(key, 20));
        }
        Ok(out.into_iter().collect())
    }

    /// Direct sources of the given relationship type pointing at a concept.
    pub fn children_of(&self, destination_id: SctId, type_id: SctId) -> StoreResult<Vec<SctId>> {
        let rtxn = self.env.read_txn()?;
        let mut out = Vec::new();
        for entry in self
            .child_edges
            .prefix_iter(&rtxn, &keys::pair(destination_id, type_id))?
        {
            let (key, ()) = entry?;
            out.push(keys::read_u64(key, 16));
        }
        Ok(out)
    }

    /// Direct parent relationships grouped by type.
    pub fn parent_relationships(
        &self,
        source_id: SctId,
    ) -> StoreResult<BTreeMap<SctId, Vec<SctId>>> {
        let rtxn = self.env.read_txn()?;
        let mut grouped: BTreeMap<SctId, BTreeSet<SctId>> = BTreeMap::new();
        for entry in self.parent_edges.prefix_iter(&rtxn, &keys::one(source_id))? {
            let (key, ()) = entry?;
            let type_id = keys::read_u64(key, 8);
            let destination = keys::read_u64(key, 20);
            grouped.entry(type_id).or_default().insert(destination);
        }
        Ok(grouped
            .into_iter()
            .map(|(type_id, destinations)| (type_id, destinations.into_iter().collect()))
            .collect())
    }

    /// Direct parent relationships organised by relationship group.
    ///
    /// Group 0 collects the ungrouped attributes.
    pub fn parent_relationship_groups(
        &self,
        source_id: SctId,
    ) -> StoreResult<BTreeMap<u32, Vec<(SctId, SctId)>>> {
        let rtxn = self.env.read_txn()?;
        let mut out: BTreeMap<u32, Vec<(SctId, SctId)>> = BTreeMap::new();
        for entry in self.parent_edges.prefix_iter(&rtxn, &keys::one(source_id))? {
            let (key, ()) = entry?;
            let type_id = keys::read_u64(key, 8);
            let group = keys::read_u32(key, 16);
            let destination = keys::read_u64(key, 20);
            out.entry(group).or_default().push((type_id, destination));
        }
        Ok(out)
    }

    /// Transitive closure of parents for a concept, including the concept
    /// itself.
    pub fn all_parents(&self, id: SctId, type_id: SctId) -> StoreResult<HashSet<SctId>> {
        self.all_parents_of(std::slice::from_ref(&id), type_id)
    }

    /// Transitive closure of parents across a set of concepts, including
    /// the concepts themselves.
    pub fn all_parents_of(&self, ids: &[SctId], type_id: SctId) -> StoreResult<HashSet<SctId>> {
        let mut visited: HashSet<SctId> = ids.iter().copied().collect();
        let mut queue: VecDeque<SctId> = ids.iter().copied().collect();
        while let Some(current) = queue.pop_front() {
            for parent in self.parents_of(current, type_id)? {
                if visited.insert(parent) {
                    queue.push_back(parent);
                }
            }
        }
        Ok(visited)
    }

    /// Transitive closure of children for a concept, including itself.
    pub fn all_children(&self, id: SctId, type_id: SctId) -> StoreResult<HashSet<SctId>> {
        let mut visited: HashSet<SctId> = HashSet::from([id]);
        let mut queue = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            for child in self.children_of(current, type_id)? {
                if visited.insert(child) {
                    queue.push_back(child);
                }
            }
        }
        Ok(visited)
    }

    /// Parent relationships with each type's destinations expanded to
    /// their full Is-A closure (destinations included).
    pub fn parents_expanded(
        &self,
        source_id: SctId,
    ) -> StoreResult<BTreeMap<SctId, HashSet<SctId>>> {
        let direct = self.parent_relationships(source_id)?;
        let mut out = BTreeMap::new();
        for (type_id, destinations) in direct {
            let expanded = self.all_parents_of(&destinations, well_known::IS_A)?;
            out.insert(type_id, expanded);
        }
        Ok(out)
    }

    /// Expanded destinations for a single relationship type.
    pub fn parents_expanded_of_type(
        &self,
        source_id: SctId,
        type_id: SctId,
    ) -> StoreResult<HashSet<SctId>> {
        let direct = self.parents_of(source_id, type_id)?;
        self.all_parents_of(&direct, well_known::IS_A)
    }

    /// Is-A subsumption: true when `parent` is in the Is-A closure of
    /// `child` (a concept subsumes itself).
    pub fn is_a(&self, child: SctId, parent: SctId) -> StoreResult<bool> {
        if child == parent {
            return Ok(true);
        }
        let mut visited: HashSet<SctId> = HashSet::from([child]);
        let mut queue = VecDeque::from([child]);
        while let Some(current) = queue.pop_front() {
            for up in self.parents_of(current, well_known::IS_A)? {
                if up == parent {
                    return Ok(true);
                }
                if visited.insert(up) {
                    queue.push_back(up);
                }
            }
        }
        Ok(false)
    }

    /// Restricts a candidate set to its leaves: members with no proper
    /// descendant also in the set.
    pub fn leaves_only(&self, candidates: &HashSet<SctId>) -> StoreResult<HashSet<SctId>> {
        let mut leaves = HashSet::new();
        for &candidate in candidates {
            let mut has_descendant = false;
            for &other in candidates {
                if other != candidate && self.is_a(other, candidate)? {
                    has_descendant = true;
                    break;
                }
            }
            if !has_descendant {
                leaves.insert(candidate);
            }
        }
        Ok(leaves)
    }
}
