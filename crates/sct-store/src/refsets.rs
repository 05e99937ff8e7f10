//! Refset membership queries.

use std::collections::BTreeSet;

use sct_types::{RefsetItem, SctId};

use crate::error::StoreResult;
use crate::keys;
use crate::store::Store;

impl Store {
    /// Distinct refsets the component is an active member of.
    pub fn refset_ids_for(&self, component_id: SctId) -> StoreResult<BTreeSet<SctId>> {
        let rtxn = self.env.read_txn()?;
        let mut out = BTreeSet::new();
        for entry in self
            .component_refsets
            .prefix_iter(&rtxn, &keys::one(component_id))?
        {
            let (key, ()) = entry?;
            out.insert(keys::read_u64(key, 8));
        }
        Ok(out)
    }

    /// Active refset items referencing a component, across all refsets.
    pub fn items_for(&self, component_id: SctId) -> StoreResult<Vec<RefsetItem>> {
        let rtxn = self.env.read_txn()?;
        let mut out = Vec::new();
        for entry in self
            .component_refsets
            .prefix_iter(&rtxn, &keys::one(component_id))?
        {
            let (key, ()) = entry?;
            let item_id = keys::read_uuid(key, 16);
            if let Some(item) = self.refset_items.get(&rtxn, item_id.as_bytes())? {
                out.push(item);
            }
        }
        Ok(out)
    }

    /// Active refset items referencing a component within one refset.
    pub fn items_for_refset(
        &self,
        component_id: SctId,
        refset_id: SctId,
    ) -> StoreResult<Vec<RefsetItem>> {
        let rtxn = self.env.read_txn()?;
        let mut out = Vec::new();
        for entry in self
            .component_refsets
            .prefix_iter(&rtxn, &keys::pair(component_id, refset_id))?
        {
            let (key, ()) = entry?;
            let item_id = keys::read_uuid(key, 16);
            if let Some(item) = self.refset_items.get(&rtxn, item_id.as_bytes())? {
                out.push(item);
            }
        }
        Ok(out)
    }

    /// Active association items whose target is the given component.
    ///
    /// Historical associations are bidirectional in use; the
    /// `association-targets` index answers the reverse direction without
    /// a scan.
    pub fn association_items_to(&self, target_id: SctId) -> StoreResult<Vec<RefsetItem>> {
        let rtxn = self.env.read_txn()?;
        let mut out = Vec::new();
        for entry in self
            .association_targets
            .prefix_iter(&rtxn, &keys::one(target_id))?
        {
            let (key, ()) = entry?;
            let item_id = keys::read_uuid(key, 16);
            if let Some(item) = self.refset_items.get(&rtxn, item_id.as_bytes())? {
                out.push(item);
            }
        }
        Ok(out)
    }

    /// Refsets with at least one active item.
    pub fn installed_refsets(&self) -> StoreResult<BTreeSet<SctId>> {
        let rtxn = self.env.read_txn()?;
        let mut out = BTreeSet::new();
        for entry in self.installed_refsets.iter(&rtxn)? {
            let (refset_id, ()) = entry?;
            out.insert(refset_id);
        }
        Ok(out)
    }
}
