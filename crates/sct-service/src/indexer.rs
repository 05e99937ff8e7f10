//! Builds the search indices from the component store.
//!
//! The store is the source of truth; this pass resolves everything a
//! search document needs (Is-A closures per relationship type, refset
//! memberships, acceptability, the preferred term under the configured
//! locale priority) and streams documents into the two index writers.

use std::collections::BTreeMap;

use sct_search::{
    DescriptionDoc, DescriptionIndex, MemberColumn, MemberDoc, MemberValue, MembersIndex,
};
use sct_store::Store;
use sct_types::{refset, well_known, Acceptability, RefsetField, SctId};

use crate::error::ServiceResult;
use crate::locale::LocaleResolver;

/// Rebuilds the description index at `path` from the store.
pub fn build_description_index(
    store: &Store,
    path: &std::path::Path,
    locale: &LocaleResolver,
    locale_priority: &[SctId],
) -> ServiceResult<()> {
    let relationship_types: Vec<SctId> =
        store.relationship_type_ids()?.into_iter().collect();
    let index = DescriptionIndex::create(path, &relationship_types)?;
    let mut writer = index.writer()?;

    let mut documents = 0u64;
    for concept_id in store.concept_ids()? {
        let concept = match store.concept(concept_id)? {
            Some(concept) => concept,
            None => continue,
        };
        let ancestors: BTreeMap<SctId, Vec<SctId>> = store
            .parents_expanded(concept_id)?
            .into_iter()
            .map(|(type_id, closure)| (type_id, closure.into_iter().collect()))
            .collect();
        let direct_parents = store.parents_of(concept_id, well_known::IS_A)?;
        let concept_refsets: Vec<SctId> =
            store.refset_ids_for(concept_id)?.into_iter().collect();
        let preferred_term = locale
            .preferred_synonym(store, concept_id, locale_priority)?
            .map(|d| d.term)
            .unwrap_or_default();

        for description in store.descriptions_for(concept_id)? {
            let mut preferred_in = Vec::new();
            let mut acceptable_in = Vec::new();
            let mut description_refsets = Vec::new();
            for item in store.items_for(description.id)? {
                match item.acceptability_id().and_then(Acceptability::from_id) {
                    Some(Acceptability::Preferred) => preferred_in.push(item.refset_id),
                    Some(Acceptability::Acceptable) => acceptable_in.push(item.refset_id),
                    None => description_refsets.push(item.refset_id),
                }
            }
            writer.add(&DescriptionDoc {
                description_id: description.id,
                concept_id,
                term: description.term.clone(),
                preferred_term: preferred_term.clone(),
                module_id: description.module_id,
                type_id: description.type_id,
                concept_active: concept.active,
                description_active: description.active,
                direct_parents: direct_parents.clone(),
                ancestors: ancestors.clone(),
                preferred_in,
                acceptable_in,
                concept_refsets: concept_refsets.clone(),
                description_refsets,
            })?;
            documents += 1;
        }
    }
    writer.commit()?;
    tracing::info!(documents, "description index built");
    Ok(())
}

/// Rebuilds the members index at `path` from the store.
///
/// A first pass over the refset items discovers the column set (names
/// from the refset pattern and well-known identifiers); the second
/// streams one document per active item.
pub fn build_members_index(store: &Store, path: &std::path::Path) -> ServiceResult<()> {
    let mut columns: BTreeMap<String, MemberColumn> = BTreeMap::new();
    let mut patterns: BTreeMap<SctId, String> = BTreeMap::new();
    store.for_each_refset_item(|item| {
        if item.active {
            patterns
                .entry(item.refset_id)
                .or_insert_with(|| item.pattern());
        }
        Ok(())
    })?;
    for (refset_id, pattern) in &patterns {
        let names = refset::field_names(pattern, *refset_id);
        for (name, kind) in names.iter().zip(pattern.chars()) {
            let column = match kind {
                'c' => MemberColumn::Concept,
                'i' => MemberColumn::Integer,
                _ => MemberColumn::String,
            };
            columns.entry(name.clone()).or_insert(column);
        }
    }

    let index = MembersIndex::create(path, &columns)?;
    let mut writer = index.writer()?;
    let mut documents = 0u64;
    let mut result = Ok(());
    store.for_each_refset_item(|item| {
        if !item.active {
            return Ok(());
        }
        let names = refset::field_names(&item.pattern(), item.refset_id);
        let values = names
            .into_iter()
            .zip(item.fields.iter())
            .map(|(name, field)| {
                let value = match field {
                    RefsetField::Concept(id) => MemberValue::Concept(*id),
                    RefsetField::Integer(v) => MemberValue::Integer(*v as i64),
                    RefsetField::String(s) => MemberValue::String(s.clone()),
                };
                (name, value)
            })
            .collect();
        if let Err(e) = writer.add(&MemberDoc {
            item_id: item.id.to_string(),
            refset_id: item.refset_id,
            referenced_component_id: item.referenced_component_id,
            values,
        }) {
            if result.is_ok() {
                result = Err(e);
            }
            return Ok(());
        }
        documents += 1;
        Ok(())
    })?;
    result?;
    writer.commit()?;
    tracing::info!(documents, "members index built");
    Ok(())
}
