//! # sct-store
//!
//! Persistent, read-optimised store for SNOMED CT components.
//!
//! Components live in an LMDB environment, one named database per kind,
//! with the latest effective time winning on write. [`Store::index`]
//! derives the query indices: concept descriptions, typed parent and
//! child edges, refset memberships, association targets, installed
//! refsets and module versions. Transitive closure queries walk the edge
//! databases lazily.
//!
//! ## Usage
//!
//! ```ignore
//! use sct_store::{Store, StoreOptions};
//!
//! let store = Store::open(&root.join("store.db"), &StoreOptions::default())?;
//! store.write_components(&batch)?;
//! store.index()?;
//!
//! assert!(store.is_a(24700007, 6118003)?);
//! ```

#![warn(missing_docs)]

mod error;
mod hierarchy;
mod index;
mod keys;
mod refsets;
mod store;

pub use error::{StoreError, StoreResult};
pub use store::{ComponentCounts, Store, StoreOptions};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sct_types::{
        well_known, Component, Concept, DefinitionStatus, Description, DescriptionType,
        RefsetField, RefsetItem, Relationship,
    };
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn concept(id: u64) -> Component {
        Component::Concept(Concept {
            id,
            effective_time: date(2002, 1, 31),
            active: true,
            module_id: well_known::CORE_MODULE,
            definition_status_id: DefinitionStatus::PRIMITIVE_ID,
        })
    }

    fn description(id: u64, concept_id: u64, term: &str, active: bool) -> Component {
        Component::Description(Description {
            id,
            effective_time: date(2002, 1, 31),
            active,
            module_id: well_known::CORE_MODULE,
            concept_id,
            language_code: "en".to_string(),
            type_id: DescriptionType::SYNONYM_ID,
            term: term.to_string(),
            case_significance_id: 900000000000448009,
        })
    }

    fn is_a(id: u64, source: u64, destination: u64, active: bool) -> Component {
        Component::Relationship(Relationship {
            id,
            effective_time: date(2002, 1, 31),
            active,
            module_id: well_known::CORE_MODULE,
            source_id: source,
            destination_id: destination,
            relationship_group: 0,
            type_id: well_known::IS_A,
            characteristic_type_id: 900000000000011006,
            modifier_id: 900000000000451002,
        })
    }

    fn simple_member(uuid: u128, refset: u64, component: u64, active: bool) -> Component {
        Component::RefsetItem(RefsetItem {
            id: Uuid::from_u128(uuid),
            effective_time: date(2020, 1, 1),
            active,
            module_id: well_known::CORE_MODULE,
            refset_id: refset,
            referenced_component_id: component,
            fields: vec![],
        })
    }

    /// Multiple sclerosis under demyelinating disorder under the root.
    fn seeded_store(dir: &std::path::Path) -> Store {
        let store = Store::open(dir, &StoreOptions::default()).unwrap();
        store
            .write_components(&[
                concept(138875005),
                concept(6118003),
                concept(24700007),
                concept(45170000),
                description(1, 24700007, "Multiple sclerosis", true),
                description(2, 24700007, "Disseminated sclerosis", false),
                is_a(10, 6118003, 138875005, true),
                is_a(11, 24700007, 6118003, true),
                is_a(12, 45170000, 138875005, true),
                simple_member(1, 991411000000109, 24700007, true),
                simple_member(2, 991411000000109, 45170000, false),
            ])
            .unwrap();
        store.index().unwrap();
        store
    }

    #[test]
    fn test_point_lookups() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path());

        let concept = store.concept(24700007).unwrap().unwrap();
        assert_eq!(concept.module_id, well_known::CORE_MODULE);
        assert!(store.concept(999).unwrap().is_none());

        let description = store.description(1).unwrap().unwrap();
        assert_eq!(description.term, "Multiple sclerosis");
    }

    #[test]
    fn test_descriptions_include_inactive() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path());

        let descriptions = store.descriptions_for(24700007).unwrap();
        assert_eq!(descriptions.len(), 2);
        assert!(descriptions.iter().any(|d| !d.active));
    }

    #[test]
    fn test_latest_effective_time_wins_in_any_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path(), &StoreOptions::default()).unwrap();

        let older = Concept {
            id: 24700007,
            effective_time: date(2002, 1, 31),
            active: true,
            module_id: well_known::CORE_MODULE,
            definition_status_id: DefinitionStatus::PRIMITIVE_ID,
        };
        let newer = Concept {
            effective_time: date(2023, 1, 31),
            active: false,
            ..older.clone()
        };

        // Newer first, older second: the older write must not supersede.
        store
            .write_components(&[Component::Concept(newer.clone())])
            .unwrap();
        store
            .write_components(&[Component::Concept(older.clone())])
            .unwrap();
        assert_eq!(store.concept(24700007).unwrap().unwrap(), newer);

        // And in release order on a fresh id.
        let older2 = Concept { id: 73211009, ..older };
        let newer2 = Concept { id: 73211009, ..newer };
        store.write_components(&[Component::Concept(older2)]).unwrap();
        store
            .write_components(&[Component::Concept(newer2.clone())])
            .unwrap();
        assert_eq!(store.concept(73211009).unwrap().unwrap(), newer2);
    }

    #[test]
    fn test_all_parents_is_reflexive_and_transitive() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path());

        let parents = store.all_parents(24700007, well_known::IS_A).unwrap();
        assert!(parents.contains(&24700007));
        assert!(parents.contains(&6118003));
        assert!(parents.contains(&138875005));
        assert!(!parents.contains(&45170000));
    }

    #[test]
    fn test_children_mirror_parents() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path());

        let children = store.all_children(138875005, well_known::IS_A).unwrap();
        assert!(children.contains(&138875005));
        assert!(children.contains(&6118003));
        assert!(children.contains(&24700007));
        assert!(children.contains(&45170000));

        for &child in &children {
            if child == 138875005 {
                continue;
            }
            assert!(store.is_a(child, 138875005).unwrap());
        }
    }

    #[test]
    fn test_is_a_subsumption() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path());

        assert!(store.is_a(24700007, 6118003).unwrap());
        assert!(store.is_a(24700007, 24700007).unwrap());
        assert!(!store.is_a(24700007, 45170000).unwrap());
        assert!(!store.is_a(6118003, 24700007).unwrap());
    }

    #[test]
    fn test_inactivating_relationship_removes_edge() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path());

        // A later release inactivates MS is-a demyelinating disorder.
        store
            .write_components(&[Component::Relationship(Relationship {
                id: 11,
                effective_time: date(2023, 1, 31),
                active: false,
                module_id: well_known::CORE_MODULE,
                source_id: 24700007,
                destination_id: 6118003,
                relationship_group: 0,
                type_id: well_known::IS_A,
                characteristic_type_id: 900000000000011006,
                modifier_id: 900000000000451002,
            })])
            .unwrap();
        store.index().unwrap();

        let parents = store.all_parents(24700007, well_known::IS_A).unwrap();
        assert_eq!(parents, std::collections::HashSet::from([24700007]));
    }

    #[test]
    fn test_refset_membership_indices() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path());

        // Active member indexed both ways.
        let refsets = store.refset_ids_for(24700007).unwrap();
        assert!(refsets.contains(&991411000000109));

        let items = store.items_for_refset(24700007, 991411000000109).unwrap();
        assert_eq!(items.len(), 1);

        // Inactive member is absent.
        assert!(store.refset_ids_for(45170000).unwrap().is_empty());

        let installed = store.installed_refsets().unwrap();
        assert!(installed.contains(&991411000000109));
    }

    #[test]
    fn test_association_targets_index() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path());

        store
            .write_components(&[Component::RefsetItem(RefsetItem {
                id: Uuid::from_u128(77),
                effective_time: date(2020, 1, 1),
                active: true,
                module_id: well_known::CORE_MODULE,
                refset_id: well_known::SAME_AS_REFSET,
                referenced_component_id: 192928003,
                fields: vec![RefsetField::Concept(24700007)],
            })])
            .unwrap();
        store.index().unwrap();

        let items = store.association_items_to(24700007).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].referenced_component_id, 192928003);
    }

    #[test]
    fn test_index_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path());

        let parents_before = store.all_parents(24700007, well_known::IS_A).unwrap();
        let refsets_before = store.refset_ids_for(24700007).unwrap();
        store.index().unwrap();
        assert_eq!(store.all_parents(24700007, well_known::IS_A).unwrap(), parents_before);
        assert_eq!(store.refset_ids_for(24700007).unwrap(), refsets_before);
    }

    #[test]
    fn test_stream_all_concepts() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path());

        let (tx, rx) = crossbeam_channel::unbounded();
        store.stream_all_concepts(&tx).unwrap();
        drop(tx);
        let streamed: Vec<_> = rx.iter().collect();
        assert_eq!(streamed.len(), 4);
    }

    #[test]
    fn test_module_versions() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path());

        let versions = store.module_versions().unwrap();
        assert_eq!(
            versions.get(&well_known::CORE_MODULE),
            Some(&date(2002, 1, 31))
        );
    }

    #[test]
    fn test_parent_relationship_groups() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path(), &StoreOptions::default()).unwrap();
        store
            .write_components(&[
                concept(24700007),
                concept(6118003),
                concept(123037004),
                Component::Relationship(Relationship {
                    id: 20,
                    effective_time: date(2002, 1, 31),
                    active: true,
                    module_id: well_known::CORE_MODULE,
                    source_id: 24700007,
                    destination_id: 123037004,
                    relationship_group: 1,
                    type_id: well_known::FINDING_SITE,
                    characteristic_type_id: 900000000000011006,
                    modifier_id: 900000000000451002,
                }),
                is_a(21, 24700007, 6118003, true),
            ])
            .unwrap();
        store.index().unwrap();

        let groups = store.parent_relationship_groups(24700007).unwrap();
        assert_eq!(groups.get(&0).unwrap(), &vec![(well_known::IS_A, 6118003)]);
        assert_eq!(
            groups.get(&1).unwrap(),
            &vec![(well_known::FINDING_SITE, 123037004)]
        );
    }
}
