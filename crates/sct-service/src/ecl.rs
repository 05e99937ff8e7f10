//! ECL evaluation over the search indices and the store.
//!
//! Hierarchical operators over a concrete concept compile to exact-match
//! queries on the type-id-keyed closure fields of the description index;
//! ancestor walks, dotted attribute steps and refinements resolve through
//! the store's relationship indices. Term filters intersect with a
//! description text query; set operations are plain set algebra over the
//! intermediate results.

use std::collections::HashSet;

use sct_ecl::{
    Attribute, Comparison, Constraint, Filter, Focus, Operator, Refinement, TermSearch, TypeToken,
};
use sct_search::{DescriptionSearcher, MembersSearcher, Query};
use sct_store::Store;
use sct_types::{well_known, ConcreteValue, DescriptionType, SctId};
use tantivy::query::{BooleanQuery, Occur};

use crate::error::ServiceResult;
use crate::locale::LocaleResolver;

/// Evaluation context: the store, both searchers and the locale resolver
/// (for dialect filters).
pub(crate) struct EclContext<'a> {
    pub store: &'a Store,
    pub descriptions: &'a DescriptionSearcher,
    pub members: &'a MembersSearcher,
    pub locale: &'a LocaleResolver,
}

impl EclContext<'_> {
    /// Evaluates a constraint to its concept id set.
    pub fn evaluate(&self, constraint: &Constraint) -> ServiceResult<HashSet<SctId>> {
        match constraint {
            Constraint::Sub {
                operator,
                focus,
                filters,
            } => {
                let base = self.eval_focus(*operator, *focus)?;
                self.apply_filters(base, filters)
            }
            Constraint::Bracketed {
                operator,
                inner,
                filters,
            } => {
                let inner = self.evaluate(inner)?;
                let expanded = self.expand_set(*operator, inner)?;
                self.apply_filters(expanded, filters)
            }
            Constraint::And(items) => {
                let mut sets = items.iter().map(|c| self.evaluate(c));
                let mut result = match sets.next() {
                    Some(first) => first?,
                    None => return Ok(HashSet::new()),
                };
                for set in sets {
                    let set = set?;
                    result.retain(|id| set.contains(id));
                }
                Ok(result)
            }
            Constraint::Or(items) => {
                let mut result = HashSet::new();
                for item in items {
                    result.extend(self.evaluate(item)?);
                }
                Ok(result)
            }
            Constraint::Minus(left, right) => {
                let mut result = self.evaluate(left)?;
                let excluded = self.evaluate(right)?;
                result.retain(|id| !excluded.contains(id));
                Ok(result)
            }
            Constraint::Refined { focus, refinement } => {
                let base = self.evaluate(focus)?;
                let mut result = HashSet::new();
                for concept in base {
                    if self.refinement_matches(concept, refinement)? {
                        result.insert(concept);
                    }
                }
                Ok(result)
            }
            Constraint::Dotted { focus, steps } => {
                let mut current = self.evaluate(focus)?;
                for step in steps {
                    let types = self.evaluate(step)?;
                    let mut next = HashSet::new();
                    for concept in &current {
                        for type_id in &types {
                            next.extend(self.store.parents_of(*concept, *type_id)?);
                        }
                    }
                    current = next;
                }
                Ok(current)
            }
        }
    }

    fn eval_focus(&self, operator: Operator, focus: Focus) -> ServiceResult<HashSet<SctId>> {
        match focus {
            Focus::Wildcard => match operator {
                Operator::MemberOf => {
                    let installed: HashSet<u64> =
                        self.store.installed_refsets()?.into_iter().collect();
                    let query = self.members.q_refset_ids(&installed)?;
                    Ok(self.members.referenced_components(query.as_ref())?)
                }
                _ => self.all_active_concepts(),
            },
            Focus::Id(id) => match operator {
                Operator::SelfOnly => Ok(HashSet::from([id])),
                Operator::Descendants => {
                    let mut set = self.descendants_of(id)?;
                    set.remove(&id);
                    Ok(set)
                }
                Operator::DescendantsOrSelf => {
                    let mut set = self.descendants_of(id)?;
                    set.insert(id);
                    Ok(set)
                }
                Operator::Children => {
                    Ok(self.store.children_of(id, well_known::IS_A)?.into_iter().collect())
                }
                Operator::Ancestors => {
                    let mut set = self.store.all_parents(id, well_known::IS_A)?;
                    set.remove(&id);
                    Ok(set)
                }
                Operator::AncestorsOrSelf => Ok(self.store.all_parents(id, well_known::IS_A)?),
                Operator::Parents => {
                    Ok(self.store.parents_of(id, well_known::IS_A)?.into_iter().collect())
                }
                Operator::MemberOf => Ok(self
                    .descriptions
                    .concept_ids_matching(self.descriptions.q_member_of(id).as_ref())?),
            },
        }
    }

    fn expand_set(
        &self,
        operator: Operator,
        set: HashSet<SctId>,
    ) -> ServiceResult<HashSet<SctId>> {
        match operator {
            Operator::SelfOnly => Ok(set),
            Operator::Descendants => Ok(self.descriptions.concept_ids_matching(
                self.descriptions
                    .q_ancestor_any(well_known::IS_A, &set)
                    .as_ref(),
            )?),
            Operator::DescendantsOrSelf => {
                let mut out = self.descriptions.concept_ids_matching(
                    self.descriptions
                        .q_ancestor_any(well_known::IS_A, &set)
                        .as_ref(),
                )?;
                out.extend(set);
                Ok(out)
            }
            Operator::Children => {
                let mut out = HashSet::new();
                for id in &set {
                    out.extend(self.store.children_of(*id, well_known::IS_A)?);
                }
                Ok(out)
            }
            Operator::Ancestors => {
                let mut out = HashSet::new();
                for id in &set {
                    let mut parents = self.store.all_parents(*id, well_known::IS_A)?;
                    parents.remove(id);
                    out.extend(parents);
                }
                Ok(out)
            }
            Operator::AncestorsOrSelf => {
                let ids: Vec<SctId> = set.into_iter().collect();
                Ok(self.store.all_parents_of(&ids, well_known::IS_A)?)
            }
            Operator::Parents => {
                let mut out = HashSet::new();
                for id in &set {
                    out.extend(self.store.parents_of(*id, well_known::IS_A)?);
                }
                Ok(out)
            }
            Operator::MemberOf => Ok(self
                .descriptions
                .concept_ids_matching(self.descriptions.q_member_of_any(&set).as_ref())?),
        }
    }

    fn descendants_of(&self, id: SctId) -> ServiceResult<HashSet<SctId>> {
        Ok(self
            .descriptions
            .concept_ids_matching(self.descriptions.q_ancestor(well_known::IS_A, id).as_ref())?)
    }

    fn all_active_concepts(&self) -> ServiceResult<HashSet<SctId>> {
        Ok(self
            .descriptions
            .concept_ids_matching(self.descriptions.q_concept_active(true).as_ref())?)
    }

    /// Intersects a candidate set with the description-index queries the
    /// filters compile to.
    fn apply_filters(
        &self,
        base: HashSet<SctId>,
        filters: &[Filter],
    ) -> ServiceResult<HashSet<SctId>> {
        if filters.is_empty() || base.is_empty() {
            return Ok(base);
        }
        let mut clauses: Vec<(Occur, Box<dyn Query>)> =
            vec![(Occur::Must, self.descriptions.q_concepts(&base))];
        for filter in filters {
            clauses.push((Occur::Must, self.filter_query(filter)));
        }
        let query = BooleanQuery::new(clauses);
        Ok(self.descriptions.concept_ids_matching(&query)?)
    }

    fn filter_query(&self, filter: &Filter) -> Box<dyn Query> {
        match filter {
            Filter::Term(TermSearch::Match(s)) => self.descriptions.q_text(s, 0),
            Filter::Term(TermSearch::Wildcard(pattern)) => {
                self.descriptions.q_term_wildcard(pattern)
            }
            Filter::Type(tokens) => {
                let clauses: Vec<(Occur, Box<dyn Query>)> = tokens
                    .iter()
                    .map(|token| {
                        let type_id = match token {
                            TypeToken::Synonym => DescriptionType::SYNONYM_ID,
                            TypeToken::Fsn => DescriptionType::FSN_ID,
                            TypeToken::Definition => DescriptionType::DEFINITION_ID,
                        };
                        (Occur::Should, self.descriptions.q_type(type_id))
                    })
                    .collect();
                Box::new(BooleanQuery::new(clauses))
            }
            Filter::Dialect(aliases) | Filter::Language(aliases) => {
                let mut refsets = Vec::new();
                for alias in aliases {
                    refsets.extend(self.locale.match_locale(alias, false));
                }
                self.descriptions.q_acceptable_in(&refsets)
            }
        }
    }

    // -- refinements --------------------------------------------------------

    fn refinement_matches(
        &self,
        concept: SctId,
        refinement: &Refinement,
    ) -> ServiceResult<bool> {
        match refinement {
            Refinement::Attribute(attribute) => self.attribute_matches(concept, attribute),
            Refinement::Group {
                cardinality,
                refinement,
            } => {
                let groups = self.store.parent_relationship_groups(concept)?;
                // Ungrouped attributes behave as their own singleton groups.
                let mut group_sets: Vec<Vec<(SctId, SctId)>> = Vec::new();
                for (group, edges) in groups {
                    if group == 0 {
                        for edge in edges {
                            group_sets.push(vec![edge]);
                        }
                    } else {
                        group_sets.push(edges);
                    }
                }
                let mut matching = 0u32;
                for edges in &group_sets {
                    if self.group_matches(concept, edges, refinement)? {
                        matching += 1;
                    }
                }
                Ok(match cardinality {
                    Some(card) => card.allows(matching),
                    None => matching >= 1,
                })
            }
            Refinement::And(items) => {
                for item in items {
                    if !self.refinement_matches(concept, item)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Refinement::Or(items) => {
                for item in items {
                    if self.refinement_matches(concept, item)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    fn group_matches(
        &self,
        concept: SctId,
        edges: &[(SctId, SctId)],
        refinement: &Refinement,
    ) -> ServiceResult<bool> {
        match refinement {
            Refinement::Attribute(attribute) => {
                let types = self.evaluate(&attribute.name)?;
                match &attribute.comparison {
                    Comparison::Equal(value) => {
                        let values = self.evaluate(value)?;
                        let count = edges
                            .iter()
                            .filter(|(t, d)| types.contains(t) && values.contains(d))
                            .count() as u32;
                        Ok(match attribute.cardinality {
                            Some(card) => card.allows(count),
                            None => count >= 1,
                        })
                    }
                    Comparison::NotEqual(value) => {
                        let values = self.evaluate(value)?;
                        Ok(edges
                            .iter()
                            .any(|(t, d)| types.contains(t) && !values.contains(d)))
                    }
                    // Concrete comparisons are group-unaware.
                    _ => self.attribute_matches(concept, attribute),
                }
            }
            Refinement::Group { refinement, .. } => self.group_matches(concept, edges, refinement),
            Refinement::And(items) => {
                for item in items {
                    if !self.group_matches(concept, edges, item)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Refinement::Or(items) => {
                for item in items {
                    if self.group_matches(concept, edges, item)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    fn attribute_matches(&self, concept: SctId, attribute: &Attribute) -> ServiceResult<bool> {
        let types = self.evaluate(&attribute.name)?;
        let count = match &attribute.comparison {
            Comparison::Equal(value) => {
                let values = self.evaluate(value)?;
                if attribute.reversed {
                    self.reversed_edge_count(concept, &types, &values)?
                } else {
                    self.edge_count(concept, &types, |destination| values.contains(&destination))?
                }
            }
            Comparison::NotEqual(value) => {
                let values = self.evaluate(value)?;
                self.edge_count(concept, &types, |destination| !values.contains(&destination))?
            }
            Comparison::Numeric(op, operand) => {
                let mut count = 0u32;
                for rel in self.store.concrete_relationships_for(concept)? {
                    if types.contains(&rel.type_id) {
                        if let Some(candidate) = rel.value.as_f64() {
                            if op.matches(candidate, *operand) {
                                count += 1;
                            }
                        }
                    }
                }
                count
            }
            Comparison::StringEqual(expected) => {
                self.concrete_string_count(concept, &types, |s| s == expected)?
            }
            Comparison::StringNotEqual(expected) => {
                self.concrete_string_count(concept, &types, |s| s != expected)?
            }
        };
        Ok(match attribute.cardinality {
            Some(card) => card.allows(count),
            None => count >= 1,
        })
    }

    fn edge_count<F>(
        &self,
        concept: SctId,
        types: &HashSet<SctId>,
        accept: F,
    ) -> ServiceResult<u32>
    where
        F: Fn(SctId) -> bool,
    {
        let mut count = 0u32;
        for (_, edges) in self.store.parent_relationship_groups(concept)? {
            for (type_id, destination) in edges {
                if types.contains(&type_id) && accept(destination) {
                    count += 1;
                }
            }
        }
        Ok(count)
    }

    fn reversed_edge_count(
        &self,
        concept: SctId,
        types: &HashSet<SctId>,
        values: &HashSet<SctId>,
    ) -> ServiceResult<u32> {
        let mut count = 0u32;
        for type_id in types {
            for source in self.store.children_of(concept, *type_id)? {
                if values.contains(&source) {
                    count += 1;
                }
            }
        }
        Ok(count)
    }

    fn concrete_string_count<F>(
        &self,
        concept: SctId,
        types: &HashSet<SctId>,
        accept: F,
    ) -> ServiceResult<u32>
    where
        F: Fn(&str) -> bool,
    {
        let mut count = 0u32;
        for rel in self.store.concrete_relationships_for(concept)? {
            if types.contains(&rel.type_id) {
                if let ConcreteValue::String(s) = &rel.value {
                    if accept(s) {
                        count += 1;
                    }
                }
            }
        }
        Ok(count)
    }
}
