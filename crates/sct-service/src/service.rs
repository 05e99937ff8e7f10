//! The terminology service facade.
//!
//! A service binds the component store, both index searchers, the locale
//! resolver and the MRCM domain classifier behind one handle. Lifecycle
//! is ownership-driven: `open` moves the directory's resources into the
//! handle, every query operation borrows it, and dropping (or `close`)
//! releases everything. All operations take the handle explicitly; there
//! is no ambient state.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use sct_ecl::parse_ecl;
use sct_search::{
    DescriptionIndex, DescriptionSearcher, MembersIndex, MembersSearcher, SearchHit, SearchParams,
};
use sct_store::{ComponentCounts, Store, StoreOptions};
use sct_types::mrcm::MrcmDomain;
use sct_types::{
    well_known, Concept, ConcreteRelationship, Description, RefsetItem, Relationship, SctId,
};
use tantivy::query::{BooleanQuery, Occur};
use uuid::Uuid;

use crate::ecl::EclContext;
use crate::error::{ServiceError, ServiceResult};
use crate::locale::LocaleResolver;
use crate::manifest::Manifest;

/// Options for opening a service.
#[derive(Debug, Clone, Default)]
pub struct ServiceOptions {
    /// Default locale for preferred term fallback, e.g. `"en-GB"`.
    pub default_locale: Option<String>,
    /// Store engine options.
    pub store: StoreOptions,
}

/// A concept bundled with its commonly needed context.
#[derive(Debug, Clone)]
pub struct ExtendedConcept {
    /// The concept itself.
    pub concept: Concept,
    /// All descriptions, active and inactive.
    pub descriptions: Vec<Description>,
    /// Per relationship type, the expanded destination closure.
    pub parent_relationships: BTreeMap<SctId, HashSet<SctId>>,
    /// Per relationship type, the direct destinations.
    pub direct_parent_relationships: BTreeMap<SctId, Vec<SctId>>,
    /// Concrete values on the concept.
    pub concrete_values: Vec<ConcreteRelationship>,
    /// Refsets the concept is an active member of.
    pub refsets: BTreeSet<SctId>,
}

/// An opened terminology service.
pub struct Service {
    root: PathBuf,
    manifest: Manifest,
    store: Store,
    descriptions: DescriptionSearcher,
    members: MembersSearcher,
    locale: LocaleResolver,
    mrcm_domains: Vec<MrcmDomain>,
}

impl Service {
    /// Opens the terminology database at a directory, read-only.
    ///
    /// Fails fast with [`ServiceError::NotFound`] when no database
    /// exists, [`ServiceError::IncompatibleVersion`] when the manifest
    /// version does not match this build, and
    /// [`ServiceError::CorruptManifest`] when it cannot be read.
    pub fn open(root: &Path, options: &ServiceOptions) -> ServiceResult<Self> {
        if !root.exists() {
            return Err(ServiceError::NotFound {
                path: root.to_path_buf(),
            });
        }
        let manifest = Manifest::read(root)?;
        manifest.verify()?;

        let store = Store::open(&root.join(&manifest.store), &options.store)?;
        let descriptions = DescriptionIndex::open(&root.join(&manifest.search))?.searcher()?;
        let members = MembersIndex::open(&root.join(&manifest.members))?.searcher()?;

        let installed_refsets = store.installed_refsets()?;
        let installed_locales: Vec<SctId> = installed_refsets
            .iter()
            .copied()
            .filter(|refset| well_known::is_language_refset(*refset))
            .collect();
        let locale = LocaleResolver::new(installed_locales, options.default_locale.as_deref());

        let mut mrcm_domains = Vec::new();
        if installed_refsets.contains(&well_known::MRCM_DOMAIN_REFSET) {
            let query = members.q_refset_id(well_known::MRCM_DOMAIN_REFSET)?;
            for domain_id in members.referenced_components(query.as_ref())? {
                for item in store.items_for_refset(domain_id, well_known::MRCM_DOMAIN_REFSET)? {
                    if let Some(domain) = MrcmDomain::from_item(&item) {
                        mrcm_domains.push(domain);
                    }
                }
            }
        }

        tracing::info!(root = %root.display(), "terminology service opened");
        Ok(Self {
            root: root.to_path_buf(),
            manifest,
            store,
            descriptions,
            members,
            locale,
            mrcm_domains,
        })
    }

    /// Closes the service, releasing the store and index readers.
    ///
    /// Dropping the handle is equivalent; closing twice is impossible by
    /// construction since `close` consumes the handle.
    pub fn close(self) {
        tracing::info!(root = %self.root.display(), "terminology service closed");
    }

    /// The manifest the service was opened with.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub(crate) fn store(&self) -> &Store {
        &self.store
    }

    pub(crate) fn members_searcher(&self) -> &MembersSearcher {
        &self.members
    }

    pub(crate) fn ecl_context(&self) -> EclContext<'_> {
        EclContext {
            store: &self.store,
            descriptions: &self.descriptions,
            members: &self.members,
            locale: &self.locale,
        }
    }

    // -- point lookups ------------------------------------------------------

    /// Fetches a concept by id.
    pub fn concept(&self, id: SctId) -> ServiceResult<Option<Concept>> {
        Ok(self.store.concept(id)?)
    }

    /// Fetches a description by id.
    pub fn description(&self, id: SctId) -> ServiceResult<Option<Description>> {
        Ok(self.store.description(id)?)
    }

    /// Fetches a relationship by id.
    pub fn relationship(&self, id: SctId) -> ServiceResult<Option<Relationship>> {
        Ok(self.store.relationship(id)?)
    }

    /// Fetches a refset item by UUID.
    pub fn refset_item(&self, id: &Uuid) -> ServiceResult<Option<RefsetItem>> {
        Ok(self.store.refset_item(id)?)
    }

    /// Bundles a concept with descriptions, relationships, concrete
    /// values and refset memberships.
    pub fn extended_concept(&self, id: SctId) -> ServiceResult<Option<ExtendedConcept>> {
        let concept = match self.store.concept(id)? {
            Some(concept) => concept,
            None => return Ok(None),
        };
        Ok(Some(ExtendedConcept {
            concept,
            descriptions: self.store.descriptions_for(id)?,
            parent_relationships: self.store.parents_expanded(id)?,
            direct_parent_relationships: self.store.parent_relationships(id)?,
            concrete_values: self.store.concrete_relationships_for(id)?,
            refsets: self.store.refset_ids_for(id)?,
        }))
    }

    // -- descriptions and terms ---------------------------------------------

    /// All descriptions of a concept, active and inactive.
    pub fn descriptions(&self, id: SctId) -> ServiceResult<Vec<Description>> {
        Ok(self.store.descriptions_for(id)?)
    }

    /// Active synonyms of a concept. With language refsets given, only
    /// synonyms preferred or acceptable in one of them.
    pub fn synonyms(
        &self,
        id: SctId,
        language_refsets: Option<&[SctId]>,
    ) -> ServiceResult<Vec<Description>> {
        let mut synonyms: Vec<Description> = self
            .store
            .descriptions_for(id)?
            .into_iter()
            .filter(|d| d.active && d.is_synonym())
            .collect();
        if let Some(refsets) = language_refsets {
            let mut filtered = Vec::new();
            for description in synonyms {
                let mut accepted = false;
                for refset in refsets {
                    if !self.store.items_for_refset(description.id, *refset)?.is_empty() {
                        accepted = true;
                        break;
                    }
                }
                if accepted {
                    filtered.push(description);
                }
            }
            synonyms = filtered;
        }
        Ok(synonyms)
    }

    /// The preferred synonym under a language range, e.g. `"en-GB"`.
    ///
    /// With `fallback`, an unmatched range falls back to the service's
    /// default locale rather than returning nothing.
    pub fn preferred_synonym(
        &self,
        id: SctId,
        language_range: &str,
        fallback: bool,
    ) -> ServiceResult<Option<Description>> {
        let refsets = self.locale.match_locale(language_range, fallback);
        self.locale.preferred_synonym(&self.store, id, &refsets)
    }

    /// The preferred synonym under an explicit refset priority list.
    pub fn preferred_synonym_in(
        &self,
        id: SctId,
        language_refsets: &[SctId],
    ) -> ServiceResult<Option<Description>> {
        self.locale.preferred_synonym(&self.store, id, language_refsets)
    }

    /// The fully specified name under a language range.
    pub fn fully_specified_name(
        &self,
        id: SctId,
        language_range: &str,
    ) -> ServiceResult<Option<Description>> {
        let refsets = self.locale.match_locale(language_range, true);
        self.locale.fully_specified_name(&self.store, id, &refsets)
    }

    /// Resolves a language range to installed language refsets.
    pub fn match_locale(&self, language_range: &str, fallback: bool) -> Vec<SctId> {
        self.locale.match_locale(language_range, fallback)
    }

    // -- hierarchy ----------------------------------------------------------

    /// Transitive parents of the given concepts (including themselves),
    /// via the given relationship type (Is-A when `None`).
    pub fn all_parents(
        &self,
        ids: &[SctId],
        type_id: Option<SctId>,
    ) -> ServiceResult<HashSet<SctId>> {
        Ok(self
            .store
            .all_parents_of(ids, type_id.unwrap_or(well_known::IS_A))?)
    }

    /// Transitive children of a concept (including itself).
    pub fn all_children(
        &self,
        id: SctId,
        type_id: Option<SctId>,
    ) -> ServiceResult<HashSet<SctId>> {
        Ok(self
            .store
            .all_children(id, type_id.unwrap_or(well_known::IS_A))?)
    }

    /// Direct parent relationships of a concept, by type.
    pub fn parent_relationships(
        &self,
        id: SctId,
    ) -> ServiceResult<BTreeMap<SctId, Vec<SctId>>> {
        Ok(self.store.parent_relationships(id)?)
    }

    /// Parent relationships with destinations expanded to their Is-A
    /// closure; restricted to one type when given.
    pub fn parent_relationships_expanded(
        &self,
        id: SctId,
        type_id: Option<SctId>,
    ) -> ServiceResult<BTreeMap<SctId, HashSet<SctId>>> {
        match type_id {
            Some(type_id) => {
                let expanded = self.store.parents_expanded_of_type(id, type_id)?;
                Ok(BTreeMap::from([(type_id, expanded)]))
            }
            None => Ok(self.store.parents_expanded(id)?),
        }
    }

    /// Concepts pointing at this one through the given relationship type.
    pub fn child_relationships_of_type(
        &self,
        id: SctId,
        type_id: SctId,
    ) -> ServiceResult<Vec<SctId>> {
        Ok(self.store.children_of(id, type_id)?)
    }

    /// Is-A subsumption test: is `id` subsumed by `subsumer`?
    pub fn subsumed_by(&self, id: SctId, subsumer: SctId) -> ServiceResult<bool> {
        Ok(self.store.is_a(id, subsumer)?)
    }

    /// True when any of `ids` is subsumed by any of `parent_ids`.
    pub fn are_any(&self, ids: &[SctId], parent_ids: &[SctId]) -> ServiceResult<bool> {
        for id in ids {
            for parent in parent_ids {
                if self.store.is_a(*id, *parent)? {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    // -- search -------------------------------------------------------------

    /// Free-text search over descriptions.
    ///
    /// An ECL `constraint` narrows results; `accept_language` or explicit
    /// `language_refset_ids` filter descriptions by dialect acceptability.
    pub fn search(&self, request: &SearchRequest) -> ServiceResult<Vec<SearchHit>> {
        let mut language_refsets = request.language_refset_ids.clone();
        if language_refsets.is_empty() {
            if let Some(range) = &request.accept_language {
                language_refsets = self.locale.match_locale(range, true);
            }
        }

        let mut clauses: Vec<(Occur, Box<dyn sct_search::Query>)> = Vec::new();
        if let Some(ecl) = &request.constraint {
            let constraint = parse_ecl(ecl)?;
            let concepts = self.ecl_context().evaluate(&constraint)?;
            clauses.push((Occur::Must, self.descriptions.q_concepts(&concepts)));
        }
        if !language_refsets.is_empty() {
            clauses.push((
                Occur::Must,
                self.descriptions.q_acceptable_in(&language_refsets),
            ));
        }
        let constraint_query: Option<Box<dyn sct_search::Query>> = match clauses.len() {
            0 => None,
            1 => clauses.pop().map(|(_, query)| query),
            _ => Some(Box::new(BooleanQuery::new(clauses))),
        };
        Ok(self
            .descriptions
            .search(&request.params, constraint_query.as_deref())?)
    }

    // -- refsets ------------------------------------------------------------

    /// Refsets with at least one active member.
    pub fn installed_refsets(&self) -> ServiceResult<BTreeSet<SctId>> {
        Ok(self.store.installed_refsets()?)
    }

    /// Active refset items referencing a component.
    pub fn refset_items_for(&self, component_id: SctId) -> ServiceResult<Vec<RefsetItem>> {
        Ok(self.store.items_for(component_id)?)
    }

    /// The referenced components of one or more refsets.
    pub fn refset_members(&self, refset_ids: &[SctId]) -> ServiceResult<HashSet<SctId>> {
        let set: HashSet<u64> = refset_ids.iter().copied().collect();
        let query = self.members.q_refset_ids(&set)?;
        Ok(self.members.referenced_components(query.as_ref())?)
    }

    /// Members of a refset whose field equals the value.
    pub fn member_field(
        &self,
        refset_id: SctId,
        field: &str,
        value: &str,
    ) -> ServiceResult<HashSet<SctId>> {
        Ok(self.members.member_field(refset_id, field, value)?)
    }

    /// Members of a refset whose field starts with the prefix.
    pub fn member_field_prefix(
        &self,
        refset_id: SctId,
        field: &str,
        prefix: &str,
    ) -> ServiceResult<HashSet<SctId>> {
        Ok(self.members.member_field_prefix(refset_id, field, prefix)?)
    }

    /// Members of a refset whose field matches the wildcard pattern.
    pub fn member_field_wildcard(
        &self,
        refset_id: SctId,
        field: &str,
        pattern: &str,
    ) -> ServiceResult<HashSet<SctId>> {
        Ok(self.members.member_field_wildcard(refset_id, field, pattern)?)
    }

    // -- MRCM ---------------------------------------------------------------

    /// MRCM domains whose domain concept subsumes the given concept.
    pub fn mrcm_domains_for(&self, id: SctId) -> ServiceResult<Vec<MrcmDomain>> {
        let mut out = Vec::new();
        for domain in &self.mrcm_domains {
            if self.store.is_a(id, domain.domain_id)? {
                out.push(domain.clone());
            }
        }
        Ok(out)
    }
}

/// Parameters for [`Service::search`].
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    /// Text, paging and filter parameters.
    pub params: SearchParams,
    /// Optional ECL constraint narrowing the result concepts.
    pub constraint: Option<String>,
    /// RFC 3066 language priority list for dialect filtering.
    pub accept_language: Option<String>,
    /// Explicit language refset priority, overriding `accept_language`.
    pub language_refset_ids: Vec<SctId>,
}

/// Status summary options.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusOptions {
    /// Include component counts (a table scan).
    pub counts: bool,
    /// Include the installed refset ids.
    pub installed_refsets: bool,
    /// Include the module version list.
    pub modules: bool,
}

/// Service status summary.
#[derive(Debug, Clone, Default)]
pub struct Status {
    /// Release descriptions from the root concept's active synonyms.
    pub releases: Vec<String>,
    /// Installed language refsets.
    pub locales: Vec<SctId>,
    /// Component counts, when requested.
    pub counts: Option<ComponentCounts>,
    /// Installed refsets, when requested.
    pub installed_refsets: Option<BTreeSet<SctId>>,
    /// Latest effective time per module, when requested.
    pub modules: Option<BTreeMap<SctId, chrono::NaiveDate>>,
}

impl Service {
    /// Summarises the opened database.
    pub fn status(&self, options: &StatusOptions) -> ServiceResult<Status> {
        let releases = self
            .store
            .descriptions_for(well_known::SNOMED_CT_ROOT)?
            .into_iter()
            .filter(|d| d.active && d.is_synonym())
            .map(|d| d.term)
            .collect();
        Ok(Status {
            releases,
            locales: self.locale.installed().to_vec(),
            counts: if options.counts {
                Some(self.store.counts()?)
            } else {
                None
            },
            installed_refsets: if options.installed_refsets {
                Some(self.store.installed_refsets()?)
            } else {
                None
            },
            modules: if options.modules {
                Some(self.store.module_versions()?)
            } else {
                None
            },
        })
    }
}

// -- ECL public surface -----------------------------------------------------

impl Service {
    /// Expands an ECL expression to concept ids. Unordered; truncated to
    /// `max_hits` when given.
    pub fn expand_ecl(
        &self,
        ecl: &str,
        max_hits: Option<usize>,
    ) -> ServiceResult<HashSet<SctId>> {
        let constraint = parse_ecl(ecl)?;
        let mut result = self.ecl_context().evaluate(&constraint)?;
        if let Some(max) = max_hits {
            if result.len() > max {
                result = result.into_iter().take(max).collect();
            }
        }
        Ok(result)
    }

    /// Expands an ECL expression and adds historically associated
    /// concepts for every match.
    pub fn expand_ecl_historic(&self, ecl: &str) -> ServiceResult<HashSet<SctId>> {
        let modern = self.expand_ecl(ecl, None)?;
        let ids: Vec<SctId> = modern.iter().copied().collect();
        self.with_historical(&ids, None)
    }

    /// Filters `ids` to those satisfying the ECL expression.
    pub fn intersect_ecl(&self, ids: &[SctId], ecl: &str) -> ServiceResult<HashSet<SctId>> {
        let constraint = parse_ecl(ecl)?;
        let matching = self.ecl_context().evaluate(&constraint)?;
        Ok(ids.iter().copied().filter(|id| matching.contains(id)).collect())
    }

    /// Returns true when the input parses as ECL, without evaluating.
    pub fn valid_ecl(&self, ecl: &str) -> bool {
        sct_ecl::valid_ecl(ecl)
    }
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("root", &self.root)
            .field("version", &self.manifest.version)
            .finish()
    }
}
