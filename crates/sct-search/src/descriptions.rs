//! Inverted text index over descriptions.
//!
//! One document per description. Alongside the tokenised term the
//! document carries exact-match numeric fields for ids and memberships, a
//! stored preferred term resolved at indexing time, and, for every parent
//! relationship type of the concept, a numeric field named by the type id
//! holding the full transitive closure of destinations. Ranked queries
//! multiply the lexical score by a length boost (`1/sqrt(len(term))`) so
//! shorter terms rank first.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use tantivy::collector::{DocSetCollector, TopDocs};
use tantivy::query::{
    AllQuery, BooleanQuery, EmptyQuery, FuzzyTermQuery, Occur, Query, QueryClone, TermQuery,
    TermSetQuery,
};
use tantivy::schema::{
    IndexRecordOption, Schema, Value, FAST, INDEXED, STORED, STRING, TEXT,
};
use tantivy::{DocId, Index, IndexReader, IndexWriter, Score, SegmentReader, TantivyDocument, Term};

use crate::error::SearchResult;

/// Well-known description type id for fully specified names.
const FSN_TYPE_ID: u64 = 900000000000003001;

/// Default number of hits for ranked queries.
pub const DEFAULT_MAX_HITS: usize = 200;

/// A description document prepared for indexing.
///
/// The indexer resolves everything that needs the store (closures,
/// memberships, the preferred term) before handing the document over, so
/// the index stays storage-agnostic.
#[derive(Debug, Clone, Default)]
pub struct DescriptionDoc {
    /// Description identifier.
    pub description_id: u64,
    /// Owning concept identifier.
    pub concept_id: u64,
    /// The description term.
    pub term: String,
    /// Preferred synonym of the concept under the configured locale
    /// priority, stored for result rendering.
    pub preferred_term: String,
    /// Module of the description.
    pub module_id: u64,
    /// Description type.
    pub type_id: u64,
    /// Whether the owning concept is active.
    pub concept_active: bool,
    /// Whether the description is active.
    pub description_active: bool,
    /// Direct Is-A parents of the concept.
    pub direct_parents: Vec<u64>,
    /// Per relationship type, the transitive closure of destinations.
    pub ancestors: BTreeMap<u64, Vec<u64>>,
    /// Language refsets in which this description is preferred.
    pub preferred_in: Vec<u64>,
    /// Language refsets in which this description is acceptable.
    pub acceptable_in: Vec<u64>,
    /// Refsets the owning concept is a member of.
    pub concept_refsets: Vec<u64>,
    /// Refsets this description is a member of.
    pub description_refsets: Vec<u64>,
}

/// Search parameters for ranked description search.
#[derive(Debug, Clone, Default)]
pub struct SearchParams {
    /// The search string; tokenised on whitespace, lowercased.
    pub s: Option<String>,
    /// Maximum ranked hits; defaults to [`DEFAULT_MAX_HITS`].
    pub max_hits: Option<usize>,
    /// Fuzzy edit distance applied to each token (0 disables).
    pub fuzzy: u8,
    /// Retry edit distance when an exact search returns nothing.
    pub fallback_fuzzy: u8,
    /// Include fully specified names.
    pub show_fsn: bool,
    /// Include descriptions of inactive concepts.
    pub inactive_concepts: bool,
    /// Include inactive descriptions.
    pub inactive_descriptions: bool,
    /// Per attribute type, the allowed destination values.
    pub properties: BTreeMap<u64, Vec<u64>>,
    /// Restrict to concepts that are members of any of these refsets.
    pub concept_refsets: Vec<u64>,
    /// Restrict to descriptions that are members of any of these refsets.
    pub description_refsets: Vec<u64>,
    /// Collapse repeated (concept, term) pairs.
    pub remove_duplicates: bool,
}

/// One ranked search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    /// Matching description.
    pub description_id: u64,
    /// Owning concept.
    pub concept_id: u64,
    /// The matching term.
    pub term: String,
    /// The concept's preferred term under the index's locale priority.
    pub preferred_term: String,
}

#[derive(Debug, Clone, Copy)]
struct Fields {
    term: tantivy::schema::Field,
    length_boost: tantivy::schema::Field,
    module_id: tantivy::schema::Field,
    type_id: tantivy::schema::Field,
    description_id: tantivy::schema::Field,
    concept_id: tantivy::schema::Field,
    concept_active: tantivy::schema::Field,
    description_active: tantivy::schema::Field,
    preferred_term: tantivy::schema::Field,
    direct_parents: tantivy::schema::Field,
    preferred_in: tantivy::schema::Field,
    acceptable_in: tantivy::schema::Field,
    concept_refsets: tantivy::schema::Field,
    description_refsets: tantivy::schema::Field,
}

impl Fields {
    fn resolve(schema: &Schema) -> SearchResult<Self> {
        Ok(Self {
            term: schema.get_field("term")?,
            length_boost: schema.get_field("length_boost")?,
            module_id: schema.get_field("module_id")?,
            type_id: schema.get_field("type_id")?,
            description_id: schema.get_field("description_id")?,
            concept_id: schema.get_field("concept_id")?,
            concept_active: schema.get_field("concept_active")?,
            description_active: schema.get_field("description_active")?,
            preferred_term: schema.get_field("preferred_term")?,
            direct_parents: schema.get_field("direct_parents")?,
            preferred_in: schema.get_field("preferred_in")?,
            acceptable_in: schema.get_field("acceptable_in")?,
            concept_refsets: schema.get_field("concept_refsets")?,
            description_refsets: schema.get_field("description_refsets")?,
        })
    }
}

/// The description index: creation, writing and searching.
pub struct DescriptionIndex {
    index: Index,
    schema: Schema,
    fields: Fields,
}

impl DescriptionIndex {
    /// Creates a fresh index at the directory, replacing any previous one.
    ///
    /// `relationship_types` enumerates every relationship type id in the
    /// distribution; each becomes a numeric field (named by the type id)
    /// holding closure values, which is what makes "is-a X" an
    /// exact-match query.
    pub fn create(path: &Path, relationship_types: &[u64]) -> SearchResult<Self> {
        if path.exists() {
            std::fs::remove_dir_all(path)?;
        }
        std::fs::create_dir_all(path)?;

        let mut builder = Schema::builder();
        builder.add_text_field("term", TEXT | STORED);
        builder.add_f64_field("length_boost", FAST);
        builder.add_u64_field("module_id", INDEXED);
        builder.add_u64_field("type_id", INDEXED);
        builder.add_u64_field("description_id", INDEXED | STORED | FAST);
        builder.add_u64_field("concept_id", INDEXED | STORED | FAST);
        builder.add_text_field("concept_active", STRING);
        builder.add_text_field("description_active", STRING);
        builder.add_text_field("preferred_term", STORED);
        builder.add_u64_field("direct_parents", INDEXED);
        builder.add_u64_field("preferred_in", INDEXED);
        builder.add_u64_field("acceptable_in", INDEXED);
        builder.add_u64_field("concept_refsets", INDEXED);
        builder.add_u64_field("description_refsets", INDEXED);
        for type_id in relationship_types {
            builder.add_u64_field(&type_id.to_string(), INDEXED);
        }
        let schema = builder.build();

        let index = Index::create_in_dir(path, schema.clone())?;
        let fields = Fields::resolve(&schema)?;
        tracing::info!(
            path = %path.display(),
            relationship_types = relationship_types.len(),
            "created description index"
        );
        Ok(Self {
            index,
            schema,
            fields,
        })
    }

    /// Opens an existing index read-write.
    pub fn open(path: &Path) -> SearchResult<Self> {
        let index = Index::open_in_dir(path)?;
        let schema = index.schema();
        let fields = Fields::resolve(&schema)?;
        Ok(Self {
            index,
            schema,
            fields,
        })
    }

    /// Creates a single-writer handle for bulk indexing.
    pub fn writer(&self) -> SearchResult<DescriptionWriter> {
        Ok(DescriptionWriter {
            writer: self.index.writer(64 * 1024 * 1024)?,
            schema: self.schema.clone(),
            fields: self.fields,
        })
    }

    /// Creates a shareable searcher over the current committed state.
    pub fn searcher(&self) -> SearchResult<DescriptionSearcher> {
        Ok(DescriptionSearcher {
            reader: self.index.reader()?,
            schema: self.schema.clone(),
            fields: self.fields,
        })
    }
}

/// Single-writer handle over the description index.
pub struct DescriptionWriter {
    writer: IndexWriter,
    schema: Schema,
    fields: Fields,
}

impl DescriptionWriter {
    /// Adds one description document.
    pub fn add(&mut self, doc: &DescriptionDoc) -> SearchResult<()> {
        let f = self.fields;
        let mut document = TantivyDocument::new();
        document.add_text(f.term, &doc.term);
        document.add_f64(
            f.length_boost,
            1.0 / (doc.term.len().max(1) as f64).sqrt(),
        );
        document.add_u64(f.module_id, doc.module_id);
        document.add_u64(f.type_id, doc.type_id);
        document.add_u64(f.description_id, doc.description_id);
        document.add_u64(f.concept_id, doc.concept_id);
        document.add_text(f.concept_active, bool_token(doc.concept_active));
        document.add_text(f.description_active, bool_token(doc.description_active));
        document.add_text(f.preferred_term, &doc.preferred_term);
        for parent in &doc.direct_parents {
            document.add_u64(f.direct_parents, *parent);
        }
        for refset in &doc.preferred_in {
            document.add_u64(f.preferred_in, *refset);
        }
        for refset in &doc.acceptable_in {
            document.add_u64(f.acceptable_in, *refset);
        }
        for refset in &doc.concept_refsets {
            document.add_u64(f.concept_refsets, *refset);
        }
        for refset in &doc.description_refsets {
            document.add_u64(f.description_refsets, *refset);
        }
        for (type_id, closure) in &doc.ancestors {
            if let Ok(field) = self.schema.get_field(&type_id.to_string()) {
                for ancestor in closure {
                    document.add_u64(field, *ancestor);
                }
            }
        }
        self.writer.add_document(document)?;
        Ok(())
    }

    /// Commits pending documents.
    pub fn commit(&mut self) -> SearchResult<()> {
        self.writer.commit()?;
        Ok(())
    }
}

fn bool_token(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Shareable, thread-safe searcher over the description index.
pub struct DescriptionSearcher {
    reader: IndexReader,
    schema: Schema,
    fields: Fields,
}

impl DescriptionSearcher {
    // -- query builders -----------------------------------------------------

    /// Matches the single concept id.
    pub fn q_concept(&self, concept_id: u64) -> Box<dyn Query> {
        Box::new(TermQuery::new(
            Term::from_field_u64(self.fields.concept_id, concept_id),
            IndexRecordOption::Basic,
        ))
    }

    /// Matches any of the given concept ids.
    pub fn q_concepts(&self, concept_ids: &HashSet<u64>) -> Box<dyn Query> {
        Box::new(TermSetQuery::new(
            concept_ids
                .iter()
                .map(|id| Term::from_field_u64(self.fields.concept_id, *id))
                .collect::<Vec<_>>(),
        ))
    }

    /// Matches every document.
    pub fn q_all(&self) -> Box<dyn Query> {
        Box::new(AllQuery)
    }

    /// Matches concepts whose closure for the relationship type contains
    /// the value: "is-a X" when the type is Is-A.
    pub fn q_ancestor(&self, type_id: u64, value: u64) -> Box<dyn Query> {
        match self.schema.get_field(&type_id.to_string()) {
            Ok(field) => Box::new(TermQuery::new(
                Term::from_field_u64(field, value),
                IndexRecordOption::Basic,
            )),
            Err(_) => Box::new(EmptyQuery),
        }
    }

    /// Matches concepts whose closure for the type intersects the values.
    pub fn q_ancestor_any(&self, type_id: u64, values: &HashSet<u64>) -> Box<dyn Query> {
        match self.schema.get_field(&type_id.to_string()) {
            Ok(field) => Box::new(TermSetQuery::new(
                values
                    .iter()
                    .map(|v| Term::from_field_u64(field, *v))
                    .collect::<Vec<_>>(),
            )),
            Err(_) => Box::new(EmptyQuery),
        }
    }

    /// Matches concepts with the given direct parent.
    pub fn q_direct_parent(&self, parent_id: u64) -> Box<dyn Query> {
        Box::new(TermQuery::new(
            Term::from_field_u64(self.fields.direct_parents, parent_id),
            IndexRecordOption::Basic,
        ))
    }

    /// Matches concepts that are members of the refset.
    pub fn q_member_of(&self, refset_id: u64) -> Box<dyn Query> {
        Box::new(TermQuery::new(
            Term::from_field_u64(self.fields.concept_refsets, refset_id),
            IndexRecordOption::Basic,
        ))
    }

    /// Matches concepts that are members of any of the refsets.
    pub fn q_member_of_any(&self, refset_ids: &HashSet<u64>) -> Box<dyn Query> {
        Box::new(TermSetQuery::new(
            refset_ids
                .iter()
                .map(|id| Term::from_field_u64(self.fields.concept_refsets, *id))
                .collect::<Vec<_>>(),
        ))
    }

    /// Wildcard match (`*` any run, `?` any character) over term tokens.
    pub fn q_term_wildcard(&self, pattern: &str) -> Box<dyn Query> {
        let mut regex = String::with_capacity(pattern.len() * 2);
        for ch in pattern.to_lowercase().chars() {
            match ch {
                '*' => regex.push_str(".*"),
                '?' => regex.push('.'),
                c if c.is_ascii_alphanumeric() => regex.push(c),
                c => {
                    regex.push('\\');
                    regex.push(c);
                }
            }
        }
        match tantivy::query::RegexQuery::from_pattern(&regex, self.fields.term) {
            Ok(query) => Box::new(query),
            Err(_) => Box::new(EmptyQuery),
        }
    }

    /// Matches descriptions preferred in any of the language refsets.
    pub fn q_preferred_in(&self, refset_ids: &[u64]) -> Box<dyn Query> {
        Box::new(TermSetQuery::new(
            refset_ids
                .iter()
                .map(|id| Term::from_field_u64(self.fields.preferred_in, *id))
                .collect::<Vec<_>>(),
        ))
    }

    /// Matches descriptions acceptable or preferred in any of the refsets.
    pub fn q_acceptable_in(&self, refset_ids: &[u64]) -> Box<dyn Query> {
        let mut terms = Vec::new();
        for id in refset_ids {
            terms.push(Term::from_field_u64(self.fields.acceptable_in, *id));
            terms.push(Term::from_field_u64(self.fields.preferred_in, *id));
        }
        Box::new(TermSetQuery::new(terms))
    }

    /// Matches descriptions of the given type.
    pub fn q_type(&self, type_id: u64) -> Box<dyn Query> {
        Box::new(TermQuery::new(
            Term::from_field_u64(self.fields.type_id, type_id),
            IndexRecordOption::Basic,
        ))
    }

    /// Matches active (or inactive) concepts.
    pub fn q_concept_active(&self, active: bool) -> Box<dyn Query> {
        Box::new(TermQuery::new(
            Term::from_field_text(self.fields.concept_active, bool_token(active)),
            IndexRecordOption::Basic,
        ))
    }

    /// Matches active (or inactive) descriptions.
    pub fn q_description_active(&self, active: bool) -> Box<dyn Query> {
        Box::new(TermQuery::new(
            Term::from_field_text(self.fields.description_active, bool_token(active)),
            IndexRecordOption::Basic,
        ))
    }

    /// Tokenised text query: tokens AND-combined; each token of length
    /// over two matches by prefix or exact term, optionally fuzzed.
    pub fn q_text(&self, s: &str, fuzzy: u8) -> Box<dyn Query> {
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for token in s.split_whitespace() {
            let token = token.to_lowercase();
            clauses.push((Occur::Must, self.token_query(&token, fuzzy)));
        }
        if clauses.is_empty() {
            return Box::new(EmptyQuery);
        }
        Box::new(BooleanQuery::new(clauses))
    }

    fn token_query(&self, token: &str, fuzzy: u8) -> Box<dyn Query> {
        let term = Term::from_field_text(self.fields.term, token);
        if token.len() <= 2 {
            return Box::new(TermQuery::new(term, IndexRecordOption::Basic));
        }
        let mut parts: Vec<(Occur, Box<dyn Query>)> = vec![
            (
                Occur::Should,
                Box::new(TermQuery::new(term.clone(), IndexRecordOption::Basic)),
            ),
            (
                Occur::Should,
                Box::new(FuzzyTermQuery::new_prefix(term.clone(), 0, true)),
            ),
        ];
        if fuzzy > 0 {
            parts.push((Occur::Should, Box::new(FuzzyTermQuery::new(term, fuzzy, true))));
        }
        Box::new(BooleanQuery::new(parts))
    }

    /// Builds the full boolean query for a parameterised search.
    ///
    /// `constraint` is an optional pre-built query (from ECL compilation)
    /// AND-ed with the rest.
    pub fn build_query(
        &self,
        params: &SearchParams,
        fuzzy: u8,
        constraint: Option<&dyn Query>,
    ) -> Box<dyn Query> {
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();

        if let Some(s) = &params.s {
            clauses.push((Occur::Must, self.q_text(s, fuzzy)));
        }
        if !params.inactive_concepts {
            clauses.push((Occur::Must, self.q_concept_active(true)));
        }
        if !params.inactive_descriptions {
            clauses.push((Occur::Must, self.q_description_active(true)));
        }
        if !params.show_fsn {
            clauses.push((Occur::MustNot, self.q_type(FSN_TYPE_ID)));
        }
        for (type_id, values) in &params.properties {
            let set: HashSet<u64> = values.iter().copied().collect();
            clauses.push((Occur::Must, self.q_ancestor_any(*type_id, &set)));
        }
        if !params.concept_refsets.is_empty() {
            clauses.push((
                Occur::Must,
                Box::new(TermSetQuery::new(
                    params
                        .concept_refsets
                        .iter()
                        .map(|id| Term::from_field_u64(self.fields.concept_refsets, *id))
                        .collect::<Vec<_>>(),
                )),
            ));
        }
        if !params.description_refsets.is_empty() {
            clauses.push((
                Occur::Must,
                Box::new(TermSetQuery::new(
                    params
                        .description_refsets
                        .iter()
                        .map(|id| Term::from_field_u64(self.fields.description_refsets, *id))
                        .collect::<Vec<_>>(),
                )),
            ));
        }
        if let Some(constraint) = constraint {
            clauses.push((Occur::Must, constraint.box_clone()));
        }
        if clauses.is_empty() {
            return Box::new(AllQuery);
        }
        Box::new(BooleanQuery::new(clauses))
    }

    // -- execution ----------------------------------------------------------

    /// Runs a parameterised search, ranked by lexical score times the
    /// length boost. Falls back once to `fallback_fuzzy` when an exact
    /// search returns nothing.
    pub fn search(
        &self,
        params: &SearchParams,
        constraint: Option<&dyn Query>,
    ) -> SearchResult<Vec<SearchHit>> {
        let query = self.build_query(params, params.fuzzy, constraint);
        let mut hits = self.ranked(&query, params.max_hits.unwrap_or(DEFAULT_MAX_HITS))?;
        if hits.is_empty() && params.fuzzy == 0 && params.fallback_fuzzy > 0 {
            let retry = self.build_query(params, params.fallback_fuzzy, constraint);
            hits = self.ranked(&retry, params.max_hits.unwrap_or(DEFAULT_MAX_HITS))?;
        }
        if params.remove_duplicates {
            let mut seen = HashSet::new();
            hits.retain(|hit| seen.insert((hit.concept_id, hit.term.clone())));
        }
        Ok(hits)
    }

    /// Ranked execution of a prepared query.
    pub fn ranked(&self, query: &dyn Query, max_hits: usize) -> SearchResult<Vec<SearchHit>> {
        let searcher = self.reader.searcher();
        let collector =
            TopDocs::with_limit(max_hits).tweak_score(move |segment_reader: &SegmentReader| {
                let boosts = segment_reader.fast_fields().f64("length_boost").ok();
                move |doc: DocId, score: Score| {
                    let boost = boosts
                        .as_ref()
                        .and_then(|column| column.first(doc))
                        .unwrap_or(1.0);
                    score * boost as Score
                }
            });
        let top = searcher.search(query, &collector)?;
        let mut hits = Vec::with_capacity(top.len());
        for (_score, address) in top {
            let doc: TantivyDocument = searcher.doc(address)?;
            hits.push(self.hit_from(&doc));
        }
        Ok(hits)
    }

    fn hit_from(&self, doc: &TantivyDocument) -> SearchHit {
        let f = self.fields;
        SearchHit {
            description_id: doc
                .get_first(f.description_id)
                .and_then(|v| v.as_u64())
                .unwrap_or_default(),
            concept_id: doc
                .get_first(f.concept_id)
                .and_then(|v| v.as_u64())
                .unwrap_or_default(),
            term: doc
                .get_first(f.term)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            preferred_term: doc
                .get_first(f.preferred_term)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
        }
    }

    /// The distinct concept ids matching a query, unordered and
    /// unbounded. Used by ECL expansion.
    pub fn concept_ids_matching(&self, query: &dyn Query) -> SearchResult<HashSet<u64>> {
        let searcher = self.reader.searcher();
        let addresses = searcher.search(query, &DocSetCollector)?;
        let mut columns: HashMap<u32, tantivy::columnar::Column<u64>> = HashMap::new();
        let mut out = HashSet::new();
        for address in addresses {
            let column = match columns.entry(address.segment_ord) {
                std::collections::hash_map::Entry::Occupied(e) => e.into_mut(),
                std::collections::hash_map::Entry::Vacant(e) => {
                    let reader = searcher.segment_reader(address.segment_ord);
                    e.insert(reader.fast_fields().u64("concept_id")?)
                }
            };
            if let Some(concept_id) = column.first(address.doc_id) {
                out.insert(concept_id);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IS_A: u64 = 116680003;

    fn doc(
        description_id: u64,
        concept_id: u64,
        term: &str,
        type_id: u64,
        ancestors: Vec<u64>,
    ) -> DescriptionDoc {
        DescriptionDoc {
            description_id,
            concept_id,
            term: term.to_string(),
            preferred_term: "Multiple sclerosis".to_string(),
            module_id: 900000000000207008,
            type_id,
            concept_active: true,
            description_active: true,
            direct_parents: vec![6118003],
            ancestors: BTreeMap::from([(IS_A, ancestors)]),
            preferred_in: vec![900000000000508004],
            acceptable_in: vec![],
            concept_refsets: vec![991411000000109],
            description_refsets: vec![],
            ..Default::default()
        }
    }

    const SYNONYM: u64 = 900000000000013009;

    fn build_index(dir: &Path) -> DescriptionIndex {
        let index = DescriptionIndex::create(dir, &[IS_A]).unwrap();
        let mut writer = index.writer().unwrap();
        writer
            .add(&doc(1, 24700007, "Multiple sclerosis", SYNONYM, vec![6118003, 138875005]))
            .unwrap();
        writer
            .add(&doc(
                2,
                24700007,
                "Multiple sclerosis (disorder)",
                FSN_TYPE_ID,
                vec![6118003, 138875005],
            ))
            .unwrap();
        writer
            .add(&doc(3, 45170000, "Encephalitis", SYNONYM, vec![138875005]))
            .unwrap();
        writer.commit().unwrap();
        index
    }

    #[test]
    fn test_token_prefix_search() {
        let dir = tempfile::tempdir().unwrap();
        let index = build_index(dir.path());
        let searcher = index.searcher().unwrap();

        let params = SearchParams {
            s: Some("mult scl".to_string()),
            ..Default::default()
        };
        let hits = searcher.search(&params, None).unwrap();
        assert!(!hits.is_empty());
        assert_eq!(hits[0].concept_id, 24700007);
        assert_eq!(hits[0].preferred_term, "Multiple sclerosis");
    }

    #[test]
    fn test_fsn_excluded_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let index = build_index(dir.path());
        let searcher = index.searcher().unwrap();

        let params = SearchParams {
            s: Some("multiple".to_string()),
            ..Default::default()
        };
        let hits = searcher.search(&params, None).unwrap();
        assert!(hits.iter().all(|h| h.description_id != 2));

        let with_fsn = SearchParams {
            s: Some("multiple".to_string()),
            show_fsn: true,
            ..Default::default()
        };
        let hits = searcher.search(&with_fsn, None).unwrap();
        assert!(hits.iter().any(|h| h.description_id == 2));
    }

    #[test]
    fn test_shorter_terms_rank_first() {
        let dir = tempfile::tempdir().unwrap();
        let index = build_index(dir.path());
        let searcher = index.searcher().unwrap();

        let params = SearchParams {
            s: Some("multiple sclerosis".to_string()),
            show_fsn: true,
            ..Default::default()
        };
        let hits = searcher.search(&params, None).unwrap();
        assert!(hits.len() >= 2);
        assert_eq!(hits[0].term, "Multiple sclerosis");
    }

    #[test]
    fn test_constraint_narrows_results() {
        let dir = tempfile::tempdir().unwrap();
        let index = build_index(dir.path());
        let searcher = index.searcher().unwrap();

        // Restrict to descendants of the demyelinating disorder.
        let constraint = searcher.q_ancestor(IS_A, 6118003);
        let params = SearchParams {
            s: Some("sclerosis".to_string()),
            ..Default::default()
        };
        let hits = searcher.search(&params, Some(constraint.as_ref())).unwrap();
        assert!(hits.iter().all(|h| h.concept_id == 24700007));

        let excluded = searcher.q_ancestor(IS_A, 999999);
        let hits = searcher.search(&params, Some(excluded.as_ref())).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_fallback_fuzzy_rescues_misspelling() {
        let dir = tempfile::tempdir().unwrap();
        let index = build_index(dir.path());
        let searcher = index.searcher().unwrap();

        let params = SearchParams {
            s: Some("sclerosos".to_string()), // one edit away
            fallback_fuzzy: 2,
            ..Default::default()
        };
        let hits = searcher.search(&params, None).unwrap();
        assert!(!hits.is_empty());
    }

    #[test]
    fn test_concept_ids_matching() {
        let dir = tempfile::tempdir().unwrap();
        let index = build_index(dir.path());
        let searcher = index.searcher().unwrap();

        let ids = searcher
            .concept_ids_matching(searcher.q_ancestor(IS_A, 138875005).as_ref())
            .unwrap();
        assert_eq!(ids, HashSet::from([24700007, 45170000]));

        let members = searcher
            .concept_ids_matching(searcher.q_member_of(991411000000109).as_ref())
            .unwrap();
        assert!(members.contains(&24700007));
    }

    #[test]
    fn test_remove_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let index = DescriptionIndex::create(dir.path(), &[IS_A]).unwrap();
        let mut writer = index.writer().unwrap();
        writer
            .add(&doc(1, 24700007, "Multiple sclerosis", SYNONYM, vec![]))
            .unwrap();
        writer
            .add(&doc(9, 24700007, "Multiple sclerosis", SYNONYM, vec![]))
            .unwrap();
        writer.commit().unwrap();
        let searcher = index.searcher().unwrap();

        let params = SearchParams {
            s: Some("multiple".to_string()),
            remove_duplicates: true,
            ..Default::default()
        };
        let hits = searcher.search(&params, None).unwrap();
        assert_eq!(hits.len(), 1);
    }
}
