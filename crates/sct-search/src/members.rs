//! Inverted index over refset members.
//!
//! One document per **active** refset item: the refset id, the referenced
//! component, the item UUID, and every pattern column as a typed field
//! named by its RF2 column name. Column fields are declared when the
//! index is created, from the installed refsets' patterns, so term
//! queries stay exact-match typed while prefix and wildcard queries work
//! over the string columns.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use tantivy::collector::DocSetCollector;
use tantivy::query::{
    BooleanQuery, FuzzyTermQuery, Occur, Query, RegexQuery, TermQuery, TermSetQuery,
};
use tantivy::schema::{FieldType, IndexRecordOption, Schema, FAST, INDEXED, STORED, STRING};
use tantivy::{Index, IndexReader, IndexWriter, TantivyDocument, Term};

use crate::error::{SearchError, SearchResult};

/// Declared type of a member column field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberColumn {
    /// A concept reference (`c`), indexed as u64.
    Concept,
    /// An integer (`i`), indexed as i64.
    Integer,
    /// A string (`s`), indexed raw.
    String,
}

/// One typed column value of a member document.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberValue {
    /// A concept reference.
    Concept(u64),
    /// An integer.
    Integer(i64),
    /// A string.
    String(String),
}

/// A refset member document prepared for indexing.
#[derive(Debug, Clone)]
pub struct MemberDoc {
    /// Item UUID, stored for diagnostics.
    pub item_id: String,
    /// The refset this item belongs to.
    pub refset_id: u64,
    /// The referenced component.
    pub referenced_component_id: u64,
    /// Pattern columns: RF2 column name to value.
    pub values: Vec<(String, MemberValue)>,
}

/// The refset members index.
pub struct MembersIndex {
    index: Index,
    schema: Schema,
}

impl MembersIndex {
    /// Creates a fresh index, replacing any previous one.
    ///
    /// `columns` declares every pattern column across the installed
    /// refsets: name to type. Conflicting declarations keep the first
    /// type seen; values of the wrong shape for their field are skipped
    /// at write time.
    pub fn create(path: &Path, columns: &BTreeMap<String, MemberColumn>) -> SearchResult<Self> {
        if path.exists() {
            std::fs::remove_dir_all(path)?;
        }
        std::fs::create_dir_all(path)?;

        let mut builder = Schema::builder();
        builder.add_u64_field("refset_id", INDEXED);
        builder.add_u64_field("referenced_component_id", INDEXED | STORED | FAST);
        builder.add_text_field("item_id", STRING | STORED);
        for (name, column) in columns {
            match column {
                MemberColumn::Concept => {
                    builder.add_u64_field(name, INDEXED);
                }
                MemberColumn::Integer => {
                    builder.add_i64_field(name, INDEXED);
                }
                MemberColumn::String => {
                    builder.add_text_field(name, STRING);
                }
            }
        }
        let schema = builder.build();
        let index = Index::create_in_dir(path, schema.clone())?;
        tracing::info!(path = %path.display(), columns = columns.len(), "created members index");
        Ok(Self { index, schema })
    }

    /// Opens an existing index.
    pub fn open(path: &Path) -> SearchResult<Self> {
        let index = Index::open_in_dir(path)?;
        let schema = index.schema();
        Ok(Self { index, schema })
    }

    /// Creates a single-writer handle for bulk indexing.
    pub fn writer(&self) -> SearchResult<MembersWriter> {
        Ok(MembersWriter {
            writer: self.index.writer(32 * 1024 * 1024)?,
            schema: self.schema.clone(),
        })
    }

    /// Creates a shareable searcher over the current committed state.
    pub fn searcher(&self) -> SearchResult<MembersSearcher> {
        Ok(MembersSearcher {
            reader: self.index.reader()?,
            schema: self.schema.clone(),
        })
    }
}

/// Single-writer handle over the members index.
pub struct MembersWriter {
    writer: IndexWriter,
    schema: Schema,
}

impl MembersWriter {
    /// Adds one member document.
    pub fn add(&mut self, doc: &MemberDoc) -> SearchResult<()> {
        let mut document = TantivyDocument::new();
        document.add_u64(self.schema.get_field("refset_id")?, doc.refset_id);
        document.add_u64(
            self.schema.get_field("referenced_component_id")?,
            doc.referenced_component_id,
        );
        document.add_text(self.schema.get_field("item_id")?, &doc.item_id);
        for (name, value) in &doc.values {
            let Ok(field) = self.schema.get_field(name) else {
                continue;
            };
            match value {
                MemberValue::Concept(v) => document.add_u64(field, *v),
                MemberValue::Integer(v) => document.add_i64(field, *v),
                MemberValue::String(v) => document.add_text(field, v),
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

/// Shareable, thread-safe searcher over the members index.
pub struct MembersSearcher {
    reader: IndexReader,
    schema: Schema,
}

impl MembersSearcher {
    /// Matches items of one refset.
    pub fn q_refset_id(&self, refset_id: u64) -> SearchResult<Box<dyn Query>> {
        Ok(Box::new(TermQuery::new(
            Term::from_field_u64(self.schema.get_field("refset_id")?, refset_id),
            IndexRecordOption::Basic,
        )))
    }

    /// Matches items of any of the refsets.
    pub fn q_refset_ids(&self, refset_ids: &HashSet<u64>) -> SearchResult<Box<dyn Query>> {
        let field = self.schema.get_field("refset_id")?;
        Ok(Box::new(TermSetQuery::new(
            refset_ids
                .iter()
                .map(|id| Term::from_field_u64(field, *id))
                .collect::<Vec<_>>(),
        )))
    }

    fn column_field(&self, name: &str) -> SearchResult<tantivy::schema::Field> {
        self.schema.get_field(name).map_err(|_| SearchError::UnknownField {
            name: name.to_string(),
        })
    }

    /// Exact match on a typed column: the value is parsed to the
    /// column's declared type.
    pub fn q_term(&self, field_name: &str, value: &str) -> SearchResult<Box<dyn Query>> {
        let field = self.column_field(field_name)?;
        let term = match self.schema.get_field_entry(field).field_type() {
            FieldType::U64(_) => Term::from_field_u64(
                field,
                value.parse::<u64>().unwrap_or_default(),
            ),
            FieldType::I64(_) => Term::from_field_i64(
                field,
                value.parse::<i64>().unwrap_or_default(),
            ),
            _ => Term::from_field_text(field, value),
        };
        Ok(Box::new(TermQuery::new(term, IndexRecordOption::Basic)))
    }

    /// Prefix match on a string column.
    pub fn q_prefix(&self, field_name: &str, prefix: &str) -> SearchResult<Box<dyn Query>> {
        let field = self.column_field(field_name)?;
        Ok(Box::new(FuzzyTermQuery::new_prefix(
            Term::from_field_text(field, prefix),
            0,
            true,
        )))
    }

    /// Wildcard match (`*` any run, `?` any character) on a string column.
    pub fn q_wildcard(&self, field_name: &str, pattern: &str) -> SearchResult<Box<dyn Query>> {
        let field = self.column_field(field_name)?;
        let regex = wildcard_to_regex(pattern);
        Ok(Box::new(RegexQuery::from_pattern(&regex, field).map_err(
            |_| SearchError::InvalidPattern(pattern.to_string()),
        )?))
    }

    /// Refset filter AND field filter, combined.
    pub fn q_refset_field(
        &self,
        refset_id: u64,
        field_query: Box<dyn Query>,
    ) -> SearchResult<Box<dyn Query>> {
        Ok(Box::new(BooleanQuery::new(vec![
            (Occur::Must, self.q_refset_id(refset_id)?),
            (Occur::Must, field_query),
        ])))
    }

    /// Referenced component ids of all items matching the query.
    pub fn referenced_components(&self, query: &dyn Query) -> SearchResult<HashSet<u64>> {
        let searcher = self.reader.searcher();
        let addresses = searcher.search(query, &DocSetCollector)?;
        let mut columns: HashMap<u32, tantivy::columnar::Column<u64>> = HashMap::new();
        let mut out = HashSet::new();
        for address in addresses {
            let column = match columns.entry(address.segment_ord) {
                std::collections::hash_map::Entry::Occupied(e) => e.into_mut(),
                std::collections::hash_map::Entry::Vacant(e) => {
                    let reader = searcher.segment_reader(address.segment_ord);
                    e.insert(reader.fast_fields().u64("referenced_component_id")?)
                }
            };
            if let Some(component_id) = column.first(address.doc_id) {
                out.insert(component_id);
            }
        }
        Ok(out)
    }

    /// Members of a refset whose named field equals the value.
    pub fn member_field(
        &self,
        refset_id: u64,
        field_name: &str,
        value: &str,
    ) -> SearchResult<HashSet<u64>> {
        let query = self.q_refset_field(refset_id, self.q_term(field_name, value)?)?;
        self.referenced_components(query.as_ref())
    }

    /// Members of a refset whose named field starts with the prefix.
    pub fn member_field_prefix(
        &self,
        refset_id: u64,
        field_name: &str,
        prefix: &str,
    ) -> SearchResult<HashSet<u64>> {
        let query = self.q_refset_field(refset_id, self.q_prefix(field_name, prefix)?)?;
        self.referenced_components(query.as_ref())
    }

    /// Members of a refset whose named field matches the wildcard.
    pub fn member_field_wildcard(
        &self,
        refset_id: u64,
        field_name: &str,
        pattern: &str,
    ) -> SearchResult<HashSet<u64>> {
        let query = self.q_refset_field(refset_id, self.q_wildcard(field_name, pattern)?)?;
        self.referenced_components(query.as_ref())
    }
}

fn wildcard_to_regex(pattern: &str) -> String {
    let mut regex = String::with_capacity(pattern.len() * 2);
    for ch in pattern.chars() {
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
    regex
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> BTreeMap<String, MemberColumn> {
        BTreeMap::from([
            ("mapTarget".to_string(), MemberColumn::String),
            ("mapGroup".to_string(), MemberColumn::Integer),
            ("acceptabilityId".to_string(), MemberColumn::Concept),
        ])
    }

    fn map_doc(item: u128, component: u64, target: &str) -> MemberDoc {
        MemberDoc {
            item_id: uuid_string(item),
            refset_id: 447562003,
            referenced_component_id: component,
            values: vec![
                ("mapTarget".to_string(), MemberValue::String(target.to_string())),
                ("mapGroup".to_string(), MemberValue::Integer(1)),
            ],
        }
    }

    fn uuid_string(n: u128) -> String {
        format!("00000000-0000-0000-0000-{:012x}", n)
    }

    fn build_index(dir: &Path) -> MembersIndex {
        let index = MembersIndex::create(dir, &columns()).unwrap();
        let mut writer = index.writer().unwrap();
        writer.add(&map_doc(1, 24700007, "G35")).unwrap();
        writer.add(&map_doc(2, 24700007, "G35")).unwrap();
        writer.add(&map_doc(3, 45170000, "G04.9")).unwrap();
        writer
            .add(&MemberDoc {
                item_id: uuid_string(4),
                refset_id: 900000000000508004,
                referenced_component_id: 41398015,
                values: vec![(
                    "acceptabilityId".to_string(),
                    MemberValue::Concept(900000000000548007),
                )],
            })
            .unwrap();
        writer.commit().unwrap();
        index
    }

    #[test]
    fn test_member_field_exact() {
        let dir = tempfile::tempdir().unwrap();
        let index = build_index(dir.path());
        let searcher = index.searcher().unwrap();

        let members = searcher.member_field(447562003, "mapTarget", "G35").unwrap();
        assert_eq!(members, HashSet::from([24700007]));

        let none = searcher.member_field(447562003, "mapTarget", "G99").unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_member_field_prefix_and_wildcard() {
        let dir = tempfile::tempdir().unwrap();
        let index = build_index(dir.path());
        let searcher = index.searcher().unwrap();

        let prefixed = searcher
            .member_field_prefix(447562003, "mapTarget", "G0")
            .unwrap();
        assert_eq!(prefixed, HashSet::from([45170000]));

        let wild = searcher
            .member_field_wildcard(447562003, "mapTarget", "G*")
            .unwrap();
        assert_eq!(wild, HashSet::from([24700007, 45170000]));

        let dotted = searcher
            .member_field_wildcard(447562003, "mapTarget", "G04.?")
            .unwrap();
        assert_eq!(dotted, HashSet::from([45170000]));
    }

    #[test]
    fn test_refset_scoping() {
        let dir = tempfile::tempdir().unwrap();
        let index = build_index(dir.path());
        let searcher = index.searcher().unwrap();

        // The language refset has no mapTarget values.
        let members = searcher
            .member_field(900000000000508004, "mapTarget", "G35")
            .unwrap();
        assert!(members.is_empty());

        let query = searcher.q_refset_id(900000000000508004).unwrap();
        let members = searcher.referenced_components(query.as_ref()).unwrap();
        assert_eq!(members, HashSet::from([41398015]));
    }

    #[test]
    fn test_typed_concept_column() {
        let dir = tempfile::tempdir().unwrap();
        let index = build_index(dir.path());
        let searcher = index.searcher().unwrap();

        let members = searcher
            .member_field(900000000000508004, "acceptabilityId", "900000000000548007")
            .unwrap();
        assert_eq!(members, HashSet::from([41398015]));
    }

    #[test]
    fn test_unknown_field_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let index = build_index(dir.path());
        let searcher = index.searcher().unwrap();

        let err = searcher.member_field(447562003, "nonexistent", "x").unwrap_err();
        assert!(matches!(err, SearchError::UnknownField { .. }));
    }

    #[test]
    fn test_wildcard_to_regex_escapes_metacharacters() {
        assert_eq!(wildcard_to_regex("G35"), "G35");
        assert_eq!(wildcard_to_regex("G3*"), "G3.*");
        assert_eq!(wildcard_to_regex("G04.?"), "G04\\..");
    }
}
