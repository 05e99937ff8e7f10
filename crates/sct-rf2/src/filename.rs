//! RF2 release filename classification.
//!
//! RF2 distributions are classified purely by filename; parser dispatch
//! never looks at file headers. A single grammar covers the naming
//! convention:
//!
//! ```text
//! sct2_Concept_Snapshot_INT_20230131.txt
//! der2_cRefset_LanguageSnapshot-en_GB1000000_20230510.txt
//! der2_iisssccRefset_ExtendedMapSnapshot_INT_20230131.txt
//! ```
//!
//! Filenames that do not match the grammar yield `None`, never an error.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

/// `prefix_ContentType_ContentSubType[-lang]_Namespace_Date.txt`
const FILENAME_PATTERN: &str =
    r"^(sct|der)2_([A-Za-z]+)_([A-Za-z]+?)(?:-([a-zA-Z]{2}(?:-[a-zA-Z]+)*))?_([A-Z][A-Za-z0-9]*)_(\d{8})\.txt$";

fn filename_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(FILENAME_PATTERN).expect("filename grammar compiles"))
}

/// Release type of an RF2 file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseType {
    /// Every version of every component.
    Full,
    /// The most recent version of every component.
    Snapshot,
    /// Changes since the previous release.
    Delta,
}

impl ReleaseType {
    fn from_subtype(subtype: &str) -> Option<(Self, &str)> {
        for (suffix, rt) in [
            ("Snapshot", Self::Snapshot),
            ("Full", Self::Full),
            ("Delta", Self::Delta),
        ] {
            if let Some(summary) = subtype.strip_suffix(suffix) {
                return Some((rt, summary));
            }
        }
        None
    }
}

/// The kind of content a release file carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentKind {
    /// Concept file (`sct2_Concept_*`).
    Concept,
    /// Description file (`sct2_Description_*`).
    Description,
    /// Text definition file; shares the description column layout.
    TextDefinition,
    /// Inferred relationship file (`sct2_Relationship_*`).
    Relationship,
    /// Stated relationship file; recognised but not imported.
    StatedRelationship,
    /// Concrete-value relationship file.
    ConcreteRelationship,
    /// Identifier file; recognised but not imported.
    Identifier,
    /// A reference set file of any pattern.
    Refset {
        /// Extension-column pattern, e.g. `"iissscc"`; empty for simple refsets.
        pattern: String,
        /// Refset family from the filename, e.g. `"Language"`, `"ExtendedMap"`.
        summary: String,
    },
    /// Matched the grammar but carries content this system does not parse.
    Other(String),
}

impl ContentKind {
    /// Returns true if a row parser exists for this kind.
    pub fn has_parser(&self) -> bool {
        !matches!(
            self,
            Self::StatedRelationship | Self::Identifier | Self::Other(_)
        )
    }
}

/// A classified RF2 release file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseFile {
    /// Path the file was found at.
    pub path: PathBuf,
    /// The bare filename.
    pub filename: String,
    /// Component kind carried by the file.
    pub kind: ContentKind,
    /// Full, Snapshot or Delta.
    pub release_type: ReleaseType,
    /// Language code from the content subtype, e.g. `en` or `en-GB`.
    pub language: Option<String>,
    /// Country code or namespace, e.g. `INT`, `GB1000000`.
    pub namespace: String,
    /// Version date from the filename.
    pub date: NaiveDate,
}

impl ReleaseFile {
    /// Returns true if this file participates in an import: a Snapshot
    /// file whose kind has an associated row parser.
    pub fn importable(&self) -> bool {
        self.release_type == ReleaseType::Snapshot && self.kind.has_parser()
    }

    /// Returns true if this file belongs to the first import phase.
    ///
    /// Core content plus the refset descriptor refset must land before
    /// dependent refsets so descriptors are reified in between.
    pub fn is_core(&self) -> bool {
        match &self.kind {
            ContentKind::Concept
            | ContentKind::Description
            | ContentKind::TextDefinition
            | ContentKind::Relationship
            | ContentKind::ConcreteRelationship => true,
            ContentKind::Refset { summary, .. } => summary == "RefsetDescriptor",
            _ => false,
        }
    }
}

/// Classifies a path by its RF2 filename.
///
/// Returns `None` when the filename does not match the naming convention.
pub fn classify(path: &Path) -> Option<ReleaseFile> {
    let filename = path.file_name()?.to_str()?;
    let captures = filename_regex().captures(filename)?;

    let content_type = captures.get(2)?.as_str();
    let subtype = captures.get(3)?.as_str();
    let (release_type, summary) = ReleaseType::from_subtype(subtype)?;
    let date = NaiveDate::parse_from_str(captures.get(6)?.as_str(), "%Y%m%d").ok()?;

    let kind = match content_type {
        "Concept" => ContentKind::Concept,
        "Description" => ContentKind::Description,
        "TextDefinition" => ContentKind::TextDefinition,
        "Relationship" => ContentKind::Relationship,
        "StatedRelationship" => ContentKind::StatedRelationship,
        "RelationshipConcreteValues" => ContentKind::ConcreteRelationship,
        "Identifier" => ContentKind::Identifier,
        other => match other.strip_suffix("Refset") {
            Some(pattern) if pattern.bytes().all(|b| matches!(b, b's' | b'c' | b'i')) => {
                ContentKind::Refset {
                    pattern: pattern.to_string(),
                    summary: summary.to_string(),
                }
            }
            _ => ContentKind::Other(other.to_string()),
        },
    };

    Some(ReleaseFile {
        path: path.to_path_buf(),
        filename: filename.to_string(),
        kind,
        release_type,
        language: captures.get(4).map(|m| m.as_str().to_string()),
        namespace: captures.get(5)?.as_str().to_string(),
        date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_name(name: &str) -> Option<ReleaseFile> {
        classify(Path::new(name))
    }

    #[test]
    fn test_concept_snapshot() {
        let file = classify_name("sct2_Concept_Snapshot_INT_20230131.txt").unwrap();
        assert_eq!(file.kind, ContentKind::Concept);
        assert_eq!(file.release_type, ReleaseType::Snapshot);
        assert_eq!(file.language, None);
        assert_eq!(file.namespace, "INT");
        assert_eq!(file.date, NaiveDate::from_ymd_opt(2023, 1, 31).unwrap());
        assert!(file.importable());
        assert!(file.is_core());
    }

    #[test]
    fn test_description_with_language() {
        let file = classify_name("sct2_Description_Snapshot-en_INT_20230131.txt").unwrap();
        assert_eq!(file.kind, ContentKind::Description);
        assert_eq!(file.language.as_deref(), Some("en"));
    }

    #[test]
    fn test_language_refset() {
        let file =
            classify_name("der2_cRefset_LanguageSnapshot-en_GB1000000_20230510.txt").unwrap();
        assert_eq!(
            file.kind,
            ContentKind::Refset {
                pattern: "c".to_string(),
                summary: "Language".to_string(),
            }
        );
        assert_eq!(file.language.as_deref(), Some("en"));
        assert_eq!(file.namespace, "GB1000000");
        assert!(file.importable());
        assert!(!file.is_core());
    }

    #[test]
    fn test_simple_refset_has_empty_pattern() {
        let file = classify_name("der2_Refset_SimpleSnapshot_INT_20230131.txt").unwrap();
        assert_eq!(
            file.kind,
            ContentKind::Refset {
                pattern: String::new(),
                summary: "Simple".to_string(),
            }
        );
    }

    #[test]
    fn test_extended_map_refset() {
        let file = classify_name("der2_iisssccRefset_ExtendedMapSnapshot_INT_20230131.txt").unwrap();
        assert_eq!(
            file.kind,
            ContentKind::Refset {
                pattern: "iissscc".to_string(),
                summary: "ExtendedMap".to_string(),
            }
        );
    }

    #[test]
    fn test_refset_descriptor_is_core() {
        let file =
            classify_name("der2_cciRefset_RefsetDescriptorSnapshot_INT_20230131.txt").unwrap();
        assert!(file.is_core());
        assert!(file.importable());
    }

    #[test]
    fn test_owl_expression_refset() {
        let file = classify_name("sct2_sRefset_OWLExpressionSnapshot_INT_20230131.txt").unwrap();
        assert_eq!(
            file.kind,
            ContentKind::Refset {
                pattern: "s".to_string(),
                summary: "OWLExpression".to_string(),
            }
        );
    }

    #[test]
    fn test_concrete_values() {
        let file =
            classify_name("sct2_RelationshipConcreteValues_Snapshot_INT_20230131.txt").unwrap();
        assert_eq!(file.kind, ContentKind::ConcreteRelationship);
        assert!(file.is_core());
    }

    #[test]
    fn test_stated_relationship_not_importable() {
        let file = classify_name("sct2_StatedRelationship_Snapshot_INT_20230131.txt").unwrap();
        assert_eq!(file.kind, ContentKind::StatedRelationship);
        assert!(!file.importable());
    }

    #[test]
    fn test_full_and_delta_not_importable() {
        let full = classify_name("sct2_Concept_Full_INT_20230131.txt").unwrap();
        assert_eq!(full.release_type, ReleaseType::Full);
        assert!(!full.importable());

        let delta = classify_name("sct2_Concept_Delta_INT_20230131.txt").unwrap();
        assert_eq!(delta.release_type, ReleaseType::Delta);
        assert!(!delta.importable());
    }

    #[test]
    fn test_dialect_language_code() {
        let file = classify_name("der2_cRefset_LanguageSnapshot-en-GB_GB_20230510.txt").unwrap();
        assert_eq!(file.language.as_deref(), Some("en-GB"));
        assert_eq!(file.namespace, "GB");
    }

    #[test]
    fn test_non_rf2_filenames_yield_none() {
        assert!(classify_name("readme.txt").is_none());
        assert!(classify_name("release_package_information.json").is_none());
        assert!(classify_name("sct2_Concept_Snapshot_INT_2023.txt").is_none());
        assert!(classify_name("der2_qRefset_OddSnapshot_INT_20230131.txt").is_some());
        // Unknown pattern letters fall through to Other, which has no parser.
        let odd = classify_name("der2_qRefset_OddSnapshot_INT_20230131.txt").unwrap();
        assert_eq!(odd.kind, ContentKind::Other("qRefset".to_string()));
        assert!(!odd.importable());
    }
}
