//! Release package metadata.
//!
//! Distributions ship an optional `release_package_information.json` at
//! the package root. It is consumed for display only; invalid JSON is
//! logged and skipped, never fatal to an import.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

/// Display metadata for a release package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReleaseMetadata {
    /// Human-readable release name.
    pub name: Option<String>,
    /// Release effective time, as published.
    pub effective_time: Option<String>,
    /// Licence statement for the distribution.
    pub licence_statement: Option<String>,
    /// Module id to human name.
    pub modules: HashMap<String, String>,
}

/// Finds and parses release metadata files beneath a directory.
///
/// Unreadable or invalid files are logged at warn level and skipped.
pub fn find_metadata(dir: &Path) -> Vec<ReleaseMetadata> {
    let mut found = Vec::new();
    for entry in WalkDir::new(dir).into_iter().filter_map(Result::ok) {
        let name = entry.file_name().to_string_lossy();
        if !(name.starts_with("release_package_information") && name.ends_with(".json")) {
            continue;
        }
        match std::fs::read_to_string(entry.path()) {
            Ok(raw) => match serde_json::from_str::<ReleaseMetadata>(&raw) {
                Ok(metadata) => found.push(metadata),
                Err(e) => {
                    tracing::warn!(path = %entry.path().display(), error = %e,
                        "ignoring invalid release metadata");
                }
            },
            Err(e) => {
                tracing::warn!(path = %entry.path().display(), error = %e,
                    "ignoring unreadable release metadata");
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_metadata_json() {
        let raw = r#"{
            "name": "SnomedCT_InternationalRF2_PRODUCTION_20230131T120000Z",
            "effectiveTime": "20230131",
            "licenceStatement": "For evaluation only",
            "modules": {"900000000000207008": "SNOMED CT core"}
        }"#;
        let metadata: ReleaseMetadata = serde_json::from_str(raw).unwrap();
        assert_eq!(metadata.effective_time.as_deref(), Some("20230131"));
        assert_eq!(
            metadata.modules.get("900000000000207008").map(String::as_str),
            Some("SNOMED CT core")
        );
    }

    #[test]
    fn test_missing_fields_default() {
        let metadata: ReleaseMetadata = serde_json::from_str("{}").unwrap();
        assert_eq!(metadata.name, None);
        assert!(metadata.modules.is_empty());
    }

    #[test]
    fn test_invalid_metadata_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("release_package_information.json"),
            "not json at all",
        )
        .unwrap();
        assert!(find_metadata(dir.path()).is_empty());
    }

    #[test]
    fn test_valid_metadata_is_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("release_package_information.json"),
            r#"{"name": "Test release"}"#,
        )
        .unwrap();
        let found = find_metadata(dir.path());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name.as_deref(), Some("Test release"));
    }
}
