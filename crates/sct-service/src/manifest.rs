//! Database directory manifest.
//!
//! The manifest binds the store and both search indices together under a
//! version string. A service refuses to open a directory whose manifest
//! version does not match its own.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ServiceError, ServiceResult};

/// Manifest version written and expected by this build.
pub const MANIFEST_VERSION: &str = "1.0";

const MANIFEST_FILE: &str = "manifest.json";

/// Pins the on-disk layout of a terminology database directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Layout version; must equal [`MANIFEST_VERSION`].
    pub version: String,
    /// Store directory name within the root.
    pub store: String,
    /// Description index directory name within the root.
    pub search: String,
    /// Members index directory name within the root.
    pub members: String,
    /// Creation timestamp, RFC 3339.
    pub created: String,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            version: MANIFEST_VERSION.to_string(),
            store: "store.db".to_string(),
            search: "search.db".to_string(),
            members: "members.db".to_string(),
            created: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl Manifest {
    /// Reads the manifest beneath a database root.
    ///
    /// A missing file maps to [`ServiceError::NotFound`], unreadable
    /// content to [`ServiceError::CorruptManifest`].
    pub fn read(root: &Path) -> ServiceResult<Self> {
        let path = root.join(MANIFEST_FILE);
        if !path.exists() {
            return Err(ServiceError::NotFound {
                path: root.to_path_buf(),
            });
        }
        let raw = std::fs::read_to_string(&path).map_err(|e| ServiceError::CorruptManifest {
            path: path.clone(),
            cause: e.to_string(),
        })?;
        serde_json::from_str(&raw).map_err(|e| ServiceError::CorruptManifest {
            path,
            cause: e.to_string(),
        })
    }

    /// Verifies the manifest version against this build.
    pub fn verify(&self) -> ServiceResult<()> {
        if self.version != MANIFEST_VERSION {
            return Err(ServiceError::IncompatibleVersion {
                expected: MANIFEST_VERSION.to_string(),
                found: self.version.clone(),
            });
        }
        Ok(())
    }

    /// Writes the manifest beneath a database root.
    pub fn write(&self, root: &Path) -> ServiceResult<()> {
        std::fs::create_dir_all(root)?;
        let raw = serde_json::to_string_pretty(self).expect("manifest serialises");
        std::fs::write(root.join(MANIFEST_FILE), raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = Manifest::default();
        manifest.write(dir.path()).unwrap();

        let read = Manifest::read(dir.path()).unwrap();
        assert_eq!(read, manifest);
        assert!(read.verify().is_ok());
    }

    #[test]
    fn test_missing_manifest_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = Manifest::read(dir.path()).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[test]
    fn test_corrupt_manifest() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("manifest.json"), "{not json").unwrap();
        let err = Manifest::read(dir.path()).unwrap_err();
        assert!(matches!(err, ServiceError::CorruptManifest { .. }));
    }

    #[test]
    fn test_version_mismatch() {
        let manifest = Manifest {
            version: "0.1".to_string(),
            ..Default::default()
        };
        let err = manifest.verify().unwrap_err();
        assert!(matches!(err, ServiceError::IncompatibleVersion { .. }));
    }
}
