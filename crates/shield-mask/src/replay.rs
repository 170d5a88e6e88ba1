//! # Replay Mapping Table
//!
//! Export of a run's identity cache, so a later run under the same key can
//! reproduce the same substitutes. The table holds raw values and must be
//! stored with the same protection as the source snapshot.
//!
//! The key fingerprint recorded at export is checked on restore; a table
//! produced under another key is rejected with `KeyMismatch`.
//!
//! [`MappingTable::save`] writes through a temporary file in the target
//! directory, created readable by the owner only, and renames it into place.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shield_core::FieldClassification;

use crate::config::ConfigError;

/// Current mapping table format.
pub const MAPPING_TABLE_VERSION: u32 = 1;

/// One `(classification, raw) → masked` mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    /// Classification of the field.
    pub classification: FieldClassification,
    /// Source value.
    pub raw: String,
    /// Masked value.
    pub masked: String,
}

/// Exported mapping table of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingTable {
    /// Format version.
    pub version: u32,
    /// Fingerprint of the key the mappings were produced under.
    pub key_fingerprint: String,
    /// Run that produced the table.
    pub run_id: Uuid,
    /// Export time.
    pub generated_at: DateTime<Utc>,
    /// Mappings sorted by classification then raw value.
    pub entries: Vec<MappingEntry>,
}

impl MappingTable {
    /// Read a mapping table from a JSON file.
    ///
    /// Parse errors report position only; the file holds raw values.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let table: Self = serde_json::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            reason: format!("malformed mapping table at line {}, column {}", e.line(), e.column()),
        })?;
        if table.version != MAPPING_TABLE_VERSION {
            return Err(ConfigError::Parse {
                path: path.display().to_string(),
                reason: format!(
                    "unsupported mapping table version {} (expected {MAPPING_TABLE_VERSION})",
                    table.version
                ),
            });
        }
        Ok(table)
    }

    /// The table as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the table as pretty-printed JSON, replacing `path` atomically.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io = |source: std::io::Error| ConfigError::Io {
            path: path.display().to_string(),
            source,
        };
        let json = self.to_json().map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = tempfile::NamedTempFile::new_in(dir).map_err(io)?;
        file.write_all(json.as_bytes()).map_err(io)?;
        file.persist(path).map_err(|e| io(e.error))?;
        Ok(())
    }

    /// Number of mappings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the table has no mappings.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MappingTable {
        MappingTable {
            version: MAPPING_TABLE_VERSION,
            key_fingerprint: "00112233aabbccdd".to_string(),
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            entries: vec![MappingEntry {
                classification: FieldClassification::Name,
                raw: "JANE DOE".to_string(),
                masked: "MARY SMITH".to_string(),
            }],
        }
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapping.json");
        let table = sample();
        table.save(&path).unwrap();
        let back = MappingTable::load(&path).unwrap();
        assert_eq!(back, table);
        assert_eq!(back.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn saved_table_is_owner_only_and_replaces_atomically() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapping.json");
        std::fs::write(&path, "stale").unwrap();
        sample().save(&path).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0, "mode {mode:o}");
        assert!(MappingTable::load(&path).is_ok());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapping.json");
        let mut table = sample();
        table.version = 99;
        table.save(&path).unwrap();
        assert!(matches!(MappingTable::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn parse_errors_do_not_echo_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapping.json");
        std::fs::write(&path, r#"{"version": "123-45-6789"}"#).unwrap();
        let err = MappingTable::load(&path).unwrap_err();
        assert!(!err.to_string().contains("123-45-6789"));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            MappingTable::load(Path::new("/nonexistent/mapping.json")),
            Err(ConfigError::Io { .. })
        ));
    }
}
