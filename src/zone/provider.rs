use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use super::record::RecordData;
use super::snapshot::{RecordSet, ZoneSnapshot};
use crate::dns::RecordType;

#[derive(Error, Debug, Clone)]
pub enum ZoneError {
    #[error("zone storage IO error: {0}")]
    Io(String),

    #[error("zone data parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, ZoneError>;

/// Read-only source of zone snapshots.
///
/// Called once at startup and again on every refresh tick. Implementations
/// must be side-effect-free and fast enough to complete well within the
/// refresh interval.
pub trait ZoneProvider: Send + Sync {
    fn get_all_zones(&self) -> Result<ZoneSnapshot>;
}

/// Zone provider backed by a JSON document on disk.
///
/// The document maps dot-terminated domain names to an object of
/// type-label/value pairs:
///
/// ```json
/// {
///     "example.com.": {
///         "A": "192.0.2.1",
///         "MX": {"preference": 10, "exchange": "mail.example.com."}
///     }
/// }
/// ```
pub struct FileZoneProvider {
    path: PathBuf,
}

impl FileZoneProvider {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the backing file with an empty zone table if it is absent.
    /// Safe to call on every startup.
    pub fn ensure_exists(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        debug!("Creating empty zone file at {}", self.path.display());
        fs::write(&self.path, "{}\n").map_err(|e| ZoneError::Io(e.to_string()))
    }
}

impl ZoneProvider for FileZoneProvider {
    fn get_all_zones(&self) -> Result<ZoneSnapshot> {
        let raw = fs::read_to_string(&self.path).map_err(|e| ZoneError::Io(e.to_string()))?;
        let parsed: HashMap<String, HashMap<String, RecordData>> =
            serde_json::from_str(&raw).map_err(|e| ZoneError::Parse(e.to_string()))?;

        let mut zones = HashMap::with_capacity(parsed.len());
        for (domain, records) in parsed {
            let mut record_set = RecordSet::with_capacity(records.len());
            for (label, data) in records {
                match RecordType::from_label(&label) {
                    Some(rtype) => {
                        record_set.insert(rtype, data);
                    }
                    None => {
                        warn!(
                            "Skipping unsupported record type {} for {}",
                            label, domain
                        );
                    }
                }
            }
            zones.insert(domain, record_set);
        }

        Ok(ZoneSnapshot::new(zones))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_zone_file(contents: &str) -> (tempfile::TempDir, FileZoneProvider) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zones.json");
        fs::write(&path, contents).unwrap();
        (dir, FileZoneProvider::new(path))
    }

    #[test]
    fn test_load_zone_file() {
        let (_dir, provider) = write_zone_file(
            r#"{
                "example.com.": {
                    "A": "192.0.2.1",
                    "MX": {"preference": 10, "exchange": "mail.example.com."}
                }
            }"#,
        );

        let snapshot = provider.get_all_zones().unwrap();
        assert_eq!(snapshot.domain_count(), 1);
        assert_eq!(
            snapshot.lookup("example.com.", RecordType::A),
            Some(&RecordData::Value("192.0.2.1".into()))
        );
        assert_eq!(
            snapshot.lookup("example.com.", RecordType::MX),
            Some(&RecordData::Mx {
                preference: 10,
                exchange: "mail.example.com.".into()
            })
        );
    }

    #[test]
    fn test_unsupported_type_is_skipped_not_fatal() {
        let (_dir, provider) = write_zone_file(
            r#"{"example.com.": {"NS": "ns1.example.com.", "A": "192.0.2.1"}}"#,
        );

        let snapshot = provider.get_all_zones().unwrap();
        assert!(snapshot.lookup("example.com.", RecordType::A).is_some());
        assert_eq!(snapshot.record_count(), 1);
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let (_dir, provider) = write_zone_file("{not json");
        assert!(matches!(
            provider.get_all_zones(),
            Err(ZoneError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileZoneProvider::new(dir.path().join("nope.json"));
        assert!(matches!(provider.get_all_zones(), Err(ZoneError::Io(_))));
    }

    #[test]
    fn test_ensure_exists_creates_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileZoneProvider::new(dir.path().join("zones.json"));

        provider.ensure_exists().unwrap();
        let snapshot = provider.get_all_zones().unwrap();
        assert_eq!(snapshot.domain_count(), 0);

        // Idempotent: a second call must not clobber existing data.
        fs::write(provider.path(), r#"{"example.com.": {"A": "192.0.2.1"}}"#).unwrap();
        provider.ensure_exists().unwrap();
        assert_eq!(provider.get_all_zones().unwrap().domain_count(), 1);
    }
}
