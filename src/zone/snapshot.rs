use std::collections::HashMap;

use super::record::RecordData;
use crate::dns::RecordType;

/// All records owned by one domain, keyed by type.
pub type RecordSet = HashMap<RecordType, RecordData>;

/// Immutable point-in-time copy of the full zone table.
///
/// Built wholesale by a [`ZoneProvider`](super::ZoneProvider), swapped
/// wholesale on each refresh, never mutated in place. Every lookup runs
/// against one snapshot reference, so an in-flight query can never observe
/// a half-applied refresh.
#[derive(Debug, Clone, Default)]
pub struct ZoneSnapshot {
    zones: HashMap<String, RecordSet>,
}

impl ZoneSnapshot {
    pub fn new(zones: HashMap<String, RecordSet>) -> Self {
        Self { zones }
    }

    /// Look up the record of `rtype` for an exact, dot-terminated name.
    ///
    /// A domain with no records behaves exactly like an absent domain.
    pub fn lookup(&self, domain: &str, rtype: RecordType) -> Option<&RecordData> {
        self.zones.get(domain)?.get(&rtype)
    }

    pub fn domain_count(&self) -> usize {
        self.zones.len()
    }

    pub fn record_count(&self) -> usize {
        self.zones.values().map(HashMap::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_snapshot() -> ZoneSnapshot {
        let mut records = RecordSet::new();
        records.insert(RecordType::A, RecordData::Value("192.0.2.1".into()));
        let mut zones = HashMap::new();
        zones.insert("example.com.".to_string(), records);
        zones.insert("empty.example.".to_string(), RecordSet::new());
        ZoneSnapshot::new(zones)
    }

    #[test]
    fn test_lookup_present() {
        let snapshot = sample_snapshot();
        assert_eq!(
            snapshot.lookup("example.com.", RecordType::A),
            Some(&RecordData::Value("192.0.2.1".into()))
        );
    }

    #[test]
    fn test_lookup_missing_type() {
        let snapshot = sample_snapshot();
        assert_eq!(snapshot.lookup("example.com.", RecordType::AAAA), None);
    }

    #[test]
    fn test_lookup_absent_domain() {
        let snapshot = sample_snapshot();
        assert_eq!(snapshot.lookup("example.org.", RecordType::A), None);
    }

    #[test]
    fn test_empty_record_set_is_absent() {
        let snapshot = sample_snapshot();
        assert_eq!(snapshot.lookup("empty.example.", RecordType::A), None);
    }

    #[test]
    fn test_name_comparison_is_exact() {
        let snapshot = sample_snapshot();
        // No dot-termination normalization, no case folding.
        assert_eq!(snapshot.lookup("example.com", RecordType::A), None);
        assert_eq!(snapshot.lookup("EXAMPLE.COM.", RecordType::A), None);
    }
}
