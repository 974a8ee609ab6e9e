//! Zone data: record payloads, immutable snapshots and snapshot providers.

pub mod provider;
pub mod record;
pub mod snapshot;

pub use provider::{FileZoneProvider, ZoneError, ZoneProvider};
pub use record::RecordData;
pub use snapshot::{RecordSet, ZoneSnapshot};
