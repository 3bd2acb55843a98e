//! When a record was made, and a sortable id for it.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use ulid::Ulid;

/// Timestamp plus ULID taken together for one audit line or envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stamp {
    /// Unix seconds with a `Z` suffix, e.g. `1771220592Z`.
    pub ts: String,
    pub event_id: String,
}

impl Stamp {
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self {
            ts: epoch_z(secs),
            event_id: Ulid::new().to_string(),
        }
    }
}

pub fn epoch_z(secs: u64) -> String {
    format!("{}Z", secs)
}
