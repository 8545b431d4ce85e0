//! Footer provenance record.
//!
//! Serialized as key-value pairs in the Parquet footer. `write_complete`
//! is false until the writer closes successfully; together with the atomic
//! rename it is the crash-safety commitment.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

pub const SCHEMA_VERSION: &str = "1.0";
pub const NEXUS_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMeta {
    pub schema_version: String,
    pub nexus_version: String,
    /// UUID v4, unique per ingest run; used for deduplication.
    pub ingest_session_id: String,
    /// "live" or "delayed".
    pub feed_mode: String,
    /// First observed `ts_event_ns`.
    pub ingest_start_ns: i64,
    /// Last observed `ts_event_ns`.
    pub ingest_end_ns: i64,
    pub symbol: String,
    pub venue: String,
    pub source: String,
    pub ingest_host: String,
    /// True only when the writer closed successfully.
    pub write_complete: bool,
}

impl Default for FileMeta {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            nexus_version: NEXUS_VERSION.to_string(),
            ingest_session_id: String::new(),
            feed_mode: String::new(),
            ingest_start_ns: 0,
            ingest_end_ns: 0,
            symbol: String::new(),
            venue: String::new(),
            source: String::new(),
            ingest_host: String::new(),
            write_complete: false,
        }
    }
}

impl FileMeta {
    /// Metadata for a fresh ingest session: random session id, local host.
    pub fn for_new_session() -> Self {
        Self {
            ingest_session_id: generate_session_id(),
            ingest_host: local_host(),
            ..Self::default()
        }
    }

    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("schema_version".to_string(), self.schema_version.clone());
        map.insert("nexus_version".to_string(), self.nexus_version.clone());
        map.insert(
            "ingest_session_id".to_string(),
            self.ingest_session_id.clone(),
        );
        map.insert("feed_mode".to_string(), self.feed_mode.clone());
        map.insert(
            "ingest_start_ns".to_string(),
            self.ingest_start_ns.to_string(),
        );
        map.insert("ingest_end_ns".to_string(), self.ingest_end_ns.to_string());
        map.insert("symbol".to_string(), self.symbol.clone());
        map.insert("venue".to_string(), self.venue.clone());
        map.insert("source".to_string(), self.source.clone());
        map.insert("ingest_host".to_string(), self.ingest_host.clone());
        map.insert(
            "write_complete".to_string(),
            if self.write_complete { "true" } else { "false" }.to_string(),
        );
        map
    }

    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).cloned().unwrap_or_default();
        let get_ns = |key: &str| map.get(key).and_then(|v| v.parse::<i64>().ok()).unwrap_or(0);

        Self {
            schema_version: get("schema_version"),
            nexus_version: get("nexus_version"),
            ingest_session_id: get("ingest_session_id"),
            feed_mode: get("feed_mode"),
            ingest_start_ns: get_ns("ingest_start_ns"),
            ingest_end_ns: get_ns("ingest_end_ns"),
            symbol: get("symbol"),
            venue: get("venue"),
            source: get("source"),
            ingest_host: get("ingest_host"),
            write_complete: map.get("write_complete").map(String::as_str) == Some("true"),
        }
    }
}

/// Fresh UUID v4 session identifier.
pub fn generate_session_id() -> String {
    Uuid::new_v4().to_string()
}

fn local_host() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}
