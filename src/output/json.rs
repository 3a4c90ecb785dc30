//! `--format json` document written by every command
//!
//! Outcomes and status reports are nested under `data`; `meta` records which
//! harness build produced the document and when, so saved runs can be
//! compared later.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

const HARNESS: &str = "devreg";

#[derive(Debug, Serialize)]
struct Envelope<'a, T: ?Sized> {
    data: &'a T,
    meta: RunMeta,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunMeta {
    harness: &'static str,
    version: &'static str,
    /// UTC, second precision
    timestamp: String,
}

impl RunMeta {
    fn now() -> Self {
        Self {
            harness: HARNESS,
            version: env!("CARGO_PKG_VERSION"),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// Pretty-printed `{ "data": ..., "meta": ... }` for one command result
pub fn format_json<T: Serialize + ?Sized>(data: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&Envelope {
        data,
        meta: RunMeta::now(),
    })
}
