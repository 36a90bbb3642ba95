//! Append-only log of user-submitted step reports.
//!
//! The log is read once at start-up and written back in full after every
//! append. Storage problems never reach the user: unreadable data loads as an
//! empty log and failed writes are only logged.

use chrono::{DateTime, SecondsFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capabilities::kv_decode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    #[default]
    Safety,
    Road,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserReport {
    /// 1-based position of the step in the directions list.
    pub step: u32,
    pub instruction: String,
    #[serde(rename = "type")]
    pub kind: ReportKind,
    pub description: String,
    /// ISO-8601, UTC, millisecond precision.
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ReportError {
    #[error("report description is empty")]
    EmptyDescription,
    #[error("no report form is open for step {0}")]
    NotReporting(u32),
    #[error("route has no step {0}")]
    UnknownStep(u32),
}

/// Formats epoch milliseconds like `Date.prototype.toISOString`.
#[must_use]
pub fn iso_timestamp(epoch_ms: i64) -> String {
    DateTime::from_timestamp_millis(epoch_ms)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Decodes stored bytes; anything unreadable is an empty log.
#[must_use]
pub fn decode_lenient(bytes: Option<&[u8]>) -> Vec<UserReport> {
    let Some(bytes) = bytes else {
        return Vec::new();
    };
    match kv_decode::<Vec<UserReport>>(bytes) {
        Ok(reports) => reports,
        Err(e) => {
            tracing::warn!(error = %e, len = bytes.len(), "stored report log unreadable, starting empty");
            Vec::new()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportLog {
    loaded: bool,
    reports: Vec<UserReport>,
    /// Appends that arrived before the initial read finished.
    pending: Vec<UserReport>,
}

impl ReportLog {
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    #[must_use]
    pub fn reports(&self) -> &[UserReport] {
        &self.reports
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.reports.len() + self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Installs the stored log. Returns `true` when queued appends were
    /// merged and the log must be written back.
    pub fn load(&mut self, stored: Vec<UserReport>) -> bool {
        let mut reports = stored;
        let flushed = !self.pending.is_empty();
        reports.append(&mut self.pending);
        self.reports = reports;
        self.loaded = true;
        flushed
    }

    /// Appends one report. Returns `true` when the log should be persisted now.
    pub fn append(&mut self, report: UserReport) -> bool {
        if self.loaded {
            self.reports.push(report);
            true
        } else {
            self.pending.push(report);
            false
        }
    }
}
