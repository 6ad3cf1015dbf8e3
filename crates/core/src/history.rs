//! Boundary data consumed by the pipeline: incoming work items, the
//! historical example corpus, and prior correction records.
//!
//! All of these arrive as plain data from the caller; the core performs
//! no I/O to obtain them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A newly reported work item, as submitted for the current period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub author: String,
    /// Raw status text as reported; normalized inside the pipeline.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub ticket_ids: String,
    #[serde(default)]
    pub reported_at: Option<DateTime<Utc>>,
}

/// A historically classified item, used for few-shot retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalExample {
    pub description: String,
    pub section_id: String,
    pub section_label: String,
}

/// A prior human correction of an oracle decision, consumed as oracle
/// context only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionRecord {
    pub previous_section_id: String,
    pub corrected_section_id: String,
    pub section_label: String,
    pub description: String,
    pub corrected_by: String,
    pub corrected_at: DateTime<Utc>,
}
