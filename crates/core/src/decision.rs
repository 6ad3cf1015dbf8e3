//! Classification decisions and the per-build identifiers they refer to.

use serde::{Deserialize, Serialize};

use crate::status::Status;

/// One selectable (category, subsection) position in the report.
///
/// Ids are derived from the position pair and are stable only within a
/// single build and must never be persisted across builds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionOption {
    pub id: String,
    pub label: String,
}

impl SectionOption {
    /// Derive the deterministic per-build id for a position pair.
    pub fn derive_id(category_index: usize, subsection_index: usize) -> String {
        format!("s{category_index}-{subsection_index}")
    }
}

/// A pre-existing report item, keyed for duplicate detection.
///
/// Keys are plain indices into the existing-items array, assigned in a
/// single-threaded walk before any oracle dispatch. The oracle references
/// them via `ClassificationDecision::duplicate_of_key`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExistingItem {
    pub key: usize,
    pub section_id: String,
    pub description: String,
    pub status: Status,
}

/// The oracle's verdict for one incoming item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationDecision {
    pub section_id: String,
    pub status: Status,
    /// Ticket override; empty means "keep the item's own tickets".
    pub ticket_ids: String,
    /// Key of the existing item this one duplicates, if any.
    pub duplicate_of_key: Option<usize>,
    /// Self-reported reliability in [0, 1]. Out-of-range values are
    /// normalized to 0 at parse time.
    pub confidence: f32,
}

impl Default for ClassificationDecision {
    fn default() -> Self {
        Self {
            section_id: String::new(),
            status: Status::unspecified(),
            ticket_ids: String::new(),
            duplicate_of_key: None,
            confidence: 0.0,
        }
    }
}

/// Token usage accumulated across oracle calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_read_tokens: u64,
}

impl OracleUsage {
    pub fn new(input_tokens: u64, output_tokens: u64, cache_read_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            cache_read_tokens,
        }
    }

    /// Add another call's usage into this accumulator.
    pub fn absorb(&mut self, other: &OracleUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.cache_read_tokens += other.cache_read_tokens;
    }

    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens + self.cache_read_tokens
    }
}
