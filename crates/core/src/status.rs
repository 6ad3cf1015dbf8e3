//! Work-item status normalization.
//!
//! Statuses arrive as free text from chat ("Done!", "wip", "waiting on QA")
//! and are bucketed into the three states the report cares about. Anything
//! unrecognized is kept verbatim.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Normalized status of a work item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Done,
    InTesting,
    InProgress,
    /// Free-text status that does not normalize; kept verbatim.
    /// An empty string means no status was given.
    Other(String),
}

impl Status {
    /// No status at all.
    pub fn unspecified() -> Self {
        Status::Other(String::new())
    }

    /// Normalize a free-text status string.
    pub fn normalize(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_lowercase().as_str() {
            "done" | "complete" | "completed" | "finished" | "shipped" | "released" => {
                Status::Done
            }
            "in testing" | "testing" | "qa" | "in qa" => Status::InTesting,
            "in progress" | "in-progress" | "wip" | "ongoing" | "started" => Status::InProgress,
            _ => Status::Other(trimmed.to_string()),
        }
    }

    /// Sort bucket: done < in testing < in progress < other.
    pub fn bucket(&self) -> u8 {
        match self {
            Status::Done => 0,
            Status::InTesting => 1,
            Status::InProgress => 2,
            Status::Other(_) => 3,
        }
    }

    /// Whether this is one of the three recognized states (not free text).
    pub fn is_normalized(&self) -> bool {
        !matches!(self, Status::Other(_))
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Status::Done)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Done => write!(f, "done"),
            Status::InTesting => write!(f, "in testing"),
            Status::InProgress => write!(f, "in progress"),
            Status::Other(s) => write!(f, "{s}"),
        }
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Status::normalize(&raw))
    }
}
