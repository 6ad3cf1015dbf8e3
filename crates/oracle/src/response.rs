//! Tolerant parsing of oracle reply text.
//!
//! Oracles are asked for a bare JSON array but routinely wrap it in a
//! markdown fence or a line of prose. The parser strips fences, falls back
//! to the outermost `[...]` slice, and normalizes the loosely typed fields:
//! ticket lists may be a single string, a list of strings, or a mixed-type
//! list; confidence outside [0, 1] is untrusted and becomes 0.

use serde::Deserialize;

use reportweave_core::{ClassificationDecision, OracleError, Status};

#[derive(Debug, Deserialize)]
struct RawDecision {
    #[serde(default)]
    id: String,
    #[serde(default, alias = "sectionID", alias = "section_id")]
    section: String,
    #[serde(default, alias = "normalizedStatus", alias = "normalized_status")]
    status: String,
    #[serde(default, alias = "ticketIDs", alias = "ticket_ids")]
    tickets: Option<TicketField>,
    #[serde(default, alias = "duplicateOfKey", alias = "duplicate_of_key")]
    duplicate_of: Option<serde_json::Value>,
    #[serde(default)]
    confidence: f32,
}

/// Ticket ids as oracles actually return them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TicketField {
    One(String),
    Many(Vec<serde_json::Value>),
}

impl TicketField {
    /// Normalize to one comma-joined string.
    fn join(self) -> String {
        match self {
            TicketField::One(s) => s.trim().to_string(),
            TicketField::Many(values) => values
                .iter()
                .filter_map(|v| match v {
                    serde_json::Value::String(s) => Some(s.trim().to_string()),
                    serde_json::Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

fn parse_duplicate_key(value: &serde_json::Value) -> Option<usize> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().map(|k| k as usize),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Strip a surrounding markdown code fence, if any.
fn strip_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the fence line (possibly "```json") and the closing fence.
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Extract and deserialize the reply's JSON array, tolerating surrounding
/// prose.
fn tolerant_array<T: serde::de::DeserializeOwned>(text: &str) -> Result<Vec<T>, OracleError> {
    let body = strip_fence(text);
    match serde_json::from_str(body) {
        Ok(parsed) => Ok(parsed),
        Err(first_err) => {
            let start = body.find('[');
            let end = body.rfind(']');
            if let (Some(start), Some(end)) = (start, end) {
                if start < end {
                    if let Ok(parsed) = serde_json::from_str(&body[start..=end]) {
                        return Ok(parsed);
                    }
                }
            }
            Err(OracleError::Parse(first_err.to_string()))
        }
    }
}

/// Parse one classification reply into (item id, decision) pairs.
pub(crate) fn parse_decisions(
    text: &str,
) -> Result<Vec<(String, ClassificationDecision)>, OracleError> {
    let raw: Vec<RawDecision> = tolerant_array(text)?;
    Ok(raw
        .into_iter()
        .filter(|r| !r.id.is_empty())
        .map(|r| {
            let confidence = if (0.0..=1.0).contains(&r.confidence) {
                r.confidence
            } else {
                0.0
            };
            let decision = ClassificationDecision {
                section_id: r.section.trim().to_string(),
                status: Status::normalize(&r.status),
                ticket_ids: r.tickets.map(TicketField::join).unwrap_or_default(),
                duplicate_of_key: r.duplicate_of.as_ref().and_then(parse_duplicate_key),
                confidence,
            };
            (r.id, decision)
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct RawFlag {
    #[serde(default)]
    id: String,
    #[serde(default, alias = "suggestedSectionID", alias = "suggested_section_id")]
    section: String,
    #[serde(default)]
    reason: String,
}

/// Parse one review reply into (item id, suggested section, reason) rows.
pub(crate) fn parse_flags(text: &str) -> Result<Vec<(String, String, String)>, OracleError> {
    let raw: Vec<RawFlag> = tolerant_array(text)?;
    Ok(raw
        .into_iter()
        .filter(|f| !f.id.is_empty() && !f.section.is_empty())
        .map(|f| (f.id, f.section.trim().to_string(), f.reason))
        .collect())
}
