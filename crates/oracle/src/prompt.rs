//! Prompt assembly for the two oracle call shapes.
//!
//! Both calls demand a bare JSON array back: no prose, no markdown. The
//! response parser still tolerates fenced output (see `response`).

use std::collections::HashMap;

use reportweave_core::{
    ClassificationDecision, CorrectionRecord, ExistingItem, HistoricalExample, OraclePurpose,
    OracleRequest, SectionOption, WorkItem,
};

const CLASSIFY_SYSTEM: &str = "\
You assign newly reported work items to sections of a team status report.
Respond with a JSON array only, one object per input item, in any order:
{\"id\": \"<item id>\", \"section\": \"<section id>\", \"status\": \"done|in testing|in progress|<free text>\", \
\"tickets\": [\"ABC-1\"], \"duplicate_of\": <existing item key or null>, \"confidence\": <0.0-1.0>}
Set \"duplicate_of\" to the key of an existing item when the new item reports
the same piece of work. Report your confidence honestly; use a low value
when no section fits.";

const REVIEW_SYSTEM: &str = "\
You review section assignments in a team status report and flag items that
look misplaced. Respond with a JSON array only, possibly empty:
{\"id\": \"<item id>\", \"section\": \"<better section id>\", \"reason\": \"<one sentence>\"}
Flag an item only when another listed section is clearly a better fit.";

/// Per-build context shared by every classification batch.
#[derive(Debug)]
pub(crate) struct PromptContext {
    pub sections: Vec<SectionOption>,
    pub existing: Vec<ExistingItem>,
    /// Already bounded and most-recent-first.
    pub corrections: Vec<CorrectionRecord>,
}

pub(crate) fn classify_request(
    batch: &[WorkItem],
    ctx: &PromptContext,
    examples: &[HistoricalExample],
) -> OracleRequest {
    let mut user = String::new();

    user.push_str("Sections:\n");
    for section in &ctx.sections {
        user.push_str(&format!("  {} = {}\n", section.id, section.label));
    }

    if !ctx.existing.is_empty() {
        user.push_str("\nExisting report items (key, section, status, description):\n");
        for existing in &ctx.existing {
            user.push_str(&format!(
                "  {} | {} | {} | {}\n",
                existing.key, existing.section_id, existing.status, existing.description
            ));
        }
    }

    if !ctx.corrections.is_empty() {
        user.push_str("\nPast corrections (most recent first):\n");
        for c in &ctx.corrections {
            user.push_str(&format!(
                "  \"{}\" was moved from {} to {} ({}) by {}\n",
                c.description,
                c.previous_section_id,
                c.corrected_section_id,
                c.section_label,
                c.corrected_by
            ));
        }
    }

    if !examples.is_empty() {
        user.push_str("\nSimilar past items and where they went:\n");
        for example in examples {
            user.push_str(&format!(
                "  \"{}\" -> {} ({})\n",
                example.description, example.section_id, example.section_label
            ));
        }
    }

    user.push_str("\nItems to classify (id, author, status, tickets, description):\n");
    for item in batch {
        user.push_str(&format!(
            "  {} | {} | {} | {} | {}\n",
            item.id, item.author, item.status, item.ticket_ids, item.description
        ));
    }

    OracleRequest {
        purpose: OraclePurpose::Classify,
        system: CLASSIFY_SYSTEM.to_string(),
        user,
    }
}

pub(crate) fn review_request(
    items: &[WorkItem],
    sections: &[SectionOption],
    decisions: &HashMap<String, ClassificationDecision>,
) -> OracleRequest {
    let mut user = String::new();

    user.push_str("Sections:\n");
    for section in sections {
        user.push_str(&format!("  {} = {}\n", section.id, section.label));
    }

    user.push_str("\nCurrent assignments (id, section, confidence, description):\n");
    for item in items {
        let Some(decision) = decisions.get(&item.id) else {
            continue;
        };
        user.push_str(&format!(
            "  {} | {} | {:.2} | {}\n",
            item.id, decision.section_id, decision.confidence, item.description
        ));
    }

    OracleRequest {
        purpose: OraclePurpose::Review,
        system: REVIEW_SYSTEM.to_string(),
        user,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reportweave_core::Status;

    fn work_item(id: &str, description: &str) -> WorkItem {
        WorkItem {
            id: id.into(),
            description: description.into(),
            author: "Pat".into(),
            status: "wip".into(),
            ticket_ids: "T-1".into(),
            reported_at: None,
        }
    }

    #[test]
    fn classify_request_lists_sections_and_items() {
        let ctx = PromptContext {
            sections: vec![SectionOption {
                id: "s0-0".into(),
                label: "Focus / Platform".into(),
            }],
            existing: vec![ExistingItem {
                key: 0,
                section_id: "s0-0".into(),
                description: "keep the lights on".into(),
                status: Status::InProgress,
            }],
            corrections: Vec::new(),
        };
        let request = classify_request(&[work_item("a", "fix the build")], &ctx, &[]);
        assert_eq!(request.purpose, OraclePurpose::Classify);
        assert!(request.user.contains("s0-0 = Focus / Platform"));
        assert!(request.user.contains("0 | s0-0 | in progress | keep the lights on"));
        assert!(request.user.contains("a | Pat | wip | T-1 | fix the build"));
        assert!(request.system.contains("JSON array"));
    }

    #[test]
    fn review_request_skips_items_without_decisions() {
        let decisions = HashMap::from([(
            "a".to_string(),
            ClassificationDecision {
                section_id: "s0-0".into(),
                confidence: 0.9,
                ..Default::default()
            },
        )]);
        let request = review_request(
            &[work_item("a", "fix the build"), work_item("b", "unclassified")],
            &[],
            &decisions,
        );
        assert_eq!(request.purpose, OraclePurpose::Review);
        assert!(request.user.contains("a | s0-0 | 0.90 | fix the build"));
        assert!(!request.user.contains("unclassified"));
    }
}
