//! Deterministic glossary overrides.
//!
//! A table of phrase rules applied after oracle decisions exist: a section
//! rule whose phrase appears in an item's description forces that item's
//! section and raises its confidence to at least 0.99; a status rule
//! rewrites the decision's normalized status. The oracle never wins against
//! the glossary.
//!
//! Precedence when several phrases match one item: longest phrase wins,
//! ties broken by table order. Matching is a case-insensitive substring
//! check over the trimmed description.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use reportweave_core::{ClassificationDecision, Status, WorkItem};

/// Confidence floor granted by a section rule match.
pub const GLOSSARY_CONFIDENCE: f32 = 0.99;

/// Forces items mentioning `phrase` into `section_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionRule {
    pub phrase: String,
    pub section_id: String,
}

/// Rewrites the decision status of items mentioning `phrase`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusRule {
    pub phrase: String,
    pub status: Status,
}

/// The full override table. Construct once per build and pass it into the
/// pipeline; no process-wide rule state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Glossary {
    section_rules: Vec<SectionRule>,
    status_rules: Vec<StatusRule>,
}

impl Glossary {
    /// Phrases are normalized (trimmed, lowercased) at construction; empty
    /// phrases are discarded.
    pub fn new(section_rules: Vec<SectionRule>, status_rules: Vec<StatusRule>) -> Self {
        let section_rules = section_rules
            .into_iter()
            .map(|mut r| {
                r.phrase = r.phrase.trim().to_lowercase();
                r
            })
            .filter(|r| !r.phrase.is_empty())
            .collect();
        let status_rules = status_rules
            .into_iter()
            .map(|mut r| {
                r.phrase = r.phrase.trim().to_lowercase();
                r
            })
            .filter(|r| !r.phrase.is_empty())
            .collect();
        Self {
            section_rules,
            status_rules,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.section_rules.is_empty() && self.status_rules.is_empty()
    }

    /// Apply overrides to the decision map. Items with a section-rule match
    /// but no oracle decision get one synthesized.
    pub fn apply(
        &self,
        items: &[WorkItem],
        decisions: &mut HashMap<String, ClassificationDecision>,
    ) {
        if self.is_empty() {
            return;
        }
        for item in items {
            let description = item.description.trim().to_lowercase();

            if let Some(rule) = best_match(&self.section_rules, &description) {
                let decision = decisions.entry(item.id.clone()).or_default();
                debug!(
                    item = %item.id,
                    phrase = %rule.phrase,
                    section = %rule.section_id,
                    "glossary section override"
                );
                decision.section_id = rule.section_id.clone();
                decision.confidence = decision.confidence.max(GLOSSARY_CONFIDENCE);
            }

            if let Some(rule) = best_match(&self.status_rules, &description) {
                if let Some(decision) = decisions.get_mut(&item.id) {
                    debug!(
                        item = %item.id,
                        phrase = %rule.phrase,
                        status = %rule.status,
                        "glossary status override"
                    );
                    decision.status = rule.status.clone();
                }
            }
        }
    }
}

trait PhraseRule {
    fn phrase(&self) -> &str;
}

impl PhraseRule for SectionRule {
    fn phrase(&self) -> &str {
        &self.phrase
    }
}

impl PhraseRule for StatusRule {
    fn phrase(&self) -> &str {
        &self.phrase
    }
}

/// Longest matching phrase; the first rule wins among equal lengths.
fn best_match<'a, T: PhraseRule>(rules: &'a [T], haystack: &str) -> Option<&'a T> {
    let mut best: Option<&T> = None;
    for rule in rules {
        if !haystack.contains(rule.phrase()) {
            continue;
        }
        let longer = best.is_none_or(|b| rule.phrase().len() > b.phrase().len());
        if longer {
            best = Some(rule);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, description: &str) -> WorkItem {
        WorkItem {
            id: id.into(),
            description: description.into(),
            author: "Pat".into(),
            status: String::new(),
            ticket_ids: String::new(),
            reported_at: None,
        }
    }

    fn decision(section_id: &str, confidence: f32) -> ClassificationDecision {
        ClassificationDecision {
            section_id: section_id.into(),
            confidence,
            ..Default::default()
        }
    }

    fn glossary() -> Glossary {
        Glossary::new(
            vec![
                SectionRule {
                    phrase: "backup".into(),
                    section_id: "s1-0".into(),
                },
                SectionRule {
                    phrase: "Database Backup".into(),
                    section_id: "s2-0".into(),
                },
            ],
            vec![StatusRule {
                phrase: "rolled out".into(),
                status: Status::Done,
            }],
        )
    }

    #[test]
    fn forces_section_and_raises_confidence() {
        let items = vec![item("a", "ran the database backup drill")];
        let mut decisions = HashMap::from([("a".to_string(), decision("s0-0", 0.3))]);
        glossary().apply(&items, &mut decisions);
        let d = &decisions["a"];
        // Longest phrase wins: "database backup" beats "backup".
        assert_eq!(d.section_id, "s2-0");
        assert!(d.confidence >= GLOSSARY_CONFIDENCE);
    }

    #[test]
    fn never_lowers_confidence() {
        let items = vec![item("a", "backup job")];
        let mut decisions = HashMap::from([("a".to_string(), decision("s0-0", 0.995))]);
        glossary().apply(&items, &mut decisions);
        assert_eq!(decisions["a"].confidence, 0.995);
        assert_eq!(decisions["a"].section_id, "s1-0");
    }

    #[test]
    fn synthesizes_decision_when_oracle_gave_none() {
        let items = vec![item("a", "nightly backup rotation")];
        let mut decisions = HashMap::new();
        glossary().apply(&items, &mut decisions);
        let d = &decisions["a"];
        assert_eq!(d.section_id, "s1-0");
        assert!(d.confidence >= GLOSSARY_CONFIDENCE);
    }

    #[test]
    fn status_rule_rewrites_decision_status() {
        let items = vec![item("a", "feature rolled out to all tenants")];
        let mut decisions = HashMap::from([("a".to_string(), decision("s0-0", 0.9))]);
        glossary().apply(&items, &mut decisions);
        assert_eq!(decisions["a"].status, Status::Done);
        // Status rules alone never force a section.
        assert_eq!(decisions["a"].section_id, "s0-0");
    }

    #[test]
    fn matching_is_case_insensitive() {
        let items = vec![item("a", "DATABASE BACKUP window moved")];
        let mut decisions = HashMap::new();
        glossary().apply(&items, &mut decisions);
        assert_eq!(decisions["a"].section_id, "s2-0");
    }

    #[test]
    fn no_match_leaves_decisions_untouched() {
        let items = vec![item("a", "wrote documentation")];
        let mut decisions = HashMap::from([("a".to_string(), decision("s0-0", 0.5))]);
        glossary().apply(&items, &mut decisions);
        assert_eq!(decisions["a"].section_id, "s0-0");
        assert_eq!(decisions["a"].confidence, 0.5);
        assert_eq!(decisions.len(), 1);
    }

    #[test]
    fn equal_length_phrases_prefer_table_order() {
        let g = Glossary::new(
            vec![
                SectionRule {
                    phrase: "alpha".into(),
                    section_id: "first".into(),
                },
                SectionRule {
                    phrase: "bravo".into(),
                    section_id: "second".into(),
                },
            ],
            Vec::new(),
        );
        let items = vec![item("a", "alpha and bravo both appear")];
        let mut decisions = HashMap::new();
        g.apply(&items, &mut decisions);
        assert_eq!(decisions["a"].section_id, "first");
    }
}
