//! The optional second-opinion review pass.
//!
//! Runs strictly after all classification batches have joined, as one
//! sequential oracle call. Consumes and emits structured records only; any
//! transport or parse failure is reported back as a [`CriticError`] side
//! channel while the decisions stay exactly as they were.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info};

use reportweave_core::{
    ClassificationDecision, CriticError, Oracle, OracleUsage, SectionOption, WorkItem,
};

use crate::prompt;
use crate::response;

/// One applied re-section suggestion.
#[derive(Debug, Clone)]
pub struct CriticFlag {
    pub id: String,
    pub suggested_section_id: String,
    pub reason: String,
}

/// Outcome of a successful critic pass.
#[derive(Debug, Default)]
pub struct CriticReport {
    /// Suggestions that were actually applied.
    pub applied: Vec<CriticFlag>,
    pub usage: OracleUsage,
}

/// Sequential reviewer over a finished decision map.
pub struct CriticReviewer {
    oracle: Arc<dyn Oracle>,
}

impl CriticReviewer {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self { oracle }
    }

    /// Review all decisions and apply valid suggestions in place.
    ///
    /// Only suggestions naming a currently valid section are applied, and
    /// only the section is overwritten, confidence is left alone. On any
    /// failure the decision map is untouched.
    pub async fn review(
        &self,
        items: &[WorkItem],
        sections: &[SectionOption],
        decisions: &mut HashMap<String, ClassificationDecision>,
    ) -> Result<CriticReport, CriticError> {
        if items.is_empty() || decisions.is_empty() {
            return Ok(CriticReport::default());
        }

        let request = prompt::review_request(items, sections, decisions);
        let reply = self.oracle.complete(request).await.map_err(CriticError)?;
        let flags = response::parse_flags(&reply.text).map_err(CriticError)?;

        let valid: HashSet<&str> = sections.iter().map(|s| s.id.as_str()).collect();
        let mut applied = Vec::new();
        for (id, suggested, reason) in flags {
            if !valid.contains(suggested.as_str()) {
                debug!(item = %id, section = %suggested, "critic suggested unknown section; ignored");
                continue;
            }
            let Some(decision) = decisions.get_mut(&id) else {
                debug!(item = %id, "critic flagged unknown item; ignored");
                continue;
            };
            if decision.section_id == suggested {
                continue;
            }
            info!(
                item = %id,
                from = %decision.section_id,
                to = %suggested,
                "critic moved item"
            );
            decision.section_id = suggested.clone();
            applied.push(CriticFlag {
                id,
                suggested_section_id: suggested,
                reason,
            });
        }

        Ok(CriticReport {
            applied,
            usage: reply.usage,
        })
    }
}
