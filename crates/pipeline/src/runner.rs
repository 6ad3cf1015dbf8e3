//! The pipeline entry point.
//!
//! One `run` call performs one build: parse the prior report, prune, key
//! the existing items, build the relevance index, classify all incoming
//! items (concurrent fan-out, full fan-in), apply glossary overrides, run
//! the optional critic, merge, reorder, and render both views.
//!
//! Everything the run needs arrives as plain data in [`BuildInput`]; the
//! oracle transport is the only collaborator, injected as `Arc<dyn Oracle>`.

use std::sync::Arc;

use tracing::{info, warn};

use reportweave_core::{
    CorrectionRecord, CriticError, Error, HistoricalExample, Oracle, OracleUsage, WorkItem,
};
use reportweave_glossary::Glossary;
use reportweave_oracle::{ClassifierClient, CriticReviewer, DecisionMap};
use reportweave_relevance::RelevanceIndex;
use reportweave_template::{parse, render_by_author, render_grouped};

use crate::config::PipelineConfig;
use crate::merge;

/// Everything one build consumes.
#[derive(Debug, Clone, Default)]
pub struct BuildInput {
    /// The previous period's rendered report.
    pub prior_report: String,
    /// Newly reported work items.
    pub items: Vec<WorkItem>,
    /// Historical corpus for few-shot retrieval.
    pub history: Vec<HistoricalExample>,
    /// Prior human corrections, any order.
    pub corrections: Vec<CorrectionRecord>,
    /// Deterministic override table.
    pub glossary: Glossary,
}

/// Everything one build produces. Persisting, posting, or formatting any of
/// it is the caller's business.
#[derive(Debug)]
pub struct BuildOutput {
    /// Per-item-author projection.
    pub report_by_author: String,
    /// Heading-grouped-authors projection.
    pub report_grouped: String,
    /// Final decision per incoming item id (post-override, post-critic).
    pub decisions: DecisionMap,
    /// Token usage summed over all oracle calls.
    pub usage: OracleUsage,
    /// Set when the critic pass failed; the reports were built from
    /// pre-critic decisions.
    pub critic_error: Option<CriticError>,
}

/// The classification-and-merge pipeline.
pub struct Pipeline {
    oracle: Arc<dyn Oracle>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(oracle: Arc<dyn Oracle>, config: PipelineConfig) -> Self {
        Self { oracle, config }
    }

    /// Run one build. Fatal errors return `Err` with nothing partially
    /// built; a critic failure is reported in the output instead.
    pub async fn run(&self, input: BuildInput) -> Result<BuildOutput, Error> {
        self.config.validate()?;

        let mut template = parse(&input.prior_report)?;
        let pruned = merge::prune_done(&mut template);
        let (existing, locations) = merge::assign_duplicate_keys(&template);
        let (sections, positions) = merge::section_options(&template);
        info!(
            categories = template.categories.len(),
            existing = existing.len(),
            pruned,
            incoming = input.items.len(),
            "build started"
        );

        let index = Arc::new(RelevanceIndex::build(input.history));

        let client = ClassifierClient::new(Arc::clone(&self.oracle))
            .with_batch_size(self.config.batch_size)
            .with_max_corrections(self.config.max_corrections)
            .with_examples_per_batch(self.config.examples_per_batch);
        let (mut decisions, mut usage) = client
            .classify(&input.items, &sections, &existing, &input.corrections, &index)
            .await?;

        input.glossary.apply(&input.items, &mut decisions);

        let mut critic_error = None;
        if self.config.critic_enabled {
            let critic = CriticReviewer::new(Arc::clone(&self.oracle));
            match critic.review(&input.items, &sections, &mut decisions).await {
                Ok(report) => {
                    usage.absorb(&report.usage);
                    if !report.applied.is_empty() {
                        info!(moved = report.applied.len(), "critic applied suggestions");
                    }
                }
                Err(err) => {
                    warn!(error = %err, "critic pass failed; keeping pre-critic decisions");
                    critic_error = Some(err);
                }
            }
        }

        merge::merge_items(
            &mut template,
            &input.items,
            &decisions,
            &locations,
            &positions,
            self.config.confidence_threshold,
        );
        merge::reorder(&mut template);

        info!(
            items = template.item_count(),
            tokens = usage.total_tokens(),
            "build finished"
        );
        Ok(BuildOutput {
            report_by_author: render_by_author(&template),
            report_grouped: render_grouped(&template),
            decisions,
            usage,
            critic_error,
        })
    }
}
