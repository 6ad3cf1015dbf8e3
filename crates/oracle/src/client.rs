//! The batching classification client.
//!
//! Splits the incoming item list into fixed-size batches and dispatches all
//! of them concurrently against one shared oracle. Each batch task owns an
//! exclusive result slot; aggregation happens only after every task has
//! joined. A single batch failure fails the whole call, but usage from
//! batches whose transport completed is still handed back for cost
//! accounting.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use reportweave_core::{
    ClassificationDecision, ClassifyError, CorrectionRecord, ExistingItem, Oracle, OracleError,
    OracleUsage, SectionOption, WorkItem,
};
use reportweave_relevance::RelevanceIndex;

use crate::prompt::{self, PromptContext};
use crate::response;

/// Default number of items per classification batch.
pub const DEFAULT_BATCH_SIZE: usize = 50;

const DEFAULT_MAX_CORRECTIONS: usize = 20;
const DEFAULT_EXAMPLES_PER_BATCH: usize = 8;

/// Final classification decisions keyed by item id.
pub type DecisionMap = HashMap<String, ClassificationDecision>;

/// Batching front-end over an [`Oracle`].
pub struct ClassifierClient {
    oracle: Arc<dyn Oracle>,
    batch_size: usize,
    max_corrections: usize,
    examples_per_batch: usize,
}

impl ClassifierClient {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self {
            oracle,
            batch_size: DEFAULT_BATCH_SIZE,
            max_corrections: DEFAULT_MAX_CORRECTIONS,
            examples_per_batch: DEFAULT_EXAMPLES_PER_BATCH,
        }
    }

    /// Items per batch. Values below 1 are coerced to 1; real validation
    /// belongs to `PipelineConfig::validate`.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// How many of the most recent corrections each batch sees.
    pub fn with_max_corrections(mut self, max_corrections: usize) -> Self {
        self.max_corrections = max_corrections;
        self
    }

    /// Retrieval budget for few-shot examples per batch.
    pub fn with_examples_per_batch(mut self, examples_per_batch: usize) -> Self {
        self.examples_per_batch = examples_per_batch;
        self
    }

    /// Classify all items. Batches run concurrently; results are merged
    /// into one decision map and usage is summed across batches.
    pub async fn classify(
        &self,
        items: &[WorkItem],
        sections: &[SectionOption],
        existing: &[ExistingItem],
        corrections: &[CorrectionRecord],
        index: &Arc<RelevanceIndex>,
    ) -> Result<(DecisionMap, OracleUsage), ClassifyError> {
        if items.is_empty() {
            return Ok((DecisionMap::new(), OracleUsage::default()));
        }

        let context = Arc::new(PromptContext {
            sections: sections.to_vec(),
            existing: existing.to_vec(),
            corrections: recent_corrections(corrections, self.max_corrections),
        });

        let batches: Vec<Vec<WorkItem>> = items
            .chunks(self.batch_size)
            .map(|chunk| chunk.to_vec())
            .collect();
        let total_batches = batches.len();
        info!(
            oracle = %self.oracle.name(),
            items = items.len(),
            batches = total_batches,
            "dispatching classification batches"
        );

        let mut handles = Vec::with_capacity(total_batches);
        for (batch_no, batch) in batches.into_iter().enumerate() {
            let oracle = Arc::clone(&self.oracle);
            let context = Arc::clone(&context);
            let index = Arc::clone(index);
            let examples_per_batch = self.examples_per_batch;
            handles.push(tokio::spawn(async move {
                let queries: Vec<String> =
                    batch.iter().map(|item| item.description.clone()).collect();
                let examples = index.top_k_for_batch(&queries, examples_per_batch);
                let request = prompt::classify_request(&batch, &context, &examples);

                let reply = match oracle.complete(request).await {
                    Ok(reply) => reply,
                    Err(err) => return (Err(err), OracleUsage::default()),
                };
                debug!(batch = batch_no, "classification batch completed");
                // The transport succeeded, so its tokens count even if the
                // reply turns out to be unparseable.
                match response::parse_decisions(&reply.text) {
                    Ok(decisions) => (Ok(decisions), reply.usage),
                    Err(err) => (Err(err), reply.usage),
                }
            }));
        }

        // Fan-in: every slot joins before anything is merged or reported.
        let mut merged = DecisionMap::new();
        let mut usage = OracleUsage::default();
        let mut failure: Option<(usize, OracleError)> = None;
        for (batch_no, joined) in join_all(handles).await.into_iter().enumerate() {
            match joined {
                Ok((Ok(decisions), batch_usage)) => {
                    usage.absorb(&batch_usage);
                    merged.extend(decisions);
                }
                Ok((Err(err), batch_usage)) => {
                    usage.absorb(&batch_usage);
                    warn!(batch = batch_no, error = %err, "classification batch failed");
                    if failure.is_none() {
                        failure = Some((batch_no, err));
                    }
                }
                Err(join_err) => {
                    warn!(batch = batch_no, error = %join_err, "batch task aborted");
                    if failure.is_none() {
                        failure = Some((
                            batch_no,
                            OracleError::Transport(format!("batch task aborted: {join_err}")),
                        ));
                    }
                }
            }
        }

        if let Some((failed_batch, source)) = failure {
            return Err(ClassifyError {
                source,
                usage,
                failed_batch,
                total_batches,
            });
        }
        Ok((merged, usage))
    }
}

/// The `limit` most recent corrections, newest first.
fn recent_corrections(corrections: &[CorrectionRecord], limit: usize) -> Vec<CorrectionRecord> {
    let mut ordered: Vec<&CorrectionRecord> = corrections.iter().collect();
    ordered.sort_by(|a, b| b.corrected_at.cmp(&a.corrected_at));
    ordered.into_iter().take(limit).cloned().collect()
}
