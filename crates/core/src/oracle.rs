//! Oracle trait, the abstraction over the external text-classification
//! capability.
//!
//! The core assembles fully rendered requests and parses the replies; the
//! transport (HTTP client, SDK, test script) is supplied by the caller.
//! Timeout and retry policy live with the transport, not here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::decision::OracleUsage;
use crate::error::OracleError;

/// What a single oracle call is for. Lets one transport route or tune the
/// two call shapes differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OraclePurpose {
    /// First-pass section classification of an item batch.
    Classify,
    /// Second-opinion review of already-made decisions.
    Review,
}

/// One fully assembled oracle call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleRequest {
    pub purpose: OraclePurpose,
    /// Role and output-contract instructions.
    pub system: String,
    /// The rendered task: sections, context, and the items to classify.
    pub user: String,
}

/// The raw reply from one oracle call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleReply {
    pub text: String,
    pub usage: OracleUsage,
}

/// The oracle call contract.
///
/// Implementations must be cheap to share (`Arc<dyn Oracle>`); batch
/// classification dispatches many concurrent calls against one instance.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// A human-readable name for this oracle (e.g. "anthropic", "scripted").
    fn name(&self) -> &str;

    /// Send one request and return the raw reply.
    async fn complete(&self, request: OracleRequest) -> Result<OracleReply, OracleError>;
}
