//! # Reportweave Core
//!
//! Domain types, traits, and error definitions for the reportweave
//! classification-and-merge pipeline. This crate has **zero framework
//! dependencies**: it defines the domain model that all other crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! The oracle (the external text-classification capability) is defined as a
//! trait here; its transport lives with the caller. This enables:
//! - Swapping transports without touching the pipeline
//! - Easy testing with scripted mock oracles
//! - Clean dependency graph (all crates depend inward on core)

pub mod decision;
pub mod error;
pub mod history;
pub mod oracle;
pub mod report;
pub mod status;

// Re-export key types at crate root for ergonomics
pub use decision::{ClassificationDecision, ExistingItem, OracleUsage, SectionOption};
pub use error::{ClassifyError, CriticError, Error, OracleError, Result, TemplateError};
pub use history::{CorrectionRecord, HistoricalExample, WorkItem};
pub use oracle::{Oracle, OraclePurpose, OracleReply, OracleRequest};
pub use report::{Category, Item, Subsection, Template};
pub use status::Status;
