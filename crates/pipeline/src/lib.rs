//! The reportweave pipeline: load, classify, override, critique, merge,
//! reorder, render.
//!
//! # Flow
//!
//! ```text
//! prior report text ──▶ parse ──▶ prune done ──▶ key existing items
//!                                                   │
//! incoming items ──▶ batch ──▶ oracle (fan-out) ──▶ fan-in
//!                                                   │
//!                              glossary ──▶ critic ──▶ merge ──▶ reorder
//!                                                   │
//!                              by-author view ◀── render ──▶ grouped view
//! ```
//!
//! One invocation per reporting period; concurrent invocations for the
//! same period must be serialized by the caller.

pub mod config;
pub mod merge;
pub mod runner;

pub use config::PipelineConfig;
pub use runner::{BuildInput, BuildOutput, Pipeline};
