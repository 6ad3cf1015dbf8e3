//! Oracle-call orchestration.
//!
//! The [`ClassifierClient`] splits incoming items into batches, dispatches
//! all batches concurrently against one shared [`reportweave_core::Oracle`],
//! parses each reply into classification decisions, and sums token usage,
//! including the usage of batches that completed before a failing one.
//!
//! The [`CriticReviewer`] is the optional sequential second pass: it reads
//! every decision back to the oracle and applies only structurally valid
//! re-section suggestions. Its failures never abort a build.

pub mod client;
pub mod critic;
mod prompt;
mod response;

pub use client::{ClassifierClient, DecisionMap, DEFAULT_BATCH_SIZE};
pub use critic::{CriticFlag, CriticReport, CriticReviewer};
