//! Tolerant parser and renderer for the report structural model.
//!
//! The parser is line-oriented and never fails on malformed content; the
//! only structural error is a report with no categories at all. The
//! renderer produces two projections of the same `Template`: a per-item
//! author view and a heading-grouped-authors view. Rendering is idempotent
//! once passed through the parser again:
//! `render(parse(render(t))) == render(t)`.

pub mod parser;
pub mod renderer;

pub use parser::parse;
pub use renderer::{render_by_author, render_grouped, render_with};
