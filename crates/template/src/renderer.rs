//! Rendering a `Template` back to report text.
//!
//! Two stock projections share one generic renderer:
//! - the **by-author** view keeps `**Author** - ` on every item line;
//! - the **grouped** view lists the category's authors in its heading and
//!   drops them from item lines.
//!
//! Categories and subsections with zero items are omitted. Prefix lines,
//! subsection header lines, and marker lines are emitted verbatim.

use reportweave_core::report::{Category, Item, Template};

/// Render with caller-supplied item and category-heading formatters.
pub fn render_with<F, G>(template: &Template, format_item: F, format_heading: G) -> String
where
    F: Fn(&Item) -> String,
    G: Fn(&Category) -> String,
{
    let mut blocks: Vec<Vec<String>> = Vec::new();
    if !template.prefix_lines.is_empty() {
        blocks.push(template.prefix_lines.clone());
    }
    for cat in &template.categories {
        if let Some(marker) = &cat.marker_line {
            blocks.push(vec![marker.clone()]);
            continue;
        }
        if cat.item_count() == 0 {
            continue;
        }
        let mut block = vec![format_heading(cat)];
        for sub in &cat.subsections {
            if sub.items.is_empty() {
                continue;
            }
            if !sub.header_line.is_empty() {
                block.push(sub.header_line.clone());
            }
            for item in &sub.items {
                block.push(format_item(item));
            }
        }
        blocks.push(block);
    }

    let mut out = blocks
        .iter()
        .map(|b| b.join("\n"))
        .collect::<Vec<_>>()
        .join("\n\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

/// The per-item-author view.
pub fn render_by_author(template: &Template) -> String {
    render_with(
        template,
        |item| format_item_line(item, true),
        |cat| format!("## {}", cat.name),
    )
}

/// The heading-grouped-authors view: authors in the category heading, none
/// on item lines.
pub fn render_grouped(template: &Template) -> String {
    render_with(
        template,
        |item| format_item_line(item, false),
        |cat| {
            let authors = category_authors(cat);
            if authors.is_empty() {
                format!("## {}", cat.name)
            } else {
                format!("## {} ({})", cat.name, authors.join(", "))
            }
        },
    )
}

fn format_item_line(item: &Item, with_author: bool) -> String {
    let mut line = String::from("- ");
    if with_author && !item.author.is_empty() {
        line.push_str(&format!("**{}** - ", item.author));
    }
    if !item.ticket_ids.is_empty() {
        line.push_str(&format!("[{}] ", item.ticket_ids));
    }
    line.push_str(&item.description);
    let status = item.status.to_string();
    if !status.is_empty() {
        if !line.ends_with(' ') {
            line.push(' ');
        }
        line.push_str(&format!("({status})"));
    }
    line.trim_end().to_string()
}

/// Distinct item authors of a category, first-seen order, case-insensitive
/// dedup, empties skipped.
fn category_authors(cat: &Category) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for sub in &cat.subsections {
        for item in &sub.items {
            let author = item.author.trim();
            if author.is_empty() {
                continue;
            }
            if !seen.iter().any(|s| s.eq_ignore_ascii_case(author)) {
                seen.push(author.to_string());
            }
        }
    }
    seen
}
