//! Line-classification parser for report text.
//!
//! Grammar (informal):
//! ```text
//! report     = prefix_line* category+
//! category   = "## " NAME (marker | subsection | item)*
//! marker     = "# " TEXT                      ; preserved verbatim
//! subsection = "- **" NAME "**" [NON_BULLET]  ; header line kept verbatim
//! item       = "- " ["**" AUTHOR "** - "] ["[" TICKETS "] "] DESC ["(" STATUS ")"]
//! ```
//!
//! The bold-lead bullet is inherently ambiguous: `- **Name**` followed by
//! `- ` content is an author-prefixed item, anything else after the bold
//! lead makes it a subsection header. That tie-break is load-bearing:
//! changing it silently restructures existing reports.

use regex_lite::Regex;

use reportweave_core::report::{Category, Item, Subsection, Template};
use reportweave_core::status::Status;
use reportweave_core::TemplateError;

/// Compiled leaf patterns of the item grammar.
struct ItemGrammar {
    ticket_prefix: Regex,
    status_suffix: Regex,
}

impl ItemGrammar {
    fn new() -> Self {
        Self {
            ticket_prefix: Regex::new(r"^\[([^\[\]]*)\]\s*").expect("ticket prefix pattern"),
            status_suffix: Regex::new(r"\(([^()]*)\)\s*$").expect("status suffix pattern"),
        }
    }
}

/// How one raw line participates in the report structure.
#[derive(Debug)]
enum LineClass {
    /// `## Name`: starts a new category.
    Category(String),
    /// `# Name`: a top-level heading, preserved as a marker when it
    /// appears after the first category.
    TopHeading,
    /// `- **Name**` with an empty or non-bullet remainder.
    SubsectionHeader { name: String },
    /// A bullet line that parses as an item.
    Item(Item),
    /// Blank or unrecognized; skipped inside categories.
    Other,
}

/// Split a bullet's text at a leading `**Name**`, if present and closed.
fn split_bold_lead(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix("**")?;
    let end = rest.find("**")?;
    Some((&rest[..end], &rest[end + 2..]))
}

fn classify_line(line: &str, grammar: &ItemGrammar) -> LineClass {
    let trimmed = line.trim_start();
    if let Some(name) = trimmed.strip_prefix("## ") {
        return LineClass::Category(name.trim().to_string());
    }
    if trimmed.strip_prefix("# ").is_some() {
        return LineClass::TopHeading;
    }
    let Some(bullet) = trimmed.strip_prefix("- ") else {
        return LineClass::Other;
    };
    if let Some((name, after)) = split_bold_lead(bullet) {
        let after = after.trim_start();
        // Bold lead immediately followed by `- ` content: an item line.
        if let Some(content) = after.strip_prefix("- ") {
            return LineClass::Item(parse_item(name, content, grammar));
        }
        if after == "-" {
            return LineClass::Item(parse_item(name, "", grammar));
        }
        return LineClass::SubsectionHeader {
            name: name.trim().to_string(),
        };
    }
    LineClass::Item(parse_item("", bullet, grammar))
}

/// Parse the body of an item line. All parts are optional.
fn parse_item(author: &str, text: &str, grammar: &ItemGrammar) -> Item {
    let mut rest = text.trim();

    let mut ticket_ids = String::new();
    if let Some(caps) = grammar.ticket_prefix.captures(rest) {
        ticket_ids = caps
            .get(1)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();
        rest = &rest[caps.get(0).expect("whole match").end()..];
    }

    let mut status = Status::unspecified();
    if let Some(caps) = grammar.status_suffix.captures(rest) {
        status = Status::normalize(caps.get(1).map(|m| m.as_str()).unwrap_or(""));
        rest = &rest[..caps.get(0).expect("whole match").start()];
    }

    Item {
        author: author.trim().to_string(),
        description: rest.trim().to_string(),
        ticket_ids,
        status,
        reported_at: None,
        is_new: false,
    }
}

/// Parse report text into a `Template`.
///
/// Tolerant: unrecognized lines inside categories are skipped, everything
/// before the first category heading is preserved as prefix lines
/// (trailing blank lines dropped), and top-level headings between
/// categories become marker categories. The only failure is a text with no
/// real categories at all.
pub fn parse(text: &str) -> Result<Template, TemplateError> {
    let grammar = ItemGrammar::new();
    let mut template = Template::default();
    // Index of the real category currently receiving content. Markers are
    // appended to the category list but never receive content.
    let mut current: Option<usize> = None;

    for line in text.lines() {
        let class = classify_line(line, &grammar);
        match class {
            LineClass::Category(name) => {
                template.categories.push(Category::new(name));
                current = Some(template.categories.len() - 1);
            }
            _ if current.is_none() => {
                template.prefix_lines.push(line.to_string());
            }
            LineClass::TopHeading => {
                template.categories.push(Category::marker(line));
            }
            LineClass::SubsectionHeader { name } => {
                let cat = &mut template.categories[current.expect("inside a category")];
                cat.subsections.push(Subsection::new(name, line));
            }
            LineClass::Item(item) => {
                let cat = &mut template.categories[current.expect("inside a category")];
                if cat.subsections.is_empty() {
                    // Items before any header attach to an implicit,
                    // unnamed subsection.
                    cat.subsections.push(Subsection::new("", ""));
                }
                cat.subsections
                    .last_mut()
                    .expect("subsection just ensured")
                    .items
                    .push(item);
            }
            LineClass::Other => {}
        }
    }

    while template
        .prefix_lines
        .last()
        .is_some_and(|l| l.trim().is_empty())
    {
        template.prefix_lines.pop();
    }

    if !template.categories.iter().any(|c| !c.is_marker()) {
        return Err(TemplateError::NoCategories);
    }
    Ok(template)
}
