//! The report structural model.
//!
//! A `Template` is the in-memory shape of one period's report: ordered
//! categories, each with ordered subsections, each with ordered items.
//! It exists only for the duration of one build; the only things that
//! leave the core are its two rendered textual projections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::status::Status;

/// The full report structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Lines before the first category heading, preserved verbatim.
    pub prefix_lines: Vec<String>,
    /// Ordered categories, including marker-line placeholders.
    pub categories: Vec<Category>,
}

impl Template {
    /// Total number of items across all subsections.
    pub fn item_count(&self) -> usize {
        self.categories
            .iter()
            .flat_map(|c| &c.subsections)
            .map(|s| s.items.len())
            .sum()
    }

    /// Find a subsection by name, case-insensitive. Returns
    /// (category index, subsection index).
    pub fn find_subsection(&self, name: &str) -> Option<(usize, usize)> {
        for (ci, cat) in self.categories.iter().enumerate() {
            for (si, sub) in cat.subsections.iter().enumerate() {
                if sub.name.eq_ignore_ascii_case(name) {
                    return Some((ci, si));
                }
            }
        }
        None
    }
}

/// One report category. Either a real category (name + subsections) or a
/// preserved mid-report heading (`marker_line`); never both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub subsections: Vec<Subsection>,
    /// A preserved top-level heading that appeared between categories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker_line: Option<String>,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subsections: Vec::new(),
            marker_line: None,
        }
    }

    pub fn marker(line: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            subsections: Vec::new(),
            marker_line: Some(line.into()),
        }
    }

    pub fn is_marker(&self) -> bool {
        self.marker_line.is_some()
    }

    /// Number of items under this category.
    pub fn item_count(&self) -> usize {
        self.subsections.iter().map(|s| s.items.len()).sum()
    }
}

/// A named group of items inside a category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subsection {
    pub name: String,
    /// The original header line, preserved verbatim. Empty for the implicit
    /// subsection that holds items appearing before any header.
    pub header_line: String,
    pub items: Vec<Item>,
}

impl Subsection {
    pub fn new(name: impl Into<String>, header_line: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            header_line: header_line.into(),
            items: Vec::new(),
        }
    }
}

/// One reported unit of activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub author: String,
    pub description: String,
    /// Comma-joined ticket identifiers, e.g. "ABC-1, ABC-2".
    pub ticket_ids: String,
    pub status: Status,
    /// When the item was reported. `None` means it was carried over from a
    /// prior build.
    pub reported_at: Option<DateTime<Utc>>,
    /// Whether the item was added or re-reported in the current build.
    pub is_new: bool,
}

impl Item {
    /// Identity key for in-subsection deduplication: the case-insensitive,
    /// trimmed description.
    pub fn identity_key(&self) -> String {
        identity_key(&self.description)
    }
}

/// The deduplication identity of a description.
pub fn identity_key(description: &str) -> String {
    description.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(description: &str) -> Item {
        Item {
            author: String::new(),
            description: description.into(),
            ticket_ids: String::new(),
            status: Status::unspecified(),
            reported_at: None,
            is_new: false,
        }
    }

    #[test]
    fn identity_key_is_case_insensitive_and_trimmed() {
        assert_eq!(item("  Fix Login Bug ").identity_key(), "fix login bug");
        assert_eq!(
            item("fix login bug").identity_key(),
            item("FIX LOGIN BUG").identity_key()
        );
    }

    #[test]
    fn find_subsection_ignores_case() {
        let mut template = Template::default();
        let mut cat = Category::new("Ops");
        cat.subsections.push(Subsection::new("Undetermined", "- **Undetermined**"));
        template.categories.push(cat);

        assert_eq!(template.find_subsection("undetermined"), Some((0, 0)));
        assert_eq!(template.find_subsection("missing"), None);
    }

    #[test]
    fn marker_categories_carry_no_content() {
        let cat = Category::marker("# Mid-quarter checkpoint");
        assert!(cat.is_marker());
        assert!(cat.subsections.is_empty());
        assert_eq!(cat.item_count(), 0);
    }
}
