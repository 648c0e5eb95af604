//! Catalog search and category filtering.

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

use crate::domain::entities::CatalogEntry;

/// Label of the "no category" choice in the category selector.
pub const DEFAULT_ALL_LABEL: &str = "All";

/// User-supplied constraints. Empty fields mean "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Matched against entry URL and name.
    pub search_term: String,
    /// Matched against entry category or folder.
    pub category: String,
}

impl FilterCriteria {
    /// Creates criteria with both constraints.
    #[must_use]
    pub fn new(search_term: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            search_term: search_term.into(),
            category: category.into(),
        }
    }

    /// Search-only criteria.
    #[must_use]
    pub fn search(term: impl Into<String>) -> Self {
        Self::new(term, "")
    }

    /// Category-only criteria.
    #[must_use]
    pub fn category(category: impl Into<String>) -> Self {
        Self::new("", category)
    }
}

/// Derives the visible subset of a catalog.
#[derive(Debug, Clone)]
pub struct FilterEngine {
    all_label: String,
}

impl Default for FilterEngine {
    fn default() -> Self {
        Self::new(DEFAULT_ALL_LABEL)
    }
}

impl FilterEngine {
    /// Creates an engine treating `all_label` as "every category".
    #[must_use]
    pub fn new(all_label: impl Into<String>) -> Self {
        Self {
            all_label: all_label.into(),
        }
    }

    /// Label that disables the category constraint.
    #[must_use]
    pub fn all_label(&self) -> &str {
        &self.all_label
    }

    /// Applies the category constraint, then the search constraint.
    ///
    /// Only the search term is trimmed; the category comes from a fixed option
    /// list and is matched as given. The result keeps catalog order.
    #[must_use]
    pub fn filter<'a>(
        &self,
        entries: &'a [CatalogEntry],
        criteria: &FilterCriteria,
    ) -> Vec<&'a CatalogEntry> {
        let category = criteria.category.to_lowercase();
        let category = (!category.is_empty() && category != self.all_label.to_lowercase())
            .then_some(category);
        let term = criteria.search_term.trim().to_lowercase();
        let term = (!term.is_empty()).then_some(term);

        entries
            .iter()
            .filter(|entry| {
                category.as_deref().is_none_or(|category| {
                    entry
                        .effective_category()
                        .is_some_and(|c| c.to_lowercase().contains(category))
                })
            })
            .filter(|entry| {
                term.as_deref().is_none_or(|term| {
                    entry.url().to_lowercase().contains(term)
                        || entry
                            .name()
                            .is_some_and(|name| name.to_lowercase().contains(term))
                })
            })
            .collect()
    }
}

/// Builds the generated avatar set shown when a filter matches nothing.
///
/// Each URL is `template` with `{seed}` replaced by `"{term}-{i}"`.
#[must_use]
pub fn placeholder_avatars(term: &str, count: usize, template: &str) -> Vec<CatalogEntry> {
    let term = term.trim();
    let term = if term.is_empty() { "avatar" } else { term };

    (1..=count)
        .map(|i| {
            let seed = format!("{term}-{i}");
            let encoded = utf8_percent_encode(&seed, NON_ALPHANUMERIC).to_string();
            CatalogEntry::new(template.replace("{seed}", &encoded)).with_name(seed)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn catalog() -> Vec<CatalogEntry> {
        vec![
            CatalogEntry::new("a/Cat1.png").with_category("Animals"),
            CatalogEntry::new("b/Dog1.png").with_folder("animals"),
            CatalogEntry::new("c/hero.png")
                .with_name("Catwoman")
                .with_category("Heroes"),
            CatalogEntry::new("d/robot.png").with_name("Robot"),
        ]
    }

    fn urls(entries: &[&CatalogEntry]) -> Vec<String> {
        entries.iter().map(|e| e.url().to_string()).collect()
    }

    #[test]
    fn test_empty_criteria_is_identity() {
        let entries = catalog();
        let result = FilterEngine::default().filter(&entries, &FilterCriteria::default());
        let expected: Vec<&CatalogEntry> = entries.iter().collect();
        assert_eq!(result, expected);
    }

    #[test]
    fn test_search_scenario() {
        let entries = vec![
            CatalogEntry::new("a/Cat1.png"),
            CatalogEntry::new("b/Dog1.png"),
        ];
        let result = FilterEngine::default().filter(&entries, &FilterCriteria::search("cat"));
        assert_eq!(urls(&result), vec!["a/Cat1.png"]);
    }

    #[test]
    fn test_search_matches_url_or_name_in_order() {
        let entries = catalog();
        let result = FilterEngine::default().filter(&entries, &FilterCriteria::search("CAT"));
        assert_eq!(urls(&result), vec!["a/Cat1.png", "c/hero.png"]);
    }

    #[test_case("animals", &["a/Cat1.png", "b/Dog1.png"] ; "category_or_folder")]
    #[test_case("ANIM", &["a/Cat1.png", "b/Dog1.png"] ; "containment_case_insensitive")]
    #[test_case("heroes", &["c/hero.png"] ; "single_category")]
    #[test_case("All", &["a/Cat1.png", "b/Dog1.png", "c/hero.png", "d/robot.png"] ; "all_label")]
    #[test_case("all", &["a/Cat1.png", "b/Dog1.png", "c/hero.png", "d/robot.png"] ; "all_label_lowercase")]
    #[test_case("plants", &[] ; "no_match")]
    #[test_case(" heroes", &[] ; "category_not_trimmed")]
    fn test_category_filter(category: &str, expected: &[&str]) {
        let entries = catalog();
        let result = FilterEngine::default().filter(&entries, &FilterCriteria::category(category));
        assert_eq!(urls(&result), expected);
    }

    #[test]
    fn test_category_then_search() {
        let entries = catalog();
        let result =
            FilterEngine::default().filter(&entries, &FilterCriteria::new("  dog ", "animals"));
        assert_eq!(urls(&result), vec!["b/Dog1.png"]);
    }

    #[test]
    fn test_blank_search_term_is_ignored() {
        let entries = catalog();
        let result = FilterEngine::default().filter(&entries, &FilterCriteria::search("   "));
        assert_eq!(result.len(), entries.len());
    }

    #[test]
    fn test_custom_all_label() {
        let entries = catalog();
        let engine = FilterEngine::new("Tous");
        let result = engine.filter(&entries, &FilterCriteria::category("tous"));
        assert_eq!(result.len(), entries.len());
    }

    #[test]
    fn test_placeholder_avatars() {
        let avatars = placeholder_avatars("big cat", 3, "https://avatars.test/{seed}.svg");
        assert_eq!(avatars.len(), 3);
        assert_eq!(avatars[0].url(), "https://avatars.test/big%20cat%2D1.svg");
        assert_eq!(avatars[2].name(), Some("big cat-3"));

        let avatars = placeholder_avatars("", 1, "{seed}");
        assert_eq!(avatars[0].url(), "avatar%2D1");
    }
}
