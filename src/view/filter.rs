//! Search-text and category filtering.

use crate::db::Record;

/// Category value meaning "no category filter".
pub const ALL_CATEGORIES: &str = "All";

/// Declarative filter criteria for one record type.
///
/// A record matches when the search text is empty or is contained
/// (case-insensitively) in any of `search_fields`, and the category filter is
/// absent or equal to the record's category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec<F> {
    pub search_text: String,
    pub category: Option<String>,
    pub search_fields: Vec<F>,
}

impl<F> FilterSpec<F> {
    pub fn new(search_fields: Vec<F>) -> Self {
        Self {
            search_text: String::new(),
            category: None,
            search_fields,
        }
    }

    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    /// Set the category filter. `None`, blank and "All" clear it.
    pub fn with_category(mut self, category: Option<&str>) -> Self {
        self.category = category
            .map(str::trim)
            .filter(|c| !c.is_empty() && *c != ALL_CATEGORIES)
            .map(str::to_string);
        self
    }

    pub fn is_noop(&self) -> bool {
        self.search_text.is_empty() && self.category.is_none()
    }
}

/// Stable filter: matching records in their original order.
pub fn filter<'a, R: Record>(records: &'a [R], spec: &FilterSpec<R::Field>) -> Vec<&'a R> {
    if spec.is_noop() {
        return records.iter().collect();
    }
    let needle = spec.search_text.to_lowercase();
    records
        .iter()
        .filter(|record| matches_with_needle(*record, spec, &needle))
        .collect()
}

pub fn matches<R: Record>(record: &R, spec: &FilterSpec<R::Field>) -> bool {
    matches_with_needle(record, spec, &spec.search_text.to_lowercase())
}

fn matches_with_needle<R: Record>(record: &R, spec: &FilterSpec<R::Field>, needle: &str) -> bool {
    if let Some(category) = spec.category.as_deref()
        && record.category() != category
    {
        return false;
    }
    if needle.is_empty() {
        return true;
    }
    spec.search_fields.iter().any(|field| {
        record
            .text(*field)
            .is_some_and(|value| value.to_lowercase().contains(needle))
    })
}

/// Distinct categories in first-seen order.
pub fn distinct_categories<R: Record>(records: &[R]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for record in records {
        let category = record.category();
        if !out.iter().any(|c| c == category) {
            out.push(category.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{FilterSpec, distinct_categories, filter, matches};
    use crate::db::{DocumentField, DocumentRecord, InteractionField, seed};

    fn doc_spec() -> FilterSpec<DocumentField> {
        FilterSpec::new(vec![
            DocumentField::Title,
            DocumentField::CaseName,
            DocumentField::Category,
        ])
    }

    fn ids(records: &[&DocumentRecord]) -> Vec<String> {
        records.iter().map(|d| d.id.clone()).collect()
    }

    #[test]
    fn empty_spec_is_identity() {
        let docs = seed::documents();
        let out = filter(&docs, &doc_spec());
        assert_eq!(out.len(), docs.len());
        assert!(out.iter().zip(docs.iter()).all(|(a, b)| std::ptr::eq(*a, b)));
    }

    #[test]
    fn search_is_case_insensitive_and_ors_across_fields() {
        let docs = seed::documents();

        let by_title = filter(&docs, &doc_spec().with_search("DIVORCE"));
        assert_eq!(ids(&by_title), vec!["DOC-2023-001", "DOC-2023-006"]);

        let by_category = filter(&docs, &doc_spec().with_search("probate"));
        assert_eq!(ids(&by_category), vec!["DOC-2023-002", "DOC-2023-008"]);
    }

    #[test]
    fn category_is_anded_with_search() {
        let docs = seed::documents();
        let spec = doc_spec()
            .with_search("family")
            .with_category(Some("XLSX"));
        assert_eq!(ids(&filter(&docs, &spec)), vec!["DOC-2023-006"]);

        let none = doc_spec().with_search("zzz").with_category(Some("PDF"));
        assert!(filter(&docs, &none).is_empty());
    }

    #[test]
    fn all_category_clears_the_filter() {
        let spec = doc_spec().with_category(Some("All"));
        assert_eq!(spec.category, None);
        assert!(spec.is_noop());
        assert_eq!(doc_spec().with_category(Some("  ")).category, None);
    }

    #[test]
    fn filter_preserves_relative_order() {
        let docs = seed::documents();
        let pdfs = filter(&docs, &doc_spec().with_category(Some("PDF")));
        assert_eq!(
            ids(&pdfs),
            vec![
                "DOC-2023-001",
                "DOC-2023-002",
                "DOC-2023-005",
                "DOC-2023-007",
                "DOC-2023-008"
            ]
        );
    }

    #[test]
    fn absent_fields_never_match() {
        let interactions = seed::interactions();
        let text_message = interactions
            .iter()
            .find(|i| i.case_name.is_none())
            .expect("seed has an interaction without a case");
        let spec = FilterSpec::new(vec![InteractionField::CaseName]).with_search("a");
        assert!(!matches(text_message, &spec));
    }

    #[test]
    fn distinct_categories_keep_first_seen_order() {
        let docs = seed::documents();
        assert_eq!(
            distinct_categories(&docs),
            vec!["PDF", "DOCX", "JPG", "XLSX"]
        );
    }
}
