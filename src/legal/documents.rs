use crate::config::{DocumentGrouping, ViewConfig};
use crate::db::{DocumentField, DocumentRecord, EntityStore};
use crate::error::GroupingError;
use crate::view::{
    ALL_CATEGORIES, FilterSpec, GroupKey, GroupKeySpec, GroupLevel, KeyOrder, ViewBinding,
    distinct_categories,
};

/// Search over title, case name and practice area; the category filter is
/// the file type.
pub fn document_filter(search: &str, file_type: Option<&str>) -> FilterSpec<DocumentField> {
    FilterSpec::new(vec![
        DocumentField::Title,
        DocumentField::CaseName,
        DocumentField::Category,
    ])
    .with_search(search)
    .with_category(file_type)
}

/// Year (newest first), then month (latest first), then case or client.
pub fn document_grouping(config: &ViewConfig) -> GroupKeySpec<DocumentRecord> {
    let innermost = match config.document_grouping {
        DocumentGrouping::Case => {
            GroupLevel::new("case", KeyOrder::AlphabeticAscending, |d: &DocumentRecord| {
                Some(GroupKey::text(d.case_name.trim()))
            })
        }
        DocumentGrouping::Client => {
            GroupLevel::new("client", KeyOrder::AlphabeticAscending, |d: &DocumentRecord| {
                Some(GroupKey::text(d.client_name()))
            })
        }
    };
    GroupKeySpec::from_config(config)
        .level(GroupLevel::year())
        .level(GroupLevel::month())
        .level(innermost)
}

/// File-type choices for the filter: "All" followed by the types present.
pub fn file_types(documents: &[DocumentRecord]) -> Vec<String> {
    std::iter::once(ALL_CATEGORIES.to_string())
        .chain(distinct_categories(documents))
        .collect()
}

pub fn document_view(
    store: &EntityStore<DocumentRecord>,
    config: &ViewConfig,
    search: &str,
    file_type: Option<&str>,
) -> Result<ViewBinding<DocumentRecord>, GroupingError> {
    ViewBinding::new(
        store,
        document_filter(search, file_type),
        document_grouping(config),
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{document_grouping, document_view, file_types};
    use crate::config::{DocumentGrouping, ViewConfig};
    use crate::db::{EntityStore, seed};
    use crate::view::group;

    #[test]
    fn file_types_start_with_all() {
        assert_eq!(
            file_types(&seed::documents()),
            vec!["All", "PDF", "DOCX", "JPG", "XLSX"]
        );
    }

    #[test]
    fn documents_group_by_year_month_and_case() {
        let docs = seed::documents();
        let tree = group(&docs, &document_grouping(&ViewConfig::default())).expect("grouping");
        let year = tree.find(&["2023"]).expect("2023");
        let months: Vec<&str> = year
            .children
            .groups()
            .iter()
            .map(|m| m.key.as_str())
            .collect();
        assert_eq!(months, vec!["August", "July", "June"]);

        let august = tree.find(&["2023", "August"]).expect("august");
        let cases: Vec<&str> = august
            .children
            .groups()
            .iter()
            .map(|c| c.key.as_str())
            .collect();
        assert_eq!(cases, vec!["Smith vs. Johnson", "Williams Contract Dispute"]);
    }

    #[test]
    fn client_grouping_uses_name_before_versus() {
        let config = ViewConfig {
            document_grouping: DocumentGrouping::Client,
            ..ViewConfig::default()
        };
        let docs = seed::documents();
        let tree = group(&docs, &document_grouping(&config)).expect("grouping");
        assert!(tree.find(&["2023", "July", "Miller"]).is_some());
        assert!(tree.find(&["2023", "August", "Smith"]).is_some());
    }

    #[test]
    fn view_reflects_search_and_file_type() {
        let store = EntityStore::new(seed::documents()).expect("seed");
        let view = document_view(&store, &ViewConfig::default(), "probate", Some("PDF"))
            .expect("view");
        let output = view.output();
        assert_eq!(output.filtered_count, 2);
        assert_eq!(output.total_count, 8);
        assert!(output.tree.find(&["2023", "June", "Harris Will Contest"]).is_some());
        assert!(output.tree.find(&["2023", "July", "Brown Estate"]).is_some());
    }
}
