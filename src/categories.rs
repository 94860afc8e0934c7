use crate::chart_type::ChartType;
use crate::data::AttributeHeaderItem;
use crate::ir::{Categories, CategoryGroup};
use crate::resolve::{ResolvedAttribute, ResolvedHeaders};

/// Category axis labels for a chart.
pub fn build_categories(chart_type: ChartType, headers: &ResolvedHeaders) -> Categories {
    if let (Some(child), Some(parent)) = (&headers.view_by, &headers.view_by_parent) {
        return Categories::Grouped(two_attribute_categories(child, parent));
    }

    let names_or_blank = |attribute: &Option<ResolvedAttribute>| {
        attribute
            .as_ref()
            .map(ResolvedAttribute::item_names)
            .unwrap_or_else(|| vec![String::new()])
    };

    match chart_type {
        ChartType::Heatmap => Categories::Heatmap(
            names_or_blank(&headers.view_by),
            names_or_blank(&headers.stack_by),
        ),
        ChartType::Scatter => Categories::Flat(names_or_blank(&headers.stack_by)),
        ChartType::Bubble => Categories::Flat(vec![String::new()]),
        _ => {
            if let Some(view_by) = &headers.view_by {
                Categories::Flat(view_by.item_names())
            } else if chart_type.is_multi_measure_alternating() {
                Categories::Flat(
                    headers
                        .measure_group
                        .items
                        .iter()
                        .map(|m| m.name.clone())
                        .collect(),
                )
            } else {
                Categories::Flat(Vec::new())
            }
        }
    }
}

/// Walk parent values in row order, opening a group whenever the parent
/// changes. Separated repeats of a parent open separate groups.
pub fn two_attribute_categories(
    child: &ResolvedAttribute,
    parent: &ResolvedAttribute,
) -> Vec<CategoryGroup> {
    let mut groups: Vec<CategoryGroup> = Vec::new();
    let mut last_parent: Option<&AttributeHeaderItem> = None;

    for (index, parent_item) in parent.items.iter().enumerate() {
        let child_name = child.item_name(index).unwrap_or_default().to_string();

        match groups.last_mut() {
            Some(group) if last_parent == Some(parent_item) => {
                group.categories.push(child_name);
            }
            _ => groups.push(CategoryGroup {
                name: parent_item.name.clone(),
                categories: vec![child_name],
            }),
        }
        last_parent = Some(parent_item);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ExecutionResult, ResultDimension};
    use crate::fixtures::*;
    use crate::resolve::resolve_headers;

    fn attribute_with(names: &[&str], uris: &[&str]) -> ResolvedAttribute {
        ResolvedAttribute {
            header: Default::default(),
            items: names
                .iter()
                .zip(uris)
                .map(|(name, uri)| AttributeHeaderItem {
                    name: name.to_string(),
                    uri: uri.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_two_attribute_groups_follow_runs() {
        let parent = attribute_with(&["P1", "P1", "P2"], &["/p1", "/p1", "/p2"]);
        let child = attribute_with(&["A", "B", "C"], &["/a", "/b", "/c"]);
        let groups = two_attribute_categories(&child, &parent);
        assert_eq!(
            groups,
            vec![
                CategoryGroup {
                    name: "P1".into(),
                    categories: vec!["A".into(), "B".into()]
                },
                CategoryGroup {
                    name: "P2".into(),
                    categories: vec!["C".into()]
                },
            ]
        );
    }

    #[test]
    fn test_separated_parent_repeats_open_new_groups() {
        let parent = attribute_with(
            &["P1", "P1", "P2", "P2", "P1"],
            &["/p1", "/p1", "/p2", "/p2", "/p1"],
        );
        let child = attribute_with(&["A", "B", "C", "D", "E"], &["/a", "/b", "/c", "/d", "/e"]);
        let names: Vec<String> = two_attribute_categories(&child, &parent)
            .into_iter()
            .map(|g| g.name)
            .collect();
        assert_eq!(names, vec!["P1", "P2", "P1"]);
    }

    #[test]
    fn test_single_view_by() {
        let result = measures_by_region();
        let headers = resolve_headers(&result, &resolved_config("bar")).unwrap();
        assert_eq!(
            build_categories(ChartType::Bar, &headers),
            Categories::Flat(vec!["East".into(), "West".into()])
        );
    }

    #[test]
    fn test_measures_only_pie_lists_measures() {
        let result = measures_only(&[Some(1.0), Some(2.0)]);
        let headers = resolve_headers(&result, &resolved_config("pie")).unwrap();
        assert_eq!(
            build_categories(ChartType::Pie, &headers),
            Categories::Flat(vec!["M1".into(), "M2".into()])
        );
        assert_eq!(
            build_categories(ChartType::Column, &headers),
            Categories::Flat(vec![])
        );
    }

    #[test]
    fn test_heatmap_and_scatter_fallbacks() {
        let result = ExecutionResult {
            dimensions: vec![
                ResultDimension { headers: vec![] },
                ResultDimension {
                    headers: vec![measure_group(vec![measure("Revenue", "m1", "")])],
                },
            ],
            data: values(&[&[Some(1.0)]]),
            header_items: vec![vec![], vec![measure_items(1)]],
        };
        let headers = resolve_headers(&result, &resolved_config("heatmap")).unwrap();
        assert_eq!(
            build_categories(ChartType::Heatmap, &headers),
            Categories::Heatmap(vec!["".into()], vec!["".into()])
        );
        assert_eq!(
            build_categories(ChartType::Scatter, &headers),
            Categories::Flat(vec!["".into()])
        );
    }
}
