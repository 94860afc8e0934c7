// Tooltip Factory

use crate::chart_type::ChartType;
use crate::config::{
    ResolvedConfig, Separators, MEASURES_BUCKET, SECONDARY_MEASURES_BUCKET,
    TERTIARY_MEASURES_BUCKET,
};
use crate::format::{format_number, format_percent, DEFAULT_FORMAT};
use crate::ir::{Categories, ChartOptions, SeriesDataItem, SeriesItem};
use crate::resolve::{ResolvedAttribute, ResolvedHeaders};

pub const TOOLTIP_PADDING: u32 = 10;
pub const TOOLTIP_MAX_WIDTH: u32 = 320;
/// Charts at most this wide give the whole width to the tooltip.
pub const TOOLTIP_FULLSCREEN_THRESHOLD: u32 = 480;

const NULL_CELL: &str = "-";

/// Width available to tooltip content on a chart `chart_width` pixels wide.
pub fn tooltip_content_width(chart_width: u32) -> u32 {
    if chart_width <= TOOLTIP_FULLSCREEN_THRESHOLD {
        chart_width
    } else {
        chart_width.min(TOOLTIP_MAX_WIDTH)
    }
}

/// Escape text for HTML without double-escaping existing entities.
pub fn escape_html(text: &str) -> String {
    let plain = text
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    let mut out = String::with_capacity(plain.len());
    for ch in plain.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// An attribute's display name and its value labels.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttributeLabels {
    pub name: String,
    pub items: Vec<String>,
}

impl AttributeLabels {
    fn from_attribute(attribute: &ResolvedAttribute) -> Self {
        Self {
            name: attribute.form_of_name().to_string(),
            items: attribute.item_names(),
        }
    }

    fn item(&self, index: Option<usize>) -> &str {
        index
            .and_then(|i| self.items.get(i))
            .map_or("", String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeasureLabel {
    pub name: String,
    pub format: String,
}

/// Row layout per chart family.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TooltipKind {
    /// Series name and value, preceded by the view-by value when present.
    #[default]
    Default,
    TwoAttributes {
        parent_name: String,
    },
    /// One row per plotted measure; `None` marks an empty bucket.
    Xy {
        measures: Vec<Option<MeasureLabel>>,
    },
    Heatmap {
        view_by: Option<AttributeLabels>,
        stack_by: Option<AttributeLabels>,
    },
    Treemap {
        view_by: Option<AttributeLabels>,
        stack_by: Option<AttributeLabels>,
    },
}

/// Everything needed to format a tooltip after the options are built.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TooltipFactory {
    pub kind: TooltipKind,
    pub chart_type: Option<ChartType>,
    /// Display name of the view-by (or, for scatter/bubble, stack-by) attribute.
    pub attribute_name: Option<String>,
    pub separators: Separators,
    pub stack_measures_to_percent: bool,
    pub is_dual_axis: bool,
}

/// What the renderer knows about a hovered point.
#[derive(Debug, Clone, Copy)]
pub struct HoveredPoint<'a> {
    pub series: &'a SeriesItem,
    pub point: &'a SeriesDataItem,
    /// Position of the point in its series.
    pub index: usize,
    pub category: Option<&'a str>,
    pub parent_category: Option<&'a str>,
    pub on_opposite_axis: bool,
}

impl TooltipFactory {
    pub fn new(config: &ResolvedConfig, headers: &ResolvedHeaders, is_dual_axis: bool) -> Self {
        let chart_type = config.chart_type;
        let labels = |a: &Option<ResolvedAttribute>| a.as_ref().map(AttributeLabels::from_attribute);

        let (kind, attribute) = match chart_type {
            ChartType::Heatmap => (
                TooltipKind::Heatmap {
                    view_by: labels(&headers.view_by),
                    stack_by: labels(&headers.stack_by),
                },
                None,
            ),
            ChartType::Treemap => (
                TooltipKind::Treemap {
                    view_by: labels(&headers.view_by),
                    stack_by: labels(&headers.stack_by),
                },
                None,
            ),
            ChartType::Scatter | ChartType::Bubble => (
                TooltipKind::Xy {
                    measures: xy_measures(config, headers),
                },
                headers.stack_by.as_ref(),
            ),
            _ => match &headers.view_by_parent {
                Some(parent) if headers.is_view_by_two_attributes => (
                    TooltipKind::TwoAttributes {
                        parent_name: parent.form_of_name().to_string(),
                    },
                    headers.view_by.as_ref(),
                ),
                _ => (TooltipKind::Default, headers.view_by.as_ref()),
            },
        };

        Self {
            kind,
            chart_type: Some(chart_type),
            attribute_name: attribute.map(|a| a.form_of_name().to_string()),
            separators: config.separators.clone(),
            stack_measures_to_percent: config.stack_measures_to_percent,
            is_dual_axis,
        }
    }

    fn format(&self, value: Option<f64>, format: Option<&str>) -> String {
        escape_html(&format_number(
            value,
            format.unwrap_or(DEFAULT_FORMAT),
            &self.separators,
        ))
    }

    /// Percent string when percent stacking is on and the caller supplied
    /// one; points on the opposite axis of a dual chart never stack in percent.
    fn point_value(&self, hovered: &HoveredPoint<'_>, percentage: Option<f64>) -> String {
        let on_right_axis = self.is_dual_axis && hovered.on_opposite_axis;
        match percentage {
            Some(p) if self.stack_measures_to_percent && !on_right_axis => format_percent(p),
            _ => {
                let point = hovered.point;
                self.format(point.y.or(point.value), point.format.as_deref())
            }
        }
    }

    /// Render the tooltip rows. Returns `None` for treemap root nodes.
    pub fn render(
        &self,
        hovered: &HoveredPoint<'_>,
        max_content_width: u32,
        percentage: Option<f64>,
    ) -> Option<String> {
        let point = hovered.point;
        let series_name = escape_html(&hovered.series.name);
        let mut rows: Vec<(String, String)> = Vec::new();

        match &self.kind {
            TooltipKind::Default => {
                rows.push((series_name, self.point_value(hovered, percentage)));
                let alternating = self
                    .chart_type
                    .map_or(false, |t| t.is_multi_measure_alternating());
                if let Some(name) = &self.attribute_name {
                    let category = hovered
                        .category
                        .or(point.name.as_deref())
                        .unwrap_or_default();
                    rows.insert(0, (escape_html(name), escape_html(category)));
                } else if alternating {
                    rows[0].0 = escape_html(point.name.as_deref().unwrap_or_default());
                }
            }
            TooltipKind::TwoAttributes { parent_name } => {
                rows.push((series_name, self.point_value(hovered, percentage)));
                if let Some(category) = hovered.category {
                    if let Some(name) = &self.attribute_name {
                        rows.insert(0, (escape_html(name), escape_html(category)));
                    }
                    if let Some(parent) = hovered.parent_category {
                        rows.insert(0, (escape_html(parent_name), escape_html(parent)));
                    }
                }
            }
            TooltipKind::Xy { measures } => {
                if let Some(name) = &self.attribute_name {
                    let label = point
                        .name
                        .as_deref()
                        .filter(|n| !n.is_empty())
                        .unwrap_or(&hovered.series.name);
                    rows.push((escape_html(name), escape_html(label)));
                }
                for (measure, value) in measures.iter().zip([point.x, point.y, point.z]) {
                    if let Some(m) = measure {
                        rows.push((escape_html(&m.name), self.format(value, Some(&m.format))));
                    }
                }
            }
            TooltipKind::Heatmap { view_by, stack_by } => {
                let format = hovered.series.data_labels.as_ref().map(|d| d.format.as_str());
                let value = match point.value {
                    None => NULL_CELL.to_string(),
                    value => self.format(value, format),
                };
                if let Some(stack_by) = stack_by {
                    rows.push((
                        escape_html(&stack_by.name),
                        escape_html(stack_by.item(point.y_index())),
                    ));
                }
                if let Some(view_by) = view_by {
                    rows.push((
                        escape_html(&view_by.name),
                        escape_html(view_by.item(point.x_index())),
                    ));
                }
                rows.push((series_name, value));
            }
            TooltipKind::Treemap { view_by, stack_by } => {
                if point.is_treemap_root() {
                    return None;
                }
                let value = self.format(point.value, point.format.as_deref());
                if let Some(view_by) = view_by {
                    let x = point.x_index().unwrap_or(hovered.index);
                    rows.push((escape_html(&view_by.name), escape_html(view_by.item(Some(x)))));
                }
                if let Some(stack_by) = stack_by {
                    rows.push((
                        escape_html(&stack_by.name),
                        escape_html(stack_by.item(point.y_index())),
                    ));
                }
                if view_by.is_some() {
                    rows.push((series_name, value));
                } else {
                    rows.push((escape_html(hovered.category.unwrap_or_default()), value));
                }
            }
        }

        Some(render_rows(&rows, max_content_width))
    }
}

/// Measures in x, y, z order for scatter and bubble charts.
fn xy_measures(config: &ResolvedConfig, headers: &ResolvedHeaders) -> Vec<Option<MeasureLabel>> {
    let mut available = headers.measure_group.items.iter().map(|m| MeasureLabel {
        name: m.name.clone(),
        format: m.format.clone(),
    });

    let buckets: &[&str] = if config.chart_type == ChartType::Bubble {
        &[MEASURES_BUCKET, SECONDARY_MEASURES_BUCKET, TERTIARY_MEASURES_BUCKET]
    } else {
        &[MEASURES_BUCKET, SECONDARY_MEASURES_BUCKET]
    };

    buckets
        .iter()
        .map(|bucket| {
            if config.is_bucket_empty(bucket) {
                None
            } else {
                available.next()
            }
        })
        .collect()
}

fn render_rows(rows: &[(String, String)], max_content_width: u32) -> String {
    let item_width = max_content_width.saturating_sub(TOOLTIP_PADDING * 2);
    let style = format!("style=\"max-width: {}px;\"", item_width);

    rows.iter()
        .map(|(title, value)| {
            format!(
                "<div class=\"tooltip-item\">\
                 <span class=\"tooltip-title\" {style}>{title}</span>\
                 <div class=\"tooltip-value-wrapper\" {style}>\
                 <span class=\"tooltip-value\" {style}>{value}</span>\
                 </div></div>"
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// =============================================================================
// Hover lookup on built options
// =============================================================================

impl ChartOptions {
    /// Tooltip of point `point_index` in series `series_index` on a chart
    /// `chart_width` pixels wide.
    pub fn tooltip_html(
        &self,
        series_index: usize,
        point_index: usize,
        chart_width: u32,
        percentage: Option<f64>,
    ) -> Option<String> {
        let series = self.data.series.get(series_index)?;
        let point = series.data.get(point_index)?;

        let (category, parent_category) = match &self.data.categories {
            Categories::Flat(names) => (names.get(point_index).map(String::as_str), None),
            Categories::Grouped(groups) => groups
                .iter()
                .flat_map(|g| g.categories.iter().map(move |c| (c.as_str(), g.name.as_str())))
                .nth(point_index)
                .map_or((None, None), |(c, p)| (Some(c), Some(p))),
            Categories::Heatmap(..) => (None, None),
        };

        // treemap leaves are categorized by their root
        let category = match &point.parent {
            Some(parent) => series
                .data
                .iter()
                .find(|p| p.id.as_ref() == Some(parent))
                .and_then(|root| root.name.as_deref())
                .or(category),
            None => category,
        };

        let hovered = HoveredPoint {
            series,
            point,
            index: point_index,
            category,
            parent_category,
            on_opposite_axis: self
                .y_axes
                .get(series.y_axis)
                .map_or(false, |axis| axis.opposite),
        };
        self.tooltip
            .render(&hovered, tooltip_content_width(chart_width), percentage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{normalize, ChartConfig};
    use crate::fixtures::*;
    use crate::ir::DataLabels;
    use crate::resolve::resolve_headers;

    fn series(name: &str) -> SeriesItem {
        SeriesItem {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn hovered<'a>(series: &'a SeriesItem, point: &'a SeriesDataItem) -> HoveredPoint<'a> {
        HoveredPoint {
            series,
            point,
            index: 0,
            category: None,
            parent_category: None,
            on_opposite_axis: false,
        }
    }

    #[test]
    fn test_content_width() {
        assert_eq!(tooltip_content_width(400), 400);
        assert_eq!(tooltip_content_width(800), 320);
        assert_eq!(tooltip_content_width(481), 320);
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>&"), "&lt;b&gt;&amp;");
        assert_eq!(escape_html("a &amp; b"), "a &amp; b");
    }

    #[test]
    fn test_default_tooltip_rows() {
        let result = measures_by_region();
        let config = resolved_config("column");
        let headers = resolve_headers(&result, &config).unwrap();
        let factory = TooltipFactory::new(&config, &headers, false);

        let s = series("Revenue");
        let point = SeriesDataItem {
            y: Some(1234.5),
            format: Some("#,##0.00".into()),
            ..Default::default()
        };
        let mut h = hovered(&s, &point);
        h.category = Some("East");

        let html = factory.render(&h, 320, None).unwrap();
        let rows: Vec<&str> = html.lines().collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].contains(">Region<"));
        assert!(rows[0].contains(">East<"));
        assert!(rows[1].contains(">Revenue<"));
        assert!(rows[1].contains(">1,234.50<"));
        assert!(html.contains("max-width: 300px;"));
    }

    #[test]
    fn test_percent_value_only_when_stacking_to_percent() {
        let result = measures_by_region();
        let raw: ChartConfig = serde_json::from_value(serde_json::json!({
            "type": "column", "stackMeasuresToPercent": true
        }))
        .unwrap();
        let config = normalize(&raw).unwrap();
        let headers = resolve_headers(&result, &config).unwrap();
        let factory = TooltipFactory::new(&config, &headers, true);

        let s = series("Revenue");
        let point = SeriesDataItem {
            y: Some(10.0),
            ..Default::default()
        };
        let h = hovered(&s, &point);
        assert!(factory.render(&h, 320, Some(33.333)).unwrap().contains(">33.33%<"));

        let right = HoveredPoint {
            on_opposite_axis: true,
            ..h
        };
        assert!(factory.render(&right, 320, Some(33.333)).unwrap().contains(">10.00<"));
    }

    #[test]
    fn test_two_attribute_tooltip_lists_parent_first() {
        let result = products_by_country_and_city();
        let raw = ChartConfig {
            chart_type: Some("column".into()),
            ..Default::default()
        };
        let options = crate::runtime::build_chart_options::<crate::drill::HeaderMatcher>(
            &result,
            &raw,
            &[],
        )
        .unwrap();

        let html = options.tooltip_html(1, 2, 400, None).unwrap();
        let rows: Vec<&str> = html.lines().collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].contains(">Country<"));
        assert!(rows[0].contains(">SK<"));
        assert!(rows[1].contains(">City<"));
        assert!(rows[1].contains(">Bratislava<"));
        assert!(rows[2].contains(">P2<"));
        assert!(rows[2].contains(">6<"));

        let first = options.tooltip_html(0, 1, 400, None).unwrap();
        assert!(first.lines().next().unwrap().contains(">CZ<"));
        assert!(first.contains(">Brno<"));
    }

    #[test]
    fn test_pie_without_view_by_uses_point_name() {
        let result = measures_only(&[Some(1.0), Some(2.0)]);
        let config = resolved_config("pie");
        let headers = resolve_headers(&result, &config).unwrap();
        let factory = TooltipFactory::new(&config, &headers, false);

        let s = series("M1, M2");
        let point = SeriesDataItem {
            y: Some(2.0),
            name: Some("M2".into()),
            format: Some("#,##0".into()),
            ..Default::default()
        };
        let html = factory.render(&hovered(&s, &point), 320, None).unwrap();
        assert_eq!(html.lines().count(), 1);
        assert!(html.contains(">M2<"));
        assert!(html.contains(">2<"));
    }

    #[test]
    fn test_heatmap_null_cell() {
        let factory = TooltipFactory {
            kind: TooltipKind::Heatmap {
                view_by: Some(AttributeLabels {
                    name: "Region".into(),
                    items: vec!["East".into()],
                }),
                stack_by: Some(AttributeLabels {
                    name: "Product".into(),
                    items: vec!["P1".into()],
                }),
            },
            ..Default::default()
        };
        let s = SeriesItem {
            data_labels: Some(DataLabels {
                format: "#,##0".into(),
            }),
            ..series("Revenue")
        };
        let point = SeriesDataItem {
            x: Some(0.0),
            y: Some(0.0),
            ..Default::default()
        };
        let html = factory.render(&hovered(&s, &point), 320, None).unwrap();
        let rows: Vec<&str> = html.lines().collect();
        assert!(rows[0].contains(">Product<") && rows[0].contains(">P1<"));
        assert!(rows[1].contains(">Region<") && rows[1].contains(">East<"));
        assert!(rows[2].contains(">-<"));
    }

    #[test]
    fn test_treemap_root_has_no_tooltip() {
        let factory = TooltipFactory {
            kind: TooltipKind::Treemap {
                view_by: None,
                stack_by: None,
            },
            ..Default::default()
        };
        let s = series("Revenue");
        let root = SeriesDataItem {
            id: Some("0".into()),
            ..Default::default()
        };
        assert_eq!(factory.render(&hovered(&s, &root), 320, None), None);
    }

    #[test]
    fn test_scatter_tooltip_lists_measures() {
        let result = customers_by_measures(&[&[Some(1.0), Some(2.5)]]);
        let config = resolved_config("scatter");
        let headers = resolve_headers(&result, &config).unwrap();
        let factory = TooltipFactory::new(&config, &headers, false);

        let s = series("");
        let point = SeriesDataItem {
            x: Some(1.0),
            y: Some(2.5),
            name: Some("C1".into()),
            ..Default::default()
        };
        let html = factory.render(&hovered(&s, &point), 320, None).unwrap();
        let rows: Vec<&str> = html.lines().collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].contains(">Customer<") && rows[0].contains(">C1<"));
        assert!(rows[1].contains(">Spend<") && rows[1].contains(">1.00<"));
        assert!(rows[2].contains(">Visits<") && rows[2].contains(">2.50<"));
    }

    #[test]
    fn test_scatter_with_empty_primary_bucket() {
        let result = customers_by_measures(&[&[Some(1.0)]]);
        let raw: ChartConfig = serde_json::from_value(serde_json::json!({
            "type": "scatter",
            "mdObject": { "buckets": [
                { "localIdentifier": "measures", "items": [] },
                { "localIdentifier": "secondary_measures", "items": [{ "localIdentifier": "m1" }] }
            ]}
        }))
        .unwrap();
        let config = normalize(&raw).unwrap();
        let headers = resolve_headers(&result, &config).unwrap();
        match TooltipFactory::new(&config, &headers, false).kind {
            TooltipKind::Xy { measures } => {
                assert_eq!(measures.len(), 2);
                assert!(measures[0].is_none());
                assert_eq!(measures[1].as_ref().map(|m| m.name.as_str()), Some("Spend"));
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }
}
