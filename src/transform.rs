// Series Builder

use crate::chart_type::ChartType;
use crate::color::{Rgb, GRAY, TRANSPARENT, WHITE};
use crate::color_strategy::ColorStrategy;
use crate::config::{ResolvedConfig, MEASURES_BUCKET, SECONDARY_MEASURES_BUCKET};
use crate::data::{AttributeHeaderItem, DataValue, ExecutionResult, MeasureDescriptor};
use crate::ir::{
    DataLabels, Marker, Pattern, PatternFill, PatternPath, PointColor, SeriesDataItem, SeriesItem,
};
use crate::resolve::{ResolvedAttribute, ResolvedHeaders};

const HATCH_PATH: &str = "M 10 0 L 0 10 M 9 11 L 11 9 M 4 11 L 11 4 M -1 1 L 1 -1 M -1 6 L 6 -1";
const TREEMAP_LIGHTEN_RANGE: f64 = 0.8;

/// Inputs shared by every series builder.
pub struct SeriesContext<'a> {
    pub result: &'a ExecutionResult,
    pub headers: &'a ResolvedHeaders,
    pub config: &'a ResolvedConfig,
    pub colors: &'a dyn ColorStrategy,
}

impl<'a> SeriesContext<'a> {
    fn measures(&self) -> &'a [MeasureDescriptor] {
        &self.headers.measure_group.items
    }

    fn measure(&self, index: usize) -> Option<&'a MeasureDescriptor> {
        self.measures().get(index)
    }

    fn color(&self, index: usize) -> Option<Rgb> {
        self.colors.color_by_index(index)
    }

    fn color_string(&self, index: usize) -> Option<String> {
        self.color(index).map(|c| c.to_string())
    }

    fn joined_measure_names(&self) -> String {
        self.measures()
            .iter()
            .map(|m| m.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Dispatch on the chart family.
pub fn build_series(ctx: &SeriesContext<'_>) -> Vec<SeriesItem> {
    let chart_type = ctx.config.chart_type;
    let mut series = match chart_type {
        ChartType::Heatmap => heatmap_series(ctx),
        ChartType::Scatter => scatter_series(ctx),
        ChartType::Bubble => bubble_series(ctx),
        ChartType::Treemap if ctx.headers.stack_by.is_some() => treemap_stacked_series(ctx),
        _ => default_series(ctx),
    };

    if chart_type == ChartType::Combo {
        assign_combo_series_types(&mut series, ctx);
    }
    series
}

// =============================================================================
// Default (bar, column, line, area, combo, pie, donut, funnel, plain treemap)
// =============================================================================

fn default_series(ctx: &SeriesContext<'_>) -> Vec<SeriesItem> {
    let chart_type = ctx.config.chart_type;
    let alternating = chart_type.is_multi_measure_alternating();
    let view_by = ctx.headers.view_by.as_ref();
    let stack_by = ctx.headers.stack_by.as_ref();

    ctx.result
        .data
        .iter()
        .enumerate()
        .map(|(series_index, row)| {
            let data = row
                .iter()
                .enumerate()
                .map(|(point_index, raw)| default_point(ctx, raw, series_index, point_index))
                .collect();

            let name = if let Some(stack_by) = stack_by {
                stack_by.item_name(series_index).unwrap_or_default().to_string()
            } else if alternating && view_by.is_none() {
                ctx.joined_measure_names()
            } else {
                ctx.measure(series_index)
                    .map(|m| m.name.clone())
                    .unwrap_or_default()
            };

            SeriesItem {
                name,
                data,
                color: ctx.color_string(series_index),
                legend_index: series_index,
                ..Default::default()
            }
        })
        .collect()
}

fn default_point(
    ctx: &SeriesContext<'_>,
    raw: &DataValue,
    series_index: usize,
    point_index: usize,
) -> SeriesDataItem {
    let chart_type = ctx.config.chart_type;
    let alternating = chart_type.is_multi_measure_alternating();
    let view_by = ctx.headers.view_by.as_ref();
    let stack_by = ctx.headers.stack_by.as_ref();

    // 1. Which measure backs the point
    let measure_index = if alternating && view_by.is_none() {
        point_index
    } else if stack_by.is_some() {
        0
    } else {
        series_index
    };
    let measure = ctx.measure(measure_index);

    // 2. Value
    let value = raw.parse();
    let mut point = SeriesDataItem {
        format: measure.map(|m| m.format.clone()),
        marker: Some(Marker {
            enabled: !raw.is_null(),
        }),
        ..Default::default()
    };
    if chart_type == ChartType::Treemap {
        point.value = value;
    } else {
        point.y = value;
    }

    // 3. Name
    point.name = if let Some(stack_by) = stack_by {
        stack_by.item_name(series_index).map(str::to_string)
    } else if let (true, Some(view_by)) = (alternating, view_by) {
        view_by.item_name(point_index).map(str::to_string)
    } else {
        measure.map(|m| m.name.clone())
    };

    // 4. Alternating charts color every point
    if alternating {
        point.color = ctx.color_string(point_index).map(PointColor::Solid);
        point.legend_index = Some(point_index);
    }
    point
}

// =============================================================================
// Heatmap
// =============================================================================

fn hatch_pattern() -> PointColor {
    PointColor::Pattern(PatternFill {
        pattern: Pattern {
            path: PatternPath {
                d: HATCH_PATH.to_string(),
                stroke: GRAY.to_string(),
                stroke_width: 1,
                fill: WHITE.to_string(),
            },
            width: 10,
            height: 10,
        },
    })
}

fn heatmap_series(ctx: &SeriesContext<'_>) -> Vec<SeriesItem> {
    let mut data = Vec::new();
    for (row_index, row) in ctx.result.data.iter().enumerate() {
        for (column_index, raw) in row.iter().enumerate() {
            let cell = SeriesDataItem {
                x: Some(column_index as f64),
                y: Some(row_index as f64),
                value: raw.parse(),
                ..Default::default()
            };

            if cell.value.is_some() {
                data.push(cell);
                continue;
            }

            // Null cells: a bordered transparent box under a hatched box
            data.push(SeriesDataItem {
                border_width: Some(1.0),
                border_color: Some(GRAY.to_string()),
                color: Some(PointColor::Solid(TRANSPARENT.to_string())),
                ..cell.clone()
            });
            data.push(SeriesDataItem {
                border_width: Some(0.0),
                point_padding: Some(2.0),
                color: Some(hatch_pattern()),
                ignored_in_drill_event_context: true,
                ..cell
            });
        }
    }

    let first = ctx.measure(0);
    vec![SeriesItem {
        name: first.map(|m| m.name.clone()).unwrap_or_default(),
        data,
        legend_index: 0,
        y_axis: 0,
        data_labels: first.map(|m| DataLabels {
            format: m.format.clone(),
        }),
        ..Default::default()
    }]
}

// =============================================================================
// Scatter and bubble
// =============================================================================

fn scatter_series(ctx: &SeriesContext<'_>) -> Vec<SeriesItem> {
    let primary_empty = ctx.config.is_bucket_empty(MEASURES_BUCKET);
    let secondary_empty = ctx.config.is_bucket_empty(SECONDARY_MEASURES_BUCKET);
    let stack_by = ctx.headers.stack_by.as_ref();

    let data = ctx
        .result
        .data
        .iter()
        .enumerate()
        .map(|(row_index, row)| {
            let values: Vec<Option<f64>> = row.iter().map(DataValue::parse).collect();
            let at = |i: usize| values.get(i).copied().flatten();

            let x = if primary_empty { Some(0.0) } else { at(0) };
            let y = match (secondary_empty, primary_empty) {
                (true, _) => Some(0.0),
                (false, true) => at(0),
                (false, false) => at(1),
            };

            SeriesDataItem {
                x,
                y,
                name: Some(item_name_or_empty(stack_by, row_index)),
                ..Default::default()
            }
        })
        .collect();

    vec![SeriesItem {
        name: String::new(),
        data,
        color: ctx.color_string(0),
        legend_index: 0,
        ..Default::default()
    }]
}

fn bubble_series(ctx: &SeriesContext<'_>) -> Vec<SeriesItem> {
    let primary_empty = ctx.config.is_bucket_empty(MEASURES_BUCKET);
    let secondary_empty = ctx.config.is_bucket_empty(SECONDARY_MEASURES_BUCKET);
    let empty_buckets = usize::from(primary_empty) + usize::from(secondary_empty);
    let stack_by = ctx.headers.stack_by.as_ref();
    let format = ctx.measures().last().map(|m| m.format.clone());

    ctx.result
        .data
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let present = |i: usize| row.get(i).map_or(true, |v| !v.is_null());
            let parsed = |i: Option<usize>| i.and_then(|i| row.get(i)).and_then(DataValue::parse);

            let data = if present(0) && present(1) && present(2) {
                vec![SeriesDataItem {
                    x: if primary_empty { Some(0.0) } else { parsed(Some(0)) },
                    y: if secondary_empty {
                        Some(0.0)
                    } else {
                        parsed(1usize.checked_sub(empty_buckets))
                    },
                    z: parsed(2usize.checked_sub(empty_buckets)),
                    format: format.clone(),
                    ..Default::default()
                }]
            } else {
                Vec::new()
            };

            SeriesItem {
                name: item_name_or_empty(stack_by, index),
                data,
                color: ctx.color_string(index),
                legend_index: index,
                ..Default::default()
            }
        })
        .collect()
}

fn item_name_or_empty(attribute: Option<&ResolvedAttribute>, index: usize) -> String {
    attribute
        .and_then(|a| a.item_name(index))
        .unwrap_or_default()
        .to_string()
}

// =============================================================================
// Treemap
// =============================================================================

fn treemap_stacked_series(ctx: &SeriesContext<'_>) -> Vec<SeriesItem> {
    let data = match (&ctx.headers.view_by, &ctx.headers.stack_by) {
        (Some(view_by), Some(stack_by)) => treemap_data_with_view_by(ctx, view_by, stack_by),
        (None, Some(stack_by)) => treemap_data_with_measures(ctx, stack_by),
        _ => Vec::new(),
    };

    vec![SeriesItem {
        name: ctx.joined_measure_names(),
        data,
        legend_index: 0,
        ..Default::default()
    }]
}

/// Spread `leaves` from the root color toward white by position.
fn apply_leaf_gradient(leaves: &mut [SeriesDataItem], base: Option<Rgb>) {
    let Some(base) = base else { return };
    let step = TREEMAP_LIGHTEN_RANGE / leaves.len().max(1) as f64;
    for (i, leaf) in leaves.iter_mut().enumerate() {
        leaf.color = Some(PointColor::Solid(base.lighten(step * i as f64).to_string()));
    }
}

/// Roots are consecutive runs of the same view-by value.
fn treemap_data_with_view_by(
    ctx: &SeriesContext<'_>,
    view_by: &ResolvedAttribute,
    stack_by: &ResolvedAttribute,
) -> Vec<SeriesDataItem> {
    let format = ctx.measure(0).map(|m| m.format.clone());
    let mut roots: Vec<SeriesDataItem> = Vec::new();
    let mut leaves: Vec<SeriesDataItem> = Vec::new();
    let mut group: Vec<SeriesDataItem> = Vec::new();
    let mut last_root: Option<&AttributeHeaderItem> = None;
    let mut root_id: Option<usize> = None;

    for (row_index, row) in ctx.result.data.iter().enumerate() {
        let Some(current) = view_by.items.get(row_index) else {
            break;
        };

        if last_root != Some(current) {
            if let Some(previous) = root_id {
                apply_leaf_gradient(&mut group, ctx.color(previous));
                leaves.append(&mut group);
            }
            let id = root_id.map_or(0, |r| r + 1);
            root_id = Some(id);
            last_root = Some(current);
            roots.push(SeriesDataItem {
                id: Some(id.to_string()),
                name: Some(current.name.clone()),
                color: ctx.color_string(id).map(PointColor::Solid),
                show_in_legend: Some(true),
                legend_index: Some(id),
                format: format.clone(),
                ..Default::default()
            });
        }

        let parent = root_id.unwrap_or(0);
        group.push(SeriesDataItem {
            name: stack_by.item_name(row_index).map(str::to_string),
            parent: Some(parent.to_string()),
            value: row.first().and_then(DataValue::parse),
            x: Some(row_index as f64),
            y: Some(row_index as f64),
            show_in_legend: Some(false),
            format: format.clone(),
            ..Default::default()
        });
    }

    if let Some(last) = root_id {
        apply_leaf_gradient(&mut group, ctx.color(last));
        leaves.append(&mut group);
    }

    roots.extend(leaves);
    roots
}

/// One root per measure (row), leaves sorted by descending value.
fn treemap_data_with_measures(
    ctx: &SeriesContext<'_>,
    stack_by: &ResolvedAttribute,
) -> Vec<SeriesDataItem> {
    let mut roots: Vec<SeriesDataItem> = Vec::new();
    let mut leaves: Vec<SeriesDataItem> = Vec::new();

    for (row_index, row) in ctx.result.data.iter().enumerate() {
        let measure = ctx.measure(row_index);
        let format = measure.map(|m| m.format.clone());

        roots.push(SeriesDataItem {
            id: Some(row_index.to_string()),
            name: measure.map(|m| m.name.clone()),
            format: format.clone(),
            color: ctx.color_string(row_index).map(PointColor::Solid),
            show_in_legend: Some(true),
            legend_index: Some(row_index),
            ..Default::default()
        });

        let mut group: Vec<SeriesDataItem> = row
            .iter()
            .enumerate()
            .map(|(column_index, raw)| SeriesDataItem {
                name: stack_by.item_name(column_index).map(str::to_string),
                parent: Some(row_index.to_string()),
                format: format.clone(),
                value: raw.parse(),
                x: Some(row_index as f64),
                y: Some(column_index as f64),
                show_in_legend: Some(false),
                ..Default::default()
            })
            .collect();

        sort_by_value_descending(&mut group, |p| p.value);
        apply_leaf_gradient(&mut group, ctx.color(row_index));
        leaves.extend(group);
    }

    roots.extend(leaves);
    roots
}

/// Stable descending sort with missing values last.
pub fn sort_by_value_descending<F>(points: &mut [SeriesDataItem], key: F)
where
    F: Fn(&SeriesDataItem) -> Option<f64>,
{
    points.sort_by(|a, b| match (key(a), key(b)) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(std::cmp::Ordering::Equal),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

// =============================================================================
// Combo
// =============================================================================

/// Secondary-bucket measures take the secondary sub-chart type.
fn assign_combo_series_types(series: &mut [SeriesItem], ctx: &SeriesContext<'_>) {
    let secondary = &ctx.config.secondary_bucket_measures;
    for (index, item) in series.iter_mut().enumerate() {
        let is_secondary = ctx
            .measure(index)
            .map_or(false, |m| secondary.contains(&m.local_identifier));
        item.series_type = Some(if is_secondary {
            ctx.config.secondary_chart_type
        } else {
            ctx.config.primary_chart_type
        });
    }
}
