// Chart Options Assembler

use tracing::{debug, info};

use crate::categories::build_categories;
use crate::chart_type::ChartType;
use crate::color_strategy::{create_color_strategy, heatmap_data_classes, ColorInputs};
use crate::config::{normalize, ChartConfig};
use crate::data::{ChartInput, ExecutionResult};
use crate::drill::{annotate_drillability, HeaderPredicate};
use crate::error::Result;
use crate::ir::{Categories, ChartData, ChartOptions, ColorAxis, Grid, HeatmapTitle, SeriesItem};
use crate::resolve::{resolve_headers, ResolvedAttribute, ResolvedHeaders};
use crate::scale::{assign_y_axes, build_x_axes, build_y_axes, is_dual_axis};
use crate::stacking::{apply_stacking_passes, base_stacking, combo_stacking};
use crate::tooltip::TooltipFactory;
use crate::transform::{build_series, sort_by_value_descending, SeriesContext};

/// Build renderer-agnostic chart options from an execution result.
///
/// Fails only on configuration invariant violations: a missing or unknown
/// chart type, or a misplaced or missing measure group. Oversized data and
/// unsupported negative values are reported by [`crate::validate::validate`].
pub fn build_chart_options<P: HeaderPredicate>(
    result: &ExecutionResult,
    config: &ChartConfig,
    drillable_items: &[P],
) -> Result<ChartOptions> {
    // 1. Canonical config and headers
    let config = normalize(config)?;
    let chart_type = config.chart_type;
    let headers = resolve_headers(result, &config)?;

    // 2. Colors
    let inputs = ColorInputs::new(&config, &headers);
    let colors = create_color_strategy(chart_type, &inputs);

    // 3. Series, then drillability
    let series = build_series(&SeriesContext {
        result,
        headers: &headers,
        config: &config,
        colors: colors.as_ref(),
    });
    let mut series = annotate_drillability(series, &headers, chart_type, drillable_items);

    // 4. Axes
    let x_axes = build_x_axes(&config, &headers);
    let mut y_axes = build_y_axes(&config, &headers);
    assign_y_axes(&mut series, &y_axes);

    // 5. Categories, re-sorted with the data for pie-like charts
    let mut categories = build_categories(chart_type, &headers);
    if chart_type.is_sorted_by_measure() {
        sort_by_measure_value(&mut series, &mut categories);
    }

    // 6. Stacking
    let stacking = match chart_type {
        ChartType::Heatmap => None,
        ChartType::Combo => {
            let base = combo_stacking(base_stacking(&config, &headers), &config, &series);
            apply_stacking_passes(chart_type, base, &mut series, &mut y_axes)
        }
        _ => {
            let base = base_stacking(&config, &headers);
            apply_stacking_passes(chart_type, base, &mut series, &mut y_axes)
        }
    };

    // 7. Heatmap extras
    let (color_axis, title) = if chart_type == ChartType::Heatmap {
        (
            Some(ColorAxis {
                data_classes: heatmap_data_classes(&series, colors.as_ref()),
            }),
            Some(heatmap_title(&headers)),
        )
    } else {
        (None, None)
    };

    let tooltip = TooltipFactory::new(&config, &headers, is_dual_axis(&config));

    info!(
        %chart_type,
        series = series.len(),
        categories = categories.count(),
        stacking = ?stacking,
        "built chart options"
    );

    Ok(ChartOptions {
        chart_type,
        stacking,
        has_stack_by_attribute: headers.stack_by.is_some(),
        has_view_by_attribute: headers.view_by.is_some(),
        is_view_by_two_attributes: headers.is_view_by_two_attributes,
        legend_layout: config.legend_layout.clone(),
        x_axes,
        y_axes,
        data: ChartData { series, categories },
        tooltip,
        grid: Grid {
            enabled: chart_type != ChartType::Heatmap && config.grid_enabled,
        },
        color_assignments: colors.output_assignment(),
        color_palette: config.palette.clone(),
        color_axis,
        title,
        data_labels_visible: config.data_labels_visible,
    })
}

/// Build options for a parsed request envelope.
pub fn build_from_input(input: &ChartInput) -> Result<ChartOptions> {
    build_chart_options(&input.result, &input.config, &input.drillable_items)
}

fn heatmap_title(headers: &ResolvedHeaders) -> HeatmapTitle {
    let name = |a: &Option<ResolvedAttribute>| {
        a.as_ref()
            .map(|a| a.form_of_name().to_string())
            .unwrap_or_default()
    };
    HeatmapTitle {
        x: name(&headers.view_by),
        y: name(&headers.stack_by),
        format: headers
            .measure_group
            .items
            .first()
            .map(|m| m.format.clone())
            .unwrap_or_default(),
    }
}

/// Sort the single series by descending value and apply the same
/// permutation to the categories. Points keep their colors and get fresh
/// contiguous legend indices.
fn sort_by_measure_value(series: &mut [SeriesItem], categories: &mut Categories) {
    let Some(first) = series.first_mut() else {
        return;
    };
    sort_by_value_descending(&mut first.data, |p| p.y);

    if let Categories::Flat(names) = categories {
        if names.len() == first.data.len() {
            let permuted: Vec<String> = first
                .data
                .iter()
                .enumerate()
                .map(|(position, p)| {
                    let old = p.legend_index.unwrap_or(position);
                    names.get(old).cloned().unwrap_or_default()
                })
                .collect();
            *names = permuted;
        }
    }

    for (position, point) in first.data.iter_mut().enumerate() {
        point.legend_index = Some(position);
    }
    debug!(points = first.data.len(), "sorted points by value");
}
