// Stacking Configurator

use tracing::debug;

use crate::chart_type::ChartType;
use crate::config::ResolvedConfig;
use crate::ir::{Axis, SeriesItem, StackingMode};
use crate::resolve::ResolvedHeaders;

const PERCENT_SCALE: f64 = 100.0;

/// Fractional bounds become percents, bounds already in percent stay.
fn percent_bound(value: f64) -> f64 {
    if (0.0..=1.0).contains(&value) {
        value * PERCENT_SCALE
    } else {
        value
    }
}

fn requested_mode(config: &ResolvedConfig) -> StackingMode {
    if config.stack_measures_to_percent {
        StackingMode::Percent
    } else {
        StackingMode::Normal
    }
}

/// Chart-level stacking. First matching rule wins.
pub fn base_stacking(config: &ResolvedConfig, headers: &ResolvedHeaders) -> Option<StackingMode> {
    let chart_type = config.chart_type;

    let stacks = (headers.stack_by.is_some() && chart_type.supports_attribute_stacking())
        || (chart_type == ChartType::Area && config.area_stacking)
        || ((config.stack_measures || config.stack_measures_to_percent)
            && chart_type.supports_measure_stacking());

    let mode = stacks.then(|| requested_mode(config));
    debug!(chart_type = %chart_type, stacking = ?mode, "base stacking");
    mode
}

fn is_column_like(t: ChartType) -> bool {
    matches!(t, ChartType::Column | ChartType::Bar)
}

fn is_line_like(t: ChartType) -> bool {
    matches!(t, ChartType::Line | ChartType::Area)
}

/// A combo mixing column/bar with line/area cannot form a single 100% stack.
pub fn can_combo_stack_in_percent(series: &[SeriesItem]) -> bool {
    let types: Vec<ChartType> = series.iter().filter_map(|s| s.series_type).collect();
    let has_column = types.iter().any(|t| is_column_like(*t));
    let has_line = types.iter().any(|t| is_line_like(*t));
    !(has_column && has_line)
}

/// Chart-level stacking of a combo chart once its series are typed.
pub fn combo_stacking(
    base: Option<StackingMode>,
    config: &ResolvedConfig,
    series: &[SeriesItem],
) -> Option<StackingMode> {
    if can_combo_stack_in_percent(series) {
        base
    } else if config.stack_measures {
        Some(StackingMode::Normal)
    } else {
        None
    }
}

/// Push `stacking` down to series and axes. Returns the chart-level mode,
/// which is cleared when no series ends up stacked.
pub fn apply_stacking_passes(
    chart_type: ChartType,
    stacking: Option<StackingMode>,
    series: &mut [SeriesItem],
    y_axes: &mut [Axis],
) -> Option<StackingMode> {
    if !chart_type.is_stacking_capable() {
        return stacking;
    }
    let dual = y_axes.len() > 1;

    // 1. Stack group per axis, percent only on the primary side
    for item in series.iter_mut() {
        let on_opposite = y_axes.get(item.y_axis).map_or(false, |a| a.opposite);
        item.stacking = match stacking {
            Some(StackingMode::Percent) if dual && on_opposite => Some(StackingMode::Normal),
            other => other,
        };
        item.stack = item.stacking.map(|_| item.y_axis);
    }

    // 2. A lone series on an axis has nothing to stack against
    for axis_index in 0..y_axes.len().max(1) {
        let on_axis = series.iter().filter(|s| s.y_axis == axis_index).count();
        if on_axis <= 1 {
            for item in series.iter_mut().filter(|s| s.y_axis == axis_index) {
                item.stacking = None;
                item.stack = None;
            }
        }
    }

    // 3. Combo lines never stack
    if chart_type == ChartType::Combo {
        for item in series
            .iter_mut()
            .filter(|s| s.series_type == Some(ChartType::Line))
        {
            item.stacking = None;
            item.stack = None;
        }
    }

    let effective = stacking.filter(|_| series.iter().any(|s| s.stacking.is_some()));

    // 4. Percent axes show 0..100 with a % suffix
    if effective == Some(StackingMode::Percent) {
        for axis in y_axes.iter_mut().filter(|a| !a.opposite || !dual) {
            axis.percent_labels = true;
            axis.min = axis.min.map(percent_bound);
            axis.max = axis.max.map(percent_bound);
        }
    }

    debug!(stacking = ?effective, series = series.len(), "stacking applied");
    effective
}
