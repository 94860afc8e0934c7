// Axis Assignor: x/y axis descriptors and series-to-axis linking

use tracing::debug;

use crate::chart_type::ChartType;
use crate::config::{AxisBounds, ResolvedConfig, MEASURES_BUCKET, SECONDARY_MEASURES_BUCKET};
use crate::data::MeasureDescriptor;
use crate::ir::{Axis, SeriesItem};
use crate::resolve::ResolvedHeaders;

fn with_bounds(mut axis: Axis, bounds: AxisBounds) -> Axis {
    axis.min = bounds.min;
    axis.max = bounds.max;
    axis
}

/// Category (or first-measure) axis.
pub fn build_x_axes(config: &ResolvedConfig, headers: &ResolvedHeaders) -> Vec<Axis> {
    if config.chart_type.is_xy() {
        if config.is_bucket_empty(MEASURES_BUCKET) {
            return vec![Axis::default()];
        }
        let first = headers.measure_group.items.first();
        return vec![Axis {
            label: config
                .x_label
                .clone()
                .or_else(|| first.map(|m| m.name.clone()))
                .unwrap_or_default(),
            format: config.x_format.clone().or_else(|| first.map(|m| m.format.clone())),
            ..Default::default()
        }];
    }

    let label = config
        .x_label
        .clone()
        .or_else(|| headers.view_by.as_ref().map(|v| v.form_of_name().to_string()))
        .unwrap_or_default();
    vec![Axis {
        label,
        ..Default::default()
    }]
}

/// True when the chart shows a second value axis.
pub fn is_dual_axis(config: &ResolvedConfig) -> bool {
    config.chart_type.supports_dual_axis() && !config.secondary_measures.is_empty()
}

/// Value axes. A dual-axis chart splits measures between a primary and an
/// opposite axis; an axis that ends up with no measures is dropped.
pub fn build_y_axes(config: &ResolvedConfig, headers: &ResolvedHeaders) -> Vec<Axis> {
    let measures = &headers.measure_group.items;

    let mut axes = match config.chart_type {
        ChartType::Scatter | ChartType::Bubble => return xy_y_axes(config, measures),
        ChartType::Heatmap => {
            return vec![Axis {
                label: headers
                    .stack_by
                    .as_ref()
                    .map(|s| s.form_of_name().to_string())
                    .unwrap_or_default(),
                ..Default::default()
            }]
        }
        _ if is_dual_axis(config) => dual_y_axes(config, measures),
        _ => {
            let indices: Vec<usize> = (0..measures.len()).collect();
            vec![with_bounds(
                measure_axis(measures, &indices, false),
                config.primary_bounds,
            )]
        }
    };

    if let Some(first) = axes.first_mut() {
        if let Some(label) = &config.y_label {
            first.label = label.clone();
        }
        if let Some(format) = &config.y_format {
            first.format = Some(format.clone());
        }
    }
    axes
}

fn xy_y_axes(config: &ResolvedConfig, measures: &[MeasureDescriptor]) -> Vec<Axis> {
    if config.is_bucket_empty(SECONDARY_MEASURES_BUCKET) {
        return vec![Axis::default()];
    }
    let index = if config.is_bucket_empty(MEASURES_BUCKET) { 0 } else { 1 };
    let measure = measures.get(index);
    vec![Axis {
        label: config
            .y_label
            .clone()
            .or_else(|| measure.map(|m| m.name.clone()))
            .unwrap_or_default(),
        format: config.y_format.clone().or_else(|| measure.map(|m| m.format.clone())),
        ..Default::default()
    }]
}

fn dual_y_axes(config: &ResolvedConfig, measures: &[MeasureDescriptor]) -> Vec<Axis> {
    let (secondary, primary): (Vec<usize>, Vec<usize>) = (0..measures.len())
        .partition(|&i| config.secondary_measures.contains(&measures[i].local_identifier));

    debug!(
        primary = primary.len(),
        secondary = secondary.len(),
        "partitioned measures between axes"
    );

    [
        (primary, false, config.primary_bounds),
        (secondary, true, config.secondary_bounds),
    ]
    .into_iter()
    .filter(|(indices, _, _)| !indices.is_empty())
    .map(|(indices, opposite, bounds)| {
        let mut axis = measure_axis(measures, &indices, opposite);
        // a single measure on one side names the axis
        if indices.len() != 1 {
            axis.label = String::new();
        }
        with_bounds(axis, bounds)
    })
    .collect()
}

/// Axis over the measures at `indices`. The first percentage format wins.
fn measure_axis(measures: &[MeasureDescriptor], indices: &[usize], opposite: bool) -> Axis {
    let assigned: Vec<&MeasureDescriptor> =
        indices.iter().filter_map(|&i| measures.get(i)).collect();
    let first = assigned.first();

    let label = match assigned.as_slice() {
        [only] => only.name.clone(),
        _ => String::new(),
    };
    let percentage_format = assigned
        .iter()
        .find(|m| m.format.contains('%'))
        .map(|m| m.format.clone());

    Axis {
        label,
        format: percentage_format.or_else(|| first.map(|m| m.format.clone())),
        opposite,
        series_indices: indices.to_vec(),
        ..Default::default()
    }
}

/// Stamp every series with the index of the axis listing it (0 otherwise).
pub fn assign_y_axes(series: &mut [SeriesItem], y_axes: &[Axis]) {
    for (index, item) in series.iter_mut().enumerate() {
        item.y_axis = y_axes
            .iter()
            .position(|axis| axis.series_indices.contains(&index))
            .unwrap_or(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{normalize, ChartConfig};
    use crate::fixtures::*;
    use crate::resolve::resolve_headers;

    fn config_from(value: serde_json::Value) -> ResolvedConfig {
        let raw: ChartConfig = serde_json::from_value(value).unwrap();
        normalize(&raw).unwrap()
    }

    #[test]
    fn test_x_axis_uses_attribute_name() {
        let result = measures_by_region();
        let config = resolved_config("column");
        let headers = resolve_headers(&result, &config).unwrap();
        let axes = build_x_axes(&config, &headers);
        assert_eq!(axes[0].label, "Region");
    }

    #[test]
    fn test_single_y_axis_with_two_measures_has_no_label() {
        let result = measures_by_region();
        let config = resolved_config("column");
        let headers = resolve_headers(&result, &config).unwrap();
        let axes = build_y_axes(&config, &headers);
        assert_eq!(axes.len(), 1);
        assert_eq!(axes[0].label, "");
        assert_eq!(axes[0].series_indices, vec![0, 1]);
        assert_eq!(axes[0].format.as_deref(), Some("#,##0.00"));
    }

    #[test]
    fn test_dual_axis_partition() {
        let result = measures_by_region();
        let config = config_from(serde_json::json!({
            "type": "column",
            "secondary_yaxis": { "measures": ["m2"], "max": 50.0 }
        }));
        let headers = resolve_headers(&result, &config).unwrap();
        let axes = build_y_axes(&config, &headers);

        assert_eq!(axes.len(), 2);
        assert_eq!(axes[0].label, "Revenue");
        assert!(!axes[0].opposite);
        assert_eq!(axes[1].label, "Cost");
        assert!(axes[1].opposite);
        assert_eq!(axes[1].series_indices, vec![1]);
        assert_eq!(axes[1].max, Some(50.0));

        let mut series = vec![SeriesItem::default(), SeriesItem::default()];
        assign_y_axes(&mut series, &axes);
        assert_eq!(series[0].y_axis, 0);
        assert_eq!(series[1].y_axis, 1);
    }

    #[test]
    fn test_dual_axis_ignored_for_pie() {
        let result = measures_by_region();
        let config = config_from(serde_json::json!({
            "type": "pie",
            "secondary_yaxis": { "measures": ["m2"] }
        }));
        let headers = resolve_headers(&result, &config).unwrap();
        assert_eq!(build_y_axes(&config, &headers).len(), 1);
    }

    #[test]
    fn test_all_measures_on_secondary_drops_primary() {
        let result = measures_by_region();
        let config = config_from(serde_json::json!({
            "type": "line",
            "secondary_yaxis": { "measures": ["m1", "m2"] }
        }));
        let headers = resolve_headers(&result, &config).unwrap();
        let axes = build_y_axes(&config, &headers);
        assert_eq!(axes.len(), 1);
        assert!(axes[0].opposite);
        assert_eq!(axes[0].label, "");
    }

    #[test]
    fn test_percentage_format_surfaces() {
        let mut result = measures_by_region();
        if let crate::data::DimensionHeader::MeasureGroup(group) =
            &mut result.dimensions[0].headers[0]
        {
            group.items[1].format = "#,##0.0%".into();
        }
        let config = resolved_config("column");
        let headers = resolve_headers(&result, &config).unwrap();
        let axes = build_y_axes(&config, &headers);
        assert_eq!(axes[0].format.as_deref(), Some("#,##0.0%"));
    }

    #[test]
    fn test_label_overrides() {
        let result = measures_by_region();
        let config = config_from(serde_json::json!({
            "type": "column", "yLabel": "Money", "xLabel": "Where"
        }));
        let headers = resolve_headers(&result, &config).unwrap();
        assert_eq!(build_y_axes(&config, &headers)[0].label, "Money");
        assert_eq!(build_x_axes(&config, &headers)[0].label, "Where");
    }

    #[test]
    fn test_scatter_axes() {
        let result = customers_by_measures(&[&[Some(1.0), Some(2.0)]]);
        let config = config_from(serde_json::json!({
            "type": "scatter",
            "mdObject": { "buckets": [
                { "localIdentifier": "measures", "items": [{ "localIdentifier": "m1" }] },
                { "localIdentifier": "secondary_measures", "items": [{ "localIdentifier": "m2" }] }
            ]}
        }));
        let headers = resolve_headers(&result, &config).unwrap();
        assert_eq!(build_x_axes(&config, &headers)[0].label, "Spend");
        let y = build_y_axes(&config, &headers);
        assert_eq!(y[0].label, "Visits");
        assert_eq!(y[0].format.as_deref(), Some("#,##0.00"));
    }

    #[test]
    fn test_heatmap_y_axis_uses_stack_attribute() {
        let result = stacked_by_product(&[&[Some(1.0)]]);
        let config = resolved_config("heatmap");
        let headers = resolve_headers(&result, &config).unwrap();
        assert_eq!(build_y_axes(&config, &headers)[0].label, "Product");
    }
}
