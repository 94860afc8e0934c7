// Advisory data-size and negative-value checks on built chart options

use serde::Serialize;
use tracing::debug;

use crate::chart_type::ChartType;
use crate::config::LimitsConfig;
use crate::ir::ChartOptions;

pub const DEFAULT_SERIES_LIMIT: usize = 1000;
pub const DEFAULT_CATEGORIES_LIMIT: usize = 3000;
pub const DEFAULT_DATA_POINTS_LIMIT: usize = 2000;
pub const PIE_CHART_LIMIT: usize = 20;
pub const HEATMAP_DATA_POINTS_LIMIT: usize = 10000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub data_too_large: bool,
    pub has_negative_value: bool,
}

/// Resolved limits. `data_points` applies to each series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartLimits {
    pub series: usize,
    pub categories: usize,
    pub data_points: Option<usize>,
}

impl ChartLimits {
    pub fn for_chart_type(chart_type: ChartType) -> Self {
        match chart_type {
            ChartType::Scatter => Self {
                series: DEFAULT_SERIES_LIMIT,
                categories: DEFAULT_SERIES_LIMIT,
                data_points: None,
            },
            ChartType::Pie | ChartType::Donut | ChartType::Funnel => Self {
                series: 1,
                categories: PIE_CHART_LIMIT,
                data_points: None,
            },
            ChartType::Treemap => Self {
                series: DEFAULT_SERIES_LIMIT,
                categories: DEFAULT_DATA_POINTS_LIMIT,
                data_points: Some(DEFAULT_DATA_POINTS_LIMIT),
            },
            ChartType::Heatmap => Self {
                series: DEFAULT_SERIES_LIMIT,
                categories: DEFAULT_CATEGORIES_LIMIT,
                data_points: Some(HEATMAP_DATA_POINTS_LIMIT),
            },
            _ => Self {
                series: DEFAULT_SERIES_LIMIT,
                categories: DEFAULT_CATEGORIES_LIMIT,
                data_points: None,
            },
        }
    }

    /// Configured values win field by field.
    pub fn with_overrides(self, overrides: &LimitsConfig) -> Self {
        Self {
            series: overrides.series.unwrap_or(self.series),
            categories: overrides.categories.unwrap_or(self.categories),
            data_points: overrides.data_points.or(self.data_points),
        }
    }
}

pub fn validate(options: &ChartOptions, overrides: &LimitsConfig) -> ValidationResult {
    let chart_type = options.chart_type;
    let limits = ChartLimits::for_chart_type(chart_type).with_overrides(overrides);
    let series = &options.data.series;

    // Treemap roots are layout nodes, not data
    let point_count = |index: usize| {
        series[index]
            .data
            .iter()
            .filter(|p| chart_type != ChartType::Treemap || !p.is_treemap_root())
            .count()
    };

    let too_many_series = series.len() > limits.series;
    let too_many_categories = options.data.categories.count() > limits.categories;
    let too_many_points = limits
        .data_points
        .map_or(false, |limit| (0..series.len()).any(|i| point_count(i) > limit));

    let has_negative_value = chart_type.is_negative_value_unsupported()
        && series.iter().flat_map(|s| &s.data).any(|p| {
            p.y.map_or(false, |y| y < 0.0) || p.value.map_or(false, |v| v < 0.0)
        });

    let result = ValidationResult {
        data_too_large: too_many_series || too_many_categories || too_many_points,
        has_negative_value,
    };
    debug!(
        too_many_series,
        too_many_categories,
        too_many_points,
        has_negative_value,
        "validated chart data"
    );
    result
}
