// Chart configuration

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chart_type::ChartType;
use crate::color::{default_palette, ColorItem, PaletteItem};
use crate::drill::HeaderMatcher;
use crate::error::{ChartError, Result};

pub const MEASURES_BUCKET: &str = "measures";
pub const SECONDARY_MEASURES_BUCKET: &str = "secondary_measures";
pub const TERTIARY_MEASURES_BUCKET: &str = "tertiary_measures";
pub const VIEW_BUCKET: &str = "view";
pub const SEGMENT_BUCKET: &str = "segment";

// =============================================================================
// Raw configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    #[serde(rename = "type")]
    pub chart_type: Option<String>,
    pub stacking: Option<bool>,
    pub stack_measures: Option<bool>,
    pub stack_measures_to_percent: Option<bool>,
    pub color_palette: Option<Vec<PaletteItem>>,
    #[serde(default)]
    pub color_mapping: Vec<ColorMapping>,
    #[serde(rename = "xaxis")]
    pub x_axis: Option<AxisConfig>,
    #[serde(rename = "yaxis")]
    pub y_axis: Option<AxisConfig>,
    #[serde(rename = "secondary_xaxis")]
    pub secondary_x_axis: Option<AxisConfig>,
    #[serde(rename = "secondary_yaxis")]
    pub secondary_y_axis: Option<AxisConfig>,
    pub separators: Option<Separators>,
    pub data_labels: Option<DataLabelsConfig>,
    pub legend_layout: Option<String>,
    pub grid: Option<GridConfig>,
    pub md_object: Option<BucketMetadata>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub x_format: Option<String>,
    pub y_format: Option<String>,
    pub primary_chart_type: Option<String>,
    pub secondary_chart_type: Option<String>,
    pub dual_axis: Option<bool>,
    pub limits: Option<LimitsConfig>,
}

/// A predicate-keyed color override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorMapping {
    pub predicate: HeaderMatcher,
    pub color: ColorItem,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    pub min: Option<f64>,
    pub max: Option<f64>,
    #[serde(default)]
    pub measures: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Separators {
    pub decimal: String,
    pub thousand: String,
}

impl Default for Separators {
    fn default() -> Self {
        Self {
            decimal: ".".to_string(),
            thousand: ",".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataLabelsConfig {
    pub visible: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    pub enabled: Option<bool>,
}

/// Bucket layout the configuration layer used to build the execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketMetadata {
    #[serde(default)]
    pub buckets: Vec<Bucket>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub local_identifier: String,
    #[serde(default)]
    pub items: Vec<BucketItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketItem {
    pub local_identifier: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitsConfig {
    pub series: Option<usize>,
    pub categories: Option<usize>,
    pub data_points: Option<usize>,
}

// =============================================================================
// Canonical configuration
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AxisBounds {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Fully populated configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub chart_type: ChartType,
    pub stack_measures: bool,
    pub stack_measures_to_percent: bool,
    /// Whether an area chart stacks its series.
    pub area_stacking: bool,
    pub palette: Vec<PaletteItem>,
    /// True when the caller supplied its own palette.
    pub custom_palette: bool,
    pub color_mapping: Vec<ColorMapping>,
    /// Bounds of the value axis on the primary side.
    pub primary_bounds: AxisBounds,
    /// Bounds of the value axis on the opposite side.
    pub secondary_bounds: AxisBounds,
    /// Local identifiers of measures plotted against the opposite axis.
    pub secondary_measures: Vec<String>,
    /// Local identifiers in the secondary measures bucket (combo typing).
    pub secondary_bucket_measures: Vec<String>,
    pub separators: Separators,
    pub data_labels_visible: Option<bool>,
    pub legend_layout: String,
    pub grid_enabled: bool,
    pub buckets: Option<Vec<Bucket>>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub x_format: Option<String>,
    pub y_format: Option<String>,
    pub primary_chart_type: ChartType,
    pub secondary_chart_type: ChartType,
    pub limits: LimitsConfig,
}

impl ResolvedConfig {
    /// A bucket counts as empty only when bucket metadata exists and the
    /// bucket is missing or has no items.
    pub fn is_bucket_empty(&self, name: &str) -> bool {
        match &self.buckets {
            None => false,
            Some(buckets) => buckets
                .iter()
                .find(|b| b.local_identifier == name)
                .map_or(true, |b| b.items.is_empty()),
        }
    }

    pub fn has_buckets(&self) -> bool {
        self.buckets.is_some()
    }
}

/// Apply every default exactly once.
pub fn normalize(config: &ChartConfig) -> Result<ResolvedConfig> {
    // 1. Chart type
    let chart_type: ChartType = config
        .chart_type
        .as_deref()
        .ok_or(ChartError::MissingChartType)?
        .parse()?;

    // 2. Stacking switches
    let stack_measures = config.stack_measures.unwrap_or(false);
    let stack_measures_to_percent = config.stack_measures_to_percent.unwrap_or(false);
    let area_stacking = match config.stack_measures {
        Some(explicit) => explicit,
        None => config.stacking.unwrap_or(true),
    };

    // 3. Palette
    let (palette, custom_palette) = match &config.color_palette {
        Some(p) if !p.is_empty() => (p.clone(), true),
        _ => (default_palette(), false),
    };

    // 4. Axes: bar charts lay the value axis out horizontally
    let (primary, secondary) = if chart_type == ChartType::Bar {
        (&config.x_axis, &config.secondary_x_axis)
    } else {
        (&config.y_axis, &config.secondary_y_axis)
    };
    let bounds = |axis: &Option<AxisConfig>| AxisBounds {
        min: axis.as_ref().and_then(|a| a.min),
        max: axis.as_ref().and_then(|a| a.max),
    };
    let configured_secondary: Vec<String> = secondary
        .as_ref()
        .map(|a| a.measures.clone())
        .unwrap_or_default();

    let buckets = config.md_object.as_ref().map(|md| md.buckets.clone());
    let secondary_bucket_measures = match &buckets {
        Some(_) if chart_type == ChartType::Combo => {
            let ids = bucket_ids(&buckets, SECONDARY_MEASURES_BUCKET);
            if ids.is_empty() {
                configured_secondary.clone()
            } else {
                ids
            }
        }
        _ => configured_secondary.clone(),
    };

    let secondary_measures = if chart_type == ChartType::Combo {
        if config.dual_axis == Some(false) {
            Vec::new()
        } else {
            secondary_bucket_measures.clone()
        }
    } else {
        configured_secondary
    };

    // 5. Combo sub-chart types
    let sub_type = |raw: &Option<String>, fallback: ChartType| -> Result<ChartType> {
        match raw {
            Some(t) => t.parse(),
            None => Ok(fallback),
        }
    };
    let primary_chart_type = sub_type(&config.primary_chart_type, ChartType::Column)?;
    let secondary_chart_type = sub_type(&config.secondary_chart_type, ChartType::Line)?;

    let resolved = ResolvedConfig {
        chart_type,
        stack_measures,
        stack_measures_to_percent,
        area_stacking,
        palette,
        custom_palette,
        color_mapping: config.color_mapping.clone(),
        primary_bounds: bounds(primary),
        secondary_bounds: bounds(secondary),
        secondary_measures,
        secondary_bucket_measures,
        separators: config.separators.clone().unwrap_or_default(),
        data_labels_visible: config.data_labels.as_ref().and_then(|d| d.visible),
        legend_layout: config
            .legend_layout
            .clone()
            .unwrap_or_else(|| "horizontal".to_string()),
        grid_enabled: config.grid.as_ref().and_then(|g| g.enabled).unwrap_or(true),
        buckets,
        x_label: config.x_label.clone(),
        y_label: config.y_label.clone(),
        x_format: config.x_format.clone(),
        y_format: config.y_format.clone(),
        primary_chart_type,
        secondary_chart_type,
        limits: config.limits.clone().unwrap_or_default(),
    };

    debug!(
        chart_type = %resolved.chart_type,
        secondary = resolved.secondary_measures.len(),
        custom_palette = resolved.custom_palette,
        "normalized chart config"
    );
    Ok(resolved)
}

fn bucket_ids(buckets: &Option<Vec<Bucket>>, name: &str) -> Vec<String> {
    buckets
        .iter()
        .flatten()
        .filter(|b| b.local_identifier == name)
        .flat_map(|b| b.items.iter().map(|i| i.local_identifier.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(value: serde_json::Value) -> ChartConfig {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_missing_type_is_fatal() {
        assert_eq!(
            normalize(&ChartConfig::default()),
            Err(ChartError::MissingChartType)
        );
    }

    #[test]
    fn test_unsupported_type_is_fatal() {
        let err = normalize(&config(json!({ "type": "sankey" })));
        assert_eq!(err, Err(ChartError::UnsupportedChartType("sankey".into())));
    }

    #[test]
    fn test_defaults() {
        let resolved = normalize(&config(json!({ "type": "column" }))).unwrap();
        assert_eq!(resolved.palette.len(), 20);
        assert!(!resolved.custom_palette);
        assert!(resolved.grid_enabled);
        assert_eq!(resolved.legend_layout, "horizontal");
        assert_eq!(resolved.separators, Separators::default());
        assert!(resolved.area_stacking);
        assert_eq!(resolved.primary_chart_type, ChartType::Column);
        assert_eq!(resolved.secondary_chart_type, ChartType::Line);
    }

    #[test]
    fn test_area_stacking_switches() {
        let off = normalize(&config(json!({ "type": "area", "stacking": false }))).unwrap();
        assert!(!off.area_stacking);

        let explicit = normalize(&config(
            json!({ "type": "area", "stacking": false, "stackMeasures": true }),
        ))
        .unwrap();
        assert!(explicit.area_stacking);
    }

    #[test]
    fn test_bar_reads_secondary_xaxis() {
        let resolved = normalize(&config(json!({
            "type": "bar",
            "secondary_xaxis": { "measures": ["m2"] },
            "secondary_yaxis": { "measures": ["m1"] },
            "xaxis": { "min": 1.0 }
        })))
        .unwrap();
        assert_eq!(resolved.secondary_measures, vec!["m2".to_string()]);
        assert_eq!(resolved.primary_bounds.min, Some(1.0));
    }

    #[test]
    fn test_combo_uses_secondary_bucket() {
        let md = json!({ "buckets": [
            { "localIdentifier": "measures", "items": [{ "localIdentifier": "m1" }] },
            { "localIdentifier": "secondary_measures", "items": [{ "localIdentifier": "m2" }] }
        ]});
        let resolved =
            normalize(&config(json!({ "type": "combo", "mdObject": md.clone() }))).unwrap();
        assert_eq!(resolved.secondary_measures, vec!["m2".to_string()]);

        let single = normalize(&config(
            json!({ "type": "combo", "mdObject": md, "dualAxis": false }),
        ))
        .unwrap();
        assert!(single.secondary_measures.is_empty());
        assert_eq!(single.secondary_bucket_measures, vec!["m2".to_string()]);
    }

    #[test]
    fn test_bucket_emptiness() {
        let without = normalize(&config(json!({ "type": "scatter" }))).unwrap();
        assert!(!without.is_bucket_empty(MEASURES_BUCKET));

        let with = normalize(&config(json!({
            "type": "scatter",
            "mdObject": { "buckets": [
                { "localIdentifier": "measures", "items": [] },
                { "localIdentifier": "secondary_measures", "items": [{ "localIdentifier": "m1" }] }
            ]}
        })))
        .unwrap();
        assert!(with.is_bucket_empty(MEASURES_BUCKET));
        assert!(!with.is_bucket_empty(SECONDARY_MEASURES_BUCKET));
        assert!(with.is_bucket_empty(VIEW_BUCKET));
    }
}
