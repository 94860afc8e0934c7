use serde::Serialize;

use crate::chart_type::ChartType;
use crate::color::{PaletteItem, Rgb};
use crate::tooltip::TooltipFactory;

// =============================================================================
// Chart options (renderer-agnostic output)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StackingMode {
    Normal,
    Percent,
}

/// The complete description handed to the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartOptions {
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub stacking: Option<StackingMode>,
    pub has_stack_by_attribute: bool,
    pub has_view_by_attribute: bool,
    pub is_view_by_two_attributes: bool,
    pub legend_layout: String,
    pub x_axes: Vec<Axis>,
    pub y_axes: Vec<Axis>,
    pub data: ChartData,
    /// Formats hovered points; callers invoke it, it is never serialized.
    #[serde(skip)]
    pub tooltip: TooltipFactory,
    pub grid: Grid,
    pub color_assignments: Vec<ColorAssignment>,
    pub color_palette: Vec<PaletteItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_axis: Option<ColorAxis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<HeatmapTitle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_labels_visible: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub series: Vec<SeriesItem>,
    pub categories: Categories,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Grid {
    pub enabled: bool,
}

/// Category axis labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Categories {
    Flat(Vec<String>),
    /// Parent value runs of a two-attribute axis.
    Grouped(Vec<CategoryGroup>),
    /// Column labels then row labels.
    Heatmap(Vec<String>, Vec<String>),
}

impl Categories {
    /// Number of labels a reader sees on the category axis.
    pub fn count(&self) -> usize {
        match self {
            Categories::Flat(c) => c.len(),
            Categories::Grouped(groups) => groups.iter().map(|g| g.categories.len()).sum(),
            Categories::Heatmap(x, y) => x.len().max(y.len()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryGroup {
    pub name: String,
    pub categories: Vec<String>,
}

// =============================================================================
// Series
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesItem {
    pub name: String,
    pub data: Vec<SeriesDataItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub legend_index: usize,
    pub y_axis: usize,
    pub is_drillable: bool,
    pub stacking: Option<StackingMode>,
    pub stack: Option<usize>,
    /// Sub-chart type of a combo series.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub series_type: Option<ChartType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_labels: Option<DataLabels>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataLabels {
    pub format: String,
}

/// One point. Which fields are set depends on the chart family.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesDataItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<PointColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    /// Treemap root id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Treemap leaf pointer to its root id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_in_legend: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point_padding: Option<f64>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub ignored_in_drill_event_context: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub drilldown: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drill_intersection: Option<Vec<DrillIntersectionElement>>,
}

impl SeriesDataItem {
    /// Index read from an x/y coordinate that encodes a header position.
    pub fn x_index(&self) -> Option<usize> {
        self.x.filter(|x| *x >= 0.0).map(|x| x as usize)
    }

    pub fn y_index(&self) -> Option<usize> {
        self.y.filter(|y| *y >= 0.0).map(|y| y as usize)
    }

    /// Treemap nodes with an id are roots.
    pub fn is_treemap_root(&self) -> bool {
        self.id.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Marker {
    pub enabled: bool,
}

/// Solid fill or pattern fill of a point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PointColor {
    Solid(String),
    Pattern(PatternFill),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternFill {
    pub pattern: Pattern,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pattern {
    pub path: PatternPath,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternPath {
    pub d: String,
    pub stroke: String,
    pub stroke_width: u32,
    pub fill: String,
}

/// One element of a drill intersection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrillIntersectionElement {
    pub id: String,
    pub title: String,
    pub header: DrillHeader,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DrillHeader {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

// =============================================================================
// Axes
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Axis {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    pub opposite: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub series_indices: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Tick labels carry a `%` suffix.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub percent_labels: bool,
}

// =============================================================================
// Colors
// =============================================================================

/// The legend-bearing header a color belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AssignedHeader {
    Measure {
        #[serde(rename = "localIdentifier")]
        local_identifier: String,
        name: String,
    },
    AttributeItem {
        name: String,
        uri: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorAssignment {
    pub header: AssignedHeader,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorAxis {
    pub data_classes: Vec<DataClass>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataClass {
    pub from: f64,
    pub to: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapTitle {
    pub x: String,
    pub y: String,
    pub format: String,
}
