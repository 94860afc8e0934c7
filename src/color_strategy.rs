use tracing::{debug, warn};

use crate::chart_type::ChartType;
use crate::color::{
    heatmap_gradient, palette_color, PaletteItem, Rgb, DEFAULT_HEATMAP_BLUE,
    DERIVED_MEASURE_LIGHTEN_RATIO,
};
use crate::config::{ColorMapping, ResolvedConfig};
use crate::data::{AttributeHeaderItem, MeasureDescriptor};
use crate::drill::{HeaderPredicate, MappingHeader, PredicateContext};
use crate::ir::{AssignedHeader, ColorAssignment, DataClass, SeriesItem};
use crate::resolve::{ResolvedAttribute, ResolvedHeaders};

pub const HEATMAP_CATEGORIES_COUNT: usize = 7;
pub const DEFAULT_HEATMAP_COLOR_INDEX: usize = 1;

/// Legend colors. `output` omits derived measures, `full` keeps them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorAssignments {
    pub full: Vec<ColorAssignment>,
    pub output: Vec<ColorAssignment>,
}

impl ColorAssignments {
    fn same(assignments: Vec<ColorAssignment>) -> Self {
        Self {
            full: assignments.clone(),
            output: assignments,
        }
    }
}

/// Color source for one chart build.
///
/// Implementations are computed once and never mutate afterwards, so
/// `color_by_index` is stable across calls.
pub trait ColorStrategy {
    fn assignments(&self) -> &ColorAssignments;

    fn color_by_index(&self, index: usize) -> Option<Rgb>;

    /// Assignment handed to legend consumers.
    fn output_assignment(&self) -> Vec<ColorAssignment> {
        self.assignments().output.clone()
    }
}

/// Everything a strategy reads.
#[derive(Clone, Copy)]
pub struct ColorInputs<'a> {
    pub palette: &'a [PaletteItem],
    pub custom_palette: bool,
    pub mapping: &'a [ColorMapping],
    pub headers: &'a ResolvedHeaders,
}

impl<'a> ColorInputs<'a> {
    pub fn new(config: &'a ResolvedConfig, headers: &'a ResolvedHeaders) -> Self {
        Self {
            palette: &config.palette,
            custom_palette: config.custom_palette,
            mapping: &config.color_mapping,
            headers,
        }
    }

    fn measures(&self) -> &'a [MeasureDescriptor] {
        &self.headers.measure_group.items
    }

    /// Color of the first mapping matching `header`, if it resolves.
    fn mapped_color(&self, header: MappingHeader<'_>) -> Option<Rgb> {
        let context = PredicateContext::new(self.measures());
        let mapping = self
            .mapping
            .iter()
            .find(|m| m.predicate.matches(header, &context))?;
        let color = mapping.color.resolve(self.palette);
        if color.is_none() {
            warn!(color = ?mapping.color, "mapped color is not in the palette, rotating instead");
        }
        color
    }

    fn rotated(&self, index: usize) -> Option<Rgb> {
        palette_color(self.palette, index)
    }
}

fn measure_header(measure: &MeasureDescriptor) -> AssignedHeader {
    AssignedHeader::Measure {
        local_identifier: measure.local_identifier.clone(),
        name: measure.name.clone(),
    }
}

fn attribute_item_header(item: &AttributeHeaderItem) -> AssignedHeader {
    AssignedHeader::AttributeItem {
        name: item.name.clone(),
        uri: item.uri.clone(),
    }
}

fn colors_of(assignments: &[ColorAssignment]) -> Vec<Rgb> {
    assignments.iter().map(|a| a.color).collect()
}

// =============================================================================
// Measure-keyed
// =============================================================================

/// Legend entries are measures. Derived measures do not consume a palette
/// slot and take a lighter shade of their master measure.
pub fn measure_assignments(inputs: &ColorInputs<'_>) -> ColorAssignments {
    let measures = inputs.measures();
    let context = PredicateContext::new(measures);

    // 1. Masters rotate through the palette
    let mut palette_index = 0;
    let mut own: Vec<Option<Rgb>> = Vec::with_capacity(measures.len());
    for measure in measures {
        if measure.is_derived() {
            own.push(None);
            continue;
        }
        let color = inputs
            .mapped_color(MappingHeader::Measure(measure))
            .or_else(|| inputs.rotated(palette_index));
        palette_index += 1;
        own.push(color);
    }

    // 2. Derived measures inherit from their master
    let mut full = Vec::with_capacity(measures.len());
    let mut output = Vec::with_capacity(measures.len());
    for (index, measure) in measures.iter().enumerate() {
        let color = match &measure.derived_from {
            None => own[index],
            Some(source) => {
                let master_color = measures
                    .iter()
                    .position(|m| &m.local_identifier == source)
                    .and_then(|i| own[i]);
                match master_color {
                    // Mappings never apply here, a derived measure always follows its master
                    Some(master) => Some(master.lighten(DERIVED_MEASURE_LIGHTEN_RATIO)),
                    None => {
                        debug!(measure = %measure.local_identifier, "master measure not found");
                        inputs
                            .mapped_color(MappingHeader::Measure(measure))
                            .or_else(|| inputs.rotated(palette_index))
                    }
                }
            }
        };

        let Some(color) = color else { continue };
        let assignment = ColorAssignment {
            header: measure_header(measure),
            color,
        };
        let has_master = context.master_of(measure).is_some();
        if !measure.is_derived() || !has_master {
            output.push(assignment.clone());
        }
        full.push(assignment);
    }

    ColorAssignments { full, output }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeasureColorStrategy {
    assignments: ColorAssignments,
    colors: Vec<Rgb>,
}

impl MeasureColorStrategy {
    pub fn new(inputs: &ColorInputs<'_>) -> Self {
        let assignments = measure_assignments(inputs);
        let colors = colors_of(&assignments.full);
        Self {
            assignments,
            colors,
        }
    }
}

impl ColorStrategy for MeasureColorStrategy {
    fn assignments(&self) -> &ColorAssignments {
        &self.assignments
    }

    fn color_by_index(&self, index: usize) -> Option<Rgb> {
        self.colors.get(index).copied()
    }
}

// =============================================================================
// Attribute-keyed
// =============================================================================

/// Legend entries are the distinct values of `attribute`.
pub fn attribute_assignments(
    attribute: &ResolvedAttribute,
    inputs: &ColorInputs<'_>,
) -> Vec<ColorAssignment> {
    let mut unique: Vec<&AttributeHeaderItem> = Vec::new();
    for item in &attribute.items {
        if !unique.contains(&item) {
            unique.push(item);
        }
    }

    unique
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let color = inputs
                .mapped_color(MappingHeader::AttributeItem(item))
                .or_else(|| inputs.rotated(index))?;
            Some(ColorAssignment {
                header: attribute_item_header(item),
                color,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeColorStrategy {
    assignments: ColorAssignments,
    colors: Vec<Rgb>,
}

impl AttributeColorStrategy {
    /// Colors the stack-by attribute, or the view-by one when there is none.
    pub fn new(inputs: &ColorInputs<'_>) -> Self {
        let attribute = inputs
            .headers
            .stack_by
            .as_ref()
            .or(inputs.headers.view_by.as_ref());
        let assignments = attribute
            .map(|a| attribute_assignments(a, inputs))
            .unwrap_or_default();
        let colors = colors_of(&assignments);
        Self {
            assignments: ColorAssignments::same(assignments),
            colors,
        }
    }
}

impl ColorStrategy for AttributeColorStrategy {
    fn assignments(&self) -> &ColorAssignments {
        &self.assignments
    }

    fn color_by_index(&self, index: usize) -> Option<Rgb> {
        self.colors.get(index).copied()
    }
}

// =============================================================================
// Heatmap
// =============================================================================

/// A white-to-base gradient keyed by the first measure.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapColorStrategy {
    assignments: ColorAssignments,
    gradient: Vec<Rgb>,
}

impl HeatmapColorStrategy {
    pub fn new(inputs: &ColorInputs<'_>) -> Self {
        let first = inputs.measures().first();
        let fallback = if inputs.custom_palette {
            inputs.palette.first().map_or(DEFAULT_HEATMAP_BLUE, |p| p.fill)
        } else {
            DEFAULT_HEATMAP_BLUE
        };
        let base = first
            .and_then(|m| inputs.mapped_color(MappingHeader::Measure(m)))
            .unwrap_or(fallback);

        let assignments = first
            .map(|m| {
                vec![ColorAssignment {
                    header: measure_header(m),
                    color: base,
                }]
            })
            .unwrap_or_default();

        Self {
            assignments: ColorAssignments::same(assignments),
            gradient: heatmap_gradient(base),
        }
    }
}

impl ColorStrategy for HeatmapColorStrategy {
    fn assignments(&self) -> &ColorAssignments {
        &self.assignments
    }

    fn color_by_index(&self, index: usize) -> Option<Rgb> {
        if self.gradient.is_empty() {
            return None;
        }
        Some(self.gradient[index % self.gradient.len()])
    }
}

// =============================================================================
// Treemap
// =============================================================================

/// Attribute colors when a view-by exists, otherwise the measure legend.
#[derive(Debug, Clone, PartialEq)]
pub struct TreemapColorStrategy {
    assignments: ColorAssignments,
    colors: Vec<Rgb>,
}

impl TreemapColorStrategy {
    pub fn new(inputs: &ColorInputs<'_>) -> Self {
        let assignments = match &inputs.headers.view_by {
            Some(view_by) => attribute_assignments(view_by, inputs),
            None => measure_assignments(inputs).output,
        };
        let colors = colors_of(&assignments);
        Self {
            assignments: ColorAssignments::same(assignments),
            colors,
        }
    }
}

impl ColorStrategy for TreemapColorStrategy {
    fn assignments(&self) -> &ColorAssignments {
        &self.assignments
    }

    fn color_by_index(&self, index: usize) -> Option<Rgb> {
        self.colors.get(index).copied()
    }
}

// =============================================================================
// Scatter / bubble
// =============================================================================

/// One shared color, repeated once per stack-by value.
#[derive(Debug, Clone, PartialEq)]
pub struct PointsColorStrategy {
    assignments: ColorAssignments,
    colors: Vec<Rgb>,
}

impl PointsColorStrategy {
    pub fn new(inputs: &ColorInputs<'_>) -> Self {
        let first = inputs.measures().first();
        let color = first
            .and_then(|m| inputs.mapped_color(MappingHeader::Measure(m)))
            .or_else(|| inputs.rotated(0));

        let assignments: Vec<ColorAssignment> = match (first, color) {
            (Some(m), Some(color)) => vec![ColorAssignment {
                header: measure_header(m),
                color,
            }],
            _ => Vec::new(),
        };

        let repeat = inputs
            .headers
            .stack_by
            .as_ref()
            .map_or(1, |s| s.items.len());
        let colors = color.map(|c| vec![c; repeat]).unwrap_or_default();

        Self {
            assignments: ColorAssignments::same(assignments),
            colors,
        }
    }
}

impl ColorStrategy for PointsColorStrategy {
    fn assignments(&self) -> &ColorAssignments {
        &self.assignments
    }

    fn color_by_index(&self, index: usize) -> Option<Rgb> {
        self.colors.get(index).copied()
    }
}

// =============================================================================
// Factory
// =============================================================================

/// Pick the strategy for `chart_type`.
pub fn create_color_strategy(
    chart_type: ChartType,
    inputs: &ColorInputs<'_>,
) -> Box<dyn ColorStrategy> {
    let headers = inputs.headers;
    let has_attributes = headers.view_by.is_some() || headers.stack_by.is_some();

    let (name, strategy): (&str, Box<dyn ColorStrategy>) = match chart_type {
        ChartType::Heatmap => ("heatmap", Box::new(HeatmapColorStrategy::new(inputs))),
        ChartType::Treemap => ("treemap", Box::new(TreemapColorStrategy::new(inputs))),
        ChartType::Scatter => ("points", Box::new(PointsColorStrategy::new(inputs))),
        ChartType::Bubble if headers.stack_by.is_some() => {
            ("attribute", Box::new(AttributeColorStrategy::new(inputs)))
        }
        ChartType::Bubble => ("points", Box::new(PointsColorStrategy::new(inputs))),
        _ if headers.stack_by.is_some()
            || (chart_type.prefers_attribute_colors() && has_attributes) =>
        {
            ("attribute", Box::new(AttributeColorStrategy::new(inputs)))
        }
        _ => ("measure", Box::new(MeasureColorStrategy::new(inputs))),
    };

    debug!(%chart_type, strategy = name, "selected color strategy");
    strategy
}

/// Round to 15 significant digits.
fn safe_precision(value: f64) -> f64 {
    format!("{:.14e}", value).parse().unwrap_or(value)
}

/// Seven contiguous class intervals over the non-null heatmap values, or a
/// single one when every value is equal.
pub fn heatmap_data_classes(series: &[SeriesItem], strategy: &dyn ColorStrategy) -> Vec<DataClass> {
    let values: Vec<f64> = series
        .first()
        .map(|s| s.data.iter().filter_map(|p| p.value).collect())
        .unwrap_or_default();

    if values.is_empty() {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let color = |index: usize| {
        strategy
            .color_by_index(index)
            .map(|c| c.to_string())
            .unwrap_or_default()
    };

    if min == max {
        return vec![DataClass {
            from: min,
            to: max,
            color: color(DEFAULT_HEATMAP_COLOR_INDEX),
        }];
    }

    let safe_min = safe_precision(min);
    let safe_max = safe_precision(max);
    let step = (safe_max - safe_min) / HEATMAP_CATEGORIES_COUNT as f64;

    let mut classes = Vec::with_capacity(HEATMAP_CATEGORIES_COUNT);
    let mut current = safe_min;
    for i in 0..HEATMAP_CATEGORIES_COUNT {
        let to = if i == HEATMAP_CATEGORIES_COUNT - 1 {
            safe_max
        } else {
            current + step
        };
        classes.push(DataClass {
            from: current,
            to,
            color: color(i),
        });
        current += step;
    }
    classes
}
