use tracing::warn;

use crate::chart_type::ChartType;
use crate::config::{ResolvedConfig, SEGMENT_BUCKET, VIEW_BUCKET};
use crate::data::{
    AttributeDescriptor, AttributeHeaderItem, DimensionHeader, ExecutionResult,
    MeasureGroupDescriptor,
};
use crate::error::{ChartError, Result};

/// Dimension carrying the stack-by attribute (rows of the value matrix).
pub const STACK_BY_DIMENSION_INDEX: usize = 0;
/// Dimension carrying the view-by attribute(s) (columns of the value matrix).
pub const VIEW_BY_DIMENSION_INDEX: usize = 1;
/// Position of the parent attribute on a two-attribute view-by axis.
pub const PARENT_ATTRIBUTE_INDEX: usize = 0;
/// Position of the child attribute on a two-attribute view-by axis.
pub const PRIMARY_ATTRIBUTE_INDEX: usize = 1;
pub const VIEW_BY_ATTRIBUTES_LIMIT: usize = 2;

/// An attribute header together with its value items.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAttribute {
    pub header: AttributeDescriptor,
    pub items: Vec<AttributeHeaderItem>,
}

impl ResolvedAttribute {
    pub fn item_names(&self) -> Vec<String> {
        self.items.iter().map(|i| i.name.clone()).collect()
    }

    pub fn item_name(&self, index: usize) -> Option<&str> {
        self.items.get(index).map(|i| i.name.as_str())
    }

    /// Display name of the attribute the header is a form of.
    pub fn form_of_name(&self) -> &str {
        &self.header.form_of.name
    }
}

/// All headers one chart build reads.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedHeaders {
    pub measure_group: MeasureGroupDescriptor,
    pub view_by: Option<ResolvedAttribute>,
    pub view_by_parent: Option<ResolvedAttribute>,
    pub stack_by: Option<ResolvedAttribute>,
    pub is_view_by_two_attributes: bool,
}

/// Locate the measure group. It must be the last header of its dimension.
pub fn find_measure_group(result: &ExecutionResult) -> Result<&MeasureGroupDescriptor> {
    for (dimension, dim) in result.dimensions.iter().enumerate() {
        let position = dim
            .headers
            .iter()
            .position(|h| matches!(h, DimensionHeader::MeasureGroup(_)));

        if let Some(position) = position {
            let len = dim.headers.len();
            if position != len - 1 {
                warn!(dimension, position, len, "measure group is not the last header");
                return Err(ChartError::MeasureGroupNotLast {
                    dimension,
                    position,
                    len,
                });
            }
            if let DimensionHeader::MeasureGroup(group) = &dim.headers[position] {
                return Ok(group);
            }
        }
    }
    Err(ChartError::MissingMeasureGroup)
}

/// The `index`-th header of `dimension` when it is an attribute, with items.
pub fn find_attribute(
    result: &ExecutionResult,
    dimension: usize,
    index: usize,
) -> Option<ResolvedAttribute> {
    let header = result.dimensions.get(dimension)?.headers.get(index)?;
    match header {
        DimensionHeader::Attribute(descriptor) => Some(ResolvedAttribute {
            header: descriptor.clone(),
            items: result.attribute_items(dimension, index),
        }),
        DimensionHeader::MeasureGroup(_) => None,
    }
}

fn attribute_count(result: &ExecutionResult, dimension: usize) -> usize {
    result
        .dimensions
        .get(dimension)
        .map(|d| {
            d.headers
                .iter()
                .filter(|h| matches!(h, DimensionHeader::Attribute(_)))
                .count()
        })
        .unwrap_or(0)
}

/// Resolve measure group, view-by (with optional parent) and stack-by.
pub fn resolve_headers(result: &ExecutionResult, config: &ResolvedConfig) -> Result<ResolvedHeaders> {
    // 1. Measure group (fatal when misplaced)
    let measure_group = find_measure_group(result)?.clone();

    // 2. Attributes
    let is_view_by_two_attributes =
        attribute_count(result, VIEW_BY_DIMENSION_INDEX) == VIEW_BY_ATTRIBUTES_LIMIT;

    let (view_by, stack_by) = if config.chart_type == ChartType::Treemap {
        resolve_treemap_attributes(result, config)
    } else {
        let child_index = if is_view_by_two_attributes {
            PRIMARY_ATTRIBUTE_INDEX
        } else {
            0
        };
        (
            find_attribute(result, VIEW_BY_DIMENSION_INDEX, child_index),
            find_attribute(result, STACK_BY_DIMENSION_INDEX, 0),
        )
    };

    // 3. Parent of a two-attribute view-by axis
    let view_by_parent = if is_view_by_two_attributes {
        find_attribute(result, VIEW_BY_DIMENSION_INDEX, PARENT_ATTRIBUTE_INDEX)
    } else {
        None
    };

    Ok(ResolvedHeaders {
        measure_group,
        view_by,
        view_by_parent,
        stack_by,
        is_view_by_two_attributes,
    })
}

/// Treemaps put both attributes into the row dimension. Bucket metadata
/// disambiguates one view-by from one segment attribute.
pub fn resolve_treemap_attributes(
    result: &ExecutionResult,
    config: &ResolvedConfig,
) -> (Option<ResolvedAttribute>, Option<ResolvedAttribute>) {
    if !config.has_buckets() {
        let view_by = find_attribute(result, STACK_BY_DIMENSION_INDEX, 0)
            .or_else(|| find_attribute(result, VIEW_BY_DIMENSION_INDEX, 0));
        let stack_by = find_attribute(result, STACK_BY_DIMENSION_INDEX, 1);
        return (view_by, stack_by);
    }

    let segment_empty = config.is_bucket_empty(SEGMENT_BUCKET);
    let view_empty = config.is_bucket_empty(VIEW_BUCKET);

    match (view_empty, segment_empty) {
        (true, true) => (None, None),
        (false, true) => (find_attribute(result, VIEW_BY_DIMENSION_INDEX, 0), None),
        (true, false) => (None, find_attribute(result, VIEW_BY_DIMENSION_INDEX, 0)),
        (false, false) => (
            find_attribute(result, STACK_BY_DIMENSION_INDEX, 0),
            find_attribute(result, STACK_BY_DIMENSION_INDEX, 1),
        ),
    }
}
