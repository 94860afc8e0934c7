// Drillability annotation

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chart_type::ChartType;
use crate::data::{AttributeDescriptor, AttributeHeaderItem, MeasureDescriptor};
use crate::ir::{DrillHeader, DrillIntersectionElement, SeriesDataItem, SeriesItem};
use crate::resolve::{ResolvedAttribute, ResolvedHeaders};

// =============================================================================
// Header predicates
// =============================================================================

/// A header a predicate can be tested against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MappingHeader<'a> {
    Measure(&'a MeasureDescriptor),
    Attribute(&'a AttributeDescriptor),
    AttributeItem(&'a AttributeHeaderItem),
}

/// Lookup data predicates may need beyond the header itself.
#[derive(Debug, Clone, Copy)]
pub struct PredicateContext<'a> {
    measures: &'a [MeasureDescriptor],
}

impl<'a> PredicateContext<'a> {
    pub fn new(measures: &'a [MeasureDescriptor]) -> Self {
        Self { measures }
    }

    /// Follow `derived_from` links to the first non-derived measure.
    pub fn master_of(&self, measure: &'a MeasureDescriptor) -> Option<&'a MeasureDescriptor> {
        let mut current = measure;
        // A chain can never be longer than the measure group.
        for _ in 0..=self.measures.len() {
            let Some(source) = &current.derived_from else {
                return Some(current);
            };
            current = self
                .measures
                .iter()
                .find(|m| &m.local_identifier == source)?;
        }
        None
    }

    /// Measure whose uri and identifier stand for `measure`.
    pub fn identity_of(&self, measure: &'a MeasureDescriptor) -> &'a MeasureDescriptor {
        self.master_of(measure).unwrap_or(measure)
    }
}

pub trait HeaderPredicate {
    fn matches(&self, header: MappingHeader<'_>, context: &PredicateContext<'_>) -> bool;
}

impl<F> HeaderPredicate for F
where
    F: Fn(MappingHeader<'_>, &PredicateContext<'_>) -> bool,
{
    fn matches(&self, header: MappingHeader<'_>, context: &PredicateContext<'_>) -> bool {
        self(header, context)
    }
}

/// Serializable predicates for drillable items and color mappings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum HeaderMatcher {
    Uri(String),
    Identifier(String),
    LocalIdentifier(String),
    AttributeItemName(String),
    /// A derived measure whose master has this uri.
    ComposedFromUri(String),
    /// A derived measure whose master has this identifier.
    ComposedFromIdentifier(String),
}

impl HeaderPredicate for HeaderMatcher {
    fn matches(&self, header: MappingHeader<'_>, context: &PredicateContext<'_>) -> bool {
        match (self, header) {
            (HeaderMatcher::Uri(uri), MappingHeader::Measure(m)) => {
                context.identity_of(m).uri.as_deref() == Some(uri.as_str())
            }
            (HeaderMatcher::Uri(uri), MappingHeader::Attribute(a)) => &a.uri == uri,
            (HeaderMatcher::Uri(uri), MappingHeader::AttributeItem(i)) => &i.uri == uri,

            (HeaderMatcher::Identifier(id), MappingHeader::Measure(m)) => {
                context.identity_of(m).identifier.as_deref() == Some(id.as_str())
            }
            (HeaderMatcher::Identifier(id), MappingHeader::Attribute(a)) => &a.identifier == id,

            (HeaderMatcher::LocalIdentifier(id), MappingHeader::Measure(m)) => {
                &m.local_identifier == id
            }
            (HeaderMatcher::LocalIdentifier(id), MappingHeader::Attribute(a)) => {
                &a.local_identifier == id
            }

            (HeaderMatcher::AttributeItemName(name), MappingHeader::AttributeItem(i)) => {
                &i.name == name
            }

            (HeaderMatcher::ComposedFromUri(uri), MappingHeader::Measure(m)) if m.is_derived() => {
                context
                    .master_of(m)
                    .map_or(false, |master| master.uri.as_deref() == Some(uri.as_str()))
            }
            (HeaderMatcher::ComposedFromIdentifier(id), MappingHeader::Measure(m))
                if m.is_derived() =>
            {
                context
                    .master_of(m)
                    .map_or(false, |master| master.identifier.as_deref() == Some(id.as_str()))
            }

            _ => false,
        }
    }
}

pub fn is_some_predicate_matched<P: HeaderPredicate>(
    predicates: &[P],
    header: MappingHeader<'_>,
    context: &PredicateContext<'_>,
) -> bool {
    predicates.iter().any(|p| p.matches(header, context))
}

// =============================================================================
// Intersection elements
// =============================================================================

fn measure_element(
    measure: &MeasureDescriptor,
    context: &PredicateContext<'_>,
) -> DrillIntersectionElement {
    let identity = context.identity_of(measure);
    DrillIntersectionElement {
        id: measure.local_identifier.clone(),
        title: measure.name.clone(),
        header: DrillHeader {
            uri: identity.uri.clone().or_else(|| measure.uri.clone()),
            identifier: identity
                .identifier
                .clone()
                .or_else(|| measure.identifier.clone()),
        },
    }
}

fn attribute_item_element(
    attribute: &ResolvedAttribute,
    item: &AttributeHeaderItem,
) -> DrillIntersectionElement {
    DrillIntersectionElement {
        id: item
            .element_id()
            .map(str::to_string)
            .unwrap_or_else(|| item.uri.clone()),
        title: item.name.clone(),
        header: DrillHeader {
            uri: Some(attribute.header.uri.clone()),
            identifier: Some(attribute.header.identifier.clone()),
        },
    }
}

// =============================================================================
// Annotation
// =============================================================================

/// Headers behind one point.
struct PointHooks<'a> {
    measures: Vec<&'a MeasureDescriptor>,
    view_by: Option<(&'a ResolvedAttribute, &'a AttributeHeaderItem)>,
    view_by_parent: Option<(&'a ResolvedAttribute, &'a AttributeHeaderItem)>,
    stack_by: Option<(&'a ResolvedAttribute, &'a AttributeHeaderItem)>,
}

impl<'a> PointHooks<'a> {
    fn headers(&self) -> Vec<MappingHeader<'a>> {
        let mut hooks: Vec<MappingHeader<'a>> =
            self.measures.iter().map(|m| MappingHeader::Measure(*m)).collect();
        for (attribute, item) in [self.view_by, self.view_by_parent, self.stack_by]
            .into_iter()
            .flatten()
        {
            hooks.push(MappingHeader::Attribute(&attribute.header));
            hooks.push(MappingHeader::AttributeItem(item));
        }
        hooks
    }

    /// Measures, child value, parent value, stack value.
    fn intersection(&self, context: &PredicateContext<'_>) -> Vec<DrillIntersectionElement> {
        let mut elements: Vec<DrillIntersectionElement> = self
            .measures
            .iter()
            .map(|m| measure_element(m, context))
            .collect();
        elements.extend(
            [self.view_by, self.view_by_parent, self.stack_by]
                .into_iter()
                .flatten()
                .map(|(attribute, item)| attribute_item_element(attribute, item)),
        );
        elements
    }
}

fn item_at(
    attribute: Option<&ResolvedAttribute>,
    index: Option<usize>,
) -> Option<(&ResolvedAttribute, &AttributeHeaderItem)> {
    let attribute = attribute?;
    let item = attribute.items.get(index?)?;
    Some((attribute, item))
}

/// Mark drillable points and attach their intersections.
pub fn annotate_drillability<P: HeaderPredicate>(
    series: Vec<SeriesItem>,
    headers: &ResolvedHeaders,
    chart_type: ChartType,
    drillable_items: &[P],
) -> Vec<SeriesItem> {
    let measures = headers.measure_group.items.as_slice();
    let context = PredicateContext::new(measures);

    let is_multi_measure_with_only_measures =
        chart_type.is_multi_measure_alternating() && headers.view_by.is_none();
    let is_stacked_treemap = chart_type == ChartType::Treemap && headers.stack_by.is_some();
    let indexes_by_coordinates = chart_type == ChartType::Heatmap || is_stacked_treemap;

    series
        .into_iter()
        .enumerate()
        .map(|(series_index, mut item)| {
            let mut is_series_drillable = false;

            for (point_index, point) in item.data.iter_mut().enumerate() {
                // 1. Treemap roots stand for a group, never for one value
                if is_stacked_treemap && point.is_treemap_root() {
                    point.drilldown = false;
                    continue;
                }

                // 2. Backing measures
                let point_measures: Vec<&MeasureDescriptor> = match chart_type {
                    ChartType::Scatter => measures.iter().take(2).collect(),
                    ChartType::Bubble => measures.iter().take(3).collect(),
                    _ => {
                        let index = measure_index(
                            point,
                            point_index,
                            series_index,
                            measures.len(),
                            is_stacked_treemap,
                            headers,
                            is_multi_measure_with_only_measures,
                        );
                        index.and_then(|i| measures.get(i)).into_iter().collect()
                    }
                };

                // 3. Attribute positions
                let view_by_index = if indexes_by_coordinates {
                    point.x_index()
                } else {
                    Some(point_index)
                };
                let stack_by_index = if chart_type == ChartType::Scatter {
                    view_by_index
                } else if indexes_by_coordinates {
                    point.y_index()
                } else {
                    Some(series_index)
                };

                let hooks = PointHooks {
                    measures: point_measures,
                    view_by: item_at(headers.view_by.as_ref(), view_by_index),
                    view_by_parent: item_at(headers.view_by_parent.as_ref(), view_by_index),
                    stack_by: item_at(headers.stack_by.as_ref(), stack_by_index),
                };

                // 4. Match
                let drilldown = hooks
                    .headers()
                    .into_iter()
                    .any(|hook| is_some_predicate_matched(drillable_items, hook, &context));

                point.drilldown = drilldown;
                if drilldown {
                    point.drill_intersection = Some(hooks.intersection(&context));
                    is_series_drillable = true;
                }
            }

            if chart_type == ChartType::Scatter {
                item.data.retain(|p| p.x.is_some() && p.y.is_some());
            }

            item.is_drillable = is_series_drillable;
            item
        })
        .inspect(|item| {
            debug!(series = %item.name, drillable = item.is_drillable, "annotated series");
        })
        .collect()
}

fn measure_index(
    point: &SeriesDataItem,
    point_index: usize,
    series_index: usize,
    measure_count: usize,
    is_stacked_treemap: bool,
    headers: &ResolvedHeaders,
    is_multi_measure_with_only_measures: bool,
) -> Option<usize> {
    if is_stacked_treemap {
        return if headers.view_by.is_some() {
            Some(0)
        } else {
            point.parent.as_deref().and_then(|p| p.parse::<usize>().ok())
        };
    }
    if headers.stack_by.is_none() && !is_multi_measure_with_only_measures {
        return Some(series_index);
    }
    if measure_count == 0 {
        return None;
    }
    Some(point_index % measure_count)
}
