use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ChartConfig;
use crate::drill::HeaderMatcher;

// =============================================================================
// Execution result
// =============================================================================

/// A raw execution result: dimension headers, the value matrix, and the
/// header items laid out per dimension and per header.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub dimensions: Vec<ResultDimension>,
    /// Row-major values. Rows follow dimension 0, columns follow dimension 1.
    #[serde(default)]
    pub data: Vec<Vec<DataValue>>,
    /// `header_items[dimension][header][item]`
    #[serde(default)]
    pub header_items: Vec<Vec<Vec<ResultHeaderItem>>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultDimension {
    #[serde(default)]
    pub headers: Vec<DimensionHeader>,
}

/// One header slot of a dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DimensionHeader {
    Attribute(AttributeDescriptor),
    MeasureGroup(MeasureGroupDescriptor),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDescriptor {
    pub name: String,
    pub local_identifier: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub form_of: AttributeFormOf,
}

/// The attribute a display form belongs to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeFormOf {
    pub name: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub identifier: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasureGroupDescriptor {
    pub items: Vec<MeasureDescriptor>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureDescriptor {
    pub name: String,
    #[serde(default)]
    pub format: String,
    pub local_identifier: String,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub identifier: Option<String>,
    /// Local identifier of the master measure for period-over-period and
    /// previous-period measures.
    #[serde(default)]
    pub derived_from: Option<String>,
}

impl MeasureDescriptor {
    pub fn is_derived(&self) -> bool {
        self.derived_from.is_some()
    }
}

/// A single item of a header: an attribute value or a measure slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ResultHeaderItem {
    Attribute(AttributeHeaderItem),
    Measure { order: usize },
}

/// Two items are the same element only when both name and uri match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeHeaderItem {
    pub name: String,
    #[serde(default)]
    pub uri: String,
}

impl AttributeHeaderItem {
    /// Element id taken from the `?id=` query part of the element uri.
    pub fn element_id(&self) -> Option<&str> {
        let (_, query) = self.uri.split_once("?id=")?;
        let id = query.split('&').next().unwrap_or(query);
        if id.is_empty() {
            None
        } else {
            Some(id)
        }
    }
}

/// A raw cell value. Backends ship numbers either as JSON numbers or as
/// numeric strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataValue {
    Number(f64),
    Text(String),
    Null,
}

impl DataValue {
    pub fn is_null(&self) -> bool {
        matches!(self, DataValue::Null)
    }

    /// Numeric reading of the cell. Non-numeric text becomes `None`.
    pub fn parse(&self) -> Option<f64> {
        match self {
            DataValue::Number(n) if n.is_finite() => Some(*n),
            DataValue::Number(_) => None,
            DataValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            DataValue::Null => None,
        }
    }
}

impl From<f64> for DataValue {
    fn from(v: f64) -> Self {
        DataValue::Number(v)
    }
}

impl From<Option<f64>> for DataValue {
    fn from(v: Option<f64>) -> Self {
        v.map(DataValue::Number).unwrap_or(DataValue::Null)
    }
}

impl ExecutionResult {
    /// Row `row` of the value matrix, empty when out of range.
    pub fn row(&self, row: usize) -> &[DataValue] {
        self.data.get(row).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Attribute items of `header` within `dimension`, skipping measure slots.
    pub fn attribute_items(&self, dimension: usize, header: usize) -> Vec<AttributeHeaderItem> {
        self.header_items
            .get(dimension)
            .and_then(|headers| headers.get(header))
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| match item {
                        ResultHeaderItem::Attribute(a) => Some(a.clone()),
                        ResultHeaderItem::Measure { .. } => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

// =============================================================================
// Request envelope
// =============================================================================

/// Everything one chart build consumes.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartInput {
    pub result: ExecutionResult,
    pub config: ChartConfig,
    #[serde(default)]
    pub drillable_items: Vec<HeaderMatcher>,
}

impl ChartInput {
    /// Create a ChartInput from a JSON object
    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| anyhow!("Input must be a JSON object"))?;

        if !obj.contains_key("result") {
            return Err(anyhow!("Input is missing the 'result' field"));
        }
        if !obj.contains_key("config") {
            return Err(anyhow!("Input is missing the 'config' field"));
        }

        serde_json::from_value(value.clone()).context("Malformed chart input")
    }

    pub fn parse(input: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(input).context("Input is not valid JSON")?;
        Self::from_json(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_data_values() {
        assert_eq!(DataValue::Number(1.5).parse(), Some(1.5));
        assert_eq!(DataValue::Text("42.25".into()).parse(), Some(42.25));
        assert_eq!(DataValue::Text("n/a".into()).parse(), None);
        assert_eq!(DataValue::Null.parse(), None);
    }

    #[test]
    fn test_deserialize_mixed_values() {
        let values: Vec<DataValue> = serde_json::from_value(json!([1, "2.5", null])).unwrap();
        assert_eq!(
            values,
            vec![
                DataValue::Number(1.0),
                DataValue::Text("2.5".into()),
                DataValue::Null
            ]
        );
    }

    #[test]
    fn test_element_id_from_uri() {
        let item = AttributeHeaderItem {
            name: "East".into(),
            uri: "/gdc/md/project/obj/1024/elements?id=7".into(),
        };
        assert_eq!(item.element_id(), Some("7"));

        let plain = AttributeHeaderItem {
            name: "West".into(),
            uri: "/gdc/md/project/obj/1024".into(),
        };
        assert_eq!(plain.element_id(), None);
    }

    #[test]
    fn test_from_json_requires_result() {
        let err = ChartInput::from_json(&json!({ "config": { "type": "bar" } }));
        assert!(err.is_err());
    }

    #[test]
    fn test_from_json_minimal() {
        let input = ChartInput::from_json(&json!({
            "result": {
                "dimensions": [
                    { "headers": [] },
                    { "headers": [{ "type": "measureGroup", "items": [
                        { "name": "Amount", "format": "#,##0", "localIdentifier": "m1" }
                    ]}]}
                ],
                "data": [[10]],
                "headerItems": [[], [[{ "type": "measure", "order": 0 }]]]
            },
            "config": { "type": "column" }
        }))
        .unwrap();

        assert_eq!(input.result.data.len(), 1);
        assert!(input.drillable_items.is_empty());
    }
}
