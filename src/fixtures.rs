// Hand-built execution results shared by unit tests

use crate::config::{normalize, ChartConfig, ResolvedConfig};
use crate::data::{
    AttributeDescriptor, AttributeFormOf, AttributeHeaderItem, DataValue, DimensionHeader,
    ExecutionResult, MeasureDescriptor, MeasureGroupDescriptor, ResultDimension,
    ResultHeaderItem,
};

pub fn attribute(name: &str, local_id: &str) -> DimensionHeader {
    DimensionHeader::Attribute(AttributeDescriptor {
        name: name.to_string(),
        local_identifier: local_id.to_string(),
        uri: format!("/obj/{}", local_id),
        identifier: format!("label.{}", local_id),
        form_of: AttributeFormOf {
            name: name.to_string(),
            uri: format!("/obj/{}-attr", local_id),
            identifier: format!("attr.{}", local_id),
        },
    })
}

pub fn measure(name: &str, local_id: &str, format: &str) -> MeasureDescriptor {
    MeasureDescriptor {
        name: name.to_string(),
        format: format.to_string(),
        local_identifier: local_id.to_string(),
        uri: Some(format!("/obj/{}", local_id)),
        identifier: Some(format!("metric.{}", local_id)),
        derived_from: None,
    }
}

pub fn measure_group(items: Vec<MeasureDescriptor>) -> DimensionHeader {
    DimensionHeader::MeasureGroup(MeasureGroupDescriptor { items })
}

pub fn items(names: &[&str]) -> Vec<ResultHeaderItem> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            ResultHeaderItem::Attribute(AttributeHeaderItem {
                name: name.to_string(),
                uri: format!("/elements?id={}", i + 1),
            })
        })
        .collect()
}

/// Items whose element uri is keyed by name, so repeated names share identity.
pub fn named_items(names: &[&str]) -> Vec<ResultHeaderItem> {
    names
        .iter()
        .map(|name| {
            ResultHeaderItem::Attribute(AttributeHeaderItem {
                name: name.to_string(),
                uri: format!("/elements?id={}", name),
            })
        })
        .collect()
}

pub fn measure_items(count: usize) -> Vec<ResultHeaderItem> {
    (0..count).map(|order| ResultHeaderItem::Measure { order }).collect()
}

pub fn values(rows: &[&[Option<f64>]]) -> Vec<Vec<DataValue>> {
    rows.iter()
        .map(|row| row.iter().map(|v| DataValue::from(*v)).collect())
        .collect()
}

pub fn resolved_config(chart_type: &str) -> ResolvedConfig {
    normalize(&ChartConfig {
        chart_type: Some(chart_type.to_string()),
        ..Default::default()
    })
    .unwrap()
}

/// Two measures on rows, one view-by attribute on columns.
pub fn measures_by_region() -> ExecutionResult {
    ExecutionResult {
        dimensions: vec![
            ResultDimension {
                headers: vec![measure_group(vec![
                    measure("Revenue", "m1", "#,##0.00"),
                    measure("Cost", "m2", "#,##0"),
                ])],
            },
            ResultDimension {
                headers: vec![attribute("Region", "a1")],
            },
        ],
        data: values(&[&[Some(1.0), Some(2.0)], &[Some(3.0), None]]),
        header_items: vec![
            vec![measure_items(2)],
            vec![items(&["East", "West"])],
        ],
    }
}


/// One measure on rows, one view-by attribute on columns.
pub fn single_measure_by_region(row: &[Option<f64>]) -> ExecutionResult {
    let names: Vec<String> = (0..row.len()).map(|i| format!("R{}", i + 1)).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    ExecutionResult {
        dimensions: vec![
            ResultDimension {
                headers: vec![measure_group(vec![measure("Revenue", "m1", "#,##0")])],
            },
            ResultDimension {
                headers: vec![attribute("Region", "a1")],
            },
        ],
        data: values(&[row]),
        header_items: vec![vec![measure_items(1)], vec![items(&refs)]],
    }
}

/// Measures only: no attribute on either dimension.
pub fn measures_only(row: &[Option<f64>]) -> ExecutionResult {
    let measures = (0..row.len())
        .map(|i| measure(&format!("M{}", i + 1), &format!("m{}", i + 1), "#,##0"))
        .collect();
    ExecutionResult {
        dimensions: vec![
            ResultDimension { headers: vec![] },
            ResultDimension {
                headers: vec![measure_group(measures)],
            },
        ],
        data: values(&[row]),
        header_items: vec![vec![], vec![measure_items(row.len())]],
    }
}

/// Stack-by "Product" on rows, view-by "Region" plus one measure on columns.
pub fn stacked_by_product(rows: &[&[Option<f64>]]) -> ExecutionResult {
    let products: Vec<String> = (0..rows.len()).map(|i| format!("P{}", i + 1)).collect();
    let columns = rows.first().map_or(0, |r| r.len());
    let regions: Vec<String> = (0..columns).map(|i| format!("R{}", i + 1)).collect();
    let product_refs: Vec<&str> = products.iter().map(String::as_str).collect();
    let region_refs: Vec<&str> = regions.iter().map(String::as_str).collect();
    ExecutionResult {
        dimensions: vec![
            ResultDimension {
                headers: vec![attribute("Product", "a2")],
            },
            ResultDimension {
                headers: vec![
                    attribute("Region", "a1"),
                    measure_group(vec![measure("Revenue", "m1", "#,##0")]),
                ],
            },
        ],
        data: values(rows),
        header_items: vec![
            vec![items(&product_refs)],
            vec![
                items(&region_refs),
                vec![ResultHeaderItem::Measure { order: 0 }; columns],
            ],
        ],
    }
}

/// Customers on rows, two or three measures on columns.
pub fn customers_by_measures(rows: &[&[Option<f64>]]) -> ExecutionResult {
    let customers: Vec<String> = (0..rows.len()).map(|i| format!("C{}", i + 1)).collect();
    let refs: Vec<&str> = customers.iter().map(String::as_str).collect();
    let columns = rows.first().map_or(0, |r| r.len());
    let measures = ["Spend", "Visits", "Orders"]
        .iter()
        .take(columns)
        .enumerate()
        .map(|(i, name)| measure(name, &format!("m{}", i + 1), "#,##0.00"))
        .collect();
    ExecutionResult {
        dimensions: vec![
            ResultDimension {
                headers: vec![attribute("Customer", "a3")],
            },
            ResultDimension {
                headers: vec![measure_group(measures)],
            },
        ],
        data: values(rows),
        header_items: vec![vec![items(&refs)], vec![measure_items(columns)]],
    }
}

/// Stack-by "Product" on rows, "Country" > "City" plus one measure on columns.
pub fn products_by_country_and_city() -> ExecutionResult {
    ExecutionResult {
        dimensions: vec![
            ResultDimension {
                headers: vec![attribute("Product", "a2")],
            },
            ResultDimension {
                headers: vec![
                    attribute("Country", "a4"),
                    attribute("City", "a5"),
                    measure_group(vec![measure("Revenue", "m1", "#,##0")]),
                ],
            },
        ],
        data: values(&[
            &[Some(1.0), Some(2.0), Some(3.0)],
            &[Some(4.0), Some(5.0), Some(6.0)],
        ]),
        header_items: vec![
            vec![named_items(&["P1", "P2"])],
            vec![
                named_items(&["CZ", "CZ", "SK"]),
                named_items(&["Prague", "Brno", "Bratislava"]),
                vec![ResultHeaderItem::Measure { order: 0 }; 3],
            ],
        ],
    }
}
