use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ChartError;

/// Supported chart families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Column,
    Bar,
    Line,
    Area,
    Combo,
    Pie,
    Donut,
    Funnel,
    Treemap,
    Heatmap,
    Scatter,
    Bubble,
}

impl ChartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Column => "column",
            ChartType::Bar => "bar",
            ChartType::Line => "line",
            ChartType::Area => "area",
            ChartType::Combo => "combo",
            ChartType::Pie => "pie",
            ChartType::Donut => "donut",
            ChartType::Funnel => "funnel",
            ChartType::Treemap => "treemap",
            ChartType::Heatmap => "heatmap",
            ChartType::Scatter => "scatter",
            ChartType::Bubble => "bubble",
        }
    }

    /// Charts whose measures alternate as points of a single series.
    pub fn is_multi_measure_alternating(&self) -> bool {
        matches!(
            self,
            ChartType::Pie | ChartType::Donut | ChartType::Funnel | ChartType::Treemap
        )
    }

    /// Charts that cannot represent negative values.
    pub fn is_negative_value_unsupported(&self) -> bool {
        self.is_multi_measure_alternating()
    }

    /// Charts whose single series is re-ordered by descending value.
    pub fn is_sorted_by_measure(&self) -> bool {
        matches!(self, ChartType::Pie | ChartType::Donut | ChartType::Funnel)
    }

    pub fn supports_dual_axis(&self) -> bool {
        matches!(
            self,
            ChartType::Column | ChartType::Bar | ChartType::Line | ChartType::Area | ChartType::Combo
        )
    }

    /// Charts that stack series by a stack-by attribute.
    pub fn supports_attribute_stacking(&self) -> bool {
        matches!(
            self,
            ChartType::Column | ChartType::Bar | ChartType::Area | ChartType::Combo
        )
    }

    /// Charts that honor the explicit "stack measures" options.
    pub fn supports_measure_stacking(&self) -> bool {
        matches!(self, ChartType::Column | ChartType::Bar | ChartType::Combo)
    }

    /// Charts whose series may carry a stacking mode at all.
    pub fn is_stacking_capable(&self) -> bool {
        self.supports_attribute_stacking()
    }

    /// Charts plotted on two measure axes.
    pub fn is_xy(&self) -> bool {
        matches!(self, ChartType::Scatter | ChartType::Bubble)
    }

    /// Color legend entries by attribute value rather than by measure.
    pub fn prefers_attribute_colors(&self) -> bool {
        matches!(
            self,
            ChartType::Pie | ChartType::Donut | ChartType::Funnel | ChartType::Scatter | ChartType::Bubble
        )
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartType {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "column" => Ok(ChartType::Column),
            "bar" => Ok(ChartType::Bar),
            "line" => Ok(ChartType::Line),
            "area" => Ok(ChartType::Area),
            "combo" | "combo2" => Ok(ChartType::Combo),
            "pie" => Ok(ChartType::Pie),
            "donut" => Ok(ChartType::Donut),
            "funnel" => Ok(ChartType::Funnel),
            "treemap" => Ok(ChartType::Treemap),
            "heatmap" => Ok(ChartType::Heatmap),
            "scatter" => Ok(ChartType::Scatter),
            "bubble" => Ok(ChartType::Bubble),
            other => Err(ChartError::UnsupportedChartType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chart_types() {
        assert_eq!("Column".parse::<ChartType>().unwrap(), ChartType::Column);
        assert_eq!("combo2".parse::<ChartType>().unwrap(), ChartType::Combo);
        assert_eq!(
            "radar".parse::<ChartType>(),
            Err(ChartError::UnsupportedChartType("radar".into()))
        );
    }

    #[test]
    fn test_capability_tables() {
        assert!(ChartType::Treemap.is_multi_measure_alternating());
        assert!(!ChartType::Treemap.is_sorted_by_measure());
        assert!(ChartType::Area.supports_attribute_stacking());
        assert!(!ChartType::Area.supports_measure_stacking());
        assert!(ChartType::Combo.supports_dual_axis());
        assert!(!ChartType::Pie.supports_dual_axis());
        assert!(!ChartType::Line.is_stacking_capable());
    }
}
