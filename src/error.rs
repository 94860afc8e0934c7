use thiserror::Error;

/// Fatal configuration invariant violations.
///
/// Everything else (oversized data, negative values in pie-like charts,
/// missing optional headers) is reported through neutral fallbacks or the
/// validation channel, never through this type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChartError {
    #[error("chart type '{0}' is not supported")]
    UnsupportedChartType(String),

    #[error("chart config is missing a chart type")]
    MissingChartType,

    #[error("measure group must be the last header of dimension {dimension} (found at {position} of {len})")]
    MeasureGroupNotLast {
        dimension: usize,
        position: usize,
        len: usize,
    },

    #[error("execution result contains no measure group")]
    MissingMeasureGroup,
}

pub type Result<T> = std::result::Result<T, ChartError>;
