// Library exports for chartspec

pub mod chart_type;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod ir;
pub mod parser;

// Pipeline stages
pub mod resolve;
pub mod color_strategy;
pub mod transform;
pub mod categories;
pub mod scale;
pub mod stacking;
pub mod drill;
pub mod format;
pub mod tooltip;
pub mod validate;
pub mod runtime;

#[cfg(test)]
mod fixtures;

pub use chart_type::ChartType;
pub use config::ChartConfig;
pub use data::{ChartInput, ExecutionResult};
pub use drill::{HeaderMatcher, HeaderPredicate};
pub use error::{ChartError, Result};
pub use ir::ChartOptions;
pub use runtime::{build_chart_options, build_from_input};
pub use validate::{validate, ValidationResult};
