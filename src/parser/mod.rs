// Number format parser

pub mod ast;
pub mod section;

// Public API re-exports
pub use ast::{Condition, ConditionOp, FormatSection, FormatToken, NumberFormat};
pub use section::parse_number_format;
