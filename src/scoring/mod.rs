// Custom score sheets: columns entered by hand or derived from other columns
// through formulas such as `{rounds} * 10`.

pub use columns::{ColumnType, Modifier, ScoreColumn};
pub use errors::{FormulaError, ParseError};
pub use formula::{BinaryOp, Expr};
pub use sheet::{evaluate, ColumnValues, ScoreSheet};

mod columns;
mod errors;
mod formula;
mod sheet;
