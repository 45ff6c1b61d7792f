//! Report model types.
//!
//! A [`ReportSpec`] names its axes ([`Dimension`]) and outputs ([`Measure`]);
//! running it yields a [`PivotResult`].

pub mod dimension;
pub mod measure;
pub mod report;
pub mod result;

pub use dimension::{Dimension, Role, TimeGrain};
pub use measure::{Measure, RowAgg};
pub use report::{ReportSpec, SortBy};
pub use result::{PivotResult, PivotRow, PivotTable, RowKey, Slice};
