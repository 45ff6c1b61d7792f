//! # tabula
//!
//! An embeddable reporting query engine: a typed predicate algebra, a SQL
//! bridge that lifts filter text into it, and pluggable engines that run the
//! same report in-process or push aggregation down to a SQL backend.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     ReportSpec                           │
//! │  (rows, columns, slicers, measures, where, having, ...)  │
//! └─────────────────────────────────────────────────────────┘
//!            │                              ▲
//!            │ [planner]                    │ [sql::parser]
//!            ▼                              │  "WHERE a > 1"
//! ┌──────────────────────┐       ┌──────────────────────────┐
//! │  Plan (group keys,   │       │  Expression algebra      │
//! │  measure names)      │       │  Scalar / Predicate / Agg│
//! └──────────────────────┘       └──────────────────────────┘
//!            │                              │ [sql::emit]
//!            ▼ [engine]                     ▼
//! ┌──────────────┬─────────────────┬────────────────────────┐
//! │ LocalEngine  │ EmbeddedEngine  │ WarehouseEngine        │
//! │ (in-process) │ (DuckDB SQL)    │ (BigQuery SQL)         │
//! └──────────────┴─────────────────┴────────────────────────┘
//!            │  aggregated rows
//!            ▼ [pivot]
//! ┌─────────────────────────────────────────────────────────┐
//! │   PivotResult: pivot, slice, totals, sort, top-N, limit  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use tabula::prelude::*;
//!
//! let mut dataset = Dataset::new(Frame::from_records(&records)?);
//! let spec = ReportSpec::new()
//!     .row("country")
//!     .column("device")
//!     .metric(Measure::agg("ctr", ratio_of_sums("clicks", "impr", 0.0)))
//!     .filter("impr > 0")
//!     .totals(true);
//! let result = dataset.report(&spec)?;
//! ```

pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod expr;
pub mod model;
pub mod pivot;
pub mod planner;
pub mod sql;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::data::{Column, Dataset, Frame, Value};
    pub use crate::engine::{
        report, EmbeddedEngine, Engine, LocalEngine, SqlBackend, WarehouseConfig, WarehouseEngine,
    };
    pub use crate::error::{ReportError, ReportResult};
    pub use crate::expr::{
        // Constructors
        avg,
        case_when,
        coalesce,
        col,
        concat,
        count,
        count_star,
        lit,
        max,
        min,
        nunique,
        ratio_of_sums,
        safe_div,
        sum,
        // Types
        AggExpr,
        ExprExt,
        Predicate,
        ScalarExpr,
    };
    pub use crate::model::{
        Dimension, Measure, PivotResult, PivotTable, ReportSpec, Role, RowAgg, RowKey, TimeGrain,
    };
    pub use crate::sql::{sql, sql_bigquery, sql_duckdb, Dialect, Emitter};
}

// Also export at crate root for convenience
pub use error::{BackendError, ReportError, ReportResult, SyntaxError, ValidationError};
pub use model::{Dimension, Measure, PivotResult, ReportSpec};
pub use sql::Dialect;
