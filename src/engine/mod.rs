//! Report execution.
//!
//! An [`Engine`] turns a planned [`ReportSpec`] into a [`PivotResult`].
//! Three implementations share the contract:
//!
//! - [`LocalEngine`] - in-process filtering, grouping and aggregation
//! - [`EmbeddedEngine`] - DuckDB-dialect push-down with the dataset attached
//! - [`WarehouseEngine`] - BigQuery-dialect push-down against a remote table
//!
//! All three hand their aggregated rows to the same pivot routine, so a
//! report yields the same result whichever engine runs it.

mod backend;
mod embedded;
mod local;
mod pushdown;
mod warehouse;

pub use backend::SqlBackend;
pub use embedded::{EmbeddedEngine, DATASET_TABLE};
pub use local::LocalEngine;
pub use warehouse::{WarehouseConfig, WarehouseEngine};

use crate::data::Dataset;
use crate::error::ReportResult;
use crate::model::{PivotResult, ReportSpec};
use crate::planner::{Plan, PlanTarget, Planner};

/// Executes a planned report.
pub trait Engine {
    fn name(&self) -> &str;

    /// The plan target this engine expects.
    fn target(&self) -> PlanTarget;

    fn execute(&self, dataset: &Dataset, spec: &ReportSpec, plan: &Plan) -> ReportResult<PivotResult>;
}

/// Plan `spec` for `engine`'s target, then execute it.
///
/// Planning may attach derived time-bucket columns to `dataset`; see
/// [`Planner::plan`].
pub fn report(dataset: &mut Dataset, spec: &ReportSpec, engine: &dyn Engine) -> ReportResult<PivotResult> {
    let plan = Planner::new(engine.target()).plan(dataset, spec)?;
    engine.execute(dataset, spec, &plan)
}

impl Dataset {
    /// Run `spec` in-process.
    pub fn report(&mut self, spec: &ReportSpec) -> ReportResult<PivotResult> {
        report(self, spec, &LocalEngine)
    }
}
