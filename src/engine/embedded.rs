//! Push-down to an embeddable analytics engine.

use super::backend::SqlBackend;
use super::pushdown::{aggregate_query, KeySource};
use super::Engine;
use crate::data::Dataset;
use crate::error::{ReportError, ReportResult};
use crate::model::{PivotResult, ReportSpec};
use crate::pivot::pivot;
use crate::planner::{Plan, PlanTarget, Planner};
use crate::sql::{Dialect, TableRef};

/// Name the dataset is registered under for the backend.
pub const DATASET_TABLE: &str = "dataset";

/// Sends the aggregate statement, in the DuckDB dialect, to an embedded
/// backend along with the dataset (including materialized time buckets).
#[derive(Debug)]
pub struct EmbeddedEngine {
    location: Option<String>,
    backend: Option<Box<dyn SqlBackend>>,
}

impl EmbeddedEngine {
    /// `location` is the backend's storage path; `None` means in-memory.
    pub fn new(location: Option<String>) -> Self {
        Self {
            location,
            backend: None,
        }
    }

    pub fn with_backend(mut self, backend: Box<dyn SqlBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn dialect(&self) -> Dialect {
        Dialect::DuckDb
    }

    /// The statement `execute` would send for `spec`.
    pub fn render_sql(&self, spec: &ReportSpec) -> ReportResult<String> {
        let plan = Planner::new(PlanTarget::Warehouse).plan(&mut Dataset::default(), spec)?;
        self.statement(spec, &plan)
    }

    fn statement(&self, spec: &ReportSpec, plan: &Plan) -> ReportResult<String> {
        let query = aggregate_query(
            spec,
            plan,
            self.dialect(),
            TableRef::new(DATASET_TABLE),
            KeySource::Column,
        )?;
        Ok(query.to_sql(self.dialect()))
    }
}

impl Engine for EmbeddedEngine {
    fn name(&self) -> &str {
        "embedded"
    }

    fn target(&self) -> PlanTarget {
        PlanTarget::Embedded
    }

    fn execute(&self, dataset: &Dataset, spec: &ReportSpec, plan: &Plan) -> ReportResult<PivotResult> {
        let sql = self.statement(spec, plan)?;
        let backend = self.backend.as_deref().ok_or_else(|| {
            ReportError::backend_unavailable(self.name(), "no SQL backend configured")
        })?;
        tracing::debug!(
            backend = backend.name(),
            location = self.location().unwrap_or(":memory:"),
            %sql,
            "executing push-down query"
        );
        let frame = dataset.frame()?;
        let aggregated = backend.execute(&sql, &[(DATASET_TABLE, &*frame)])?;
        pivot(&aggregated, plan, spec)
    }
}
