//! Push-down to a remote SQL warehouse.

use serde::{Deserialize, Serialize};

use super::backend::SqlBackend;
use super::pushdown::{aggregate_query, KeySource};
use super::Engine;
use crate::data::Dataset;
use crate::error::{ReportError, ReportResult};
use crate::model::{PivotResult, ReportSpec};
use crate::pivot::pivot;
use crate::planner::{Plan, PlanTarget, Planner};
use crate::sql::{Dialect, TableRef};

/// Connection details for the warehouse table a report reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseConfig {
    pub project: String,
    pub dataset: String,
    pub table: String,
    #[serde(default)]
    pub location: Option<String>,
    /// Path to a credentials file; `None` uses the backend's default chain.
    #[serde(default)]
    pub credentials: Option<String>,
}

impl WarehouseConfig {
    pub fn new(
        project: impl Into<String>,
        dataset: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            dataset: dataset.into(),
            table: table.into(),
            ..Self::default()
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_credentials(mut self, path: impl Into<String>) -> Self {
        self.credentials = Some(path.into());
        self
    }

    /// `project.dataset.table`.
    pub fn qualified_table(&self) -> String {
        format!("{}.{}.{}", self.project, self.dataset, self.table)
    }
}

/// Generates BigQuery SQL that groups (and time-buckets) directly against
/// the remote table. Nothing is materialized locally.
#[derive(Debug)]
pub struct WarehouseEngine {
    config: WarehouseConfig,
    backend: Option<Box<dyn SqlBackend>>,
}

impl WarehouseEngine {
    pub fn new(config: WarehouseConfig) -> Self {
        Self {
            config,
            backend: None,
        }
    }

    pub fn with_backend(mut self, backend: Box<dyn SqlBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn config(&self) -> &WarehouseConfig {
        &self.config
    }

    pub fn dialect(&self) -> Dialect {
        Dialect::BigQuery
    }

    /// The statement `execute` would send for `spec`.
    pub fn render_sql(&self, spec: &ReportSpec) -> ReportResult<String> {
        let plan = Planner::new(PlanTarget::Warehouse).plan(&mut Dataset::default(), spec)?;
        self.statement(spec, &plan)
    }

    fn table(&self) -> ReportResult<TableRef> {
        let missing: Vec<&str> = [
            ("project", &self.config.project),
            ("dataset", &self.config.dataset),
            ("table", &self.config.table),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect();
        if !missing.is_empty() {
            return Err(ReportError::backend_unavailable(
                self.name(),
                format!("missing {}", missing.join(", ")),
            ));
        }
        Ok(TableRef::new(self.config.qualified_table()))
    }

    fn statement(&self, spec: &ReportSpec, plan: &Plan) -> ReportResult<String> {
        let query = aggregate_query(spec, plan, self.dialect(), self.table()?, KeySource::Truncate)?;
        Ok(query.to_sql(self.dialect()))
    }
}

impl Engine for WarehouseEngine {
    fn name(&self) -> &str {
        "warehouse"
    }

    fn target(&self) -> PlanTarget {
        PlanTarget::Warehouse
    }

    fn execute(&self, _dataset: &Dataset, spec: &ReportSpec, plan: &Plan) -> ReportResult<PivotResult> {
        let sql = self.statement(spec, plan)?;
        let backend = self.backend.as_deref().ok_or_else(|| {
            ReportError::backend_unavailable(self.name(), "no SQL backend configured")
        })?;
        tracing::debug!(
            backend = backend.name(),
            table = %self.config.qualified_table(),
            location = self.config.location.as_deref().unwrap_or("default"),
            %sql,
            "executing push-down query"
        );
        let aggregated = backend.execute(&sql, &[])?;
        pivot(&aggregated, plan, spec)
    }
}
