//! Report planning: resolves dimensions to concrete grouping keys.
//!
//! The planner is the only step that writes to a [`Dataset`], and only by
//! attaching derived time-bucket columns. Push-down targets that bucket in
//! SQL get the synthetic key names without any local materialization.

use std::fmt;

use crate::data::Dataset;
use crate::error::ReportResult;
use crate::model::{Dimension, ReportSpec};

/// Name of the measure synthesized when a spec has none.
pub const DEFAULT_MEASURE: &str = "rows";

/// Where the aggregation of a plan will run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanTarget {
    /// In-process evaluation over the dataset.
    Local,
    /// An embeddable SQL engine fed the local dataset.
    Embedded,
    /// A remote warehouse that reads its own table.
    Warehouse,
}

impl PlanTarget {
    /// Whether time buckets are computed locally and attached to the dataset.
    pub fn materializes(&self) -> bool {
        !matches!(self, PlanTarget::Warehouse)
    }
}

impl fmt::Display for PlanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlanTarget::Local => "local",
            PlanTarget::Embedded => "embedded",
            PlanTarget::Warehouse => "warehouse",
        })
    }
}

/// The resolved shape of one report invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub target: PlanTarget,
    pub row_keys: Vec<String>,
    pub column_keys: Vec<String>,
    pub slicer_keys: Vec<String>,
    /// Output measure names, in spec order.
    pub metric_names: Vec<String>,
}

impl Plan {
    /// Every grouping key: rows, then columns, then slicers.
    pub fn group_keys(&self) -> Vec<&str> {
        self.row_keys
            .iter()
            .chain(&self.column_keys)
            .chain(&self.slicer_keys)
            .map(String::as_str)
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Planner {
    target: PlanTarget,
}

impl Planner {
    pub fn new(target: PlanTarget) -> Self {
        Self { target }
    }

    pub fn target(&self) -> PlanTarget {
        self.target
    }

    /// Validate `spec` and resolve each dimension.
    ///
    /// For materializing targets every referenced dimension column must exist
    /// in the dataset, and time-bucketed columns are attached (idempotently).
    pub fn plan(&self, dataset: &mut Dataset, spec: &ReportSpec) -> ReportResult<Plan> {
        spec.validate()?;

        let row_keys = self.resolve_all(dataset, &spec.rows)?;
        let column_keys = self.resolve_all(dataset, &spec.columns)?;
        let slicer_keys = self.resolve_all(dataset, &spec.slicers)?;

        let mut metric_names: Vec<String> =
            spec.metrics.iter().map(|m| m.name().to_string()).collect();
        if metric_names.is_empty() {
            metric_names.push(DEFAULT_MEASURE.to_string());
        }

        let plan = Plan {
            target: self.target,
            row_keys,
            column_keys,
            slicer_keys,
            metric_names,
        };
        tracing::debug!(
            target = %plan.target,
            group_keys = ?plan.group_keys(),
            metrics = ?plan.metric_names,
            "planned report"
        );
        Ok(plan)
    }

    fn resolve_all(&self, dataset: &mut Dataset, dims: &[Dimension]) -> ReportResult<Vec<String>> {
        dims.iter().map(|dim| self.resolve(dataset, dim)).collect()
    }

    fn resolve(&self, dataset: &mut Dataset, dim: &Dimension) -> ReportResult<String> {
        if !self.target.materializes() {
            return dim.key_name();
        }
        let (key, derived) = dim.resolve(dataset.base())?;
        if let Some(column) = derived {
            dataset.attach(column)?;
        }
        Ok(key)
    }
}
