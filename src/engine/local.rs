//! In-process execution over the dataset provider.

use std::borrow::Cow;

use super::Engine;
use crate::data::{Column, Dataset, Frame, Value};
use crate::error::ReportResult;
use crate::expr::reduce;
use crate::model::{Measure, PivotResult, ReportSpec};
use crate::pivot::pivot;
use crate::planner::{Plan, PlanTarget, DEFAULT_MEASURE};

/// Filters, groups and aggregates in-process, then pivots.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalEngine;

impl LocalEngine {
    pub fn new() -> Self {
        Self
    }

    /// The grouped table: one row per group, one column per key and measure.
    pub fn aggregate(&self, dataset: &Dataset, spec: &ReportSpec, plan: &Plan) -> ReportResult<Frame> {
        let frame = dataset.frame()?;
        let filtered: Cow<'_, Frame> = match &spec.filter {
            Some(pred) => Cow::Owned(frame.filter(&pred.mask(&frame)?)),
            None => frame,
        };

        let keys = plan.group_keys();
        let groups = filtered.group_indices(&keys)?;
        let members: Vec<Vec<usize>> = groups.iter().map(|(_, rows)| rows.clone()).collect();

        let mut columns: Vec<Column> = keys
            .iter()
            .enumerate()
            .map(|(i, key)| Column::new(*key, groups.iter().map(|(k, _)| k[i].clone()).collect()))
            .collect();

        if spec.metrics.is_empty() {
            let counts = members.iter().map(|rows| Value::Int(rows.len() as i64)).collect();
            columns.push(Column::new(DEFAULT_MEASURE, counts));
        }
        for measure in &spec.metrics {
            let values = match measure {
                Measure::RowMeasure { expr, agg, .. } => {
                    reduce(&filtered, expr, &members, agg.reduction())?
                }
                Measure::AggMeasure { agg_expr, .. } => agg_expr.aggregate(&filtered, &members)?,
            };
            columns.push(Column::new(measure.name(), values));
        }

        let mut aggregated = Frame::with_len(groups.len());
        for column in columns {
            aggregated.insert(column)?;
        }

        Ok(match &spec.having {
            Some(pred) => aggregated.filter(&pred.mask(&aggregated)?),
            None => aggregated,
        })
    }
}

impl Engine for LocalEngine {
    fn name(&self) -> &str {
        "local"
    }

    fn target(&self) -> PlanTarget {
        PlanTarget::Local
    }

    fn execute(&self, dataset: &Dataset, spec: &ReportSpec, plan: &Plan) -> ReportResult<PivotResult> {
        let aggregated = self.aggregate(dataset, spec, plan)?;
        tracing::debug!(groups = aggregated.len(), "aggregated in-process");
        pivot(&aggregated, plan, spec)
    }
}
