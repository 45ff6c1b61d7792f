//! The aggregate statement shared by the push-down engines.

use std::collections::HashMap;

use crate::error::ReportResult;
use crate::expr::count_star;
use crate::model::ReportSpec;
use crate::planner::{Plan, DEFAULT_MEASURE};
use crate::sql::{substitute_aliases, AggregateQuery, Dialect, Emitter, SqlDialect, TableRef};

/// How grouping keys are selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeySource {
    /// Read the planned key column, including materialized time buckets.
    Column,
    /// Read the source column and bucket it in SQL.
    Truncate,
}

/// Build `SELECT keys, aggregates FROM table [WHERE] [GROUP BY] [HAVING]`.
///
/// Keys and aggregates are aliased by their plan names so the backend's
/// result frame feeds straight into the pivot routine.
pub(crate) fn aggregate_query(
    spec: &ReportSpec,
    plan: &Plan,
    dialect: Dialect,
    table: TableRef,
    keys: KeySource,
) -> ReportResult<AggregateQuery> {
    let emitter = Emitter::new(dialect);
    let mut query = AggregateQuery::new(table);

    for (dim, alias) in spec.dimensions().zip(plan.group_keys()) {
        let sql = match (keys, dim.grain()?) {
            (KeySource::Truncate, Some(grain)) => {
                dialect.date_trunc(&emitter.column(&dim.name), grain)
            }
            (KeySource::Truncate, None) => emitter.column(&dim.name),
            (KeySource::Column, _) => emitter.column(alias),
        };
        query = query.key(sql, alias);
    }

    let mut aliases: HashMap<String, String> = HashMap::new();
    if spec.metrics.is_empty() {
        let sql = emitter.agg(&count_star())?;
        aliases.insert(DEFAULT_MEASURE.to_string(), sql.clone());
        query = query.aggregate(sql, DEFAULT_MEASURE);
    }
    for measure in &spec.metrics {
        let sql = emitter.measure(measure)?;
        aliases.insert(measure.name().to_string(), sql.clone());
        query = query.aggregate(sql, measure.name());
    }

    if let Some(filter) = &spec.filter {
        query = query.filter(emitter.predicate(filter)?);
    }
    if let Some(having) = &spec.having {
        let rewritten = substitute_aliases(having, &aliases)?;
        query = query.having(emitter.predicate(&rewritten)?);
    }
    Ok(query)
}
