//! Shared post-processing: pivot, slice, totals, sort, top-N and limit.
//!
//! Every engine hands this routine an aggregated frame with one row per
//! group and one column per grouping key and measure. Row and slice order is
//! normalized here (ascending by key, nulls last), so results do not depend
//! on the order a backend returned its rows in.

use std::cmp::Ordering;

use crate::data::{Frame, Value};
use crate::error::ReportResult;
use crate::model::{PivotResult, PivotRow, PivotTable, ReportSpec, RowKey, Slice, SortBy};
use crate::planner::Plan;

/// Joins measure and column-dimension values in flattened column names.
pub const COLUMN_SEPARATOR: &str = " / ";

/// An output column: which measure it reads and, when pivoting, which
/// column-dimension values select the source row.
struct OutputColumn {
    name: String,
    metric: usize,
    combo: Vec<Value>,
}

/// Build the result of a report from its aggregated frame.
pub fn pivot(aggregated: &Frame, plan: &Plan, spec: &ReportSpec) -> ReportResult<PivotResult> {
    let metrics = plan
        .metric_names
        .iter()
        .map(|name| aggregated.require(name))
        .collect::<ReportResult<Vec<_>>>()?;
    let column_keys: Vec<&str> = plan.column_keys.iter().map(String::as_str).collect();
    let row_keys: Vec<&str> = plan.row_keys.iter().map(String::as_str).collect();
    let slicer_keys: Vec<&str> = plan.slicer_keys.iter().map(String::as_str).collect();

    let outputs = output_columns(aggregated, &plan.metric_names, &column_keys)?;
    let combos: Vec<Vec<Value>> = key_tuples(aggregated, &column_keys)?;

    let mut slice_groups = aggregated.group_indices(&slicer_keys)?;
    slice_groups.sort_by(|a, b| compare_keys(&a.0, &b.0));

    let mut slices = Vec::with_capacity(slice_groups.len());
    for (slice_key, slice_rows) in slice_groups {
        let mut row_groups = aggregated.take(&slice_rows).group_indices(&row_keys)?;
        row_groups.sort_by(|a, b| compare_keys(&a.0, &b.0));

        let rows = row_groups
            .into_iter()
            .map(|(key, members)| {
                let members: Vec<usize> = members.iter().map(|&i| slice_rows[i]).collect();
                let cells = outputs
                    .iter()
                    .map(|out| {
                        members
                            .iter()
                            .find(|&&row| column_keys.is_empty() || combos[row] == out.combo)
                            .map(|&row| metrics[out.metric].values[row].clone())
                            .filter(|v| !v.is_null())
                    })
                    .collect();
                PivotRow {
                    key: RowKey::Data(key),
                    cells,
                }
            })
            .collect();

        let table = PivotTable {
            index_names: plan.row_keys.clone(),
            columns: outputs.iter().map(|o| o.name.clone()).collect(),
            rows,
        };
        slices.push(Slice {
            key: slice_key,
            table: finish(table, spec),
        });
    }

    Ok(PivotResult {
        slicer_names: plan.slicer_keys.clone(),
        slices,
    })
}

/// Per-row tuples of the given key columns.
fn key_tuples(frame: &Frame, keys: &[&str]) -> ReportResult<Vec<Vec<Value>>> {
    let columns = keys
        .iter()
        .map(|k| frame.require(k))
        .collect::<ReportResult<Vec<_>>>()?;
    Ok((0..frame.len())
        .map(|row| columns.iter().map(|c| c.values[row].clone()).collect())
        .collect())
}

/// Output columns in final order.
///
/// Without column dimensions these are the measures, in spec order. With
/// them, every measure crosses every column-value combination present in
/// the data, names are flattened and sorted.
fn output_columns(
    frame: &Frame,
    metrics: &[String],
    column_keys: &[&str],
) -> ReportResult<Vec<OutputColumn>> {
    if column_keys.is_empty() {
        return Ok(metrics
            .iter()
            .enumerate()
            .map(|(metric, name)| OutputColumn {
                name: name.clone(),
                metric,
                combo: vec![],
            })
            .collect());
    }

    let combos = frame.group_indices(column_keys)?;
    let mut outputs: Vec<OutputColumn> = Vec::with_capacity(metrics.len() * combos.len());
    for (metric, metric_name) in metrics.iter().enumerate() {
        for (combo, _) in &combos {
            outputs.push(OutputColumn {
                name: flatten_name(metric_name, combo),
                metric,
                combo: combo.clone(),
            });
        }
    }
    outputs.sort_by(|a, b| a.name.cmp(&b.name));
    outputs.dedup_by(|a, b| a.name == b.name);
    Ok(outputs)
}

/// `metric / value / value`, skipping null and empty components.
fn flatten_name(metric: &str, combo: &[Value]) -> String {
    std::iter::once(metric.to_string())
        .chain(combo.iter().filter(|v| !v.is_null()).map(Value::to_string))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(COLUMN_SEPARATOR)
}

fn compare_keys(a: &[Value], b: &[Value]) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| x.total_cmp(y))
        .find(|o| o.is_ne())
        .unwrap_or_else(|| a.len().cmp(&b.len()))
}

/// Totals, then sort, top-N and limit over the data rows, then re-append
/// the totals row.
fn finish(mut table: PivotTable, spec: &ReportSpec) -> PivotTable {
    let total = spec.totals.then(|| PivotRow {
        key: RowKey::Total,
        cells: column_totals(&table),
    });

    sort_rows(&mut table, &spec.sort_by);
    if let Some(n) = spec.topn {
        table.rows.truncate(n);
    }
    if let Some(n) = spec.limit {
        table.rows.truncate(n);
    }
    table.rows.extend(total);
    table
}

/// Column-wise sums over numeric columns; non-numeric columns stay empty.
fn column_totals(table: &PivotTable) -> Vec<Option<Value>> {
    (0..table.columns.len())
        .map(|i| {
            let mut int_total: Option<i64> = Some(0);
            let mut float_total = 0.0;
            for cell in table.rows.iter().filter_map(|r| r.cells[i].as_ref()) {
                let x = cell.as_f64()?;
                float_total += x;
                int_total = match (int_total, cell) {
                    (Some(acc), Value::Int(n)) => acc.checked_add(*n),
                    _ => None,
                };
            }
            Some(match int_total {
                Some(n) => Value::Int(n),
                None => Value::Float(float_total),
            })
        })
        .collect()
}

fn sort_rows(table: &mut PivotTable, sort_by: &[SortBy]) {
    let targets: Vec<(usize, bool)> = sort_by
        .iter()
        .filter_map(|s| {
            let index = table.column_index(&s.name).or_else(|| {
                table
                    .columns
                    .iter()
                    .position(|c| c.split(COLUMN_SEPARATOR).next() == Some(s.name.as_str()))
            });
            if index.is_none() {
                tracing::warn!(sort_key = %s.name, "sort key matches no column; ignored");
            }
            index.map(|i| (i, s.ascending))
        })
        .collect();
    if targets.is_empty() {
        return;
    }

    table.rows.sort_by(|a, b| {
        targets
            .iter()
            .map(|&(i, ascending)| compare_cells(a.cells[i].as_ref(), b.cells[i].as_ref(), ascending))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    });
}

/// Missing cells sort last in either direction.
fn compare_cells(a: Option<&Value>, b: Option<&Value>, ascending: bool) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) if ascending => x.total_cmp(y),
        (Some(x), Some(y)) => y.total_cmp(x),
    }
}
