//! The declarative report specification.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{Dimension, Measure, Role};
use crate::error::{ReportResult, ValidationError};
use crate::expr::pattern::normalize_flags;
use crate::expr::Predicate;

/// One sort key of the final table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortBy {
    /// A pivoted column name, or the first segment of one.
    pub name: String,
    #[serde(default)]
    pub ascending: bool,
}

/// Everything a report needs: axes, measures, filters and post-processing.
///
/// Built with the fluent methods below, or decoded from its structured
/// form. A spec is never modified by planning or execution.
///
/// ```ignore
/// let spec = ReportSpec::new()
///     .row("country")
///     .column("device")
///     .metric(Measure::agg("clicks", sum("clicks")))
///     .filter("impr > 0")
///     .sort_by("clicks", false)
///     .totals(true);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSpec {
    pub rows: Vec<Dimension>,
    pub columns: Vec<Dimension>,
    pub slicers: Vec<Dimension>,
    pub metrics: Vec<Measure>,
    /// Pre-aggregation filter.
    #[serde(rename = "where")]
    pub filter: Option<Predicate>,
    /// Post-aggregation filter; may reference measure names.
    pub having: Option<Predicate>,
    pub sort_by: Vec<SortBy>,
    pub topn: Option<usize>,
    pub limit: Option<usize>,
    pub totals: bool,
}

impl ReportSpec {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Builder
    // =========================================================================

    pub fn row(mut self, dim: impl Into<Dimension>) -> Self {
        self.rows.push(with_role(dim.into(), Role::Row));
        self
    }

    pub fn column(mut self, dim: impl Into<Dimension>) -> Self {
        self.columns.push(with_role(dim.into(), Role::Column));
        self
    }

    pub fn slicer(mut self, dim: impl Into<Dimension>) -> Self {
        self.slicers.push(with_role(dim.into(), Role::Slicer));
        self
    }

    pub fn metric(mut self, measure: Measure) -> Self {
        self.metrics.push(measure);
        self
    }

    /// Set the pre-aggregation filter. A string is taken as raw SQL.
    pub fn filter(mut self, pred: impl Into<Predicate>) -> Self {
        self.filter = Some(pred.into());
        self
    }

    /// Set the post-aggregation filter. A string is taken as raw SQL.
    pub fn having(mut self, pred: impl Into<Predicate>) -> Self {
        self.having = Some(pred.into());
        self
    }

    pub fn sort_by(mut self, name: impl Into<String>, ascending: bool) -> Self {
        self.sort_by.push(SortBy {
            name: name.into(),
            ascending,
        });
        self
    }

    pub fn topn(mut self, n: usize) -> Self {
        self.topn = Some(n);
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn totals(mut self, totals: bool) -> Self {
        self.totals = totals;
        self
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Row, column and slicer dimensions, in that order.
    pub fn dimensions(&self) -> impl Iterator<Item = &Dimension> {
        self.rows.iter().chain(&self.columns).chain(&self.slicers)
    }

    pub fn metric_names(&self) -> Vec<&str> {
        self.metrics.iter().map(Measure::name).collect()
    }

    /// Check the spec before any backend is involved: names are unique,
    /// time grains are known, raw SQL clauses parse and regex flags are
    /// supported.
    pub fn validate(&self) -> ReportResult<()> {
        let mut seen = HashSet::new();
        let names = self
            .dimensions()
            .map(|d| d.name.as_str())
            .chain(self.metrics.iter().map(Measure::name));
        for name in names {
            if !seen.insert(name) {
                return Err(ValidationError::DuplicateName(name.to_string()).into());
            }
        }
        for dim in self.dimensions() {
            dim.grain()?;
        }
        for pred in self.filter.iter().chain(&self.having) {
            check_predicate(pred)?;
        }
        Ok(())
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    /// The structured (language-neutral) form.
    pub fn to_structured(&self) -> ReportResult<serde_json::Value> {
        serde_json::to_value(self).map_err(invalid)
    }

    pub fn from_structured(value: serde_json::Value) -> ReportResult<Self> {
        serde_json::from_value(value).map_err(invalid)
    }

    /// Canonical JSON: object keys sorted, no whitespace.
    pub fn to_json(&self) -> ReportResult<String> {
        serde_json::to_string(&self.to_structured()?).map_err(invalid)
    }

    pub fn from_json(json: &str) -> ReportResult<Self> {
        serde_json::from_str(json).map_err(invalid)
    }

    /// SHA256 of the canonical JSON, as 64 lowercase hex characters.
    pub fn fingerprint(&self) -> ReportResult<String> {
        let json = self.to_json()?;
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        Ok(format!("{:x}", hasher.finalize()))
    }
}

fn with_role(mut dim: Dimension, role: Role) -> Dimension {
    dim.role = role;
    dim
}

fn invalid(e: serde_json::Error) -> crate::error::ReportError {
    ValidationError::InvalidSpec(e.to_string()).into()
}

/// Force every lazy parse and flag check in a predicate tree.
fn check_predicate(pred: &Predicate) -> ReportResult<()> {
    match pred {
        Predicate::Bool { left, right, .. } => {
            check_predicate(left)?;
            check_predicate(right)
        }
        Predicate::Not { expr } => check_predicate(expr),
        Predicate::Regex { flags, .. } => normalize_flags(flags).map(|_| ()),
        Predicate::Sql(sql) => check_predicate(sql.parsed()?),
        Predicate::Cmp { .. }
        | Predicate::In { .. }
        | Predicate::Between { .. }
        | Predicate::IsNull { .. }
        | Predicate::Like { .. } => Ok(()),
    }
}

impl From<&str> for Dimension {
    fn from(name: &str) -> Self {
        Dimension::row(name)
    }
}

impl From<String> for Dimension {
    fn from(name: String) -> Self {
        Dimension::row(name)
    }
}
