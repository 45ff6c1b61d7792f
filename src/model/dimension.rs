//! Grouping axes and time bucketing.

use std::fmt;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::data::{Column, Frame, Value};
use crate::error::{ReportResult, ValidationError};

/// Where a dimension's values end up in the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Row index of the pivoted table.
    #[default]
    Row,
    /// Spread across the pivoted table's columns.
    Column,
    /// Partitions the result into independent tables.
    Slicer,
}

/// Calendar granularity for bucketing a date or timestamp dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeGrain {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl TimeGrain {
    /// Parse a grain name. Accepts the full name or its first letter,
    /// case-insensitively.
    pub fn parse(s: &str) -> ReportResult<TimeGrain> {
        match s.trim().to_lowercase().as_str() {
            "day" | "d" => Ok(TimeGrain::Day),
            "week" | "w" => Ok(TimeGrain::Week),
            "month" | "m" => Ok(TimeGrain::Month),
            "quarter" | "q" => Ok(TimeGrain::Quarter),
            "year" | "y" => Ok(TimeGrain::Year),
            _ => Err(ValidationError::UnknownTimeGrain(s.to_string()).into()),
        }
    }

    /// Canonical lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            TimeGrain::Day => "day",
            TimeGrain::Week => "week",
            TimeGrain::Month => "month",
            TimeGrain::Quarter => "quarter",
            TimeGrain::Year => "year",
        }
    }

    /// First day of the bucket containing `date`. Weeks start on Monday.
    pub fn truncate(&self, date: NaiveDate) -> NaiveDate {
        let first_of = |month: u32| NaiveDate::from_ymd_opt(date.year(), month, 1).unwrap_or(date);
        match self {
            TimeGrain::Day => date,
            TimeGrain::Week => {
                date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
            }
            TimeGrain::Month => first_of(date.month()),
            TimeGrain::Quarter => first_of((date.month0() / 3) * 3 + 1),
            TimeGrain::Year => first_of(1),
        }
    }

    /// Bucket a cell. Values without a date (including unparseable strings)
    /// bucket to null.
    pub fn bucket(&self, value: &Value) -> Value {
        match value.to_date() {
            Some(date) => Value::Date(self.truncate(date)),
            None => Value::Null,
        }
    }
}

impl fmt::Display for TimeGrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A named grouping axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    #[serde(default)]
    pub role: Role,
    /// Drill levels below this dimension. Carried through serialization;
    /// grouping uses `name` only.
    #[serde(default)]
    pub levels: Vec<String>,
    #[serde(default)]
    pub time_grain: Option<String>,
}

impl Dimension {
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            role,
            levels: Vec::new(),
            time_grain: None,
        }
    }

    pub fn row(name: impl Into<String>) -> Self {
        Self::new(name, Role::Row)
    }

    pub fn column(name: impl Into<String>) -> Self {
        Self::new(name, Role::Column)
    }

    pub fn slicer(name: impl Into<String>) -> Self {
        Self::new(name, Role::Slicer)
    }

    pub fn with_time_grain(mut self, grain: impl Into<String>) -> Self {
        self.time_grain = Some(grain.into());
        self
    }

    pub fn with_levels(mut self, levels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.levels = levels.into_iter().map(Into::into).collect();
        self
    }

    /// The parsed time grain, if one is set.
    pub fn grain(&self) -> ReportResult<Option<TimeGrain>> {
        self.time_grain.as_deref().map(TimeGrain::parse).transpose()
    }

    /// The grouping key: the raw column name, or `__{name}@{grain}__` for a
    /// time-bucketed dimension.
    pub fn key_name(&self) -> ReportResult<String> {
        Ok(match self.grain()? {
            Some(grain) => synthetic_name(&self.name, grain),
            None => self.name.clone(),
        })
    }

    /// Resolve against `frame` without touching it.
    ///
    /// Returns the grouping key name and, for time-bucketed dimensions, the
    /// bucketed column the caller should attach under that name.
    pub fn resolve(&self, frame: &Frame) -> ReportResult<(String, Option<Column>)> {
        let source = frame.require(&self.name)?;
        let Some(grain) = self.grain()? else {
            return Ok((self.name.clone(), None));
        };
        let key = synthetic_name(&self.name, grain);
        let values = source.values.iter().map(|v| grain.bucket(v)).collect();
        Ok((key.clone(), Some(Column::new(key, values))))
    }
}

fn synthetic_name(name: &str, grain: TimeGrain) -> String {
    format!("__{}@{}__", name, grain.name())
}
