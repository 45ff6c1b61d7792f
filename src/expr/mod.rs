//! The expression algebra: scalars, predicates and aggregates.
//!
//! Expressions are closed sum types. Each one can be evaluated in-process
//! against a [`Frame`](crate::data::Frame), reports the columns it reads,
//! serializes to a `kind`-tagged structure, and renders to dialect SQL via
//! [`Emitter`](crate::sql::Emitter).
//!
//! ```ignore
//! use tabula::expr::{col, ExprExt};
//!
//! let where_ = col("country").isin(["US", "CA"]) & col("impr").gt(0) & !col("device").eq("Tablet");
//! let ctr = col("clicks") / col("impr");
//! ```

mod agg;
mod eval;
pub mod pattern;
mod predicate;
mod scalar;

pub use agg::{avg, count, count_star, max, min, nunique, ratio_of_sums, sum, AggExpr, AggInput};
pub use predicate::{adapt_where, BoolOp, CmpOp, ExprExt, Filter, Inclusive, Predicate};
pub use scalar::{case_when, coalesce, col, concat, lit, safe_div, BinaryOp, ScalarExpr, WhenBranch};

pub(crate) use agg::reduce;
