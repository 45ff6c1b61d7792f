//! In-memory tabular data: cells, columns, frames and reductions.
//!
//! This is the dataset provider the in-process engine orchestrates. It is
//! deliberately small: filtering by mask, grouping by key columns and the
//! six per-group reductions are all the engines need.

mod dataset;
mod frame;
mod reduce;
mod value;

pub use dataset::Dataset;
pub use frame::{Column, Frame};
pub use reduce::Reduction;
pub use value::Value;
pub(crate) use value::{tagged, tagged_seq};
