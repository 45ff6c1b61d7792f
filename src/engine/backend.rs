//! The seam to external SQL execution services.
//!
//! The push-down engines never execute SQL themselves. A [`SqlBackend`]
//! receives the generated statement plus the local tables it may reference
//! and returns the aggregated result as a [`Frame`] whose columns are named
//! by the statement's SELECT aliases.

use std::fmt;

use crate::data::Frame;
use crate::error::BackendError;

/// A client for an SQL-speaking execution service.
///
/// Implementations own their connection state (a database file, a
/// warehouse session) and are responsible for timeouts and cancellation.
pub trait SqlBackend: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    /// Run `sql` and return its result.
    ///
    /// `tables` maps table names used in the statement to local frames; a
    /// remote warehouse receives an empty slice and reads its own storage.
    fn execute(&self, sql: &str, tables: &[(&str, &Frame)]) -> Result<Frame, BackendError>;
}

impl fmt::Debug for dyn SqlBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlBackend").field("name", &self.name()).finish()
    }
}
