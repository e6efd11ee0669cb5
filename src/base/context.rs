//! Ergonomic error context helpers.
//!
//! Provides an extension trait for converting IO errors into `NetError`
//! values while preserving the failing domain in the logs.

use crate::base::neterror::NetError;
use std::io;

/// Extension trait for adding context to IO Results.
pub trait IoResultExt<T> {
    /// Add DNS resolution context to an IO error.
    ///
    /// The IO error itself is logged (errors carry no payload across the
    /// resolver boundary, only a code).
    fn dns_context(self, domain: &str) -> Result<T, NetError>;
}

impl<T> IoResultExt<T> for Result<T, io::Error> {
    fn dns_context(self, domain: &str) -> Result<T, NetError> {
        self.map_err(|e| {
            tracing::debug!(domain = %domain, error = %e, "DNS resolution failed");
            NetError::NameNotResolved
        })
    }
}
