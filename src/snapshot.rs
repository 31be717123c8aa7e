//! Latest known state of one polled query.

use crate::errors::QuakeError;
use crate::models::ApiResponse;

/// Data, loading flag and error for a single query.
///
/// A successful fetch replaces the envelope wholesale. A failed fetch sets
/// `error` and keeps the previous data, so stale-but-present wins over
/// blank.
#[derive(Debug, Clone)]
pub struct QuerySnapshot<T> {
    data: Option<ApiResponse<T>>,
    is_loading: bool,
    error: Option<String>,
}

impl<T> Default for QuerySnapshot<T> {
    fn default() -> Self {
        Self {
            data: None,
            is_loading: false,
            error: None,
        }
    }
}

impl<T> QuerySnapshot<T> {
    /// Mark a fetch as started.
    ///
    /// Only the first fetch counts as loading; later refetches keep
    /// showing whatever has already settled.
    pub fn begin(&mut self) {
        if self.data.is_none() && self.error.is_none() {
            self.is_loading = true;
        }
    }

    /// Settle the snapshot with a fetch result.
    pub fn settle(&mut self, result: Result<ApiResponse<T>, QuakeError>) {
        self.is_loading = false;
        match result {
            Ok(response) => {
                self.data = Some(response);
                self.error = None;
            }
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    /// The last successful envelope.
    #[must_use]
    pub fn response(&self) -> Option<&ApiResponse<T>> {
        self.data.as_ref()
    }

    /// The last successful payload.
    #[must_use]
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref().map(|r| &r.data)
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Error from the most recent fetch, cleared by the next success.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
