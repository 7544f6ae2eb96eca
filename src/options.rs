//! Extraction options.
//!
//! [`ExtractOptions`] is a builder that threads a progress callback, a
//! cancellation token, and reporting cadence through extraction methods
//! without widening every function signature.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};

/// Options for frame extraction.
///
/// All fields have defaults; a default-constructed value behaves like the
/// plain extraction API with no observers attached.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use videoframes::{CancellationToken, ExtractOptions, ProgressCallback, ProgressInfo};
///
/// struct PrintProgress;
/// impl ProgressCallback for PrintProgress {
///     fn on_progress(&self, info: &ProgressInfo) {
///         if let Some(pct) = info.percentage {
///             println!("{pct:.1}%");
///         }
///     }
/// }
///
/// let token = CancellationToken::new();
/// let options = ExtractOptions::new()
///     .with_progress(Arc::new(PrintProgress))
///     .with_cancellation(token.clone())
///     .with_batch_size(10);
/// ```
#[derive(Clone)]
pub struct ExtractOptions {
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
    pub(crate) batch_size: u64,
}

impl Debug for ExtractOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExtractOptions")
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractOptions {
    /// Create options with defaults: no progress callback, no cancellation,
    /// batch size 1.
    pub fn new() -> Self {
        Self {
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
        }
    }

    /// Attach a progress callback, invoked every
    /// [`batch_size`](ExtractOptions::with_batch_size) frames.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token. When cancelled, the extraction loop
    /// stops and returns [`VideoFramesError::Cancelled`](crate::VideoFramesError::Cancelled).
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Set how often the progress callback fires. A value of 1 means every
    /// frame. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}
