//! Error types for batch submission and coordinator construction.
//!
//! - [`Error`] is what a caller's [`Submission`](crate::Submission) resolves
//!   to when its batch did not produce a result. A batch has exactly one
//!   outcome, so every caller in a failed batch receives a clone of the same
//!   error.
//! - [`ConfigError`] is returned when building a
//!   [`Batcher`](crate::Batcher) with an unusable policy or without a
//!   processor. It is never produced at submission time.

/// A result type for batched submissions.
///
/// `E` is the error type of the injected processor.
pub type Result<T, E> = core::result::Result<T, Error<E>>;

/// All the ways a submitted item can fail to receive its result.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error<E> {
    /// The processor failed for the batch containing this item.
    #[error("batch processor failed: {0}")]
    Processor(E),

    /// The batch processor returned a different number of results than it
    /// was given items.
    #[error("batch processor returned {actual} results for {expected} items")]
    ResultCountMismatch { expected: usize, actual: usize },

    /// The task dispatching this item's batch was dropped before it delivered
    /// a result, e.g. because the runtime shut down.
    #[error("batch was abandoned before a result was delivered")]
    Abandoned,
}

impl<E> Error<E> {
    /// Returns the processor's error, if that is what caused this failure.
    pub fn processor_error(&self) -> Option<&E> {
        match self {
            Self::Processor(e) => Some(e),
            _ => None,
        }
    }
}

/// Rejected coordinator configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// `max_delay` must be greater than zero.
    #[error("max_delay must be greater than zero")]
    InvalidMaxDelay,

    /// `max_count` must be at least one.
    #[error("max_count must be at least one")]
    InvalidMaxCount,

    /// No batch processor was supplied.
    #[error("a batch processor is required")]
    MissingProcessor,
}
