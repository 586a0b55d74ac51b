use core::time::Duration;

/// A snapshot of a coordinator's batch slot.
///
/// Batches that are already sealed and being dispatched are detached from the
/// coordinator and never show up here.
///
/// # Example
///
/// ```
/// use ferrobatch::BatchStatus;
///
/// let status = BatchStatus::Idle;
/// assert!(status.is_idle());
/// assert_eq!(status.pending(), 0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BatchStatus {
    /// No batch is open. The next submission opens one.
    Idle,
    /// A batch is open and collecting items.
    Accumulating {
        /// Items accepted so far.
        pending: usize,
        /// Time since the first item was accepted.
        age: Duration,
    },
}

impl BatchStatus {
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Number of items waiting in the open batch, zero when idle.
    pub const fn pending(&self) -> usize {
        match self {
            Self::Idle => 0,
            Self::Accumulating { pending, .. } => *pending,
        }
    }
}
