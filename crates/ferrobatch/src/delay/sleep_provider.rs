use core::{future::Future, time::Duration};
use std::time::Instant;

/// A trait that abstracts over how to sleep for a given [`Duration`] in async
/// contexts.
///
/// This allows the coordinator to be generic over runtimes like `Tokio` or
/// `Smol`.
pub trait SleepProvider {
    /// We require `Send` and `'static` so that the future can be moved into a
    /// spawned task
    type Sleep: Future<Output = ()> + Send + 'static;

    fn sleep_for(dur: Duration) -> Self::Sleep;

    /// Returns the current instant as seen by this provider's timer.
    ///
    /// Batch ages are measured with this clock, so a runtime with a virtual
    /// clock (e.g. Tokio's paused test clock) should override it to stay
    /// consistent with [`Self::sleep_for`].
    fn now() -> Instant {
        Instant::now()
    }
}
