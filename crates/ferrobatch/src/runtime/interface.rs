use core::future::Future;

use crate::SleepProvider;

/// An async runtime the coordinator can run on.
///
/// On top of the timer and clock from [`SleepProvider`], a runtime must be
/// able to detach a task. Each open batch runs its accumulation loop, and each
/// sealed batch runs its dispatch, on a task spawned through this trait, so
/// submitting never waits on either.
pub trait Runtime: SleepProvider + 'static {
    /// Spawns `fut` in the background and forgets about it.
    fn spawn<F>(fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}
