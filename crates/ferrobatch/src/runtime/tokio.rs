use core::{future::Future, time::Duration};
use std::time::Instant;

use crate::{Batcher, Runtime, SleepProvider};

/// An implementation of [`Runtime`] using Tokio's timer and task spawner.
///
/// This is the default runtime for use in async applications built on Tokio.
/// [`Runtime::spawn`] calls [`tokio::spawn`], so submitting to a batcher
/// outside of a Tokio runtime panics.
///
/// Time is read from [`tokio::time::Instant`], which keeps batch ages in step
/// with a paused or manually advanced test clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioRuntime;

impl SleepProvider for TokioRuntime {
    type Sleep = tokio::time::Sleep;

    fn sleep_for(dur: Duration) -> Self::Sleep {
        tokio::time::sleep(dur)
    }

    fn now() -> Instant {
        tokio::time::Instant::now().into_std()
    }
}

impl Runtime for TokioRuntime {
    fn spawn<F>(fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        // Dropping the `JoinHandle` detaches the task.
        drop(tokio::spawn(fut));
    }
}

/// A [`Batcher`] running on [`TokioRuntime`].
pub type TokioBatcher<T, R, E> = Batcher<T, R, E, TokioRuntime>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Delay, DelayOutcome};

    #[tokio::test(start_paused = true)]
    async fn delay_elapses_after_duration() {
        let start = tokio::time::Instant::now();
        let (delay, _handle) = Delay::<TokioRuntime>::new(Duration::from_millis(25));

        assert_eq!(delay.await, DelayOutcome::Elapsed);
        assert!(start.elapsed() >= Duration::from_millis(25));
        assert!(start.elapsed() < Duration::from_millis(27));
    }

    #[tokio::test(start_paused = true)]
    async fn delay_is_interrupted_from_another_task() {
        let start = tokio::time::Instant::now();
        let (delay, handle) = Delay::<TokioRuntime>::new(Duration::from_secs(10));

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(3)).await;
            handle.cancel();
        });

        assert_eq!(delay.await, DelayOutcome::Interrupted);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_delay_still_elapses() {
        let (delay, _handle) = Delay::<TokioRuntime>::new(Duration::ZERO);
        assert_eq!(delay.await, DelayOutcome::Elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_after_elapsed_is_a_no_op() {
        let (delay, handle) = Delay::<TokioRuntime>::new(Duration::from_millis(1));
        assert_eq!(delay.await, DelayOutcome::Elapsed);
        handle.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn clock_follows_paused_time() {
        let before = TokioRuntime::now();
        tokio::time::sleep(Duration::from_millis(40)).await;
        let after = TokioRuntime::now();
        assert!(after.duration_since(before) >= Duration::from_millis(40));
    }
}
