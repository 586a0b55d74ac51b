use core::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};
use futures::task::AtomicWaker;
use pin_project_lite::pin_project;
use portable_atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::SleepProvider;

/// How a [`Delay`] finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DelayOutcome {
    /// The full duration passed without the delay being cancelled.
    Elapsed,
    /// The paired [`DelayHandle`] cancelled the delay before it elapsed.
    Interrupted,
}

impl DelayOutcome {
    /// Returns `true` if the delay ran to completion.
    pub const fn is_elapsed(self) -> bool {
        matches!(self, Self::Elapsed)
    }

    /// Returns `true` if the delay was cut short by its handle.
    pub const fn is_interrupted(self) -> bool {
        matches!(self, Self::Interrupted)
    }
}

#[derive(Debug, Default)]
struct Signal {
    cancelled: AtomicBool,
    waker: AtomicWaker,
}

impl Signal {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

pin_project! {
    /// A timer that can be cut short from another task.
    ///
    /// Resolves to [`DelayOutcome::Elapsed`] once the underlying
    /// [`SleepProvider`] sleep completes, or to [`DelayOutcome::Interrupted`]
    /// as soon as the paired [`DelayHandle`] is cancelled. If both happen
    /// before the next poll, the cancellation wins.
    ///
    /// Dropping a `Delay` drops the underlying sleep, so an abandoned delay
    /// holds on to no timer resources.
    ///
    /// # Example
    ///
    /// ```
    /// # #[cfg(feature = "async-tokio")]
    /// # {
    /// use ferrobatch::{Delay, DelayOutcome, TokioRuntime};
    /// use std::time::Duration;
    ///
    /// # tokio_test();
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn tokio_test() {
    /// let (delay, handle) = Delay::<TokioRuntime>::new(Duration::from_secs(60));
    /// handle.cancel();
    /// assert_eq!(delay.await, DelayOutcome::Interrupted);
    /// # }
    /// # }
    /// ```
    #[must_use = "futures do nothing unless you `.await` or poll them"]
    pub struct Delay<S>
    where
        S: SleepProvider,
    {
        #[pin]
        sleep: S::Sleep,
        signal: Arc<Signal>,
    }
}

impl<S> Delay<S>
where
    S: SleepProvider,
{
    /// Starts a delay of `dur` and returns it together with the handle that
    /// can interrupt it.
    ///
    /// A zero duration is still routed through the provider's timer, so the
    /// delay resolves on a later poll rather than inline.
    pub fn new(dur: Duration) -> (Self, DelayHandle) {
        let signal = Arc::new(Signal::default());
        let delay = Self {
            sleep: S::sleep_for(dur),
            signal: Arc::clone(&signal),
        };
        (delay, DelayHandle { signal })
    }
}

/// Shorthand for [`Delay::new`].
pub fn delay<S: SleepProvider>(dur: Duration) -> (Delay<S>, DelayHandle) {
    Delay::new(dur)
}

impl<S> Future for Delay<S>
where
    S: SleepProvider,
{
    type Output = DelayOutcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        if this.signal.is_cancelled() {
            return Poll::Ready(DelayOutcome::Interrupted);
        }
        this.signal.waker.register(cx.waker());
        // Re-check: a cancel between the load and `register` would otherwise
        // wake a stale waker.
        if this.signal.is_cancelled() {
            return Poll::Ready(DelayOutcome::Interrupted);
        }

        match this.sleep.poll(cx) {
            Poll::Ready(()) => Poll::Ready(DelayOutcome::Elapsed),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Cancels the [`Delay`] it was created with.
///
/// Dropping the handle without calling [`DelayHandle::cancel`] leaves the delay
/// running to completion.
#[derive(Debug)]
pub struct DelayHandle {
    signal: Arc<Signal>,
}

impl DelayHandle {
    /// Interrupts the paired delay.
    ///
    /// Has no observable effect if the delay already resolved.
    pub fn cancel(self) {
        self.signal.cancelled.store(true, Ordering::Release);
        self.signal.waker.wake();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{executor::block_on, future, poll};

    struct NeverSleep;
    impl SleepProvider for NeverSleep {
        type Sleep = future::Pending<()>;

        fn sleep_for(_dur: Duration) -> Self::Sleep {
            future::pending()
        }
    }

    struct InstantSleep;
    impl SleepProvider for InstantSleep {
        type Sleep = future::Ready<()>;

        fn sleep_for(_dur: Duration) -> Self::Sleep {
            future::ready(())
        }
    }

    #[test]
    fn elapses_when_sleep_completes() {
        let (delay, _handle) = Delay::<InstantSleep>::new(Duration::from_millis(5));
        assert_eq!(block_on(delay), DelayOutcome::Elapsed);
    }

    #[test]
    fn stays_pending_until_cancelled() {
        block_on(async {
            let (delay, handle) = Delay::<NeverSleep>::new(Duration::from_secs(1));
            let mut delay = Box::pin(delay);

            assert!(poll!(delay.as_mut()).is_pending());
            assert!(poll!(delay.as_mut()).is_pending());

            handle.cancel();
            assert_eq!(
                poll!(delay.as_mut()),
                Poll::Ready(DelayOutcome::Interrupted)
            );
        });
    }

    #[test]
    fn cancel_before_first_poll_wins_over_elapsed() {
        let (delay, handle) = delay::<InstantSleep>(Duration::ZERO);
        handle.cancel();
        assert_eq!(block_on(delay), DelayOutcome::Interrupted);
    }

    #[test]
    fn dropping_handle_does_not_cancel() {
        block_on(async {
            let (delay, handle) = Delay::<NeverSleep>::new(Duration::from_secs(1));
            drop(handle);
            let mut delay = Box::pin(delay);
            assert!(poll!(delay.as_mut()).is_pending());
        });
    }

    #[test]
    fn cancel_wakes_a_parked_waiter() {
        let (delay, handle) = Delay::<NeverSleep>::new(Duration::from_secs(1));
        let waiter = std::thread::spawn(move || block_on(delay));
        std::thread::sleep(std::time::Duration::from_millis(10));
        handle.cancel();
        assert_eq!(waiter.join().unwrap(), DelayOutcome::Interrupted);
    }

    #[test]
    fn outcome_predicates() {
        assert!(DelayOutcome::Elapsed.is_elapsed());
        assert!(!DelayOutcome::Elapsed.is_interrupted());
        assert!(DelayOutcome::Interrupted.is_interrupted());
        assert!(!DelayOutcome::Interrupted.is_elapsed());
    }
}
