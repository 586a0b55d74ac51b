use std::time::Instant;

use crate::{DelayHandle, processor::Waiter};

/// The batch currently accepting items. At most one exists per coordinator.
pub(crate) struct OpenBatch<T, R, E> {
    pub(crate) id: u64,
    items: Vec<T>,
    waiters: Vec<Waiter<R, E>>,
    pub(crate) created_at: Instant,
    pub(crate) last_arrival_at: Instant,
    outstanding: Option<DelayHandle>,
}

impl<T, R, E> OpenBatch<T, R, E> {
    pub(crate) fn open(id: u64, item: T, waiter: Waiter<R, E>, now: Instant) -> Self {
        Self {
            id,
            items: vec![item],
            waiters: vec![waiter],
            created_at: now,
            last_arrival_at: now,
            outstanding: None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    /// Appends `item` and returns the index its result will be read from.
    pub(crate) fn push(&mut self, item: T, waiter: Waiter<R, E>, now: Instant) -> usize {
        let index = self.items.len();
        self.items.push(item);
        self.waiters.push(waiter);
        self.last_arrival_at = now;
        index
    }

    /// Installs the handle of the delay the accumulation loop is about to
    /// await, replacing the previous one.
    pub(crate) fn set_outstanding(&mut self, handle: DelayHandle) {
        self.outstanding = Some(handle);
    }

    /// Wakes the accumulation loop so it recomputes its wait.
    pub(crate) fn interrupt(&mut self) {
        if let Some(handle) = self.outstanding.take() {
            handle.cancel();
        }
    }

    /// Closes the batch to further arrivals.
    ///
    /// Any outstanding delay is cancelled so the loop that owned this batch
    /// wakes up, finds it gone and exits.
    pub(crate) fn seal(mut self) -> SealedBatch<T, R, E> {
        self.interrupt();
        SealedBatch {
            id: self.id,
            items: self.items,
            waiters: self.waiters,
        }
    }
}

/// A batch detached from its coordinator, owned by the dispatch step.
pub(crate) struct SealedBatch<T, R, E> {
    pub(crate) id: u64,
    pub(crate) items: Vec<T>,
    pub(crate) waiters: Vec<Waiter<R, E>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Delay, DelayOutcome, SleepProvider};
    use core::time::Duration;
    use futures::{channel::oneshot, executor::block_on, future};

    struct NeverSleep;
    impl SleepProvider for NeverSleep {
        type Sleep = future::Pending<()>;

        fn sleep_for(_dur: Duration) -> Self::Sleep {
            future::pending()
        }
    }

    fn waiter() -> Waiter<u8, ()> {
        oneshot::channel().0
    }

    #[test]
    fn push_assigns_indices_in_order() {
        let t0 = Instant::now();
        let mut batch = OpenBatch::open(7, 'a', waiter(), t0);
        assert_eq!(batch.push('b', waiter(), t0 + Duration::from_millis(3)), 1);
        assert_eq!(batch.push('c', waiter(), t0 + Duration::from_millis(4)), 2);

        assert_eq!(batch.len(), 3);
        assert_eq!(batch.created_at, t0);
        assert_eq!(batch.last_arrival_at, t0 + Duration::from_millis(4));

        let sealed = batch.seal();
        assert_eq!(sealed.id, 7);
        assert_eq!(sealed.items, vec!['a', 'b', 'c']);
        assert_eq!(sealed.waiters.len(), 3);
    }

    #[test]
    fn interrupt_cancels_the_outstanding_delay_once() {
        let mut batch = OpenBatch::open(1, 0u8, waiter(), Instant::now());
        let (delay, handle) = Delay::<NeverSleep>::new(Duration::from_secs(1));
        batch.set_outstanding(handle);

        batch.interrupt();
        // Nothing left to cancel.
        batch.interrupt();
        assert_eq!(block_on(delay), DelayOutcome::Interrupted);
    }

    #[test]
    fn seal_cancels_the_outstanding_delay() {
        let mut batch = OpenBatch::open(1, 0u8, waiter(), Instant::now());
        let (delay, handle) = Delay::<NeverSleep>::new(Duration::from_secs(1));
        batch.set_outstanding(handle);

        let _sealed = batch.seal();
        assert_eq!(block_on(delay), DelayOutcome::Interrupted);
    }
}
