use core::{fmt, marker::PhantomData};
use futures::channel::oneshot;
use portable_atomic::{AtomicU64, Ordering};
use std::sync::Arc;
#[cfg(feature = "tracing")]
use tracing::instrument;

use super::{
    BatcherBuilder, Submission,
    state::{OpenBatch, SealedBatch},
};
use crate::{
    BatchPolicy, BatchStatus, Delay, DelayOutcome, Runtime,
    mutex::{Mutex, lock},
    processor::{Processors, deliver},
};

/// State shared by every clone of a [`Batcher`] and by its background tasks.
pub(crate) struct Shared<T, R, E> {
    pub(crate) policy: BatchPolicy,
    pub(crate) processors: Processors<T, R, E>,
    pub(crate) slot: Mutex<Option<OpenBatch<T, R, E>>>,
    pub(crate) next_id: AtomicU64,
}

/// Coalesces independent submissions into batched processor calls.
///
/// Each [`Batcher::submit`] either opens a new batch or joins the open one.
/// An open batch is released to the processor when its [`BatchPolicy`] says
/// enough waiting has happened, and every caller then receives the result at
/// the position its item was appended.
///
/// Sealing detaches the batch from the coordinator before the processor is
/// awaited, so a slow or failing downstream call never holds up the next
/// batch.
///
/// `Batcher` is a cheap handle: clones share the same open batch. Separately
/// built batchers share nothing.
///
/// ## Type Parameters
///
/// - `T`: submitted item
/// - `R`: per-item result
/// - `E`: processor error, cloned to every caller of a failed batch
/// - `RT`: the [`Runtime`] providing timers and background tasks
///
/// # Example
///
/// ```
/// # #[cfg(feature = "async-tokio")]
/// # {
/// use ferrobatch::{BatchPolicy, TokioBatcher};
/// use std::{convert::Infallible, time::Duration};
///
/// # tokio_test();
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn tokio_test() {
/// let batcher = TokioBatcher::<u64, u64, Infallible>::builder(
///     BatchPolicy::new(Duration::from_millis(50)).with_default_delay(Duration::from_millis(5)),
/// )
/// .process(|ids: Vec<u64>| async move { Ok(ids.into_iter().map(|id| id * id).collect()) })
/// .build()
/// .unwrap();
///
/// let (a, b) = futures::join!(batcher.submit(3), batcher.submit(4));
/// assert_eq!((a, b), (Ok(9), Ok(16)));
/// # }
/// # }
/// ```
pub struct Batcher<T, R, E, RT> {
    shared: Arc<Shared<T, R, E>>,
    _runtime: PhantomData<fn() -> RT>,
}

impl<T, R, E, RT> Clone for Batcher<T, R, E, RT> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            _runtime: PhantomData,
        }
    }
}

impl<T, R, E, RT> fmt::Debug for Batcher<T, R, E, RT> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Batcher")
            .field("policy", &self.shared.policy)
            .finish_non_exhaustive()
    }
}

/// What a submission must kick off once the slot lock is released.
enum FollowUp<T, R, E> {
    Nothing,
    Accumulate(u64),
    Dispatch(SealedBatch<T, R, E>),
}

impl<T, R, E, RT> Batcher<T, R, E, RT>
where
    T: Send + 'static,
    R: Send + 'static,
    E: Clone + Send + 'static,
    RT: Runtime,
{
    /// Starts configuring a batcher with the given policy.
    pub fn builder(policy: BatchPolicy) -> BatcherBuilder<T, R, E, RT> {
        BatcherBuilder::new(policy)
    }

    pub(crate) fn from_shared(shared: Shared<T, R, E>) -> Self {
        Self {
            shared: Arc::new(shared),
            _runtime: PhantomData,
        }
    }

    pub fn policy(&self) -> &BatchPolicy {
        &self.shared.policy
    }

    /// Submits `item` for batched processing.
    ///
    /// All bookkeeping happens before this returns: the item's result index is
    /// fixed in call order, the open batch's quiet period restarts, and a batch
    /// reaching `max_count` is sealed on the spot. Only waiting for the result
    /// is deferred to the returned [`Submission`].
    ///
    /// Opening a batch spawns its accumulation loop through `RT`, so this must
    /// be called where `RT` can spawn (inside a Tokio runtime for
    /// [`TokioRuntime`](crate::TokioRuntime)).
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip_all))]
    pub fn submit(&self, item: T) -> Submission<R, E> {
        let (tx, rx) = oneshot::channel();
        let now = RT::now();
        let policy = &self.shared.policy;

        let follow_up = {
            let mut slot = lock(&self.shared.slot);
            match slot.as_mut() {
                Some(batch) => {
                    let _index = batch.push(item, tx, now);
                    #[cfg(feature = "tracing")]
                    tracing::trace!(batch_id = batch.id, index = _index, "joined open batch");

                    if policy.is_full(batch.len()) {
                        slot.take()
                            .map_or(FollowUp::Nothing, |batch| FollowUp::Dispatch(batch.seal()))
                    } else {
                        batch.interrupt();
                        FollowUp::Nothing
                    }
                }
                None => {
                    let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
                    let batch = OpenBatch::open(id, item, tx, now);
                    #[cfg(feature = "tracing")]
                    tracing::trace!(batch_id = id, "opened batch");

                    if policy.is_full(batch.len()) {
                        FollowUp::Dispatch(batch.seal())
                    } else {
                        *slot = Some(batch);
                        FollowUp::Accumulate(id)
                    }
                }
            }
        };

        match follow_up {
            FollowUp::Nothing => {}
            FollowUp::Accumulate(id) => {
                RT::spawn(accumulate::<T, R, E, RT>(Arc::clone(&self.shared), id))
            }
            FollowUp::Dispatch(sealed) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    batch_id = sealed.id,
                    items = sealed.items.len(),
                    "sealing batch: max_count reached"
                );
                RT::spawn(dispatch(Arc::clone(&self.shared), sealed));
            }
        }

        Submission::new(rx)
    }

    /// Seals the open batch now instead of waiting for its policy.
    ///
    /// Returns `false` if no batch was open.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip_all))]
    pub fn flush(&self) -> bool {
        let Some(batch) = lock(&self.shared.slot).take() else {
            return false;
        };
        let sealed = batch.seal();
        #[cfg(feature = "tracing")]
        tracing::debug!(
            batch_id = sealed.id,
            items = sealed.items.len(),
            "sealing batch: flushed"
        );
        RT::spawn(dispatch(Arc::clone(&self.shared), sealed));
        true
    }

    /// Reports whether a batch is open, and how full and how old it is.
    pub fn status(&self) -> BatchStatus {
        match lock(&self.shared.slot).as_ref() {
            None => BatchStatus::Idle,
            Some(batch) => BatchStatus::Accumulating {
                pending: batch.len(),
                age: RT::now().saturating_duration_since(batch.created_at),
            },
        }
    }
}

/// Waits out the policy for batch `id`, then seals and dispatches it.
///
/// Each pass recomputes the wait from the batch's current age and quiet
/// period and parks on a fresh [`Delay`]. New arrivals interrupt the delay,
/// which only triggers another pass. The loop exits without dispatching if
/// the batch was sealed elsewhere (size ceiling or flush).
async fn accumulate<T, R, E, RT>(shared: Arc<Shared<T, R, E>>, id: u64)
where
    E: Clone,
    RT: Runtime,
{
    loop {
        let delay = {
            let mut slot = lock(&shared.slot);
            let Some(batch) = slot.as_mut().filter(|batch| batch.id == id) else {
                return;
            };
            if shared.policy.is_full(batch.len()) {
                break;
            }
            let wait = shared
                .policy
                .next_wait(batch.created_at, batch.last_arrival_at, RT::now());
            let (delay, handle) = Delay::<RT>::new(wait);
            batch.set_outstanding(handle);
            delay
        };

        match delay.await {
            DelayOutcome::Interrupted => {
                #[cfg(feature = "tracing")]
                tracing::trace!(batch_id = id, "delay interrupted, recomputing");
            }
            DelayOutcome::Elapsed => break,
        }
    }

    let Some(batch) = lock(&shared.slot).take_if(|batch| batch.id == id) else {
        return;
    };
    let sealed = batch.seal();
    #[cfg(feature = "tracing")]
    tracing::debug!(
        batch_id = id,
        items = sealed.items.len(),
        "sealing batch: delay elapsed"
    );
    dispatch(shared, sealed).await;
}

/// Runs the processor for a sealed batch and hands each caller its result.
async fn dispatch<T, R, E>(shared: Arc<Shared<T, R, E>>, sealed: SealedBatch<T, R, E>)
where
    E: Clone,
{
    let SealedBatch {
        id: _id,
        items,
        waiters,
    } = sealed;
    let outcome = shared.processors.run(items).await;

    #[cfg(feature = "tracing")]
    match &outcome {
        Ok(results) => tracing::trace!(batch_id = _id, results = results.len(), "batch processed"),
        Err(crate::Error::ResultCountMismatch { expected, actual }) => tracing::error!(
            batch_id = _id,
            expected,
            actual,
            "batch processor returned the wrong number of results"
        ),
        Err(_) => tracing::warn!(batch_id = _id, "batch processor failed"),
    }

    deliver(waiters, outcome);
}
