use core::future::Future;
use futures::{FutureExt, channel::oneshot, future::BoxFuture};
use std::sync::Arc;

use crate::{Error, Result};

/// Type-erased batch processor: ordered items in, equally long ordered
/// results out.
pub type BatchFn<T, R, E> =
    Arc<dyn Fn(Vec<T>) -> BoxFuture<'static, core::result::Result<Vec<R>, E>> + Send + Sync>;

/// Type-erased single-item processor, preferred for batches of exactly one.
pub type SingleFn<T, R, E> =
    Arc<dyn Fn(T) -> BoxFuture<'static, core::result::Result<R, E>> + Send + Sync>;

/// Sending half of a caller's result slot.
pub(crate) type Waiter<R, E> = oneshot::Sender<Result<R, E>>;

pub(crate) fn boxed_batch_fn<T, R, E, F, Fut>(f: F) -> BatchFn<T, R, E>
where
    F: Fn(Vec<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = core::result::Result<Vec<R>, E>> + Send + 'static,
{
    Arc::new(move |items| f(items).boxed())
}

pub(crate) fn boxed_single_fn<T, R, E, F, Fut>(f: F) -> SingleFn<T, R, E>
where
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = core::result::Result<R, E>> + Send + 'static,
{
    Arc::new(move |item| f(item).boxed())
}

/// The downstream callables injected at construction.
pub(crate) struct Processors<T, R, E> {
    pub(crate) batch: BatchFn<T, R, E>,
    pub(crate) single: Option<SingleFn<T, R, E>>,
}

impl<T, R, E> Processors<T, R, E> {
    /// Invokes the right processor for `items` and checks the result count.
    ///
    /// A lone item goes to the single-item processor when one is configured;
    /// everything else goes to the batch processor.
    pub(crate) async fn run(&self, mut items: Vec<T>) -> Result<Vec<R>, E> {
        let expected = items.len();

        if let (Some(single), 1) = (&self.single, expected) {
            if let Some(item) = items.pop() {
                let result = single(item).await.map_err(Error::Processor)?;
                return Ok(vec![result]);
            }
        }

        let results = (self.batch)(items).await.map_err(Error::Processor)?;
        if results.len() != expected {
            return Err(Error::ResultCountMismatch {
                expected,
                actual: results.len(),
            });
        }
        Ok(results)
    }
}

/// Fans a batch outcome out to its callers, by position.
///
/// A failed batch fails every caller with the same error. Callers that
/// dropped their [`Submission`](crate::Submission) are skipped.
pub(crate) fn deliver<R, E>(waiters: Vec<Waiter<R, E>>, outcome: Result<Vec<R>, E>)
where
    E: Clone,
{
    match outcome {
        Ok(results) => {
            for (waiter, result) in waiters.into_iter().zip(results) {
                let _ = waiter.send(Ok(result));
            }
        }
        Err(err) => {
            for waiter in waiters {
                let _ = waiter.send(Err(err.clone()));
            }
        }
    }
}
