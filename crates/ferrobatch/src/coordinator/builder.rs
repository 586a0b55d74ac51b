use core::{future::Future, marker::PhantomData};
use portable_atomic::AtomicU64;

use super::{Batcher, batcher::Shared};
use crate::{
    BatchFn, BatchPolicy, ConfigError, Runtime, SingleFn,
    mutex::Mutex,
    processor::{Processors, boxed_batch_fn, boxed_single_fn},
};

/// Configures and validates a [`Batcher`].
///
/// A batch processor is required. The single-item processor is optional and,
/// when present, replaces the batch processor for batches that sealed with
/// exactly one item.
///
/// # Example
///
/// ```
/// # #[cfg(feature = "async-tokio")]
/// # {
/// use ferrobatch::{BatchPolicy, ConfigError, TokioBatcher};
/// use std::time::Duration;
///
/// let missing = TokioBatcher::<u8, u8, ()>::builder(BatchPolicy::new(Duration::from_millis(10)))
///     .build();
/// assert_eq!(missing.unwrap_err(), ConfigError::MissingProcessor);
///
/// let zero = TokioBatcher::<u8, u8, ()>::builder(BatchPolicy::new(Duration::ZERO))
///     .process(|items: Vec<u8>| async move { Ok(items) })
///     .build();
/// assert_eq!(zero.unwrap_err(), ConfigError::InvalidMaxDelay);
/// # }
/// ```
#[must_use]
pub struct BatcherBuilder<T, R, E, RT> {
    policy: BatchPolicy,
    batch: Option<BatchFn<T, R, E>>,
    single: Option<SingleFn<T, R, E>>,
    _runtime: PhantomData<fn() -> RT>,
}

impl<T, R, E, RT> BatcherBuilder<T, R, E, RT>
where
    T: Send + 'static,
    R: Send + 'static,
    E: Clone + Send + 'static,
    RT: Runtime,
{
    pub fn new(policy: BatchPolicy) -> Self {
        Self {
            policy,
            batch: None,
            single: None,
            _runtime: PhantomData,
        }
    }

    /// Sets the batch processor.
    ///
    /// It receives the sealed items in submission order and must produce one
    /// result per item, in the same order.
    pub fn process<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Vec<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<R>, E>> + Send + 'static,
    {
        self.batch = Some(boxed_batch_fn(f));
        self
    }

    /// Sets a processor used instead of [`Self::process`] when a batch holds a
    /// single item.
    pub fn prefer_single<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
    {
        self.single = Some(boxed_single_fn(f));
        self
    }

    /// Validates the configuration and creates the batcher.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingProcessor`] if [`Self::process`] was never
    ///   called
    /// - any error from [`BatchPolicy::validate`]
    pub fn build(self) -> Result<Batcher<T, R, E, RT>, ConfigError> {
        self.policy.validate()?;
        let batch = self.batch.ok_or(ConfigError::MissingProcessor)?;

        Ok(Batcher::from_shared(Shared {
            policy: self.policy,
            processors: Processors {
                batch,
                single: self.single,
            },
            slot: Mutex::new(None),
            next_id: AtomicU64::new(0),
        }))
    }
}
