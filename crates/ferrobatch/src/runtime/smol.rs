use core::{future::Future, pin::Pin, time::Duration};
use smol::Timer;

use crate::{Batcher, Runtime, SleepProvider};

/// An implementation of [`Runtime`] using Smol's timer and global executor.
///
/// Spawned tasks are detached onto `smol`'s global executor, which drives
/// them on its own threads.
#[derive(Clone, Copy, Debug, Default)]
pub struct SmolRuntime;

impl SleepProvider for SmolRuntime {
    /// Smol's `Timer` resolves to an `Instant`, so it is wrapped in a boxed
    /// future that discards it.
    type Sleep = Pin<Box<dyn Future<Output = ()> + Send>>;

    fn sleep_for(dur: Duration) -> Self::Sleep {
        Box::pin(async move {
            Timer::after(dur).await;
        })
    }
}

impl Runtime for SmolRuntime {
    fn spawn<F>(fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        smol::spawn(fut).detach();
    }
}

/// A [`Batcher`] running on [`SmolRuntime`].
pub type SmolBatcher<T, R, E> = Batcher<T, R, E, SmolRuntime>;
