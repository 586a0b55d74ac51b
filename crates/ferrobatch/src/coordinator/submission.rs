use core::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use futures::channel::oneshot;

use crate::{Error, Result};

/// The pending result of one [`Batcher::submit`](crate::Batcher::submit)
/// call.
///
/// Resolves to the result the processor produced at this item's position, or
/// to the error its batch failed with. Dropping a `Submission` does not take
/// the item back out of its batch; the result is simply discarded.
#[must_use = "futures do nothing unless you `.await` or poll them"]
#[derive(Debug)]
pub struct Submission<R, E> {
    rx: oneshot::Receiver<Result<R, E>>,
}

impl<R, E> Submission<R, E> {
    pub(crate) fn new(rx: oneshot::Receiver<Result<R, E>>) -> Self {
        Self { rx }
    }
}

impl<R, E> Future for Submission<R, E> {
    type Output = Result<R, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|delivered| delivered.unwrap_or(Err(Error::Abandoned)))
    }
}
