use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::{ApiError, Result};

/// A handle on an outbound request.
///
/// The work is spawned onto the tokio runtime when the future is created, so
/// the request runs to completion even if the caller drops the handle without
/// awaiting it. Awaiting yields whatever the API reported.
pub struct MatrixFuture<T> {
    receiver: oneshot::Receiver<Result<T>>,
    _task: Option<JoinHandle<()>>,
}

impl<T> MatrixFuture<T> {
    /// Create a new MatrixFuture by spawning a task that will execute the given future.
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();

        let task = tokio::spawn(async move {
            let result = future.await;
            let _ = sender.send(result);
        });

        Self {
            receiver,
            _task: Some(task),
        }
    }

    /// Create a MatrixFuture that is already resolved.
    ///
    /// Does not require a running runtime.
    pub fn ready(result: Result<T>) -> Self {
        let (sender, receiver) = oneshot::channel();
        let _ = sender.send(result);

        Self {
            receiver,
            _task: None,
        }
    }
}

impl<T> Future for MatrixFuture<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            // sender dropped: the spawned task panicked or was cancelled
            Poll::Ready(Err(_)) => Poll::Ready(Err(ApiError::TaskClosed.into())),
            Poll::Pending => Poll::Pending,
        }
    }
}
