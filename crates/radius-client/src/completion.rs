//! Single-settlement completion handle
//!
//! Each exchange owns one [`CompletionHandle`]. The response router, the
//! retry timer and the caller may all try to settle it; the first call to
//! [`CompletionHandle::try_succeed`] or [`CompletionHandle::try_fail`] wins
//! and every later attempt is a no-op returning `false`. The outcome is
//! delivered to the [`Completion`] future held by the caller.

use crate::error::ClientError;
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};
use tokio::sync::oneshot;

type Outcome<T> = Result<T, ClientError>;

struct Inner<T> {
    settled: AtomicBool,
    sender: Mutex<Option<oneshot::Sender<Outcome<T>>>>,
}

/// Settling side of an exchange; cheap to clone
pub struct CompletionHandle<T> {
    inner: Arc<Inner<T>>,
}

impl<T> CompletionHandle<T> {
    /// Create a handle and the future that resolves when it settles.
    pub fn new() -> (CompletionHandle<T>, Completion<T>) {
        let (sender, receiver) = oneshot::channel();
        let handle = CompletionHandle {
            inner: Arc::new(Inner {
                settled: AtomicBool::new(false),
                sender: Mutex::new(Some(sender)),
            }),
        };
        (handle, Completion { receiver })
    }

    /// Settle with a value. Returns whether this call performed the settlement.
    pub fn try_succeed(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Settle with an error. Returns whether this call performed the settlement.
    pub fn try_fail(&self, error: ClientError) -> bool {
        self.settle(Err(error))
    }

    /// Abort the exchange.
    pub fn cancel(&self) -> bool {
        self.try_fail(ClientError::Cancelled)
    }

    pub fn is_settled(&self) -> bool {
        self.inner.settled.load(Ordering::Acquire)
    }

    fn settle(&self, outcome: Outcome<T>) -> bool {
        if self
            .inner
            .settled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        if let Some(sender) = self.inner.sender.lock().take() {
            // The caller may have stopped waiting
            let _ = sender.send(outcome);
        }
        true
    }
}

impl<T> Clone for CompletionHandle<T> {
    fn clone(&self) -> Self {
        CompletionHandle {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for CompletionHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionHandle")
            .field("settled", &self.is_settled())
            .finish()
    }
}

/// Receiving side of a [`CompletionHandle`]
///
/// Resolves to [`ClientError::Closed`] if every handle is dropped unsettled.
#[derive(Debug)]
pub struct Completion<T> {
    receiver: oneshot::Receiver<Outcome<T>>,
}

impl<T> Future for Completion<T> {
    type Output = Outcome<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(ClientError::Closed)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn test_first_settlement_wins() {
        let (handle, completion) = CompletionHandle::<u32>::new();
        assert!(!handle.is_settled());

        assert!(handle.try_succeed(7));
        assert!(handle.is_settled());
        assert!(!handle.try_succeed(8));
        assert!(!handle.try_fail(ClientError::RetryExhausted(3)));
        assert!(!handle.cancel());

        assert_eq!(completion.await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_failure_delivered() {
        let (handle, completion) = CompletionHandle::<u32>::new();
        assert!(handle.try_fail(ClientError::RetryExhausted(3)));
        assert!(!handle.try_succeed(1));

        assert!(matches!(
            completion.await,
            Err(ClientError::RetryExhausted(3))
        ));
    }

    #[tokio::test]
    async fn test_dropped_handles_close_completion() {
        let (handle, completion) = CompletionHandle::<u32>::new();
        let clone = handle.clone();
        drop(handle);
        drop(clone);

        assert!(matches!(completion.await, Err(ClientError::Closed)));
    }

    #[test]
    fn test_settle_after_receiver_dropped() {
        let (handle, completion) = CompletionHandle::<u32>::new();
        drop(completion);
        assert!(handle.try_succeed(1));
        assert!(handle.is_settled());
    }

    #[test]
    fn test_concurrent_settlement_has_one_winner() {
        let (handle, _completion) = CompletionHandle::<usize>::new();
        let winners = Arc::new(AtomicUsize::new(0));

        let threads: Vec<_> = (0..8)
            .map(|i| {
                let handle = handle.clone();
                let winners = Arc::clone(&winners);
                std::thread::spawn(move || {
                    if handle.try_succeed(i) {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }

        assert_eq!(winners.load(Ordering::SeqCst), 1);
    }
}
