//! Retry scheduling
//!
//! Each in-flight exchange moves through
//! `PENDING -> (RETRY_SCHEDULED -> PENDING)* -> SETTLED`. After every send
//! the transport calls [`RetryScheduler::schedule_retry`], which arms one
//! timer. When the timer fires it looks at the exchange's completion handle:
//!
//! - already settled (response arrived, or the caller aborted): do nothing
//! - `attempt >= max_attempts`: settle with [`ClientError::RetryExhausted`]
//! - otherwise: run the send action again, which schedules the next retry
//!
//! There is no cancel entry point; settling the handle is the only way to
//! stop an exchange, and it is observed when the timer fires.

use crate::completion::CompletionHandle;
use crate::error::ClientError;
use crate::timer::{Timer, TimerHandle};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{trace, warn};

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Number of sends before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Wait after each send before retrying, in milliseconds
    #[serde(default = "default_retry_wait_ms")]
    pub retry_wait_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_wait_ms() -> u64 {
    3000
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            max_attempts: default_max_attempts(),
            retry_wait_ms: default_retry_wait_ms(),
        }
    }
}

impl RetryConfig {
    pub fn retry_wait(&self) -> Duration {
        Duration::from_millis(self.retry_wait_ms)
    }
}

/// Timer-driven retry policy shared by all exchanges of a client
pub struct RetryScheduler {
    timer: Arc<dyn Timer>,
    max_attempts: u32,
    retry_wait: Duration,
}

impl RetryScheduler {
    pub fn new(timer: Arc<dyn Timer>, config: &RetryConfig) -> Self {
        RetryScheduler {
            timer,
            max_attempts: config.max_attempts,
            retry_wait: config.retry_wait(),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn retry_wait(&self) -> Duration {
        self.retry_wait
    }

    /// Arm the retry timer for send number `attempt` (counting from 1).
    ///
    /// Failures are delivered through `handle`, never returned.
    pub fn schedule_retry<T, F>(
        &self,
        retry: F,
        attempt: u32,
        handle: CompletionHandle<T>,
    ) -> TimerHandle
    where
        T: Send + 'static,
        F: FnOnce() + Send + 'static,
    {
        let max_attempts = self.max_attempts;

        self.timer.schedule(
            self.retry_wait,
            Box::new(move || {
                if handle.is_settled() {
                    trace!(attempt, "Exchange settled, retry skipped");
                    return;
                }

                if attempt >= max_attempts {
                    if handle.try_fail(ClientError::RetryExhausted(max_attempts)) {
                        warn!(max_attempts, "No response, giving up");
                    }
                    return;
                }

                trace!(attempt = attempt + 1, max_attempts, "Retrying");
                retry();
            }),
        )
    }
}

impl std::fmt::Debug for RetryScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryScheduler")
            .field("max_attempts", &self.max_attempts)
            .field("retry_wait", &self.retry_wait)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::Completion;
    use crate::timer::TimerCallback;
    use parking_lot::Mutex;
    use std::future::Future;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::task::{Context, Poll, Waker};

    /// Timer that only fires when the test says so
    #[derive(Default)]
    struct ManualTimer {
        pending: Mutex<Vec<TimerCallback>>,
        armed: AtomicU32,
    }

    impl ManualTimer {
        fn armed(&self) -> u32 {
            self.armed.load(Ordering::SeqCst)
        }

        fn outstanding(&self) -> usize {
            self.pending.lock().len()
        }

        /// Fire every outstanding timer, returning how many ran.
        fn fire_all(&self) -> usize {
            let callbacks: Vec<_> = self.pending.lock().drain(..).collect();
            let count = callbacks.len();
            for callback in callbacks {
                callback();
            }
            count
        }
    }

    impl Timer for ManualTimer {
        fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
            let id = self.armed.fetch_add(1, Ordering::SeqCst) as u64;
            self.pending.lock().push(callback);
            TimerHandle::for_test(id, delay)
        }
    }

    fn poll_now<T>(completion: &mut Completion<T>) -> Poll<Result<T, ClientError>> {
        let mut cx = Context::from_waker(Waker::noop());
        std::pin::Pin::new(completion).poll(&mut cx)
    }

    /// Send action that never gets a response and always re-arms the retry
    fn send(
        scheduler: Arc<RetryScheduler>,
        handle: CompletionHandle<()>,
        sends: Arc<AtomicU32>,
        attempt: u32,
    ) {
        sends.fetch_add(1, Ordering::SeqCst);
        let next = {
            let scheduler = Arc::clone(&scheduler);
            let handle = handle.clone();
            let sends = Arc::clone(&sends);
            move || send(scheduler, handle, sends, attempt + 1)
        };
        scheduler.schedule_retry(next, attempt, handle);
    }

    fn setup(max_attempts: u32) -> (Arc<ManualTimer>, Arc<RetryScheduler>) {
        let timer = Arc::new(ManualTimer::default());
        let config = RetryConfig {
            max_attempts,
            retry_wait_ms: 10,
        };
        let scheduler = Arc::new(RetryScheduler::new(timer.clone(), &config));
        (timer, scheduler)
    }

    #[test]
    fn test_retry_exhaustion() {
        let (timer, scheduler) = setup(3);
        let (handle, mut completion) = CompletionHandle::<()>::new();
        let sends = Arc::new(AtomicU32::new(0));

        send(scheduler, handle.clone(), Arc::clone(&sends), 1);
        assert_eq!(timer.armed(), 1);

        // First and second timers re-send
        assert_eq!(timer.fire_all(), 1);
        assert_eq!(timer.fire_all(), 1);
        assert_eq!(sends.load(Ordering::SeqCst), 3);
        assert_eq!(timer.armed(), 3);
        assert!(!handle.is_settled());

        // Third timer settles with exhaustion and arms nothing
        assert_eq!(timer.fire_all(), 1);
        assert!(handle.is_settled());
        assert_eq!(timer.armed(), 3);
        assert_eq!(timer.outstanding(), 0);
        assert_eq!(sends.load(Ordering::SeqCst), 3);

        match poll_now(&mut completion) {
            Poll::Ready(Err(ClientError::RetryExhausted(3))) => {}
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_settled_exchange_suppresses_retry() {
        let (timer, scheduler) = setup(3);
        let (handle, mut completion) = CompletionHandle::<()>::new();
        let sends = Arc::new(AtomicU32::new(0));

        send(scheduler, handle.clone(), Arc::clone(&sends), 1);
        assert_eq!(timer.outstanding(), 1);

        // Response arrives before the timer fires
        assert!(handle.try_succeed(()));
        assert_eq!(timer.fire_all(), 1);

        assert_eq!(sends.load(Ordering::SeqCst), 1);
        assert_eq!(timer.armed(), 1);
        assert!(matches!(poll_now(&mut completion), Poll::Ready(Ok(()))));
    }

    #[test]
    fn test_cancelled_exchange_keeps_its_outcome() {
        let (timer, scheduler) = setup(1);
        let (handle, mut completion) = CompletionHandle::<()>::new();
        let sends = Arc::new(AtomicU32::new(0));

        send(scheduler, handle.clone(), Arc::clone(&sends), 1);
        assert!(handle.cancel());
        timer.fire_all();

        assert!(matches!(
            poll_now(&mut completion),
            Poll::Ready(Err(ClientError::Cancelled))
        ));
    }

    #[test]
    fn test_single_attempt_exhausts_on_first_timer() {
        let (timer, scheduler) = setup(1);
        let (handle, mut completion) = CompletionHandle::<()>::new();
        let sends = Arc::new(AtomicU32::new(0));

        send(scheduler, handle, Arc::clone(&sends), 1);
        timer.fire_all();

        assert_eq!(sends.load(Ordering::SeqCst), 1);
        assert_eq!(timer.armed(), 1);
        assert!(matches!(
            poll_now(&mut completion),
            Poll::Ready(Err(ClientError::RetryExhausted(1)))
        ));
    }

    #[test]
    fn test_retry_config_defaults() {
        let config: RetryConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, RetryConfig::default());
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.retry_wait(), Duration::from_secs(3));
    }
}
