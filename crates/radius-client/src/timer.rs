//! Shared timing service
//!
//! One driver task owns a min-heap of `(deadline, callback)` entries and
//! runs each callback when its deadline passes. Any number of exchanges
//! register one-shot callbacks concurrently through a [`TimerService`].
//! Callbacks run on the driver task and must not block.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, trace};

/// Callback run once when a timer fires
pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// Registration receipt for a scheduled callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle {
    id: u64,
    deadline: Instant,
}

impl TimerHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    #[cfg(test)]
    pub(crate) fn for_test(id: u64, delay: Duration) -> Self {
        TimerHandle {
            id,
            deadline: Instant::now() + delay,
        }
    }
}

/// One-shot delayed callback scheduling
pub trait Timer: Send + Sync {
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle;
}

struct TimerEntry {
    deadline: Instant,
    id: u64,
    callback: TimerCallback,
}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.id == other.id
    }
}

impl Eq for TimerEntry {}

impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: earliest deadline first, then registration order
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Tokio-backed [`Timer`] with a single driver task
///
/// The driver stops once every `TimerService` clone is dropped and all
/// pending callbacks have fired.
#[derive(Clone)]
pub struct TimerService {
    sender: mpsc::UnboundedSender<TimerEntry>,
    next_id: Arc<AtomicU64>,
}

impl TimerService {
    /// Spawn the driver task on the current tokio runtime.
    pub fn spawn() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(drive(receiver));
        TimerService {
            sender,
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl Timer for TimerService {
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let id = self.next_id.fetch_add(1, AtomicOrdering::Relaxed);
        let deadline = Instant::now() + delay;

        // The driver only exits after every sender is gone
        let _ = self.sender.send(TimerEntry {
            deadline,
            id,
            callback,
        });
        trace!(timer_id = id, delay_ms = delay.as_millis() as u64, "Timer scheduled");

        TimerHandle { id, deadline }
    }
}

impl std::fmt::Debug for TimerService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerService")
            .field("scheduled", &self.next_id.load(AtomicOrdering::Relaxed))
            .finish()
    }
}

async fn drive(mut receiver: mpsc::UnboundedReceiver<TimerEntry>) {
    let mut heap: BinaryHeap<TimerEntry> = BinaryHeap::new();
    let mut open = true;

    while open || !heap.is_empty() {
        let next_deadline = heap.peek().map(|entry| entry.deadline);

        tokio::select! {
            entry = receiver.recv(), if open => match entry {
                Some(entry) => heap.push(entry),
                None => open = false,
            },
            _ = sleep_until(next_deadline.unwrap_or_else(Instant::now)), if next_deadline.is_some() => {
                let now = Instant::now();
                while heap.peek().is_some_and(|entry| entry.deadline <= now) {
                    if let Some(entry) = heap.pop() {
                        trace!(timer_id = entry.id, "Timer fired");
                        (entry.callback)();
                    }
                }
            }
        }
    }

    debug!("Timer service stopped");
}
