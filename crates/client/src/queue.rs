use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{Notify, watch};
use tokio::time::{Instant, timeout_at};
use tracepost_event::IngestionEvent;

/// A fixed-capacity queue of pending events with a drain barrier.
///
/// `put` never blocks: a full queue sheds the event back to the caller.
/// An unfinished counter tracks events pushed but not yet acknowledged
/// with [`BoundedQueue::done`]; [`BoundedQueue::join`] waits until it
/// reaches zero. Work that arrives while a flusher is already parked is
/// still counted, since the counter only hits zero when the queue has
/// genuinely drained.
pub(crate) struct BoundedQueue {
    items: Mutex<VecDeque<IngestionEvent>>,
    capacity: usize,
    readable: Notify,
    unfinished: watch::Sender<usize>,
}

impl BoundedQueue {
    pub fn new(capacity: usize) -> Self {
        let (unfinished, _) = watch::channel(0);
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            readable: Notify::new(),
            unfinished,
        }
    }

    fn items(&self) -> MutexGuard<'_, VecDeque<IngestionEvent>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attempts to enqueue an event without blocking. Returns `false`
    /// when the queue is at capacity.
    pub fn put(&self, event: IngestionEvent) -> bool {
        {
            let mut items = self.items();
            if items.len() >= self.capacity {
                return false;
            }
            items.push_back(event);
            self.unfinished.send_modify(|n| *n += 1);
        }
        self.readable.notify_one();
        true
    }

    /// Pulls one event, waiting up to `timeout` for one to arrive.
    pub async fn get(&self, timeout: Duration) -> Option<IngestionEvent> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(event) = self.items().pop_front() {
                return Some(event);
            }
            if timeout_at(deadline, self.readable.notified())
                .await
                .is_err()
            {
                return None;
            }
        }
    }

    /// Acknowledges one pulled event as fully processed, successfully
    /// or not.
    pub fn done(&self) {
        self.unfinished.send_modify(|n| *n = n.saturating_sub(1));
    }

    /// Waits until every event put so far (and while waiting) has been
    /// acknowledged.
    pub async fn join(&self) {
        let mut unfinished = self.unfinished.subscribe();
        // The sender lives in self, so the channel never closes.
        unfinished.wait_for(|n| *n == 0).await.ok();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.items().len()
    }
}
