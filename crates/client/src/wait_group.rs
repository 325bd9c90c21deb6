use std::sync::Arc;

use tokio::sync::watch;

/// A panic-safe countdown barrier for detached tasks.
///
/// Each task holds a [`WaitGuard`]; the count drops when the guard is
/// dropped, even if the task panicked, so a flusher waiting on the
/// group can never deadlock. Work registered while a waiter is already
/// parked is still counted.
#[derive(Clone)]
pub(crate) struct WaitGroup {
    counter: Arc<watch::Sender<usize>>,
}

impl WaitGroup {
    pub fn new() -> Self {
        let (counter, _) = watch::channel(0);
        Self {
            counter: Arc::new(counter),
        }
    }

    /// Registers one unit of work.
    pub fn guard(&self) -> WaitGuard {
        self.counter.send_modify(|n| *n += 1);
        WaitGuard {
            counter: Arc::clone(&self.counter),
        }
    }

    /// Waits until all registered work has finished.
    pub async fn wait(&self) {
        let mut count = self.counter.subscribe();
        // The sender is shared via Arc, so the channel never closes
        // while self is alive.
        count.wait_for(|n| *n == 0).await.ok();
    }
}

pub(crate) struct WaitGuard {
    counter: Arc<watch::Sender<usize>>,
}

impl Drop for WaitGuard {
    fn drop(&mut self) {
        self.counter.send_modify(|n| *n = n.saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wait_with_no_work_returns_immediately() {
        WaitGroup::new().wait().await;
    }

    #[tokio::test]
    async fn test_wait_blocks_until_guards_drop() {
        let group = WaitGroup::new();
        let guard = group.guard();

        let task = tokio::spawn({
            let group = group.clone();
            async move { group.wait().await }
        });
        tokio::task::yield_now().await;
        assert!(!task.is_finished());

        drop(guard);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_panicking_task_still_releases_its_guard() {
        let group = WaitGroup::new();
        let guard = group.guard();

        let task = tokio::spawn(async move {
            let _guard = guard;
            panic!("boom");
        });
        assert!(task.await.is_err());
        group.wait().await;
    }
}
