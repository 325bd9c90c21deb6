use std::error::Error;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Semaphore, watch};
use tracepost_event::{Collector, IngestionEvent};
use tracing::Instrument;

use crate::consumer::Consumer;
use crate::media::MediaExtractor;
use crate::options::Options;
use crate::queue::BoundedQueue;
use crate::wait_group::WaitGroup;

/// An error returned when the event queue is at capacity and the event
/// was shed.
pub struct QueueFullError;

impl Debug for QueueFullError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueFullError").finish()
    }
}

impl Display for QueueFullError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("the event queue is full")
    }
}

impl Error for QueueFullError {}

/// Owns the pipeline: the event queue, the batch-upload workers and the
/// in-flight media uploads.
///
/// The collector is erased here; workers hold their own handles to it,
/// so the facade above stays non-generic.
pub(crate) struct TaskManager {
    queue: Arc<BoundedQueue>,
    media_uploads: WaitGroup,
    kill_tx: watch::Sender<bool>,
}

impl TaskManager {
    /// Spawns the configured number of batch workers against `collector`.
    pub fn new<C: Collector + 'static>(
        collector: C,
        options: Options,
    ) -> Self {
        let options = Arc::new(options);
        let collector = Arc::new(collector);
        let queue = Arc::new(BoundedQueue::new(options.max_queue_size));
        let media_uploads = WaitGroup::new();
        let permits = Arc::new(Semaphore::new(options.media_concurrency));
        let (kill_tx, kill_rx) = watch::channel(false);

        for worker in 0..options.threads {
            let media = MediaExtractor::new(
                Arc::clone(&collector),
                media_uploads.clone(),
                Arc::clone(&permits),
                options.max_retry,
            );
            let consumer = Consumer::new(
                Arc::clone(&queue),
                Arc::clone(&collector),
                media,
                Arc::clone(&options),
                kill_rx.clone(),
            );
            tokio::spawn(
                consumer
                    .run()
                    .instrument(trace_span!("consumer", worker)),
            );
        }

        Self {
            queue,
            media_uploads,
            kill_tx,
        }
    }

    /// Stamps and enqueues one event without blocking. A full queue
    /// sheds the event and reports it back to the caller.
    pub fn push(
        &self,
        mut event: IngestionEvent,
    ) -> Result<(), QueueFullError> {
        event.timestamp = Utc::now();
        if self.queue.put(event) {
            Ok(())
        } else {
            Err(QueueFullError)
        }
    }

    /// Waits until every event pushed so far has been uploaded or
    /// dropped, including the media uploads those events spawned.
    pub async fn flush(&self) {
        self.queue.join().await;
        self.media_uploads.wait().await;
    }

    /// Flushes, then tells the workers to stop.
    pub async fn shutdown(&self) {
        self.flush().await;
        self.kill_tx.send(true).ok();
    }
}
