use std::fmt::{self, Debug};
use std::sync::Arc;
use std::time::Duration;

/// Masking callback applied to serialized input/output fields right
/// before upload, e.g. to strip PII.
pub type MaskFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

pub(crate) const DEFAULT_THREADS: usize = 1;
pub(crate) const DEFAULT_MAX_QUEUE_SIZE: usize = 100;
pub(crate) const DEFAULT_FLUSH_AT: usize = 15;
pub(crate) const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(500);
pub(crate) const DEFAULT_MAX_RETRY: u32 = 3;
pub(crate) const DEFAULT_MEDIA_CONCURRENCY: usize = 8;
pub(crate) const DEFAULT_CLEARED_MESSAGE: &str = "<cleared due to size limit>";

/// Tuning knobs for the ingestion pipeline.
#[derive(Clone)]
pub struct Options {
    pub(crate) threads: usize,
    pub(crate) max_queue_size: usize,
    pub(crate) flush_at: usize,
    pub(crate) flush_interval: Duration,
    pub(crate) sample_rate: Option<f64>,
    pub(crate) max_retry: u32,
    pub(crate) media_concurrency: usize,
    pub(crate) cleared_message: String,
    pub(crate) mask: Option<MaskFn>,
}

impl Default for Options {
    fn default() -> Self {
        OptionsBuilder::new().build()
    }
}

impl Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("threads", &self.threads)
            .field("max_queue_size", &self.max_queue_size)
            .field("flush_at", &self.flush_at)
            .field("flush_interval", &self.flush_interval)
            .field("sample_rate", &self.sample_rate)
            .field("max_retry", &self.max_retry)
            .field("media_concurrency", &self.media_concurrency)
            .field("cleared_message", &self.cleared_message)
            .field("mask", &self.mask.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Builder for [`Options`].
#[derive(Clone, Default)]
pub struct OptionsBuilder {
    threads: Option<usize>,
    max_queue_size: Option<usize>,
    flush_at: Option<usize>,
    flush_interval: Option<Duration>,
    sample_rate: Option<f64>,
    max_retry: Option<u32>,
    media_concurrency: Option<usize>,
    cleared_message: Option<String>,
    mask: Option<MaskFn>,
}

impl OptionsBuilder {
    /// Creates a builder with every knob at its default.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of concurrent batch-upload workers. Defaults to 1; values
    /// below 1 are clamped up.
    #[inline]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Capacity of the event queue. Defaults to 100. When the queue is
    /// full, new events are dropped (and logged), never blocked on.
    #[inline]
    pub fn with_max_queue_size(mut self, max_queue_size: usize) -> Self {
        self.max_queue_size = Some(max_queue_size);
        self
    }

    /// Number of events that triggers a batch upload. Defaults to 15.
    #[inline]
    pub fn with_flush_at(mut self, flush_at: usize) -> Self {
        self.flush_at = Some(flush_at);
        self
    }

    /// Time budget for assembling one batch. Defaults to 500 ms.
    #[inline]
    pub fn with_flush_interval(mut self, flush_interval: Duration) -> Self {
        self.flush_interval = Some(flush_interval);
        self
    }

    /// Fraction of traces to keep, in `(0, 1)`. Values outside that
    /// interval (and the default of no rate) keep everything.
    #[inline]
    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = Some(sample_rate);
        self
    }

    /// Retries per batch upload after the first attempt. Defaults to 3.
    #[inline]
    pub fn with_max_retry(mut self, max_retry: u32) -> Self {
        self.max_retry = Some(max_retry);
        self
    }

    /// Cap on concurrent media-blob uploads. Defaults to 8.
    #[inline]
    pub fn with_media_concurrency(mut self, media_concurrency: usize) -> Self {
        self.media_concurrency = Some(media_concurrency);
        self
    }

    /// Text written into fields cleared by the per-event size limit.
    #[inline]
    pub fn with_cleared_message<S: Into<String>>(mut self, message: S) -> Self {
        self.cleared_message = Some(message.into());
        self
    }

    /// Masking callback applied to input/output fields before upload.
    #[inline]
    pub fn with_mask(mut self, mask: MaskFn) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Builds the options.
    pub fn build(self) -> Options {
        Options {
            threads: self.threads.unwrap_or(DEFAULT_THREADS).max(1),
            max_queue_size: self
                .max_queue_size
                .unwrap_or(DEFAULT_MAX_QUEUE_SIZE)
                .max(1),
            flush_at: self.flush_at.unwrap_or(DEFAULT_FLUSH_AT).max(1),
            flush_interval: self
                .flush_interval
                .unwrap_or(DEFAULT_FLUSH_INTERVAL),
            sample_rate: self.sample_rate,
            max_retry: self.max_retry.unwrap_or(DEFAULT_MAX_RETRY),
            media_concurrency: self
                .media_concurrency
                .unwrap_or(DEFAULT_MEDIA_CONCURRENCY)
                .max(1),
            cleared_message: self
                .cleared_message
                .unwrap_or_else(|| DEFAULT_CLEARED_MESSAGE.to_owned()),
            mask: self.mask,
        }
    }
}

impl Debug for OptionsBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionsBuilder")
            .field("threads", &self.threads)
            .field("flush_at", &self.flush_at)
            .field("mask", &self.mask.as_ref().map(|_| "<fn>"))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert_eq!(options.threads, 1);
        assert_eq!(options.max_queue_size, 100);
        assert_eq!(options.flush_at, 15);
        assert_eq!(options.flush_interval, Duration::from_millis(500));
        assert_eq!(options.sample_rate, None);
        assert_eq!(options.max_retry, 3);
        assert_eq!(options.media_concurrency, 8);
        assert!(options.mask.is_none());
    }

    #[test]
    fn test_zero_threads_is_clamped_to_one() {
        let options = OptionsBuilder::new().with_threads(0).build();
        assert_eq!(options.threads, 1);
    }
}
