//! An HTTP collector speaking the public ingestion API.

#[macro_use]
extern crate tracing;

mod config;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Response, header};
use tracepost_event::{
    Collector, CollectorError, CreateMediaRequest, ErrorKind, IngestionEvent,
    IngestionMetadata, IngestionRequest, IngestionResponse, MediaUploadSlot,
    MediaUploadStatus,
};

pub use config::{HttpConfig, HttpConfigBuilder};

/// Error type for [`HttpCollector`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl CollectorError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// A collector that ships telemetry to a remote host over HTTPS, using
/// basic auth with the configured API key pair.
#[derive(Clone, Debug)]
pub struct HttpCollector {
    client: Client,
    config: Arc<HttpConfig>,
}

impl HttpCollector {
    /// Creates a new `HttpCollector` with the given configuration.
    #[inline]
    pub fn new(config: HttpConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.config.host)
    }
}

fn transport_error(err: reqwest::Error) -> Error {
    Error::new(format!("{err}"), ErrorKind::Other)
}

/// Maps a non-success status to the error kind the retry layer acts on.
fn check_status(resp: Response) -> Result<Response, Error> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(Error::new(
            format!("collector answered {status}"),
            ErrorKind::from_status(status.as_u16()),
        ))
    }
}

#[async_trait]
impl Collector for HttpCollector {
    type Error = Error;

    async fn ingest(
        &self,
        batch: &[IngestionEvent],
    ) -> Result<(), Self::Error> {
        let req = IngestionRequest {
            batch,
            metadata: IngestionMetadata {
                batch_size: batch.len(),
                sdk_integration: "rust".to_owned(),
                sdk_name: "tracepost".to_owned(),
                sdk_version: env!("CARGO_PKG_VERSION").to_owned(),
                public_key: self.config.public_key.clone(),
            },
        };
        let resp = self
            .client
            .post(self.endpoint("/api/public/ingestion"))
            .basic_auth(&self.config.public_key, Some(&self.config.secret_key))
            .timeout(self.config.timeout)
            .json(&req)
            .send()
            .await
            .map_err(transport_error)?;
        let resp = check_status(resp)?;

        // Per-item failures do not fail the batch; retrying it whole
        // would duplicate the accepted items.
        match resp.json::<IngestionResponse>().await {
            Ok(outcome) if !outcome.errors.is_empty() => {
                warn!(
                    "collector rejected {} of {} events: {:?}",
                    outcome.errors.len(),
                    batch.len(),
                    outcome.errors
                );
            }
            Ok(_) => {}
            Err(err) => debug!("unparsable ingestion response: {err}"),
        }
        Ok(())
    }

    async fn create_media(
        &self,
        req: &CreateMediaRequest,
    ) -> Result<MediaUploadSlot, Self::Error> {
        let resp = self
            .client
            .post(self.endpoint("/api/public/media"))
            .basic_auth(&self.config.public_key, Some(&self.config.secret_key))
            .timeout(self.config.timeout)
            .json(req)
            .send()
            .await
            .map_err(transport_error)?;
        check_status(resp)?
            .json::<MediaUploadSlot>()
            .await
            .map_err(|err| {
                Error::new(
                    format!("unparsable media slot: {err}"),
                    ErrorKind::Other,
                )
            })
    }

    async fn upload_media(
        &self,
        upload_url: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<u16, Self::Error> {
        // The URL is presigned; no auth headers here.
        let resp = self
            .client
            .put(upload_url)
            .header(header::CONTENT_TYPE, content_type)
            .timeout(self.config.timeout)
            .body(bytes)
            .send()
            .await
            .map_err(transport_error)?;
        Ok(resp.status().as_u16())
    }

    async fn patch_media(
        &self,
        media_id: &str,
        status: &MediaUploadStatus,
    ) -> Result<(), Self::Error> {
        let resp = self
            .client
            .patch(self.endpoint(&format!("/api/public/media/{media_id}")))
            .basic_auth(&self.config.public_key, Some(&self.config.secret_key))
            .timeout(self.config.timeout)
            .json(status)
            .send()
            .await
            .map_err(transport_error)?;
        check_status(resp)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collector() -> HttpCollector {
        HttpCollector::new(
            HttpConfigBuilder::new("https://cloud.example.com/", "pk", "sk")
                .build(),
        )
    }

    #[test]
    fn test_endpoints_have_no_double_slashes() {
        let collector = collector();
        assert_eq!(
            collector.endpoint("/api/public/ingestion"),
            "https://cloud.example.com/api/public/ingestion"
        );
        assert_eq!(
            collector.endpoint("/api/public/media/m-1"),
            "https://cloud.example.com/api/public/media/m-1"
        );
    }

    #[test]
    fn test_error_exposes_message_and_kind() {
        let err = Error::new("collector answered 429", ErrorKind::RateLimited);
        assert_eq!(err.message(), "collector answered 429");
        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert!(err.kind().is_retryable());
    }
}
