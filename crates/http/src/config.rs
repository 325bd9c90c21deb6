use std::fmt::Debug;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Builder for [`HttpConfig`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct HttpConfigBuilder {
    host: String,
    public_key: String,
    secret_key: String,
    timeout: Option<Duration>,
}

impl HttpConfigBuilder {
    /// Creates a builder with the collector host and the API key pair.
    #[inline]
    pub fn new<S: Into<String>>(host: S, public_key: S, secret_key: S) -> Self {
        Self {
            host: host.into(),
            public_key: public_key.into(),
            secret_key: secret_key.into(),
            timeout: None,
        }
    }

    /// Sets the per-request timeout. Defaults to 10 seconds.
    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> HttpConfig {
        HttpConfig {
            host: self.host.trim_end_matches('/').to_owned(),
            public_key: self.public_key,
            secret_key: self.secret_key,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
        }
    }
}

impl Debug for HttpConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpConfigBuilder")
            .field("host", &self.host)
            .field("public_key", &self.public_key)
            .field("secret_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Configuration for the HTTP collector.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct HttpConfig {
    pub(crate) host: String,
    pub(crate) public_key: String,
    pub(crate) secret_key: String,
    pub(crate) timeout: Duration,
}

impl Debug for HttpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpConfig")
            .field("host", &self.host)
            .field("public_key", &self.public_key)
            .field("secret_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_host_normalization() {
        let config =
            HttpConfigBuilder::new("https://cloud.example.com/", "pk", "sk")
                .build();
        assert_eq!(config.host, "https://cloud.example.com");
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_debug_redacts_the_secret_key() {
        let config =
            HttpConfigBuilder::new("https://cloud.example.com", "pk", "sk")
                .build();
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk"));
        assert!(debug.contains("pk"));
    }
}
