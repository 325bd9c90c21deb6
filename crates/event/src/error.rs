/// The kind of failure reported by a collector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The collector rejected the payload; replaying it cannot succeed.
    Rejected,
    /// The collector is rate limited.
    RateLimited,
    /// Any other failure (server error, network, timeout).
    Other,
}

impl ErrorKind {
    /// Classifies an HTTP status code.
    ///
    /// 429 is rate limiting, any other 4xx is a permanent rejection,
    /// and everything else (5xx, unknown) is treated as transient.
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => ErrorKind::RateLimited,
            400..=499 => ErrorKind::Rejected,
            _ => ErrorKind::Other,
        }
    }

    /// Whether an operation failing with this kind may succeed on replay.
    #[inline]
    pub fn is_retryable(self) -> bool {
        !matches!(self, ErrorKind::Rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(ErrorKind::from_status(429), ErrorKind::RateLimited);
        assert_eq!(ErrorKind::from_status(400), ErrorKind::Rejected);
        assert_eq!(ErrorKind::from_status(404), ErrorKind::Rejected);
        assert_eq!(ErrorKind::from_status(500), ErrorKind::Other);
        assert_eq!(ErrorKind::from_status(503), ErrorKind::Other);
    }

    #[test]
    fn test_only_rejections_are_permanent() {
        assert!(!ErrorKind::Rejected.is_retryable());
        assert!(ErrorKind::RateLimited.is_retryable());
        assert!(ErrorKind::Other.is_retryable());
    }
}
