use thiserror::Error;

/// Boxed source error carried by [`CacheError::RemoteUnavailable`].
pub type RemoteSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error types for cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Key already exists: {key}")]
    AlreadyExists { key: String },

    #[error("Key not found: {key}")]
    NotFound { key: String },

    /// Any failure talking to the remote store. The original error is kept
    /// as the source so callers see it verbatim.
    #[error("Remote store unavailable: {0}")]
    RemoteUnavailable(#[source] RemoteSource),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Value codec error: {0}")]
    Codec(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl CacheError {
    /// Create a new AlreadyExists error
    pub fn already_exists(key: impl Into<String>) -> Self {
        Self::AlreadyExists { key: key.into() }
    }

    /// Create a new NotFound error
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Wrap a remote-store failure
    pub fn remote(source: impl Into<RemoteSource>) -> Self {
        Self::RemoteUnavailable(source.into())
    }

    /// Create a new Precondition error
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    /// Create a new Configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteUnavailable(_))
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::AlreadyExists { .. } => ErrorCategory::Conflict,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::RemoteUnavailable(_) => ErrorCategory::Remote,
            Self::Precondition(_) => ErrorCategory::Precondition,
            Self::Codec(_) => ErrorCategory::Serialization,
            Self::Configuration(_) => ErrorCategory::Configuration,
        }
    }
}

/// Error categories for monitoring and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Conflict,
    NotFound,
    Remote,
    Precondition,
    Serialization,
    Configuration,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Conflict => write!(f, "conflict"),
            Self::NotFound => write!(f, "not_found"),
            Self::Remote => write!(f, "remote"),
            Self::Precondition => write!(f, "precondition"),
            Self::Serialization => write!(f, "serialization"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        Self::remote(err)
    }
}

impl From<deadpool_redis::PoolError> for CacheError {
    fn from(err: deadpool_redis::PoolError) -> Self {
        Self::remote(err)
    }
}

impl From<deadpool_redis::CreatePoolError> for CacheError {
    fn from(err: deadpool_redis::CreatePoolError) -> Self {
        Self::remote(err)
    }
}

impl From<rmp_serde::encode::Error> for CacheError {
    fn from(err: rmp_serde::encode::Error) -> Self {
        Self::Codec(err.to_string())
    }
}

impl From<rmp_serde::decode::Error> for CacheError {
    fn from(err: rmp_serde::decode::Error) -> Self {
        Self::Codec(err.to_string())
    }
}

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = CacheError::already_exists("l2:u:1");
        assert_eq!(err.to_string(), "Key already exists: l2:u:1");
        assert_eq!(err.category(), ErrorCategory::Conflict);

        let err = CacheError::not_found("l2:u:2");
        assert!(err.is_not_found());
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_remote_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = CacheError::remote(io);

        assert!(err.is_remote());
        assert!(err.to_string().contains("refused"));

        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("refused"));
    }

    #[test]
    fn test_category_display() {
        assert_eq!(CacheError::precondition("x").category().to_string(), "precondition");
        assert_eq!(CacheError::configuration("x").category().to_string(), "configuration");
    }
}
