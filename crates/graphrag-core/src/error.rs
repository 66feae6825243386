//! Error types for graphrag operations.
//!
//! The error hierarchy carries structured error codes so callers can react
//! programmatically (retry transient LLM failures, surface configuration
//! problems immediately).

use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for graphrag operations.
pub type GraphRagResult<T> = Result<T, GraphRagError>;

/// Main error type for all graphrag operations.
#[derive(Error, Debug)]
pub enum GraphRagError {
    /// Configuration error (missing credentials, bad config file).
    /// Raised at provider construction, before any network call.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Input validation failed (empty texts, empty entity type set).
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        code: ErrorCode,
        details: HashMap<String, String>,
    },

    /// LLM completion failed (provider error, timeout, empty response).
    #[error("LLM error: {message}")]
    Llm {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Malformed LLM output that could not be parsed.
    #[error("Parse error: {message}")]
    Parse { message: String, code: ErrorCode },

    /// Graph store operation failed.
    #[error("Graph store error: {message}")]
    GraphStore {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Rate limit exceeded on the completion provider.
    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        message: String,
        code: ErrorCode,
        retry_after: Option<u64>,
    },

    /// Provider not supported (feature not enabled or unknown variant).
    #[error("Provider not supported: {provider}")]
    UnsupportedProvider { provider: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Validation (VAL_xxx)
    ValInvalidInput,
    ValEmptyTexts,
    ValEmptyEntityTypes,

    // LLM (LLM_xxx)
    LlmConnectionFailed,
    LlmGenerationFailed,
    LlmEmptyResponse,
    LlmTimeout,

    // Parse (PARSE_xxx)
    ParseMalformedRecord,
    ParseInvalidResponse,

    // Graph (GRP_xxx)
    GrpConnectionFailed,
    GrpQueryFailed,

    // Rate limit (RATE_xxx)
    RateLimitExceeded,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValInvalidInput => "VAL_001",
            ErrorCode::ValEmptyTexts => "VAL_002",
            ErrorCode::ValEmptyEntityTypes => "VAL_003",
            ErrorCode::LlmConnectionFailed => "LLM_001",
            ErrorCode::LlmGenerationFailed => "LLM_002",
            ErrorCode::LlmEmptyResponse => "LLM_003",
            ErrorCode::LlmTimeout => "LLM_004",
            ErrorCode::ParseMalformedRecord => "PARSE_001",
            ErrorCode::ParseInvalidResponse => "PARSE_002",
            ErrorCode::GrpConnectionFailed => "GRP_001",
            ErrorCode::GrpQueryFailed => "GRP_002",
            ErrorCode::RateLimitExceeded => "RATE_001",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl GraphRagError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValInvalidInput,
            details: HashMap::new(),
        }
    }

    /// Create a validation error with a specific code.
    pub fn validation_with_code(message: impl Into<String>, code: ErrorCode) -> Self {
        Self::Validation {
            message: message.into(),
            code,
            details: HashMap::new(),
        }
    }

    /// Create an LLM error.
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm {
            message: message.into(),
            code: ErrorCode::LlmGenerationFailed,
            source: None,
        }
    }

    /// Create an LLM timeout error (transient).
    pub fn llm_timeout(message: impl Into<String>) -> Self {
        Self::Llm {
            message: message.into(),
            code: ErrorCode::LlmTimeout,
            source: None,
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            code: ErrorCode::ParseInvalidResponse,
        }
    }

    /// Create a graph store error.
    pub fn graph_store(message: impl Into<String>) -> Self {
        Self::GraphStore {
            message: message.into(),
            code: ErrorCode::GrpQueryFailed,
            source: None,
        }
    }

    /// Create a graph store connection error.
    pub fn graph_connection(message: impl Into<String>) -> Self {
        Self::GraphStore {
            message: message.into(),
            code: ErrorCode::GrpConnectionFailed,
            source: None,
        }
    }

    /// Create a rate limit error (transient).
    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::RateLimit {
            message: message.into(),
            code: ErrorCode::RateLimitExceeded,
            retry_after: None,
        }
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { code, .. } => *code,
            Self::Llm { code, .. } => *code,
            Self::Parse { code, .. } => *code,
            Self::GraphStore { code, .. } => *code,
            Self::RateLimit { code, .. } => *code,
            _ => ErrorCode::Internal,
        }
    }

    /// Whether this failure is worth retrying with backoff.
    ///
    /// Timeouts and rate limits are transient; everything else is treated as
    /// permanent for the affected unit and gets skipped instead.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.code(),
            ErrorCode::LlmTimeout | ErrorCode::LlmConnectionFailed | ErrorCode::RateLimitExceeded
        )
    }
}
