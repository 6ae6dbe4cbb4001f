use thiserror::Error;

/// Main error type for the TON transaction notifier
#[derive(Error, Debug)]
pub enum NotifierError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised while reading the account transaction history
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network failure: {0}")]
    Network(#[source] reqwest::Error),

    #[error("API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("HTTP client construction failed: {0}")]
    Client(#[source] reqwest::Error),
}

/// Malformed data, either on disk or over the wire
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Malformed ledger file {path}: {source}")]
    Ledger {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed API payload: {0}")]
    Payload(#[source] serde_json::Error),
}

/// Message delivery errors
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Network failure: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Message rejected with status {status}: {description}")]
    Rejected { status: u16, description: String },

    #[error("Authentication failed")]
    Authentication,

    #[error("HTTP client construction failed: {0}")]
    Client(#[source] reqwest::Error),
}

/// Ledger persistence errors
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("I/O failure on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("Ledger serialization failed: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Configuration parsing failed: {0}")]
    Parsing(String),

    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, NotifierError>;

/// Error severity levels for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// The process cannot start or keep its guarantees
    Critical,
    /// A step of the current cycle was forfeited
    High,
    /// Transient, expected to clear on a later cycle
    Medium,
    /// Informational
    Low,
}

impl NotifierError {
    /// Get the severity level of an error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            NotifierError::Config(_) => ErrorSeverity::Critical,
            NotifierError::Notify(NotifyError::Authentication) => ErrorSeverity::Critical,
            NotifierError::Fetch(FetchError::Client(_)) => ErrorSeverity::Critical,
            NotifierError::Notify(NotifyError::Client(_)) => ErrorSeverity::Critical,

            NotifierError::Ledger(LedgerError::Io { .. }) => ErrorSeverity::High,
            NotifierError::Ledger(LedgerError::Serialize(_)) => ErrorSeverity::High,
            NotifierError::Notify(_) => ErrorSeverity::High,

            NotifierError::Fetch(FetchError::Network(_)) => ErrorSeverity::Medium,
            NotifierError::Fetch(FetchError::Status { .. }) => ErrorSeverity::Medium,
            NotifierError::Fetch(FetchError::Parse(_)) => ErrorSeverity::Medium,

            NotifierError::Ledger(LedgerError::Parse(_)) => ErrorSeverity::Low,
            NotifierError::Parse(_) => ErrorSeverity::Low,
        }
    }
}
