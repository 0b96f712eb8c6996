//! Error taxonomy for the hazard tracker.

/// Failures of a single upstream feed fetch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The feed rejected the credential (invalid, unsubscribed or forbidden).
    #[error("feed rejected credential (HTTP {status})")]
    Auth { status: u16 },

    /// Connection failure or an unexpected HTTP status.
    #[error("network error: {0}")]
    Network(String),

    #[error("feed request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// The response body could not be understood.
    #[error("malformed feed payload: {0}")]
    Parse(String),
}

impl FetchError {
    /// Transient failures abort the current cycle only; the next scheduled
    /// cycle tries again.
    pub fn is_transient(&self) -> bool {
        !matches!(self, FetchError::Auth { .. })
    }

    /// Short machine-readable kind, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Auth { .. } => "auth",
            FetchError::Network(_) => "network",
            FetchError::Timeout { .. } => "timeout",
            FetchError::Parse(_) => "parse",
        }
    }
}

/// Configuration rejected at load/validation time.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("update interval must be at least {min}s, got {seconds}s")]
    IntervalTooShort { seconds: u64, min: u64 },

    #[error("zone {zone} has invalid radius {radius_km} km (must be > 0)")]
    InvalidRadius { zone: String, radius_km: f64 },

    #[error("zone {zone} has invalid coordinates ({latitude}, {longitude})")]
    InvalidCoordinates {
        zone: String,
        latitude: f64,
        longitude: f64,
    },

    #[error("monitored category set must not be empty")]
    EmptyMonitoredCategories,

    #[error("device tracker configured twice: {0}")]
    DuplicateTracker(String),

    #[error("invalid configuration value: {0}")]
    Invalid(String),

    #[error("failed to parse configuration: {0}")]
    Parse(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// Errors from a hazard state store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("state store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("state snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A consumer failed to accept delivered events or summaries.
#[derive(Debug, thiserror::Error)]
#[error("delivery failed: {0}")]
pub struct DeliveryError(pub String);

/// Errors surfaced by the tracker context.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Shutdown arrived while the fetch was in flight. Nothing was committed.
    #[error("cycle cancelled before commit")]
    Cancelled,
}

impl TrackerError {
    /// Whether the scheduler may keep running after this error.
    pub fn is_transient(&self) -> bool {
        match self {
            TrackerError::Fetch(e) => e.is_transient(),
            TrackerError::Store(_) => true,
            TrackerError::Config(_) => false,
            TrackerError::Cancelled => false,
        }
    }
}

/// Result type for tracker operations.
pub type Result<T> = std::result::Result<T, TrackerError>;
