//! Error handling for the network speed tester

use thiserror::Error;

/// Custom error types for the network speed tester
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// No candidate endpoint answered latency probes
    #[error("Endpoint unreachable: {0}")]
    ProbeUnreachable(String),

    /// Every connection in a transfer phase failed
    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    /// Achieved measurement time was too short to trust
    #[error("Insufficient sample: {0}")]
    InsufficientSample(String),

    /// Run interrupted by the user
    #[error("Cancelled by user")]
    Cancelled,

    /// Network connectivity errors outside the measurement phases
    #[error("Network error: {0}")]
    Network(String),

    /// Parsing errors (URLs, server lists, JSON)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new probe-unreachable error
    pub fn probe_unreachable<S: Into<String>>(message: S) -> Self {
        Self::ProbeUnreachable(message.into())
    }

    /// Create a new transfer-failed error
    pub fn transfer_failed<S: Into<String>>(message: S) -> Self {
        Self::TransferFailed(message.into())
    }

    /// Create a new insufficient-sample error
    pub fn insufficient_sample<S: Into<String>>(message: S) -> Self {
        Self::InsufficientSample(message.into())
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network(message.into())
    }

    /// Create a new parsing error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::ProbeUnreachable(_) => "PROBE",
            Self::TransferFailed(_) => "TRANSFER",
            Self::InsufficientSample(_) => "SAMPLE",
            Self::Cancelled => "CANCELLED",
            Self::Network(_) => "NETWORK",
            Self::Parse(_) => "PARSE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Check if error is recoverable (can retry the run)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::ProbeUnreachable(_) | Self::TransferFailed(_) | Self::Network(_) => true,
            Self::InsufficientSample(_) => true,
            Self::Config(_) | Self::Parse(_) | Self::Cancelled | Self::Internal(_) => false,
        }
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Parse(_) => 1, // Invalid configuration/usage
            Self::ProbeUnreachable(_) | Self::Network(_) => 2, // Endpoint unreachable
            Self::TransferFailed(_) => 3,          // All connections failed
            Self::InsufficientSample(_) => 4,      // Too little data to trust
            Self::Cancelled => 130,                // Interrupted (SIGINT convention)
            Self::Internal(_) => 10,               // Bugs
        }
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
