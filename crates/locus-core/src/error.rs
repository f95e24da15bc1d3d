use std::time::Duration;

use thiserror::Error;

/// Failure to obtain a position.
///
/// `InvalidCoordinates` never reaches a caller of the resolver: it triggers
/// a retry or the next tier.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PositionError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("position unavailable")]
    PositionUnavailable,

    #[error("position request timed out after {0:?}")]
    Timeout(Duration),

    #[error("location sensor unsupported in this environment")]
    Unsupported,

    #[error("sensor returned out-of-range coordinates ({lat}, {lng})")]
    InvalidCoordinates { lat: f64, lng: f64 },

    #[error("unknown position error: {0}")]
    Unknown(String),

    /// Every tier is disabled by configuration.
    #[error("no position tiers enabled")]
    NoTiersEnabled,
}

impl PositionError {
    /// Worth another sensor attempt after back-off.
    ///
    /// Permission and capability failures will not change between attempts.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            PositionError::InvalidCoordinates { .. }
                | PositionError::Timeout(_)
                | PositionError::PositionUnavailable
                | PositionError::Unknown(_)
        )
    }

    /// Shape the error for a caller: internal variants fold into the public
    /// taxonomy.
    #[must_use]
    pub fn surfaced(self) -> Self {
        match self {
            PositionError::InvalidCoordinates { .. } => PositionError::PositionUnavailable,
            other => other,
        }
    }
}

/// A remote collaborator (geocoder, places store, IP locator) failed.
///
/// Search swallows these per source; the resolver falls through to the next
/// tier.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RemoteSourceFailure {
    #[error("{source_name} request failed: {reason}")]
    Request {
        source_name: &'static str,
        reason: String,
    },

    #[error("{source_name} timed out after {after:?}")]
    Timeout {
        source_name: &'static str,
        after: Duration,
    },

    #[error("{source_name} is not configured")]
    NotConfigured { source_name: &'static str },
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read curated places file {path}: {source}")]
    PlacesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse curated places file: {0}")]
    PlacesFileParse(#[from] serde_yaml::Error),

    #[error("curated places validation failed: {0}")]
    Validation(String),
}
