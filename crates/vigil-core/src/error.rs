//! Error types for the VIGIL engine

use thiserror::Error;

use crate::{AlertId, ConnectionId, ReportId};

/// Core VIGIL errors
#[derive(Error, Debug)]
pub enum VigilError {
    // Geometry errors
    #[error("Invalid coordinate: lon {longitude}, lat {latitude}")]
    InvalidCoordinate { longitude: f64, latitude: f64 },

    #[error("Degenerate polygon: {vertices} vertices, need at least 3")]
    DegeneratePolygon { vertices: usize },

    // Session errors
    #[error("Unknown session: {0}")]
    UnknownSession(ConnectionId),

    #[error("Duplicate connection: {0}")]
    DuplicateConnection(ConnectionId),

    // Consensus errors
    #[error("Voter out of range: {distance_km:.1} km away, limit {max_km:.1} km")]
    OutOfRange { distance_km: f64, max_km: f64 },

    // Entity errors
    #[error("Report not found: {0}")]
    ReportNotFound(ReportId),

    #[error("Alert not found: {0}")]
    AlertNotFound(AlertId),

    // Lifecycle errors
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: &'static str, to: &'static str },

    // Delivery errors (per connection, never aborts a batch)
    #[error("Delivery failed to {0}")]
    DeliveryFailed(ConnectionId),

    #[error("Delivery timed out to {0}")]
    DeliveryTimeout(ConnectionId),

    // Storage boundary
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for VIGIL operations
pub type VigilResult<T> = Result<T, VigilError>;
