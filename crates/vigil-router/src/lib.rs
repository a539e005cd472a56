//! VIGIL Router - Geofenced event fan-out
//!
//! Resolves an event's audience through the session registry, pushes the
//! encoded payload to each matching live connection through a bounded
//! worker pool, and aggregates per-connection failures into a
//! `DeliveryReport` instead of aborting the batch.

pub mod transport;
pub mod router;

pub use transport::*;
pub use router::*;
