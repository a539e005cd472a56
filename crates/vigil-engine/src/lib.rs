//! VIGIL Engine - Geofenced broadcast and crowd-verification facade
//!
//! Wires the session registry, consensus engine, alert lifecycle,
//! storage, and broadcast router behind one surface. Inbound reports and
//! votes flow through consensus, may spawn derived alerts, and fan out
//! to every live session inside the target area; location updates and
//! heartbeats flow straight into the registry.

pub mod clock;
pub mod config;
pub mod engine;

pub use clock::*;
pub use config::*;
pub use engine::*;
