//! VIGIL Core - Fundamental types and primitives
//!
//! This crate defines the core types used throughout the VIGIL engine:
//! - Identifiers (ConnectionId, AccountId, ReportId, AlertId)
//! - Time primitives (Timestamp)
//! - Geographic value types (Coordinate, TargetArea)
//! - Entities (Report, Alert, VoteTally)
//! - Broadcast event union
//! - Error taxonomy

pub mod id;
pub mod time;
pub mod coord;
pub mod report;
pub mod tally;
pub mod alert;
pub mod event;
pub mod error;

pub use id::*;
pub use time::*;
pub use coord::*;
pub use report::*;
pub use tally::*;
pub use alert::*;
pub use event::*;
pub use error::*;
