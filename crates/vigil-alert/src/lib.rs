//! VIGIL Alert - Lifecycle state machine
//!
//! Governs an alert's status over time:
//! draft -> pending_approval -> active -> {updated -> active | expired |
//! cancelled | resolved}. Expiry is checked lazily at read time; every
//! query surface applies `check_expiry` before returning an alert.

pub mod lifecycle;
pub mod patch;

pub use lifecycle::*;
pub use patch::*;
