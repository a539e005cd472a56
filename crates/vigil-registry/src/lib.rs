//! VIGIL Registry - Live session tracking
//!
//! Tracks every connected client: owning account (optional, anonymous
//! supported), last known location, heartbeat health, and expiry.
//! Mutations on the same session are serialized through sharded locks;
//! geo queries run a bounding-box pre-filter before the exact haversine
//! test and return owned snapshots, never a session mid-mutation.

pub mod session;
pub mod registry;

pub use session::*;
pub use registry::*;
