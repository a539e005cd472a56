//! VIGIL Storage - Entity persistence boundary
//!
//! The engine is storage-agnostic: any backend satisfies the contract
//! as long as a single-entity save is atomic. `MemoryStore` is the
//! in-process implementation used by the engine's tests and by
//! deployments that keep durable records elsewhere.

pub mod store;
pub mod memory;

pub use store::*;
pub use memory::*;
