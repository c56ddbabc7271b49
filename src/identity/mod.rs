//! Object identity subsystem.
//!
//! # Data Flow
//! ```text
//! processor marshals an object by reference
//!     → registry.rs get_or_assign(&Arc<T>)
//!     → surrogate ID written to the wire
//!
//! peer sends the ID back
//!     → registry.rs resolve(id)
//!     → Arc<T> while the object is still alive
//! ```
//!
//! # Design Decisions
//! - Keyed by allocation identity, never by value equality
//! - Registry holds only `Weak` references
//! - IDs come from one counter inside the same lock as the map

pub mod registry;

pub use registry::{ObjectId, ObjectIdRegistry};
