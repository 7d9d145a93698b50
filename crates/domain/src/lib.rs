//! audience-tagger domain crate
//!
//! This crate contains the core domain logic following hexagonal architecture:
//! - `model`: Domain entities and value objects
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `usecases`: Application use cases / business logic
//! - `policy`: Audience tag merge rules
//! - `cancel`: Cooperative run cancellation

pub mod cancel;
pub mod model;
pub mod policy;
pub mod ports;
pub mod usecases;

pub use cancel::{CancelHandle, CancelSignal, cancel_pair};
pub use model::*;
pub use ports::*;
