//! Application use cases / business logic

pub mod classify_library;

pub use classify_library::{ClassifyLibrary, RunError, check_preconditions};
