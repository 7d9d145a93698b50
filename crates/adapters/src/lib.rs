//! audience-tagger adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `llm`: LLM provider adapters (Gemini, OpenAI-compatible, stub) and the
//!   provider factory
//! - `library`: in-memory and JSON file item repositories

mod library_json;
mod library_memory;

pub mod llm;

/// Re-exports for library adapters
pub mod library {
    pub use crate::library_json::JsonLibrary;
    pub use crate::library_memory::InMemoryLibrary;
}
