//! recque-store — session persistence backends.
//!
//! Implements the `SessionStore` trait over a JSON-file-per-session
//! directory layout, plus an in-memory store for tests and unsaved runs.

pub mod json;
pub mod memory;

pub use json::JsonFileStore;
pub use memory::MemoryStore;
