// src/models/mod.rs

//! Domain models for the importer.
//!
//! Raw records come out of source adapters, canonical posts go into the
//! writer, and the configuration shapes how both are handled.

mod config;
mod post;
mod record;

// Re-export all public types
pub use config::{Config, HttpConfig, OutputConfig};
pub use post::{CanonicalPost, PostKind};
pub use record::{FieldValue, RawRecord};
