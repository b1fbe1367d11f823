// src/lib.rs

//! Blog export importer library.
//!
//! Converts exports from legacy blogging platforms into front-matter post
//! files: `source → normalize → derive path → write`, plus an optional
//! link rewrite pass over the written posts.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod registry;
pub mod sources;
pub mod storage;
pub mod utils;
