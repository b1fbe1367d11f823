//! Pipeline entry points for import operations.
//!
//! - `normalize`: Map raw records onto canonical posts
//! - `filename`: Derive output paths
//! - `import`: Drive an importer from source to written files
//! - `links`: Rewrite internal links after the write pass
//! - `assets`: Download remote images next to the written posts

pub mod assets;
pub mod filename;
pub mod import;
pub mod links;
pub mod normalize;

pub use filename::derive_path;
pub use import::{ImportSummary, run_import, write_post};
pub use links::{LinkTable, rewrite_internal_links};
pub use normalize::{DateEncoding, FieldTable, normalize};
