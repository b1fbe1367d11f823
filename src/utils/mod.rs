//! Utility functions and helpers.

pub mod autop;
pub mod html;
pub mod http;
pub mod slug;
pub mod url;

pub use autop::wpautop;
pub use slug::slugify;
