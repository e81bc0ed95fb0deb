//! Cache root resolution and artifact naming.

pub mod cache_location;
pub mod layout;

pub use cache_location::{CacheLocation, CacheStrategy, CACHE_DIR_ENV};
pub use layout::ArtifactLayout;
