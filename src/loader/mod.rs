// Package loader provides the memoizing, request-coalescing loader.

pub mod builder;
pub mod error;
pub mod fetcher;
pub mod loader;
pub mod refresh;


// Re-export main types
pub use builder::LoaderBuilder;
pub use error::LoadError;
pub use fetcher::{background_context, ContextFactory, Fetcher};
pub use loader::Loader;
