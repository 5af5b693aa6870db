//! Repository indexing and path filtering

pub mod filter;
pub mod index;
pub mod tree;

pub use filter::PathFilter;
pub use index::{IndexBuilder, RepositoryIndex};
pub use tree::render_tree;
