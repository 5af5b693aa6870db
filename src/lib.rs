//! testscout: related-test discovery for pull requests
//!
//! The pipeline runs in strictly sequenced phases over a single per-run
//! context:
//!
//! 1. [`scan::index`] builds the repository file index from a
//!    [`fetch::DirectoryLister`].
//! 2. [`analysis::run`] lists the changed files and loads their diffs and
//!    contents.
//! 3. [`graph`] extracts raw specifiers ([`extract`]), resolves them
//!    ([`resolve`]) and closes the dependency/dependent graph.
//! 4. [`analysis::test_links`] associates every non-test file with its tests.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod extract;
pub mod fetch;
pub mod graph;
pub mod render;
pub mod resolve;
pub mod scan;
pub mod utils;
