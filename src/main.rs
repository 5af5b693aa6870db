//! testscout: find the tests a pull request should touch
//!
//! Resolves the import graph of a pull request's changed files against a
//! remote (or local) repository index and maps every modified source file to
//! its existing or missing tests.

use anyhow::Result;

fn main() -> Result<()> {
    testscout::cli::run()
}
