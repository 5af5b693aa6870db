//! Error types for remote collaborators and analysis runs.

use thiserror::Error;

/// A failed call to a repository collaborator.
///
/// Callers treat these as transient: the affected field becomes absent and
/// the run continues. The one exception is the changed-file listing, which
/// is wrapped in [`AnalysisError::ChangedFilesUnavailable`].
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request to {url} failed with status {status}")]
    Status { url: String, status: u16 },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("could not decode response for {what}: {reason}")]
    Decode { what: String, reason: String },

    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    #[error("{0} is unavailable")]
    Unavailable(String),
}

impl RemoteError {
    pub fn decode(what: impl Into<String>, reason: impl ToString) -> Self {
        RemoteError::Decode { what: what.into(), reason: reason.to_string() }
    }

    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        RemoteError::Io { path: path.into(), source }
    }
}

/// The structured extractor could not produce a syntax tree.
///
/// Recovered per file by falling back to pattern extraction.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("grammar rejected by parser: {0}")]
    Grammar(#[from] tree_sitter::LanguageError),

    #[error("parser produced no tree for {0}")]
    NoTree(String),
}

/// A user command that names files outside the analysis.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("File \"{file}\" was not found in the analysis. Available files: {}", available.join(", "))]
    UnknownFile { file: String, available: Vec<String> },

    #[error("File \"{file}\" matches several files: {}", matches.join(", "))]
    Ambiguous { file: String, matches: Vec<String> },
}

/// Terminal failure of an analysis run.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("could not list the changed files of this change request")]
    ChangedFilesUnavailable(#[source] RemoteError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn changed_files_error_keeps_remote_cause() {
        let err = AnalysisError::ChangedFilesUnavailable(RemoteError::Status {
            url: "https://api.github.com/repos/o/r/pulls/1/files".to_string(),
            status: 502,
        });
        let source = err.source().expect("source");
        assert!(source.to_string().contains("502"));
    }
}
