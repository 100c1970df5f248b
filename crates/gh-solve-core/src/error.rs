//! Error taxonomy for the solve core
//!
//! Lookup failures are propagated, never turned into "nothing found".
//! Best-effort failures (draft toggling, session comments) are not errors
//! at all; they are logged as warnings where they happen.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SolveError {
    /// A collaborator (branch lister, PR lookup, comment lookup) failed
    #[error("Could not {what}: {source:#}")]
    Lookup {
        what: String,
        #[source]
        source: anyhow::Error,
    },

    /// Neither `origin/{branch}` nor `{branch}` resolved to a commit
    #[error("Could not determine last commit time of branch '{branch}': {detail}")]
    CommitTime { branch: String, detail: String },

    /// Continuing on a branch without a PR, and no PR could be created
    #[error("Pull request required for branch '{branch}' but none exists: {reason}")]
    MissingPullRequest { branch: String, reason: String },

    /// GitHub's compare API never saw the pushed commits
    #[error("GitHub compare API shows no commits between {base} and {head} after {attempts} attempts")]
    CompareNotReady {
        base: String,
        head: String,
        attempts: u32,
    },

    #[error("Invalid issue URL '{0}': expected https://<host>/<owner>/<repo>/issues/<number>")]
    InvalidIssueUrl(String),

    #[error("Invalid log pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl SolveError {
    pub fn lookup(what: impl Into<String>, source: anyhow::Error) -> Self {
        SolveError::Lookup {
            what: what.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SolveError>;

/// Attach a lookup description to a collaborator result
pub(crate) trait LookupContext<T> {
    fn lookup(self, what: impl FnOnce() -> String) -> Result<T>;
}

impl<T> LookupContext<T> for anyhow::Result<T> {
    fn lookup(self, what: impl FnOnce() -> String) -> Result<T> {
        self.map_err(|source| SolveError::lookup(what(), source))
    }
}
