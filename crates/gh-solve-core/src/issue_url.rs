//! Repository and issue identifiers

use crate::error::{Result, SolveError};
use std::fmt;

/// An `owner/repo` pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// The issue a solve invocation works on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueTarget {
    pub host: String,
    pub repo: RepoRef,
    pub number: u64,
}

impl IssueTarget {
    /// Parse `https://<host>/<owner>/<repo>/issues/<number>`
    ///
    /// A trailing slash, query or fragment is tolerated. Pull request URLs
    /// are rejected.
    pub fn parse(url: &str) -> Result<Self> {
        let invalid = || SolveError::InvalidIssueUrl(url.to_string());

        let rest = url
            .trim()
            .strip_prefix("https://")
            .or_else(|| url.trim().strip_prefix("http://"))
            .ok_or_else(invalid)?;
        let rest = rest.split(['?', '#']).next().unwrap_or(rest);

        let parts: Vec<&str> = rest.trim_end_matches('/').split('/').collect();
        match parts.as_slice() {
            [host, owner, repo, "issues", number]
                if !host.is_empty() && !owner.is_empty() && !repo.is_empty() =>
            {
                let number = number.parse::<u64>().map_err(|_| invalid())?;
                if number == 0 {
                    return Err(invalid());
                }
                Ok(Self {
                    host: host.to_string(),
                    repo: RepoRef::new(*owner, *repo),
                    number,
                })
            }
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for IssueTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.repo, self.number)
    }
}
