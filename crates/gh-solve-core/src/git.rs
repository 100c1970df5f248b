//! Last commit time of the working branch

use crate::error::{Result, SolveError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use std::path::PathBuf;

/// Source of a branch's last commit time
#[async_trait]
pub trait CommitTimeLookup: Send + Sync {
    /// Author time of the newest commit on `branch`
    ///
    /// Fails with [`SolveError::CommitTime`] when the branch cannot be
    /// resolved; callers never substitute a default.
    async fn last_commit_time(&self, branch: &str) -> Result<DateTime<Utc>>;
}

/// `git` subprocess in a local clone
pub struct GitCli {
    repo_path: PathBuf,
}

impl GitCli {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
        }
    }

    async fn commit_time_of(&self, rev: &str) -> std::result::Result<DateTime<Utc>, String> {
        let output = tokio::process::Command::new("git")
            .args(["log", "-1", "--format=%aI", rev, "--"])
            .current_dir(&self.repo_path)
            .output()
            .await
            .map_err(|e| format!("Failed to run git: {}", e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("git log {} failed: {}", rev, stderr.trim()));
        }

        parse_commit_time(&String::from_utf8_lossy(&output.stdout))
    }
}

#[async_trait]
impl CommitTimeLookup for GitCli {
    async fn last_commit_time(&self, branch: &str) -> Result<DateTime<Utc>> {
        let remote_ref = format!("origin/{}", branch);
        let remote_err = match self.commit_time_of(&remote_ref).await {
            Ok(time) => {
                debug!("Last commit on {}: {}", remote_ref, time);
                return Ok(time);
            }
            Err(e) => e,
        };

        match self.commit_time_of(branch).await {
            Ok(time) => {
                debug!("Last commit on {} (local): {}", branch, time);
                Ok(time)
            }
            Err(local_err) => Err(SolveError::CommitTime {
                branch: branch.to_string(),
                detail: format!("{}; {}", remote_err, local_err),
            }),
        }
    }
}

/// Parse the `%aI` output of `git log`
fn parse_commit_time(stdout: &str) -> std::result::Result<DateTime<Utc>, String> {
    let line = stdout.trim();
    if line.is_empty() {
        return Err("no commits found".to_string());
    }
    DateTime::parse_from_rfc3339(line)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("unparseable commit time '{}': {}", line, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commit_time_normalizes_offset() {
        let time = parse_commit_time("2025-03-01T12:00:00+02:00\n").unwrap();
        assert_eq!(time.to_rfc3339(), "2025-03-01T10:00:00+00:00");
    }

    #[test]
    fn test_parse_commit_time_rejects_empty_output() {
        assert_eq!(parse_commit_time("  \n").unwrap_err(), "no commits found");
        assert!(parse_commit_time("yesterday").is_err());
    }

    #[tokio::test]
    async fn test_missing_repository_is_commit_time_error() {
        let git = GitCli::new("/nonexistent/gh-solve/repo");
        let err = git.last_commit_time("issue-1-aaaaaaaa").await.unwrap_err();
        match err {
            SolveError::CommitTime { branch, .. } => assert_eq!(branch, "issue-1-aaaaaaaa"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
