//! Pull request creation for branches that have none
//!
//! Continuing on a branch without a PR is not allowed: feedback is
//! tracked through the PR, so either one is created here or the
//! invocation stops with [`SolveError::MissingPullRequest`].

use crate::error::{Result, SolveError};
use crate::issue_url::IssueTarget;
use crate::resolution::Remote;
use crate::RepoRef;
use gh_client::{GitHubClient, NewPullRequest};
use gh_solve_config::CompareRetryConfig;
use log::{debug, info, warn};
use std::time::Duration;

/// Capped linear backoff for the compare API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub step: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        CompareRetryConfig::default().into()
    }
}

impl From<CompareRetryConfig> for RetryPolicy {
    fn from(config: CompareRetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            step: Duration::from_millis(config.step_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// Delay before attempt `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.step.saturating_mul(attempt).min(self.max_delay)
    }
}

/// Wait until GitHub's compare API sees commits on `head` ahead of `base`
///
/// Returns the `ahead_by` count. Compare errors count as "not ready yet".
pub async fn wait_for_compare(
    client: &dyn GitHubClient,
    repo: &RepoRef,
    base: &str,
    head: &str,
    policy: &RetryPolicy,
) -> Result<u64> {
    for attempt in 1..=policy.max_attempts {
        let delay = policy.delay_for(attempt);
        debug!(
            "Compare attempt {}/{} after {}ms",
            attempt,
            policy.max_attempts,
            delay.as_millis()
        );
        tokio::time::sleep(delay).await;

        match client
            .compare_ahead_by(&repo.owner, &repo.repo, base, head)
            .await
        {
            Ok(ahead_by) if ahead_by > 0 => {
                info!("GitHub sees {} commit(s) on {} ahead of {}", ahead_by, head, base);
                return Ok(ahead_by);
            }
            Ok(_) => debug!("{} not ahead of {} yet", head, base),
            Err(e) => warn!("Compare {}...{} failed: {:#}", base, head, e),
        }
    }

    Err(SolveError::CompareNotReady {
        base: base.to_string(),
        head: head.to_string(),
        attempts: policy.max_attempts,
    })
}

/// Everything needed to open a PR for a resolved branch
#[derive(Debug, Clone)]
pub struct PullRequestRequest {
    pub repo: RepoRef,
    pub issue_number: u64,
    pub branch: String,
    pub remote: Remote,
    /// Base branch; the repository default branch when None
    pub base_branch: Option<String>,
    pub auto_create: bool,
    pub retry: RetryPolicy,
}

impl PullRequestRequest {
    /// `branch`, or `fork_owner:branch` for fork branches
    pub fn head_ref(&self) -> String {
        match &self.remote {
            Remote::Upstream => self.branch.clone(),
            Remote::Fork { owner } => format!("{}:{}", owner, self.branch),
        }
    }
}

/// Create a draft PR for a branch without one
///
/// Any failure (creation disabled, base lookup, compare backoff, the
/// create call itself) becomes [`SolveError::MissingPullRequest`].
///
/// Nothing is committed or pushed here. A branch that is level with its
/// base never becomes ahead, so it spends every compare attempt and
/// fails; it needs at least one pushed commit first.
pub async fn ensure_pull_request(
    client: &dyn GitHubClient,
    request: &PullRequestRequest,
) -> Result<u64> {
    let missing = |reason: String| SolveError::MissingPullRequest {
        branch: request.branch.clone(),
        reason,
    };

    if !request.auto_create {
        return Err(missing(
            "automatic pull request creation is disabled".to_string(),
        ));
    }

    let repo = &request.repo;
    let base = match &request.base_branch {
        Some(base) => base.clone(),
        None => client
            .default_branch(&repo.owner, &repo.repo)
            .await
            .map_err(|e| missing(format!("could not determine base branch: {:#}", e)))?,
    };
    let head = request.head_ref();

    info!("Creating draft PR {} -> {}", head, base);
    wait_for_compare(client, repo, &base, &head, &request.retry)
        .await
        .map_err(|e| missing(e.to_string()))?;

    let new_pr = NewPullRequest {
        title: format!("Fix issue #{}", request.issue_number),
        body: format!("Fixes #{}", request.issue_number),
        head,
        base,
        draft: true,
    };
    let pr = client
        .create_pull_request(&repo.owner, &repo.repo, &new_pr)
        .await
        .map_err(|e| missing(format!("{:#}", e)))?;

    info!("Created draft PR #{}", pr.number);
    Ok(pr.number)
}

/// Remediation shown when no PR could be created
pub fn missing_pull_request_help(target: &IssueTarget, error: &SolveError) -> String {
    let branch = match error {
        SolveError::MissingPullRequest { branch, .. } => branch.as_str(),
        _ => "<branch>",
    };
    let issue_url = format!(
        "https://{}/{}/issues/{}",
        target.host, target.repo, target.number
    );
    [
        "FATAL: the branch has no pull request and none could be created.".to_string(),
        String::new(),
        "  What this means:".to_string(),
        "    New feedback is tracked through the pull request; without one there".to_string(),
        "    is nothing to collect comments from and nothing to mark as in progress.".to_string(),
        String::new(),
        "  Error details:".to_string(),
        format!("    {}", error),
        String::new(),
        "  How to fix:".to_string(),
        "    1. Retry; GitHub may not have indexed the pushed commits yet.".to_string(),
        "       A branch with no commits ahead of its base needs one pushed first.".to_string(),
        "    2. Create the PR manually, then re-run without automatic PR creation;".to_string(),
        "       the re-run picks up the open PR and creates nothing:".to_string(),
        format!(
            "       gh pr create --draft --head {} --title \"Fix issue #{n}\" --body \"Fixes #{n}\"",
            branch,
            n = target.number
        ),
        format!(
            "       gh-solve {} --auto-continue --no-auto-pull-request-creation",
            issue_url
        ),
    ]
    .join("\n")
}
