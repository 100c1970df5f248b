//! GitHub client trait definition
//!
//! This module defines the core `GitHubClient` trait that all client
//! implementations must satisfy. The resolution, feedback and session
//! logic only ever talk to GitHub through this trait, which keeps them
//! trivially mockable in tests.

use crate::types::{
    Branch, CheckRun, Comment, IssueDetails, NewPullRequest, PullRequestDetails, PullRequestRef,
    Review,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// GitHub API client trait
///
/// Defines the interface for interacting with the GitHub API.
/// Every method receives `owner`/`repo` explicitly; implementations
/// must not read ambient repository state.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow sharing across
/// async tasks and threads.
///
/// # Example
///
/// ```rust,ignore
/// use gh_client::{GitHubClient, Branch};
///
/// async fn branches(client: &dyn GitHubClient) -> anyhow::Result<Vec<Branch>> {
///     client.list_branches("deep-assistant", "hive-mind").await
/// }
/// ```
#[async_trait]
pub trait GitHubClient: Send + Sync {
    /// Login of the authenticated user
    async fn current_user(&self) -> anyhow::Result<String>;

    /// Whether `owner/repo` exists
    ///
    /// Only a 404 answers `false`; any other failure is an error.
    async fn repo_exists(&self, owner: &str, repo: &str) -> anyhow::Result<bool>;

    /// List all branches of a repository (all pages)
    async fn list_branches(&self, owner: &str, repo: &str) -> anyhow::Result<Vec<Branch>>;

    /// List pull requests whose head is `head_owner:branch`, in all states
    ///
    /// # Arguments
    ///
    /// * `owner` - Owner of the repository the PRs are opened against
    /// * `repo` - Repository name
    /// * `head_owner` - Owner of the repository holding the branch
    ///   (equal to `owner` unless the branch lives in a fork)
    /// * `branch` - Head branch name
    ///
    /// Open, merged and closed PRs are all returned; asking only for open
    /// PRs would hide that a branch's work was already merged or rejected.
    async fn list_pull_requests_for_branch(
        &self,
        owner: &str,
        repo: &str,
        head_owner: &str,
        branch: &str,
    ) -> anyhow::Result<Vec<PullRequestRef>>;

    /// Fetch a single pull request by number
    async fn fetch_pull_request(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
    ) -> anyhow::Result<PullRequestDetails>;

    /// Fetch a single issue by number
    async fn fetch_issue(
        &self,
        owner: &str,
        repo: &str,
        issue_number: u64,
    ) -> anyhow::Result<IssueDetails>;

    /// Fetch review (diff line) comments for a pull request
    async fn list_review_comments(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
    ) -> anyhow::Result<Vec<Comment>>;

    /// Fetch conversation comments for an issue or pull request
    ///
    /// Pull requests are issues as far as this endpoint is concerned.
    /// Comments are returned with `CommentSource::Issue`.
    async fn list_issue_comments(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> anyhow::Result<Vec<Comment>>;

    /// Post a conversation comment on an issue or pull request
    ///
    /// # Returns
    ///
    /// The GitHub comment ID on success
    async fn post_comment(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        body: &str,
    ) -> anyhow::Result<u64>;

    /// Convert a pull request to draft (`draft = true`) or mark it ready
    /// for review (`draft = false`)
    async fn set_draft_state(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
        draft: bool,
    ) -> anyhow::Result<()>;

    /// Default branch of a repository (e.g., "main")
    async fn default_branch(&self, owner: &str, repo: &str) -> anyhow::Result<String>;

    /// Count commits on `branch` since the given time
    async fn count_commits_since(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        since: DateTime<Utc>,
    ) -> anyhow::Result<usize>;

    /// Fetch CI check runs for a specific commit
    async fn fetch_check_runs(
        &self,
        owner: &str,
        repo: &str,
        commit_sha: &str,
    ) -> anyhow::Result<Vec<CheckRun>>;

    /// Fetch submitted reviews for a pull request
    async fn list_reviews(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
    ) -> anyhow::Result<Vec<Review>>;

    /// Number of commits `head` is ahead of `base` per the compare API
    ///
    /// `head` may be `fork_owner:branch`. This is the same API that PR
    /// creation uses, so a positive answer means a PR can be opened.
    async fn compare_ahead_by(
        &self,
        owner: &str,
        repo: &str,
        base: &str,
        head: &str,
    ) -> anyhow::Result<u64>;

    /// Open a new pull request
    async fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        pull_request: &NewPullRequest,
    ) -> anyhow::Result<PullRequestRef>;
}
