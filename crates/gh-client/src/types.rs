//! GitHub API data transfer objects
//!
//! These types represent the data returned from the GitHub API.
//! They are intentionally separate from the resolution/feedback domain
//! to keep this crate pure and reusable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A branch in a repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    /// Branch name (e.g., "issue-42-0123456789ab")
    pub name: String,

    /// When the branch was created, if the lister can tell
    ///
    /// The GitHub branches endpoint does not expose this, so the octocrab
    /// client always leaves it empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Branch {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            created_at: None,
        }
    }

    pub fn with_created_at(name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            created_at: Some(created_at),
        }
    }
}

/// Pull request state as seen by the resolution logic
///
/// The REST API only knows `open`/`closed`; a closed PR with a merge
/// timestamp is reported as `Merged`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PullRequestState {
    Open,
    Merged,
    Closed,
}

impl PullRequestState {
    /// Map the REST `state` string and `merged_at` field to a state
    pub fn from_rest(state: &str, merged: bool) -> Self {
        match (state.to_lowercase().as_str(), merged) {
            ("open", _) => PullRequestState::Open,
            (_, true) => PullRequestState::Merged,
            _ => PullRequestState::Closed,
        }
    }

    /// MERGED and CLOSED are terminal: the branch's work is done or rejected
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PullRequestState::Open)
    }
}

impl std::fmt::Display for PullRequestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PullRequestState::Open => "OPEN",
            PullRequestState::Merged => "MERGED",
            PullRequestState::Closed => "CLOSED",
        };
        f.write_str(s)
    }
}

/// A pull request reference returned by the per-branch lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRef {
    /// PR number (e.g., 123)
    pub number: u64,

    /// Open, merged or closed
    pub state: PullRequestState,

    /// Whether the PR is a draft
    pub is_draft: bool,

    /// HEAD branch name
    pub head_branch: String,

    /// When the PR was created
    pub created_at: DateTime<Utc>,
}

/// Full pull request details
///
/// Returned by the single-PR endpoint; carries the node id needed for
/// the draft/ready GraphQL mutations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestDetails {
    pub number: u64,

    /// GraphQL node id
    pub node_id: String,

    pub state: PullRequestState,

    pub is_draft: bool,

    pub head_branch: String,

    /// HEAD commit SHA
    pub head_sha: String,

    /// Mergeable state from GitHub (None while GitHub is still computing it)
    pub mergeable_state: Option<MergeableState>,

    pub updated_at: DateTime<Utc>,

    /// PR URL for opening in browser
    pub html_url: String,
}

/// Mergeable state as reported by GitHub
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeableState {
    /// The merge is clean
    Clean,
    /// The head branch is behind the base branch
    Behind,
    /// The merge has conflicts
    Dirty,
    /// The merge is blocked (e.g., by required reviews)
    Blocked,
    /// CI checks are failing or pending
    Unstable,
    /// Pre-receive hooks are configured
    HasHooks,
    /// State is unknown or not yet computed
    #[default]
    Unknown,
}

impl MergeableState {
    /// Parse the REST `mergeable_state` string
    pub fn from_rest(state: &str) -> Self {
        match state.to_lowercase().as_str() {
            "clean" => MergeableState::Clean,
            "behind" => MergeableState::Behind,
            "dirty" => MergeableState::Dirty,
            "blocked" => MergeableState::Blocked,
            "unstable" => MergeableState::Unstable,
            "has_hooks" => MergeableState::HasHooks,
            _ => MergeableState::Unknown,
        }
    }
}

/// Issue details (only what feedback detection needs)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueDetails {
    pub number: u64,
    pub updated_at: DateTime<Utc>,
}

/// Where a comment was posted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommentSource {
    /// Line comment on the PR diff
    PrReview,
    /// Conversation comment on the PR
    PrConversation,
    /// Comment on the issue itself
    Issue,
}

/// A comment from any of the three comment endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// GitHub comment ID
    pub id: u64,
    /// Author's GitHub username
    pub author: String,
    /// When the comment was created
    pub created_at: DateTime<Utc>,
    /// Comment body text
    pub body: String,
    pub source: CommentSource,
}

impl Comment {
    /// Relabel the comment source
    ///
    /// PR conversation comments come from the issues endpoint, so the
    /// lookup returns them as `Issue` and callers relabel.
    pub fn with_source(mut self, source: CommentSource) -> Self {
        self.source = source;
        self
    }
}

/// Conclusion of a completed check run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckConclusion {
    Success,
    Failure,
    Neutral,
    Cancelled,
    Skipped,
    TimedOut,
    ActionRequired,
    Stale,
}

impl CheckConclusion {
    pub fn from_rest(conclusion: &str) -> Self {
        match conclusion.to_lowercase().as_str() {
            "success" => CheckConclusion::Success,
            "failure" => CheckConclusion::Failure,
            "neutral" => CheckConclusion::Neutral,
            "cancelled" => CheckConclusion::Cancelled,
            "skipped" => CheckConclusion::Skipped,
            "timed_out" => CheckConclusion::TimedOut,
            "action_required" => CheckConclusion::ActionRequired,
            "stale" => CheckConclusion::Stale,
            _ => CheckConclusion::Neutral,
        }
    }
}

/// A CI check run from the GitHub API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRun {
    pub id: u64,
    pub name: String,
    /// Only set once the run has completed
    pub conclusion: Option<CheckConclusion>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// State of a submitted review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewState {
    Approved,
    ChangesRequested,
    Commented,
    Dismissed,
    Pending,
}

impl ReviewState {
    pub fn from_rest(state: &str) -> Self {
        match state.to_uppercase().as_str() {
            "APPROVED" => ReviewState::Approved,
            "CHANGES_REQUESTED" => ReviewState::ChangesRequested,
            "DISMISSED" => ReviewState::Dismissed,
            "PENDING" => ReviewState::Pending,
            _ => ReviewState::Commented,
        }
    }
}

/// A pull request review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: u64,
    pub author: String,
    pub state: ReviewState,
    /// Pending reviews have no submission time
    pub submitted_at: Option<DateTime<Utc>>,
}

/// Parameters for opening a new pull request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPullRequest {
    pub title: String,
    pub body: String,
    /// Head ref, `branch` or `fork_owner:branch`
    pub head: String,
    /// Base branch (e.g., "main")
    pub base: String,
    pub draft: bool,
}
