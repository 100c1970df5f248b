//! GitHub API client for issue auto-continue
//!
//! This crate provides a trait-based GitHub API client covering exactly the
//! lookups and mutations the resolution, feedback and session logic need.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │              GitHubClient trait                  │
//! │  - list_branches()                               │
//! │  - list_pull_requests_for_branch()  (state=all)  │
//! │  - list_review_comments() / list_issue_comments()│
//! │  - post_comment() / set_draft_state()            │
//! └─────────────────────────────────────────────────┘
//!                        │
//!        ┌───────────────┴───────────────┐
//!        ▼                               ▼
//! ┌─────────────────┐         ┌─────────────────────┐
//! │ OctocrabClient  │         │ test mocks          │
//! │ (direct API)    │         │ (in-memory)         │
//! └─────────────────┘         └─────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use gh_client::{GitHubClient, OctocrabClient};
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let octocrab = octocrab::Octocrab::builder()
//!     .personal_token("token".to_string())
//!     .build()?;
//!
//! let client = OctocrabClient::new(Arc::new(octocrab));
//! let prs = client
//!     .list_pull_requests_for_branch("owner", "repo", "owner", "issue-42-0123456789ab")
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod client_manager;
pub mod octocrab_client;
pub mod types;

/// Default GitHub host (public GitHub)
pub const DEFAULT_HOST: &str = "github.com";

pub use client::GitHubClient;
pub use client_manager::{ClientManager, TokenResolver};
pub use octocrab_client::OctocrabClient;
pub use types::{
    Branch, CheckConclusion, CheckRun, Comment, CommentSource, IssueDetails, MergeableState,
    NewPullRequest, PullRequestDetails, PullRequestRef, PullRequestState, Review, ReviewState,
};

// Re-export octocrab so consumers don't need to depend on it directly
pub use octocrab;
