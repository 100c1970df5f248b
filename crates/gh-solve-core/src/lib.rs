//! Issue auto-continue core
//!
//! Decides whether a solve run for an issue resumes existing work, and
//! drives what happens around that work on GitHub:
//!
//! - [`resolution`]: pick the branch/PR to continue on, or start fresh
//! - [`pull_request`]: open a draft PR for a branch that has none
//! - [`feedback`]: count new comments and other signals since the last commit
//! - [`session`]: draft/ready toggling and start/end comments
//!
//! All GitHub access goes through [`gh_client::GitHubClient`], and every
//! function takes the target repository explicitly.

pub mod branch_name;
pub mod error;
pub mod feedback;
pub mod git;
pub mod issue_url;
pub mod pull_request;
pub mod resolution;
pub mod session;

#[cfg(test)]
mod mock;

pub use branch_name::{generate_branch_name, parse_branch_name, BranchFormat, IssueBranch};
pub use error::{Result, SolveError};
pub use feedback::{
    aggregate_feedback, CommentFilter, FeedbackGate, FeedbackReport, FeedbackRequest,
    FeedbackSignal, GateDecision,
};
pub use git::{CommitTimeLookup, GitCli};
pub use issue_url::{IssueTarget, RepoRef};
pub use pull_request::{
    ensure_pull_request, missing_pull_request_help, PullRequestRequest, RetryPolicy,
};
pub use resolution::{
    resolve, resolve_for_issue, Remote, RepoSnapshot, ResolutionOutcome, ResolveOptions,
};
pub use session::{SessionState, WorkSession};
