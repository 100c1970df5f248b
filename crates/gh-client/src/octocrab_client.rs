//! Octocrab-based GitHub API client
//!
//! Direct implementation of the `GitHubClient` trait using the octocrab library.
//! Requests go through octocrab's routed `get`/`post`/`graphql` helpers and are
//! deserialized into small wire structs, then converted to our types.

use crate::client::GitHubClient;
use crate::types::{
    Branch, CheckConclusion, CheckRun, Comment, CommentSource, IssueDetails, MergeableState,
    NewPullRequest, PullRequestDetails, PullRequestRef, PullRequestState, Review, ReviewState,
};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use octocrab::Octocrab;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;

const PER_PAGE: usize = 100;
const MAX_PAGES: u32 = 50;

/// Direct GitHub API client using octocrab
///
/// Makes real API calls, no caching: every resolution pass works on a
/// fresh snapshot.
#[derive(Debug, Clone)]
pub struct OctocrabClient {
    octocrab: Arc<Octocrab>,
}

impl OctocrabClient {
    /// Create a new client with the given octocrab instance
    pub fn new(octocrab: Arc<Octocrab>) -> Self {
        Self { octocrab }
    }

    /// Fetch every page of a list endpoint
    async fn get_all_pages<T: DeserializeOwned>(
        &self,
        route: &str,
        params: &[(&str, String)],
    ) -> anyhow::Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page_num = 1u32;

        loop {
            let mut query: Vec<(&str, String)> = params.to_vec();
            query.push(("per_page", PER_PAGE.to_string()));
            query.push(("page", page_num.to_string()));

            let page: Vec<T> = self
                .octocrab
                .get(route, Some(&query))
                .await
                .with_context(|| format!("GET {} (page {})", route, page_num))?;
            let page_len = page.len();
            items.extend(page);

            match next_page(page_len, page_num) {
                PageStep::Next => page_num += 1,
                PageStep::Done => break,
                PageStep::Truncated => {
                    warn!(
                        "{}: stopped after {} pages ({} items); later items are not included",
                        route,
                        MAX_PAGES,
                        items.len()
                    );
                    break;
                }
            }
        }

        Ok(items)
    }

    /// Run a GraphQL mutation and surface GraphQL-level errors
    async fn graphql_mutation(&self, query: &str, node_id: &str) -> anyhow::Result<()> {
        let payload = serde_json::json!({
            "query": query,
            "variables": { "id": node_id },
        });
        let response: serde_json::Value = self.octocrab.graphql(&payload).await?;

        if let Some(errors) = response.get("errors") {
            anyhow::bail!("GraphQL mutation failed: {}", errors);
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
enum PageStep {
    Next,
    Done,
    /// A full page arrived at the page cap
    Truncated,
}

fn next_page(page_len: usize, page_num: u32) -> PageStep {
    if page_len < PER_PAGE {
        PageStep::Done
    } else if page_num >= MAX_PAGES {
        PageStep::Truncated
    } else {
        PageStep::Next
    }
}

#[derive(Debug, Deserialize)]
struct WireUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct WireBranch {
    name: String,
}

#[derive(Debug, Deserialize)]
struct WireRef {
    #[serde(rename = "ref")]
    ref_field: String,
    sha: String,
}

#[derive(Debug, Deserialize)]
struct WirePull {
    number: u64,
    #[serde(default)]
    node_id: String,
    state: String,
    #[serde(default)]
    draft: Option<bool>,
    merged_at: Option<DateTime<Utc>>,
    head: WireRef,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    mergeable_state: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireComment {
    id: u64,
    user: Option<WireUser>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireIssue {
    number: u64,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct WireRepository {
    default_branch: String,
}

#[derive(Debug, Deserialize)]
struct WireCommit {
    #[allow(dead_code)]
    sha: String,
}

#[derive(Debug, Deserialize)]
struct WireCheckRuns {
    check_runs: Vec<WireCheckRun>,
}

#[derive(Debug, Deserialize)]
struct WireCheckRun {
    id: u64,
    name: String,
    conclusion: Option<String>,
    completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct WireReview {
    id: u64,
    user: Option<WireUser>,
    state: String,
    submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct WireCompare {
    ahead_by: u64,
}

#[derive(Debug, Deserialize)]
struct WireCreatedComment {
    id: u64,
}

const CONVERT_TO_DRAFT: &str = "mutation($id: ID!) { convertPullRequestToDraft(input: {pullRequestId: $id}) { pullRequest { isDraft } } }";
const MARK_READY: &str = "mutation($id: ID!) { markPullRequestReadyForReview(input: {pullRequestId: $id}) { pullRequest { isDraft } } }";

#[async_trait]
impl GitHubClient for OctocrabClient {
    async fn current_user(&self) -> anyhow::Result<String> {
        let user: WireUser = self.octocrab.get("/user", None::<&()>).await?;
        Ok(user.login)
    }

    async fn repo_exists(&self, owner: &str, repo: &str) -> anyhow::Result<bool> {
        let route = format!("/repos/{}/{}", owner, repo);
        let result: octocrab::Result<WireRepository> =
            self.octocrab.get(route, None::<&()>).await;

        match result {
            Ok(_) => Ok(true),
            Err(octocrab::Error::GitHub { source, .. }) if source.status_code.as_u16() == 404 => {
                debug!("{}/{} does not exist", owner, repo);
                Ok(false)
            }
            Err(e) => Err(e).with_context(|| format!("GET /repos/{}/{}", owner, repo)),
        }
    }

    async fn list_branches(&self, owner: &str, repo: &str) -> anyhow::Result<Vec<Branch>> {
        debug!("Listing branches for {}/{}", owner, repo);

        let route = format!("/repos/{}/{}/branches", owner, repo);
        let branches: Vec<WireBranch> = self.get_all_pages(&route, &[]).await?;

        debug!("Found {} branches in {}/{}", branches.len(), owner, repo);
        Ok(branches.into_iter().map(|b| Branch::new(b.name)).collect())
    }

    async fn list_pull_requests_for_branch(
        &self,
        owner: &str,
        repo: &str,
        head_owner: &str,
        branch: &str,
    ) -> anyhow::Result<Vec<PullRequestRef>> {
        debug!(
            "Fetching PRs (state=all) for {}/{} head {}:{}",
            owner, repo, head_owner, branch
        );

        let route = format!("/repos/{}/{}/pulls", owner, repo);
        let params = [
            ("state", "all".to_string()),
            ("head", format!("{}:{}", head_owner, branch)),
        ];
        let pulls: Vec<WirePull> = self.get_all_pages(&route, &params).await?;

        let mut prs: Vec<PullRequestRef> = pulls.iter().map(convert_pull_request_ref).collect();

        // Sort by PR number (descending) for stable ordering
        prs.sort_by(|a, b| b.number.cmp(&a.number));
        Ok(prs)
    }

    async fn fetch_pull_request(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
    ) -> anyhow::Result<PullRequestDetails> {
        debug!("Fetching PR {}/{}#{}", owner, repo, pr_number);

        let route = format!("/repos/{}/{}/pulls/{}", owner, repo, pr_number);
        let pull: WirePull = self.octocrab.get(route, None::<&()>).await?;
        Ok(convert_pull_request_details(pull))
    }

    async fn fetch_issue(
        &self,
        owner: &str,
        repo: &str,
        issue_number: u64,
    ) -> anyhow::Result<IssueDetails> {
        let route = format!("/repos/{}/{}/issues/{}", owner, repo, issue_number);
        let issue: WireIssue = self.octocrab.get(route, None::<&()>).await?;
        Ok(IssueDetails {
            number: issue.number,
            updated_at: issue.updated_at,
        })
    }

    async fn list_review_comments(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
    ) -> anyhow::Result<Vec<Comment>> {
        let route = format!("/repos/{}/{}/pulls/{}/comments", owner, repo, pr_number);
        let comments: Vec<WireComment> = self.get_all_pages(&route, &[]).await?;
        Ok(comments
            .into_iter()
            .map(|c| convert_comment(c, CommentSource::PrReview))
            .collect())
    }

    async fn list_issue_comments(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> anyhow::Result<Vec<Comment>> {
        let route = format!("/repos/{}/{}/issues/{}/comments", owner, repo, number);
        let comments: Vec<WireComment> = self.get_all_pages(&route, &[]).await?;
        Ok(comments
            .into_iter()
            .map(|c| convert_comment(c, CommentSource::Issue))
            .collect())
    }

    async fn post_comment(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        body: &str,
    ) -> anyhow::Result<u64> {
        debug!("Posting comment on {}/{}#{}", owner, repo, number);

        let route = format!("/repos/{}/{}/issues/{}/comments", owner, repo, number);
        let created: WireCreatedComment = self
            .octocrab
            .post(route, Some(&serde_json::json!({ "body": body })))
            .await?;
        Ok(created.id)
    }

    async fn set_draft_state(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
        draft: bool,
    ) -> anyhow::Result<()> {
        debug!(
            "Setting draft={} on {}/{}#{}",
            draft, owner, repo, pr_number
        );

        // The REST API cannot toggle draft state, GraphQL needs the node id
        let pull = self.fetch_pull_request(owner, repo, pr_number).await?;
        let mutation = if draft { CONVERT_TO_DRAFT } else { MARK_READY };
        self.graphql_mutation(mutation, &pull.node_id).await
    }

    async fn default_branch(&self, owner: &str, repo: &str) -> anyhow::Result<String> {
        let route = format!("/repos/{}/{}", owner, repo);
        let repository: WireRepository = self.octocrab.get(route, None::<&()>).await?;
        Ok(repository.default_branch)
    }

    async fn count_commits_since(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        since: DateTime<Utc>,
    ) -> anyhow::Result<usize> {
        let route = format!("/repos/{}/{}/commits", owner, repo);
        let params = [
            ("sha", branch.to_string()),
            ("since", since.to_rfc3339()),
        ];
        let commits: Vec<WireCommit> = self.get_all_pages(&route, &params).await?;
        Ok(commits.len())
    }

    async fn fetch_check_runs(
        &self,
        owner: &str,
        repo: &str,
        commit_sha: &str,
    ) -> anyhow::Result<Vec<CheckRun>> {
        debug!(
            "Fetching check runs for {}/{} @ {}",
            owner, repo, commit_sha
        );

        let route = format!("/repos/{}/{}/commits/{}/check-runs", owner, repo, commit_sha);
        let checks: WireCheckRuns = self
            .octocrab
            .get(route, Some(&[("per_page", PER_PAGE.to_string())]))
            .await?;

        Ok(checks
            .check_runs
            .into_iter()
            .map(|run| CheckRun {
                id: run.id,
                name: run.name,
                conclusion: run.conclusion.as_deref().map(CheckConclusion::from_rest),
                completed_at: run.completed_at,
            })
            .collect())
    }

    async fn list_reviews(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
    ) -> anyhow::Result<Vec<Review>> {
        let route = format!("/repos/{}/{}/pulls/{}/reviews", owner, repo, pr_number);
        let reviews: Vec<WireReview> = self.get_all_pages(&route, &[]).await?;
        Ok(reviews
            .into_iter()
            .map(|r| Review {
                id: r.id,
                author: login_or_unknown(r.user),
                state: ReviewState::from_rest(&r.state),
                submitted_at: r.submitted_at,
            })
            .collect())
    }

    async fn compare_ahead_by(
        &self,
        owner: &str,
        repo: &str,
        base: &str,
        head: &str,
    ) -> anyhow::Result<u64> {
        let route = format!("/repos/{}/{}/compare/{}...{}", owner, repo, base, head);
        let compare: WireCompare = self.octocrab.get(route, None::<&()>).await?;
        Ok(compare.ahead_by)
    }

    async fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        pull_request: &NewPullRequest,
    ) -> anyhow::Result<PullRequestRef> {
        debug!(
            "Creating PR on {}/{} from {} into {}",
            owner, repo, pull_request.head, pull_request.base
        );

        let route = format!("/repos/{}/{}/pulls", owner, repo);
        let created: WirePull = self.octocrab.post(route, Some(pull_request)).await?;
        Ok(convert_pull_request_ref(&created))
    }
}

fn login_or_unknown(user: Option<WireUser>) -> String {
    user.map(|u| u.login)
        .unwrap_or_else(|| "unknown".to_string())
}

fn convert_comment(comment: WireComment, source: CommentSource) -> Comment {
    Comment {
        id: comment.id,
        author: login_or_unknown(comment.user),
        created_at: comment.created_at,
        body: comment.body.unwrap_or_default(),
        source,
    }
}

/// Convert a wire PR to the lightweight reference used by resolution
fn convert_pull_request_ref(pr: &WirePull) -> PullRequestRef {
    PullRequestRef {
        number: pr.number,
        state: PullRequestState::from_rest(&pr.state, pr.merged_at.is_some()),
        is_draft: pr.draft.unwrap_or(false),
        head_branch: pr.head.ref_field.clone(),
        created_at: pr.created_at,
    }
}

fn convert_pull_request_details(pr: WirePull) -> PullRequestDetails {
    PullRequestDetails {
        number: pr.number,
        state: PullRequestState::from_rest(&pr.state, pr.merged_at.is_some()),
        is_draft: pr.draft.unwrap_or(false),
        mergeable_state: pr.mergeable_state.as_deref().map(MergeableState::from_rest),
        node_id: pr.node_id,
        head_branch: pr.head.ref_field,
        head_sha: pr.head.sha,
        updated_at: pr.updated_at,
        html_url: pr.html_url.unwrap_or_default(),
    }
}
