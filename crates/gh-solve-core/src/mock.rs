//! In-memory `GitHubClient` for unit tests

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gh_client::{
    Branch, CheckRun, Comment, GitHubClient, IssueDetails, MergeableState, NewPullRequest,
    PullRequestDetails, PullRequestRef, PullRequestState, Review,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Recorded mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SetDraft { pr: u64, draft: bool },
    Comment { number: u64, body: String },
    CreatePr { head: String, base: String },
}

#[derive(Default)]
struct State {
    user: String,
    /// "owner/repo" -> branches
    branches: HashMap<String, Vec<Branch>>,
    /// "owner/repo" entries that answer 404
    missing_repos: HashSet<String>,
    /// "owner/repo head_owner:branch" -> PRs
    prs: HashMap<String, Vec<PullRequestRef>>,
    details: HashMap<u64, PullRequestDetails>,
    issues: HashMap<u64, IssueDetails>,
    review_comments: HashMap<u64, Vec<Comment>>,
    issue_comments: HashMap<u64, Vec<Comment>>,
    checks: Vec<CheckRun>,
    reviews: Vec<Review>,
    default_branch: String,
    commits_since: usize,
    /// Successive compare answers; the last one repeats
    compare: Vec<u64>,
    compare_calls: usize,
    fail_branches: bool,
    fail_repo_lookup: bool,
    fail_prs: bool,
    fail_comments: bool,
    fail_mutations: bool,
    fail_create: bool,
    next_pr_number: u64,
    calls: Vec<Call>,
}

#[derive(Clone, Default)]
pub struct MockClient {
    state: Arc<Mutex<State>>,
}

impl MockClient {
    pub fn new() -> Self {
        let mock = Self::default();
        {
            let mut state = mock.state.lock().unwrap();
            state.user = "me".to_string();
            state.default_branch = "main".to_string();
            state.next_pr_number = 1000;
            state.compare = vec![1];
        }
        mock
    }

    pub fn with_branches(self, owner: &str, repo: &str, names: &[&str]) -> Self {
        self.state.lock().unwrap().branches.insert(
            format!("{}/{}", owner, repo),
            names.iter().map(|n| Branch::new(*n)).collect(),
        );
        self
    }

    pub fn without_repo(self, owner: &str, repo: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .missing_repos
            .insert(format!("{}/{}", owner, repo));
        self
    }

    pub fn with_prs(
        self,
        owner: &str,
        repo: &str,
        head_owner: &str,
        branch: &str,
        prs: &[(u64, PullRequestState)],
    ) -> Self {
        let refs = prs
            .iter()
            .map(|(number, state)| pr_ref(*number, *state, branch))
            .collect();
        self.state.lock().unwrap().prs.insert(
            format!("{}/{} {}:{}", owner, repo, head_owner, branch),
            refs,
        );
        self
    }

    pub fn with_pr_details(self, details: PullRequestDetails) -> Self {
        self.state
            .lock()
            .unwrap()
            .details
            .insert(details.number, details);
        self
    }

    pub fn with_issue(self, number: u64, updated_at: DateTime<Utc>) -> Self {
        self.state
            .lock()
            .unwrap()
            .issues
            .insert(number, IssueDetails { number, updated_at });
        self
    }

    pub fn with_review_comments(self, pr: u64, comments: Vec<Comment>) -> Self {
        self.state
            .lock()
            .unwrap()
            .review_comments
            .insert(pr, comments);
        self
    }

    pub fn with_issue_comments(self, number: u64, comments: Vec<Comment>) -> Self {
        self.state
            .lock()
            .unwrap()
            .issue_comments
            .insert(number, comments);
        self
    }

    pub fn with_checks(self, checks: Vec<CheckRun>) -> Self {
        self.state.lock().unwrap().checks = checks;
        self
    }

    pub fn with_reviews(self, reviews: Vec<Review>) -> Self {
        self.state.lock().unwrap().reviews = reviews;
        self
    }

    pub fn with_commits_since(self, count: usize) -> Self {
        self.state.lock().unwrap().commits_since = count;
        self
    }

    pub fn with_compare(self, answers: Vec<u64>) -> Self {
        self.state.lock().unwrap().compare = answers;
        self
    }

    pub fn failing_branches(self) -> Self {
        self.state.lock().unwrap().fail_branches = true;
        self
    }

    pub fn failing_repo_lookup(self) -> Self {
        self.state.lock().unwrap().fail_repo_lookup = true;
        self
    }

    pub fn failing_prs(self) -> Self {
        self.state.lock().unwrap().fail_prs = true;
        self
    }

    pub fn failing_comments(self) -> Self {
        self.state.lock().unwrap().fail_comments = true;
        self
    }

    pub fn failing_mutations(self) -> Self {
        self.state.lock().unwrap().fail_mutations = true;
        self
    }

    pub fn failing_create(self) -> Self {
        self.state.lock().unwrap().fail_create = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn compare_calls(&self) -> usize {
        self.state.lock().unwrap().compare_calls
    }

    pub fn is_draft(&self, pr: u64) -> bool {
        self.state
            .lock()
            .unwrap()
            .details
            .get(&pr)
            .map(|d| d.is_draft)
            .unwrap_or(false)
    }
}

pub fn at(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .unwrap()
        .with_timezone(&Utc)
}

pub fn pr_ref(number: u64, state: PullRequestState, branch: &str) -> PullRequestRef {
    PullRequestRef {
        number,
        state,
        is_draft: false,
        head_branch: branch.to_string(),
        created_at: at("2025-01-01T00:00:00Z"),
    }
}

pub fn pr_details(number: u64, is_draft: bool) -> PullRequestDetails {
    PullRequestDetails {
        number,
        node_id: format!("PR_{}", number),
        state: PullRequestState::Open,
        is_draft,
        head_branch: "issue-1-0123456789ab".to_string(),
        head_sha: "cafebabe".to_string(),
        mergeable_state: Some(MergeableState::Clean),
        updated_at: at("2025-01-01T00:00:00Z"),
        html_url: format!("https://github.com/owner/repo/pull/{}", number),
    }
}

#[async_trait]
impl GitHubClient for MockClient {
    async fn current_user(&self) -> anyhow::Result<String> {
        Ok(self.state.lock().unwrap().user.clone())
    }

    async fn repo_exists(&self, owner: &str, repo: &str) -> anyhow::Result<bool> {
        let state = self.state.lock().unwrap();
        if state.fail_repo_lookup {
            anyhow::bail!("HTTP 502 Bad Gateway");
        }
        Ok(!state.missing_repos.contains(&format!("{}/{}", owner, repo)))
    }

    async fn list_branches(&self, owner: &str, repo: &str) -> anyhow::Result<Vec<Branch>> {
        let state = self.state.lock().unwrap();
        if state.fail_branches {
            anyhow::bail!("HTTP 502 Bad Gateway");
        }
        if state.missing_repos.contains(&format!("{}/{}", owner, repo)) {
            anyhow::bail!("HTTP 404 Not Found");
        }
        Ok(state
            .branches
            .get(&format!("{}/{}", owner, repo))
            .cloned()
            .unwrap_or_default())
    }

    async fn list_pull_requests_for_branch(
        &self,
        owner: &str,
        repo: &str,
        head_owner: &str,
        branch: &str,
    ) -> anyhow::Result<Vec<PullRequestRef>> {
        let state = self.state.lock().unwrap();
        if state.fail_prs {
            anyhow::bail!("HTTP 401 Bad credentials");
        }
        Ok(state
            .prs
            .get(&format!("{}/{} {}:{}", owner, repo, head_owner, branch))
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_pull_request(
        &self,
        _owner: &str,
        _repo: &str,
        pr_number: u64,
    ) -> anyhow::Result<PullRequestDetails> {
        self.state
            .lock()
            .unwrap()
            .details
            .get(&pr_number)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("PR #{} not found", pr_number))
    }

    async fn fetch_issue(
        &self,
        _owner: &str,
        _repo: &str,
        issue_number: u64,
    ) -> anyhow::Result<IssueDetails> {
        self.state
            .lock()
            .unwrap()
            .issues
            .get(&issue_number)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("issue #{} not found", issue_number))
    }

    async fn list_review_comments(
        &self,
        _owner: &str,
        _repo: &str,
        pr_number: u64,
    ) -> anyhow::Result<Vec<Comment>> {
        let state = self.state.lock().unwrap();
        if state.fail_comments {
            anyhow::bail!("HTTP 403 rate limit exceeded");
        }
        Ok(state
            .review_comments
            .get(&pr_number)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_issue_comments(
        &self,
        _owner: &str,
        _repo: &str,
        number: u64,
    ) -> anyhow::Result<Vec<Comment>> {
        let state = self.state.lock().unwrap();
        if state.fail_comments {
            anyhow::bail!("HTTP 403 rate limit exceeded");
        }
        Ok(state
            .issue_comments
            .get(&number)
            .cloned()
            .unwrap_or_default())
    }

    async fn post_comment(
        &self,
        _owner: &str,
        _repo: &str,
        number: u64,
        body: &str,
    ) -> anyhow::Result<u64> {
        let mut state = self.state.lock().unwrap();
        if state.fail_mutations {
            anyhow::bail!("HTTP 500");
        }
        state.calls.push(Call::Comment {
            number,
            body: body.to_string(),
        });
        Ok(state.calls.len() as u64)
    }

    async fn set_draft_state(
        &self,
        _owner: &str,
        _repo: &str,
        pr_number: u64,
        draft: bool,
    ) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_mutations {
            anyhow::bail!("HTTP 500");
        }
        state.calls.push(Call::SetDraft {
            pr: pr_number,
            draft,
        });
        if let Some(details) = state.details.get_mut(&pr_number) {
            details.is_draft = draft;
        }
        Ok(())
    }

    async fn default_branch(&self, _owner: &str, _repo: &str) -> anyhow::Result<String> {
        Ok(self.state.lock().unwrap().default_branch.clone())
    }

    async fn count_commits_since(
        &self,
        _owner: &str,
        _repo: &str,
        _branch: &str,
        _since: DateTime<Utc>,
    ) -> anyhow::Result<usize> {
        Ok(self.state.lock().unwrap().commits_since)
    }

    async fn fetch_check_runs(
        &self,
        _owner: &str,
        _repo: &str,
        _commit_sha: &str,
    ) -> anyhow::Result<Vec<CheckRun>> {
        Ok(self.state.lock().unwrap().checks.clone())
    }

    async fn list_reviews(
        &self,
        _owner: &str,
        _repo: &str,
        _pr_number: u64,
    ) -> anyhow::Result<Vec<Review>> {
        Ok(self.state.lock().unwrap().reviews.clone())
    }

    async fn compare_ahead_by(
        &self,
        _owner: &str,
        _repo: &str,
        _base: &str,
        _head: &str,
    ) -> anyhow::Result<u64> {
        let mut state = self.state.lock().unwrap();
        let index = state.compare_calls.min(state.compare.len().saturating_sub(1));
        state.compare_calls += 1;
        Ok(state.compare.get(index).copied().unwrap_or(0))
    }

    async fn create_pull_request(
        &self,
        _owner: &str,
        _repo: &str,
        pull_request: &NewPullRequest,
    ) -> anyhow::Result<PullRequestRef> {
        let mut state = self.state.lock().unwrap();
        if state.fail_create {
            anyhow::bail!("Validation Failed: No commits between main and branch");
        }
        state.calls.push(Call::CreatePr {
            head: pull_request.head.clone(),
            base: pull_request.base.clone(),
        });
        let number = state.next_pr_number;
        state.next_pr_number += 1;
        let branch = pull_request
            .head
            .rsplit(':')
            .next()
            .unwrap_or(&pull_request.head)
            .to_string();
        Ok(PullRequestRef {
            number,
            state: PullRequestState::Open,
            is_draft: pull_request.draft,
            head_branch: branch,
            created_at: Utc::now(),
        })
    }
}
