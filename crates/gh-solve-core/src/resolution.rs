//! Branch/PR resolution for auto-continue
//!
//! Given the issue branches of a repository and the pull requests that
//! reference them, decide whether to resume an existing branch (and PR)
//! or start fresh.
//!
//! # Precedence
//!
//! 1. A branch with an OPEN PR (highest PR number wins)
//! 2. A branch that never had a PR (newest branch wins)
//! 3. Start fresh
//!
//! Branches whose PRs are all MERGED or CLOSED are never reused.
//!
//! The pure decision lives in [`resolve`]; [`resolve_for_issue`] fetches
//! the snapshot through a [`GitHubClient`] first.

use crate::branch_name::matches_issue;
use crate::error::{LookupContext, Result};
use crate::RepoRef;
use gh_client::{Branch, GitHubClient, PullRequestRef, PullRequestState};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashMap;

/// Which remote the resolved branch lives on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Remote {
    Upstream,
    /// The branch lives in the fork; push there and open PRs with
    /// head `owner:branch`
    Fork { owner: String },
}

/// Result of one resolution pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ResolutionOutcome {
    /// No reusable work; create a new branch
    StartFresh,
    /// Resume `branch_name`. A missing `pr_number` means the branch has
    /// never had a PR and one must be created before work proceeds.
    Continue {
        branch_name: String,
        pr_number: Option<u64>,
        remote: Remote,
    },
}

impl ResolutionOutcome {
    pub fn continue_mode(&self) -> bool {
        matches!(self, ResolutionOutcome::Continue { .. })
    }

    pub fn branch_name(&self) -> Option<&str> {
        match self {
            ResolutionOutcome::Continue { branch_name, .. } => Some(branch_name),
            ResolutionOutcome::StartFresh => None,
        }
    }

    pub fn pr_number(&self) -> Option<u64> {
        match self {
            ResolutionOutcome::Continue { pr_number, .. } => *pr_number,
            ResolutionOutcome::StartFresh => None,
        }
    }

    pub fn remote(&self) -> Option<&Remote> {
        match self {
            ResolutionOutcome::Continue { remote, .. } => Some(remote),
            ResolutionOutcome::StartFresh => None,
        }
    }
}

/// Reusability of one candidate branch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchClass {
    /// Has at least one OPEN PR; carries the highest open PR number
    ReusableWithOpenPr { pr_number: u64 },
    /// Never had a PR
    ReusableNoPr,
    /// Work was merged or rejected (or the PR history is contradictory)
    NotReusable,
}

/// Branches of one repository plus the PRs referencing each of them
#[derive(Debug, Clone, Default)]
pub struct RepoSnapshot {
    /// Repository the branches live in
    pub repo: RepoRef,
    pub branches: Vec<Branch>,
    /// Branch name -> PRs in all states
    pub prs_by_branch: HashMap<String, Vec<PullRequestRef>>,
}

impl RepoSnapshot {
    pub fn new(repo: RepoRef) -> Self {
        Self {
            repo,
            branches: Vec::new(),
            prs_by_branch: HashMap::new(),
        }
    }

    pub fn with_branch(mut self, branch: Branch, prs: Vec<PullRequestRef>) -> Self {
        self.prs_by_branch.insert(branch.name.clone(), prs);
        self.branches.push(branch);
        self
    }

    fn prs_for(&self, branch: &str) -> &[PullRequestRef] {
        self.prs_by_branch
            .get(branch)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Options for [`resolve_for_issue`]
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Also look for branches in the fork owner's copy of the repository
    pub fork: bool,
    /// Fork owner; defaults to the authenticated user
    pub fork_owner: Option<String>,
}

/// Classify a branch by the states of its PRs
///
/// An OPEN PR makes the branch reusable even if older PRs on it were
/// merged or closed. If the OPEN PR is older (lower number) than a
/// terminal PR on the same branch, the history is contradictory; this
/// logs a warning and treats the branch as not reusable.
pub fn classify_branch(branch: &str, prs: &[PullRequestRef]) -> BranchClass {
    let newest_open = prs
        .iter()
        .filter(|pr| pr.state == PullRequestState::Open)
        .map(|pr| pr.number)
        .max();
    let newest_terminal = prs
        .iter()
        .filter(|pr| pr.state.is_terminal())
        .map(|pr| pr.number)
        .max();

    match (newest_open, newest_terminal) {
        (None, None) => BranchClass::ReusableNoPr,
        (None, Some(_)) => BranchClass::NotReusable,
        (Some(open), Some(terminal)) if open < terminal => {
            warn!(
                "Branch {} has OPEN PR #{} older than finished PR #{}; not reusing it",
                branch, open, terminal
            );
            BranchClass::NotReusable
        }
        (Some(open), _) => BranchClass::ReusableWithOpenPr { pr_number: open },
    }
}

/// Pick a branch to continue on within one repository
///
/// Returns the branch name and optional PR number, or None when nothing
/// is reusable.
fn pick_candidate(issue_number: u64, snapshot: &RepoSnapshot) -> Option<(String, Option<u64>)> {
    let mut with_open_pr: Vec<(&Branch, u64)> = Vec::new();
    let mut without_pr: Vec<&Branch> = Vec::new();

    for branch in snapshot
        .branches
        .iter()
        .filter(|b| matches_issue(&b.name, issue_number))
    {
        let class = classify_branch(&branch.name, snapshot.prs_for(&branch.name));
        debug!(
            "{}: branch {} classified as {:?}",
            snapshot.repo, branch.name, class
        );
        match class {
            BranchClass::ReusableWithOpenPr { pr_number } => with_open_pr.push((branch, pr_number)),
            BranchClass::ReusableNoPr => without_pr.push(branch),
            BranchClass::NotReusable => {}
        }
    }

    if let Some((branch, pr_number)) = with_open_pr
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.name.cmp(&b.0.name)))
    {
        return Some((branch.name.clone(), Some(pr_number)));
    }

    newest_branch(&without_pr).map(|branch| (branch.name.clone(), None))
}

/// Newest branch by creation time when every branch has one, otherwise
/// the lexicographically last name
fn newest_branch<'a>(branches: &[&'a Branch]) -> Option<&'a Branch> {
    if branches.iter().all(|b| b.created_at.is_some()) {
        branches
            .iter()
            .copied()
            .max_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.name.cmp(&b.name)))
    } else {
        branches.iter().copied().max_by(|a, b| a.name.cmp(&b.name))
    }
}

/// Decide whether to continue existing work for an issue
///
/// `upstream` is always consulted first. When `fork` is given (fork mode),
/// its branches are used only if nothing upstream is reusable, and the
/// outcome is marked with the fork's owner.
///
/// Pure and deterministic: identical snapshots give identical outcomes.
pub fn resolve(
    issue_number: u64,
    upstream: &RepoSnapshot,
    fork: Option<&RepoSnapshot>,
) -> ResolutionOutcome {
    if let Some((branch_name, pr_number)) = pick_candidate(issue_number, upstream) {
        return ResolutionOutcome::Continue {
            branch_name,
            pr_number,
            remote: Remote::Upstream,
        };
    }

    if let Some(fork) = fork {
        if let Some((branch_name, pr_number)) = pick_candidate(issue_number, fork) {
            return ResolutionOutcome::Continue {
                branch_name,
                pr_number,
                remote: Remote::Fork {
                    owner: fork.repo.owner.clone(),
                },
            };
        }
    }

    ResolutionOutcome::StartFresh
}

/// Fetch issue branches of `branches_repo` and their PRs on `pr_repo`
///
/// PRs are looked up with head `branches_repo.owner:branch`, so the same
/// function serves upstream (both repos equal) and fork mode (branches in
/// the fork, PRs against upstream). Any lookup failure is returned as an
/// error; it never reads as "no branches".
pub async fn fetch_snapshot(
    client: &dyn GitHubClient,
    pr_repo: &RepoRef,
    branches_repo: &RepoRef,
    issue_number: u64,
) -> Result<RepoSnapshot> {
    let branches = client
        .list_branches(&branches_repo.owner, &branches_repo.repo)
        .await
        .lookup(|| format!("list branches of {}", branches_repo))?;

    let mut snapshot = RepoSnapshot::new(branches_repo.clone());
    for branch in branches
        .into_iter()
        .filter(|b| matches_issue(&b.name, issue_number))
    {
        let prs = client
            .list_pull_requests_for_branch(
                &pr_repo.owner,
                &pr_repo.repo,
                &branches_repo.owner,
                &branch.name,
            )
            .await
            .lookup(|| format!("list pull requests of {} for {}", pr_repo, branch.name))?;
        snapshot = snapshot.with_branch(branch, prs);
    }

    debug!(
        "{}: {} branch(es) for issue #{}",
        branches_repo,
        snapshot.branches.len(),
        issue_number
    );
    Ok(snapshot)
}

/// Fetch the snapshot(s) and resolve
pub async fn resolve_for_issue(
    client: &dyn GitHubClient,
    repo: &RepoRef,
    issue_number: u64,
    options: &ResolveOptions,
) -> Result<ResolutionOutcome> {
    info!("Resolving existing work for {}#{}", repo, issue_number);

    let upstream = fetch_snapshot(client, repo, repo, issue_number).await?;

    let fork = if options.fork {
        let fork_owner = match &options.fork_owner {
            Some(owner) => owner.clone(),
            None => client
                .current_user()
                .await
                .lookup(|| "determine fork owner".to_string())?,
        };
        let fork_repo = RepoRef::new(fork_owner, repo.repo.clone());
        if fork_repo.owner == repo.owner {
            None
        } else if !client
            .repo_exists(&fork_repo.owner, &fork_repo.repo)
            .await
            .lookup(|| format!("check whether {} exists", fork_repo))?
        {
            info!("No fork at {}; nothing to continue there", fork_repo);
            None
        } else {
            Some(fetch_snapshot(client, repo, &fork_repo, issue_number).await?)
        }
    } else {
        None
    };

    let outcome = resolve(issue_number, &upstream, fork.as_ref());
    match &outcome {
        ResolutionOutcome::Continue {
            branch_name,
            pr_number: Some(pr),
            ..
        } => info!("Continuing on {} with PR #{}", branch_name, pr),
        ResolutionOutcome::Continue { branch_name, .. } => {
            info!("Continuing on {} (no PR yet)", branch_name)
        }
        ResolutionOutcome::StartFresh => info!("No reusable branch for issue #{}", issue_number),
    }
    Ok(outcome)
}
