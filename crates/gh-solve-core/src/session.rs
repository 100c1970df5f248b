//! Work session transitions on the pull request
//!
//! While work is in progress the PR is a draft and carries a start
//! comment; when work ends an end comment is posted and the PR goes back
//! to ready for review. Every GitHub call here is best-effort: failures
//! are logged and the transition still completes.

use crate::resolution::ResolutionOutcome;
use crate::RepoRef;
use chrono::{DateTime, SecondsFormat, Utc};
use gh_client::GitHubClient;
use log::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Active { started_at: DateTime<Utc> },
}

/// Session bookkeeping for one PR
#[derive(Debug, Clone)]
pub struct WorkSession {
    repo: RepoRef,
    pr_number: u64,
    state: SessionState,
}

fn iso(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn start_comment(started_at: DateTime<Utc>) -> String {
    format!(
        "🤖 **AI Work Session Started**\n\n\
         Starting automated work session at {}\n\n\
         The PR has been converted to draft mode while work is in progress.\n\n\
         _This comment marks the beginning of an AI work session. \
         Please wait working session to finish, and provide your feedback._",
        iso(started_at)
    )
}

pub fn end_comment(ended_at: DateTime<Utc>) -> String {
    format!(
        "🤖 **AI Work Session Completed**\n\n\
         Work session ended at {}\n\n\
         The PR will be converted back to ready for review.\n\n\
         _This comment marks the end of an AI work session. \
         New comments after this time will be considered as feedback._",
        iso(ended_at)
    )
}

impl WorkSession {
    pub fn new(repo: RepoRef, pr_number: u64) -> Self {
        Self {
            repo,
            pr_number,
            state: SessionState::Idle,
        }
    }

    /// A session applies only when continuing on an existing PR in watch
    /// or auto-continue mode
    pub fn for_outcome(repo: &RepoRef, outcome: &ResolutionOutcome, tracks_session: bool) -> Option<Self> {
        if !tracks_session {
            return None;
        }
        outcome
            .pr_number()
            .map(|pr_number| Self::new(repo.clone(), pr_number))
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active { .. })
    }

    pub fn pr_number(&self) -> u64 {
        self.pr_number
    }

    /// Idle -> Active: convert to draft if needed, post the start comment
    pub async fn start(&mut self, client: &dyn GitHubClient, now: DateTime<Utc>) {
        if self.is_active() {
            debug!("Work session on PR #{} already active", self.pr_number);
            return;
        }
        info!("Starting work session at {}", iso(now));
        let (owner, repo) = (&self.repo.owner, &self.repo.repo);

        match client.fetch_pull_request(owner, repo, self.pr_number).await {
            Ok(pr) if pr.is_draft => info!("PR #{} already in draft mode", self.pr_number),
            Ok(_) => match client.set_draft_state(owner, repo, self.pr_number, true).await {
                Ok(()) => info!("PR #{} converted to draft", self.pr_number),
                Err(e) => warn!("Could not convert PR #{} to draft: {:#}", self.pr_number, e),
            },
            Err(e) => warn!(
                "Could not check draft status of PR #{}: {:#}",
                self.pr_number, e
            ),
        }

        if let Err(e) = client
            .post_comment(owner, repo, self.pr_number, &start_comment(now))
            .await
        {
            warn!("Could not post work session start comment: {:#}", e);
        }

        self.state = SessionState::Active { started_at: now };
    }

    /// Active -> Idle: post the end comment (unless logs were attached,
    /// which already mark the end) and convert back to ready
    pub async fn end(&mut self, client: &dyn GitHubClient, now: DateTime<Utc>, logs_attached: bool) {
        if !self.is_active() {
            return;
        }
        info!("Ending work session at {}", iso(now));
        let (owner, repo) = (&self.repo.owner, &self.repo.repo);

        if logs_attached {
            info!("Skipping end comment (logs already attached)");
        } else if let Err(e) = client
            .post_comment(owner, repo, self.pr_number, &end_comment(now))
            .await
        {
            warn!("Could not post work session end comment: {:#}", e);
        }

        match client.fetch_pull_request(owner, repo, self.pr_number).await {
            Ok(pr) if !pr.is_draft => info!("PR #{} already ready for review", self.pr_number),
            Ok(_) => match client.set_draft_state(owner, repo, self.pr_number, false).await {
                Ok(()) => info!("PR #{} converted to ready for review", self.pr_number),
                Err(e) => warn!("Could not convert PR #{} to ready: {:#}", self.pr_number, e),
            },
            Err(e) => warn!(
                "Could not check draft status of PR #{}: {:#}",
                self.pr_number, e
            ),
        }

        self.state = SessionState::Idle;
    }
}
