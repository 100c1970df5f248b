//! Feedback detection for continue mode
//!
//! Counts the human comments posted since the branch's last commit and
//! collects further signals that the PR needs attention (edited
//! descriptions, new commits on the default branch, failing checks,
//! requested changes, merge problems).
//!
//! Comment lookups and the commit time are required: their failures are
//! returned as errors. The other signals are best-effort and only logged
//! when they cannot be checked.

use crate::error::{LookupContext, Result, SolveError};
use crate::git::CommitTimeLookup;
use crate::RepoRef;
use chrono::{DateTime, Utc};
use gh_client::{
    CheckConclusion, Comment, CommentSource, GitHubClient, MergeableState, PullRequestDetails,
    PullRequestState, ReviewState,
};
use log::{debug, info, warn};
use regex::{Regex, RegexBuilder};
use std::fmt;

/// Automation output posted by previous runs (log uploads, session links)
const LOG_PATTERNS: &[&str] = &[
    r"📊.*Log file|solution\s+draft.*log",
    r"🔗.*Link:|💻.*Session:",
    r"Generated with.*solve\.mjs",
    r"Session ID:|Log file available:",
];

/// Recognizes comments that are automation output rather than feedback
#[derive(Debug, Clone)]
pub struct CommentFilter {
    patterns: Vec<Regex>,
}

impl CommentFilter {
    /// Built-in patterns plus `extra`, all case-insensitive
    pub fn new(extra: &[String]) -> Result<Self> {
        let patterns = LOG_PATTERNS
            .iter()
            .copied()
            .chain(extra.iter().map(String::as_str))
            .map(|pattern| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| SolveError::InvalidPattern {
                        pattern: pattern.to_string(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn is_log_artifact(&self, body: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(body))
    }
}

/// Which comments count as new feedback
#[derive(Debug, Clone)]
pub struct CommentWindow<'a> {
    pub last_commit: DateTime<Utc>,
    pub current_user: &'a str,
    /// Own comments after this point belong to the running session
    pub work_started_at: Option<DateTime<Utc>>,
}

impl CommentWindow<'_> {
    /// Whether a comment is feedback posted after the last commit
    pub fn is_new_feedback(&self, comment: &Comment, filter: &CommentFilter) -> bool {
        if comment.created_at <= self.last_commit {
            return false;
        }
        if comment.author == self.current_user
            && self
                .work_started_at
                .is_some_and(|start| comment.created_at > start)
        {
            return false;
        }
        !filter.is_log_artifact(&comment.body)
    }

    pub fn count(&self, comments: &[Comment], filter: &CommentFilter) -> usize {
        comments
            .iter()
            .filter(|c| self.is_new_feedback(c, filter))
            .count()
    }
}

/// A reason to revisit the PR other than comments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackSignal {
    PrDescriptionEdited,
    IssueDescriptionEdited,
    DefaultBranchCommits { branch: String, count: usize },
    PrState(PullRequestState),
    MergeState(MergeableState),
    FailedChecks(usize),
    ChangesRequested(usize),
}

impl fmt::Display for FeedbackSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedbackSignal::PrDescriptionEdited => {
                write!(f, "Pull request description was edited after last commit")
            }
            FeedbackSignal::IssueDescriptionEdited => {
                write!(f, "Issue description was edited after last commit")
            }
            FeedbackSignal::DefaultBranchCommits { branch, count } => {
                write!(f, "New commits on {} branch: {}", branch, count)
            }
            FeedbackSignal::PrState(state) => write!(f, "Pull request state: {}", state),
            FeedbackSignal::MergeState(state) => f.write_str(merge_state_description(*state)),
            FeedbackSignal::FailedChecks(count) => {
                write!(f, "Failed pull request checks: {}", count)
            }
            FeedbackSignal::ChangesRequested(count) => {
                write!(f, "Changes requested in reviews: {}", count)
            }
        }
    }
}

fn merge_state_description(state: MergeableState) -> &'static str {
    match state {
        MergeableState::Clean => "Merge status is CLEAN",
        MergeableState::Dirty => "Merge status is DIRTY (conflicts detected)",
        MergeableState::Unstable => "Merge status is UNSTABLE (non-passing commit status)",
        MergeableState::Blocked => "Merge status is BLOCKED",
        MergeableState::Behind => "Merge status is BEHIND (head ref is out of date)",
        MergeableState::HasHooks => "Merge status is HAS_HOOKS (has pre-receive hooks)",
        MergeableState::Unknown => "Merge status is UNKNOWN",
    }
}

/// Inputs for one feedback pass
#[derive(Debug, Clone)]
pub struct FeedbackRequest {
    pub repo: RepoRef,
    pub pr_number: u64,
    pub issue_number: u64,
    /// Branch whose last commit bounds "new"
    pub branch: String,
    pub current_user: String,
    pub work_started_at: Option<DateTime<Utc>>,
}

/// Result of a feedback pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackReport {
    pub new_pr_comments: usize,
    pub new_issue_comments: usize,
    pub signals: Vec<FeedbackSignal>,
    /// Comment counts first (always both), then one line per signal
    pub feedback_lines: Vec<String>,
}

impl FeedbackReport {
    pub fn new(new_pr_comments: usize, new_issue_comments: usize, signals: Vec<FeedbackSignal>) -> Self {
        let mut feedback_lines = vec![
            format!("New comments on the pull request: {}", new_pr_comments),
            format!("New comments on the issue: {}", new_issue_comments),
        ];
        feedback_lines.extend(signals.iter().map(ToString::to_string));
        Self {
            new_pr_comments,
            new_issue_comments,
            signals,
            feedback_lines,
        }
    }

    pub fn total_new_comments(&self) -> usize {
        self.new_pr_comments + self.new_issue_comments
    }

    /// Any comment or signal at all
    pub fn has_feedback(&self) -> bool {
        self.total_new_comments() > 0 || !self.signals.is_empty()
    }

    /// Block appended to the user prompt
    pub fn to_prompt_section(&self) -> String {
        format!("\n\n{}\n", self.feedback_lines.join("\n"))
    }
}

/// Count new comments and collect signals
pub async fn aggregate_feedback(
    client: &dyn GitHubClient,
    clock: &dyn CommitTimeLookup,
    filter: &CommentFilter,
    request: &FeedbackRequest,
) -> Result<FeedbackReport> {
    let repo = &request.repo;
    let last_commit = clock.last_commit_time(&request.branch).await?;
    info!("Last commit on {}: {}", request.branch, last_commit.to_rfc3339());

    let window = CommentWindow {
        last_commit,
        current_user: &request.current_user,
        work_started_at: request.work_started_at,
    };

    let mut pr_comments = client
        .list_review_comments(&repo.owner, &repo.repo, request.pr_number)
        .await
        .lookup(|| format!("fetch review comments of PR #{}", request.pr_number))?;
    let conversation = client
        .list_issue_comments(&repo.owner, &repo.repo, request.pr_number)
        .await
        .lookup(|| format!("fetch conversation comments of PR #{}", request.pr_number))?;
    pr_comments.extend(
        conversation
            .into_iter()
            .map(|c| c.with_source(CommentSource::PrConversation)),
    );

    let issue_comments = client
        .list_issue_comments(&repo.owner, &repo.repo, request.issue_number)
        .await
        .lookup(|| format!("fetch comments of issue #{}", request.issue_number))?;

    let new_pr_comments = window.count(&pr_comments, filter);
    let new_issue_comments = window.count(&issue_comments, filter);
    info!(
        "New comments: {} on PR #{}, {} on issue #{}",
        new_pr_comments, request.pr_number, new_issue_comments, request.issue_number
    );
    debug!(
        "Checked {} PR comment(s) and {} issue comment(s)",
        pr_comments.len(),
        issue_comments.len()
    );

    let signals = collect_signals(client, request, last_commit).await;
    for signal in &signals {
        debug!("Feedback signal: {}", signal);
    }

    Ok(FeedbackReport::new(new_pr_comments, new_issue_comments, signals))
}

/// Best-effort checks; each failure is a warning and skips that signal
async fn collect_signals(
    client: &dyn GitHubClient,
    request: &FeedbackRequest,
    last_commit: DateTime<Utc>,
) -> Vec<FeedbackSignal> {
    let repo = &request.repo;
    let mut signals = Vec::new();

    let pr = match client
        .fetch_pull_request(&repo.owner, &repo.repo, request.pr_number)
        .await
    {
        Ok(pr) => Some(pr),
        Err(e) => {
            warn!("Could not fetch PR #{} details: {:#}", request.pr_number, e);
            None
        }
    };

    if pr.as_ref().is_some_and(|pr| pr.updated_at > last_commit) {
        signals.push(FeedbackSignal::PrDescriptionEdited);
    }

    match client
        .fetch_issue(&repo.owner, &repo.repo, request.issue_number)
        .await
    {
        Ok(issue) if issue.updated_at > last_commit => {
            signals.push(FeedbackSignal::IssueDescriptionEdited)
        }
        Ok(_) => {}
        Err(e) => warn!("Could not check issue #{} edits: {:#}", request.issue_number, e),
    }

    match default_branch_commits(client, repo, last_commit).await {
        Ok(Some(signal)) => signals.push(signal),
        Ok(None) => {}
        Err(e) => warn!("Could not check default branch commits: {:#}", e),
    }

    if let Some(pr) = &pr {
        signals.extend(pr_status_signals(pr));

        match client
            .fetch_check_runs(&repo.owner, &repo.repo, &pr.head_sha)
            .await
        {
            Ok(checks) => {
                let failed = checks
                    .iter()
                    .filter(|c| c.conclusion == Some(CheckConclusion::Failure))
                    .filter(|c| c.completed_at.is_some_and(|t| t > last_commit))
                    .count();
                if failed > 0 {
                    signals.push(FeedbackSignal::FailedChecks(failed));
                }
            }
            Err(e) => warn!("Could not check PR #{} checks: {:#}", pr.number, e),
        }
    }

    match client
        .list_reviews(&repo.owner, &repo.repo, request.pr_number)
        .await
    {
        Ok(reviews) => {
            let requested = reviews
                .iter()
                .filter(|r| r.state == ReviewState::ChangesRequested)
                .filter(|r| r.submitted_at.is_some_and(|t| t > last_commit))
                .count();
            if requested > 0 {
                signals.push(FeedbackSignal::ChangesRequested(requested));
            }
        }
        Err(e) => warn!("Could not check PR #{} reviews: {:#}", request.pr_number, e),
    }

    signals
}

async fn default_branch_commits(
    client: &dyn GitHubClient,
    repo: &RepoRef,
    since: DateTime<Utc>,
) -> anyhow::Result<Option<FeedbackSignal>> {
    let branch = client.default_branch(&repo.owner, &repo.repo).await?;
    let count = client
        .count_commits_since(&repo.owner, &repo.repo, &branch, since)
        .await?;
    Ok((count > 0).then_some(FeedbackSignal::DefaultBranchCommits { branch, count }))
}

fn pr_status_signals(pr: &PullRequestDetails) -> Vec<FeedbackSignal> {
    let mut signals = Vec::new();
    if pr.state != PullRequestState::Open {
        signals.push(FeedbackSignal::PrState(pr.state));
    }
    match pr.mergeable_state {
        Some(MergeableState::Clean) | None => {}
        Some(state) => signals.push(FeedbackSignal::MergeState(state)),
    }
    signals
}

/// Outcome of the feedback gates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    /// Stop without doing work; not a failure
    Abort(String),
}

/// Conditions under which continuing is pointless
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedbackGate {
    pub only_on_new_comments: bool,
    pub only_on_feedback: bool,
}

impl FeedbackGate {
    pub fn evaluate(&self, report: &FeedbackReport) -> GateDecision {
        if self.only_on_new_comments && report.total_new_comments() == 0 {
            return GateDecision::Abort(
                "No new comments found since last commit; \
                 --auto-continue-only-on-new-comments requires new comments to continue"
                    .to_string(),
            );
        }

        if self.only_on_feedback && !report.has_feedback() {
            return GateDecision::Abort(
                [
                    "No feedback detected since last commit; --continue-only-on-feedback requires any of:",
                    "  • New comments (excluding automation logs)",
                    "  • Edited issue/PR descriptions",
                    "  • New commits on default branch",
                    "  • Pull request state is not OPEN (closed or merged)",
                    "  • Merge status is not CLEAN (conflicts, unstable, blocked, etc.)",
                    "  • Failed pull request checks",
                    "  • Changes requested via review",
                ]
                .join("\n"),
            );
        }

        GateDecision::Proceed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{at, pr_details, MockClient};
    use async_trait::async_trait;
    use gh_client::{CheckRun, Review};
    use pretty_assertions::assert_eq;

    struct FixedClock(Option<DateTime<Utc>>);

    #[async_trait]
    impl CommitTimeLookup for FixedClock {
        async fn last_commit_time(&self, branch: &str) -> Result<DateTime<Utc>> {
            self.0.ok_or_else(|| SolveError::CommitTime {
                branch: branch.to_string(),
                detail: "unknown revision".to_string(),
            })
        }
    }

    fn comment(id: u64, author: &str, created_at: &str, body: &str) -> Comment {
        Comment {
            id,
            author: author.to_string(),
            created_at: at(created_at),
            body: body.to_string(),
            source: CommentSource::Issue,
        }
    }

    fn filter() -> CommentFilter {
        CommentFilter::new(&[]).unwrap()
    }

    fn request() -> FeedbackRequest {
        FeedbackRequest {
            repo: RepoRef::new("owner", "repo"),
            pr_number: 10,
            issue_number: 1,
            branch: "issue-1-0123456789ab".to_string(),
            current_user: "me".to_string(),
            work_started_at: Some(at("2025-01-03T00:00:00Z")),
        }
    }

    /// PR and issue untouched since the last commit (2025-01-02)
    fn quiet_client() -> MockClient {
        MockClient::new()
            .with_pr_details(pr_details(10, false))
            .with_issue(1, at("2025-01-01T00:00:00Z"))
    }

    fn clock() -> FixedClock {
        FixedClock(Some(at("2025-01-02T00:00:00Z")))
    }

    #[test]
    fn test_only_comments_after_last_commit_count() {
        let window = CommentWindow {
            last_commit: at("2025-01-02T00:00:00Z"),
            current_user: "me",
            work_started_at: None,
        };
        let comments = vec![
            comment(1, "alice", "2025-01-01T00:00:00Z", "old"),
            comment(2, "alice", "2025-01-02T00:00:00Z", "same instant"),
            comment(3, "alice", "2025-01-02T00:00:01Z", "new"),
        ];
        assert_eq!(window.count(&comments, &filter()), 1);
    }

    #[test]
    fn test_own_comments_during_session_are_excluded() {
        let window = CommentWindow {
            last_commit: at("2025-01-02T00:00:00Z"),
            current_user: "me",
            work_started_at: Some(at("2025-01-03T00:00:00Z")),
        };
        let comments = vec![
            comment(1, "me", "2025-01-02T12:00:00Z", "before session"),
            comment(2, "me", "2025-01-03T12:00:00Z", "during session"),
            comment(3, "alice", "2025-01-03T12:00:00Z", "please fix"),
        ];
        assert_eq!(window.count(&comments, &filter()), 2);
    }

    #[tokio::test]
    async fn test_own_comment_after_session_start_is_not_counted() {
        let client = quiet_client().with_issue_comments(
            10,
            vec![
                comment(1, "bot", "2025-01-02T00:01:00Z", "Please add a test"),
                comment(2, "me", "2025-01-02T00:02:00Z", "Please add a test"),
            ],
        );
        let mut req = request();
        req.work_started_at = Some(at("2025-01-02T00:01:30Z"));

        let report = aggregate_feedback(&client, &clock(), &filter(), &req)
            .await
            .unwrap();

        assert_eq!(report.new_pr_comments, 1);
        assert_eq!(report.feedback_lines[0], "New comments on the pull request: 1");
    }

    #[test]
    fn test_log_comments_are_excluded() {
        let f = filter();
        assert!(f.is_log_artifact("📊 Log file uploaded"));
        assert!(f.is_log_artifact("This SOLUTION DRAFT log is attached"));
        assert!(f.is_log_artifact("💻 Session: abc"));
        assert!(f.is_log_artifact("🤖 Generated with hive-mind solve.mjs"));
        assert!(f.is_log_artifact("session id: 1234"));
        assert!(!f.is_log_artifact("Please rename this function"));
    }

    #[test]
    fn test_extra_patterns() {
        let f = CommentFilter::new(&["posted by ci-bot".to_string()]).unwrap();
        assert!(f.is_log_artifact("Posted by CI-Bot"));

        let err = CommentFilter::new(&["(unclosed".to_string()]).unwrap_err();
        assert!(matches!(err, SolveError::InvalidPattern { .. }));
    }

    #[test]
    fn test_report_always_lists_both_counts() {
        let report = FeedbackReport::new(0, 0, vec![]);
        assert_eq!(
            report.feedback_lines,
            vec![
                "New comments on the pull request: 0",
                "New comments on the issue: 0",
            ]
        );
        assert_eq!(
            report.to_prompt_section(),
            "\n\nNew comments on the pull request: 0\nNew comments on the issue: 0\n"
        );
        assert!(!report.has_feedback());
    }

    #[test]
    fn test_signal_lines() {
        let report = FeedbackReport::new(
            1,
            0,
            vec![
                FeedbackSignal::DefaultBranchCommits {
                    branch: "main".to_string(),
                    count: 3,
                },
                FeedbackSignal::PrState(PullRequestState::Closed),
                FeedbackSignal::MergeState(MergeableState::Dirty),
            ],
        );
        assert_eq!(
            &report.feedback_lines[2..],
            &[
                "New commits on main branch: 3",
                "Pull request state: CLOSED",
                "Merge status is DIRTY (conflicts detected)",
            ]
        );
    }

    #[tokio::test]
    async fn test_aggregate_counts_pr_and_issue_comments() {
        let client = quiet_client()
            .with_review_comments(
                10,
                vec![comment(1, "alice", "2025-01-02T10:00:00Z", "nit: rename")],
            )
            .with_issue_comments(
                10,
                vec![
                    comment(2, "bob", "2025-01-02T11:00:00Z", "looks close"),
                    comment(3, "me", "2025-01-03T01:00:00Z", "🤖 AI Work Session Started"),
                ],
            )
            .with_issue_comments(
                1,
                vec![
                    comment(4, "carol", "2025-01-01T00:00:00Z", "old"),
                    comment(5, "carol", "2025-01-02T12:00:00Z", "📊 Log file: solve.log"),
                ],
            );

        let report = aggregate_feedback(&client, &clock(), &filter(), &request())
            .await
            .unwrap();

        assert_eq!(report.new_pr_comments, 2);
        assert_eq!(report.new_issue_comments, 0);
        assert_eq!(
            report.feedback_lines,
            vec![
                "New comments on the pull request: 2",
                "New comments on the issue: 0",
            ]
        );
    }

    #[tokio::test]
    async fn test_no_comments_still_reports_zero_counts() {
        let report = aggregate_feedback(&quiet_client(), &clock(), &filter(), &request())
            .await
            .unwrap();
        assert_eq!(report.total_new_comments(), 0);
        assert_eq!(report.feedback_lines.len(), 2);
    }

    #[tokio::test]
    async fn test_commit_time_failure_is_error() {
        let err = aggregate_feedback(&quiet_client(), &FixedClock(None), &filter(), &request())
            .await
            .unwrap_err();
        assert!(matches!(err, SolveError::CommitTime { .. }));
    }

    #[tokio::test]
    async fn test_comment_lookup_failure_is_error() {
        let client = quiet_client().failing_comments();
        let err = aggregate_feedback(&client, &clock(), &filter(), &request())
            .await
            .unwrap_err();
        assert!(matches!(err, SolveError::Lookup { .. }));
    }

    #[tokio::test]
    async fn test_extended_signals() {
        let mut pr = pr_details(10, false);
        pr.updated_at = at("2025-01-02T06:00:00Z");
        pr.mergeable_state = Some(MergeableState::Behind);

        let client = MockClient::new()
            .with_pr_details(pr)
            .with_issue(1, at("2025-01-02T07:00:00Z"))
            .with_commits_since(4)
            .with_checks(vec![
                CheckRun {
                    id: 1,
                    name: "test".to_string(),
                    conclusion: Some(CheckConclusion::Failure),
                    completed_at: Some(at("2025-01-02T08:00:00Z")),
                },
                CheckRun {
                    id: 2,
                    name: "lint".to_string(),
                    conclusion: Some(CheckConclusion::Failure),
                    completed_at: Some(at("2025-01-01T08:00:00Z")),
                },
            ])
            .with_reviews(vec![Review {
                id: 1,
                author: "alice".to_string(),
                state: ReviewState::ChangesRequested,
                submitted_at: Some(at("2025-01-02T09:00:00Z")),
            }]);

        let report = aggregate_feedback(&client, &clock(), &filter(), &request())
            .await
            .unwrap();

        assert_eq!(
            report.signals,
            vec![
                FeedbackSignal::PrDescriptionEdited,
                FeedbackSignal::IssueDescriptionEdited,
                FeedbackSignal::DefaultBranchCommits {
                    branch: "main".to_string(),
                    count: 4
                },
                FeedbackSignal::MergeState(MergeableState::Behind),
                FeedbackSignal::FailedChecks(1),
                FeedbackSignal::ChangesRequested(1),
            ]
        );
        assert!(report.has_feedback());
    }

    #[tokio::test]
    async fn test_missing_pr_details_only_skips_signals() {
        let client = MockClient::new().with_issue(1, at("2025-01-01T00:00:00Z"));
        let report = aggregate_feedback(&client, &clock(), &filter(), &request())
            .await
            .unwrap();
        assert!(report.signals.is_empty());
    }

    #[test]
    fn test_gate_only_on_new_comments() {
        let gate = FeedbackGate {
            only_on_new_comments: true,
            only_on_feedback: false,
        };
        assert!(matches!(
            gate.evaluate(&FeedbackReport::new(0, 0, vec![FeedbackSignal::FailedChecks(1)])),
            GateDecision::Abort(_)
        ));
        assert_eq!(
            gate.evaluate(&FeedbackReport::new(0, 1, vec![])),
            GateDecision::Proceed
        );
    }

    #[test]
    fn test_gate_only_on_feedback() {
        let gate = FeedbackGate {
            only_on_new_comments: false,
            only_on_feedback: true,
        };
        match gate.evaluate(&FeedbackReport::new(0, 0, vec![])) {
            GateDecision::Abort(message) => assert!(message.contains("Failed pull request checks")),
            GateDecision::Proceed => panic!("expected abort"),
        }
        assert_eq!(
            gate.evaluate(&FeedbackReport::new(0, 0, vec![FeedbackSignal::FailedChecks(1)])),
            GateDecision::Proceed
        );
    }

    #[test]
    fn test_gates_off_always_proceed() {
        assert_eq!(
            FeedbackGate::default().evaluate(&FeedbackReport::new(0, 0, vec![])),
            GateDecision::Proceed
        );
    }
}
