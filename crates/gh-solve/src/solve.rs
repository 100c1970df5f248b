//! One solve invocation, start to finish

use crate::agent::{run_agent, AgentContext};
use crate::cli::Cli;
use anyhow::{Context, Result};
use chrono::Utc;
use gh_client::{ClientManager, GitHubClient};
use gh_solve_config::SolveConfig;
use gh_solve_core::{
    aggregate_feedback, ensure_pull_request, generate_branch_name, missing_pull_request_help,
    resolve_for_issue, CommentFilter, FeedbackGate, FeedbackRequest, GateDecision, GitCli,
    IssueTarget, PullRequestRequest, ResolutionOutcome, ResolveOptions, RetryPolicy, SolveError,
    WorkSession,
};
use log::{info, warn};
use std::process::ExitCode;

/// Exit code after Ctrl-C
const INTERRUPTED: u8 = 130;

pub async fn run(cli: Cli) -> Result<ExitCode> {
    let target = IssueTarget::parse(&cli.issue_url)?;
    let mut config = SolveConfig::load();
    cli.apply_to(&mut config);

    let mut clients = ClientManager::new();
    let client = clients
        .get_client(Some(target.host.as_str()))
        .await
        .with_context(|| format!("Failed to create GitHub client for {}", target.host))?;

    if !config.auto_continue && !cli.resolve_only {
        let branch = generate_branch_name(target.number);
        info!("Starting fresh on {}", branch);
        return run_work(&cli, &target, &branch, None, "").await;
    }

    let options = ResolveOptions {
        fork: config.fork,
        fork_owner: None,
    };
    let outcome = resolve_for_issue(&client, &target.repo, target.number, &options).await?;

    if cli.resolve_only {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(ExitCode::SUCCESS);
    }

    let (branch, pr_number, remote) = match outcome {
        ResolutionOutcome::StartFresh => {
            let branch = generate_branch_name(target.number);
            info!("Starting fresh on {}", branch);
            return run_work(&cli, &target, &branch, None, "").await;
        }
        ResolutionOutcome::Continue {
            branch_name,
            pr_number,
            remote,
        } => (branch_name, pr_number, remote),
    };

    let pr_number = match pr_number {
        Some(pr) => pr,
        None => {
            let request = PullRequestRequest {
                repo: target.repo.clone(),
                issue_number: target.number,
                branch: branch.clone(),
                remote: remote.clone(),
                base_branch: config.base_branch.clone(),
                auto_create: config.auto_pull_request_creation,
                retry: RetryPolicy::from(config.compare_retry),
            };
            match ensure_pull_request(&client, &request).await {
                Ok(pr) => pr,
                Err(e @ SolveError::MissingPullRequest { .. }) => {
                    eprintln!("{}", missing_pull_request_help(&target, &e));
                    return Err(e.into());
                }
                Err(e) => return Err(e.into()),
            }
        }
    };
    let outcome = ResolutionOutcome::Continue {
        branch_name: branch.clone(),
        pr_number: Some(pr_number),
        remote,
    };

    let invocation_started = Utc::now();
    let current_user = client
        .current_user()
        .await
        .context("Failed to determine the authenticated user")?;
    let filter = CommentFilter::new(&config.extra_log_patterns)?;
    let request = FeedbackRequest {
        repo: target.repo.clone(),
        pr_number,
        issue_number: target.number,
        branch: branch.clone(),
        current_user,
        work_started_at: Some(invocation_started),
    };
    let clock = GitCli::new(&cli.repo_path);
    let report = aggregate_feedback(&client, &clock, &filter, &request).await?;

    let gate = FeedbackGate {
        only_on_new_comments: config.auto_continue_only_on_new_comments,
        only_on_feedback: config.continue_only_on_feedback,
    };
    if let GateDecision::Abort(reason) = gate.evaluate(&report) {
        info!("{}", reason);
        return Ok(ExitCode::SUCCESS);
    }

    let mut session = WorkSession::for_outcome(&target.repo, &outcome, config.tracks_session());
    if let Some(session) = session.as_mut() {
        session.start(&client, Utc::now()).await;
    }

    let prompt = report.to_prompt_section();
    let result = tokio::select! {
        result = run_work(&cli, &target, &branch, Some(pr_number), &prompt) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted");
            Ok(ExitCode::from(INTERRUPTED))
        }
    };

    if let Some(session) = session.as_mut() {
        session.end(&client, Utc::now(), config.attach_logs).await;
    }
    result
}

/// Hand over to the agent, or print what it would get
async fn run_work(
    cli: &Cli,
    target: &IssueTarget,
    branch: &str,
    pr_number: Option<u64>,
    prompt: &str,
) -> Result<ExitCode> {
    if cli.agent.is_empty() {
        println!("Branch: {}", branch);
        if let Some(pr) = pr_number {
            println!("Pull request: #{}", pr);
        }
        print!("{}", prompt);
        return Ok(ExitCode::SUCCESS);
    }

    let ctx = AgentContext {
        issue_url: &cli.issue_url,
        branch,
        pr_number,
        prompt,
    };
    info!("Working on {} in {}", target, cli.repo_path.display());
    let status = run_agent(&cli.agent, &cli.repo_path, &ctx).await?;
    Ok(match status.code() {
        Some(0) => ExitCode::SUCCESS,
        Some(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        None => ExitCode::FAILURE,
    })
}
