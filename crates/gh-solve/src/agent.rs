//! Agent subprocess
//!
//! The agent gets the user-prompt feedback block on stdin and the
//! resolved branch/PR in its environment.

use anyhow::{Context, Result};
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::io::AsyncWriteExt;

/// What the agent works on
pub struct AgentContext<'a> {
    pub issue_url: &'a str,
    pub branch: &'a str,
    pub pr_number: Option<u64>,
    pub prompt: &'a str,
}

pub async fn run_agent(command: &[String], repo_path: &Path, ctx: &AgentContext<'_>) -> Result<ExitStatus> {
    let (program, args) = command
        .split_first()
        .context("Agent command is empty")?;

    let mut cmd = tokio::process::Command::new(program);
    cmd.args(args)
        .current_dir(repo_path)
        .env("GH_SOLVE_ISSUE_URL", ctx.issue_url)
        .env("GH_SOLVE_BRANCH", ctx.branch)
        .stdin(Stdio::piped())
        .kill_on_drop(true);
    if let Some(pr) = ctx.pr_number {
        cmd.env("GH_SOLVE_PR", pr.to_string());
    }

    log::info!("Running agent: {}", command.join(" "));
    let mut child = cmd
        .spawn()
        .with_context(|| format!("Failed to start agent '{}'", program))?;

    if let Some(mut stdin) = child.stdin.take() {
        // Agents that ignore stdin may exit before reading it
        if let Err(e) = stdin.write_all(ctx.prompt.as_bytes()).await {
            log::warn!("Could not write feedback to agent stdin: {}", e);
        }
    }

    let status = child.wait().await.context("Failed to wait for agent")?;
    log::info!("Agent finished: {}", status);
    Ok(status)
}
