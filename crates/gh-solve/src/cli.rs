//! Command line interface

use clap::Parser;
use gh_solve_config::SolveConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gh-solve")]
#[command(
    version,
    about = "Resume work on a GitHub issue from its existing branch and pull request",
    after_help = "EXAMPLES:
    # Show which branch/PR would be continued
    gh-solve https://github.com/owner/repo/issues/42 --auto-continue --resolve-only

    # Continue only when someone commented, feeding the feedback to an agent
    gh-solve https://github.com/owner/repo/issues/42 --auto-continue \\
        --auto-continue-only-on-new-comments -- my-agent --stdin

CONFIG:
    Defaults are read from .gh-solve.toml (current directory, then home).
    Flags given here override the file."
)]
pub struct Cli {
    /// Issue URL, e.g. https://github.com/owner/repo/issues/42
    pub issue_url: String,

    /// Continue on an existing branch/PR for the issue
    #[arg(long)]
    pub auto_continue: bool,

    /// Also look for branches in your fork of the repository
    #[arg(long)]
    pub fork: bool,

    /// Watch mode: mark the PR as draft while working
    #[arg(long)]
    pub watch: bool,

    /// Stop (successfully) when nobody commented since the last commit
    #[arg(long)]
    pub auto_continue_only_on_new_comments: bool,

    /// Stop (successfully) when no feedback of any kind was detected
    #[arg(long)]
    pub continue_only_on_feedback: bool,

    /// Logs are attached to the PR by a separate step; only skips the end comment
    #[arg(long)]
    pub attach_logs: bool,

    /// Never create a PR for a branch that has none
    #[arg(long)]
    pub no_auto_pull_request_creation: bool,

    /// Base branch for a created PR (default: repository default branch)
    #[arg(long)]
    pub base_branch: Option<String>,

    /// Local clone used for commit times and as the agent's working directory
    #[arg(long, default_value = ".")]
    pub repo_path: PathBuf,

    /// Print the resolution outcome as JSON and exit
    #[arg(long)]
    pub resolve_only: bool,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Agent command; receives the feedback block on stdin
    #[arg(last = true)]
    pub agent: Vec<String>,
}

impl Cli {
    /// Apply flags on top of the file configuration
    ///
    /// Flags only switch features on; `--no-auto-pull-request-creation`
    /// is the one flag that switches a default off.
    pub fn apply_to(&self, config: &mut SolveConfig) {
        config.auto_continue |= self.auto_continue;
        config.fork |= self.fork;
        config.watch |= self.watch;
        config.auto_continue_only_on_new_comments |= self.auto_continue_only_on_new_comments;
        config.continue_only_on_feedback |= self.continue_only_on_feedback;
        config.attach_logs |= self.attach_logs;
        if self.no_auto_pull_request_creation {
            config.auto_pull_request_creation = false;
        }
        if let Some(base) = &self.base_branch {
            config.base_branch = Some(base.clone());
        }
    }
}
