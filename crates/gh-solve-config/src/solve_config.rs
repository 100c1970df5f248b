//! Solve configuration
//!
//! Configuration loaded from `.gh-solve.toml`. Every field has a default,
//! so a partial file is fine. Command line flags override these values.

use serde::{Deserialize, Serialize};

/// Configuration for one solve invocation
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SolveConfig {
    /// Continue with an existing branch/PR for the issue instead of starting fresh
    #[serde(default)]
    pub auto_continue: bool,

    /// Look for reusable branches in the fork owner's repository too
    #[serde(default)]
    pub fork: bool,

    /// Watch mode (continuous feedback monitoring)
    #[serde(default)]
    pub watch: bool,

    /// Abort when continuing and no new comments were posted since the last commit
    #[serde(default)]
    pub auto_continue_only_on_new_comments: bool,

    /// Abort when continuing and no feedback of any kind was detected
    #[serde(default)]
    pub continue_only_on_feedback: bool,

    /// Logs are attached to the PR at the end of the run
    #[serde(default)]
    pub attach_logs: bool,

    /// Create a draft PR when continuing on a branch that has none
    #[serde(default = "default_true")]
    pub auto_pull_request_creation: bool,

    /// Base branch for new PRs (defaults to the repository default branch)
    #[serde(default)]
    pub base_branch: Option<String>,

    /// Additional regexes for automation comments that are not feedback
    #[serde(default)]
    pub extra_log_patterns: Vec<String>,

    /// Backoff while waiting for GitHub to index pushed commits
    #[serde(default)]
    pub compare_retry: CompareRetryConfig,
}

/// Capped linear backoff: delay before attempt n is `min(step_ms * n, max_delay_ms)`
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct CompareRetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_step_ms")]
    pub step_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    5
}

fn default_step_ms() -> u64 {
    2000
}

fn default_max_delay_ms() -> u64 {
    10_000
}

impl Default for CompareRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            step_ms: default_step_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            auto_continue: false,
            fork: false,
            watch: false,
            auto_continue_only_on_new_comments: false,
            continue_only_on_feedback: false,
            attach_logs: false,
            auto_pull_request_creation: default_true(),
            base_branch: None,
            extra_log_patterns: Vec::new(),
            compare_retry: CompareRetryConfig::default(),
        }
    }
}

impl SolveConfig {
    /// Load config from CWD first, then home directory, or use defaults
    pub fn load() -> Self {
        if let Some(content) = crate::load_config_file() {
            match Self::parse(&content) {
                Ok(config) => {
                    log::info!("Loaded solve config from file");
                    return config;
                }
                Err(e) => {
                    log::warn!("Failed to parse config file: {}", e);
                }
            }
        }

        log::debug!("Using default solve config");
        Self::default()
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Whether the session transitions (draft toggling, comments) apply
    pub fn tracks_session(&self) -> bool {
        self.watch || self.auto_continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SolveConfig::default();
        assert!(!config.auto_continue);
        assert!(!config.fork);
        assert!(config.auto_pull_request_creation);
        assert!(config.base_branch.is_none());
        assert_eq!(config.compare_retry.max_attempts, 5);
        assert_eq!(config.compare_retry.step_ms, 2000);
        assert_eq!(config.compare_retry.max_delay_ms, 10_000);
    }

    #[test]
    fn test_config_deserialize_partial() {
        let toml = r#"
            auto_continue = true
            base_branch = "develop"
        "#;
        let config = SolveConfig::parse(toml).unwrap();
        assert!(config.auto_continue);
        assert_eq!(config.base_branch.as_deref(), Some("develop"));
        // Other fields should use defaults
        assert!(config.auto_pull_request_creation);
        assert_eq!(config.compare_retry, CompareRetryConfig::default());
    }

    #[test]
    fn test_config_deserialize_retry_table() {
        let toml = r#"
            extra_log_patterns = ["Posted by ci-bot"]

            [compare_retry]
            max_attempts = 3
        "#;
        let config = SolveConfig::parse(toml).unwrap();
        assert_eq!(config.extra_log_patterns, vec!["Posted by ci-bot"]);
        assert_eq!(config.compare_retry.max_attempts, 3);
        assert_eq!(config.compare_retry.step_ms, 2000);
    }

    #[test]
    fn test_tracks_session() {
        let mut config = SolveConfig::default();
        assert!(!config.tracks_session());
        config.watch = true;
        assert!(config.tracks_session());
        config.watch = false;
        config.auto_continue = true;
        assert!(config.tracks_session());
    }

    #[test]
    fn test_invalid_config_is_error() {
        assert!(SolveConfig::parse("auto_continue = \"yes\"").is_err());
    }
}
