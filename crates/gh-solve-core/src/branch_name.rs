//! Issue branch naming
//!
//! Issue branches are named `issue-{number}-{hash}`. This module is the one
//! place that knows the pattern; everything else goes through
//! [`parse_branch_name`].

use regex::Regex;
use std::sync::OnceLock;

/// Components of an issue branch name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueBranch {
    pub issue_number: u64,
    pub hash: String,
}

/// Hash format of an issue branch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchFormat {
    /// 8 lowercase hex chars
    Legacy,
    /// 12 lowercase hex chars (what [`generate_branch_name`] produces)
    Current,
    /// Any other alphanumeric suffix
    Other,
}

fn branch_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^issue-(\d+)-([0-9A-Za-z]+)$").expect("valid branch regex"))
}

/// Parse `issue-{number}-{hash}`
///
/// Returns None for anything else, including issue numbers that do not
/// fit in a u64.
pub fn parse_branch_name(name: &str) -> Option<IssueBranch> {
    let caps = branch_regex().captures(name)?;
    let issue_number = caps[1].parse().ok()?;
    Some(IssueBranch {
        issue_number,
        hash: caps[2].to_string(),
    })
}

/// Whether `name` is an issue branch for exactly `issue_number`
///
/// The issue id is compared numerically, so `issue-23-…` never matches 2.
pub fn matches_issue(name: &str, issue_number: u64) -> bool {
    parse_branch_name(name).is_some_and(|b| b.issue_number == issue_number)
}

impl IssueBranch {
    pub fn format(&self) -> BranchFormat {
        let is_hex = self
            .hash
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
        match (is_hex, self.hash.len()) {
            (true, 8) => BranchFormat::Legacy,
            (true, 12) => BranchFormat::Current,
            _ => BranchFormat::Other,
        }
    }
}

/// Generate a fresh branch name `issue-{number}-{12 hex chars}`
pub fn generate_branch_name(issue_number: u64) -> String {
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!("issue-{}-{}", issue_number, &random[..12])
}
