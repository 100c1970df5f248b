//! Configuration and file management for gh-solve
//!
//! This crate provides:
//! - File path utilities for the config directory
//! - Configuration file loading (TOML)
//! - Solve configuration (SolveConfig)

pub mod config_file;
pub mod paths;
pub mod solve_config;

pub use config_file::load_config_file;
pub use paths::{app_config_path, config_dir};
pub use solve_config::{CompareRetryConfig, SolveConfig};
