//! Terminal logging using env_logger
//!
//! `info` by default, `debug` with `--verbose`. `RUST_LOG` wins over both.

use log::LevelFilter;

pub fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(LevelFilter::Warn)
        .filter_module("gh_solve", level)
        .filter_module("gh_solve_core", level)
        .filter_module("gh_solve_config", level)
        .filter_module("gh_client", level)
        .parse_env("RUST_LOG")
        .format_timestamp_secs()
        .init();
}
