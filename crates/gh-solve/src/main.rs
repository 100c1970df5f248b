use clap::Parser;
use std::process::ExitCode;

mod agent;
mod cli;
mod logger;
mod solve;

use cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    // .env may carry GITHUB_TOKEN
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logger::init(cli.verbose);

    log::debug!("Starting gh-solve for {}", cli.issue_url);

    match solve::run(cli).await {
        Ok(code) => code,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
