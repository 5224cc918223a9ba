use std::sync::{Arc, RwLock};

use anyhow::bail;
use clap::Parser;

mod app;
mod cli;
mod config;
mod dedup;
mod merge;
mod records;
mod search;
mod sources;
mod storage;
mod store;
#[cfg(test)]
mod tests;
mod web;

use app::App;
use config::Config;
use inquire::error::InquireResult;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = cli::Args::parse();

    let config = Arc::new(RwLock::new(Config::load()));
    let base_path = config.read().unwrap().base_path().to_string();

    let store = Arc::new(store::BackendJson::load(&base_path)?);
    let app = Arc::new(App::new(sources::default_sources(), store, config));

    match args.command {
        cli::Command::Daemon {} => {
            web::start_daemon(app);
            Ok(())
        }

        cli::Command::Search { term, count } => {
            let results = app.search(&term)?;

            if count {
                println!("{} records found", results.len());
                return Ok(());
            }

            println!("{}", serde_json::to_string_pretty(&results).unwrap());
            Ok(())
        }

        cli::Command::Import {} => {
            let summary = app.import_from_browser()?;
            println!("{}", serde_json::to_string_pretty(&summary).unwrap());
            Ok(())
        }

        cli::Command::ImportRecent { minutes } => {
            let since_ms = app::service::now_ms() - minutes as i64 * 60 * 1000;
            let outcome = app.import_recent_history(since_ms)?;
            println!("{}", serde_json::to_string_pretty(&outcome).unwrap());
            Ok(())
        }

        cli::Command::Count {} => {
            let counts = app.counts()?;
            println!("{}", serde_json::to_string_pretty(&counts).unwrap());
            Ok(())
        }

        cli::Command::Reset { yes } => {
            if !yes {
                match inquire::prompt_confirmation(
                    "You are about to wipe the entire index, bookmarks included. Are you really sure?",
                ) {
                    InquireResult::Ok(true) => {}
                    InquireResult::Ok(false) => return Ok(()),
                    InquireResult::Err(err) => bail!("An error occurred: {}", err),
                }
            }

            app.reset()?;
            println!("index reset");
            Ok(())
        }
    }
}
