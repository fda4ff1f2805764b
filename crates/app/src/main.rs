use std::io;

use log::debug;
use services::{AppServices, Clock};

mod args;
mod commands;

use args::{Args, ArgsError, Command, print_usage};

/// Make sure the directory of a file-backed database exists.
fn prepare_sqlite_dir(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url.contains(":memory:") {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let parsed = Args::parse(std::env::args().skip(1), |key| std::env::var(key).ok()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    if parsed.command == Command::Help {
        print_usage();
        return Ok(());
    }

    debug!(
        "db={} choices={} boxes={}",
        parsed.db_url,
        parsed.settings.choice_count(),
        parsed.settings.leitner().box_count()
    );

    // Open + migrate SQLite here so services never see connection setup.
    prepare_sqlite_dir(&parsed.db_url)?;
    let app = AppServices::new_sqlite(&parsed.db_url, parsed.settings, Clock::system()).await?;

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout().lock();
    commands::run_command(&app, parsed.command, &mut input, &mut out).await
}

#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
