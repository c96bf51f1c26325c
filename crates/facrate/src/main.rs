#[cfg(all(feature = "mimalloc", not(target_family = "wasm")))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use env_logger::{Env, Target};
use facrate_api::{Config, RemoteStore};
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Arc;

mod profiling;

#[derive(Parser)]
#[command(name = "facrate")]
#[command(about = "Search VIT faculty and rate them anonymously", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short = 'd', long = "debug", hide = true)]
    debug: bool,

    /// Write logs here instead of the per-user data directory
    #[arg(long = "log-file", value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Write a performance profile to the specified path (Chrome tracing JSON format).
    /// View with chrome://tracing or https://ui.perfetto.dev/
    #[arg(long = "profile", value_name = "PATH", hide = true)]
    profile: Option<PathBuf>,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {e}", "Error:".red());
        for cause in e.chain().skip(1) {
            eprintln!("  {cause}");
        }
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.debug, cli.log_file)?;

    // Guard must be held until the UI exits
    let _profile_guard = profiling::init(cli.profile);

    // Fail before the terminal enters raw mode so the message stays readable
    let config = Config::from_env()?;
    log::info!("Using data store at {}", config.endpoint);

    let store = RemoteStore::new(&config).context("Failed to create HTTP client")?;
    facrate_api::directory::tui::run(Arc::new(store))
}

/// The UI owns the terminal, so log records go to a file.
/// Default level depends on --debug (overridden by RUST_LOG).
fn init_logging(debug: bool, log_file: Option<PathBuf>) -> anyhow::Result<()> {
    let path = match log_file {
        Some(path) => path,
        None => default_log_path()?,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let env = if debug {
        Env::default().default_filter_or("debug")
    } else {
        Env::default().default_filter_or("facrate=info,facrate_api=info")
    };
    env_logger::Builder::from_env(env)
        .target(Target::Pipe(Box::new(file)))
        .init();

    Ok(())
}

fn default_log_path() -> anyhow::Result<PathBuf> {
    let dir = dirs::data_local_dir().context("Could not determine the local data directory")?;
    Ok(dir.join("facrate").join("facrate.log"))
}
