//! aw-watcher-editor CLI
//!
//! Reports editor activity to ActivityWatch. The editor host spawns
//! `aw-watcher-editor run` and writes one JSON message per line on stdin.

use anyhow::Context;
use aw_watcher_editor::{
    bucket::{local_host_name, BucketRegistrar, Registration},
    config::Config,
    editor::{GitRepositories, HostBridge, HostEditorState},
    stats::ActivityStats,
    watcher::{HostResponse, REGISTRATION_FAILED_MESSAGE},
    AwClient, Bucket, LogReporter, Watcher, VERSION,
};
use clap::{Parser, Subcommand};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "aw-watcher-editor")]
#[command(version = VERSION)]
#[command(about = "Editor activity watcher for ActivityWatch", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch editor activity reported on stdin
    Run {
        /// Name of the editor application (e.g. "Visual Studio Code")
        #[arg(long)]
        app_name: String,

        /// Host name used in the bucket id (defaults to this machine's)
        #[arg(long)]
        host_name: Option<String>,

        /// Git repositories to read the branch from, first one wins
        #[arg(long = "repo")]
        repos: Vec<PathBuf>,
    },

    /// Show the app name and the bucket suffix derived from it
    AppName {
        #[arg(long)]
        app_name: String,
    },

    /// Print the bucket the watcher would write to
    Bucket {
        #[arg(long)]
        app_name: String,

        #[arg(long)]
        host_name: Option<String>,
    },

    /// Create the bucket on the server and report the result
    Check {
        #[arg(long)]
        app_name: String,

        #[arg(long)]
        host_name: Option<String>,
    },

    /// Show configuration
    Config,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(Config::config_path);

    match cli.command {
        Commands::Run {
            app_name,
            host_name,
            repos,
        } => cmd_run(&config_path, app_name, host_name, repos),
        Commands::AppName { app_name } => {
            cmd_app_name(&config_path, &app_name);
            Ok(())
        }
        Commands::Bucket {
            app_name,
            host_name,
        } => cmd_bucket(&config_path, &app_name, host_name),
        Commands::Check {
            app_name,
            host_name,
        } => cmd_check(&config_path, &app_name, host_name),
        Commands::Config => cmd_config(&config_path),
    }
}

fn cmd_run(
    config_path: &Path,
    app_name: String,
    host_name: Option<String>,
    repos: Vec<PathBuf>,
) -> anyhow::Result<()> {
    let config = Config::load_or_default(config_path);
    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;

    let host_name = host_name.unwrap_or_else(local_host_name);
    let bucket = Bucket::new(&app_name, &host_name, config.bucket_suffix());
    let client = AwClient::new(config.server_url(), bucket.client_name.clone())?;

    let mut repositories = GitRepositories::new();
    for repo in &repos {
        if !repositories.discover(repo) {
            tracing::warn!(path = %repo.display(), "not a git repository");
        }
    }

    println!("aw-watcher-editor v{VERSION}");
    println!("  Server: {}", config.server_url());
    println!("  Bucket: {}", bucket.id);
    println!();

    let stats = Arc::new(ActivityStats::new());
    let mut watcher = Watcher::new(
        app_name,
        bucket,
        Arc::new(client),
        HostEditorState::new(),
        repositories,
        Arc::new(LogReporter),
        runtime.handle().clone(),
    )
    .with_stats(stats.clone());
    // The gate stays closed until this registration succeeds.
    let _registration = watcher.init(&config);

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone())?;

    let mut bridge = HostBridge::new(1024);
    bridge.start(BufReader::new(std::io::stdin()))?;
    let receiver = bridge.receiver().clone();

    while running.load(Ordering::SeqCst) {
        match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(message) => match watcher.handle_host_message(message, config_path) {
                HostResponse::AppName(text) => println!("{text}"),
                // Registration finishes in the background and moves the gate.
                HostResponse::Reloaded(_registration) => {}
                HostResponse::Activity(_) => {}
            },
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                tracing::info!("host closed input");
                break;
            }
        }
    }

    // Give in-flight deliveries a moment before tearing down the runtime.
    runtime.shutdown_timeout(Duration::from_secs(2));

    println!();
    println!("{}", stats.summary());
    Ok(())
}

fn cmd_app_name(config_path: &Path, app_name: &str) {
    let config = Config::load_or_default(config_path);
    let short_name = aw_watcher_editor::app_short_name(app_name, config.bucket_suffix());
    println!("App Name: \"{app_name}\"");
    println!("Bucket suffix: \"{short_name}\"");
}

fn cmd_bucket(config_path: &Path, app_name: &str, host_name: Option<String>) -> anyhow::Result<()> {
    let config = Config::load_or_default(config_path);
    let host_name = host_name.unwrap_or_else(local_host_name);
    let bucket = Bucket::new(app_name, &host_name, config.bucket_suffix());
    println!("{}", serde_json::to_string_pretty(&bucket)?);
    Ok(())
}

fn cmd_check(config_path: &Path, app_name: &str, host_name: Option<String>) -> anyhow::Result<()> {
    let config = Config::load_or_default(config_path);
    let host_name = host_name.unwrap_or_else(local_host_name);
    let bucket = Bucket::new(app_name, &host_name, config.bucket_suffix());
    let client = AwClient::new(config.server_url(), bucket.client_name.clone())?;

    println!("Server: {}", config.server_url());
    println!("Bucket: {}", bucket.id);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let registrar = BucketRegistrar::new(bucket);

    match runtime.block_on(registrar.register(&client)) {
        Ok(Registration::Created) => println!("Created bucket"),
        Ok(Registration::AlreadyExisted) => println!("Bucket already exists"),
        Ok(Registration::Superseded) => println!("Registration superseded"),
        Err(e) => {
            eprintln!("[ActivityWatch] {REGISTRATION_FAILED_MESSAGE}");
            return Err(e).context("bucket registration failed");
        }
    }
    Ok(())
}

fn cmd_config(config_path: &Path) -> anyhow::Result<()> {
    let config = Config::load_or_default(config_path);

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {config_path:?}");
    println!("Server URL: {}", config.server_url());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) -> anyhow::Result<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .context("error setting Ctrl+C handler")
}
