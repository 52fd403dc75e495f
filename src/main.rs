use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use humansize::{format_size, DECIMAL};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use munkey::config::Settings;
use munkey::sync::{IgnoreMatcher, RootedMatcher, Since, SyncStats, Syncer};

#[derive(Parser)]
#[command(name = "munkey", version, about = "Keep a local tree in sync with a remote file store")]
struct Cli {
    /// Log every transfer
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file to use instead of the project one
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Save remote settings for DIR and pull everything into it
    Clone {
        url: String,
        dir: PathBuf,
        /// Extra ignore rules, one per line
        #[arg(long)]
        ignore: Option<String>,
    },
    /// Pull the remote tree into the local directory
    Pull {
        #[arg(default_value = ".")]
        dir: PathBuf,
        /// Remove local files that are gone remotely
        #[arg(long)]
        delete: bool,
        /// Skip files that cannot be downloaded
        #[arg(long)]
        skip_errors: bool,
        /// Only copy changed files: `local`, an RFC 3339 time, or an age like `90s`
        #[arg(long)]
        since: Option<String>,
    },
    /// Push the local tree to the remote
    Push {
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
    /// Download the given root-relative files
    PullFiles {
        #[arg(long, default_value = ".")]
        dir: PathBuf,
        #[arg(required = true)]
        files: Vec<String>,
    },
    /// Upload the given root-relative files
    PushFiles {
        #[arg(long, default_value = ".")]
        dir: PathBuf,
        #[arg(required = true)]
        files: Vec<String>,
    },
    /// Delete the given root-relative files from the remote
    Rm {
        #[arg(long, default_value = ".")]
        dir: PathBuf,
        #[arg(required = true)]
        files: Vec<String>,
    },
    /// Report which paths the ignore rules exclude
    CheckIgnore {
        #[arg(long, default_value = ".")]
        dir: PathBuf,
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "munkey=debug" } else { "munkey=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_target(false)
        .init();

    if let Err(err) = run(cli) {
        eprintln!("Error: {:?}", err);
        std::process::exit(1);
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Clone { url, dir, ignore } => {
            let mut settings = Settings::from_url(&url)?;
            settings.sync.ignore = ignore;
            let path = cli.config.unwrap_or_else(|| Settings::project_path(&dir));
            settings.save(&path)?;

            let (store, remote_root) = settings.open_remote()?;
            let matcher = IgnoreMatcher::from_root(&dir, settings.sync.ignore.as_deref().unwrap_or(""))?;
            let stats = Syncer::new(store.as_ref())
                .with_ignore(&matcher)
                .pull_dir(&dir, &remote_root, &settings.sync_options())
                .with_context(|| format!("Failed to clone {}", url))?;
            report("Cloned", &stats);
        }
        Command::Pull { dir, delete, skip_errors, since } => {
            let settings = load_settings(cli.config.as_deref(), &dir)?;
            let (store, remote_root) = settings.open_remote()?;
            let matcher = IgnoreMatcher::from_root(&dir, settings.sync.ignore.as_deref().unwrap_or(""))?;

            let mut options = settings.sync_options();
            options.delete |= delete;
            options.skip_errors |= skip_errors;
            if let Some(since) = since {
                options.since = parse_since(&since, Utc::now())?;
            }

            let stats = Syncer::new(store.as_ref())
                .with_ignore(&matcher)
                .pull_dir(&dir, &remote_root, &options)
                .context("Pull failed")?;
            report("Pulled", &stats);
        }
        Command::Push { dir } => {
            let settings = load_settings(cli.config.as_deref(), &dir)?;
            let (store, remote_root) = settings.open_remote()?;
            let stats = Syncer::new(store.as_ref())
                .push_dir(&dir, &remote_root)
                .context("Push failed")?;
            report("Pushed", &stats);
        }
        Command::PullFiles { dir, files } => {
            let settings = load_settings(cli.config.as_deref(), &dir)?;
            let (store, remote_root) = settings.open_remote()?;
            let stats = Syncer::new(store.as_ref()).pull_files(&dir, &remote_root, &files)?;
            report("Pulled", &stats);
        }
        Command::PushFiles { dir, files } => {
            let settings = load_settings(cli.config.as_deref(), &dir)?;
            let (store, remote_root) = settings.open_remote()?;
            let stats = Syncer::new(store.as_ref()).push_files(&dir, &remote_root, &files)?;
            report("Pushed", &stats);
        }
        Command::Rm { dir, files } => {
            let settings = load_settings(cli.config.as_deref(), &dir)?;
            let (store, remote_root) = settings.open_remote()?;
            let stats = Syncer::new(store.as_ref()).remove_files(&remote_root, &files)?;
            println!("Removed {} remote file(s)", stats.files_deleted);
        }
        Command::CheckIgnore { dir, paths } => {
            let settings = load_settings(cli.config.as_deref(), &dir)?;
            let base = std::path::absolute(&dir)
                .with_context(|| format!("Failed to resolve {}", dir.display()))?;
            let matcher = IgnoreMatcher::from_root(&base, settings.sync.ignore.as_deref().unwrap_or(""))?;
            let rooted = RootedMatcher::new(&base, matcher);

            for path in paths {
                let absolute = if path.is_absolute() { path.clone() } else { base.join(&path) };
                if rooted.ignore(&absolute)? {
                    println!("{}", path.display());
                }
            }
        }
    }
    Ok(())
}

fn load_settings(config: Option<&Path>, dir: &Path) -> Result<Settings> {
    match config {
        Some(path) => Settings::load(path),
        None => Settings::discover(dir),
    }
}

/// `local`, an RFC 3339 timestamp, or an age in seconds/minutes/hours/days.
fn parse_since(value: &str, now: DateTime<Utc>) -> Result<Since> {
    if value == "local" {
        return Ok(Since::LocalMtime);
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(Since::Timestamp(stamp.with_timezone(&Utc)));
    }

    let split = value.char_indices().last().map_or(0, |(i, _)| i);
    let (amount, unit) = value.split_at(split);
    let amount: i64 = amount
        .parse()
        .with_context(|| format!("Invalid --since value: {}", value))?;
    let age = match unit {
        "s" => Duration::seconds(amount),
        "m" => Duration::minutes(amount),
        "h" => Duration::hours(amount),
        "d" => Duration::days(amount),
        _ => bail!("Invalid --since unit in {}: use s, m, h or d", value),
    };
    Ok(Since::Timestamp(now - age))
}

fn report(verb: &str, stats: &SyncStats) {
    println!(
        "{} {} file(s), {} ({} unchanged, {} ignored, {} failed, {} removed, {} dir(s) created)",
        verb,
        stats.files_copied,
        format_size(stats.bytes_transferred, DECIMAL),
        stats.files_skipped,
        stats.files_ignored,
        stats.files_failed,
        stats.files_deleted,
        stats.dirs_created,
    );
}
