use clap::{Parser, Subcommand};
use ovfs_common::{load_config, load_config_file, SessionConfig, StoreAuth};
use ovfs_core::VfsSession;
use serde::Serialize;
use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ovfs")]
#[command(author = "OVFS Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Virtual filesystem client for S3-hosted objects and zip containers", long_about = None)]
struct Cli {
    /// Backend region
    #[arg(long, global = true)]
    region: Option<String>,

    /// Endpoint override for S3-compatible services
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Force path-style addressing (disables virtual-hosted style)
    #[arg(long, global = true)]
    path_style: bool,

    /// Anonymous access (skip credential resolution)
    #[arg(long, global = true)]
    anonymous: bool,

    /// Explicit config file instead of the default location
    #[arg(long, global = true)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stat a virtual path
    Stat {
        /// Virtual path, e.g. /s3/bucket/key or /zip//s3/bucket/file.zip/entry
        path: String,

        /// Output the record as JSON
        #[arg(long)]
        json: bool,
    },
    /// Recursively list a directory
    Ls {
        /// Virtual path of the directory root
        path: String,

        /// Output entries as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print file content to stdout
    Cat {
        /// Virtual path of the file
        path: String,
    },
}

#[derive(Serialize)]
struct StatOutput {
    path: String,
    size: u64,
    is_directory: bool,
    mtime: Option<u64>,
}

#[derive(Serialize)]
struct ListOutput {
    name: String,
    size: u64,
    is_directory: bool,
}

fn main() {
    // Tracing to stderr so JSON and file content go cleanly to stdout
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = build_config(&cli)?;
    let session = VfsSession::new(config)?;

    match cli.command {
        Commands::Stat { path, json } => run_stat(&session, &path, json),
        Commands::Ls { path, json } => run_ls(&session, &path, json),
        Commands::Cat { path } => run_cat(&session, &path),
    }
}

fn build_config(cli: &Cli) -> anyhow::Result<SessionConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config_file(path)?,
        None => load_config(false)?.config,
    };

    if let Some(region) = &cli.region {
        config.region = region.clone();
    }
    if let Some(endpoint) = &cli.endpoint {
        config.endpoint = Some(endpoint.clone());
    }
    if cli.path_style {
        config.path_style = true;
    }
    if cli.anonymous {
        config.auth = StoreAuth::Anonymous;
    }

    Ok(config)
}

fn run_stat(session: &VfsSession, path: &str, json: bool) -> anyhow::Result<()> {
    let Some(record) = session.stat(path)? else {
        anyhow::bail!("No such path: {}", path);
    };

    if json {
        let output = StatOutput {
            path: path.to_string(),
            size: record.size,
            is_directory: record.is_dir(),
            mtime: record.modified.and_then(unix_secs),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        let kind = if record.is_dir() { "directory" } else { "file" };
        println!("{}  {}  {} bytes", path, kind, record.size);
    }

    Ok(())
}

fn run_ls(session: &VfsSession, path: &str, json: bool) -> anyhow::Result<()> {
    let mut entries = session.list_recursive(path)?;
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    if json {
        let output: Vec<ListOutput> = entries
            .into_iter()
            .map(|e| ListOutput {
                size: e.record.size,
                is_directory: e.is_dir(),
                name: e.name,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for entry in entries {
            println!("{}", entry.name);
        }
    }

    Ok(())
}

fn run_cat(session: &VfsSession, path: &str) -> anyhow::Result<()> {
    let data = session.read(path)?;
    std::io::stdout().write_all(&data)?;
    Ok(())
}

fn unix_secs(time: SystemTime) -> Option<u64> {
    time.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs())
}
