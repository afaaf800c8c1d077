use campdir::config::Config;
use campdir::geo::{Geocoder, TableGeocoder};
use campdir::http::AppState;
use campdir::{seed, Store};
use clap::{Args, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "campdir", version, about = "Bootcamp directory API")]
struct Cli {
    /// Path to the TOML config file (defaults to ./campdir.toml if present).
    #[arg(long, env = "CAMPDIR_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the API server.
    Serve(ServeArgs),
    /// Import or delete the seed data snapshot.
    Seed(SeedArgs),
}

#[derive(Args)]
struct ServeArgs {
    #[arg(long, env = "CAMPDIR_HOST")]
    host: Option<IpAddr>,
    #[arg(long, env = "CAMPDIR_PORT")]
    port: Option<u16>,
}

#[derive(Args)]
struct SeedArgs {
    /// Import `<data_dir>/*.json` into a fresh snapshot.
    #[arg(short, long, conflicts_with = "delete")]
    import: bool,
    /// Delete the snapshot.
    #[arg(short, long)]
    delete: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(err) => {
            tracing::error!(%err, "failed to load config");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Command::Serve(args) => serve(config, args).await,
        Command::Seed(args) => run_seed(&config, &args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "command failed");
            ExitCode::FAILURE
        }
    }
}

async fn serve(mut config: Config, args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    let store = Arc::new(Store::new());
    let snapshot = config.snapshot_path();
    if snapshot.exists() {
        store.load_snapshot(&snapshot)?;
        tracing::info!(path = %snapshot.display(), "loaded store snapshot");
    }

    let geocoder: Arc<dyn Geocoder> = match TableGeocoder::from_file(&config.geocoder_path()) {
        Ok(table) => Arc::new(table),
        Err(err) => {
            tracing::warn!(%err, "geocoder table unavailable, radius search will 502");
            Arc::new(TableGeocoder::empty())
        }
    };

    campdir::serve(AppState::new(store, geocoder, config)).await?;
    Ok(())
}

fn run_seed(config: &Config, args: &SeedArgs) -> Result<(), Box<dyn std::error::Error>> {
    let snapshot = config.snapshot_path();
    if args.delete {
        let removed = seed::wipe(&snapshot)?;
        tracing::info!(removed, path = %snapshot.display(), "seed data deleted");
        return Ok(());
    }
    if args.import {
        let store = Store::new();
        let report = seed::import(&store, &config.data_dir)?;
        store.save_snapshot(&snapshot)?;
        tracing::info!(
            inserted = report.inserted,
            skipped = report.skipped,
            path = %snapshot.display(),
            "seed data imported"
        );
        return Ok(());
    }
    Err("pass --import or --delete".into())
}
