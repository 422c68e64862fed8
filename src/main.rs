use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use schema_updater::{
    read_config, FsMigrationProvider, SemVer, SqliteStorage, StorageBackend, StorageUpdater,
    TracingObserver, UpdateOutcome, UpdaterConfig, VersionPart,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Schema Updater - apply paired up/down SQL migrations with per-step checkpoints
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a JSON config file
    #[arg(short, long, env = "SCHEMA_UPDATER_CONFIG")]
    config: Option<PathBuf>,

    /// Database URL, e.g. sqlite://./data/app.db
    #[arg(long, env = "SCHEMA_UPDATER_DATABASE_URL")]
    database_url: Option<String>,

    /// Directory containing the up/ and down/ migration folders
    #[arg(long, env = "SCHEMA_UPDATER_MIGRATIONS_DIR")]
    migrations_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Move the database to a schema version (default: the last available one)
    Update {
        #[arg(short, long)]
        target: Option<u32>,
    },
    /// Show persisted versions and pending migrations
    Status,
    /// Validate the migration directory without touching the database
    Validate,
    /// Record a schema version without running any script
    Stamp { version: u32 },
    /// Read or change the service version
    ServiceVersion {
        #[command(subcommand)]
        action: ServiceVersionAction,
    },
}

#[derive(Subcommand, Debug)]
enum ServiceVersionAction {
    /// Print the stored service version
    Get,
    /// Replace the whole service version, e.g. 1.4.0
    Set { version: SemVer },
    /// Replace one component (major, minor or patch)
    SetPart { part: VersionPart, value: u32 },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let file_config = match &args.config {
        Some(path) => read_config(path)
            .await
            .with_context(|| format!("reading config {}", path.display()))?
            .with_context(|| format!("config file {} not found", path.display()))?,
        None => UpdaterConfig::default(),
    };
    let config = file_config.with_overrides(args.database_url, args.migrations_dir);

    match args.command {
        Command::Validate => {
            let provider = FsMigrationProvider::new(config.migrations_dir()?);
            provider.validate().await?;
            println!("Migrations in {} are valid", provider.root().display());
        }
        Command::Update { target } => update(&config, target).await?,
        Command::Status => status(&config).await?,
        Command::Stamp { version } => {
            let storage = connect(&config).await?;
            storage.set_database_version(version).await?;
            println!("Schema version set to {version}");
        }
        Command::ServiceVersion { action } => {
            let storage = connect(&config).await?;
            let version = match action {
                ServiceVersionAction::Get => storage.service_version().await?,
                ServiceVersionAction::Set { version } => {
                    storage.set_service_version(&version).await?;
                    version
                }
                ServiceVersionAction::SetPart { part, value } => {
                    storage.set_service_version_part(part, value).await?
                }
            };
            println!("{version}");
        }
    }

    Ok(())
}

/// Connect and make sure the metadata row exists.
async fn connect(config: &UpdaterConfig) -> anyhow::Result<SqliteStorage> {
    let storage = SqliteStorage::connect(config.database_url()?, Some(config.pool_config())).await?;
    if !storage.is_available().await {
        bail!("couldn't connect to storage");
    }
    if !storage.is_provisioned().await? {
        storage.provision().await?;
    }
    Ok(storage)
}

async fn update(config: &UpdaterConfig, target: Option<u32>) -> anyhow::Result<()> {
    let provider = Arc::new(FsMigrationProvider::new(config.migrations_dir()?));
    let storage = Arc::new(SqliteStorage::connect(config.database_url()?, Some(config.pool_config())).await?);

    let target = match target {
        Some(target) => target,
        None => provider.load().await?.last_version(),
    };

    // Ctrl-C stops the run at the next step boundary
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received interrupt, stopping after the current migration...");
            shutdown_tx.send(true).ok();
        }
    });

    let updater = StorageUpdater::new(storage, provider).with_observer(Arc::new(TracingObserver));
    let result = updater.update_storage_with_shutdown(target, shutdown_rx).await?;

    match result.outcome {
        UpdateOutcome::Succeeded => {
            println!(
                "Updated storage to version {} ({} migration(s) applied)",
                result.to_version,
                result.total_applied()
            );
        }
        UpdateOutcome::Cancelled => {
            bail!(
                "update cancelled after {} migration(s); rerun to continue",
                result.total_applied()
            );
        }
        UpdateOutcome::PreconditionFailed(reason) => bail!(reason),
    }

    Ok(())
}

async fn status(config: &UpdaterConfig) -> anyhow::Result<()> {
    let provider = FsMigrationProvider::new(config.migrations_dir()?);
    let set = provider.load().await?;
    let storage = connect(config).await?;
    let info = storage.meta_info().await?;

    info!(
        database_version = info.database_version,
        last_version = set.last_version(),
        "Status"
    );
    println!("Schema version:   {}", info.database_version);
    println!("Service version:  {}", info.service_version);
    println!("Last available:   {}", set.last_version());

    let pending = (info.database_version + 1..=set.last_version()).filter_map(|order| set.get(order));
    for record in pending {
        println!(
            "  pending {:>4}  {}  {}",
            record.order_number,
            &record.checksum[..12],
            record.name
        );
    }

    Ok(())
}
