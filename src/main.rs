use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use campus_coffee::config::Config;
use campus_coffee::db::SqlitePosStorage;
use campus_coffee::infra::http_client::ReqwestHttp;
use campus_coffee::logging;
use campus_coffee::storage::{InMemoryPosStorage, PosStorage};
use campus_coffee::{Pos, PosService};

#[derive(Parser)]
#[command(name = "campus_coffee")]
#[command(about = "Campus point-of-sale catalog")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a POS from an OpenStreetMap node
    Import {
        #[arg(long)]
        node_id: i64,
    },
    /// List all POS
    List,
    /// Show a single POS
    Get {
        #[arg(long)]
        id: i64,
    },
    /// Create or update a POS from a JSON file
    Upsert {
        #[arg(long)]
        file: PathBuf,
    },
    /// Delete every POS (requires `admin.allow_clear`)
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let config = Config::load()?;
    let _log_guard = logging::init_logging(&config.logging.directory);

    let cli = Cli::parse();

    let storage: Arc<dyn PosStorage> = match &config.storage.database_path {
        Some(path) => Arc::new(SqlitePosStorage::open(path)?),
        None => {
            info!("No database configured, using in-memory storage");
            Arc::new(InMemoryPosStorage::new())
        }
    };
    let service = PosService::new(
        storage,
        Arc::new(ReqwestHttp::new()),
        config.osm.api_base_url.clone(),
    )
    .with_clear_enabled(config.admin.allow_clear);

    match cli.command {
        Commands::Import { node_id } => {
            let pos = service.import_from_osm_node(node_id).await?;
            print_json(&pos)?;
        }
        Commands::List => {
            print_json(&service.get_all().await?)?;
        }
        Commands::Get { id } => {
            print_json(&service.get_by_id(id).await?)?;
        }
        Commands::Upsert { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let pos: Pos = serde_json::from_str(&content)
                .with_context(|| format!("Invalid POS document in {}", file.display()))?;
            print_json(&service.upsert(pos).await?)?;
        }
        Commands::Clear { yes } => {
            if !yes {
                anyhow::bail!("Refusing to clear the catalog without --yes");
            }
            service.clear().await?;
            println!("POS catalog cleared");
        }
    }
    Ok(())
}
