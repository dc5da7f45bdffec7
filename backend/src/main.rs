// Nabtati - home garden plant tracker
// Entry point and command-line interface

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use nabtati::app::{self, AppState};
use nabtati::config::{Settings, DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENWEATHER_BASE_URL};
use nabtati::database::legacy::{self, FlatVariety, LegacyPlant};
use nabtati::database::{create_pool, schema, Repository};
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "nabtati", version, about = "Home garden plant tracker")]
struct Cli {
    /// Directory holding the database and stored photos
    #[arg(long, env = "NABTATI_DATA_DIR", default_value = "./data", global = true)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the API, stored photos and the advice proxy
    Serve(ServerArgs),
    /// Serve only the advice proxy
    Proxy(ServerArgs),
    /// Apply pending database migrations and exit
    Migrate,
    /// Import legacy JSON exports for one user
    ImportLegacy(ImportArgs),
}

#[derive(Debug, Clone, Args)]
struct ServerArgs {
    #[arg(long, env = "NABTATI_HOST", default_value = "127.0.0.1")]
    host: String,

    #[arg(long, env = "NABTATI_PORT", default_value_t = 3000)]
    port: u16,

    /// Base URL of public photo links (defaults to this server)
    #[arg(long, env = "NABTATI_PUBLIC_URL")]
    public_url: Option<String>,

    /// Where the advice panel sends requests (defaults to this server)
    #[arg(long, env = "NABTATI_ADVICE_URL")]
    advice_url: Option<String>,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_OPENAI_BASE_URL)]
    openai_base_url: String,

    #[arg(long, env = "OPENWEATHER_BASE_URL", default_value = DEFAULT_OPENWEATHER_BASE_URL)]
    openweather_base_url: String,

    #[arg(long, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
    openweather_api_key: Option<String>,
}

impl Default for ServerArgs {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            public_url: None,
            advice_url: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            openweather_base_url: DEFAULT_OPENWEATHER_BASE_URL.to_string(),
            openweather_api_key: None,
        }
    }
}

impl ServerArgs {
    fn settings(self, data_dir: PathBuf) -> Settings {
        let mut settings = Settings::new(self.host, self.port, data_dir);
        if let Some(url) = self.public_url {
            settings.public_base_url = url;
        }
        if let Some(url) = self.advice_url {
            settings.advice_url = url;
        }
        settings.openai_base_url = self.openai_base_url;
        settings.openweather_base_url = self.openweather_base_url;
        settings.openweather_api_key = self.openweather_api_key;
        settings
    }
}

#[derive(Debug, Args)]
struct ImportArgs {
    /// Owner of the imported plants
    #[arg(long)]
    user: Option<String>,

    /// JSON array of flat varieties `{name, category, description}`
    #[arg(long)]
    varieties: Option<PathBuf>,

    /// JSON array of legacy plants
    #[arg(long)]
    plants: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nabtati=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        None => serve(ServerArgs::default().settings(cli.data_dir)).await,
        Some(Command::Serve(args)) => serve(args.settings(cli.data_dir)).await,
        Some(Command::Proxy(args)) => proxy(args.settings(cli.data_dir)).await,
        Some(Command::Migrate) => migrate(cli.data_dir).await,
        Some(Command::ImportLegacy(args)) => import_legacy(cli.data_dir, args).await,
    }
}

async fn serve(settings: Settings) -> anyhow::Result<()> {
    tracing::info!("Starting Nabtati server");

    let state = AppState::initialize(&settings).await?;
    let proxy = app::proxy_state(&settings)?;
    let router = app::build_router(state, proxy);

    let addr = settings.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn proxy(settings: Settings) -> anyhow::Result<()> {
    tracing::info!("Starting advice proxy");

    let router = nabtati::advice_proxy::router(app::proxy_state(&settings)?);

    let addr = settings.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Advice proxy listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn migrate(data_dir: PathBuf) -> anyhow::Result<()> {
    let settings = Settings::new("127.0.0.1", 0, data_dir);
    let pool = create_pool(&settings.database_path()).await?;
    let version = schema::current_version(&pool).await?;
    pool.close().await;

    println!("Database at schema version {}", version);
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &PathBuf) -> anyhow::Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}

async fn import_legacy(data_dir: PathBuf, args: ImportArgs) -> anyhow::Result<()> {
    let settings = Settings::new("127.0.0.1", 0, data_dir);
    let pool = create_pool(&settings.database_path()).await?;
    let repo = Repository::new(pool);

    if let Some(path) = &args.varieties {
        let items: Vec<FlatVariety> = read_json(path)?;
        let summary = legacy::import_flat_varieties(&repo, &items).await?;
        println!(
            "Varieties: {} categories created, {} varieties created, {} skipped",
            summary.categories_created, summary.varieties_created, summary.skipped
        );
    }

    if let Some(path) = &args.plants {
        let user = args
            .user
            .as_deref()
            .context("--user is required when importing plants")?;
        let plants: Vec<LegacyPlant> = read_json(path)?;
        let total = plants.len();

        for plant in plants {
            let imported = legacy::import_legacy_plant(&repo, user, plant).await?;
            println!(
                "{} -> {} ({})",
                imported.legacy_id.as_deref().unwrap_or("?"),
                imported.plant.plant.id,
                imported.plant.plant.name
            );
        }
        println!("Plants: {} imported for {}", total, user);
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
