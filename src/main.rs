//! FoodBuddy server and tools
//!
//! ```text
//! foodbuddy serve [--config PATH]
//! foodbuddy init-config
//! foodbuddy popular-tags INPUT [--output PATH]
//! foodbuddy categorize RESTAURANT_ID [--catalog PATH]
//! ```
//!
//! `RUST_LOG` takes precedence over the configured log level.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use foodbuddy::api::{serve, ApiConfig, AppState, Vendors};
use foodbuddy::catalog::{popular_tags, process_restaurant_menus, Catalog, YelpRecord};
use foodbuddy::config::{generate_default_config, Config, LoggingConfig, StoreBackend};
use foodbuddy::store::{DocumentStore, FirestoreConfig, FirestoreStore, MemoryStore};
use foodbuddy::vendors::{
    CloudinaryClient, CloudinaryCredentials, FirebaseAuthAdmin, GoogleGeocoder, OpenAiTaxOracle,
    ResendMailer,
};

#[derive(Parser)]
#[command(name = "foodbuddy")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Restaurant discovery and dining-social backend")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP and WebSocket server
    Serve {
        /// Config file (default: standard locations, then environment)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print a default config file
    InitConfig,

    /// Tag restaurants from a Yelp info export as popular or not
    PopularTags {
        /// Yelp info JSON (array of records)
        input: PathBuf,
        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print a restaurant's menus grouped by category
    Categorize {
        /// Restaurant id
        restaurant_id: String,
        /// Catalog JSON (default: bundled catalog)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => {
            let config = match config {
                Some(path) => Config::load_with_env(&path)?,
                None => Config::load_default(),
            };
            init_logging(&config.logging);
            run_server(config).await
        }
        Commands::InitConfig => {
            print!("{}", generate_default_config());
            Ok(())
        }
        Commands::PopularTags { input, output } => {
            init_logging(&LoggingConfig::default());
            tag_popular(&input, output.as_deref())
        }
        Commands::Categorize {
            restaurant_id,
            catalog,
        } => {
            init_logging(&LoggingConfig::default());
            categorize(&restaurant_id, catalog.as_deref())
        }
    }
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("foodbuddy={},tower_http=debug", logging.level))
    });

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format.eq_ignore_ascii_case("json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    tracing::info!("Starting FoodBuddy v{}", env!("CARGO_PKG_VERSION"));

    let catalog_path = config.catalog.path.as_deref().map(Path::new);
    let catalog = Catalog::load_or_bundled(catalog_path)?;
    tracing::info!("Loaded {} restaurants", catalog.len());

    let store = build_store(&config)?;
    tracing::info!("Document store: {}", store.backend());

    let vendors = build_vendors(&config);
    let api_config = ApiConfig::from_config(&config);
    let state = AppState::new(catalog, store, vendors, api_config.clone());

    if let Err(e) = state.channels.ensure_defaults().await {
        tracing::warn!(error = %e, "Could not seed default channels");
    }

    serve(state, &api_config).await?;

    tracing::info!("FoodBuddy stopped");
    Ok(())
}

fn build_store(config: &Config) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match (&config.store.backend, &config.firebase.project_id) {
        (StoreBackend::Firestore, Some(project_id)) => {
            let store = FirestoreStore::new(FirestoreConfig {
                project_id: project_id.clone(),
                database: config.firebase.database.clone(),
                access_token: config.firebase.access_token.clone(),
                request_timeout_ms: config.server.vendor_timeout_ms,
                ..FirestoreConfig::new(project_id.clone())
            })
            .context("Failed to create Firestore client")?;
            Ok(Arc::new(store))
        }
        (StoreBackend::Firestore, None) => {
            tracing::warn!("Firestore backend selected without a project id, using in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
        (StoreBackend::Memory, _) => Ok(Arc::new(MemoryStore::new())),
    }
}

/// Vendor clients for every configured credential; the rest stay `None`
fn build_vendors(config: &Config) -> Vendors {
    let timeout_ms = config.server.vendor_timeout_ms;
    let mut vendors = Vendors::default();

    if let Some(api_key) = &config.email.resend_api_key {
        match ResendMailer::new(api_key, &config.email.from, timeout_ms) {
            Ok(mailer) => vendors.mailer = Some(Arc::new(mailer)),
            Err(e) => tracing::error!(error = %e, "Email client unavailable"),
        }
    } else {
        tracing::info!("RESEND_API_KEY not set, email features disabled");
    }

    if let (Some(project_id), Some(token)) = (
        &config.firebase.project_id,
        &config.firebase.access_token,
    ) {
        match FirebaseAuthAdmin::new(project_id, token, timeout_ms) {
            Ok(admin) => vendors.auth_admin = Some(Arc::new(admin)),
            Err(e) => tracing::error!(error = %e, "Auth admin client unavailable"),
        }
    } else {
        tracing::info!("Firebase credentials not set, email updates disabled");
    }

    let cloudinary = &config.cloudinary;
    if let Some(credentials) = CloudinaryCredentials::resolve(
        cloudinary.api_key.as_deref(),
        cloudinary.api_secret.as_deref(),
        cloudinary.cloud_name.as_deref(),
        cloudinary.url.as_deref(),
    ) {
        match CloudinaryClient::new(credentials, timeout_ms) {
            Ok(client) => vendors.image_host = Some(Arc::new(client)),
            Err(e) => tracing::error!(error = %e, "Image host client unavailable"),
        }
    } else {
        tracing::info!("Cloudinary credentials not set, using catalog images");
    }

    if let Some(api_key) = &config.openai.api_key {
        match OpenAiTaxOracle::new(api_key, &config.openai.model, timeout_ms) {
            Ok(oracle) => vendors.tax_oracle = Some(Arc::new(oracle)),
            Err(e) => tracing::error!(error = %e, "Tax oracle unavailable"),
        }
    } else {
        tracing::info!("OPENAI_API_KEY not set, using default tax rate");
    }

    if let Some(api_key) = &config.maps.api_key {
        match GoogleGeocoder::new(api_key, timeout_ms) {
            Ok(geocoder) => vendors.geocoder = Some(Arc::new(geocoder)),
            Err(e) => tracing::error!(error = %e, "Geocoder unavailable"),
        }
    } else {
        tracing::info!("GOOGLE_MAPS_API_KEY not set, distances disabled");
    }

    vendors
}

fn tag_popular(input: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let records: Vec<YelpRecord> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", input.display()))?;

    let tags = popular_tags(&records);
    let popular = tags.iter().filter(|t| t.popular).count();
    let json = serde_json::to_string_pretty(&tags)?;

    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(
                "Tagged {} restaurants ({} popular) -> {}",
                tags.len(),
                popular,
                path.display()
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn categorize(restaurant_id: &str, catalog_path: Option<&Path>) -> anyhow::Result<()> {
    let catalog = Catalog::load_or_bundled(catalog_path)?;
    let Some(restaurant) = catalog.find(restaurant_id) else {
        bail!("Restaurant {} not found", restaurant_id);
    };

    println!("{} ({})", restaurant.name, restaurant.id);
    for menu in process_restaurant_menus(&restaurant.menus) {
        println!();
        println!("{} [{}]", menu.title, menu.id);
        for item in &menu.items {
            println!("  {:<40} {:>8.2}", item.name, item.price);
        }
    }
    Ok(())
}
