//! docgate - generic REST gateway over document-store collections

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docgate::{
    config::{Args, StoreBackend},
    server::{self, AppState},
    store::{DocumentStore, MemoryStore, MongoStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("docgate={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  docgate - document collection gateway");
    info!("======================================");
    info!("Listen: {}", args.listen_addr());
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("Store: {:?}", args.store);
    info!("Auth: {}", if args.auth_enabled { "bearer token required" } else { "disabled" });
    info!("Credentials collection: {}", args.users_collection);
    info!("======================================");

    // The listener is only bound once the store has answered
    let store = connect_store(&args).await;

    let state = match AppState::new(args, store) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            error!("Startup failed: {}", e);
            std::process::exit(1);
        }
    };

    server::run(state).await?;
    Ok(())
}

async fn connect_store(args: &Args) -> Arc<dyn DocumentStore> {
    if args.store == StoreBackend::Memory {
        warn!("Using in-memory store - data is lost on restart");
        return Arc::new(MemoryStore::new());
    }

    match MongoStore::connect(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(mongo) => {
            info!("MongoDB connected successfully");
            // Registration relies on the unique index to reject duplicates
            if let Err(e) = mongo.ensure_unique_index(&args.users_collection, "username").await {
                warn!(
                    "Could not create unique index on {}.username: {}",
                    args.users_collection, e
                );
            }
            Arc::new(mongo)
        }
        Err(e) => {
            if args.dev_mode {
                warn!("MongoDB connection failed (dev mode, using in-memory store): {}", e);
                Arc::new(MemoryStore::new())
            } else {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        }
    }
}
