//! Pickem Back binary entrypoint wiring REST, SSE, background schedules and the league store.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::{Context, bail};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "couch-store")]
use pickem_back::dao::league_store::couchdb::{CouchConfig, CouchLeagueStore};
#[cfg(feature = "mongo-store")]
use pickem_back::dao::league_store::mongodb::{MongoConfig, MongoLeagueStore};
use pickem_back::{
    config::AppConfig,
    dao::{
        league_store::{LeagueStore, memory::MemoryLeagueStore},
        storage::StorageError,
    },
    provider::OddsApiClient,
    routes,
    services::{scheduler, storage_supervisor},
    state::{AppState, SharedState},
};

const STORE_ENV: &str = "PICKEM_STORE";

/// Storage backend selected through `PICKEM_STORE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StoreBackend {
    Memory,
    #[cfg(feature = "mongo-store")]
    Mongo,
    #[cfg(feature = "couch-store")]
    Couch,
}

impl StoreBackend {
    fn from_env() -> anyhow::Result<Self> {
        let Ok(value) = env::var(STORE_ENV) else {
            return Ok(Self::default_backend());
        };
        match value.trim().to_ascii_lowercase().as_str() {
            "" => Ok(Self::default_backend()),
            "memory" => Ok(Self::Memory),
            #[cfg(feature = "mongo-store")]
            "mongo" | "mongodb" => Ok(Self::Mongo),
            #[cfg(feature = "couch-store")]
            "couch" | "couchdb" => Ok(Self::Couch),
            other => bail!("unsupported {STORE_ENV} value `{other}`"),
        }
    }

    #[cfg(feature = "mongo-store")]
    fn default_backend() -> Self {
        Self::Mongo
    }

    #[cfg(not(feature = "mongo-store"))]
    fn default_backend() -> Self {
        Self::Memory
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let provider = OddsApiClient::new(&config.provider).context("building scores client")?;
    let backend = StoreBackend::from_env()?;
    info!(?backend, "selected league store backend");

    let app_state = AppState::new(config, Arc::new(provider));

    let memory = MemoryLeagueStore::new();
    tokio::spawn(storage_supervisor::run(app_state.clone(), move || {
        let memory = memory.clone();
        async move { connect_store(backend, memory).await }
    }));
    scheduler::spawn(app_state.clone());

    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Open the selected backend. The in-memory store is shared across reconnects.
async fn connect_store(
    backend: StoreBackend,
    memory: MemoryLeagueStore,
) -> Result<Arc<dyn LeagueStore>, StorageError> {
    match backend {
        StoreBackend::Memory => Ok(Arc::new(memory)),
        #[cfg(feature = "mongo-store")]
        StoreBackend::Mongo => {
            let config = MongoConfig::from_env().await?;
            Ok(Arc::new(MongoLeagueStore::connect(config).await?))
        }
        #[cfg(feature = "couch-store")]
        StoreBackend::Couch => {
            let config = CouchConfig::from_env()?;
            Ok(Arc::new(CouchLeagueStore::connect(config).await?))
        }
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
