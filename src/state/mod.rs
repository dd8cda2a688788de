mod sse;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{
    config::AppConfig, dao::league_store::LeagueStore, error::ServiceError,
    provider::ScoresProvider,
};

pub use self::sse::SseHub;

/// Capacity of the public SSE broadcast channel.
const PUBLIC_SSE_CAPACITY: usize = 32;

pub type SharedState = Arc<AppState>;

/// Central application state holding the storage handle, the scores provider and
/// the realtime hub.
pub struct AppState {
    league_store: RwLock<Option<Arc<dyn LeagueStore>>>,
    provider: Arc<dyn ScoresProvider>,
    config: AppConfig,
    public_sse: SseHub,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig, provider: Arc<dyn ScoresProvider>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            league_store: RwLock::new(None),
            provider,
            config,
            public_sse: SseHub::new(PUBLIC_SSE_CAPACITY),
            degraded: degraded_tx,
        })
    }

    /// Obtain a handle to the current league store, if one is installed.
    pub async fn league_store(&self) -> Option<Arc<dyn LeagueStore>> {
        let guard = self.league_store.read().await;
        guard.as_ref().cloned()
    }

    /// League store or [`ServiceError::Degraded`] while none is installed.
    pub async fn require_league_store(&self) -> Result<Arc<dyn LeagueStore>, ServiceError> {
        self.league_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new league store implementation and leave degraded mode.
    pub async fn install_league_store(&self, store: Arc<dyn LeagueStore>) {
        {
            let mut guard = self.league_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current league store and enter degraded mode.
    pub async fn clear_league_store(&self) {
        {
            let mut guard = self.league_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Flip the degraded flag, notifying watchers only on change.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Scores provider used by the results sync.
    pub fn provider(&self) -> &dyn ScoresProvider {
        self.provider.as_ref()
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        &self.public_sse
    }
}
