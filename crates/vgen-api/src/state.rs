//! Application state.

use std::sync::Arc;

use tracing::info;
use vgen_models::ProviderId;
use vgen_providers::{KlingProvider, MiniMaxProvider, VideoProvider};
use vgen_storage::UploadStore;

use crate::config::ApiConfig;
use crate::error::ApiResult;

/// Providers this server can dispatch to.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    kling: Option<Arc<dyn VideoProvider>>,
    minimax: Option<Arc<dyn VideoProvider>>,
    /// Server-side MiniMax key used when a request brings none
    minimax_api_key: Option<String>,
}

impl ProviderRegistry {
    /// Build the providers enabled by `config`.
    ///
    /// Kling needs no server credentials and is on unless disabled. MiniMax
    /// is registered only when its key and group id are configured.
    pub fn from_config(config: &ApiConfig, store: &UploadStore) -> ApiResult<Self> {
        let mut registry = Self::default();

        if config.kling.enabled {
            let kling = KlingProvider::new(config.kling.clone(), store.clone())?;
            registry = registry.with_provider(Arc::new(kling));
        }

        if config.minimax.is_configured() {
            let minimax = MiniMaxProvider::new(config.minimax.clone(), store.clone())?;
            registry = registry.with_provider(Arc::new(minimax));
            registry.minimax_api_key = config.minimax.api_key.clone();
        }

        Ok(registry)
    }

    /// Register (or replace) a provider under its own id.
    pub fn with_provider(mut self, provider: Arc<dyn VideoProvider>) -> Self {
        match provider.id() {
            ProviderId::Kling => self.kling = Some(provider),
            ProviderId::MiniMax => self.minimax = Some(provider),
        }
        self
    }

    pub fn with_minimax_api_key(mut self, key: impl Into<String>) -> Self {
        self.minimax_api_key = Some(key.into());
        self
    }

    pub fn get(&self, id: ProviderId) -> Option<Arc<dyn VideoProvider>> {
        match id {
            ProviderId::Kling => self.kling.clone(),
            ProviderId::MiniMax => self.minimax.clone(),
        }
    }

    /// Registered providers in display order.
    pub fn available(&self) -> Vec<ProviderId> {
        ProviderId::ALL
            .into_iter()
            .filter(|id| self.get(*id).is_some())
            .collect()
    }

    /// Server-side API key for `id`, if any.
    pub fn fallback_api_key(&self, id: ProviderId) -> Option<&str> {
        match id {
            ProviderId::Kling => None,
            ProviderId::MiniMax => self.minimax_api_key.as_deref(),
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: Arc<UploadStore>,
    pub providers: ProviderRegistry,
}

impl AppState {
    /// Create new application state, creating the uploads directory.
    pub async fn new(config: ApiConfig) -> ApiResult<Self> {
        let store = UploadStore::new(config.storage.clone());
        store.init().await?;

        let providers = ProviderRegistry::from_config(&config, &store)?;
        info!(
            providers = ?providers.available(),
            "Video providers ready"
        );

        Ok(Self::with_parts(config, store, providers))
    }

    /// Assemble state from already-built parts.
    pub fn with_parts(config: ApiConfig, store: UploadStore, providers: ProviderRegistry) -> Self {
        Self {
            config,
            store: Arc::new(store),
            providers,
        }
    }
}
