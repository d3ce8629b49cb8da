//! Provider discovery.

use axum::extract::State;
use axum::Json;
use vgen_models::{ProviderInfo, ProvidersResponse};

use crate::state::AppState;

/// List the providers this server is configured for.
pub async fn list_providers(State(state): State<AppState>) -> Json<ProvidersResponse> {
    Json(ProvidersResponse {
        providers: state
            .providers
            .available()
            .into_iter()
            .map(ProviderInfo::from)
            .collect(),
    })
}
