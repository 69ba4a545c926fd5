use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::auth::IdentityVerifier;
use crate::handlers;
use crate::store::RegistryStore;

/// Process-wide context handed to every handler.
///
/// The store is constructed once at startup and injected here rather than
/// reached for globally, so tests can swap in another implementation.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RegistryStore>,
    pub verifier: Arc<dyn IdentityVerifier>,
    pub public_host: Arc<str>,
    pub service_name: Arc<str>,
}

pub fn build_app(state: AppState) -> Router {
    let v1 = Router::new()
        .route("/agents", post(handlers::publish))
        .route("/agents/{slug}", get(handlers::get_agent));

    Router::new()
        .route("/", get(handlers::health))
        .route("/health", get(handlers::probe))
        .nest("/v1", v1)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
