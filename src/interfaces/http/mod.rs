//! HTTP surface: the redirect endpoint, file delivery, the admin API and the provider webhook.

pub mod error;
pub mod handlers;
pub mod middleware;

use crate::application::orchestrator::PaymentOrchestrator;
use crate::domain::ports::FileStore;
use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<PaymentOrchestrator>,
    /// Required in `X-Api-Key` on `/api/payments*` when set.
    pub api_key: Option<String>,
    /// Backs `/file/{id}`; every file is missing when unset.
    pub files: Option<Arc<dyn FileStore>>,
}

pub fn router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route(
            "/payments",
            post(handlers::create_payment).get(handlers::all_payments),
        )
        .route("/payments/:id", get(handlers::payment_status))
        .layer(from_fn_with_state(
            state.api_key.clone(),
            middleware::require_api_key,
        ));

    let api_routes = admin_routes.route("/checkout", post(handlers::checkout));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/:id", get(handlers::redirect))
        .route("/file/:id", get(handlers::file))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Placeholder checkout page for the mock gateway, which issues
/// `<public-url>/checkout/<provider id>` links.
pub fn mock_checkout_router() -> Router {
    Router::new()
        .route("/checkout/:id", get(handlers::mock_checkout))
        .layer(TraceLayer::new_for_http())
}
