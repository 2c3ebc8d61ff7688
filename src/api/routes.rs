use axum::{
    extract::Request,
    http::Uri,
    middleware::{self, Next},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::{auth_middleware, AuthService};
use crate::config::FrontendConfig;
use crate::dataset::DataService;
use crate::pipeline::FilterEngine;

use super::handlers::{
    campaigns, dimensions, evaluate_alerts, funnel, health_check, monthly, nudge_activity,
    reload, status, AppState,
};
use super::static_files::serve_static;

pub fn create_api_router(
    data: Arc<DataService>,
    engine: FilterEngine,
    auth_service: Arc<AuthService>,
    frontend_config: FrontendConfig,
) -> Router {
    let state = Arc::new(AppState { data, engine });

    let protected_routes = Router::new()
        .route("/status", get(status))
        .route("/dimensions", get(dimensions))
        .route("/monthly", get(monthly))
        .route("/funnel", get(funnel))
        .route("/campaigns", get(campaigns))
        .route("/nudge-activity", get(nudge_activity))
        .route("/alerts/evaluate", post(evaluate_alerts))
        .route("/reload", post(reload))
        .route_layer(middleware::from_fn(move |req: Request, next: Next| {
            let auth = Arc::clone(&auth_service);
            auth_middleware(auth, req, next)
        }))
        .with_state(state);

    let static_dir = frontend_config.static_dir;

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", protected_routes)
        .fallback(move |uri: Uri| serve_static(uri, static_dir.clone()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
