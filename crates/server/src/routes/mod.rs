use axum::{
    Router, middleware,
    routing::{IntoMakeService, get},
};
use tower_http::cors::CorsLayer;

use crate::{middleware as app_middleware, service::TopologyService};

pub mod health;
pub mod routers;

/// Every endpoint, wrapped in the request-id middleware
pub fn app(service: TopologyService) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .merge(routers::router())
        .with_state(service)
        .layer(middleware::from_fn(app_middleware::request_id_middleware))
}

pub fn router(service: TopologyService, cors_permissive: bool) -> IntoMakeService<Router> {
    let app = app(service);
    if cors_permissive {
        app.layer(CorsLayer::permissive()).into_make_service()
    } else {
        app.into_make_service()
    }
}
