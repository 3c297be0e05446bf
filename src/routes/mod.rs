use axum::Router;

use crate::state::AppState;

pub mod analytics;
pub mod auth;
pub mod collections;
pub mod currencies;
pub mod doc;
pub mod health;
pub mod megamenu;
pub mod orders;
pub mod params;
pub mod payments;
pub mod products;
pub mod uploads;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/products", products::router())
        .nest("/filter", products::filter_router())
        .nest("/collections", collections::router())
        .nest("/megamenu", megamenu::router())
        .nest("/orders", orders::router())
        .nest("/payments", payments::router())
        .nest("/analytics", analytics::router())
        .nest("/currencies", currencies::router())
        .nest("/uploads", uploads::router())
        .nest("/auth", auth::router())
}
