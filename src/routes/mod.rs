use std::sync::Arc;

use axum::{Json, Router, http::StatusCode, response::IntoResponse, routing::get};
use lunchmenu_menu::{Clock, MenuCache, NutrisliceClient, ZonedClock};
use serde_json::json;

pub mod api;
mod health;
pub mod params;
pub mod widget;

#[derive(Clone)]
pub struct AppState {
    pub menus: Arc<MenuCache>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(menus: Arc<MenuCache>, clock: Arc<dyn Clock>) -> Self {
        Self { menus, clock }
    }

    /// Wires the Nutrislice client, the week cache and the zoned clock from config.
    pub fn from_config(config: &crate::config::Config) -> anyhow::Result<Self> {
        let source = NutrisliceClient::new(
            &config.menu.nutrislice_root_url,
            config.menu.upstream_timeout(),
        )?;

        let menus = MenuCache::new(Arc::new(source))
            .ttl(config.menu.cache_ttl())
            .upstream_timeout(config.menu.upstream_timeout());

        Ok(Self::new(
            Arc::new(menus),
            Arc::new(ZonedClock::new(&config.menu.timezone)),
        ))
    }
}

pub async fn fallback() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({"error": "Not found"})))
}

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api", get(api::menu))
        .route("/widget", get(widget::page))
        .fallback(fallback)
        .with_state(app_state)
}
