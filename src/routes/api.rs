use axum::{
    Json,
    extract::{Query, State},
};
use lunchmenu_menu::{DateRange, MenuDay, MenuItem, ViewKind, resolve};
use serde::Serialize;
use time::Date;

use crate::{
    error::AppError,
    routes::{
        AppState,
        params::{MenuQuery, parse_anchor},
    },
};

#[derive(Debug, Serialize)]
pub struct MenuResponse {
    pub view: ViewKind,
    pub anchor_date: String,
    pub highlight_date: String,
    pub days: Vec<DayPayload>,
}

#[derive(Debug, Serialize)]
pub struct DayPayload {
    pub date: String,
    pub weekday: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub items: Vec<MenuItem>,
    pub is_highlighted: bool,
}

impl DayPayload {
    fn new(day: MenuDay, range: &DateRange) -> Self {
        let reason = day.reason();

        Self {
            date: day.date.to_string(),
            weekday: day.date.weekday().to_string(),
            status: if reason.is_some() { "unavailable" } else { "ok" },
            reason: reason.map(|r| r.code()),
            note: reason.and_then(|r| r.note()).map(str::to_owned),
            is_highlighted: range.is_highlighted(day.date),
            items: day.items,
        }
    }
}

/// Resolves `view` around `anchor` and fetches every day of the range.
#[tracing::instrument(skip(app))]
pub async fn menu_response(app: &AppState, view: ViewKind, anchor: Date) -> MenuResponse {
    let range = resolve(view, anchor);
    let menus = app.menus.get_menus(&range.dates).await;

    MenuResponse {
        view,
        anchor_date: anchor.to_string(),
        highlight_date: range.highlight.to_string(),
        days: menus
            .into_iter()
            .map(|day| DayPayload::new(day, &range))
            .collect(),
    }
}

/// GET /api?view=&date=
#[tracing::instrument(skip_all, fields(view = ?query.view, date = ?query.date))]
pub async fn menu(
    State(app): State<AppState>,
    Query(query): Query<MenuQuery>,
) -> Result<Json<MenuResponse>, AppError> {
    let view = ViewKind::parse_or_default(query.view.as_deref());
    let anchor = parse_anchor(query.date.as_deref(), app.clock.as_ref())?;

    Ok(Json(menu_response(&app, view, anchor).await))
}
