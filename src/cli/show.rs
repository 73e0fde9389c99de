use anyhow::Result;
use lunchmenu_menu::ViewKind;

use crate::routes::{AppState, api::menu_response, params::parse_anchor};

/// Prints the `/api` body for a view without starting the server.
pub async fn show(config: crate::config::Config, view: Option<String>, date: Option<String>) -> Result<()> {
    let state = AppState::from_config(&config)?;

    let view = ViewKind::parse_or_default(view.as_deref());
    let anchor = parse_anchor(date.as_deref(), state.clock.as_ref())?;

    let response = menu_response(&state, view, anchor).await;
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}
