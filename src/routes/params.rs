//! Query-string parsing shared by `/api` and `/widget`.

use lunchmenu_menu::{Clock, parse_iso_date};
use serde::Deserialize;
use time::Date;

use crate::error::AppError;

#[derive(Debug, Default, Deserialize)]
pub struct MenuQuery {
    pub view: Option<String>,
    pub date: Option<String>,
    pub theme: Option<String>,
    pub days_ahead: Option<String>,
    pub show_header: Option<String>,
    pub show_footer: Option<String>,
}

/// Explicit `YYYY-MM-DD` date, or today on the clock when absent or blank.
pub fn parse_anchor(raw: Option<&str>, clock: &dyn Clock) -> Result<Date, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(clock.today()),
        Some(value) => parse_iso_date(value).ok_or_else(|| AppError::InvalidDate(value.to_owned())),
    }
}

pub fn parse_bool(raw: Option<&str>, default: bool) -> bool {
    match raw {
        None => default,
        Some(value) => !matches!(
            value.trim().to_lowercase().as_str(),
            "0" | "false" | "no" | "off" | "disable" | "disabled"
        ),
    }
}

/// Four school weeks; every touched week costs one upstream fetch.
pub const MAX_DAYS_AHEAD: u32 = 20;

/// `None` when absent; negative or non-numeric values count as 0, large ones
/// are capped at [`MAX_DAYS_AHEAD`].
pub fn parse_days_ahead(raw: Option<&str>) -> Option<u32> {
    let value = raw.map(str::trim).filter(|v| !v.is_empty())?;

    Some(match value.parse::<i64>() {
        Ok(n) => n.clamp(0, i64::from(MAX_DAYS_AHEAD)) as u32,
        // Too many digits for i64
        Err(_) if value.bytes().all(|b| b.is_ascii_digit()) => MAX_DAYS_AHEAD,
        Err(_) => 0,
    })
}
