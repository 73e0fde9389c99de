use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::error::AppError;

pub const SERVER_ERROR_MESSAGE: &str = "Something went wrong, please retry later";

/// Widget color scheme. Only selects a stylesheet class; never reaches the menu engine.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Theme {
    #[default]
    Dark,
    Light,
    Transparent,
}

impl Theme {
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        raw.map(str::trim)
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }
}

#[derive(askama::Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub status_code: u16,
    pub message: String,
    pub theme: &'static str,
}

pub fn render<T: askama::Template>(template: T) -> Response {
    render_with_status(StatusCode::OK, template)
}

pub fn render_with_status<T: askama::Template>(status: StatusCode, template: T) -> Response {
    match template.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(err) => {
            let err = AppError::from(err);
            (err.status(), err.public_message()).into_response()
        }
    }
}

/// HTML counterpart of [`AppError`]'s JSON response.
pub fn error_page(err: AppError, theme: Theme) -> Response {
    let status = err.status();

    render_with_status(
        status,
        ErrorTemplate {
            status_code: status.as_u16(),
            message: err.public_message(),
            theme: theme_class(theme),
        },
    )
}

pub fn theme_class(theme: Theme) -> &'static str {
    match theme {
        Theme::Dark => "theme-dark",
        Theme::Light => "theme-light",
        Theme::Transparent => "theme-transparent",
    }
}
