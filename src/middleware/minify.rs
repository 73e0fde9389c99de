use axum::{body::Body, response::Response};
cfg_if::cfg_if! {
    if #[cfg(not(debug_assertions))] {
        use axum::{body::to_bytes, http::header};
        use std::sync::LazyLock;

        /// Widgets are embedded in iframes, so keep the document skeleton intact
        static MINIFY_CFG: LazyLock<minify_html::Cfg> = LazyLock::new(|| minify_html::Cfg {
            keep_closing_tags: true,
            keep_html_and_head_opening_tags: true,
            minify_css: true,
            ..Default::default()
        });
    }
}

/// Minifies `text/html` responses in release builds; everything else passes through.
pub async fn minify_html_middleware(response: Response<Body>) -> Response<Body> {
    cfg_if::cfg_if! {
        if #[cfg(not(debug_assertions))] {
            let is_html = response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|h| h.to_str().ok())
                .is_some_and(|ct| ct.starts_with("text/html"));

            if is_html {
                let (parts, body) = response.into_parts();
                return match to_bytes(body, usize::MAX).await {
                    Ok(bytes) => {
                        let minified = minify_html::minify(&bytes, &MINIFY_CFG);
                        let mut response = Response::from_parts(parts, Body::from(minified));
                        response.headers_mut().remove(header::CONTENT_LENGTH);
                        response
                    }
                    Err(err) => {
                        tracing::error!("Failed to buffer HTML response for minification: {err}");
                        Response::from_parts(parts, Body::empty())
                    }
                };
            }
        }
    }

    response
}
