//! Shared setup for router-level tests: a scripted upstream and a fixed clock.

#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use axum::{Router, body::Body, http::Request};
use http_body_util::BodyExt;
use lunchmenu::{AppState, router};
use lunchmenu_menu::{
    FetchError, FixedClock, MenuCache, MenuSource, UpstreamDay, ViewKind, resolve,
};
use serde_json::json;
use time::Date;
use tower::ServiceExt;

/// Upstream double: every weekday gets a breakfast and a lunch, except the
/// weeks marked failing and the days listed as closures.
#[derive(Default)]
pub struct FakeNutrislice {
    calls: AtomicUsize,
    failing: Mutex<Vec<Date>>,
    closures: Vec<(Date, &'static str)>,
}

impl FakeNutrislice {
    pub fn with_closure(mut self, date: Date, note: &'static str) -> Self {
        self.closures.push((date, note));
        self
    }

    pub fn fail_week(&self, monday: Date) {
        self.failing.lock().unwrap().push(monday);
    }

    pub fn recover(&self) {
        self.failing.lock().unwrap().clear();
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl MenuSource for FakeNutrislice {
    async fn fetch_week(&self, monday: Date) -> Result<Vec<UpstreamDay>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.failing.lock().unwrap().contains(&monday) {
            return Err(FetchError::Transport("connection reset".to_owned()));
        }

        Ok(resolve(ViewKind::Week, monday)
            .dates
            .into_iter()
            .map(|date| {
                let items = match self.closures.iter().find(|(d, _)| *d == date) {
                    Some((_, note)) => vec![json!({"food": {"name": note}})],
                    None => vec![
                        json!({"food": {"name": "Breakfast"}}),
                        json!({"food": {"name": "Cereal"}}),
                        json!({"text": "Lunch"}),
                        json!({"food": {"name": format!("Pizza {}", date.weekday())}}),
                        json!({"food": {"name": "with"}}),
                        json!({"food": {"name": "Side Salad"}}),
                    ],
                };

                UpstreamDay {
                    date: Some(date.to_string()),
                    menu_items: Some(items),
                }
            })
            .collect())
    }
}

pub fn test_app(source: Arc<FakeNutrislice>, today: Date) -> Router {
    let menus = MenuCache::new(source).ttl(std::time::Duration::from_secs(600));

    router(AppState::new(Arc::new(menus), Arc::new(FixedClock(today))))
}

pub async fn get(app: &Router, uri: &str) -> (u16, String) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status().as_u16();
    let body = response.into_body().collect().await.unwrap().to_bytes();

    (status, String::from_utf8(body.to_vec()).unwrap())
}

pub async fn get_json(app: &Router, uri: &str) -> (u16, serde_json::Value) {
    let (status, body) = get(app, uri).await;
    (status, serde_json::from_str(&body).unwrap())
}
