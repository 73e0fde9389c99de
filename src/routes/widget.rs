use axum::{
    extract::{Query, State},
    response::Response,
};
use lunchmenu_menu::{
    DateRange, MenuDay, MenuItem, ViewKind, resolve, resolve_offset, resolve_window,
};
use time::Date;

use crate::{
    routes::{
        AppState,
        params::{MenuQuery, parse_anchor, parse_bool, parse_days_ahead},
    },
    template::{Theme, error_page, render, theme_class},
};

#[derive(askama::Template)]
#[template(path = "widget.html")]
pub struct WidgetTemplate {
    pub title: String,
    pub theme: &'static str,
    pub view: String,
    pub anchor_date: String,
    pub highlight_date: String,
    pub days: Vec<DayCard>,
    pub show_header: bool,
    pub show_footer: bool,
}

pub struct DayCard {
    pub date: String,
    pub weekday: String,
    /// "yesterday", "today", "tomorrow" relative to the anchor, or empty
    pub relative: &'static str,
    pub is_highlighted: bool,
    pub items: Vec<MenuItem>,
    /// Shown instead of the items when the day has no menu
    pub placeholder: String,
}

impl DayCard {
    fn new(day: MenuDay, range: &DateRange, anchor: Date) -> Self {
        let relative = if Some(day.date) == anchor.previous_day() {
            "yesterday"
        } else if day.date == anchor {
            "today"
        } else if Some(day.date) == anchor.next_day() {
            "tomorrow"
        } else {
            ""
        };

        Self {
            date: day.date.to_string(),
            weekday: day.date.weekday().to_string(),
            relative,
            is_highlighted: range.is_highlighted(day.date),
            placeholder: day.reason().map(|r| r.label().to_owned()).unwrap_or_default(),
            items: day.items,
        }
    }
}

/// What a widget request shows: its label, title and date range.
#[derive(Debug, PartialEq, Eq)]
pub struct WidgetPlan {
    pub view: String,
    pub title: String,
    pub range: DateRange,
}

fn single_day_title(days_ahead: u32) -> String {
    match days_ahead {
        0 => "Today's Menu".to_owned(),
        1 => "Tomorrow's Menu".to_owned(),
        n => format!("Menu in {n} School Days"),
    }
}

/// Chooses the range for a widget request.
///
/// Without an explicit view, `days_ahead > 0` asks for that many school days
/// starting at the anchor. With a view, `days_ahead` counts school days: it
/// moves the highlight on a week view and picks the day on single-day views.
pub fn plan_widget(raw_view: Option<&str>, anchor: Date, days_ahead: Option<u32>) -> WidgetPlan {
    if raw_view.is_none() {
        if let Some(count) = days_ahead.filter(|n| *n > 0) {
            return WidgetPlan {
                view: "window".to_owned(),
                title: format!("Next {count} School Days"),
                range: resolve_window(anchor, count),
            };
        }
    }

    let view = ViewKind::parse_or_default(raw_view);
    let (title, range) = match (view, days_ahead) {
        (ViewKind::Week, None) => ("This Week".to_owned(), resolve(view, anchor)),
        (ViewKind::Week, Some(n)) => {
            let mut range = resolve(view, anchor);
            range.highlight = resolve_offset(anchor, n).highlight;
            ("This Week".to_owned(), range)
        }
        (ViewKind::Remainder, _) => ("Rest of the Week".to_owned(), resolve(view, anchor)),
        (ViewKind::Today, None) => (single_day_title(0), resolve(view, anchor)),
        (ViewKind::Tomorrow, None) => (single_day_title(1), resolve(view, anchor)),
        (_, Some(n)) => (single_day_title(n), resolve_offset(anchor, n)),
    };

    WidgetPlan {
        view: view.to_string(),
        title,
        range,
    }
}

/// GET /widget?view=&date=&theme=&days_ahead=&show_header=&show_footer=
#[tracing::instrument(skip_all, fields(view = ?query.view, date = ?query.date))]
pub async fn page(State(app): State<AppState>, Query(query): Query<MenuQuery>) -> Response {
    let theme = Theme::parse_or_default(query.theme.as_deref());

    let anchor = match parse_anchor(query.date.as_deref(), app.clock.as_ref()) {
        Ok(anchor) => anchor,
        Err(err) => return error_page(err, theme),
    };

    let plan = plan_widget(
        query.view.as_deref(),
        anchor,
        parse_days_ahead(query.days_ahead.as_deref()),
    );
    let menus = app.menus.get_menus(&plan.range.dates).await;

    render(WidgetTemplate {
        days: menus
            .into_iter()
            .map(|day| DayCard::new(day, &plan.range, anchor))
            .collect(),
        title: plan.title,
        theme: theme_class(theme),
        view: plan.view,
        anchor_date: anchor.to_string(),
        highlight_date: plan.range.highlight.to_string(),
        show_header: parse_bool(query.show_header.as_deref(), true),
        show_footer: parse_bool(query.show_footer.as_deref(), true),
    })
}
