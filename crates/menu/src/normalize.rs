//! Turns provider day records into [`MenuDay`]s.
//!
//! Nutrislice feeds often emit section headers ("Breakfast", "Grab & Go", ...)
//! as ordinary food items, so a day's items are read as a token stream where a
//! header switches the category the following foods belong to.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use time::{Date, macros::format_description};

use crate::{MenuDay, MenuItem, UnavailableReason, UpstreamDay};

pub const BREAKFAST: &str = "Breakfast";
pub const LUNCH: &str = "Lunch";
pub const GRAB_AND_GO: &str = "Grab & Go";
pub const DELI_ENTREE: &str = "Deli Entree";

const CATEGORY_ORDER: [&str; 4] = [BREAKFAST, LUNCH, GRAB_AND_GO, DELI_ENTREE];

const CONJUNCTIONS: [&str; 3] = ["with", "and", "or"];

const CLOSURE_KEYWORDS: [&str; 11] = [
    "conference",
    "conferences",
    "staff development",
    "inservice",
    "in-service",
    "teacher work day",
    "holiday",
    "no school",
    "school closed",
    "early release",
    "snow day",
];

/// Lunch-only text at most this long is read as a closure notice.
const CLOSURE_NOTE_MAX_CHARS: usize = 80;

static W_SLASH_GLUED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bw/(\S)").expect("valid regex"));
static W_SLASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bw/\s*").expect("valid regex"));
static COMMAS_AROUND_CONJ: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*,\s*\b(and|or|with)\b\s*,\s*").expect("valid regex")
});
static COMMA_AFTER_CONJ: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(and|or|with)\b\s*,\s*").expect("valid regex"));
static COMMA_BEFORE_CONJ: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*,\s*\b(and|or|with)\b").expect("valid regex"));
static REPEATED_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("valid regex"));

fn header_category(token: &str) -> Option<&'static str> {
    match token {
        "breakfast" => Some(BREAKFAST),
        "lunch" => Some(LUNCH),
        "grab & go" | "grab and go" => Some(GRAB_AND_GO),
        "deli entree" | "deli entrée" => Some(DELI_ENTREE),
        _ => None,
    }
}

pub fn parse_iso_date(raw: &str) -> Option<Date> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).ok()
}

fn non_empty(value: Option<&Value>) -> Option<String> {
    let name = value?.as_str()?.trim();
    (!name.is_empty()).then(|| name.to_owned())
}

/// Name of a menu item across the shapes Nutrislice uses.
pub fn food_name(item: &Value) -> Option<String> {
    non_empty(item.get("food").and_then(|f| f.get("name")))
        .or_else(|| non_empty(item.get("name")))
        .or_else(|| non_empty(item.get("text")))
        .or_else(|| {
            non_empty(
                item.get("menu_item")
                    .and_then(|m| m.get("food"))
                    .and_then(|f| f.get("name")),
            )
        })
}

/// Tidies joined tokens: `w/` becomes `with` and commas around conjunctions go away.
pub fn tidy_conjunctions(text: &str) -> String {
    let text = W_SLASH_GLUED.replace_all(text, "w/ $1");
    let text = W_SLASH.replace_all(&text, "with ");
    let text = COMMAS_AROUND_CONJ.replace_all(&text, " ${1} ");
    let text = COMMA_AFTER_CONJ.replace_all(&text, "${1} ");
    let text = COMMA_BEFORE_CONJ.replace_all(&text, " ${1}");

    REPEATED_SPACE.replace_all(&text, " ").trim().to_owned()
}

fn categorize(names: &[String]) -> HashMap<&'static str, Vec<String>> {
    let mut buckets: HashMap<&'static str, Vec<String>> = HashMap::new();
    let mut current: Option<&'static str> = None;

    for name in names {
        let token = name.to_lowercase();

        if let Some(category) = header_category(&token) {
            current = Some(category);
            buckets.entry(category).or_default();
            continue;
        }

        let category = *current.get_or_insert(if token.contains("breakfast") {
            BREAKFAST
        } else {
            LUNCH
        });

        let bucket = buckets.entry(category).or_default();
        if CONJUNCTIONS.contains(&token.as_str()) {
            bucket.push(token);
        } else {
            bucket.push(name.to_owned());
        }
    }

    buckets
}

fn closure_note(items: &[MenuItem]) -> Option<String> {
    let [only] = items else {
        return None;
    };

    if only.category != LUNCH {
        return None;
    }

    let lowered = only.name.to_lowercase();
    let is_closure = CLOSURE_KEYWORDS.iter().any(|k| lowered.contains(k))
        || only.name.chars().count() <= CLOSURE_NOTE_MAX_CHARS;

    is_closure.then(|| only.name.to_owned())
}

/// Normalizes the food names of one day.
pub fn normalize_day(date: Date, names: &[String]) -> MenuDay {
    if let Some(note) = names
        .iter()
        .find(|name| name.to_lowercase().starts_with("no school"))
    {
        return MenuDay::unavailable(date, UnavailableReason::NoSchool(note.to_owned()));
    }

    let buckets = categorize(names);
    let items = CATEGORY_ORDER
        .iter()
        .filter_map(|category| {
            let tokens = buckets.get(category)?;
            if tokens.is_empty() {
                return None;
            }

            Some(MenuItem {
                category: (*category).to_owned(),
                name: tidy_conjunctions(&tokens.join(", ")),
            })
        })
        .collect::<Vec<_>>();

    if items.is_empty() {
        return MenuDay::unavailable(date, UnavailableReason::NoMenuPublished);
    }

    if let Some(note) = closure_note(&items) {
        return MenuDay::unavailable(date, UnavailableReason::NoSchool(note));
    }

    MenuDay::available(date, items)
}

/// Normalizes a week of provider records, keyed by date.
///
/// Records without a parseable date are skipped.
pub fn normalize_week(days: &[UpstreamDay]) -> HashMap<Date, MenuDay> {
    days.iter()
        .filter_map(|day| {
            let date = parse_iso_date(day.date.as_deref()?)?;
            let names = day
                .menu_items
                .iter()
                .flatten()
                .filter_map(food_name)
                .collect::<Vec<_>>();

            Some((date, normalize_day(date, &names)))
        })
        .collect()
}
