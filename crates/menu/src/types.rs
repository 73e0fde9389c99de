use serde::{Deserialize, Serialize};
use time::Date;

/// Which slice of the school week a request asks for.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    strum::EnumString,
    strum::Display,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ViewKind {
    #[default]
    Week,
    Remainder,
    Today,
    Tomorrow,
}

impl ViewKind {
    /// Lenient parse used by the query layer: blank or unknown values fall back to `Week`.
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        raw.map(str::trim)
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }
}

/// Dates to fetch for a request plus the date the UI marks as "today".
///
/// The highlight is not guaranteed to be part of `dates` (weekend anchors on a
/// week view), so consumers must compare against each date rather than assume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub dates: Vec<Date>,
    pub highlight: Date,
}

impl DateRange {
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn is_highlighted(&self, date: Date) -> bool {
        self.highlight == date && self.dates.contains(&date)
    }

    pub fn contains_highlight(&self) -> bool {
        self.dates.contains(&self.highlight)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub category: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnavailableReason {
    /// Transport failure, timeout, non-success status or malformed payload.
    UpstreamError,
    NoMenuPublished,
    /// The provider marked the day as a closure; carries its wording.
    NoSchool(String),
}

impl UnavailableReason {
    pub fn code(&self) -> &'static str {
        match self {
            UnavailableReason::UpstreamError => "upstream_error",
            UnavailableReason::NoMenuPublished => "no_menu_published",
            UnavailableReason::NoSchool(_) => "no_school",
        }
    }

    pub fn note(&self) -> Option<&str> {
        match self {
            UnavailableReason::NoSchool(note) => Some(note),
            _ => None,
        }
    }

    /// Placeholder text shown instead of a menu.
    pub fn label(&self) -> &str {
        match self {
            UnavailableReason::UpstreamError => "Menu temporarily unavailable",
            UnavailableReason::NoMenuPublished => "Menu not available",
            UnavailableReason::NoSchool(note) => note,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuStatus {
    Ok,
    Unavailable(UnavailableReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuDay {
    pub date: Date,
    pub items: Vec<MenuItem>,
    pub status: MenuStatus,
}

impl MenuDay {
    pub fn available(date: Date, items: Vec<MenuItem>) -> Self {
        Self {
            date,
            items,
            status: MenuStatus::Ok,
        }
    }

    pub fn unavailable(date: Date, reason: UnavailableReason) -> Self {
        Self {
            date,
            items: Vec::new(),
            status: MenuStatus::Unavailable(reason),
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == MenuStatus::Ok
    }

    pub fn reason(&self) -> Option<&UnavailableReason> {
        match &self.status {
            MenuStatus::Ok => None,
            MenuStatus::Unavailable(reason) => Some(reason),
        }
    }
}

/// Cache key: ISO year and week number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WeekKey {
    pub iso_year: i32,
    pub iso_week: u8,
}

impl From<Date> for WeekKey {
    fn from(date: Date) -> Self {
        let (iso_year, iso_week, _) = date.to_iso_week_date();
        Self { iso_year, iso_week }
    }
}

/// One day record as the provider sends it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpstreamDay {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub menu_items: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpstreamWeek {
    #[serde(default)]
    pub days: Option<Vec<UpstreamDay>>,
}
