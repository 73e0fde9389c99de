use time::{Date, Duration, OffsetDateTime, Weekday};
use time_tz::{ToTimezone, timezones};

use crate::{DateRange, ViewKind};

/// Source of "today" for requests that carry no explicit date.
pub trait Clock: Send + Sync {
    fn today(&self) -> Date;
}

/// Current date in a named IANA timezone. Unknown names fall back to UTC.
#[derive(Debug, Clone)]
pub struct ZonedClock {
    timezone: String,
}

impl ZonedClock {
    pub fn new(timezone: impl Into<String>) -> Self {
        Self {
            timezone: timezone.into(),
        }
    }
}

impl Clock for ZonedClock {
    fn today(&self) -> Date {
        today_in(&self.timezone)
    }
}

/// Always returns the same date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Date);

impl Clock for FixedClock {
    fn today(&self) -> Date {
        self.0
    }
}

pub fn today_in(timezone: &str) -> Date {
    let mut now = OffsetDateTime::now_utc();

    if let Some(tz) = timezones::get_by_name(timezone) {
        now = now.to_timezone(tz);
    }

    now.date()
}

pub fn is_school_day(date: Date) -> bool {
    !matches!(date.weekday(), Weekday::Saturday | Weekday::Sunday)
}

/// Monday of the ISO week containing `date`, clamped to the first representable day.
pub fn week_start(date: Date) -> Date {
    let days_since_monday = date.weekday().number_days_from_monday();

    date.checked_sub(Duration::days(i64::from(days_since_monday)))
        .unwrap_or(Date::MIN)
}

/// Friday of the ISO week containing `date`, clamped to the last representable day.
pub fn week_end(date: Date) -> Date {
    week_start(date)
        .checked_add(Duration::days(4))
        .unwrap_or(Date::MAX)
}

/// Move forward by `days_ahead` school days, skipping weekends.
///
/// Stops early at the last representable date.
pub fn add_business_days(start: Date, days_ahead: u32) -> Date {
    let mut date = start;
    let mut added = 0;

    while added < days_ahead {
        let Some(next) = date.next_day() else {
            break;
        };
        date = next;
        if is_school_day(date) {
            added += 1;
        }
    }

    date
}

fn span(start: Date, end: Date) -> Vec<Date> {
    let mut dates = Vec::new();
    let mut current = Some(start);

    while let Some(date) = current.filter(|d| *d <= end) {
        dates.push(date);
        current = date.next_day();
    }

    dates
}

/// Dates a view covers for `anchor`, plus the date to highlight.
pub fn resolve(view: ViewKind, anchor: Date) -> DateRange {
    match view {
        ViewKind::Today => DateRange {
            dates: vec![anchor],
            highlight: anchor,
        },
        // Past the last representable day there is no tomorrow to show.
        ViewKind::Tomorrow => match anchor.next_day() {
            Some(tomorrow) => DateRange {
                dates: vec![tomorrow],
                highlight: tomorrow,
            },
            None => DateRange {
                dates: Vec::new(),
                highlight: anchor,
            },
        },
        ViewKind::Week => DateRange {
            dates: span(week_start(anchor), week_end(anchor)),
            highlight: anchor,
        },
        // Weekend anchors sit past Friday, so the span is empty.
        ViewKind::Remainder => DateRange {
            dates: span(anchor.max(week_start(anchor)), week_end(anchor)),
            highlight: anchor,
        },
    }
}

/// Single day `days_ahead` school days after `anchor`.
pub fn resolve_offset(anchor: Date, days_ahead: u32) -> DateRange {
    let target = add_business_days(anchor, days_ahead);

    DateRange {
        dates: vec![target],
        highlight: target,
    }
}

/// `count` school days starting at `anchor` (which is always included).
///
/// Friday with a count of 3 yields Friday, Monday, Tuesday.
pub fn resolve_window(anchor: Date, count: u32) -> DateRange {
    let count = count.max(1) as usize;
    let mut dates = vec![anchor];

    while dates.len() < count {
        let last = dates[dates.len() - 1];
        let next = add_business_days(last, 1);
        if next == last {
            break;
        }
        dates.push(next);
    }

    DateRange {
        dates,
        highlight: anchor,
    }
}
