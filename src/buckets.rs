// 🗓️ Bucket Generator - Calendar windows for chart breakdowns
//
// Every granularity maps "now" to an ordered list of buckets, and every
// bucket knows which timestamps belong to it. Nothing here reads a clock.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

// ============================================================================
// GRANULARITY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Trailing window of calendar months ending at the current month
    Monthly,
    /// Every day of the current month
    Daily,
    /// Every hour of the current day
    Hourly,
    /// Day of week across all time, Monday first
    Weekday,
}

impl Granularity {
    pub const ALL: [Granularity; 4] = [
        Granularity::Monthly,
        Granularity::Daily,
        Granularity::Hourly,
        Granularity::Weekday,
    ];

    pub fn name(&self) -> &str {
        match self {
            Granularity::Monthly => "monthly",
            Granularity::Daily => "daily",
            Granularity::Hourly => "hourly",
            Granularity::Weekday => "weekday",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "monthly" | "month" => Some(Granularity::Monthly),
            "daily" | "day" => Some(Granularity::Daily),
            "hourly" | "hour" => Some(Granularity::Hourly),
            "weekday" | "weekly" | "week" => Some(Granularity::Weekday),
            _ => None,
        }
    }
}

// ============================================================================
// LABELS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelSet {
    #[default]
    En,
    Es,
}

const MONTHS_EN: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
const MONTHS_ES: [&str; 12] = [
    "Ene", "Feb", "Mar", "Abr", "May", "Jun", "Jul", "Ago", "Sep", "Oct", "Nov", "Dic",
];

// Sunday first, matching day-index 0..6
const WEEKDAYS_EN: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const WEEKDAYS_ES: [&str; 7] = ["Dom", "Lun", "Mar", "Mié", "Jue", "Vie", "Sáb"];

impl LabelSet {
    pub fn month_names(&self) -> &'static [&'static str; 12] {
        match self {
            LabelSet::En => &MONTHS_EN,
            LabelSet::Es => &MONTHS_ES,
        }
    }

    pub fn weekday_names(&self) -> &'static [&'static str; 7] {
        match self {
            LabelSet::En => &WEEKDAYS_EN,
            LabelSet::Es => &WEEKDAYS_ES,
        }
    }
}

// ============================================================================
// BUCKETS
// ============================================================================

/// Calendar rule deciding which timestamps fall into a bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BucketKey {
    /// Month number 0..=11, any year
    Month(u32),
    /// One calendar day
    Day { year: i32, month: u32, day: u32 },
    /// One hour of one calendar day
    Hour { year: i32, month: u32, day: u32, hour: u32 },
    /// Day of week, any date
    Weekday(Weekday),
}

impl BucketKey {
    pub fn contains(&self, at: &NaiveDateTime) -> bool {
        match *self {
            // Year is deliberately ignored: every March lands in "Mar"
            BucketKey::Month(month0) => at.month0() == month0,
            BucketKey::Day { year, month, day } => {
                at.year() == year && at.month() == month && at.day() == day
            }
            BucketKey::Hour {
                year,
                month,
                day,
                hour,
            } => at.year() == year && at.month() == month && at.day() == day && at.hour() == hour,
            BucketKey::Weekday(weekday) => at.weekday() == weekday,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub label: String,
    pub key: BucketKey,
}

pub fn is_leap_year(year: i32) -> bool {
    days_in_month(year, 2) == 29
}

/// Day count of `month` (1..=12); 0 for an invalid month
pub fn days_in_month(year: i32, month: u32) -> u32 {
    if !(1..=12).contains(&month) {
        return 0;
    }
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map_or(0, |last| last.day())
}

/// Trailing `window` months ending at `now`'s month, oldest first.
///
/// Windows longer than twelve are cut to twelve; a longer window would
/// revisit month numbers and count records twice.
pub fn monthly_buckets(now: NaiveDateTime, window: usize, labels: LabelSet) -> Vec<Bucket> {
    let window = window.min(12) as u32;
    let current = now.month0();
    let names = labels.month_names();

    (0..window)
        .rev()
        .map(|back| {
            let month0 = (current + 12 - back) % 12;
            Bucket {
                label: names[month0 as usize].to_string(),
                key: BucketKey::Month(month0),
            }
        })
        .collect()
}

/// Days 1..=N of `now`'s month
pub fn daily_buckets(now: NaiveDateTime) -> Vec<Bucket> {
    let (year, month) = (now.year(), now.month());

    (1..=days_in_month(year, month))
        .map(|day| Bucket {
            label: day.to_string(),
            key: BucketKey::Day { year, month, day },
        })
        .collect()
}

/// Hours 0..=23 of `now`'s day, labeled "H:00"
pub fn hourly_buckets(now: NaiveDateTime) -> Vec<Bucket> {
    let (year, month, day) = (now.year(), now.month(), now.day());

    (0..24)
        .map(|hour| Bucket {
            label: format!("{}:00", hour),
            key: BucketKey::Hour {
                year,
                month,
                day,
                hour,
            },
        })
        .collect()
}

/// Seven weekdays, Monday through Sunday
pub fn weekday_buckets(labels: LabelSet) -> Vec<Bucket> {
    let names = labels.weekday_names();
    let mut buckets: Vec<Bucket> = (0..7u32)
        .map(|index| Bucket {
            label: names[index as usize].to_string(),
            key: BucketKey::Weekday(weekday_from_sunday(index)),
        })
        .collect();

    buckets.rotate_left(1);
    buckets
}

fn weekday_from_sunday(index: u32) -> Weekday {
    match index % 7 {
        0 => Weekday::Sun,
        1 => Weekday::Mon,
        2 => Weekday::Tue,
        3 => Weekday::Wed,
        4 => Weekday::Thu,
        5 => Weekday::Fri,
        _ => Weekday::Sat,
    }
}

pub fn buckets_for(
    granularity: Granularity,
    now: NaiveDateTime,
    monthly_window: usize,
    labels: LabelSet,
) -> Vec<Bucket> {
    match granularity {
        Granularity::Monthly => monthly_buckets(now, monthly_window, labels),
        Granularity::Daily => daily_buckets(now),
        Granularity::Hourly => hourly_buckets(now),
        Granularity::Weekday => weekday_buckets(labels),
    }
}
