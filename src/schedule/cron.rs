// src/schedule/cron.rs

//! Five-field cron expression parsing and next-fire evaluation.
//!
//! Supports `MIN HOUR DOM MON DOW` with `*`, values, ranges (`a-b`), steps
//! (`*/n`, `a-b/n`), comma lists, month/weekday names, and day-of-week `7`
//! as Sunday. Day-of-month and day-of-week combine with the classic cron
//! union rule: when both fields are restricted, a day matches if *either*
//! does.
//!
//! [`CronExpr::next_after`] finds the first fire time strictly after a
//! given instant by field-skipping (advance month, then day, then hour,
//! then minute), so each call is a few hundred cheap steps at most. The
//! search is bounded to ~4 years; expressions that can never fire (e.g.
//! `0 0 30 2 *`) return `None`.

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Timelike, Utc};

use crate::errors::{CronrunError, Result};

const MONTH_NAMES: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];
const DOW_NAMES: [&str; 7] = ["sun", "mon", "tue", "wed", "thu", "fri", "sat"];

/// Upper bound for the next-fire search, from the base time.
const SEARCH_HORIZON_DAYS: i64 = 4 * 366;

/// A parsed five-field cron expression.
///
/// Each field is a bitmask of matching values (bit `n` set = value `n`
/// matches).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronExpr {
    minutes: u64,
    hours: u64,
    dom: u64,
    months: u64,
    dow: u64,
    dom_restricted: bool,
    dow_restricted: bool,
}

impl CronExpr {
    /// Parse a five-field cron expression.
    pub fn parse(expression: &str) -> Result<Self> {
        let fields: Vec<&str> = expression.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(invalid(
                expression,
                format!("expected 5 fields (MIN HOUR DOM MON DOW), got {}", fields.len()),
            ));
        }

        let minutes = parse_field(fields[0], 0, 59, None).map_err(|r| invalid(expression, r))?;
        let hours = parse_field(fields[1], 0, 23, None).map_err(|r| invalid(expression, r))?;
        let dom = parse_field(fields[2], 1, 31, None).map_err(|r| invalid(expression, r))?;
        let months =
            parse_field(fields[3], 1, 12, Some(&MONTH_NAMES)).map_err(|r| invalid(expression, r))?;
        let dow = parse_dow(fields[4]).map_err(|r| invalid(expression, r))?;

        Ok(Self {
            minutes,
            hours,
            dom,
            months,
            dow,
            dom_restricted: !fields[2].starts_with('*'),
            dow_restricted: !fields[4].starts_with('*'),
        })
    }

    /// First fire time strictly after `after`, or `None` if the expression
    /// cannot fire within the search horizon.
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let mut t = truncate_to_minute(after)? + Duration::minutes(1);
        let limit = after + Duration::days(SEARCH_HORIZON_DAYS);

        while t <= limit {
            if !bit(self.months, t.month()) {
                t = next_month_start(&t)?;
                continue;
            }
            if !self.day_matches(t.day(), t.weekday().num_days_from_sunday()) {
                t = next_day_start(&t)?;
                continue;
            }
            if !bit(self.hours, t.hour()) {
                t = t.with_minute(0)? + Duration::hours(1);
                continue;
            }
            if !bit(self.minutes, t.minute()) {
                t += Duration::minutes(1);
                continue;
            }
            return Some(t);
        }

        None
    }

    fn day_matches(&self, day: u32, weekday: u32) -> bool {
        let dom_ok = bit(self.dom, day);
        let dow_ok = bit(self.dow, weekday);
        // Classic cron: both fields restricted means union, otherwise the
        // unrestricted field matches everything and only the other counts.
        if self.dom_restricted && self.dow_restricted {
            dom_ok || dow_ok
        } else {
            dom_ok && dow_ok
        }
    }
}

fn bit(mask: u64, value: u32) -> bool {
    mask & (1u64 << value) != 0
}

fn invalid(expression: &str, reason: impl Into<String>) -> CronrunError {
    CronrunError::InvalidSchedule {
        expression: expression.to_string(),
        reason: reason.into(),
    }
}

fn truncate_to_minute(t: DateTime<Utc>) -> Option<DateTime<Utc>> {
    t.with_second(0)?.with_nanosecond(0)
}

fn next_day_start(t: &DateTime<Utc>) -> Option<DateTime<Utc>> {
    let next = t.date_naive().succ_opt()?;
    Some(Utc.from_utc_datetime(&next.and_time(NaiveTime::MIN)))
}

fn next_month_start(t: &DateTime<Utc>) -> Option<DateTime<Utc>> {
    let (year, month) = if t.month() == 12 {
        (t.year() + 1, 1)
    } else {
        (t.year(), t.month() + 1)
    };
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).single()
}

/// Parse one field into a bitmask of matching values.
fn parse_field(
    field: &str,
    min: u32,
    max: u32,
    names: Option<&[&str]>,
) -> std::result::Result<u64, String> {
    let mut mask: u64 = 0;
    for item in field.split(',') {
        mask |= parse_item(item.trim(), min, max, names)?;
    }
    if mask == 0 {
        return Err(format!("field '{field}' matches no values"));
    }
    Ok(mask)
}

fn parse_item(
    item: &str,
    min: u32,
    max: u32,
    names: Option<&[&str]>,
) -> std::result::Result<u64, String> {
    if item.is_empty() {
        return Err("empty field item".to_string());
    }

    let (range_part, step) = match item.split_once('/') {
        Some((range, step)) => {
            let step: u32 = step
                .parse()
                .map_err(|_| format!("invalid step in '{item}'"))?;
            if step == 0 {
                return Err(format!("step must be >= 1 in '{item}'"));
            }
            (range, step)
        }
        None => (item, 1),
    };
    let has_step = item.contains('/');

    let (lo, hi) = if range_part == "*" {
        (min, max)
    } else if let Some((a, b)) = range_part.split_once('-') {
        (
            parse_value(a, min, max, names)?,
            parse_value(b, min, max, names)?,
        )
    } else {
        let value = parse_value(range_part, min, max, names)?;
        // "N/step" runs from N to the field maximum.
        if has_step { (value, max) } else { (value, value) }
    };

    if lo > hi {
        return Err(format!("range '{item}' is out of order"));
    }

    let mut mask: u64 = 0;
    let mut v = lo;
    while v <= hi {
        mask |= 1u64 << v;
        v += step;
    }
    Ok(mask)
}

fn parse_value(
    text: &str,
    min: u32,
    max: u32,
    names: Option<&[&str]>,
) -> std::result::Result<u32, String> {
    if let Some(names) = names {
        let lower = text.to_ascii_lowercase();
        if let Some(idx) = names.iter().position(|n| *n == lower) {
            return Ok(min + idx as u32);
        }
    }
    let value: u32 = text
        .parse()
        .map_err(|_| format!("invalid value '{text}'"))?;
    if value < min || value > max {
        return Err(format!("value {value} out of range {min}-{max}"));
    }
    Ok(value)
}

/// Day-of-week field: names, 0-7 with both 0 and 7 meaning Sunday.
fn parse_dow(field: &str) -> std::result::Result<u64, String> {
    let mut mask = parse_field(field, 0, 7, Some(&DOW_NAMES))?;
    if bit(mask, 7) {
        mask = (mask & !(1u64 << 7)) | 1;
    }
    Ok(mask)
}
