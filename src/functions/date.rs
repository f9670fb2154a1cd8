//! Date/time functions
//!
//! All calendar arithmetic is done in UTC. A date argument may be a date
//! value, a number of milliseconds since the Unix epoch, or text in one of
//! the forms `2024-03-05T10:00:00.000Z`, `2024-03-05 10:00:00` or
//! `2024-03-05`.

use chrono::{
    DateTime, Datelike, Months, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Timelike, Utc,
};

use super::{Accepts, Builtin, EvalFn, ParamTypes, Signature, arg};
use crate::Value;
use crate::error::FunctionFailure;
use crate::types::ValueType::{self, Date, Number, String as Str};

type FnResult = Result<Value, FunctionFailure>;

const DATE_LIKE: &[ValueType] = &[Number, Date];

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Date for a value, if it denotes one.
pub(crate) fn to_datetime(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Date(d) => Some(*d),
        Value::Number(n) if n.is_finite() => Utc.timestamp_millis_opt(*n as i64).single(),
        Value::String(s) => parse_date(s.trim()),
        _ => None,
    }
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return Some(d.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Date argument at `index` or an argument failure.
fn date_arg(args: &[Value], index: usize) -> Result<DateTime<Utc>, FunctionFailure> {
    let value = arg(args, index);
    to_datetime(value).ok_or_else(|| FunctionFailure::Argument {
        index: index + 1,
        expected: "a date",
        found: ValueType::of(value).to_string(),
    })
}

fn whole(value: &Value) -> i64 {
    let n = value.to_number();
    if n.is_finite() { n.trunc() as i64 } else { 0 }
}

/// Calendar date with JavaScript-style overflow: month 13 is January of
/// the next year, day 0 the last day of the previous month.
fn compose(parts: &[i64]) -> Option<DateTime<Utc>> {
    let part = |i: usize| parts.get(i).copied().unwrap_or(0);
    let months = part(0).checked_mul(12)?.checked_add(part(1) - 1)?;
    let year = i32::try_from(months.div_euclid(12)).ok()?;
    let month = u32::try_from(months.rem_euclid(12)).ok()? + 1;

    let start = NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)?;
    let offset = TimeDelta::try_days(part(2) - 1)?
        .checked_add(&TimeDelta::try_hours(part(3))?)?
        .checked_add(&TimeDelta::try_minutes(part(4))?)?
        .checked_add(&TimeDelta::try_seconds(part(5))?)?;
    Some(start.checked_add_signed(offset)?.and_utc())
}

/// DATE(), DATE(value) or DATE(year, month, day, [hour], [minute], [second])
pub fn fn_date(args: &[Value]) -> FnResult {
    match args.len() {
        0 => Ok(Value::Undefined),
        1 => date_arg(args, 0).map(Value::Date),
        3..=6 => {
            let parts: Vec<i64> = args.iter().map(whole).collect();
            compose(&parts)
                .map(Value::Date)
                .ok_or_else(|| FunctionFailure::Invalid("date out of range".into()))
        }
        n => Err(FunctionFailure::Invalid(format!(
            "expects 0, 1 or 3 to 6 arguments, got {n}"
        ))),
    }
}

fn component(args: &[Value], get: fn(&DateTime<Utc>) -> u32) -> FnResult {
    let date = date_arg(args, 0)?;
    Ok(Value::Number(f64::from(get(&date))))
}

pub fn fn_year(args: &[Value]) -> FnResult {
    let date = date_arg(args, 0)?;
    Ok(Value::Number(f64::from(date.year())))
}

pub fn fn_month(args: &[Value]) -> FnResult {
    component(args, |d| d.month())
}

pub fn fn_day(args: &[Value]) -> FnResult {
    component(args, |d| d.day())
}

pub fn fn_hour(args: &[Value]) -> FnResult {
    component(args, |d| d.hour())
}

pub fn fn_minute(args: &[Value]) -> FnResult {
    component(args, |d| d.minute())
}

pub fn fn_second(args: &[Value]) -> FnResult {
    component(args, |d| d.second())
}

/// WEEKDAY: 0 for Sunday through 6 for Saturday.
pub fn fn_weekday(args: &[Value]) -> FnResult {
    component(args, |d| d.weekday().num_days_from_sunday())
}

pub fn fn_isoweeknum(args: &[Value]) -> FnResult {
    component(args, |d| d.iso_week().week())
}

/// DAYS(end, start): whole days between two dates, truncated toward zero.
pub fn fn_days(args: &[Value]) -> FnResult {
    let end = date_arg(args, 0)?;
    let start = date_arg(args, 1)?;
    Ok(Value::Number((end - start).num_days() as f64))
}

/// Whole months from `start` to `end`, truncated toward zero.
fn month_diff(end: DateTime<Utc>, start: DateTime<Utc>) -> i64 {
    let mut months = i64::from(end.year() - start.year()) * 12
        + i64::from(end.month()) - i64::from(start.month());
    let anchor = |m: i64| {
        let shift = Months::new(u32::try_from(m.unsigned_abs()).unwrap_or(u32::MAX));
        if m >= 0 {
            start.checked_add_months(shift)
        } else {
            start.checked_sub_months(shift)
        }
    };
    if months > 0 && anchor(months).is_some_and(|a| a > end) {
        months -= 1;
    } else if months < 0 && anchor(months).is_some_and(|a| a < end) {
        months += 1;
    }
    months
}

/// DATEDIF(end, start, [unit = "d"])
///
/// Units: `y` years, `M` months, `w` weeks, `d` days, `h` hours,
/// `m` minutes, `s` seconds (long forms such as `days` are accepted).
pub fn fn_datedif(args: &[Value]) -> FnResult {
    let end = date_arg(args, 0)?;
    let start = date_arg(args, 1)?;
    let unit = match arg(args, 2) {
        Value::String(unit) if !unit.is_empty() => unit.as_str(),
        _ => "d",
    };
    let span = end - start;
    let diff = match unit {
        "y" | "year" | "years" => month_diff(end, start) / 12,
        "M" | "month" | "months" => month_diff(end, start),
        "w" | "week" | "weeks" => span.num_weeks(),
        "d" | "day" | "days" => span.num_days(),
        "h" | "hour" | "hours" => span.num_hours(),
        "m" | "minute" | "minutes" => span.num_minutes(),
        "s" | "second" | "seconds" => span.num_seconds(),
        other => {
            return Err(FunctionFailure::Invalid(format!("unknown unit '{other}'")));
        }
    };
    Ok(Value::Number(diff as f64))
}

/// DATEDELTA(date, days): date shifted by a (possibly fractional or
/// negative) number of days.
pub fn fn_datedelta(args: &[Value]) -> FnResult {
    let date = date_arg(args, 0)?;
    let days = arg(args, 1).to_number();
    let shift = if days.is_finite() {
        TimeDelta::try_milliseconds((days * MILLIS_PER_DAY).round() as i64)
    } else {
        None
    };
    shift
        .and_then(|delta| date.checked_add_signed(delta))
        .map(Value::Date)
        .ok_or_else(|| FunctionFailure::Invalid("date out of range".into()))
}

/// TIMESTAMP: milliseconds since the Unix epoch.
pub fn fn_timestamp(args: &[Value]) -> FnResult {
    let date = date_arg(args, 0)?;
    Ok(Value::Number(date.timestamp_millis() as f64))
}

pub fn builtins() -> Vec<Builtin> {
    let part = |name: &'static str, f: EvalFn| {
        Builtin::new(name, Signature::returning(Number).exactly(1).uniform(DATE_LIKE), f)
    };

    vec![
        Builtin::new(
            "DATE",
            Signature::returning(Date).min(0).optional(6).uniform(DATE_LIKE),
            fn_date,
        ),
        part("YEAR", fn_year),
        part("MONTH", fn_month),
        part("DAY", fn_day),
        part("HOUR", fn_hour),
        part("MINUTE", fn_minute),
        part("SECOND", fn_second),
        Builtin::new(
            "DAYS",
            Signature::returning(Number).exactly(2).uniform(DATE_LIKE),
            fn_days,
        ),
        Builtin::new(
            "DATEDIF",
            Signature::returning(Number)
                .min(2)
                .optional(1)
                .params(ParamTypes::Positional {
                    leading: vec![Accepts::one_of(DATE_LIKE), Accepts::one_of(DATE_LIKE)],
                    rest: Accepts::one_of(&[Str]),
                }),
            fn_datedif,
        ),
        Builtin::new(
            "DATEDELTA",
            Signature::returning(Date)
                .exactly(2)
                .params(ParamTypes::Positional {
                    leading: vec![Accepts::one_of(DATE_LIKE)],
                    rest: Accepts::one_of(&[Number, Str]),
                }),
            fn_datedelta,
        ),
        Builtin::new(
            "TIMESTAMP",
            Signature::returning(Number).exactly(1).uniform(&[Date]),
            fn_timestamp,
        ),
        part("WEEKDAY", fn_weekday),
        part("ISOWEEKNUM", fn_isoweeknum),
    ]
}
