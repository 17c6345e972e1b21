//! Display helpers for timestamps and readings.
//!
//! All timestamps are Unix seconds; the timezone is the UTC offset in seconds
//! as reported by the API (`timezone` fields).

use chrono::{DateTime, Datelike, FixedOffset, NaiveDateTime, Timelike, Utc};

pub const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

pub const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Label and advice for an air quality index value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AqiText {
    pub level: &'static str,
    pub message: &'static str,
}

const AQI_TEXT: [AqiText; 5] = [
    AqiText {
        level: "Good",
        message: "Air quality is considered satisfactory, and air pollution poses little or no risk",
    },
    AqiText {
        level: "Fair",
        message: "Air quality is acceptable; however, for some pollutants there may be a moderate health concern for a very small number of people who are unusually sensitive to air pollution.",
    },
    AqiText {
        level: "Moderate",
        message: "Members of sensitive groups may experience health effects. The general public is not likely to be affected.",
    },
    AqiText {
        level: "Poor",
        message: "Everyone may begin to experience health effects; members of sensitive groups may experience more serious health effects",
    },
    AqiText {
        level: "Very Poor",
        message: "Health warnings of emergency conditions. The entire population is more likely to be affected.",
    },
];

/// AQI is 1 (good) to 5 (very poor). Anything else has no label.
pub fn aqi_text(aqi: u8) -> Option<AqiText> {
    match aqi {
        1..=5 => Some(AQI_TEXT[usize::from(aqi) - 1]),
        _ => None,
    }
}

/// `"Sunday 5, Jan"` in the location's local time.
pub fn date(unix: i64, timezone: i32) -> Option<String> {
    let local = local_time(unix, timezone)?;
    Some(format!(
        "{} {}, {}",
        weekday_name(&local),
        local.day(),
        month_name(&local)
    ))
}

/// `"6:05 AM"` in the location's local time.
pub fn time(unix: i64, timezone: i32) -> Option<String> {
    let local = local_time(unix, timezone)?;
    let (pm, hour) = local.hour12();
    Some(format!(
        "{hour}:{:02} {}",
        local.minute(),
        if pm { "PM" } else { "AM" }
    ))
}

/// `"6 AM"` in the location's local time.
pub fn hours(unix: i64, timezone: i32) -> Option<String> {
    let local = local_time(unix, timezone)?;
    let (pm, hour) = local.hour12();
    Some(format!("{hour} {}", if pm { "PM" } else { "AM" }))
}

/// Forecast day label from a `dt_txt` string: `("5 Jan", "Friday")`.
pub fn forecast_day(dt_txt: &str) -> Option<(String, &'static str)> {
    let parsed = NaiveDateTime::parse_from_str(dt_txt, "%Y-%m-%d %H:%M:%S").ok()?;
    Some((
        format!("{} {}", parsed.day(), month_name(&parsed)),
        weekday_name(&parsed),
    ))
}

/// Whole km/h, truncated.
pub fn mps_to_kmh(mps: f64) -> i64 {
    (mps * 3.6) as i64
}

/// Whole degrees, truncated toward zero.
pub fn whole(value: f64) -> i64 {
    value as i64
}

/// Meters to kilometers, without trailing zeros.
pub fn visibility_km(meters: u32) -> String {
    let km = f64::from(meters) / 1000.0;
    format!("{km}")
}

/// Significant-digit formatting for pollutant readings.
pub fn precision(value: f64, digits: usize) -> String {
    if value == 0.0 || !value.is_finite() {
        return format!("{value}");
    }
    let decimals = |v: f64| (digits as i32 - 1 - v.abs().log10().floor() as i32).max(0) as usize;

    let factor = 10f64.powi(decimals(value) as i32);
    let rounded = (value * factor).round() / factor;
    // 9.96 rounds to 10 and loses a decimal place.
    let places = decimals(rounded);
    format!("{rounded:.places$}")
}

fn local_time(unix: i64, timezone: i32) -> Option<DateTime<FixedOffset>> {
    let offset = FixedOffset::east_opt(timezone)?;
    DateTime::<Utc>::from_timestamp(unix, 0).map(|utc| utc.with_timezone(&offset))
}

fn weekday_name(d: &impl Datelike) -> &'static str {
    WEEKDAY_NAMES[d.weekday().num_days_from_sunday() as usize]
}

fn month_name(d: &impl Datelike) -> &'static str {
    MONTH_NAMES[d.month0() as usize]
}
