//! Plain-text master and detail views.

use std::fmt::Write as _;

use chrono::{DateTime, FixedOffset, Utc};
use weather_core::{FetchResult, LocationWeatherRecord};

pub fn render_state(state: &FetchResult) -> String {
    match state {
        FetchResult::Loading => "Loading weather data...".to_string(),
        FetchResult::Error(message) => message.clone(),
        FetchResult::Ready(records) => render_list(records),
    }
}

pub fn render_list(records: &[LocationWeatherRecord]) -> String {
    let mut out = String::new();
    for (index, record) in records.iter().enumerate() {
        let _ = writeln!(out, "{index:>2}  {}", summary(record));
    }
    out
}

pub fn render_details(record: &LocationWeatherRecord) -> String {
    let mut out = summary(record);
    out.push('\n');

    let main = &record.main;
    let rows = [
        ("Humidity", format!("{}%", main.humidity)),
        ("Pressure", format!("{} hPa", main.pressure)),
        ("Wind Speed", format!("{} mps", record.wind.speed)),
        ("Cloud Cover", format!("{}%", record.clouds.all)),
        ("Feels Like", format!("{:.1} °C", main.feels_like)),
        ("Min / Max", format!("{:.1} / {:.1} °C", main.temp_min, main.temp_max)),
        ("Visibility", format!("{} m", record.visibility)),
        ("Observed", local_time(record.observed_at(), record.sys.timezone)),
        ("Sunrise", local_time(record.sunrise_at(), record.sys.timezone)),
        ("Sunset", local_time(record.sunset_at(), record.sys.timezone)),
    ];

    for (name, value) in rows {
        let _ = writeln!(out, "  {name:<12} {value}");
    }
    out
}

/// Pick a record by list index, location id or case-insensitive name.
pub fn select<'a>(
    records: &'a [LocationWeatherRecord],
    selector: &str,
) -> Option<&'a LocationWeatherRecord> {
    let selector = selector.trim();

    if let Ok(n) = selector.parse::<u64>() {
        if let Some(record) = usize::try_from(n).ok().and_then(|i| records.get(i)) {
            return Some(record);
        }
        return records.iter().find(|r| r.id == n);
    }

    records
        .iter()
        .find(|r| r.name.eq_ignore_ascii_case(selector))
}

fn summary(record: &LocationWeatherRecord) -> String {
    let (condition, icon) = record
        .primary_condition()
        .map(|c| (c.main.clone(), c.icon_url()))
        .unwrap_or_else(|| ("Unknown".to_string(), String::new()));

    format!(
        "{:<20} {:<12} {:>6.1} °C  {}",
        record.name, condition, record.main.temp, icon
    )
    .trim_end()
    .to_string()
}

fn local_time(at: Option<DateTime<Utc>>, offset_secs: i32) -> String {
    let Some(at) = at else {
        return "-".to_string();
    };

    match FixedOffset::east_opt(offset_secs) {
        Some(offset) => at.with_timezone(&offset).format("%H:%M (UTC%:z)").to_string(),
        None => at.format("%H:%M UTC").to_string(),
    }
}
