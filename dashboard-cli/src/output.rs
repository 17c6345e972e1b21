use dashboard_core::{Dashboard, LocationCandidate, Units, format};

pub fn print_candidates(results: &[LocationCandidate]) {
    print!("{}", candidates_text(results));
}

pub fn print_dashboard(dashboard: &Dashboard, units: Units) {
    print!("{}", dashboard_text(dashboard, units));
}

fn candidates_text(results: &[LocationCandidate]) -> String {
    if results.is_empty() {
        return "  (no matches)\n".to_string();
    }

    results
        .iter()
        .enumerate()
        .map(|(i, c)| format!("  #{} {} ({}) [{:.4}, {:.4}]\n", i + 1, c.name, c.subtitle(), c.lat, c.lon))
        .collect()
}

fn dashboard_text(dashboard: &Dashboard, units: Units) -> String {
    let degree = format!("°{}", units.temperature_suffix().to_uppercase());
    let mut out = String::new();

    out.push_str(&dashboard.location_label());
    if let Ok(current) = &dashboard.current {
        if let Some(date) = format::date(current.dt, current.timezone) {
            out.push_str(&format!(" - {date}"));
        }
        out.push('\n');

        let condition = current
            .condition()
            .map(|c| c.description.as_str())
            .unwrap_or("Unknown");
        out.push_str(&format!(
            "Now: {}{degree}, {condition}\n",
            format::whole(current.main.temp)
        ));
        out.push_str(&format!(
            "Feels like {}{degree}, humidity {}%, pressure {} hPa",
            format::whole(current.main.feels_like),
            current.main.humidity,
            current.main.pressure,
        ));
        if let Some(meters) = current.visibility {
            out.push_str(&format!(", visibility {} km", format::visibility_km(meters)));
        }
        out.push('\n');

        if let (Some(rise), Some(set)) = (
            format::time(current.sys.sunrise, current.timezone),
            format::time(current.sys.sunset, current.timezone),
        ) {
            out.push_str(&format!("Sunrise {rise}, sunset {set}\n"));
        }
    } else {
        out.push('\n');
    }

    if let Some(entry) = dashboard.pollution.as_ref().ok().and_then(|p| p.current()) {
        let level = format::aqi_text(entry.main.aqi).map_or("Unknown", |t| t.level);
        out.push_str(&format!("Air quality: {level} ({})\n", entry.main.aqi));
    }

    if let Ok(forecast) = &dashboard.forecast {
        let tz = forecast.city.timezone;
        let hours: Vec<String> = forecast
            .hourly()
            .map(|e| {
                format!(
                    "{} {}°",
                    format::hours(e.dt, tz).unwrap_or_default(),
                    format::whole(e.main.temp)
                )
            })
            .collect();
        out.push_str(&format!("Next hours: {}\n", hours.join(" | ")));

        let days: Vec<String> = forecast
            .daily()
            .filter_map(|e| {
                let (date, weekday) = e.dt_txt.as_deref().and_then(format::forecast_day)?;
                Some(format!("{weekday} {date} {}°", format::whole(e.main.temp_max)))
            })
            .collect();
        if !days.is_empty() {
            out.push_str(&format!("5 days: {}\n", days.join(" | ")));
        }
    }

    for (stage, err) in dashboard.failures() {
        out.push_str(&format!("({stage} unavailable: {})\n", err.user_message()));
    }

    out
}
