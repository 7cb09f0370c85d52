//! Terminal rendering of condition reports, one block per refresh.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use skywatch_core::units::{
    compass_point, hpa_to_inhg, meters_to_miles, mm_to_inches, round2, title_case,
};
use skywatch_core::{
    ConditionsReport, CycleState, PlaceInfo, Precipitation, Presenter, UnitSystem, WeatherSnapshot,
    Wind,
};
use std::fmt::Write as _;

pub struct ConsolePresenter {
    units: UnitSystem,
}

impl ConsolePresenter {
    pub fn new(units: UnitSystem) -> Self {
        Self { units }
    }
}

impl Presenter for ConsolePresenter {
    fn show_conditions(&self, report: &ConditionsReport) {
        print!("{}", render_report(report, self.units));
    }

    fn show_failure(&self, state: &CycleState) {
        println!("{}", status_line(state));
    }
}

fn render_report(report: &ConditionsReport, units: UnitSystem) -> String {
    let weather = &report.weather;
    let mut out = String::new();

    let _ = writeln!(out, "{}", place_line(&report.place));
    let _ = writeln!(
        out,
        "{} {:.1}{}",
        icon_glyph(&weather.icon),
        weather.temperature,
        temp_unit(units)
    );
    let _ = writeln!(
        out,
        "{}  H: {:.1}°  L: {:.1}°",
        title_case(&weather.description),
        weather.temp_max,
        weather.temp_min
    );
    let _ = writeln!(out, "{}", sun_line(weather));
    let _ = writeln!(out, "{}", wind_line(&weather.wind, units));
    let _ = writeln!(out, "{}", precipitation_line(weather, units));
    let _ = writeln!(out, "{}", details_line(weather, units));
    let _ = writeln!(out, "Updated just now");

    out
}

fn place_line(place: &PlaceInfo) -> String {
    match &place.region {
        Some(region) => format!("{}, {}", place.name, region),
        None => format!("{}, {}", place.name, place.country),
    }
}

fn sun_line(weather: &WeatherSnapshot) -> String {
    format!(
        "Sunrise {}  Sunset {}",
        local_clock(weather.sunrise, weather.timezone_offset),
        local_clock(weather.sunset, weather.timezone_offset)
    )
}

/// Clock time at the station, using the UTC offset the API reported.
fn local_clock(epoch_secs: i64, offset_secs: i32) -> String {
    let offset = FixedOffset::east_opt(offset_secs).unwrap_or_else(|| Utc.fix());
    match DateTime::from_timestamp(epoch_secs, 0) {
        Some(instant) => instant
            .with_timezone(&offset)
            .format("%-I:%M %p")
            .to_string(),
        None => "--:--".to_string(),
    }
}

fn wind_line(wind: &Wind, units: UnitSystem) -> String {
    let unit = speed_unit(units);
    let mut line = format!(
        "Wind {:.1} {} {} ({}°)",
        wind.speed,
        unit,
        compass_point(wind.direction_deg),
        wind.direction_deg
    );
    if let Some(gust) = wind.gust {
        let _ = write!(line, ", gusts {gust:.1} {unit}");
    }
    line
}

fn precipitation_line(weather: &WeatherSnapshot, units: UnitSystem) -> String {
    match weather.precipitation {
        Some(Precipitation::Rain(mm)) => format!("Rain {} (last hour)", precip_amount(mm, units)),
        Some(Precipitation::Snow(mm)) => format!("Snow {} (last hour)", precip_amount(mm, units)),
        None => format!(
            "Humidity {}%  Cloud cover {}%",
            weather.humidity_pct, weather.clouds_pct
        ),
    }
}

fn precip_amount(mm: f64, units: UnitSystem) -> String {
    match units {
        UnitSystem::Imperial => format!("{:.2} in", round2(mm_to_inches(mm))),
        UnitSystem::Metric => format!("{mm:.1} mm"),
    }
}

fn details_line(weather: &WeatherSnapshot, units: UnitSystem) -> String {
    match units {
        UnitSystem::Imperial => format!(
            "Feels like {:.1}{}  Visibility {:.2} mi  Pressure {:.2} inHg",
            weather.feels_like,
            temp_unit(units),
            meters_to_miles(weather.visibility_m),
            hpa_to_inhg(weather.pressure_hpa)
        ),
        UnitSystem::Metric => format!(
            "Feels like {:.1}{}  Visibility {:.1} km  Pressure {} hPa",
            weather.feels_like,
            temp_unit(units),
            f64::from(weather.visibility_m) / 1000.0,
            weather.pressure_hpa
        ),
    }
}

fn status_line(state: &CycleState) -> String {
    if !state.has_succeeded {
        return "Update failed; no conditions received yet".to_string();
    }

    let n = state.consecutive_failures;
    let unit = if n == 1 { "minute" } else { "minutes" };
    format!("Update failed; showing conditions from {n} {unit} ago")
}

fn temp_unit(units: UnitSystem) -> &'static str {
    match units {
        UnitSystem::Imperial => "°F",
        UnitSystem::Metric => "°C",
    }
}

fn speed_unit(units: UnitSystem) -> &'static str {
    match units {
        UnitSystem::Imperial => "mph",
        UnitSystem::Metric => "m/s",
    }
}

fn icon_glyph(icon: &str) -> &'static str {
    let condition = icon.get(..2).unwrap_or("01");
    let night = icon.ends_with('n');

    match condition {
        "01" | "02" if night => "🌙",
        "01" => "☀",
        "02" => "🌤",
        "03" => "🌥",
        "04" => "☁",
        "09" => "🌧",
        "10" => "🌦",
        "11" => "⛈",
        "13" => "🌨",
        "50" => "🌫",
        _ => "☁",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skywatch_core::Coordinates;

    fn sample_place() -> PlaceInfo {
        PlaceInfo {
            name: "Los Angeles".into(),
            region: Some("California".into()),
            country: "US".into(),
        }
    }

    fn sample_snapshot() -> WeatherSnapshot {
        WeatherSnapshot {
            description: "clear sky".into(),
            icon: "01d".into(),
            temperature: 72.4,
            feels_like: 70.1,
            temp_min: 68.0,
            temp_max: 75.2,
            pressure_hpa: 1013,
            humidity_pct: 64,
            clouds_pct: 40,
            visibility_m: 16093,
            wind: Wind {
                speed: 5.8,
                direction_deg: 321,
                gust: Some(9.2),
            },
            precipitation: None,
            sunrise: 1716984000,
            sunset: 1717034000,
            timezone_offset: -25200,
            observed_at: Utc::now(),
        }
    }

    fn sample_report() -> ConditionsReport {
        ConditionsReport {
            coordinates: Coordinates {
                latitude: 34.0,
                longitude: -118.0,
            },
            weather: sample_snapshot(),
            place: sample_place(),
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn renders_an_imperial_report_line_by_line() {
        let rendered = render_report(&sample_report(), UnitSystem::Imperial);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines[0], "Los Angeles, California");
        assert_eq!(lines[1], "☀ 72.4°F");
        assert_eq!(lines[2], "Clear Sky  H: 75.2°  L: 68.0°");
        assert_eq!(lines[3], "Sunrise 5:00 AM  Sunset 6:53 PM");
        assert_eq!(lines[4], "Wind 5.8 mph NW (321°), gusts 9.2 mph");
        assert_eq!(lines[5], "Humidity 64%  Cloud cover 40%");
        assert_eq!(
            lines[6],
            "Feels like 70.1°F  Visibility 10.00 mi  Pressure 29.91 inHg"
        );
        assert_eq!(lines[7], "Updated just now");
    }

    #[test]
    fn renders_metric_units_without_conversions() {
        let rendered = render_report(&sample_report(), UnitSystem::Metric);

        assert!(rendered.contains("72.4°C"));
        assert!(rendered.contains("Wind 5.8 m/s"));
        assert!(rendered.contains("Visibility 16.1 km"));
        assert!(rendered.contains("Pressure 1013 hPa"));
    }

    #[test]
    fn rain_is_rendered_in_inches_for_imperial() {
        let mut report = sample_report();
        report.weather.precipitation = Some(Precipitation::Rain(3.175));

        let rendered = render_report(&report, UnitSystem::Imperial);
        assert!(rendered.contains("Rain 0.13 in (last hour)"));
    }

    #[test]
    fn snow_is_rendered_in_millimetres_for_metric() {
        let mut report = sample_report();
        report.weather.precipitation = Some(Precipitation::Snow(2.1));

        let rendered = render_report(&report, UnitSystem::Metric);
        assert!(rendered.contains("Snow 2.1 mm (last hour)"));
    }

    #[test]
    fn place_without_a_region_falls_back_to_country() {
        let place = PlaceInfo {
            name: "Monaco".into(),
            region: None,
            country: "MC".into(),
        };

        assert_eq!(place_line(&place), "Monaco, MC");
    }

    #[test]
    fn clock_times_respect_the_station_offset() {
        assert_eq!(local_clock(21600, 0), "6:00 AM");
        assert_eq!(local_clock(64800, 0), "6:00 PM");
        assert_eq!(local_clock(21600, 3600), "7:00 AM");
    }

    #[test]
    fn status_lines_track_the_failure_count() {
        let fresh = CycleState::default();
        assert_eq!(status_line(&fresh), "Update failed; no conditions received yet");

        let one = CycleState {
            consecutive_failures: 1,
            has_succeeded: true,
        };
        assert_eq!(
            status_line(&one),
            "Update failed; showing conditions from 1 minute ago"
        );

        let three = CycleState {
            consecutive_failures: 3,
            has_succeeded: true,
        };
        assert_eq!(
            status_line(&three),
            "Update failed; showing conditions from 3 minutes ago"
        );
    }

    #[test]
    fn icons_map_to_glyphs() {
        assert_eq!(icon_glyph("01d"), "☀");
        assert_eq!(icon_glyph("01n"), "🌙");
        assert_eq!(icon_glyph("10d"), "🌦");
        assert_eq!(icon_glyph("13n"), "🌨");
        assert_eq!(icon_glyph("99z"), "☁");
    }
}
