//! Conversions between the raw units OpenWeather reports and the ones
//! shown on screen, plus small text helpers for rendering.

const METERS_PER_MILE: f64 = 1609.34;
const HPA_PER_INHG: f64 = 33.863886666667;
const INCHES_PER_MM: f64 = 0.0393701;

pub fn meters_to_miles(meters: u32) -> f64 {
    f64::from(meters) / METERS_PER_MILE
}

pub fn hpa_to_inhg(hpa: u32) -> f64 {
    f64::from(hpa) / HPA_PER_INHG
}

pub fn mm_to_inches(mm: f64) -> f64 {
    mm * INCHES_PER_MM
}

/// Round to two decimal places, halves away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Uppercase the first letter of each word. OpenWeather descriptions
/// arrive all lowercase ("clear sky", "light intensity drizzle").
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Nearest of the eight principal compass points for a wind bearing.
pub fn compass_point(degrees: u16) -> &'static str {
    const POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
    let normalized = f64::from(degrees % 360);
    let index = (normalized / 45.0).round() as usize % POINTS.len();
    POINTS[index]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_miles_of_visibility() {
        // 16093 m is the API's cap for clear conditions.
        assert_eq!(format!("{:.2}", meters_to_miles(16093)), "10.00");
    }

    #[test]
    fn standard_pressure_in_inhg() {
        assert!((hpa_to_inhg(1013) - 29.92).abs() < 0.01);
    }

    #[test]
    fn an_inch_of_rain() {
        assert!((mm_to_inches(25.4) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn round2_goes_half_up() {
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(1.994), 1.99);
        assert_eq!(round2(10.0002), 10.0);
    }

    #[test]
    fn title_cases_each_word() {
        assert_eq!(title_case("clear sky"), "Clear Sky");
        assert_eq!(
            title_case("light intensity drizzle rain"),
            "Light Intensity Drizzle Rain"
        );
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn compass_points_cover_the_rose() {
        assert_eq!(compass_point(0), "N");
        assert_eq!(compass_point(45), "NE");
        assert_eq!(compass_point(90), "E");
        assert_eq!(compass_point(180), "S");
        assert_eq!(compass_point(270), "W");
        assert_eq!(compass_point(321), "NW");
        assert_eq!(compass_point(350), "N");
        assert_eq!(compass_point(360), "N");
    }
}
