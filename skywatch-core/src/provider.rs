use crate::{
    error::FetchError,
    model::{Coordinates, PlaceInfo, UnitSystem, WeatherSnapshot},
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod geocode;
pub mod openweather;

/// Source of current weather observations for a pair of coordinates.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current_conditions(
        &self,
        coordinates: Coordinates,
        units: UnitSystem,
    ) -> Result<WeatherSnapshot, FetchError>;
}

/// Source of human-readable place names for a pair of coordinates.
#[async_trait]
pub trait PlaceProvider: Send + Sync + Debug {
    async fn resolve_place(&self, coordinates: Coordinates) -> Result<PlaceInfo, FetchError>;
}

/// Trim an error body down to something loggable. The cut backs off to
/// a char boundary so multibyte text cannot split the slice.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut cut = MAX;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}...", &body[..cut])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_body_keeps_short_bodies_untouched() {
        assert_eq!(truncate_body("bad gateway"), "bad gateway");
    }

    #[test]
    fn truncate_body_cuts_long_bodies() {
        let cut = truncate_body(&"x".repeat(300));
        assert_eq!(cut, format!("{}...", "x".repeat(200)));
    }

    #[test]
    fn truncate_body_backs_off_a_split_multibyte_char() {
        // Two-byte char straddling the 200-byte cut.
        let body = format!("{}é{}", "x".repeat(199), "y".repeat(100));
        assert_eq!(truncate_body(&body), format!("{}...", "x".repeat(199)));
    }
}
