// src/utils/proximity.rs - Local-area classification for trial sites
use crate::utils::constants::{
    EARTH_RADIUS_MILES, MAX_LOCAL_DISTANCE_MILES, REFERENCE_LATITUDE, REFERENCE_LONGITUDE,
};

/// Great-circle distance between two points, in miles.
pub fn haversine_miles(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_MILES * a.sqrt().asin()
}

/// A site is local when it is in California, United States, and its geo point
/// lies within 150 miles of Diamond Bar, CA. Sites without a geo point are
/// never local.
pub fn is_local_site(
    country: &str,
    state: &str,
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> bool {
    let country = country.to_lowercase();
    if !country.contains("united states") && !country.contains("usa") {
        return false;
    }
    let state = state.to_lowercase();
    if !state.contains("california") && state != "ca" {
        return false;
    }
    match (latitude, longitude) {
        (Some(lat), Some(lon)) => {
            haversine_miles(REFERENCE_LATITUDE, REFERENCE_LONGITUDE, lat, lon)
                <= MAX_LOCAL_DISTANCE_MILES
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // UCLA, Westwood.
    const UCLA: (f64, f64) = (34.0689, -118.4452);
    // UCSF, San Francisco.
    const UCSF: (f64, f64) = (37.7631, -122.4586);

    #[test]
    fn nearby_california_site_is_local() {
        assert!(is_local_site(
            "United States",
            "California",
            Some(UCLA.0),
            Some(UCLA.1)
        ));
    }

    #[test]
    fn distant_california_site_is_not_local() {
        assert!(!is_local_site(
            "United States",
            "California",
            Some(UCSF.0),
            Some(UCSF.1)
        ));
    }

    #[test]
    fn wrong_state_or_country_is_not_local() {
        assert!(!is_local_site("United States", "New York", Some(UCLA.0), Some(UCLA.1)));
        assert!(!is_local_site("China", "California", Some(UCLA.0), Some(UCLA.1)));
    }

    #[test]
    fn missing_geo_point_is_not_local() {
        assert!(!is_local_site("United States", "CA", None, None));
    }

    #[test]
    fn haversine_sanity() {
        let d = haversine_miles(REFERENCE_LATITUDE, REFERENCE_LONGITUDE, UCLA.0, UCLA.1);
        assert!(d > 20.0 && d < 50.0, "unexpected distance {d}");
    }
}
