// src/utils/constants.rs

/// Minimum sequence-similarity ratio for two no-keyword names to merge.
pub const SIMILARITY_THRESHOLD: f64 = 0.85;

/// Relaxed ratio applied when one name is a substring of the other; the raw
/// ratio is depressed by the length difference on truncated variants.
pub const SUBSTRING_SIMILARITY_THRESHOLD: f64 = 0.75;

/// Reference point for the patient's local area: Diamond Bar, CA (91765).
pub const REFERENCE_LATITUDE: f64 = 33.9989;
pub const REFERENCE_LONGITUDE: f64 = -117.8103;

/// A site within this many miles of the reference point counts as local.
pub const MAX_LOCAL_DISTANCE_MILES: f64 = 150.0;

/// Earth radius in miles, for haversine distances.
pub const EARTH_RADIUS_MILES: f64 = 3959.0;
