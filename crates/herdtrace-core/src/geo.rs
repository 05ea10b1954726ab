//! Great-circle distance and bounding-box helpers for the nearby-vet search.

/// Earth's mean radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Haversine distance between two points, in meters.
pub fn haversine_meters(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Latitude/longitude window guaranteed to contain every point within
/// `radius_meters` of the center. Used as an indexed prefilter; results
/// still need an exact haversine check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

pub fn bounding_box(lat: f64, lng: f64, radius_meters: f64) -> BoundingBox {
    let delta_lat = (radius_meters / EARTH_RADIUS_METERS).to_degrees();
    let min_lat = (lat - delta_lat).max(-90.0);
    let max_lat = (lat + delta_lat).min(90.0);

    // Longitude degrees shrink with latitude; size the window by the
    // latitude in the box closest to a pole so no candidate slips out.
    let widest_lat = if min_lat.abs() > max_lat.abs() {
        min_lat
    } else {
        max_lat
    };
    let cos_lat = widest_lat.to_radians().cos();

    // Near the poles (or when the window would wrap the antimeridian) the
    // prefilter degenerates to all longitudes.
    let delta_lng = if cos_lat <= f64::EPSILON {
        180.0
    } else {
        (delta_lat / cos_lat).min(180.0)
    };

    if lng - delta_lng < -180.0 || lng + delta_lng > 180.0 {
        BoundingBox {
            min_lat,
            max_lat,
            min_lng: -180.0,
            max_lng: 180.0,
        }
    } else {
        BoundingBox {
            min_lat,
            max_lat,
            min_lng: lng - delta_lng,
            max_lng: lng + delta_lng,
        }
    }
}

/// Whether a pair of coordinates is a usable point.
pub fn valid_coordinates(lat: f64, lng: f64) -> bool {
    lat.is_finite() && lng.is_finite() && (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng)
}
