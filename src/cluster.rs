//! Robust estimate of a fleet's geographic center.
//!
//! Most vehicles of a feed cluster around one operating area; a handful of
//! stray GPS reports should not drag the estimate toward them. The filter
//! is a fixed-threshold heuristic, not a converging estimator: positions
//! further than a cutoff from the plain mean are dropped, and the cutoff
//! widens geometrically while too few positions survive.

use crate::model::Entity;

const EARTH_RADIUS_KM: f64 = 6371.0;
const INITIAL_CUTOFF_KM: f64 = 50.0;
const CUTOFF_GROWTH: f64 = 1.5;
const CUTOFF_CEILING_KM: f64 = 200.0;
const RETENTION_FLOOR: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

/// Vehicle positions with finite coordinates, in feed order.
pub fn extract_positions(entities: &[Entity]) -> Vec<LatLon> {
    entities
        .iter()
        .filter_map(|entity| entity.vehicle.as_ref()?.position.as_ref())
        .filter(|position| position.latitude.is_finite() && position.longitude.is_finite())
        .map(|position| LatLon {
            lat: position.latitude,
            lon: position.longitude,
        })
        .collect()
}

/// Great-circle distance in kilometers.
pub fn haversine_km(a: LatLon, b: LatLon) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Center of the dominant position cluster, or `None` for empty input.
///
/// Callers must treat `None` as "no estimate", never as a zero coordinate.
pub fn robust_center(positions: &[LatLon]) -> Option<LatLon> {
    if positions.is_empty() {
        return None;
    }
    simple_average(&filter_clustered(positions, INITIAL_CUTOFF_KM))
}

fn simple_average(positions: &[LatLon]) -> Option<LatLon> {
    if positions.is_empty() {
        return None;
    }
    let (lat, lon) = positions
        .iter()
        .fold((0.0, 0.0), |(lat, lon), p| (lat + p.lat, lon + p.lon));
    let n = positions.len() as f64;
    Some(LatLon {
        lat: lat / n,
        lon: lon / n,
    })
}

fn filter_clustered(positions: &[LatLon], cutoff_km: f64) -> Vec<LatLon> {
    if positions.len() <= 1 {
        return positions.to_vec();
    }
    let Some(center) = simple_average(positions) else {
        return positions.to_vec();
    };

    let filtered: Vec<LatLon> = positions
        .iter()
        .copied()
        .filter(|p| haversine_km(*p, center) <= cutoff_km)
        .collect();

    if (filtered.len() as f64) < positions.len() as f64 * RETENTION_FLOOR
        && cutoff_km < CUTOFF_CEILING_KM
    {
        return filter_clustered(positions, cutoff_km * CUTOFF_GROWTH);
    }

    if filtered.is_empty() {
        positions.to_vec()
    } else {
        filtered
    }
}
