use std::collections::{HashMap, HashSet};

use crate::core::{Route, Waypoint};
use crate::error::{TrackerError, TrackerResult};
use crate::routes::RouteKey;

/// Parse routes from CSV rows of `route,lat,lon`
///
/// Supports flexible column names:
/// - route / key / range
/// - lat / latitude
/// - lon / lng / longitude
///
/// Route names are matched case-insensitively and rows keep their file
/// order within each route.
pub fn parse_csv_routes(data: &[u8]) -> TrackerResult<HashMap<RouteKey, Route>> {
    let mut rdr = csv::Reader::from_reader(data);

    let headers = rdr.headers()?;
    let (route_idx, lat_idx, lon_idx) = detect_columns(headers)?;

    let mut grouped: HashMap<RouteKey, Vec<Waypoint>> = HashMap::new();
    let mut unknown = HashSet::new();

    for result in rdr.records() {
        let record = result?;

        let name = record.get(route_idx).unwrap_or("").trim();
        let latitude = parse_coordinate(record.get(lat_idx));
        let longitude = parse_coordinate(record.get(lon_idx));
        let waypoint = Waypoint::try_new(latitude, longitude)?;

        if let Some(key) = super::parse_route_key(name, &mut unknown) {
            grouped.entry(key).or_default().push(waypoint);
        }
    }

    Ok(super::build_routes(grouped))
}

fn parse_coordinate(field: Option<&str>) -> f64 {
    field
        .and_then(|s| s.trim().parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

/// Detect column indices from CSV headers
fn detect_columns(headers: &csv::StringRecord) -> TrackerResult<(usize, usize, usize)> {
    let route_idx = find_column(headers, &["route", "key", "range"])?;
    let lat_idx = find_column(headers, &["lat", "latitude"])?;
    let lon_idx = find_column(headers, &["lon", "lng", "longitude"])?;

    Ok((route_idx, lat_idx, lon_idx))
}

/// Find a column by checking possible names
fn find_column(headers: &csv::StringRecord, names: &[&str]) -> TrackerResult<usize> {
    headers
        .iter()
        .position(|header| {
            let header_lower = header.trim().to_lowercase();
            names.iter().any(|&name| header_lower == name)
        })
        .ok_or(TrackerError::UnknownFormat)
}
