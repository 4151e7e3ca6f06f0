pub mod csv;
pub mod json;

pub use self::csv::parse_csv_routes;
pub use self::json::parse_json_routes;

use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{info, warn};

use crate::core::{Route, Waypoint};
use crate::error::TrackerError;
use crate::routes::{RouteKey, RouteTable};

/// Route file format detection result
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RouteFormat {
    Json,
    Csv,
    Unknown,
}

/// Detect the format of a route file from its leading content
pub fn detect_format(data: &[u8]) -> RouteFormat {
    if is_json(data) {
        return RouteFormat::Json;
    }

    if is_csv(data) {
        return RouteFormat::Csv;
    }

    RouteFormat::Unknown
}

fn is_json(data: &[u8]) -> bool {
    data.iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|&b| b == b'{')
}

fn is_csv(data: &[u8]) -> bool {
    let sample = std::str::from_utf8(&data[..data.len().min(500)]);
    match sample {
        // header plus at least route,lat,lon
        Ok(text) => text
            .lines()
            .next()
            .is_some_and(|line| line.chars().filter(|&c| c == ',').count() >= 2),
        Err(_) => false,
    }
}

/// Load a route table from a JSON or CSV file
pub fn load_routes<P: AsRef<Path>>(path: P, default_key: RouteKey) -> Result<RouteTable> {
    let path = path.as_ref();
    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read route file: {:?}", path))?;

    let routes = match detect_format(&data) {
        RouteFormat::Json => parse_json_routes(&data),
        RouteFormat::Csv => parse_csv_routes(&data),
        RouteFormat::Unknown => Err(TrackerError::UnknownFormat),
    }
    .with_context(|| format!("Failed to parse route file: {:?}", path))?;

    info!("Loaded {} routes from {:?}", routes.len(), path);

    let table = RouteTable::new(routes, default_key)?;
    Ok(table)
}

/// Parse a route name from a file. Unknown names are skipped with one
/// warning each.
fn parse_route_key(name: &str, unknown: &mut HashSet<String>) -> Option<RouteKey> {
    match name.parse::<RouteKey>() {
        Ok(key) => Some(key),
        Err(e) => {
            if unknown.insert(name.to_string()) {
                warn!("Skipping route: {}", e);
            }
            None
        }
    }
}

/// Turn point lists grouped by key into routes named by their key
fn build_routes(grouped: HashMap<RouteKey, Vec<Waypoint>>) -> HashMap<RouteKey, Route> {
    grouped
        .into_iter()
        .map(|(key, waypoints)| (key, Route::new(key.as_str(), waypoints)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format(b"  {\"today\": []}"), RouteFormat::Json);
        assert_eq!(detect_format(b"route,lat,lon\ntoday,1,2\n"), RouteFormat::Csv);
        assert_eq!(detect_format(b"just some text"), RouteFormat::Unknown);
    }

    #[test]
    fn test_load_routes_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"today": [[51.5, -0.1], [51.6, -0.2]], "custom": [[1.0, 2.0]]}}"#).unwrap();

        let table = load_routes(file.path(), RouteKey::Today).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(RouteKey::Today).len(), 2);
        // missing key falls back to today
        assert_eq!(table.get(RouteKey::LastMonth).name(), "today");
    }

    #[test]
    fn test_load_routes_without_default_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "route,lat,lon\ncustom,1.0,2.0\n").unwrap();

        assert!(load_routes(file.path(), RouteKey::Today).is_err());
        assert!(load_routes(file.path(), RouteKey::Custom).is_ok());
    }

    #[test]
    fn test_load_routes_unknown_format() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "nothing useful").unwrap();

        assert!(load_routes(file.path(), RouteKey::Today).is_err());
    }
}
