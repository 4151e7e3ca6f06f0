use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::warn;

use crate::core::{Route, Waypoint};
use crate::error::TrackerResult;
use crate::routes::RouteKey;

/// Parse routes from a JSON object of `key -> [[lat, lon], ...]`
///
/// Keys are matched case-insensitively. Keys naming the same route are
/// concatenated in sorted key order.
pub fn parse_json_routes(data: &[u8]) -> TrackerResult<HashMap<RouteKey, Route>> {
    let raw: BTreeMap<String, Vec<[f64; 2]>> = serde_json::from_slice(data)?;

    let mut grouped: HashMap<RouteKey, Vec<Waypoint>> = HashMap::new();
    let mut unknown = HashSet::new();
    for (name, pairs) in raw {
        let waypoints = pairs
            .into_iter()
            .map(|[lat, lon]| Waypoint::try_new(lat, lon))
            .collect::<TrackerResult<Vec<_>>>()?;

        let Some(key) = super::parse_route_key(&name, &mut unknown) else {
            continue;
        };
        let route = grouped.entry(key).or_default();
        if !route.is_empty() {
            warn!("Route '{}' given more than once, appending '{}'", key, name);
        }
        route.extend(waypoints);
    }

    Ok(super::build_routes(grouped))
}
