use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;

use crate::core::Route;
use crate::error::{TrackerError, TrackerResult};

/// Date-range selector options offered by the route picker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RouteKey {
    #[default]
    Today,
    Yesterday,
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
    Custom,
}

impl RouteKey {
    pub const ALL: [RouteKey; 7] = [
        RouteKey::Today,
        RouteKey::Yesterday,
        RouteKey::ThisWeek,
        RouteKey::LastWeek,
        RouteKey::ThisMonth,
        RouteKey::LastMonth,
        RouteKey::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteKey::Today => "today",
            RouteKey::Yesterday => "yesterday",
            RouteKey::ThisWeek => "thisWeek",
            RouteKey::LastWeek => "lastWeek",
            RouteKey::ThisMonth => "thisMonth",
            RouteKey::LastMonth => "lastMonth",
            RouteKey::Custom => "custom",
        }
    }
}

impl FromStr for RouteKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RouteKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown route key: {}", s))
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static mapping from route key to route.
///
/// The default key always resolves, so lookups never fail.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: HashMap<RouteKey, Arc<Route>>,
    default_key: RouteKey,
    default_route: Arc<Route>,
}

impl RouteTable {
    pub fn new(routes: HashMap<RouteKey, Route>, default_key: RouteKey) -> TrackerResult<Self> {
        let routes: HashMap<RouteKey, Arc<Route>> = routes
            .into_iter()
            .map(|(key, route)| (key, Arc::new(route)))
            .collect();

        let default_route = routes
            .get(&default_key)
            .cloned()
            .ok_or_else(|| TrackerError::MissingDefaultRoute(default_key.to_string()))?;

        Ok(Self {
            routes,
            default_key,
            default_route,
        })
    }

    /// Demo routes around central London
    pub fn builtin() -> Self {
        let pairs: [(RouteKey, &[[f64; 2]]); 7] = [
            (
                RouteKey::Today,
                &[[51.505, -0.09], [51.51, -0.1], [51.515, -0.12], [51.52, -0.14]],
            ),
            (
                RouteKey::Yesterday,
                &[[51.500, -0.124], [51.503, -0.119], [51.507, -0.115], [51.511, -0.110], [51.514, -0.104]],
            ),
            (
                RouteKey::ThisWeek,
                &[[51.507, -0.127], [51.509, -0.134], [51.512, -0.141], [51.515, -0.148], [51.518, -0.152], [51.521, -0.157]],
            ),
            (
                RouteKey::LastWeek,
                &[[51.495, -0.100], [51.498, -0.092], [51.502, -0.085], [51.506, -0.079], [51.510, -0.076]],
            ),
            (
                RouteKey::ThisMonth,
                &[[51.530, -0.123], [51.526, -0.118], [51.522, -0.112], [51.518, -0.105], [51.514, -0.098], [51.510, -0.091], [51.506, -0.086]],
            ),
            (
                RouteKey::LastMonth,
                &[[51.482, -0.144], [51.487, -0.137], [51.492, -0.130], [51.497, -0.124]],
            ),
            (
                RouteKey::Custom,
                &[[51.5007, -0.1246], [51.5033, -0.1196], [51.5081, -0.0759]],
            ),
        ];

        let routes = pairs
            .iter()
            .map(|(key, points)| (*key, Route::from_pairs(key.as_str(), points)))
            .map(|(key, route)| (key, Arc::new(route)))
            .collect::<HashMap<_, _>>();
        let default_route = Arc::clone(&routes[&RouteKey::Today]);

        Self {
            routes,
            default_key: RouteKey::Today,
            default_route,
        }
    }

    /// Look up a route by key
    pub fn get(&self, key: RouteKey) -> Arc<Route> {
        match self.routes.get(&key) {
            Some(route) => Arc::clone(route),
            None => {
                warn!("No route for '{}', falling back to '{}'", key, self.default_key);
                Arc::clone(&self.default_route)
            }
        }
    }

    /// Resolve a selector string, falling back to the default route for
    /// unknown keys
    pub fn resolve(&self, selector: &str) -> (RouteKey, Arc<Route>) {
        match selector.parse::<RouteKey>() {
            Ok(key) if self.routes.contains_key(&key) => (key, self.get(key)),
            _ => {
                warn!("Unknown route '{}', falling back to '{}'", selector, self.default_key);
                (self.default_key, Arc::clone(&self.default_route))
            }
        }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Waypoint;

    #[test]
    fn test_builtin_has_all_seven_keys() {
        let table = RouteTable::builtin();
        assert_eq!(table.len(), 7);
        for key in RouteKey::ALL {
            let (resolved, route) = table.resolve(key.as_str());
            assert_eq!(resolved, key);
            assert_eq!(route.name(), key.as_str());
            assert!(!route.is_empty(), "route {} is empty", key);
        }
    }

    #[test]
    fn test_today_route() {
        let table = RouteTable::builtin();
        let route = table.get(RouteKey::Today);
        assert_eq!(route.len(), 4);
        assert_eq!(route.waypoints()[0], Waypoint::new(51.505, -0.09));
        assert_eq!(route.waypoints()[3], Waypoint::new(51.52, -0.14));
    }

    #[test]
    fn test_unknown_key_falls_back_to_default() {
        let table = RouteTable::builtin();
        let (key, route) = table.resolve("nextYear");
        assert_eq!(key, RouteKey::Today);
        assert_eq!(route.name(), "today");
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let table = RouteTable::builtin();
        let (key, route) = table.resolve("LASTWEEK");
        assert_eq!(key, RouteKey::LastWeek);
        assert_eq!(route.name(), "lastWeek");
    }

    #[test]
    fn test_missing_route_in_partial_table_falls_back() {
        let mut routes = HashMap::new();
        routes.insert(RouteKey::Custom, Route::from_pairs("custom", &[[1.0, 2.0]]));
        let table = RouteTable::new(routes, RouteKey::Custom).unwrap();

        assert_eq!(table.get(RouteKey::Today).name(), "custom");
        assert_eq!(table.resolve("today").0, RouteKey::Custom);
    }

    #[test]
    fn test_new_requires_default_route() {
        let result = RouteTable::new(HashMap::new(), RouteKey::Today);
        assert!(matches!(result, Err(TrackerError::MissingDefaultRoute(_))));
    }
}
