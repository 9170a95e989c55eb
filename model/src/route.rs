use serde::{Deserialize, Serialize};

use crate::Polyline;

/// One of the paths offered by a directions service. Index 0 is the preferred one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub index: usize,
    pub polyline: Polyline,
    // As reported by the service, if it did
    pub distance_meters: Option<f64>,
    pub duration_seconds: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteStyle {
    pub color: String,
    pub width: f64,
    pub opacity: f64,
}

impl Route {
    pub fn is_primary(&self) -> bool {
        self.index == 0
    }

    pub fn layer_id(&self) -> String {
        format!("{}{}", ROUTE_LAYER_PREFIX, self.index)
    }

    /// Blue and bold for the primary route, faded grey for alternates
    pub fn style(&self) -> RouteStyle {
        if self.is_primary() {
            RouteStyle {
                color: "#1D4ED8".to_string(),
                width: 5.0,
                opacity: 1.0,
            }
        } else {
            RouteStyle {
                color: "#9CA3AF".to_string(),
                width: 3.0,
                opacity: 0.6,
            }
        }
    }

    pub fn describe(&self) -> String {
        let mut parts = vec![format!("route {}", self.index)];
        if let Some(dist) = self.distance_meters {
            parts.push(format!("{:.1} km", dist / 1000.0));
        }
        if let Some(secs) = self.duration_seconds {
            parts.push(format!("{:.0} min", secs / 60.0));
        }
        parts.push(format!("{} points", self.polyline.len()));
        parts.join(", ")
    }
}

pub const ROUTE_LAYER_PREFIX: &str = "route-";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Coordinate;

    fn route(index: usize) -> Route {
        Route {
            index,
            polyline: Polyline::new(vec![Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.01)]),
            distance_meters: Some(1112.0),
            duration_seconds: Some(90.0),
        }
    }

    #[test]
    fn test_primary_is_distinguished() {
        let primary = route(0).style();
        let alternate = route(2).style();
        assert_eq!(primary.color, "#1D4ED8");
        assert_eq!(alternate.color, "#9CA3AF");
        assert!(primary.width > alternate.width);
        assert!(primary.opacity > alternate.opacity);
        assert_eq!(route(2).layer_id(), "route-2");
    }

    #[test]
    fn test_describe() {
        assert_eq!(route(1).describe(), "route 1, 1.1 km, 2 min, 2 points");
    }
}
