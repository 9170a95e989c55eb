use std::fmt;

use anyhow::Result;
use geo::{Bearing, Destination, Distance, Haversine, InterpolatePoint, Length, LineString, Point};
use serde::{Deserialize, Serialize};

/// A WGS84 position in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lng: f64,
    pub lat: f64,
}

impl Coordinate {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Parses "lng,lat"
    pub fn parse(raw: &str) -> Result<Self> {
        let parts: Vec<&str> = raw.split(',').map(|x| x.trim()).collect();
        if parts.len() != 2 {
            bail!("Expected \"lng,lat\", got {raw:?}");
        }
        let lng: f64 = parts[0]
            .parse()
            .map_err(|err| anyhow!("Bad longitude {:?}: {err}", parts[0]))?;
        let lat: f64 = parts[1]
            .parse()
            .map_err(|err| anyhow!("Bad latitude {:?}: {err}", parts[1]))?;
        let pt = Self::new(lng, lat);
        if !pt.is_finite() || lat.abs() > 90.0 || lng.abs() > 180.0 {
            bail!("{raw:?} isn't a valid position");
        }
        Ok(pt)
    }

    pub fn is_finite(self) -> bool {
        self.lng.is_finite() && self.lat.is_finite()
    }

    /// Great-circle distance in meters
    pub fn distance_to(self, other: Coordinate) -> f64 {
        Haversine::distance(self.to_point(), other.to_point())
    }

    /// Initial bearing towards `other`, in degrees clockwise from north, in [0, 360)
    pub fn bearing_to(self, other: Coordinate) -> f64 {
        Haversine::bearing(self.to_point(), other.to_point())
    }

    pub fn destination(self, bearing: f64, meters: f64) -> Coordinate {
        Haversine::destination(self.to_point(), bearing, meters).into()
    }

    /// Somewhere on the great circle to `other`. `ratio` 0 and 1 return the endpoints exactly.
    pub fn point_at_ratio(self, other: Coordinate, ratio: f64) -> Coordinate {
        Haversine::point_at_ratio_between(self.to_point(), other.to_point(), ratio).into()
    }

    pub fn to_point(self) -> Point {
        Point::new(self.lng, self.lat)
    }
}

impl From<Point> for Coordinate {
    fn from(pt: Point) -> Self {
        Self::new(pt.x(), pt.y())
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lng, self.lat)
    }
}

/// An ordered path. The order is the direction of travel.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    pts: Vec<Coordinate>,
}

impl Polyline {
    pub fn new(pts: Vec<Coordinate>) -> Self {
        Self { pts }
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.pts
    }

    pub fn len(&self) -> usize {
        self.pts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pts.is_empty()
    }

    pub fn first(&self) -> Option<Coordinate> {
        self.pts.first().copied()
    }

    pub fn last(&self) -> Option<Coordinate> {
        self.pts.last().copied()
    }

    pub fn length_meters(&self) -> f64 {
        self.to_linestring().length::<Haversine>()
    }

    /// The longest gap between consecutive points. 0 for fewer than 2 points.
    pub fn max_segment_meters(&self) -> f64 {
        self.pts
            .windows(2)
            .map(|pair| pair[0].distance_to(pair[1]))
            .fold(0.0, f64::max)
    }

    pub fn to_linestring(&self) -> LineString {
        self.pts.iter().map(|pt| (pt.lng, pt.lat)).collect()
    }

    pub fn to_geojson(&self) -> geojson::Geometry {
        geojson::Geometry::new(geojson::Value::LineString(
            self.pts.iter().map(|pt| vec![pt.lng, pt.lat]).collect(),
        ))
    }
}

impl FromIterator<Coordinate> for Polyline {
    fn from_iter<I: IntoIterator<Item = Coordinate>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
