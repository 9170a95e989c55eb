//! Just enough of the geocoding and directions JSON to get positions out.

use model::{Coordinate, Polyline};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::ProviderError;

#[derive(Deserialize)]
pub struct GeocodingResponse {
    #[serde(default)]
    pub features: Vec<GeocodingFeature>,
}

#[derive(Deserialize)]
pub struct GeocodingFeature {
    pub center: Option<Vec<f64>>,
    pub place_name: Option<String>,
}

#[derive(Deserialize)]
pub struct DirectionsResponse {
    pub code: Option<String>,
    pub message: Option<String>,
    #[serde(default)]
    pub routes: Vec<DirectionsRoute>,
}

#[derive(Deserialize)]
pub struct DirectionsRoute {
    pub geometry: geojson::Geometry,
    pub distance: Option<f64>,
    pub duration: Option<f64>,
}

pub fn decode<T: DeserializeOwned>(body: &str, what: &str) -> Result<T, ProviderError> {
    serde_json::from_str(body)
        .map_err(|err| ProviderError::Upstream(format!("couldn't parse {what}: {err}")))
}

/// `[lng, lat, ...]`
pub fn position(raw: &[f64]) -> Result<Coordinate, ProviderError> {
    if raw.len() < 2 {
        return Err(ProviderError::Upstream(format!(
            "position {:?} needs a longitude and latitude",
            raw
        )));
    }
    Ok(Coordinate::new(raw[0], raw[1]))
}

pub fn polyline(geometry: &geojson::Geometry) -> Result<Polyline, ProviderError> {
    match geometry.value {
        geojson::Value::LineString(ref pts) => {
            let polyline = pts
                .iter()
                .map(|pt| position(pt))
                .collect::<Result<Polyline, _>>()?;
            if polyline.is_empty() {
                return Err(ProviderError::Upstream(
                    "route geometry has no points".to_string(),
                ));
            }
            Ok(polyline)
        }
        ref other => Err(ProviderError::Upstream(format!(
            "route geometry is a {}, not a LineString",
            other.type_name()
        ))),
    }
}
