use std::collections::BTreeMap;

use geojson::{Feature, FeatureCollection, GeoJson, JsonObject};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::route::ROUTE_LAYER_PREFIX;
use crate::{Coordinate, Polyline, Route, RouteStyle};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MarkerHandle(pub usize);

#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    pub id: String,
    pub kind: LayerKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LayerKind {
    Route { polyline: Polyline, style: RouteStyle },
    Buildings3d,
    Sky,
}

impl Layer {
    pub fn route(route: &Route) -> Self {
        Self {
            id: route.layer_id(),
            kind: LayerKind::Route {
                polyline: route.polyline.clone(),
                style: route.style(),
            },
        }
    }

    pub fn buildings_3d() -> Self {
        Self {
            id: "3d-buildings".to_string(),
            kind: LayerKind::Buildings3d,
        }
    }

    pub fn sky() -> Self {
        Self {
            id: "sky".to_string(),
            kind: LayerKind::Sky,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraOptions {
    pub center: Coordinate,
    pub bearing: f64,
    pub pitch: f64,
    pub duration_ms: u64,
}

/// The parts of a map surface that routing and animation need. Anything that can draw a line and
/// a marker and point a camera can sit behind this.
pub trait MapView {
    fn set_center(&mut self, center: Coordinate);
    fn fly_to(&mut self, center: Coordinate, zoom: f64);
    fn ease_camera(&mut self, camera: CameraOptions);

    /// Replaces any existing layer with the same ID
    fn add_layer(&mut self, layer: Layer);
    /// False if there was no such layer
    fn remove_layer(&mut self, id: &str) -> bool;
    fn layer_ids(&self) -> Vec<String>;

    fn place_marker(&mut self, pos: Coordinate) -> MarkerHandle;
    fn move_marker(&mut self, marker: MarkerHandle, pos: Coordinate);
    fn remove_marker(&mut self, marker: MarkerHandle);
}

/// Removes every layer previously drawn for a route
pub fn clear_route_layers<M: MapView>(map: &mut M) {
    for id in map.layer_ids() {
        if id.starts_with(ROUTE_LAYER_PREFIX) {
            map.remove_layer(&id);
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub center: Coordinate,
    pub zoom: f64,
    pub bearing: f64,
    pub pitch: f64,
}

/// A map surface that only remembers what it was told to show.
pub struct MapState {
    pub camera: Camera,
    // In draw order
    layers: Vec<Layer>,
    markers: BTreeMap<MarkerHandle, Coordinate>,
    next_marker: usize,
}

impl MapState {
    pub fn new(center: Coordinate, zoom: f64) -> Self {
        Self {
            camera: Camera {
                center,
                zoom,
                bearing: 0.0,
                pitch: 0.0,
            },
            layers: Vec::new(),
            markers: BTreeMap::new(),
            next_marker: 0,
        }
    }

    /// Starts with 3D buildings and a sky, like the regular street style
    pub fn with_scenery(center: Coordinate, zoom: f64) -> Self {
        let mut map = Self::new(center, zoom);
        map.add_layer(Layer::buildings_3d());
        map.add_layer(Layer::sky());
        map
    }

    pub fn layer(&self, id: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn marker(&self, marker: MarkerHandle) -> Option<Coordinate> {
        self.markers.get(&marker).copied()
    }

    pub fn num_markers(&self) -> usize {
        self.markers.len()
    }

    /// Route layers as GeoJSON, with their styling as properties
    pub fn to_geojson(&self) -> GeoJson {
        let mut features = Vec::new();
        for layer in &self.layers {
            if let LayerKind::Route {
                ref polyline,
                ref style,
            } = layer.kind
            {
                let mut properties = JsonObject::new();
                properties.insert("id".to_string(), json!(layer.id));
                properties.insert("line-color".to_string(), json!(style.color));
                properties.insert("line-width".to_string(), json!(style.width));
                properties.insert("line-opacity".to_string(), json!(style.opacity));
                features.push(Feature {
                    bbox: None,
                    geometry: Some(polyline.to_geojson()),
                    id: None,
                    properties: Some(properties),
                    foreign_members: None,
                });
            }
        }
        GeoJson::FeatureCollection(FeatureCollection {
            features,
            bbox: None,
            foreign_members: None,
        })
    }
}

impl MapView for MapState {
    fn set_center(&mut self, center: Coordinate) {
        self.camera.center = center;
    }

    fn fly_to(&mut self, center: Coordinate, zoom: f64) {
        debug!("Flying to {center} at zoom {zoom}");
        self.camera.center = center;
        self.camera.zoom = zoom;
    }

    fn ease_camera(&mut self, camera: CameraOptions) {
        // A headless map has nothing to animate, so every ease is instant
        self.camera.center = camera.center;
        self.camera.bearing = camera.bearing;
        self.camera.pitch = camera.pitch;
    }

    fn add_layer(&mut self, layer: Layer) {
        match self.layers.iter_mut().find(|l| l.id == layer.id) {
            Some(existing) => {
                *existing = layer;
            }
            None => {
                debug!("Adding layer {}", layer.id);
                self.layers.push(layer);
            }
        }
    }

    fn remove_layer(&mut self, id: &str) -> bool {
        let before = self.layers.len();
        self.layers.retain(|l| l.id != id);
        before != self.layers.len()
    }

    fn layer_ids(&self) -> Vec<String> {
        self.layers.iter().map(|l| l.id.clone()).collect()
    }

    fn place_marker(&mut self, pos: Coordinate) -> MarkerHandle {
        let marker = MarkerHandle(self.next_marker);
        self.next_marker += 1;
        self.markers.insert(marker, pos);
        marker
    }

    fn move_marker(&mut self, marker: MarkerHandle, pos: Coordinate) {
        match self.markers.get_mut(&marker) {
            Some(x) => {
                *x = pos;
            }
            None => {
                warn!("Moving {:?}, which was already removed", marker);
            }
        }
    }

    fn remove_marker(&mut self, marker: MarkerHandle) {
        self.markers.remove(&marker);
    }
}
