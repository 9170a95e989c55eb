use std::time::Duration;

use model::{
    clear_route_layers, densify, AnimationPhase, AnimatorConfig, Coordinate, FrameQueue, Layer,
    MapState, MapView, NavigationAnimator,
};

use crate::services::{Found, Trip};

/// How close the camera gets when a trip is drawn
pub const TRIP_ZOOM: f64 = 12.0;

pub struct Settings {
    pub speed_kmh: f64,
    pub max_segment_meters: f64,
}

/// All of the state the frame loop touches. Nothing in here ever waits on the network.
pub struct App {
    pub map: MapState,
    pub animator: NavigationAnimator<FrameQueue>,
    settings: Settings,
    // The most recently requested trip. Older ones still in flight are dropped when they land.
    latest_trip: u64,
}

impl App {
    pub fn new(center: Coordinate, zoom: f64, settings: Settings, config: AnimatorConfig) -> App {
        App {
            map: MapState::with_scenery(center, zoom),
            animator: NavigationAnimator::new(FrameQueue::new(), config),
            settings,
            latest_trip: 0,
        }
    }

    /// Numbers a new directions request. Only the newest one ever gets drawn.
    pub fn begin_trip(&mut self) -> u64 {
        self.latest_trip += 1;
        self.latest_trip
    }

    pub fn is_current_trip(&self, id: u64) -> bool {
        id == self.latest_trip
    }

    pub fn show_place(&mut self, found: &Found) {
        self.map.set_center(found.pt);
        info!(
            "{:?} is at {} ({})",
            found.query,
            found.pt,
            found.name.as_deref().unwrap_or("no name nearby")
        );
    }

    /// Replaces whatever routes were drawn before, then drives along the primary one. A trip
    /// arriving mid-animation abandons the old run. Returns false and changes nothing if a newer
    /// trip was requested since `id`.
    pub fn show_trip(&mut self, id: u64, trip: Trip) -> bool {
        if !self.is_current_trip(id) {
            info!(
                "Dropping the trip from {:?} to {:?}, since a newer one was requested",
                trip.from, trip.to
            );
            return false;
        }
        info!(
            "{} route(s) from {:?} {} to {:?} {}",
            trip.routes.len(),
            trip.from,
            trip.start,
            trip.to,
            trip.end
        );
        self.map.fly_to(trip.start, TRIP_ZOOM);
        clear_route_layers(&mut self.map);

        let mut primary = None;
        for mut route in trip.routes {
            route.polyline = densify(&route.polyline, self.settings.max_segment_meters);
            info!("  {}", route.describe());
            self.map.add_layer(Layer::route(&route));
            if route.is_primary() {
                primary = Some(route.polyline);
            }
        }
        debug!("Route layers: {}", self.map.to_geojson());

        match primary {
            Some(polyline) => {
                self.animator
                    .start(polyline, self.settings.speed_kmh, &mut self.map);
            }
            None => {
                warn!("No primary route to drive along");
                self.animator.stop(&mut self.map);
            }
        }
        true
    }

    /// Call once per display refresh
    pub fn tick(&mut self, now: Duration) -> usize {
        self.animator.tick(now, &mut self.map)
    }

    pub fn is_complete(&self) -> bool {
        self.animator.phase() == AnimationPhase::Complete
    }

    pub fn stop(&mut self) {
        self.animator.stop(&mut self.map);
    }
}
