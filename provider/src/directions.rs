use std::sync::Arc;

use model::{Coordinate, Polyline, Route};

use crate::wire::{self, DirectionsResponse};
use crate::{HttpTransport, ProviderConfig, ProviderError};

/// Asks a directions service for driving routes between two points.
pub struct Directions<T> {
    config: ProviderConfig,
    transport: Arc<T>,
}

impl<T: HttpTransport> Directions<T> {
    pub fn new(config: ProviderConfig, transport: Arc<T>) -> Self {
        Self { config, transport }
    }

    /// Just the service's preferred route
    pub async fn primary_route(
        &self,
        start: Coordinate,
        end: Coordinate,
    ) -> Result<Polyline, ProviderError> {
        let routes = self.fetch(start, end, false).await?;
        routes
            .into_iter()
            .next()
            .map(|route| route.polyline)
            .ok_or(ProviderError::NoRoute { start, end })
    }

    /// Every alternative, in the service's order of preference. There may be only one.
    pub async fn all_routes(
        &self,
        start: Coordinate,
        end: Coordinate,
    ) -> Result<Vec<Route>, ProviderError> {
        self.fetch(start, end, true).await
    }

    async fn fetch(
        &self,
        start: Coordinate,
        end: Coordinate,
        alternatives: bool,
    ) -> Result<Vec<Route>, ProviderError> {
        let waypoints = format!("{},{};{},{}", start.lng, start.lat, end.lng, end.lat);
        let url = self.config.endpoint(
            &[
                "directions",
                "v5",
                &self.config.directions_profile,
                "driving",
                &waypoints,
            ],
            &[
                ("geometries", "geojson"),
                ("overview", "full"),
                ("alternatives", if alternatives { "true" } else { "false" }),
            ],
        )?;

        let body = self.transport.get(url).await.map_err(|err| {
            warn!("Directions from {start} to {end} failed: {err}");
            err
        })?;
        let response: DirectionsResponse = wire::decode(&body, "directions response")?;
        if response.routes.is_empty() {
            info!(
                "No route from {start} to {end}: {} {}",
                response.code.as_deref().unwrap_or("?"),
                response.message.as_deref().unwrap_or("")
            );
            return Err(ProviderError::NoRoute { start, end });
        }

        let mut routes = Vec::new();
        for (index, raw) in response.routes.into_iter().enumerate() {
            routes.push(Route {
                index,
                polyline: wire::polyline(&raw.geometry)?,
                distance_meters: raw.distance,
                duration_seconds: raw.duration,
            });
        }
        info!("Found {} route(s) from {start} to {end}", routes.len());
        Ok(routes)
    }
}
