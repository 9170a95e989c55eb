use std::sync::Arc;

use model::Coordinate;

use crate::wire::{self, GeocodingResponse};
use crate::{HttpTransport, ProviderConfig, ProviderError};

/// Turns place names into positions and back, using the first match the service offers.
pub struct Geocoder<T> {
    config: ProviderConfig,
    transport: Arc<T>,
}

impl<T: HttpTransport> Geocoder<T> {
    pub fn new(config: ProviderConfig, transport: Arc<T>) -> Self {
        Self { config, transport }
    }

    pub async fn resolve(&self, place: &str) -> Result<Coordinate, ProviderError> {
        let place = place.trim();
        let file = format!("{place}.json");
        let url = self.config.endpoint(
            &["geocoding", "v5", &self.config.geocoding_dataset, &file],
            &[],
        )?;
        if place.is_empty() {
            return Err(ProviderError::NotFound(place.to_string()));
        }

        let body = self.transport.get(url).await.map_err(|err| {
            warn!("Geocoding {place:?} failed: {err}");
            err
        })?;
        let response: GeocodingResponse = wire::decode(&body, "geocoding response")?;
        let feature = match response.features.into_iter().next() {
            Some(feature) => feature,
            None => {
                return Err(ProviderError::NotFound(place.to_string()));
            }
        };
        let center = feature.center.ok_or_else(|| {
            ProviderError::Upstream(format!("first match for {place:?} has no center"))
        })?;
        let pt = wire::position(&center)?;
        debug!(
            "Resolved {place:?} to {pt} ({})",
            feature.place_name.as_deref().unwrap_or("unnamed")
        );
        Ok(pt)
    }

    /// The nearest named place, if there is one. Failures of the lookup itself are logged and
    /// treated as no match, since callers only want this for display.
    pub async fn reverse_resolve(&self, pt: Coordinate) -> Result<Option<String>, ProviderError> {
        let file = format!("{},{}.json", pt.lng, pt.lat);
        let url = self.config.endpoint(
            &["geocoding", "v5", &self.config.geocoding_dataset, &file],
            &[("limit", "1")],
        )?;

        let body = match self.transport.get(url).await {
            Ok(body) => body,
            Err(err) => {
                warn!("Reverse geocoding {pt} failed: {err}");
                return Ok(None);
            }
        };
        match wire::decode::<GeocodingResponse>(&body, "reverse geocoding response") {
            Ok(response) => Ok(response
                .features
                .into_iter()
                .next()
                .and_then(|feature| feature.place_name)),
            Err(err) => {
                warn!("Reverse geocoding {pt} failed: {err}");
                Ok(None)
            }
        }
    }
}
