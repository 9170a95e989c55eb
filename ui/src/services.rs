use std::sync::Arc;

use model::{Coordinate, Route};
use provider::{Directions, Geocoder, HttpTransport, ProviderConfig, ProviderError};

/// Everything that talks to the network. Shared by the tasks spawned for each request.
pub struct Services<T> {
    pub geocoder: Geocoder<T>,
    pub directions: Directions<T>,
}

/// A place the user searched for
#[derive(Debug)]
pub struct Found {
    pub query: String,
    pub pt: Coordinate,
    pub name: Option<String>,
}

#[derive(Debug)]
pub struct Trip {
    pub from: String,
    pub to: String,
    pub start: Coordinate,
    pub end: Coordinate,
    /// The primary route first
    pub routes: Vec<Route>,
}

impl<T: HttpTransport> Services<T> {
    pub fn new(config: ProviderConfig, transport: T) -> Self {
        let transport = Arc::new(transport);
        Self {
            geocoder: Geocoder::new(config.clone(), transport.clone()),
            directions: Directions::new(config, transport),
        }
    }

    pub async fn search(&self, query: String) -> Result<Found, ProviderError> {
        let pt = self.geocoder.resolve(&query).await?;
        let name = self.geocoder.reverse_resolve(pt).await?;
        Ok(Found { query, pt, name })
    }

    /// Resolves both places, then asks for every route between them
    pub async fn plan_trip(&self, from: String, to: String) -> Result<Trip, ProviderError> {
        let start = self.geocoder.resolve(&from).await?;
        let end = self.geocoder.resolve(&to).await?;
        let routes = self.directions.all_routes(start, end).await?;
        Ok(Trip {
            from,
            to,
            start,
            end,
            routes,
        })
    }
}
