#[macro_use]
extern crate log;

mod config;
mod directions;
mod error;
mod geocoding;
mod transport;
mod wire;

pub use config::ProviderConfig;
pub use directions::Directions;
pub use error::ProviderError;
pub use geocoding::Geocoder;
pub use transport::{HttpTransport, ReqwestTransport};
pub use url::Url;
