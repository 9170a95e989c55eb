use model::Coordinate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    /// Nothing was sent; fix the setup and try again
    #[error("Provider misconfigured: {0}")]
    Configuration(String),

    #[error("No place found for {0:?}")]
    NotFound(String),

    #[error("No route from {start} to {end}")]
    NoRoute { start: Coordinate, end: Coordinate },

    #[error("Upstream failure: {0}")]
    Upstream(String),
}

impl ProviderError {
    /// Everything but a configuration problem might go away if the user tries again or asks
    /// for something else.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ProviderError::Configuration(_))
    }
}
