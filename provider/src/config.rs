use std::fmt;
use std::time::Duration;

use url::Url;

use crate::ProviderError;

const DEFAULT_BASE_URL: &str = "https://api.mapbox.com";

/// Where and how to reach the geocoding and directions services.
#[derive(Clone)]
pub struct ProviderConfig {
    pub access_token: Option<String>,
    pub base_url: String,
    /// Used in `/geocoding/v5/{dataset}/...`
    pub geocoding_dataset: String,
    /// Used in `/directions/v5/{profile}/driving/...`
    pub directions_profile: String,
    pub timeout: Duration,
}

impl ProviderConfig {
    pub fn new(access_token: Option<String>) -> Self {
        Self {
            access_token,
            base_url: DEFAULT_BASE_URL.to_string(),
            geocoding_dataset: "mapbox.places".to_string(),
            directions_profile: "mapbox".to_string(),
            timeout: Duration::from_secs(20),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    pub fn access_token(&self) -> Result<&str, ProviderError> {
        match self.access_token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(ProviderError::Configuration(
                "no access token; set MAPBOX_ACCESS_TOKEN".to_string(),
            )),
        }
    }

    /// Builds `{base}/{segments...}?{query...}&access_token=...`, encoding each path segment.
    pub(crate) fn endpoint(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<Url, ProviderError> {
        let token = self.access_token()?;
        let mut url = Url::parse(&self.base_url).map_err(|err| {
            ProviderError::Configuration(format!("bad base URL {:?}: {err}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                ProviderError::Configuration(format!("{:?} can't be a base URL", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
            pairs.append_pair("access_token", token);
        }
        Ok(url)
    }
}

// Keep the token out of logs
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "<redacted>"),
            )
            .field("base_url", &self.base_url)
            .field("geocoding_dataset", &self.geocoding_dataset)
            .field("directions_profile", &self.directions_profile)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_or_blank_token() {
        for token in [None, Some(""), Some("   ")] {
            let config = ProviderConfig::new(token.map(|x| x.to_string()));
            assert!(matches!(
                config.access_token(),
                Err(ProviderError::Configuration(_))
            ));
            assert!(config.endpoint(&["x"], &[]).is_err());
        }
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let config = ProviderConfig::new(Some("pk.abc".to_string()));
        let url = config
            .endpoint(
                &["geocoding", "v5", "mapbox.places", "Am Fort Hechtsheim 17/2.json"],
                &[("limit", "1")],
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.mapbox.com/geocoding/v5/mapbox.places/Am%20Fort%20Hechtsheim%2017%2F2.json?limit=1&access_token=pk.abc"
        );
    }

    #[test]
    fn test_endpoint_under_base_path() {
        let config =
            ProviderConfig::new(Some("t".to_string())).with_base_url("http://localhost:8080/proxy/");
        let url = config.endpoint(&["a", "b"], &[]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/proxy/a/b?access_token=t");
    }

    #[test]
    fn test_debug_hides_token() {
        let config = ProviderConfig::new(Some("pk.secret".to_string()));
        assert!(!format!("{:?}", config).contains("secret"));
    }
}
