use std::time::Duration;

use geojson::{FeatureCollection, GeoJson};
use url::Url;

use super::error::{FetchError, FetchResult};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Anything that can hand back a feature collection for a download URL.
///
/// [`PortalClient`] does this over HTTP; tests swap in an in-memory table.
#[allow(async_fn_in_trait)]
pub trait GeoJsonSource {
    async fn get_collection(&self, url: &str) -> FetchResult<FeatureCollection>;
}

#[derive(Clone)]
pub struct PortalClient {
    client: reqwest::Client,
}

impl PortalClient {
    pub fn new() -> FetchResult<PortalClient> {
        PortalClient::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> FetchResult<PortalClient> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Init(e.to_string()))?;

        Ok(PortalClient { client })
    }

    async fn request(&self, url: Url) -> FetchResult<String> {
        log::debug!("Requesting {}", url);
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let data_str = response.text().await?;
        log::trace!("Response from {}: {} bytes", url, data_str.len());
        Ok(data_str)
    }
}

impl GeoJsonSource for PortalClient {
    async fn get_collection(&self, url: &str) -> FetchResult<FeatureCollection> {
        let url = Url::parse(url)?;
        let data_str = self.request(url.clone()).await?;
        parse_collection(&data_str, url.as_str())
    }
}

/// Parse a response body, insisting on a top level FeatureCollection
pub fn parse_collection(data: &str, url: &str) -> FetchResult<FeatureCollection> {
    match data.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => Ok(collection),
        _ => Err(FetchError::NotACollection(url.to_string())),
    }
}
