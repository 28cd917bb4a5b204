#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("Init error: {0}")]
    Init(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Error response from {url}: {status}")]
    Status { url: String, status: u16 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("GeoJSON error: {0}")]
    Deserialize(#[from] geojson::Error),

    #[error("Expected a FeatureCollection from {0}")]
    NotACollection(String),
}

pub type FetchResult<T> = Result<T, FetchError>;
