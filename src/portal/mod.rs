pub mod client;
pub mod error;
pub mod url;

pub use client::{GeoJsonSource, PortalClient};
pub use error::{FetchError, FetchResult};
