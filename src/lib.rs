//! Download stop and route line data for the Philadelphia region's transit
//! providers from ArcGIS open data, tag each feature with its mode and merge
//! everything into one stop collection and one line collection.

pub mod aggregate;
pub mod app;
pub mod config;
pub mod error;
pub mod fetch;
pub mod geo;
pub mod output;
pub mod portal;
pub mod registry;

#[cfg(test)]
mod test_utils;

pub use aggregate::{Aggregator, FailurePolicy, MergedData, ModeFailure};
pub use error::{ErrorKind, TransitError, TransitResult};
pub use fetch::{Fetcher, ModeData, DEFAULT_MODE};
pub use portal::{GeoJsonSource, PortalClient};
pub use registry::{DataKind, DatasetEntry, Registry, Update};
