use geojson::FeatureCollection;

use crate::error::{TransitError, TransitResult};
use crate::geo::tag_source;
use crate::portal::url::build_url;
use crate::portal::GeoJsonSource;
use crate::registry::Registry;

/// The mode downloaded when the caller doesn't name one
pub const DEFAULT_MODE: &str = "SEPTA bus";

/// Stops and lines downloaded for a single mode
#[derive(Debug, Clone)]
pub struct ModeData {
    pub mode: String,
    pub stops: FeatureCollection,
    pub lines: FeatureCollection,
}

pub struct Fetcher<'a, S> {
    registry: &'a Registry,
    source: &'a S,
}

impl<'a, S: GeoJsonSource> Fetcher<'a, S> {
    pub fn new(registry: &'a Registry, source: &'a S) -> Self {
        Self { registry, source }
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    /// Download the stop and line collections for `mode`, tagging every feature with it.
    ///
    /// Makes exactly two requests. Nothing partial is returned on failure.
    pub async fn fetch_mode(&self, mode: &str) -> TransitResult<ModeData> {
        let (stops_id, lines_id) = self.registry.dataset(mode)?;

        let stop_url = build_url(stops_id);
        let line_url = build_url(lines_id);

        log::info!("Downloading {}", mode);

        let fetch = |url: String| async move {
            self.source
                .get_collection(&url)
                .await
                .map_err(|source| TransitError::Fetch {
                    mode: mode.to_string(),
                    source,
                })
        };

        let mut stops = fetch(stop_url).await?;
        let mut lines = fetch(line_url).await?;

        tag_source(&mut stops, mode);
        tag_source(&mut lines, mode);

        log::debug!(
            "{}: {} stops, {} lines",
            mode,
            stops.features.len(),
            lines.features.len()
        );

        Ok(ModeData {
            mode: mode.to_string(),
            stops,
            lines,
        })
    }

    pub async fn fetch_default(&self) -> TransitResult<ModeData> {
        self.fetch_mode(DEFAULT_MODE).await
    }
}
