use std::pin::pin;
use std::str::FromStr;

use futures_util::{stream, StreamExt};
use geojson::{Feature, FeatureCollection};
use itertools::Itertools;

use crate::error::{ErrorKind, TransitError, TransitResult};
use crate::fetch::Fetcher;
use crate::geo::{collection_bounds, explode_multipoints};
use crate::portal::GeoJsonSource;
use crate::registry::Registry;

/// What to do when one mode can't be downloaded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log it, record it in [`MergedData::failures`] and carry on with the other modes
    #[default]
    SkipAndReport,
    /// Give up on the whole run and return the error
    Abort,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("Failure policy must be 'skip' or 'abort', got '{0}'")]
pub struct ParsePolicyError(String);

impl FromStr for FailurePolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "skip" | "skip-and-report" => Ok(FailurePolicy::SkipAndReport),
            "abort" => Ok(FailurePolicy::Abort),
            _ => Err(ParsePolicyError(s.to_string())),
        }
    }
}

#[derive(Debug)]
pub struct ModeFailure {
    pub mode: String,
    pub error: TransitError,
}

impl ModeFailure {
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

/// Feature counts for one successfully downloaded mode, before stops are exploded
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ModeSummary {
    pub mode: String,
    pub stops: usize,
    pub lines: usize,
}

#[derive(Debug)]
pub struct MergedData {
    pub stops: FeatureCollection,
    pub lines: FeatureCollection,
    pub modes: Vec<ModeSummary>,
    pub failures: Vec<ModeFailure>,
}

impl MergedData {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct Aggregator<'a, S> {
    fetcher: Fetcher<'a, S>,
    policy: FailurePolicy,
    explode_stops: bool,
    concurrency: usize,
}

impl<'a, S: GeoJsonSource> Aggregator<'a, S> {
    /// Sequential, skip-and-report, with multi-point stops exploded.
    ///
    /// The registry stays borrowed for the aggregator's lifetime so it can't change mid-run.
    pub fn new(registry: &'a Registry, source: &'a S) -> Self {
        Self {
            fetcher: Fetcher::new(registry, source),
            policy: FailurePolicy::default(),
            explode_stops: true,
            concurrency: 1,
        }
    }

    pub fn policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn explode_stops(mut self, explode_stops: bool) -> Self {
        self.explode_stops = explode_stops;
        self
    }

    /// How many modes may be downloading at once. Results are merged in registry order regardless.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Download every mode in the registry and merge them
    pub async fn fetch_all(&self) -> TransitResult<MergedData> {
        let modes = self.fetcher.registry().list_modes();
        self.fetch_modes(&modes).await
    }

    /// Download the named modes and merge them, in the order given.
    ///
    /// A mode named more than once is only downloaded the first time.
    pub async fn fetch_modes(&self, modes: &[&str]) -> TransitResult<MergedData> {
        let modes = modes.iter().copied().unique().collect::<Vec<_>>();

        let mut results = pin!(stream::iter(modes.iter().copied())
            .map(|mode| async move { (mode, self.fetcher.fetch_mode(mode).await) })
            .buffered(self.concurrency));

        let mut stops: Vec<Feature> = vec![];
        let mut lines: Vec<Feature> = vec![];
        let mut summaries = vec![];
        let mut failures = vec![];

        while let Some((mode, result)) = results.next().await {
            let data = match (result, self.policy) {
                (Ok(data), _) => data,
                (Err(e), FailurePolicy::Abort) => {
                    log::error!("Aborting, could not get {}: {}", mode, e);
                    return Err(e);
                }
                (Err(e), FailurePolicy::SkipAndReport) => {
                    log::error!("Skipping {}: {}", mode, e);
                    failures.push(ModeFailure {
                        mode: mode.to_string(),
                        error: e,
                    });
                    continue;
                }
            };

            summaries.push(ModeSummary {
                mode: data.mode,
                stops: data.stops.features.len(),
                lines: data.lines.features.len(),
            });
            stops.extend(data.stops.features);
            lines.extend(data.lines.features);
        }

        let mut stops = collection(stops);
        if self.explode_stops {
            stops = explode_multipoints(stops);
        }
        let lines = collection(lines);

        log::info!(
            "Merged {} of {} modes: {} stops, {} lines",
            summaries.len(),
            modes.len(),
            stops.features.len(),
            lines.features.len()
        );

        Ok(MergedData {
            stops,
            lines,
            modes: summaries,
            failures,
        })
    }
}

fn collection(features: Vec<Feature>) -> FeatureCollection {
    let mut collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };
    collection.bbox = collection_bounds(&collection)
        .map(|rect| vec![rect.min().x, rect.min().y, rect.max().x, rect.max().y]);
    collection
}

#[cfg(test)]
mod test {

    use crate::geo::SOURCE_PROPERTY;
    use crate::test_utils::{
        init, line_feature, multipoint_feature, point_feature, src_of, MemorySource,
    };

    use super::*;

    fn registry(modes: &[&str]) -> Registry {
        let mut registry = Registry::new();
        for mode in modes {
            registry.add_or_update(mode, "stops", &format!("{mode}_STOPS")).unwrap();
            registry.add_or_update(mode, "lines", &format!("{mode}_LINES")).unwrap();
        }
        registry
    }

    fn source(modes: &[&str]) -> MemorySource {
        init();
        modes.iter().fold(MemorySource::new(), |source, mode| {
            source
                .with(&format!("{mode}_STOPS"), vec![point_feature(1.0, 1.0)])
                .with(&format!("{mode}_LINES"), vec![line_feature(&[(0.0, 0.0), (1.0, 1.0)])])
        })
    }

    fn srcs(collection: &FeatureCollection) -> Vec<&str> {
        collection.features.iter().filter_map(src_of).collect()
    }

    #[tokio::test]
    async fn test_fetch_all_in_registry_order() {
        let registry = registry(&["A", "B"]);
        let source = source(&["A", "B"]);

        let merged = Aggregator::new(&registry, &source).fetch_all().await.unwrap();

        assert_eq!(merged.stops.features.len(), 2);
        assert_eq!(srcs(&merged.stops), vec!["A", "B"]);
        assert_eq!(merged.stops.bbox, Some(vec![1.0, 1.0, 1.0, 1.0]));
        assert_eq!(merged.lines.bbox, Some(vec![0.0, 0.0, 1.0, 1.0]));
        assert_eq!(srcs(&merged.lines), vec!["A", "B"]);
        assert!(merged.is_complete());
        assert_eq!(
            merged.modes,
            vec![
                ModeSummary { mode: "A".to_string(), stops: 1, lines: 1 },
                ModeSummary { mode: "B".to_string(), stops: 1, lines: 1 },
            ]
        );
    }

    #[tokio::test]
    async fn test_concurrent_fetch_keeps_order() {
        let modes = ["A", "B", "C", "D", "E"];
        let registry = registry(&modes);
        let source = source(&modes);

        let merged = Aggregator::new(&registry, &source)
            .concurrency(4)
            .fetch_all()
            .await
            .unwrap();

        assert_eq!(srcs(&merged.stops), modes.to_vec());
        assert_eq!(srcs(&merged.lines), modes.to_vec());
    }

    #[tokio::test]
    async fn test_multipoint_stops_are_exploded() {
        let registry = registry(&["A"]);
        let parts = [(1.0, 1.0), (2.0, 2.0), (3.0, 3.0), (4.0, 4.0)];
        let source = MemorySource::new()
            .with("A_STOPS", vec![point_feature(0.0, 0.0), multipoint_feature(&parts)])
            .with("A_LINES", vec![]);

        let merged = Aggregator::new(&registry, &source).fetch_all().await.unwrap();

        assert_eq!(merged.stops.features.len(), 5);
        assert_eq!(srcs(&merged.stops), vec!["A"; 5]);

        let coords = merged.stops.features[1..]
            .iter()
            .map(|f| match &f.geometry.as_ref().unwrap().value {
                geojson::Value::Point(c) => (c[0], c[1]),
                other => panic!("expected a point, got {:?}", other),
            })
            .collect::<Vec<_>>();
        assert_eq!(coords, parts.to_vec());

        // summary counts what was downloaded
        assert_eq!(merged.modes[0].stops, 2);
    }

    #[tokio::test]
    async fn test_explode_can_be_disabled() {
        let registry = registry(&["A"]);
        let source = MemorySource::new()
            .with("A_STOPS", vec![multipoint_feature(&[(1.0, 1.0), (2.0, 2.0)])])
            .with("A_LINES", vec![]);

        let merged = Aggregator::new(&registry, &source)
            .explode_stops(false)
            .fetch_all()
            .await
            .unwrap();

        assert_eq!(merged.stops.features.len(), 1);
    }

    #[tokio::test]
    async fn test_skip_and_report() {
        let registry = registry(&["A", "B", "C"]);
        let source = source(&["A", "B", "C"]).failing("B_STOPS");

        let merged = Aggregator::new(&registry, &source).fetch_all().await.unwrap();

        assert_eq!(srcs(&merged.stops), vec!["A", "C"]);
        assert_eq!(srcs(&merged.lines), vec!["A", "C"]);
        assert!(!merged.is_complete());
        assert_eq!(merged.failures.len(), 1);
        assert_eq!(merged.failures[0].mode, "B");
        assert_eq!(merged.failures[0].kind(), ErrorKind::Transport);
    }

    #[tokio::test]
    async fn test_malformed_payload_is_skipped() {
        let registry = registry(&["A", "B"]);
        let source = source(&["A"])
            .with_body("B_STOPS", "<html>Bad Gateway</html>")
            .with("B_LINES", vec![]);

        let merged = Aggregator::new(&registry, &source).fetch_all().await.unwrap();

        assert_eq!(srcs(&merged.stops), vec!["A"]);
        assert_eq!(merged.failures[0].mode, "B");
        assert_eq!(merged.failures[0].kind(), ErrorKind::Transport);
    }

    #[tokio::test]
    async fn test_abort() {
        let registry = registry(&["A", "B", "C"]);
        let source = source(&["A", "B", "C"]).failing("B_LINES");

        let err = Aggregator::new(&registry, &source)
            .policy(FailurePolicy::Abort)
            .fetch_all()
            .await
            .unwrap_err();

        assert!(matches!(err, TransitError::Fetch { mode, .. } if mode == "B"));
        // C is never requested when fetching sequentially
        assert!(!source.requests().iter().any(|url| url.contains("C_")));
    }

    #[tokio::test]
    async fn test_unknown_mode_in_subset_is_reported() {
        let registry = registry(&["A"]);
        let source = source(&["A"]);

        let merged = Aggregator::new(&registry, &source)
            .fetch_modes(&["A", "nonexistent-mode"])
            .await
            .unwrap();

        assert_eq!(srcs(&merged.stops), vec!["A"]);
        assert_eq!(merged.failures[0].mode, "nonexistent-mode");
        assert_eq!(merged.failures[0].kind(), ErrorKind::Lookup);
    }

    #[tokio::test]
    async fn test_empty_registry() {
        let registry = Registry::new();
        let source = MemorySource::new();

        let merged = Aggregator::new(&registry, &source).fetch_all().await.unwrap();

        assert!(merged.stops.features.is_empty());
        assert!(merged.lines.features.is_empty());
        assert!(merged.stops.bbox.is_none());
        assert!(merged.is_complete());
    }

    #[tokio::test]
    async fn test_duplicates_are_kept() {
        let registry = registry(&["A", "B"]);
        let source = source(&["A", "B"]);

        let merged = Aggregator::new(&registry, &source).fetch_all().await.unwrap();

        // same coordinates from both modes, distinguished only by src
        let features = &merged.stops.features;
        assert_eq!(features[0].geometry, features[1].geometry);
        assert_ne!(
            features[0].property(SOURCE_PROPERTY),
            features[1].property(SOURCE_PROPERTY)
        );
    }

    #[tokio::test]
    async fn test_repeated_mode_is_fetched_once() {
        let registry = registry(&["A", "B"]);
        let source = source(&["A", "B"]);

        let merged = Aggregator::new(&registry, &source)
            .fetch_modes(&["B", "A", "B"])
            .await
            .unwrap();

        assert_eq!(srcs(&merged.stops), vec!["B", "A"]);
        assert_eq!(srcs(&merged.lines), vec!["B", "A"]);
        assert_eq!(merged.modes.len(), 2);
        assert_eq!(source.requests().len(), 4);
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("skip".parse::<FailurePolicy>().unwrap(), FailurePolicy::SkipAndReport);
        assert_eq!("ABORT".parse::<FailurePolicy>().unwrap(), FailurePolicy::Abort);
        assert_eq!(
            "retry".parse::<FailurePolicy>().unwrap_err(),
            ParsePolicyError("retry".to_string())
        );
    }
}
