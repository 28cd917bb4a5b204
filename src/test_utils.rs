use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use geojson::{Feature, FeatureCollection, GeoJson, Geometry, Value};

use crate::geo::SOURCE_PROPERTY;
use crate::portal::client::parse_collection;
use crate::portal::url::build_url;
use crate::portal::{FetchError, FetchResult, GeoJsonSource};

pub fn init() {
    env_logger::builder().is_test(true).try_init().ok();
}

/// Serves canned response bodies by dataset identifier.
///
/// Unknown identifiers answer 404, identifiers marked with [`MemorySource::failing`] answer 500.
#[derive(Default)]
pub struct MemorySource {
    bodies: HashMap<String, String>,
    failing: HashSet<String>,
    requests: Mutex<Vec<String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, identifier: &str, features: Vec<Feature>) -> Self {
        let body = GeoJson::from(FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        })
        .to_string();
        self.with_body(identifier, &body)
    }

    pub fn with_body(mut self, identifier: &str, body: &str) -> Self {
        self.bodies.insert(build_url(identifier), body.to_string());
        self
    }

    pub fn failing(mut self, identifier: &str) -> Self {
        self.failing.insert(build_url(identifier));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl GeoJsonSource for MemorySource {
    async fn get_collection(&self, url: &str) -> FetchResult<FeatureCollection> {
        self.requests.lock().unwrap().push(url.to_string());

        let status = |status| FetchError::Status {
            url: url.to_string(),
            status,
        };

        if self.failing.contains(url) {
            return Err(status(500));
        }

        let body = self.bodies.get(url).ok_or_else(|| status(404))?;
        parse_collection(body, url)
    }
}

fn feature(value: Value) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: None,
        foreign_members: None,
    }
}

pub fn point_feature(x: f64, y: f64) -> Feature {
    feature(Value::Point(vec![x, y]))
}

pub fn multipoint_feature(points: &[(f64, f64)]) -> Feature {
    feature(Value::MultiPoint(
        points.iter().map(|(x, y)| vec![*x, *y]).collect(),
    ))
}

pub fn line_feature(points: &[(f64, f64)]) -> Feature {
    feature(Value::LineString(
        points.iter().map(|(x, y)| vec![*x, *y]).collect(),
    ))
}

pub fn src_of(feature: &Feature) -> Option<&str> {
    feature.property(SOURCE_PROPERTY).and_then(|v| v.as_str())
}
