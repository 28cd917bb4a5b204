use geo::{BoundingRect, Geometry, MultiPoint, Rect};
use geojson::{Feature, FeatureCollection};
use itertools::{Either, Itertools};

/// Property added to every downloaded feature, holding the mode it came from
pub const SOURCE_PROPERTY: &str = "src";

pub fn tag_source(collection: &mut FeatureCollection, mode: &str) {
    for feature in collection.features.iter_mut() {
        feature.set_property(SOURCE_PROPERTY, mode);
    }
}

/// Split every MultiPoint feature into one Point feature per part.
///
/// Point features (and anything that isn't a MultiPoint) come first, unchanged,
/// followed by the exploded points. Each exploded point keeps its parent's
/// properties and the parts stay in their original order.
pub fn explode_multipoints(collection: FeatureCollection) -> FeatureCollection {
    let FeatureCollection {
        bbox,
        features,
        foreign_members,
    } = collection;

    let (mut passthrough, exploded): (Vec<Feature>, Vec<Vec<Feature>>) =
        features.into_iter().partition_map(|feature| match as_multipoint(&feature) {
            Some(multipoint) => Either::Right(explode(&feature, &multipoint)),
            None => Either::Left(feature),
        });

    passthrough.extend(exploded.into_iter().flatten());

    FeatureCollection {
        bbox,
        features: passthrough,
        foreign_members,
    }
}

fn as_multipoint(feature: &Feature) -> Option<MultiPoint> {
    let geometry = feature.geometry.as_ref()?;
    match &geometry.value {
        geojson::Value::MultiPoint(_) => MultiPoint::try_from(geometry.value.clone()).ok(),
        _ => None,
    }
}

fn explode(parent: &Feature, multipoint: &MultiPoint) -> Vec<Feature> {
    if multipoint.0.is_empty() {
        log::debug!("Dropping empty MultiPoint feature {:?}", parent.id);
    }

    multipoint
        .iter()
        .map(|point| Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::from(point))),
            id: parent.id.clone(),
            properties: parent.properties.clone(),
            foreign_members: parent.foreign_members.clone(),
        })
        .collect()
}

/// Smallest rectangle containing every feature geometry in the collection
pub fn collection_bounds(collection: &FeatureCollection) -> Option<Rect> {
    collection
        .features
        .iter()
        .filter_map(|feature| feature.geometry.as_ref())
        .filter_map(|geometry| Geometry::<f64>::try_from(geometry.value.clone()).ok())
        .filter_map(|geometry| geometry.bounding_rect())
        .reduce(|a, b| {
            Rect::new(
                (a.min().x.min(b.min().x), a.min().y.min(b.min().y)),
                (a.max().x.max(b.max().x), a.max().y.max(b.max().y)),
            )
        })
}
