//! GeoJSON export of a synthesized trench network, for handing the
//! geometry to downstream tooling and viewers.

use geojson::{Feature, FeatureCollection, Geometry, GeometryValue};
use serde_json::json;

use crate::model::EdgeKind;
use crate::synthesis::TrenchNetwork;
use crate::{Error, model::TrenchCorner, model::TrenchEdge};

impl TrenchNetwork {
    /// Converts the network to a GeoJSON `FeatureCollection`: one point
    /// feature per corner and one linestring feature per trench edge.
    pub fn to_geojson(&self) -> FeatureCollection {
        let mut features = Vec::with_capacity(self.corners.len() + self.edges.len());
        for corner in &self.corners {
            features.push(corner_feature(corner));
        }
        for edge in &self.edges {
            features.push(edge_feature(edge));
        }
        FeatureCollection {
            features,
            bbox: None,
            foreign_members: None,
        }
    }

    /// # Errors
    ///
    /// Returns an error if the collection fails to serialize.
    pub fn to_geojson_string(&self) -> Result<String, Error> {
        serde_json::to_string(&self.to_geojson()).map_err(|e| Error::GeoJsonError(e.to_string()))
    }
}

fn corner_feature(corner: &TrenchCorner) -> Feature {
    let properties = json!({
        "feature_type": "trench_corner",
        "corner_id": corner.id.0,
        "intersection": corner.intersection.0,
        "degree": corner.degree,
    });
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(GeometryValue::from(&corner.geometry))),
        id: None,
        properties: properties.as_object().cloned(),
        foreign_members: None,
    }
}

fn edge_feature(edge: &TrenchEdge) -> Feature {
    let kind = match edge.kind {
        EdgeKind::Crossing => "crossing",
        _ => "trench",
    };
    let properties = json!({
        "feature_type": kind,
        "start": edge.start.0,
        "end": edge.end.0,
        "length": edge.length,
    });
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(GeometryValue::from(&edge.geometry))),
        id: None,
        properties: properties.as_object().cloned(),
        foreign_members: None,
    }
}
