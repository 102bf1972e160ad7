use crate::geo::{circle_polygon, LatLon};
use crate::viewport::MapCandidate;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: [f64; 2] },
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: String,
    pub geometry: Geometry,
}

impl Feature {
    fn new(geometry: Geometry) -> Self {
        Self {
            kind: "Feature".into(),
            geometry,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: String,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: "FeatureCollection".into(),
            features,
        }
    }

    /// Pure mapping from point records to point features. Coordinates are
    /// emitted GeoJSON-style as [lon, lat].
    pub fn points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = LatLon>,
    {
        let features = points
            .into_iter()
            .map(|p| Feature::new(Geometry::Point {
                coordinates: [p.lon, p.lat],
            }))
            .collect();
        Self::new(features)
    }

    /// Geodesic circles for each incident's own radius. The selected
    /// incident is excluded so its focus rendering is not doubled.
    pub fn incident_circles(candidates: &[MapCandidate], selected: Option<&str>) -> Self {
        let features = candidates
            .iter()
            .filter(|c| selected != Some(c.id.as_str()))
            .map(|c| {
                let ring = circle_polygon(c.center, c.radius_m, 64)
                    .into_iter()
                    .map(|p| [p.lon, p.lat])
                    .collect();
                Feature::new(Geometry::Polygon {
                    coordinates: vec![ring],
                })
            })
            .collect();
        Self::new(features)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates() -> Vec<MapCandidate> {
        vec![
            MapCandidate {
                id: "0".into(),
                center: LatLon::new(50.5652165, 9.6861753),
                radius_m: 30.0,
            },
            MapCandidate {
                id: "1".into(),
                center: LatLon::new(50.561469999275005, 9.704481903105375),
                radius_m: 60.0,
            },
        ]
    }

    #[test]
    fn point_derivation_is_idempotent() {
        let points = vec![
            LatLon::new(50.56519975931357, 9.685875926986967),
            LatLon::new(50.56560835807784, 9.686164571163602),
        ];

        let a = FeatureCollection::points(points.clone());
        let b = FeatureCollection::points(points);
        assert_eq!(
            serde_json::to_value(&a).expect("a"),
            serde_json::to_value(&b).expect("b")
        );
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn point_features_use_lon_lat_order() {
        let fc = FeatureCollection::points(vec![LatLon::new(50.0, 9.0)]);
        let json = serde_json::to_value(&fc).expect("json");
        assert_eq!(json["type"], "FeatureCollection");
        assert_eq!(json["features"][0]["geometry"]["type"], "Point");
        assert_eq!(json["features"][0]["geometry"]["coordinates"][0], 9.0);
        assert_eq!(json["features"][0]["geometry"]["coordinates"][1], 50.0);
    }

    #[test]
    fn selected_incident_is_excluded_from_circles() {
        let all = FeatureCollection::incident_circles(&candidates(), None);
        assert_eq!(all.len(), 2);

        let without_selected = FeatureCollection::incident_circles(&candidates(), Some("0"));
        assert_eq!(without_selected.len(), 1);
    }

    #[test]
    fn circle_rings_are_closed() {
        let fc = FeatureCollection::incident_circles(&candidates(), None);
        let Geometry::Polygon { coordinates } = &fc.features[0].geometry else {
            panic!("expected polygon");
        };
        let ring = &coordinates[0];
        assert_eq!(ring.first(), ring.last());
    }
}
