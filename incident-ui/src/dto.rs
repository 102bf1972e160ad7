use dispatch_core::features::FeatureCollection;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct IncidentDto {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub delegated_to: Option<String>,
    pub delegate_name: String,
    pub lat: f64,
    pub lon: f64,
    pub radius_m: f64,
    pub reported_at: String,
    pub done: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DelegateDto {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MapFeaturesDto {
    pub incidents: FeatureCollection,
    pub incident_circles: FeatureCollection,
    pub sensors: FeatureCollection,
    pub helpers: FeatureCollection,
    pub victims: FeatureCollection,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DirectionsDto {
    pub route: Vec<[f64; 2]>,
    pub distance_m: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PinDto {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    pub image_url: String,
}
