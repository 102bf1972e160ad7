use crate::config::GatewayConfig;
use dispatch_core::geo::LatLon;
use dispatch_core::incidents::{Delegate, Incident};
use dispatch_core::live::PointRecord;
use feature_registry::{validate_incident_v1, CanonicalIncidentV1};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewIncident {
    pub title: String,
    pub description: String,
    pub priority: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(rename = "radius")]
    pub radius_m: f64,
    pub delegated_to: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DirectionsRoute {
    /// Polyline as [lon, lat] pairs.
    pub route: Vec<[f64; 2]>,
    /// Total distance in meters.
    pub distance: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Pin {
    pub id: String,
    pub lat: f64,
    #[serde(rename = "long")]
    pub lon: f64,
    pub image_url: String,
}

/// Blocking REST client for the incident and pin services. Every call takes
/// its base URL from the config captured at construction.
pub struct ApiClient {
    http: reqwest::blocking::Client,
    config: GatewayConfig,
}

impl ApiClient {
    pub fn new(config: GatewayConfig) -> Result<Self, String> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| e.to_string())?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn list_incidents(&self) -> Result<Vec<Incident>, String> {
        self.get_json(&format!("{}/api/v1/incidents", self.config.api_base))
    }

    pub fn get_incident(&self, id: &str) -> Result<Incident, String> {
        self.get_json(&format!("{}/api/v1/incidents/{id}", self.config.api_base))
    }

    /// Records authored here must be well-formed; listings stay lenient so
    /// unknown values written by other clients still render.
    pub fn create_incident(&self, incident: &NewIncident) -> Result<Incident, String> {
        let url = format!("{}/api/v1/incidents", self.config.api_base);
        let response = self
            .http
            .post(&url)
            .json(incident)
            .send()
            .map_err(|e| e.to_string())?;
        let created: Incident = decode(response)?;
        validate_incident_v1(&canonical_incident(&created))?;
        Ok(created)
    }

    /// The service takes the new status as a query parameter, not a body.
    pub fn update_status(&self, id: &str, status: &str) -> Result<Incident, String> {
        let url = format!(
            "{}/api/v1/incidents/{id}/status",
            self.config.api_base
        );
        let response = self
            .http
            .patch(&url)
            .query(&[("status", status)])
            .send()
            .map_err(|e| e.to_string())?;
        decode(response)
    }

    pub fn update_delegate(&self, id: &str, delegate_id: Option<&str>) -> Result<Incident, String> {
        let url = format!(
            "{}/api/v1/incidents/{id}/delegate",
            self.config.api_base
        );
        let mut request = self.http.patch(&url);
        if let Some(delegate_id) = delegate_id {
            request = request.query(&[("delegate_id", delegate_id)]);
        }
        let response = request.send().map_err(|e| e.to_string())?;
        decode(response)
    }

    pub fn list_delegates(&self) -> Result<Vec<Delegate>, String> {
        self.get_json(&format!("{}/api/v1/delegates", self.config.api_base))
    }

    pub fn create_delegate(&self, name: &str) -> Result<Delegate, String> {
        let url = format!("{}/api/v1/delegates", self.config.api_base);
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "name": name }))
            .send()
            .map_err(|e| e.to_string())?;
        decode(response)
    }

    pub fn sensors(&self) -> Result<Vec<PointRecord>, String> {
        self.get_json(&format!("{}/api/v1/map/sensors", self.config.api_base))
    }

    pub fn helpers(&self) -> Result<Vec<PointRecord>, String> {
        self.get_json(&format!("{}/api/v1/map/helpers", self.config.api_base))
    }

    pub fn victims(&self) -> Result<Vec<PointRecord>, String> {
        self.get_json(&format!("{}/api/v1/map/victims", self.config.api_base))
    }

    pub fn calculate_directions(&self, start: LatLon, end: LatLon) -> Result<DirectionsRoute, String> {
        let url = format!("{}/api/directions", self.config.pin_api_base);
        let body = serde_json::json!({
            "start": { "lat": start.lat, "lon": start.lon },
            "end": { "lat": end.lat, "lon": end.lon },
        });
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| e.to_string())?;
        decode(response)
    }

    pub fn list_pins(&self) -> Result<Vec<Pin>, String> {
        self.get_json(&format!("{}/api/pins", self.config.pin_api_base))
    }

    /// Photo upload as multipart form data: `lat`, `long`, `img`.
    pub fn upload_pin(
        &self,
        position: LatLon,
        file_name: &str,
        image: Vec<u8>,
    ) -> Result<Pin, String> {
        let url = format!("{}/api/pins", self.config.pin_api_base);
        let part = reqwest::blocking::multipart::Part::bytes(image)
            .file_name(file_name.to_string());
        let form = reqwest::blocking::multipart::Form::new()
            .text("lat", position.lat.to_string())
            .text("long", position.lon.to_string())
            .part("img", part);

        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .map_err(|e| e.to_string())?;
        decode(response)
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, String> {
        let response = self.http.get(url).send().map_err(|e| e.to_string())?;
        decode(response)
    }
}

fn decode<T: serde::de::DeserializeOwned>(
    response: reqwest::blocking::Response,
) -> Result<T, String> {
    let status = response.status();
    if !status.is_success() {
        return Err(format!("request failed with status {status}"));
    }
    response.json::<T>().map_err(|e| e.to_string())
}

fn canonical_incident(incident: &Incident) -> CanonicalIncidentV1 {
    CanonicalIncidentV1 {
        schema: "incident.v1".into(),
        id: incident.id.clone(),
        title: incident.title.clone(),
        priority: incident.priority.clone(),
        status: incident.status.clone(),
        delegated_to: incident.delegated_to.clone(),
        lat: incident.lat,
        lon: incident.lon,
        radius_m: incident.radius_m,
        reported_at: incident.reported_at.clone(),
    }
}

/// Substitute z/x/y into an externally templated tile URL.
pub fn tile_url(template: &str, z: u32, x: u32, y: u32) -> String {
    template
        .replace("{z}", &z.to_string())
        .replace("{x}", &x.to_string())
        .replace("{y}", &y.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_url_substitutes_all_placeholders() {
        let url = tile_url("https://tiles.example/{z}/{x}/{y}.png", 14, 8593, 5548);
        assert_eq!(url, "https://tiles.example/14/8593/5548.png");
    }

    #[test]
    fn incident_wire_shape_round_trips() {
        let json = serde_json::json!({
            "id": "1",
            "title": "flooded underpass",
            "description": "pump failure",
            "priority": "medium",
            "status": "in_progress",
            "delegated_to": "D1",
            "lat": 50.5652165,
            "lon": 9.6861753,
            "radius": 60.0,
            "reported_at": "2024-05-01T12:00:00Z"
        });

        let incident: Incident = serde_json::from_value(json).expect("decode");
        assert_eq!(incident.radius_m, 60.0);
        assert_eq!(incident.delegated_to.as_deref(), Some("D1"));

        let back = serde_json::to_value(&incident).expect("encode");
        assert_eq!(back["radius"], 60.0);
    }

    #[test]
    fn authored_incidents_are_checked_against_the_canonical_shape() {
        let mut incident = Incident {
            id: "1".into(),
            title: "tree on road".into(),
            priority: "high".into(),
            status: "open".into(),
            lat: 50.5652165,
            lon: 9.6861753,
            radius_m: 30.0,
            reported_at: "2024-05-01T12:00:00Z".into(),
            ..Incident::default()
        };
        assert!(validate_incident_v1(&canonical_incident(&incident)).is_ok());

        incident.priority = "urgent".into();
        assert!(validate_incident_v1(&canonical_incident(&incident)).is_err());
    }

    #[test]
    fn pin_wire_shape_uses_long_for_longitude() {
        let json = serde_json::json!({
            "id": "p1",
            "lat": 50.56,
            "long": 9.68,
            "image_url": "/uploads/images/photo_1.jpg"
        });
        let pin: Pin = serde_json::from_value(json).expect("decode");
        assert_eq!(pin.lon, 9.68);
    }
}
