use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CanonicalIncidentV1 {
    pub schema: String,
    pub id: String,
    pub title: String,
    pub priority: String,
    pub status: String,
    pub delegated_to: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub radius_m: f64,
    pub reported_at: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CanonicalPointV1 {
    pub schema: String,
    pub id: Option<String>,
    pub kind: String,
    pub lat: f64,
    pub lon: f64,
    pub recorded_at: String,
}

fn validate_coordinates(lat: f64, lon: f64) -> Result<(), String> {
    if !lat.is_finite() || !lon.is_finite() {
        return Err("coordinates must be finite".into());
    }
    if !(-90.0..=90.0).contains(&lat) {
        return Err(format!("latitude {lat} out of range"));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(format!("longitude {lon} out of range"));
    }
    Ok(())
}

pub fn validate_incident_v1(incident: &CanonicalIncidentV1) -> Result<(), String> {
    if incident.schema != "incident.v1" {
        return Err(format!("unsupported schema '{}'", incident.schema));
    }
    if incident.id.trim().is_empty() {
        return Err("id is required".into());
    }
    if incident.title.trim().is_empty() {
        return Err("title is required".into());
    }
    match incident.priority.to_lowercase().as_str() {
        "low" | "medium" | "high" => {}
        other => return Err(format!("invalid priority '{other}'")),
    }
    match incident.status.to_lowercase().as_str() {
        "open" | "in_progress" | "done" | "closed" => {}
        other => return Err(format!("invalid status '{other}'")),
    }
    if !incident.radius_m.is_finite() || incident.radius_m < 0.0 {
        return Err(format!("invalid radius {}", incident.radius_m));
    }
    validate_coordinates(incident.lat, incident.lon)
}

pub fn validate_point_v1(point: &CanonicalPointV1) -> Result<(), String> {
    if point.schema != "point.v1" {
        return Err(format!("unsupported schema '{}'", point.schema));
    }
    match point.kind.to_lowercase().as_str() {
        "sensor" | "helper" | "victim" => {}
        other => return Err(format!("invalid kind '{other}'")),
    }
    validate_coordinates(point.lat, point.lon)
}
