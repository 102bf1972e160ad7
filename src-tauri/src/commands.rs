use crate::state::{lock, AppState};
use dispatch_core::features::FeatureCollection;
use dispatch_core::geo::LatLon;
use dispatch_core::incidents::{Delegate, Incident, Status};
use dispatch_core::list_engine::{filter_and_sort, DelegateFilter, OrderBy, StatusFilter};
use dispatch_core::live::PointRecord;
use dispatch_core::viewport::MapCandidate;
use dispatch_gateway::client::NewIncident;
use dispatch_gateway::stream::StreamKind;
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

/// Filter and order the cached incident list. Pure over the cache; callers
/// refresh first when they want a fresh snapshot.
pub fn list_incidents(
    state: &AppState,
    status_filter: String,
    delegate_filter: Option<String>,
    order_by: String,
) -> Result<Vec<IncidentDto>, String> {
    let status = StatusFilter::parse(&status_filter);
    let delegate = match delegate_filter {
        None => DelegateFilter::All,
        Some(id) if id.is_empty() || id.eq_ignore_ascii_case("all") => DelegateFilter::All,
        Some(id) => DelegateFilter::Delegate(id),
    };
    let order = OrderBy::parse(&order_by);

    let incidents = lock(&state.incidents)?.incidents().to_vec();
    let directory = lock(&state.delegates)?.clone();

    let ordered = filter_and_sort(&incidents, status, &delegate, order);
    Ok(ordered
        .into_iter()
        .map(|i| to_dto(i, &directory))
        .collect())
}

pub fn get_incident(state: &AppState, incident_id: String) -> Result<IncidentDto, String> {
    let directory = lock(&state.delegates)?.clone();
    lock(&state.incidents)?
        .get(&incident_id)
        .cloned()
        .map(|i| to_dto(i, &directory))
        .ok_or_else(|| format!("unknown incident '{incident_id}'"))
}

/// Fetch-through: pull the remote list into the local cache. Failures leave
/// the previous cache contents in place.
pub fn refresh_incidents(state: &AppState) -> Result<usize, String> {
    let incidents = state.client.list_incidents()?;
    let count = incidents.len();
    lock(&state.incidents)?.replace_all(incidents);
    Ok(count)
}

pub fn refresh_delegates(state: &AppState) -> Result<usize, String> {
    let delegates = state.client.list_delegates()?;
    let count = delegates.len();
    let mut directory = lock(&state.delegates)?;
    for delegate in delegates {
        directory.insert(delegate);
    }
    Ok(count)
}

pub fn refresh_map_snapshots(state: &AppState) -> Result<(), String> {
    let sensors = state.client.sensors()?;
    let helpers = state.client.helpers()?;
    let victims = state.client.victims()?;
    load_snapshot(state, StreamKind::Sensors, sensors)?;
    lock(&state.helpers)?.replace_snapshot(helpers);
    load_snapshot(state, StreamKind::Victims, victims)?;
    Ok(())
}

pub fn create_incident(
    state: &AppState,
    title: String,
    description: String,
    priority: String,
    lat: f64,
    lon: f64,
    radius_m: f64,
    delegated_to: Option<String>,
) -> Result<IncidentDto, String> {
    let created = state.client.create_incident(&NewIncident {
        title,
        description,
        priority,
        lat,
        lon,
        radius_m,
        delegated_to,
    })?;

    lock(&state.incidents)?.insert(created.clone());
    let directory = lock(&state.delegates)?.clone();
    Ok(to_dto(created, &directory))
}

pub fn change_status(
    state: &AppState,
    incident_id: String,
    status: String,
) -> Result<IncidentDto, String> {
    change_status_with(state, &incident_id, &status, |id, status| {
        state.client.update_status(id, status).map(|_| ())
    })
}

pub fn mark_done(state: &AppState, incident_id: String) -> Result<IncidentDto, String> {
    change_status(state, incident_id, "done".into())
}

/// Apply the status change optimistically, then confirm against the
/// service; a failed confirmation restores the pre-mutation snapshot and
/// surfaces the error instead of leaving local and remote state divergent.
pub fn change_status_with(
    state: &AppState,
    incident_id: &str,
    status: &str,
    confirm: impl FnOnce(&str, &str) -> Result<(), String>,
) -> Result<IncidentDto, String> {
    let pending = lock(&state.incidents)?
        .change_status(incident_id, status)
        .ok_or_else(|| format!("unknown incident '{incident_id}'"))?;

    match confirm(incident_id, status) {
        Ok(()) => {
            pending.commit();
            get_incident(state, incident_id.to_string())
        }
        Err(err) => {
            lock(&state.incidents)?.rollback(pending);
            Err(format!("status update failed: {err}"))
        }
    }
}

pub fn delegate_incident(
    state: &AppState,
    incident_id: String,
    delegate_id: Option<String>,
) -> Result<IncidentDto, String> {
    delegate_incident_with(state, &incident_id, delegate_id, |id, delegate| {
        state.client.update_delegate(id, delegate).map(|_| ())
    })
}

pub fn delegate_incident_with(
    state: &AppState,
    incident_id: &str,
    delegate_id: Option<String>,
    confirm: impl FnOnce(&str, Option<&str>) -> Result<(), String>,
) -> Result<IncidentDto, String> {
    let pending = lock(&state.incidents)?
        .delegate_to(incident_id, delegate_id.clone())
        .ok_or_else(|| format!("unknown incident '{incident_id}'"))?;

    match confirm(incident_id, delegate_id.as_deref()) {
        Ok(()) => {
            pending.commit();
            get_incident(state, incident_id.to_string())
        }
        Err(err) => {
            lock(&state.incidents)?.rollback(pending);
            Err(format!("delegate update failed: {err}"))
        }
    }
}

pub fn list_delegates(state: &AppState) -> Result<Vec<DelegateDto>, String> {
    let incidents = lock(&state.incidents)?.incidents().to_vec();
    let directory = lock(&state.delegates)?.clone();

    // Known ids come from the directory; incidents referencing unknown ids
    // still get an entry so the filter dropdown can select them.
    let mut out: Vec<DelegateDto> = directory
        .entries()
        .map(|d| DelegateDto {
            id: d.id,
            name: d.name,
        })
        .collect();
    for incident in &incidents {
        if let Some(id) = &incident.delegated_to {
            if !out.iter().any(|d| &d.id == id) {
                out.push(DelegateDto {
                    id: id.clone(),
                    name: directory.display_name(Some(id)),
                });
            }
        }
    }
    out.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(out)
}

pub fn create_delegate(state: &AppState, name: String) -> Result<DelegateDto, String> {
    let created = state.client.create_delegate(&name)?;
    let dto = DelegateDto {
        id: created.id.clone(),
        name: created.name.clone(),
    };
    lock(&state.delegates)?.insert(created);
    Ok(dto)
}

/// Derive the render-ready feature collections from the cached state.
/// Recomputable from the same inputs with no side effects.
pub fn map_features(
    state: &AppState,
    selected: Option<String>,
) -> Result<MapFeaturesDto, String> {
    let candidates = map_candidates(state)?;

    let incidents = FeatureCollection::points(candidates.iter().map(|c| c.center));
    let incident_circles =
        FeatureCollection::incident_circles(&candidates, selected.as_deref());
    let sensors = FeatureCollection::points(lock(&state.sensors)?.positions());
    let helpers = FeatureCollection::points(lock(&state.helpers)?.positions());
    let victims = FeatureCollection::points(lock(&state.victims)?.positions());

    Ok(MapFeaturesDto {
        incidents,
        incident_circles,
        sensors,
        helpers,
        victims,
    })
}

pub fn map_candidates(state: &AppState) -> Result<Vec<MapCandidate>, String> {
    Ok(lock(&state.incidents)?
        .incidents()
        .iter()
        .filter(|i| !Status::is_done(&i.status))
        .map(|i| MapCandidate {
            id: i.id.clone(),
            center: LatLon::new(i.lat, i.lon),
            radius_m: i.radius_m,
        })
        .collect())
}

pub fn calculate_directions(
    state: &AppState,
    start_lat: f64,
    start_lon: f64,
    end_lat: f64,
    end_lon: f64,
) -> Result<DirectionsDto, String> {
    let route = state.client.calculate_directions(
        LatLon::new(start_lat, start_lon),
        LatLon::new(end_lat, end_lon),
    )?;
    Ok(DirectionsDto {
        route: route.route,
        distance_m: route.distance,
    })
}

pub fn list_pins(state: &AppState) -> Result<Vec<PinDto>, String> {
    let pins = state.client.list_pins()?;
    Ok(pins
        .into_iter()
        .map(|p| PinDto {
            id: p.id,
            lat: p.lat,
            lon: p.lon,
            image_url: p.image_url,
        })
        .collect())
}

pub fn upload_pin(
    state: &AppState,
    lat: f64,
    lon: f64,
    file_name: String,
    image: Vec<u8>,
) -> Result<PinDto, String> {
    let pin = state
        .client
        .upload_pin(LatLon::new(lat, lon), &file_name, image)?;
    Ok(PinDto {
        id: pin.id,
        lat: pin.lat,
        lon: pin.lon,
        image_url: pin.image_url,
    })
}

pub fn load_incidents(state: &AppState, incidents: Vec<Incident>) -> Result<(), String> {
    lock(&state.incidents)?.replace_all(incidents);
    Ok(())
}

pub fn load_delegates(state: &AppState, delegates: Vec<Delegate>) -> Result<(), String> {
    let mut directory = lock(&state.delegates)?;
    for delegate in delegates {
        directory.insert(delegate);
    }
    Ok(())
}

pub fn load_snapshot(
    state: &AppState,
    kind: StreamKind,
    records: Vec<PointRecord>,
) -> Result<(), String> {
    let set = match kind {
        StreamKind::Sensors => &state.sensors,
        StreamKind::Victims => &state.victims,
    };
    lock(set)?.replace_snapshot(records);
    Ok(())
}

fn to_dto(incident: Incident, directory: &dispatch_core::incidents::DelegateDirectory) -> IncidentDto {
    let done = Status::is_done(&incident.status);
    IncidentDto {
        delegate_name: directory.display_name(incident.delegated_to.as_deref()),
        id: incident.id,
        title: incident.title,
        description: incident.description,
        status: incident.status,
        priority: incident.priority,
        delegated_to: incident.delegated_to,
        lat: incident.lat,
        lon: incident.lon,
        radius_m: incident.radius_m,
        reported_at: incident.reported_at,
        done,
    }
}

#[cfg(feature = "tauri-app")]
#[tauri::command(rename_all = "camelCase")]
pub fn list_incidents_cmd(
    state: tauri::State<'_, AppState>,
    status_filter: String,
    delegate_filter: Option<String>,
    order_by: String,
) -> Result<Vec<IncidentDto>, String> {
    list_incidents(&state, status_filter, delegate_filter, order_by)
}

#[cfg(feature = "tauri-app")]
#[tauri::command(rename_all = "camelCase")]
pub fn get_incident_cmd(
    state: tauri::State<'_, AppState>,
    incident_id: String,
) -> Result<IncidentDto, String> {
    get_incident(&state, incident_id)
}

#[cfg(feature = "tauri-app")]
#[tauri::command(rename_all = "camelCase")]
pub fn refresh_incidents_cmd(state: tauri::State<'_, AppState>) -> Result<usize, String> {
    refresh_incidents(&state)
}

#[cfg(feature = "tauri-app")]
#[tauri::command(rename_all = "camelCase")]
pub fn refresh_map_cmd(state: tauri::State<'_, AppState>) -> Result<(), String> {
    refresh_map_snapshots(&state)
}

#[cfg(feature = "tauri-app")]
#[tauri::command(rename_all = "camelCase")]
pub fn create_incident_cmd(
    state: tauri::State<'_, AppState>,
    title: String,
    description: String,
    priority: String,
    lat: f64,
    lon: f64,
    radius_m: f64,
    delegated_to: Option<String>,
) -> Result<IncidentDto, String> {
    create_incident(
        &state,
        title,
        description,
        priority,
        lat,
        lon,
        radius_m,
        delegated_to,
    )
}

#[cfg(feature = "tauri-app")]
#[tauri::command(rename_all = "camelCase")]
pub fn change_status_cmd(
    state: tauri::State<'_, AppState>,
    incident_id: String,
    status: String,
) -> Result<IncidentDto, String> {
    change_status(&state, incident_id, status)
}

#[cfg(feature = "tauri-app")]
#[tauri::command(rename_all = "camelCase")]
pub fn mark_done_cmd(
    state: tauri::State<'_, AppState>,
    incident_id: String,
) -> Result<IncidentDto, String> {
    mark_done(&state, incident_id)
}

#[cfg(feature = "tauri-app")]
#[tauri::command(rename_all = "camelCase")]
pub fn delegate_incident_cmd(
    state: tauri::State<'_, AppState>,
    incident_id: String,
    delegate_id: Option<String>,
) -> Result<IncidentDto, String> {
    delegate_incident(&state, incident_id, delegate_id)
}

#[cfg(feature = "tauri-app")]
#[tauri::command(rename_all = "camelCase")]
pub fn list_delegates_cmd(state: tauri::State<'_, AppState>) -> Result<Vec<DelegateDto>, String> {
    refresh_delegates(&state).ok();
    list_delegates(&state)
}

#[cfg(feature = "tauri-app")]
#[tauri::command(rename_all = "camelCase")]
pub fn create_delegate_cmd(
    state: tauri::State<'_, AppState>,
    name: String,
) -> Result<DelegateDto, String> {
    create_delegate(&state, name)
}

#[cfg(feature = "tauri-app")]
#[tauri::command(rename_all = "camelCase")]
pub fn map_features_cmd(
    state: tauri::State<'_, AppState>,
    selected: Option<String>,
) -> Result<MapFeaturesDto, String> {
    map_features(&state, selected)
}

#[cfg(feature = "tauri-app")]
#[tauri::command(rename_all = "camelCase")]
pub fn calculate_directions_cmd(
    state: tauri::State<'_, AppState>,
    start_lat: f64,
    start_lon: f64,
    end_lat: f64,
    end_lon: f64,
) -> Result<DirectionsDto, String> {
    calculate_directions(&state, start_lat, start_lon, end_lat, end_lon)
}

#[cfg(feature = "tauri-app")]
#[tauri::command(rename_all = "camelCase")]
pub fn list_pins_cmd(state: tauri::State<'_, AppState>) -> Result<Vec<PinDto>, String> {
    list_pins(&state)
}

#[cfg(feature = "tauri-app")]
#[tauri::command(rename_all = "camelCase")]
pub fn upload_pin_cmd(
    state: tauri::State<'_, AppState>,
    lat: f64,
    lon: f64,
    file_name: String,
    image: Vec<u8>,
) -> Result<PinDto, String> {
    upload_pin(&state, lat, lon, file_name, image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_state;
    use dispatch_core::incidents::Delegate;

    fn incident(id: &str, status: &str, priority: &str, reported_at: &str) -> Incident {
        Incident {
            id: id.into(),
            title: format!("incident {id}"),
            status: status.into(),
            priority: priority.into(),
            lat: 50.5652165,
            lon: 9.6861753,
            radius_m: 30.0,
            reported_at: reported_at.into(),
            ..Incident::default()
        }
    }

    fn seeded_state() -> AppState {
        let (state, _channels) = build_state().expect("state");
        load_delegates(
            &state,
            vec![
                Delegate {
                    id: "D1".into(),
                    name: "Fire Department".into(),
                },
                Delegate {
                    id: "D2".into(),
                    name: "Police".into(),
                },
            ],
        )
        .expect("delegates");

        let mut a = incident("1", "open", "high", "2024-01-01");
        a.delegated_to = Some("D1".into());
        let b = incident("2", "done", "low", "2024-06-01");
        load_incidents(&state, vec![a, b]).expect("incidents");
        state
    }

    #[test]
    fn list_incidents_filters_and_decorates_delegate_names() {
        let state = seeded_state();

        let all = list_incidents(&state, "all".into(), None, "priority".into()).expect("list");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, "1");
        assert_eq!(all[0].delegate_name, "Fire Department");
        assert_eq!(all[1].delegate_name, "Unassigned");
        assert!(all[1].done);

        let open =
            list_incidents(&state, "open".into(), Some("D1".into()), "reported".into())
                .expect("list");
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, "1");
    }

    #[test]
    fn change_status_commits_on_confirmation() {
        let state = seeded_state();
        let dto = change_status_with(&state, "1", "in_progress", |_, _| Ok(()))
            .expect("change status");
        assert_eq!(dto.status, "in_progress");
        assert_eq!(
            lock(&state.incidents).expect("lock").get("1").expect("get").status,
            "in_progress"
        );
    }

    #[test]
    fn failed_confirmation_rolls_back_and_errors() {
        let state = seeded_state();
        let err = change_status_with(&state, "1", "done", |_, _| {
            Err("connection refused".into())
        })
        .expect_err("should fail");

        assert!(err.contains("connection refused"));
        assert_eq!(
            lock(&state.incidents).expect("lock").get("1").expect("get").status,
            "open"
        );
    }

    #[test]
    fn delegate_update_is_optimistic_until_confirmation_resolves() {
        let state = seeded_state();
        let state_for_probe = state.clone();

        let err = delegate_incident_with(&state, "1", Some("D2".into()), move |_, _| {
            // While the confirmation call is outstanding the local record
            // already shows the new assignment.
            let mid_flight = lock(&state_for_probe.incidents)
                .expect("lock")
                .get("1")
                .expect("get")
                .delegated_to
                .clone();
            assert_eq!(mid_flight.as_deref(), Some("D2"));
            Err("network unreachable".into())
        })
        .expect_err("should fail");

        assert!(err.contains("network unreachable"));
        // The failure restored the pre-mutation snapshot.
        assert_eq!(
            lock(&state.incidents)
                .expect("lock")
                .get("1")
                .expect("get")
                .delegated_to
                .as_deref(),
            Some("D1")
        );
    }

    #[test]
    fn mutating_unknown_incident_fails_without_confirm_call() {
        let state = seeded_state();
        let err = change_status_with(&state, "missing", "done", |_, _| {
            panic!("confirm must not run for unknown incidents")
        })
        .expect_err("should fail");
        assert!(err.contains("unknown incident"));
    }

    #[test]
    fn map_features_excludes_done_incidents_and_selected_circle() {
        let state = seeded_state();
        load_snapshot(
            &state,
            StreamKind::Sensors,
            vec![PointRecord {
                id: Some("s1".into()),
                kind: Some("sensor".into()),
                lat: 50.56519975931357,
                lon: 9.685875926986967,
            }],
        )
        .expect("snapshot");

        let features = map_features(&state, None).expect("features");
        // Incident 2 is done and does not render as a candidate.
        assert_eq!(features.incidents.len(), 1);
        assert_eq!(features.incident_circles.len(), 1);
        assert_eq!(features.sensors.len(), 1);
        assert!(features.victims.is_empty());

        let focused = map_features(&state, Some("1".into())).expect("features");
        assert!(focused.incident_circles.is_empty());
    }

    #[test]
    fn delegate_listing_includes_unknown_referenced_ids() {
        let state = seeded_state();
        let mut c = incident("3", "open", "medium", "2024-03-01");
        c.delegated_to = Some("D9".into());
        let existing = lock(&state.incidents).expect("lock").incidents().to_vec();
        let mut all = existing;
        all.push(c);
        load_incidents(&state, all).expect("incidents");

        let delegates = list_delegates(&state).expect("delegates");
        assert!(delegates.iter().any(|d| d.name == "Fire Department"));
        assert!(delegates.iter().any(|d| d.name == "ID: D9"));
    }
}
