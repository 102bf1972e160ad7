pub mod commands;
pub mod runtime;
pub mod state;

use crate::state::{AppState, RuntimeChannels};
use dispatch_core::cache::IncidentCache;
use dispatch_core::incidents::{Delegate, DelegateDirectory, Incident};
use dispatch_core::live::{LiveSet, PointRecord};
use dispatch_gateway::client::ApiClient;
use dispatch_gateway::config::GatewayConfig;
use dispatch_gateway::stream::point_channel;
#[cfg(feature = "tauri-app")]
use tauri::Manager;
use std::sync::{Arc, Mutex};

pub fn build_state() -> Result<(AppState, RuntimeChannels), String> {
    let config = GatewayConfig::from_env();
    let client = Arc::new(ApiClient::new(config)?);
    let (update_tx, update_rx) = point_channel(256);

    Ok((
        AppState {
            client,
            incidents: Arc::new(Mutex::new(IncidentCache::new())),
            delegates: Arc::new(Mutex::new(DelegateDirectory::default())),
            sensors: Arc::new(Mutex::new(LiveSet::new())),
            helpers: Arc::new(Mutex::new(LiveSet::new())),
            victims: Arc::new(Mutex::new(LiveSet::new())),
        },
        RuntimeChannels {
            update_tx,
            update_rx,
        },
    ))
}

pub fn run() -> Result<(), String> {
    let (state, channels) = build_state()?;
    runtime::start(&state, channels);

    let _ = commands::list_incidents(&state, "all".into(), None, "reported".into())?;
    Ok(())
}

#[cfg(feature = "tauri-app")]
pub fn run_tauri() {
    tauri::Builder::default()
        .setup(|app| {
            let (state, channels) =
                build_state().map_err(|e| -> Box<dyn std::error::Error> { e.into() })?;

            // Initial fetches; failures leave empty caches and the periodic
            // poll retries.
            let _ = commands::refresh_incidents(&state);
            let _ = commands::refresh_delegates(&state);
            let _ = commands::refresh_map_snapshots(&state);

            runtime::start_tauri_runtime(&state, channels, app.handle());
            app.manage(state);
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::list_incidents_cmd,
            commands::get_incident_cmd,
            commands::refresh_incidents_cmd,
            commands::refresh_map_cmd,
            commands::create_incident_cmd,
            commands::change_status_cmd,
            commands::mark_done_cmd,
            commands::delegate_incident_cmd,
            commands::list_delegates_cmd,
            commands::create_delegate_cmd,
            commands::map_features_cmd,
            commands::calculate_directions_cmd,
            commands::list_pins_cmd,
            commands::upload_pin_cmd
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

pub fn run_demo() -> Result<(), String> {
    let (state, _channels) = build_state()?;
    seed_demo_data(&state)?;

    let incidents =
        commands::list_incidents(&state, "all".into(), None, "priority".into())?;
    println!(
        "incidents:\n{}",
        serde_json::to_string_pretty(&incidents).map_err(|e| e.to_string())?
    );

    let features = commands::map_features(&state, None)?;
    println!(
        "map features:\n{}",
        serde_json::to_string_pretty(&features).map_err(|e| e.to_string())?
    );

    Ok(())
}

fn seed_demo_data(state: &AppState) -> Result<(), String> {
    commands::load_delegates(
        state,
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
    )?;

    commands::load_incidents(
        state,
        vec![
            Incident {
                id: "0".into(),
                title: "Collapsed scaffolding".into(),
                description: "Construction site on the main square".into(),
                priority: "high".into(),
                status: "open".into(),
                delegated_to: Some("D1".into()),
                lat: 50.5652165,
                lon: 9.6861753,
                radius_m: 30.0,
                reported_at: "2024-05-01T09:30:00Z".into(),
            },
            Incident {
                id: "1".into(),
                title: "Gas smell reported".into(),
                description: "Residents report gas smell near the depot".into(),
                priority: "medium".into(),
                status: "in_progress".into(),
                delegated_to: Some("D2".into()),
                lat: 50.561469999275005,
                lon: 9.704481903105375,
                radius_m: 60.0,
                reported_at: "2024-05-01T10:15:00Z".into(),
            },
        ],
    )?;

    commands::load_snapshot(
        state,
        dispatch_gateway::stream::StreamKind::Sensors,
        vec![
            PointRecord {
                id: Some("s1".into()),
                kind: Some("sensor".into()),
                lat: 50.56519975931357,
                lon: 9.685875926986967,
            },
            PointRecord {
                id: Some("s2".into()),
                kind: Some("sensor".into()),
                lat: 50.56560835807784,
                lon: 9.686164571163602,
            },
        ],
    )?;

    Ok(())
}
