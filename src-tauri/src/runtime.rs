use crate::state::{AppState, RuntimeChannels};
use dispatch_gateway::stream::{PointUpdate, StreamKind};
#[cfg(feature = "tauri-app")]
use dispatch_gateway::stream::spawn_stream;
use tracing::warn;

pub trait EventSink: Send + Sync + 'static {
    fn emit_json(&self, event: &str, payload: serde_json::Value);
}

pub fn start(state: &AppState, channels: RuntimeChannels) {
    start_with_sink(state, channels, NoopSink);
}

/// Consume push updates from the stream channel, merge them into the live
/// sets, and notify the sink. Runs until the channel closes.
pub fn start_with_sink(state: &AppState, channels: RuntimeChannels, sink: impl EventSink) {
    let state_clone = state.clone();
    std::thread::spawn(move || {
        while let Ok(update) = channels.update_rx.recv() {
            apply_update(&state_clone, &sink, update);
        }
    });
}

#[cfg(feature = "tauri-app")]
pub fn start_tauri_runtime(state: &AppState, channels: RuntimeChannels, app: tauri::AppHandle) {
    let config = state.client.config();
    spawn_stream(
        config.sensor_ws_url.clone(),
        StreamKind::Sensors,
        channels.update_tx.clone(),
    );
    spawn_stream(
        config.victim_ws_url.clone(),
        StreamKind::Victims,
        channels.update_tx.clone(),
    );

    start_with_sink(state, channels, TauriSink::new(app));

    // Periodic poll keeps the snapshots converging with the service even
    // when the push channels are quiet; read failures keep the last
    // snapshot.
    let state_for_poll = state.clone();
    std::thread::spawn(move || loop {
        if let Err(err) = crate::commands::refresh_map_snapshots(&state_for_poll) {
            warn!(%err, "map snapshot refresh failed");
        }
        if let Err(err) = crate::commands::refresh_incidents(&state_for_poll) {
            warn!(%err, "incident refresh failed");
        }
        std::thread::sleep(std::time::Duration::from_secs(30));
    });
}

fn apply_update(state: &AppState, sink: &impl EventSink, update: PointUpdate) {
    let set = match update.kind {
        StreamKind::Sensors => &state.sensors,
        StreamKind::Victims => &state.victims,
    };

    let count = {
        let Ok(mut guard) = set.lock() else {
            warn!("live set lock poisoned, dropping update");
            return;
        };
        guard.apply_push(update.record.clone());
        guard.len()
    };

    let event = match update.kind {
        StreamKind::Sensors => "sensors-updated",
        StreamKind::Victims => "victims-updated",
    };
    sink.emit_json(
        event,
        serde_json::json!({
            "count": count,
            "point": {
                "id": update.record.id,
                "lat": update.record.lat,
                "lon": update.record.lon,
            },
        }),
    );
}

struct NoopSink;

impl EventSink for NoopSink {
    fn emit_json(&self, _event: &str, _payload: serde_json::Value) {}
}

#[cfg(feature = "tauri-app")]
pub struct TauriSink {
    app: tauri::AppHandle,
}

#[cfg(feature = "tauri-app")]
impl TauriSink {
    pub fn new(app: tauri::AppHandle) -> Self {
        Self { app }
    }
}

#[cfg(feature = "tauri-app")]
impl EventSink for TauriSink {
    fn emit_json(&self, event: &str, payload: serde_json::Value) {
        use tauri::Manager;
        let _ = self.app.emit_all(event, payload);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_state;
    use dispatch_core::live::PointRecord;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct CaptureSink {
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl EventSink for CaptureSink {
        fn emit_json(&self, event: &str, _payload: serde_json::Value) {
            if let Ok(mut guard) = self.seen.lock() {
                guard.push(event.to_string());
            }
        }
    }

    fn update(kind: StreamKind, id: &str, lat: f64) -> PointUpdate {
        PointUpdate {
            kind,
            record: PointRecord {
                id: Some(id.into()),
                kind: Some(kind.point_kind().into()),
                lat,
                lon: 9.6861753,
            },
        }
    }

    #[test]
    fn updates_land_in_the_matching_live_set() {
        let (state, _channels) = build_state().expect("state");
        let sink = CaptureSink::default();

        apply_update(&state, &sink, update(StreamKind::Sensors, "s1", 50.1));
        apply_update(&state, &sink, update(StreamKind::Victims, "v1", 50.2));
        // Same sensor id again: overwrite, not duplicate.
        apply_update(&state, &sink, update(StreamKind::Sensors, "s1", 50.3));

        assert_eq!(state.sensors.lock().expect("sensors").len(), 1);
        assert_eq!(state.victims.lock().expect("victims").len(), 1);

        let seen = sink.seen.lock().expect("lock").clone();
        assert_eq!(
            seen,
            vec!["sensors-updated", "victims-updated", "sensors-updated"]
        );
    }
}
