use dispatch_core::live::PointRecord;
use feature_registry::{validate_point_v1, CanonicalPointV1};
use futures_util::StreamExt;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{info, warn};

const RECONNECT_DELAY: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamKind {
    Sensors,
    Victims,
}

impl StreamKind {
    pub fn point_kind(self) -> &'static str {
        match self {
            StreamKind::Sensors => "sensor",
            StreamKind::Victims => "victim",
        }
    }
}

#[derive(Clone, Debug)]
pub struct PointUpdate {
    pub kind: StreamKind,
    pub record: PointRecord,
}

pub fn point_channel(_buffer: usize) -> (Sender<PointUpdate>, Receiver<PointUpdate>) {
    mpsc::channel()
}

/// Normalizes one upstream payload variant into the canonical point shape.
pub trait PointAdapter: Send + Sync + 'static {
    fn parse(&self, payload: &serde_json::Value) -> Result<CanonicalPointV1, String>;
}

/// Accepts both observed payload shapes: `{lat, lon}` fields and the older
/// `{cord: [lon, lat]}` array.
pub struct GenericPointAdapter {
    pub kind: &'static str,
}

impl PointAdapter for GenericPointAdapter {
    fn parse(&self, payload: &serde_json::Value) -> Result<CanonicalPointV1, String> {
        let (lat, lon) = if let Some(cord) = payload.get("cord").and_then(serde_json::Value::as_array) {
            let lon = cord
                .first()
                .and_then(serde_json::Value::as_f64)
                .ok_or_else(|| "cord[0] missing".to_string())?;
            let lat = cord
                .get(1)
                .and_then(serde_json::Value::as_f64)
                .ok_or_else(|| "cord[1] missing".to_string())?;
            (lat, lon)
        } else {
            let lat = payload
                .get("lat")
                .and_then(serde_json::Value::as_f64)
                .ok_or_else(|| "lat missing".to_string())?;
            let lon = payload
                .get("lon")
                .and_then(serde_json::Value::as_f64)
                .ok_or_else(|| "lon missing".to_string())?;
            (lat, lon)
        };

        let point = CanonicalPointV1 {
            schema: "point.v1".into(),
            id: payload
                .get("id")
                .and_then(|v| match v {
                    serde_json::Value::String(s) => Some(s.clone()),
                    serde_json::Value::Number(n) => Some(n.to_string()),
                    _ => None,
                }),
            kind: payload
                .get("type")
                .and_then(serde_json::Value::as_str)
                .unwrap_or(self.kind)
                .to_lowercase(),
            lat,
            lon,
            recorded_at: current_timestamp(),
        };
        validate_point_v1(&point)?;
        Ok(point)
    }
}

pub fn parse_point(
    payload: &serde_json::Value,
    kind: StreamKind,
) -> Result<PointUpdate, String> {
    let adapter = GenericPointAdapter {
        kind: kind.point_kind(),
    };
    let canonical = adapter.parse(payload)?;
    Ok(PointUpdate {
        kind,
        record: PointRecord {
            id: canonical.id,
            kind: Some(canonical.kind),
            lat: canonical.lat,
            lon: canonical.lon,
        },
    })
}

/// Long-lived consumer for one push channel. Runs its own runtime on a
/// dedicated thread so callers stay synchronous; reconnects after a fixed
/// delay when the connection drops.
pub fn spawn_stream(url: String, kind: StreamKind, tx: Sender<PointUpdate>) {
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(err) => {
                warn!(%err, "failed to start stream runtime");
                return;
            }
        };
        runtime.block_on(run_stream(url, kind, tx));
    });
}

async fn run_stream(url: String, kind: StreamKind, tx: Sender<PointUpdate>) {
    loop {
        match connect_async(url.as_str()).await {
            Ok((mut socket, _)) => {
                info!(url = %url, "stream connected");
                while let Some(message) = socket.next().await {
                    let Ok(Message::Text(text)) = message else {
                        continue;
                    };
                    let Ok(payload) = serde_json::from_str::<serde_json::Value>(&text) else {
                        warn!(url = %url, "dropping non-JSON stream message");
                        continue;
                    };
                    match parse_point(&payload, kind) {
                        Ok(update) => {
                            if tx.send(update).is_err() {
                                return;
                            }
                        }
                        Err(err) => warn!(url = %url, %err, "dropping invalid point"),
                    }
                }
                warn!(url = %url, "stream closed, reconnecting");
            }
            Err(err) => {
                warn!(url = %url, %err, "stream connect failed");
            }
        }
        tokio::time::sleep(RECONNECT_DELAY).await;
    }
}

fn current_timestamp() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let Ok(duration) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return "0".into();
    };
    duration.as_secs().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flat_lat_lon_payload() {
        let payload = serde_json::json!({
            "id": "s-7",
            "type": "SENSOR",
            "lat": 50.56519975931357,
            "lon": 9.685875926986967
        });

        let update = parse_point(&payload, StreamKind::Sensors).expect("parse");
        assert_eq!(update.record.id.as_deref(), Some("s-7"));
        assert_eq!(update.record.kind.as_deref(), Some("sensor"));
        assert_eq!(update.record.lat, 50.56519975931357);
    }

    #[test]
    fn parses_cord_array_payload() {
        let payload = serde_json::json!({
            "cord": [9.685875926986967, 50.56519975931357]
        });

        let update = parse_point(&payload, StreamKind::Victims).expect("parse");
        assert_eq!(update.record.kind.as_deref(), Some("victim"));
        assert_eq!(update.record.lon, 9.685875926986967);
        assert!(update.record.id.is_none());
    }

    #[test]
    fn numeric_ids_are_stringified() {
        let payload = serde_json::json!({
            "id": 42,
            "lat": 50.0,
            "lon": 9.0
        });
        let update = parse_point(&payload, StreamKind::Sensors).expect("parse");
        assert_eq!(update.record.id.as_deref(), Some("42"));
    }

    #[test]
    fn rejects_payload_without_coordinates() {
        let payload = serde_json::json!({ "id": "s-1" });
        assert!(parse_point(&payload, StreamKind::Sensors).is_err());
    }

    #[test]
    fn rejects_non_finite_coordinates() {
        let payload = serde_json::json!({
            "lat": 95.0,
            "lon": 9.0
        });
        assert!(parse_point(&payload, StreamKind::Sensors).is_err());
    }
}
