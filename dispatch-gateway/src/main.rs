use dispatch_gateway::client::ApiClient;
use dispatch_gateway::config::GatewayConfig;
use dispatch_gateway::stream::{point_channel, spawn_stream, StreamKind};
use tracing::{info, warn};

fn main() {
    tracing_subscriber::fmt().init();

    let config = GatewayConfig::from_env();
    let client = match ApiClient::new(config.clone()) {
        Ok(client) => client,
        Err(err) => {
            eprintln!("failed to build api client: {err}");
            return;
        }
    };

    match client.list_incidents() {
        Ok(incidents) => info!(count = incidents.len(), "incident snapshot"),
        Err(err) => warn!(%err, "incident snapshot failed"),
    }
    match client.sensors() {
        Ok(sensors) => info!(count = sensors.len(), "sensor snapshot"),
        Err(err) => warn!(%err, "sensor snapshot failed"),
    }
    match client.victims() {
        Ok(victims) => info!(count = victims.len(), "victim snapshot"),
        Err(err) => warn!(%err, "victim snapshot failed"),
    }

    let (tx, rx) = point_channel(256);
    spawn_stream(config.sensor_ws_url.clone(), StreamKind::Sensors, tx.clone());
    spawn_stream(config.victim_ws_url.clone(), StreamKind::Victims, tx);

    info!("gateway listening for push updates");
    while let Ok(update) = rx.recv() {
        info!(
            kind = update.kind.point_kind(),
            id = update.record.id.as_deref().unwrap_or("-"),
            lat = update.record.lat,
            lon = update.record.lon,
            "point update"
        );
    }
}
