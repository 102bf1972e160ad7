/// Base URLs and tile templates for the externally-owned services.
/// Built once at startup and passed explicitly to every client; there is no
/// process-wide base-URL state.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Incident/delegate/map-snapshot service.
    pub api_base: String,
    /// Pin upload + directions service.
    pub pin_api_base: String,
    pub sensor_ws_url: String,
    pub victim_ws_url: String,
    pub base_tile_template: String,
    pub terrain_tile_template: String,
    pub destruction_tile_template: String,
    /// Geofence origin and radius constraining the map viewport.
    pub geofence_lat: f64,
    pub geofence_lon: f64,
    pub geofence_radius_km: f64,
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        Self {
            api_base: env_or("DISPATCH_API_BASE", "http://localhost:8000"),
            pin_api_base: env_or("DISPATCH_PIN_API_BASE", "http://localhost:8001"),
            sensor_ws_url: env_or("DISPATCH_SENSOR_WS", "ws://localhost:8000/ws/sensors"),
            victim_ws_url: env_or("DISPATCH_VICTIM_WS", "ws://localhost:8000/ws/victims"),
            base_tile_template: env_or(
                "DISPATCH_BASE_TILES",
                "https://tile.openstreetmap.org/{z}/{x}/{y}.png",
            ),
            terrain_tile_template: env_or(
                "DISPATCH_TERRAIN_TILES",
                "http://localhost:8002/terrain/{z}/{x}/{y}.png",
            ),
            destruction_tile_template: env_or(
                "DISPATCH_DESTRUCTION_TILES",
                "http://localhost:8002/destruction/{z}/{x}/{y}.png",
            ),
            geofence_lat: env_f64_or("DISPATCH_GEOFENCE_LAT", 50.5652165),
            geofence_lon: env_f64_or("DISPATCH_GEOFENCE_LON", 9.6861753),
            geofence_radius_km: env_f64_or("DISPATCH_GEOFENCE_RADIUS_KM", 24.14),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_f64_or(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(default)
}
