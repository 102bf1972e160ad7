use crate::dto::{DelegateDto, DirectionsDto, IncidentDto, MapFeaturesDto, PinDto};
use js_sys::{Function, Promise, Reflect};
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;

fn invoke_fn() -> Result<(JsValue, Function), String> {
    let window = web_sys::window().ok_or_else(|| "window not available".to_string())?;
    let tauri = Reflect::get(&window, &JsValue::from_str("__TAURI__"))
        .map_err(|_| "failed to access __TAURI__".to_string())?;
    if tauri.is_undefined() || tauri.is_null() {
        return Err("Tauri bridge unavailable".into());
    }

    let direct = Reflect::get(&tauri, &JsValue::from_str("invoke")).ok();
    if let Some(v) = direct {
        if v.is_function() {
            return Ok((tauri, v.unchecked_into::<Function>()));
        }
    }

    let tauri_ns = Reflect::get(&tauri, &JsValue::from_str("tauri")).ok();
    if let Some(ns) = tauri_ns {
        let ns_invoke = Reflect::get(&ns, &JsValue::from_str("invoke")).ok();
        if let Some(v) = ns_invoke {
            if v.is_function() {
                return Ok((ns, v.unchecked_into::<Function>()));
            }
        }
    }

    let core = Reflect::get(&tauri, &JsValue::from_str("core"))
        .map_err(|_| "failed to access __TAURI__.core".to_string())?;
    let core_invoke = Reflect::get(&core, &JsValue::from_str("invoke"))
        .map_err(|_| "failed to access __TAURI__.core.invoke".to_string())?;
    if core_invoke.is_function() {
        return Ok((core, core_invoke.unchecked_into::<Function>()));
    }

    Err("no invoke function available".into())
}

pub async fn call<A, R>(cmd: &str, args: &A) -> Result<R, String>
where
    A: Serialize,
    R: DeserializeOwned,
{
    let (this_obj, invoke) = invoke_fn()?;
    let args = args
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| e.to_string())?;
    let js = invoke
        .call2(&this_obj, &JsValue::from_str(cmd), &args)
        .map_err(|e| format!("invoke failed: {e:?}"))?;
    let val = JsFuture::from(Promise::from(js))
        .await
        .map_err(|e| format!("invoke rejected: {e:?}"))?;
    serde_wasm_bindgen::from_value(val).map_err(|e| e.to_string())
}

pub async fn fetch_incidents(
    status_filter: &str,
    delegate_filter: Option<&str>,
    order_by: &str,
) -> Result<Vec<IncidentDto>, String> {
    call(
        "list_incidents_cmd",
        &serde_json::json!({
            "statusFilter": status_filter,
            "delegateFilter": delegate_filter,
            "orderBy": order_by
        }),
    )
    .await
}

pub async fn refresh_incidents() -> Result<usize, String> {
    call("refresh_incidents_cmd", &()).await
}

pub async fn mark_done(id: &str) -> Result<IncidentDto, String> {
    call("mark_done_cmd", &serde_json::json!({ "incidentId": id })).await
}

pub async fn change_status(id: &str, status: &str) -> Result<IncidentDto, String> {
    call(
        "change_status_cmd",
        &serde_json::json!({ "incidentId": id, "status": status }),
    )
    .await
}

pub async fn delegate_incident(
    id: &str,
    delegate_id: Option<&str>,
) -> Result<IncidentDto, String> {
    call(
        "delegate_incident_cmd",
        &serde_json::json!({ "incidentId": id, "delegateId": delegate_id }),
    )
    .await
}

pub async fn fetch_delegates() -> Result<Vec<DelegateDto>, String> {
    call("list_delegates_cmd", &()).await
}

pub async fn fetch_map_features(selected: Option<&str>) -> Result<MapFeaturesDto, String> {
    call(
        "map_features_cmd",
        &serde_json::json!({ "selected": selected }),
    )
    .await
}

pub async fn refresh_map() -> Result<(), String> {
    call("refresh_map_cmd", &()).await
}

pub async fn calculate_directions(
    start_lat: f64,
    start_lon: f64,
    end_lat: f64,
    end_lon: f64,
) -> Result<DirectionsDto, String> {
    call(
        "calculate_directions_cmd",
        &serde_json::json!({
            "startLat": start_lat,
            "startLon": start_lon,
            "endLat": end_lat,
            "endLon": end_lon
        }),
    )
    .await
}

pub async fn fetch_pins() -> Result<Vec<PinDto>, String> {
    call("list_pins_cmd", &()).await
}
