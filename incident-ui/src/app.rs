use crate::bridge;
use crate::dto::{DirectionsDto, IncidentDto, MapFeaturesDto, PinDto};
use dispatch_core::geo::LatLon;
use dispatch_core::viewport::{
    Geofence, MapCandidate, MissPolicy, ViewState, ViewportController,
};
use leptos::*;
use wasm_bindgen_futures::spawn_local;

const MAP_CENTER: LatLon = LatLon {
    lat: 50.5652165,
    lon: 9.6861753,
};
const GEOFENCE_RADIUS_KM: f64 = 24.14;

/// Row color class, matching the service's priority palette; finished
/// incidents always render muted.
fn row_class(priority: &str, done: bool) -> &'static str {
    if done {
        return "secondary";
    }
    match priority.to_ascii_lowercase().as_str() {
        "high" => "danger",
        "medium" => "warning",
        "low" => "info",
        _ => "",
    }
}

fn display_status(status: &str) -> String {
    if status == "in_progress" {
        "in progress".to_string()
    } else {
        status.to_string()
    }
}

fn candidates_from(incidents: &[IncidentDto]) -> Vec<MapCandidate> {
    incidents
        .iter()
        .filter(|i| !i.done)
        .map(|i| MapCandidate {
            id: i.id.clone(),
            center: LatLon::new(i.lat, i.lon),
            radius_m: i.radius_m,
        })
        .collect()
}

#[component]
pub fn App() -> impl IntoView {
    let incidents = create_rw_signal(Vec::<IncidentDto>::new());
    let delegates = create_rw_signal(Vec::<crate::dto::DelegateDto>::new());
    let expanded = create_rw_signal(None::<String>);
    let error = create_rw_signal(None::<String>);

    let status_filter = create_rw_signal("all".to_string());
    let delegate_filter = create_rw_signal("all".to_string());
    let order_by = create_rw_signal("reported".to_string());

    let controller = create_rw_signal(ViewportController::new(
        Geofence::new(MAP_CENTER, GEOFENCE_RADIUS_KM),
        ViewState {
            lat: MAP_CENTER.lat,
            lon: MAP_CENTER.lon,
            zoom: 18.0,
        },
        MissPolicy::Sticky,
    ));
    let features = create_rw_signal(None::<MapFeaturesDto>);
    let pins = create_rw_signal(Vec::<PinDto>::new());
    let directions = create_rw_signal(None::<DirectionsDto>);

    let load_incidents = move || {
        let status = status_filter.get_untracked();
        let delegate = delegate_filter.get_untracked();
        let order = order_by.get_untracked();
        spawn_local(async move {
            let delegate_arg = if delegate == "all" {
                None
            } else {
                Some(delegate.as_str())
            };
            match bridge::fetch_incidents(&status, delegate_arg, &order).await {
                Ok(list) => {
                    incidents.set(list);
                    error.set(None);
                }
                Err(e) => error.set(Some(e)),
            }
        });
    };

    let load_delegates = move || {
        spawn_local(async move {
            if let Ok(list) = bridge::fetch_delegates().await {
                delegates.set(list);
            }
        });
    };

    let load_map = move || {
        let selected = controller.with_untracked(|c| c.selected().map(ToString::to_string));
        spawn_local(async move {
            match bridge::fetch_map_features(selected.as_deref()).await {
                Ok(f) => features.set(Some(f)),
                Err(e) => error.set(Some(e)),
            }
        });
    };

    let load_pins = move || {
        spawn_local(async move {
            if let Ok(list) = bridge::fetch_pins().await {
                pins.set(list);
            }
        });
    };

    // Reload whenever a filter or the ordering changes.
    create_effect(move |_| {
        status_filter.track();
        delegate_filter.track();
        order_by.track();
        load_incidents();
    });

    load_delegates();
    load_map();
    load_pins();

    let refresh = move || {
        spawn_local(async move {
            let _ = bridge::refresh_incidents().await;
            let _ = bridge::refresh_map().await;
            load_incidents();
            load_delegates();
            load_map();
        });
    };

    let mark_done = move |id: String| {
        spawn_local(async move {
            match bridge::mark_done(&id).await {
                Ok(_) => error.set(None),
                Err(e) => error.set(Some(e)),
            }
            load_incidents();
        });
    };

    let set_status = move |id: String, status: String| {
        spawn_local(async move {
            match bridge::change_status(&id, &status).await {
                Ok(_) => error.set(None),
                Err(e) => error.set(Some(e)),
            }
            load_incidents();
        });
    };

    let assign_delegate = move |id: String, delegate_id: String| {
        spawn_local(async move {
            let arg = if delegate_id.is_empty() {
                None
            } else {
                Some(delegate_id.as_str())
            };
            match bridge::delegate_incident(&id, arg).await {
                Ok(_) => error.set(None),
                Err(e) => error.set(Some(e)),
            }
            load_incidents();
        });
    };

    // A marker click from the map surface: run the proximity hit-test and
    // refetch features so the selected circle disappears from the overlay.
    let map_click = move |point: LatLon| {
        let candidates = incidents.with_untracked(|list| candidates_from(list));
        controller.update(|c| {
            c.handle_click(point, &candidates);
        });
        load_map();
    };

    let zoom_by = move |delta: f64| {
        controller.update(|c| {
            let zoom = c.view().zoom + delta;
            c.apply_zoom(zoom);
        });
        load_map();
    };

    let route_to_selection = move || {
        let Some(target) = controller.with_untracked(|c| {
            let selected = c.selected()?;
            incidents.with_untracked(|list| {
                list.iter()
                    .find(|i| i.id == selected)
                    .map(|i| LatLon::new(i.lat, i.lon))
            })
        }) else {
            return;
        };
        spawn_local(async move {
            match bridge::calculate_directions(
                MAP_CENTER.lat,
                MAP_CENTER.lon,
                target.lat,
                target.lon,
            )
            .await
            {
                Ok(route) => directions.set(Some(route)),
                Err(e) => error.set(Some(e)),
            }
        });
    };

    view! {
      <div class="layout">
        <section class="panel">
          <h2>"Incidents"</h2>
          <div class="row">
            <select on:change=move |ev| status_filter.set(event_target_value(&ev))>
              <option value="all">"All statuses"</option>
              <option value="open">"Open"</option>
              <option value="in_progress">"In progress"</option>
              <option value="done">"Done"</option>
            </select>
            <select on:change=move |ev| delegate_filter.set(event_target_value(&ev))>
              <option value="all">"All organizations"</option>
              <For
                each=move || delegates.get()
                key=|d| d.id.clone()
                children=move |d| view! { <option value=d.id.clone()>{d.name.clone()}</option> }
              />
            </select>
            <select on:change=move |ev| order_by.set(event_target_value(&ev))>
              <option value="reported">"Newest first"</option>
              <option value="priority">"By priority"</option>
              <option value="status">"By status"</option>
            </select>
            <button on:click=move |_| refresh()>"Refresh"</button>
          </div>
          <ul>
            <For
              each=move || incidents.get()
              key=|i| format!("{}:{}:{}", i.id, i.status, i.delegated_to.clone().unwrap_or_default())
              children=move |i| {
                let id = i.id.clone();
                let id_for_done = i.id.clone();
                let id_for_status = i.id.clone();
                let id_for_delegate = i.id.clone();
                let is_open = move || expanded.get().as_deref() == Some(id.as_str());
                let toggle_id = i.id.clone();
                let point = LatLon::new(i.lat, i.lon);
                let class = row_class(&i.priority, i.done);
                let done = i.done;
                view! {
                  <li class=format!("incident {class}")>
                    <div on:click=move |_| {
                      let current = expanded.get_untracked();
                      if current.as_deref() == Some(toggle_id.as_str()) {
                        expanded.set(None);
                      } else {
                        expanded.set(Some(toggle_id.clone()));
                      }
                    }>
                      <b>{i.title.clone()}</b>
                      <span class="meta">{format!(" {} · {} · {}", display_status(&i.status), i.delegate_name.clone(), i.priority.clone())}</span>
                    </div>
                    <Show when=is_open fallback=|| ()>
                      <div class="detail">
                        <div>{i.description.clone()}</div>
                        <div class="meta">{format!("Reported: {}", i.reported_at.clone())}</div>
                        <div class="meta">{format!("Coords: {}, {}", i.lat, i.lon)}</div>
                        <div class="row">
                          <button
                            disabled=done
                            on:click={
                              let id = id_for_done.clone();
                              move |_| mark_done(id.clone())
                            }
                          >"Done"</button>
                          <button
                            disabled=done
                            on:click=move |_| map_click(point)
                          >"Show on map"</button>
                          <select
                            disabled=done
                            on:change={
                              let id = id_for_status.clone();
                              move |ev| set_status(id.clone(), event_target_value(&ev))
                            }
                          >
                            <option value="open">"Open"</option>
                            <option value="in_progress">"In progress"</option>
                            <option value="done">"Done"</option>
                          </select>
                          <select
                            disabled=done
                            on:change={
                              let id = id_for_delegate.clone();
                              move |ev| assign_delegate(id.clone(), event_target_value(&ev))
                            }
                          >
                            <option value="">"Unassigned"</option>
                            <For
                              each=move || delegates.get()
                              key=|d| d.id.clone()
                              children=move |d| view! { <option value=d.id.clone()>{d.name.clone()}</option> }
                            />
                          </select>
                        </div>
                      </div>
                    </Show>
                  </li>
                }
              }
            />
          </ul>
        </section>

        <section class="panel">
          <h2>"Map"</h2>
          <div class="meta">
            {move || {
              let v = controller.with(|c| c.view());
              format!("lat {:.5} · lon {:.5} · zoom {:.1}", v.lat, v.lon, v.zoom)
            }}
          </div>
          <div class="meta">
            {move || match controller.with(|c| c.selected().map(ToString::to_string)) {
              Some(id) => format!("Selected incident: {id}"),
              None => "No selection".to_string(),
            }}
          </div>
          <div class="row">
            <button on:click=move |_| zoom_by(1.0)>"Zoom in"</button>
            <button on:click=move |_| zoom_by(-1.0)>"Zoom out"</button>
            <button on:click=move |_| route_to_selection()>"Route to selection"</button>
          </div>
          <ul>
            {move || features.get().map(|f| view! {
              <li>{format!("incident markers: {}", f.incidents.len())}</li>
              <li>{format!("incident circles: {}", f.incident_circles.len())}</li>
              <li>{format!("sensors: {}", f.sensors.len())}</li>
              <li>{format!("helpers: {}", f.helpers.len())}</li>
              <li>{format!("victims: {}", f.victims.len())}</li>
            })}
          </ul>
          <Show
            when=move || directions.get().is_some()
            fallback=|| ()
          >
            <div class="meta">
              {move || directions.get().map(|d| {
                format!("Route: {} points, {:.0} m", d.route.len(), d.distance_m)
              }).unwrap_or_default()}
            </div>
          </Show>
        </section>

        <section class="panel">
          <h2>"Pins"</h2>
          <ul>
            <For
              each=move || pins.get()
              key=|p| p.id.clone()
              children=move |p| view! {
                <li>
                  <div>{p.image_url.clone()}</div>
                  <div class="meta">{format!("{}, {}", p.lat, p.lon)}</div>
                </li>
              }
            />
          </ul>

          <Show
            when=move || error.get().is_some()
            fallback=|| ()
          >
            <pre class="error">{move || error.get().unwrap_or_default()}</pre>
          </Show>
        </section>
      </div>
    }
}
