use crate::geo::{circle_polygon, haversine_m, point_in_polygon, LatLon};
use serde::{Deserialize, Serialize};

/// Zoom level a successful hit snaps to.
pub const FOCUS_ZOOM: f64 = 18.0;
/// Zooming below this after a selection closes the detail focus.
pub const CLEAR_ZOOM: f64 = 17.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub lat: f64,
    pub lon: f64,
    pub zoom: f64,
}

impl ViewState {
    pub fn center(&self) -> LatLon {
        LatLon::new(self.lat, self.lon)
    }
}

/// Circular boundary constraining permissible viewport centers.
#[derive(Clone, Debug)]
pub struct Geofence {
    ring: Vec<LatLon>,
}

impl Geofence {
    pub fn new(center: LatLon, radius_km: f64) -> Self {
        Self {
            ring: circle_polygon(center, radius_km * 1_000.0, 64),
        }
    }

    pub fn contains(&self, point: LatLon) -> bool {
        point_in_polygon(point, &self.ring)
    }
}

/// What a click that hits no candidate does to an existing selection.
/// The observed frontend left the selection in place; `Clear` is the
/// alternative reading.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MissPolicy {
    #[default]
    Sticky,
    Clear,
}

#[derive(Clone, Debug)]
pub struct MapCandidate {
    pub id: String,
    pub center: LatLon,
    pub radius_m: f64,
}

/// Widened comparison radius so visually small points stay clickable when
/// zoomed out.
pub fn hit_radius_m(zoom: f64, own_radius_m: f64) -> f64 {
    if zoom < 11.0 {
        1_000.0
    } else if zoom < 14.0 {
        500.0
    } else {
        own_radius_m
    }
}

#[derive(Clone, Debug)]
pub struct ViewportController {
    geofence: Geofence,
    view: ViewState,
    selected: Option<String>,
    miss_policy: MissPolicy,
}

impl ViewportController {
    pub fn new(geofence: Geofence, initial: ViewState, miss_policy: MissPolicy) -> Self {
        Self {
            geofence,
            view: initial,
            selected: None,
            miss_policy,
        }
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Commit a viewport move if its center stays inside the geofence.
    /// Out-of-bound moves are dropped without surfacing an error; the
    /// previous viewport is retained.
    pub fn apply_move(&mut self, next: ViewState) -> bool {
        if self.geofence.contains(next.center()) {
            self.view = next;
            self.clear_if_zoomed_out();
            true
        } else {
            false
        }
    }

    pub fn apply_zoom(&mut self, zoom: f64) {
        self.view.zoom = zoom;
        self.clear_if_zoomed_out();
    }

    /// First candidate (iteration order) within the zoom-banded tolerance
    /// becomes selected; the viewport recenters on it and snaps to the
    /// focus zoom. Clicking the already-selected candidate changes nothing.
    pub fn handle_click(
        &mut self,
        click: LatLon,
        candidates: &[MapCandidate],
    ) -> Option<String> {
        let hit = candidates.iter().find(|c| {
            haversine_m(click, c.center) < hit_radius_m(self.view.zoom, c.radius_m)
        });

        match hit {
            Some(candidate) => {
                if self.selected.as_deref() != Some(candidate.id.as_str()) {
                    self.view = ViewState {
                        lat: candidate.center.lat,
                        lon: candidate.center.lon,
                        zoom: FOCUS_ZOOM,
                    };
                    self.selected = Some(candidate.id.clone());
                }
                self.selected.clone()
            }
            None => {
                if self.miss_policy == MissPolicy::Clear {
                    self.selected = None;
                }
                self.selected.clone()
            }
        }
    }

    fn clear_if_zoomed_out(&mut self) {
        if self.selected.is_some() && self.view.zoom < CLEAR_ZOOM {
            self.selected = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::destination;

    const CENTER: LatLon = LatLon {
        lat: 50.5652165,
        lon: 9.6861753,
    };

    fn controller(zoom: f64, miss_policy: MissPolicy) -> ViewportController {
        ViewportController::new(
            Geofence::new(CENTER, 24.14),
            ViewState {
                lat: CENTER.lat,
                lon: CENTER.lon,
                zoom,
            },
            miss_policy,
        )
    }

    fn candidates() -> Vec<MapCandidate> {
        vec![
            MapCandidate {
                id: "0".into(),
                center: CENTER,
                radius_m: 30.0,
            },
            MapCandidate {
                id: "1".into(),
                center: LatLon::new(50.561469999275005, 9.704481903105375),
                radius_m: 60.0,
            },
        ]
    }

    #[test]
    fn move_inside_geofence_commits() {
        let mut ctl = controller(18.0, MissPolicy::Sticky);
        let next = ViewState {
            lat: CENTER.lat + 0.01,
            lon: CENTER.lon + 0.01,
            zoom: 18.0,
        };
        assert!(ctl.apply_move(next));
        assert_eq!(ctl.view(), next);
    }

    #[test]
    fn move_outside_geofence_retains_previous_view() {
        let mut ctl = controller(18.0, MissPolicy::Sticky);
        let before = ctl.view();
        let far = destination(CENTER, 90.0, 30_000.0);
        let next = ViewState {
            lat: far.lat,
            lon: far.lon,
            zoom: 18.0,
        };
        assert!(!ctl.apply_move(next));
        assert_eq!(ctl.view(), before);
    }

    #[test]
    fn near_click_at_high_zoom_respects_own_radius() {
        let mut ctl = controller(18.0, MissPolicy::Sticky);
        // 40 m from a 30 m incident: outside the circle, no selection.
        let click = destination(CENTER, 0.0, 40.0);
        assert_eq!(ctl.handle_click(click, &candidates()), None);
        assert_eq!(ctl.selected(), None);
    }

    #[test]
    fn same_click_at_low_zoom_uses_fallback_radius() {
        let mut ctl = controller(10.0, MissPolicy::Sticky);
        let click = destination(CENTER, 0.0, 40.0);
        assert_eq!(ctl.handle_click(click, &candidates()), Some("0".into()));
        assert_eq!(ctl.view().zoom, FOCUS_ZOOM);
        assert!((ctl.view().lat - CENTER.lat).abs() < 1e-9);
    }

    #[test]
    fn mid_zoom_band_uses_500m_tolerance() {
        let mut ctl = controller(12.0, MissPolicy::Sticky);
        let near = destination(CENTER, 45.0, 400.0);
        assert_eq!(ctl.handle_click(near, &candidates()), Some("0".into()));

        let mut ctl = controller(12.0, MissPolicy::Sticky);
        let far = destination(CENTER, 45.0, 600.0);
        assert_eq!(ctl.handle_click(far, &candidates()), None);
    }

    #[test]
    fn first_candidate_in_iteration_order_wins() {
        let mut ctl = controller(10.0, MissPolicy::Sticky);
        // Two overlapping candidates; the click is within the fallback
        // radius of both, so iteration order decides.
        let overlapping = vec![
            MapCandidate {
                id: "a".into(),
                center: destination(CENTER, 90.0, 100.0),
                radius_m: 30.0,
            },
            MapCandidate {
                id: "b".into(),
                center: destination(CENTER, 270.0, 100.0),
                radius_m: 30.0,
            },
        ];
        assert_eq!(ctl.handle_click(CENTER, &overlapping), Some("a".into()));
    }

    #[test]
    fn zooming_below_threshold_clears_selection() {
        let mut ctl = controller(18.0, MissPolicy::Sticky);
        ctl.handle_click(CENTER, &candidates());
        assert_eq!(ctl.selected(), Some("0"));

        ctl.apply_zoom(16.5);
        assert_eq!(ctl.selected(), None);
    }

    #[test]
    fn sticky_policy_keeps_selection_on_miss() {
        let mut ctl = controller(18.0, MissPolicy::Sticky);
        ctl.handle_click(CENTER, &candidates());
        assert_eq!(ctl.selected(), Some("0"));

        let miss = destination(CENTER, 180.0, 5_000.0);
        ctl.handle_click(miss, &candidates());
        assert_eq!(ctl.selected(), Some("0"));
    }

    #[test]
    fn clear_policy_drops_selection_on_miss() {
        let mut ctl = controller(18.0, MissPolicy::Clear);
        ctl.handle_click(CENTER, &candidates());
        assert_eq!(ctl.selected(), Some("0"));

        let miss = destination(CENTER, 180.0, 5_000.0);
        ctl.handle_click(miss, &candidates());
        assert_eq!(ctl.selected(), None);
    }

    #[test]
    fn nan_coordinates_never_select() {
        let mut ctl = controller(10.0, MissPolicy::Sticky);
        let click = LatLon::new(f64::NAN, f64::NAN);
        assert_eq!(ctl.handle_click(click, &candidates()), None);
    }
}
