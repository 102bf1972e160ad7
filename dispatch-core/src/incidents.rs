use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn parse(value: &str) -> Option<Priority> {
        match value.to_lowercase().as_str() {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }

    pub fn rank(value: &str) -> u8 {
        match Priority::parse(value) {
            Some(Priority::High) => 3,
            Some(Priority::Medium) => 2,
            Some(Priority::Low) => 1,
            None => 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Open,
    InProgress,
    Done,
    Closed,
}

impl Status {
    pub fn parse(value: &str) -> Option<Status> {
        match value.to_lowercase().as_str() {
            "open" => Some(Status::Open),
            "in_progress" => Some(Status::InProgress),
            "done" => Some(Status::Done),
            "closed" => Some(Status::Closed),
            _ => None,
        }
    }

    /// `closed` is a legacy alias kept by the incident service; both
    /// terminal values render and filter the same way.
    pub fn is_done(value: &str) -> bool {
        matches!(Status::parse(value), Some(Status::Done | Status::Closed))
    }

    pub fn rank(value: &str) -> u8 {
        match Status::parse(value) {
            Some(Status::Open) => 0,
            Some(Status::InProgress) => 1,
            Some(Status::Done) => 2,
            Some(Status::Closed) => 2,
            None => 99,
        }
    }
}

/// Wire shape owned by the incident service. Priority and status stay raw
/// strings so unknown values survive a round trip and fall back to a
/// neutral display style instead of failing deserialization.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub priority: String,
    pub status: String,
    #[serde(default)]
    pub delegated_to: Option<String>,
    pub lat: f64,
    pub lon: f64,
    #[serde(rename = "radius", default)]
    pub radius_m: f64,
    pub reported_at: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegate {
    pub id: String,
    pub name: String,
}

/// Delegate id -> name lookup, fetched once and cached.
#[derive(Clone, Debug, Default)]
pub struct DelegateDirectory {
    names: BTreeMap<String, String>,
}

impl DelegateDirectory {
    pub fn new(delegates: Vec<Delegate>) -> Self {
        let names = delegates.into_iter().map(|d| (d.id, d.name)).collect();
        Self { names }
    }

    pub fn insert(&mut self, delegate: Delegate) {
        self.names.insert(delegate.id, delegate.name);
    }

    pub fn name(&self, id: &str) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    pub fn display_name(&self, delegated_to: Option<&str>) -> String {
        match delegated_to {
            None => "Unassigned".to_string(),
            Some(id) => self
                .names
                .get(id)
                .cloned()
                .unwrap_or_else(|| format!("ID: {id}")),
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = Delegate> + '_ {
        self.names.iter().map(|(id, name)| Delegate {
            id: id.clone(),
            name: name.clone(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
