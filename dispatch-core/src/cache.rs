use crate::incidents::Incident;

/// Snapshot of a record taken before an optimistic update. The caller
/// resolves it after the confirmation call: `commit` on success, or hand it
/// back to `IncidentCache::rollback` on failure to restore the snapshot.
#[derive(Clone, Debug)]
pub struct PendingUpdate {
    previous: Incident,
}

impl PendingUpdate {
    pub fn incident_id(&self) -> &str {
        &self.previous.id
    }

    pub fn commit(self) {}
}

/// Write-through cache over the incident service's list. Mutations apply
/// locally first so the UI reflects them immediately, and are reverted if
/// the confirmation call fails.
#[derive(Clone, Debug, Default)]
pub struct IncidentCache {
    incidents: Vec<Incident>,
}

impl IncidentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace_all(&mut self, incidents: Vec<Incident>) {
        self.incidents = incidents;
    }

    pub fn insert(&mut self, incident: Incident) {
        if let Some(existing) = self.incidents.iter_mut().find(|i| i.id == incident.id) {
            *existing = incident;
        } else {
            self.incidents.push(incident);
        }
    }

    pub fn incidents(&self) -> &[Incident] {
        &self.incidents
    }

    pub fn get(&self, id: &str) -> Option<&Incident> {
        self.incidents.iter().find(|i| i.id == id)
    }

    pub fn change_status(&mut self, id: &str, status: &str) -> Option<PendingUpdate> {
        self.mutate(id, |incident| incident.status = status.to_string())
    }

    pub fn mark_done(&mut self, id: &str) -> Option<PendingUpdate> {
        self.change_status(id, "done")
    }

    pub fn delegate_to(&mut self, id: &str, delegate: Option<String>) -> Option<PendingUpdate> {
        self.mutate(id, |incident| incident.delegated_to = delegate)
    }

    pub fn rollback(&mut self, pending: PendingUpdate) {
        if let Some(existing) = self
            .incidents
            .iter_mut()
            .find(|i| i.id == pending.previous.id)
        {
            *existing = pending.previous;
        }
    }

    fn mutate(
        &mut self,
        id: &str,
        apply: impl FnOnce(&mut Incident),
    ) -> Option<PendingUpdate> {
        let incident = self.incidents.iter_mut().find(|i| i.id == id)?;
        let previous = incident.clone();
        apply(incident);
        Some(PendingUpdate { previous })
    }
}
