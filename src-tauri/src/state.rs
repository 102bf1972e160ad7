use dispatch_core::cache::IncidentCache;
use dispatch_core::incidents::DelegateDirectory;
use dispatch_core::live::LiveSet;
use dispatch_gateway::client::ApiClient;
use dispatch_gateway::stream::PointUpdate;
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub struct AppState {
    pub client: Arc<ApiClient>,
    pub incidents: Arc<Mutex<IncidentCache>>,
    pub delegates: Arc<Mutex<DelegateDirectory>>,
    pub sensors: Arc<Mutex<LiveSet>>,
    pub helpers: Arc<Mutex<LiveSet>>,
    pub victims: Arc<Mutex<LiveSet>>,
}

pub struct RuntimeChannels {
    pub update_tx: Sender<PointUpdate>,
    pub update_rx: Receiver<PointUpdate>,
}

pub fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, String> {
    mutex.lock().map_err(|_| "state lock poisoned".to_string())
}
