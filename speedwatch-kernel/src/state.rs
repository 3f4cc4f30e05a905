use crate::cameras::CameraRegistry;
use crate::filters::FilterState;
use crate::settings::Settings;
use crate::traffic::TrafficPanel;
use parking_lot::Mutex;
use std::sync::Arc;

pub type Shared<T> = Arc<Mutex<T>>;

pub fn new_state<T>(value: T) -> Shared<T> {
    Arc::new(Mutex::new(value))
}

/// État de vue du tableau de bord, un objet partagé par préoccupation.
/// Passé explicitement aux handlers via `AppState`, jamais en global.
#[derive(Clone, Default)]
pub struct DashboardState {
    pub filters: Shared<FilterState>,
    pub traffic: Shared<TrafficPanel>,
    pub cameras: Shared<CameraRegistry>,
    pub settings: Shared<Settings>,
}
