/*!
# SpeedWatch Kernel

Backend du tableau de bord de surveillance du trafic :
- journal des infractions et projection filtrée (date + tranche de vitesse)
- statut simulé du microcontrôleur ESP32 (poller Idle/Polling)
- panneau de trafic, caméras, rapports, réglages
- API REST Axum exposant le tout
*/

pub mod cameras;
pub mod config;
pub mod device;
pub mod filters;
pub mod health;
pub mod http;
pub mod ports;
pub mod records;
pub mod reports;
pub mod settings;
pub mod state;
pub mod traffic;

pub use device::{DevicePoller, DeviceStatus, PollPhase, RefreshOutcome};
pub use filters::{project, FilterState, Outcome, SpeedBucket};
pub use records::{Lane, RecordStore, ViolationRecord};
