/**
 * DEVICE POLLER - Statut de connexion simulé du microcontrôleur ESP32
 *
 * RÔLE :
 * Machine à états Idle/Polling qui rafraîchit le statut de connexion au
 * montage du kernel ou sur demande explicite (POST /device/refresh).
 *
 * FONCTIONNEMENT :
 * - refresh() : Idle -> Polling, lance une tâche tokio qui attend le délai fixe
 * - à l'échéance, la sonde (`DeviceProbe`) produit un DeviceStatus complet
 * - complete() : Polling -> Idle, remplace le statut en bloc
 * - un refresh pendant Polling est un no-op explicite (AlreadyPolling)
 *
 * ANNULATION :
 * Chaque sondage porte un numéro de génération. shutdown() incrémente la
 * génération et abort la tâche en vol : un résultat périmé est rejeté.
 */

use crate::ports::{DeviceProbe, PortInfo};
use crate::state::{new_state, Shared};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use time::macros::format_description;
use time::OffsetDateTime;
use tokio::task::JoinHandle;

/// Statut de connexion ; les champs dépendants n'existent que si connecté
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DeviceStatus {
    #[default]
    Disconnected,
    Connected {
        address: Ipv4Addr,
        /// Heure locale du relevé (ex: "10:15:32 AM")
        last_update: String,
        /// Qualité du signal en %
        signal_quality: u8,
    },
}

impl DeviceStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, DeviceStatus::Connected { .. })
    }

    pub fn address(&self) -> Option<Ipv4Addr> {
        match self {
            DeviceStatus::Connected { address, .. } => Some(*address),
            DeviceStatus::Disconnected => None,
        }
    }

    pub fn signal_quality(&self) -> Option<u8> {
        match self {
            DeviceStatus::Connected { signal_quality, .. } => Some(*signal_quality),
            DeviceStatus::Disconnected => None,
        }
    }

    pub fn last_update(&self) -> Option<&str> {
        match self {
            DeviceStatus::Connected { last_update, .. } => Some(last_update),
            DeviceStatus::Disconnected => None,
        }
    }

    /// Vue plate pour l'API : `connected` + champs optionnels
    pub fn view(&self) -> DeviceStatusView {
        DeviceStatusView {
            connected: self.is_connected(),
            address: self.address(),
            last_update: self.last_update().map(str::to_owned),
            signal_quality: self.signal_quality(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceStatusView {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Ipv4Addr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_quality: Option<u8>,
}

/// Heure locale courante au format 12h, repli UTC si l'offset local est inconnu
pub fn local_time_of_day() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    now.format(format_description!(
        "[hour repr:12 padding:none]:[minute]:[second] [period]"
    ))
    .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollPhase {
    Idle,
    Polling,
}

/// Résultat d'une demande de rafraîchissement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RefreshOutcome {
    Started { generation: u64 },
    AlreadyPolling { generation: u64 },
    ShutDown,
}

#[derive(Debug, Clone, Serialize)]
pub struct PollerSnapshot {
    pub phase: PollPhase,
    pub status: DeviceStatusView,
    pub generation: u64,
    pub polls_completed: u64,
    pub polls_discarded: u64,
}

struct PollerInner {
    phase: PollPhase,
    status: DeviceStatus,
    generation: u64,
    in_flight: Option<JoinHandle<()>>,
    polls_completed: u64,
    polls_discarded: u64,
    closed: bool,
}

#[derive(Clone)]
pub struct DevicePoller {
    inner: Shared<PollerInner>,
    probe: Arc<dyn DeviceProbe>,
    delay: Duration,
}

impl DevicePoller {
    pub fn new(probe: Arc<dyn DeviceProbe>, delay: Duration) -> Self {
        Self {
            inner: new_state(PollerInner {
                phase: PollPhase::Idle,
                status: DeviceStatus::Disconnected,
                generation: 0,
                in_flight: None,
                polls_completed: 0,
                polls_discarded: 0,
                closed: false,
            }),
            probe,
            delay,
        }
    }

    /// Idle -> Polling. Doit être appelé depuis un runtime tokio.
    pub fn refresh(&self) -> RefreshOutcome {
        let mut inner = self.inner.lock();
        if inner.closed {
            return RefreshOutcome::ShutDown;
        }
        if inner.phase == PollPhase::Polling {
            tracing::debug!("[poller] refresh ignored, poll #{} in flight", inner.generation);
            return RefreshOutcome::AlreadyPolling {
                generation: inner.generation,
            };
        }

        inner.generation += 1;
        inner.phase = PollPhase::Polling;
        let generation = inner.generation;

        let poller = self.clone();
        inner.in_flight = Some(tokio::spawn(async move {
            tokio::time::sleep(poller.delay).await;
            let status = poller.probe.probe();
            poller.complete(generation, status);
        }));

        tracing::info!("[poller] poll #{generation} started ({}ms)", self.delay.as_millis());
        RefreshOutcome::Started { generation }
    }

    /// Polling -> Idle. Rejette tout résultat dont la génération n'est plus courante.
    pub(crate) fn complete(&self, generation: u64, status: DeviceStatus) -> bool {
        let mut inner = self.inner.lock();
        if inner.generation != generation || inner.phase != PollPhase::Polling {
            inner.polls_discarded += 1;
            tracing::warn!(
                "[poller] discarding stale poll #{generation} (current #{})",
                inner.generation
            );
            return false;
        }

        match &status {
            DeviceStatus::Connected { address, signal_quality, .. } => {
                tracing::info!("[poller] poll #{generation}: connected at {address} ({signal_quality}%)")
            }
            DeviceStatus::Disconnected => {
                tracing::warn!("[poller] poll #{generation}: device unreachable")
            }
        }

        inner.status = status;
        inner.phase = PollPhase::Idle;
        inner.in_flight = None;
        inner.polls_completed += 1;
        true
    }

    /// Démontage : annule le sondage en vol, plus aucun résultat ne s'applique
    pub fn shutdown(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        inner.generation += 1;
        inner.phase = PollPhase::Idle;
        if let Some(handle) = inner.in_flight.take() {
            handle.abort();
            tracing::info!("[poller] in-flight poll cancelled");
        }
    }

    pub fn status(&self) -> DeviceStatus {
        self.inner.lock().status.clone()
    }

    pub fn phase(&self) -> PollPhase {
        self.inner.lock().phase
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn probe_info(&self) -> PortInfo {
        self.probe.info()
    }

    pub fn snapshot(&self) -> PollerSnapshot {
        let inner = self.inner.lock();
        PollerSnapshot {
            phase: inner.phase,
            status: inner.status.view(),
            generation: inner.generation,
            polls_completed: inner.polls_completed,
            polls_discarded: inner.polls_discarded,
        }
    }
}
