/*!
Sonde ESP32 scriptée pour tests sans aléa

Rejoue une file de statuts dans l'ordre ; une fois la file vide, renvoie
le statut de repli (déconnecté par défaut). Compte chaque appel pour
vérifier qu'un seul sondage a bien eu lieu.
*/

use speedwatch_kernel::device::DeviceStatus;
use speedwatch_kernel::ports::{DeviceProbe, PortInfo};
use std::collections::VecDeque;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

pub struct ScriptedProbe {
    script: Mutex<VecDeque<DeviceStatus>>,
    fallback: DeviceStatus,
    calls: AtomicUsize,
}

impl ScriptedProbe {
    pub fn new() -> Self {
        Self::always(DeviceStatus::Disconnected)
    }

    /// Renvoie toujours le même statut une fois le script épuisé
    pub fn always(status: DeviceStatus) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: status,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn push(&self, status: DeviceStatus) -> &Self {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(status);
        self
    }

    pub fn push_connected(&self, last_octet: u8, signal_quality: u8) -> &Self {
        self.push(connected(Ipv4Addr::new(192, 168, 1, last_octet), signal_quality))
    }

    pub fn push_disconnected(&self) -> &Self {
        self.push(DeviceStatus::Disconnected)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Default for ScriptedProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceProbe for ScriptedProbe {
    fn probe(&self) -> DeviceStatus {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let status = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        log::info!("🔌 [SCRIPTED] probe #{n} -> connected={}", status.is_connected());
        status
    }

    fn info(&self) -> PortInfo {
        PortInfo {
            name: "device".to_string(),
            backend: "scripted".to_string(),
            description: "Sonde de test rejouant un script de statuts".to_string(),
        }
    }
}

/// Statut connecté avec une heure de relevé fixe
pub fn connected(address: Ipv4Addr, signal_quality: u8) -> DeviceStatus {
    DeviceStatus::Connected {
        address,
        last_update: "10:00:00 AM".to_string(),
        signal_quality,
    }
}
