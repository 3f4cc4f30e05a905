/**
 * PORTS - Frontières du kernel vers le monde extérieur
 *
 * RÔLE :
 * Les deux seules interfaces qu'un collaborateur externe (backend réel,
 * driver ESP32 réel) doit implémenter pour remplacer les mocks embarqués.
 *
 * FONCTIONNEMENT :
 * - ViolationSource = fournit le journal des infractions (lu une fois au boot)
 * - DeviceProbe = sonde nullaire qui produit un DeviceStatus complet
 * - PortInfo = description exposée sur GET /ports
 *
 * Le délai de la sonde est géré par le `DevicePoller`, pas par le port.
 */

pub mod mock;

use crate::device::DeviceStatus;
use crate::records::ViolationRecord;
use serde::{Deserialize, Serialize};

/// Informations descriptives d'un port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortInfo {
    /// Nom du port (ex: "violations", "device")
    pub name: String,
    /// Implémentation branchée (ex: "mock", "simulated")
    pub backend: String,
    pub description: String,
}

/// Source du journal des infractions
pub trait ViolationSource: Send + Sync {
    /// Toutes les infractions, dans l'ordre d'affichage
    fn records(&self) -> Vec<ViolationRecord>;

    fn info(&self) -> PortInfo;
}

/// Sonde de connectivité du microcontrôleur
pub trait DeviceProbe: Send + Sync {
    /// Un relevé complet ; un échec de connexion n'est pas une erreur
    fn probe(&self) -> DeviceStatus;

    fn info(&self) -> PortInfo;
}
