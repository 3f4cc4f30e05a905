/**
 * RECORD STORE - Journal des infractions de vitesse
 *
 * RÔLE :
 * Séquence ordonnée et immuable des infractions relevées par les caméras.
 * Chargée une seule fois au démarrage depuis un `ViolationSource`, puis
 * partagée en lecture seule pour toute la durée du processus.
 *
 * FONCTIONNEMENT :
 * - ViolationRecord = une infraction (plaque, vitesse, heure, date, voie)
 * - Lane = voie surveillée (Lane 1 à Lane 4)
 * - RecordStore = `Arc<[ViolationRecord]>`, clonage gratuit, aucune mutation
 */

use crate::ports::ViolationSource;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use time::macros::format_description;
use time::Date;

/// Voie surveillée par une caméra
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Lane {
    #[serde(rename = "Lane 1")]
    Lane1,
    #[serde(rename = "Lane 2")]
    Lane2,
    #[serde(rename = "Lane 3")]
    Lane3,
    #[serde(rename = "Lane 4")]
    Lane4,
}

impl Lane {
    pub const ALL: [Lane; 4] = [Lane::Lane1, Lane::Lane2, Lane::Lane3, Lane::Lane4];

    pub fn number(self) -> u8 {
        match self {
            Lane::Lane1 => 1,
            Lane::Lane2 => 2,
            Lane::Lane3 => 3,
            Lane::Lane4 => 4,
        }
    }

    pub fn from_number(number: u8) -> Option<Lane> {
        Lane::ALL.into_iter().find(|lane| lane.number() == number)
    }

    pub fn label(self) -> &'static str {
        match self {
            Lane::Lane1 => "Lane 1",
            Lane::Lane2 => "Lane 2",
            Lane::Lane3 => "Lane 3",
            Lane::Lane4 => "Lane 4",
        }
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Formate une date calendaire en `yyyy-MM-dd`
pub fn format_iso_date(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_default()
}

/// Parse une date `yyyy-MM-dd`, `None` si la saisie est invalide
pub fn parse_iso_date(input: &str) -> Option<Date> {
    Date::parse(input.trim(), format_description!("[year]-[month]-[day]")).ok()
}

/// (Dé)sérialisation serde d'une `Date` au format `yyyy-MM-dd`
pub mod iso_date {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_iso_date(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_iso_date(&raw).ok_or_else(|| D::Error::custom(format!("invalid date: {raw}")))
    }
}

/// Une infraction de vitesse relevée sur une voie.
/// Les champs sont privés : un enregistrement ne change plus une fois construit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationRecord {
    plate: String,
    speed_kmh: u32,
    timestamp: String,
    #[serde(with = "iso_date")]
    date: Date,
    location: Lane,
}

impl ViolationRecord {
    pub fn new(
        plate: impl Into<String>,
        speed_kmh: u32,
        timestamp: impl Into<String>,
        date: Date,
        location: Lane,
    ) -> Self {
        Self {
            plate: plate.into(),
            speed_kmh,
            timestamp: timestamp.into(),
            date,
            location,
        }
    }

    pub fn plate(&self) -> &str {
        &self.plate
    }

    pub fn speed_kmh(&self) -> u32 {
        self.speed_kmh
    }

    /// Heure locale du relevé (ex: "10:15 AM")
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn date(&self) -> Date {
        self.date
    }

    pub fn location(&self) -> Lane {
        self.location
    }
}

/// Stock immuable des infractions, partagé entre toutes les requêtes
#[derive(Debug, Clone)]
pub struct RecordStore {
    records: Arc<[ViolationRecord]>,
}

impl RecordStore {
    pub fn new(records: Vec<ViolationRecord>) -> Self {
        Self {
            records: records.into(),
        }
    }

    /// Charge le stock depuis un port de données (mock ou backend réel)
    pub fn from_source(source: &dyn ViolationSource) -> Self {
        let records = source.records();
        tracing::debug!("[records] loaded {} records from {}", records.len(), source.info().name);
        Self::new(records)
    }

    pub fn records(&self) -> &[ViolationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
