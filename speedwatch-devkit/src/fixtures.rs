/*!
Builders d'infractions pour les tests

Permet de composer des journaux sur mesure (bornes de tranches, dates
absentes du jeu de démo) sans dupliquer le constructeur partout.
*/

use anyhow::Result;
use speedwatch_kernel::ports::mock::MockViolationSource;
use speedwatch_kernel::ports::{PortInfo, ViolationSource};
use speedwatch_kernel::records::{parse_iso_date, Lane, ViolationRecord};
use time::macros::date;
use time::Date;

/// Builder fluide d'une infraction
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    plate: String,
    speed_kmh: u32,
    timestamp: String,
    date: Date,
    lane: Lane,
}

impl RecordBuilder {
    pub fn new(plate: impl Into<String>) -> Self {
        Self {
            plate: plate.into(),
            speed_kmh: 25,
            timestamp: "10:00 AM".to_string(),
            date: date!(2023 - 03 - 15),
            lane: Lane::Lane1,
        }
    }

    pub fn speed(mut self, speed_kmh: u32) -> Self {
        self.speed_kmh = speed_kmh;
        self
    }

    pub fn at(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    pub fn on(mut self, date: Date) -> Self {
        self.date = date;
        self
    }

    /// Date au format `yyyy-MM-dd`
    pub fn on_iso(self, date: &str) -> Result<Self> {
        let parsed = parse_iso_date(date).ok_or_else(|| anyhow::anyhow!("invalid date: {date}"))?;
        Ok(self.on(parsed))
    }

    pub fn lane(mut self, lane: Lane) -> Self {
        self.lane = lane;
        self
    }

    pub fn build(self) -> ViolationRecord {
        ViolationRecord::new(self.plate, self.speed_kmh, self.timestamp, self.date, self.lane)
    }
}

/// Le journal de démonstration du kernel
pub fn sample_records() -> Vec<ViolationRecord> {
    MockViolationSource.records()
}

/// Une infraction par vitesse, plaques TEST-00, TEST-01...
pub fn records_with_speeds(speeds: &[u32]) -> Vec<ViolationRecord> {
    speeds
        .iter()
        .enumerate()
        .map(|(i, &speed)| RecordBuilder::new(format!("TEST-{i:02}")).speed(speed).build())
        .collect()
}

pub fn fixture_port() -> PortInfo {
    PortInfo {
        name: "violations".to_string(),
        backend: "fixture".to_string(),
        description: "Journal construit par le test".to_string(),
    }
}
