//! Réglages opérateur : limites de vitesse par voie et alertes.
//!
//! Les limites arrivent sous forme de texte saisi ; une saisie non numérique
//! ou hors de 5-120 km/h est refusée et l'ancienne valeur est conservée.

use crate::records::Lane;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

pub const SPEED_LIMIT_RANGE: RangeInclusive<u32> = 5..=120;
pub const DEFAULT_SPEED_LIMIT: u32 = 20;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("speed limit is not a number: {0:?}")]
    InvalidNumber(String),
    #[error("speed limit {0} km/h outside 5-120")]
    OutOfRange(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    SpeedViolations,
    CongestionAlerts,
    CameraOffline,
    DailyReports,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LaneLimit {
    pub lane: Lane,
    pub speed_limit_kmh: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Notifications {
    pub speed_violations: bool,
    pub congestion_alerts: bool,
    pub camera_offline: bool,
    pub daily_reports: bool,
}

impl Default for Notifications {
    fn default() -> Self {
        Self {
            speed_violations: true,
            congestion_alerts: true,
            camera_offline: false,
            daily_reports: true,
        }
    }
}

impl Notifications {
    fn slot(&mut self, kind: NotificationKind) -> &mut bool {
        match kind {
            NotificationKind::SpeedViolations => &mut self.speed_violations,
            NotificationKind::CongestionAlerts => &mut self.congestion_alerts,
            NotificationKind::CameraOffline => &mut self.camera_offline,
            NotificationKind::DailyReports => &mut self.daily_reports,
        }
    }

    pub fn get(&self, kind: NotificationKind) -> bool {
        match kind {
            NotificationKind::SpeedViolations => self.speed_violations,
            NotificationKind::CongestionAlerts => self.congestion_alerts,
            NotificationKind::CameraOffline => self.camera_offline,
            NotificationKind::DailyReports => self.daily_reports,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    lanes: Vec<LaneLimit>,
    notifications: Notifications,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lanes: Lane::ALL
                .into_iter()
                .map(|lane| LaneLimit { lane, speed_limit_kmh: DEFAULT_SPEED_LIMIT })
                .collect(),
            notifications: Notifications::default(),
        }
    }
}

/// Parse une limite saisie par l'opérateur
pub fn parse_speed_limit(input: &str) -> Result<u32, SettingsError> {
    let value: u32 = input
        .trim()
        .parse()
        .map_err(|_| SettingsError::InvalidNumber(input.to_string()))?;
    if !SPEED_LIMIT_RANGE.contains(&value) {
        return Err(SettingsError::OutOfRange(value));
    }
    Ok(value)
}

impl Settings {
    pub fn lanes(&self) -> &[LaneLimit] {
        &self.lanes
    }

    pub fn notifications(&self) -> Notifications {
        self.notifications
    }

    pub fn speed_limit(&self, lane: Lane) -> u32 {
        self.lanes
            .iter()
            .find(|l| l.lane == lane)
            .map(|l| l.speed_limit_kmh)
            .unwrap_or(DEFAULT_SPEED_LIMIT)
    }

    pub fn set_speed_limit(&mut self, lane: Lane, input: &str) -> Result<u32, SettingsError> {
        let value = parse_speed_limit(input)?;
        match self.lanes.iter_mut().find(|l| l.lane == lane) {
            Some(limit) => limit.speed_limit_kmh = value,
            None => self.lanes.push(LaneLimit { lane, speed_limit_kmh: value }),
        }
        tracing::info!("[settings] {lane} speed limit -> {value} km/h");
        Ok(value)
    }

    /// Bascule une alerte, retourne le nouvel état
    pub fn toggle_notification(&mut self, kind: NotificationKind) -> bool {
        let slot = self.notifications.slot(kind);
        *slot = !*slot;
        *slot
    }
}
