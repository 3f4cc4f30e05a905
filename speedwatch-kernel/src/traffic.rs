/**
 * TRAFFIC STATUS - Panneau d'état du trafic piloté par le microcontrôleur
 *
 * RÔLE :
 * Niveau de trafic courant (low / moderate / high) et mode de contrôle.
 * En mode auto le niveau suit les relevés capteur ; en mode manuel seul
 * l'opérateur le change (tests sur banc).
 *
 * CORRESPONDANCE CAPTEUR / LED :
 * - low      : 0-30   -> pin D2, LED verte
 * - moderate : 31-70  -> pin D3, LED jaune
 * - high     : 71-100 -> pin D4, LED rouge
 */

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TrafficError {
    #[error("traffic level can only be set in manual mode")]
    ManualModeRequired,
    #[error("sensor value {0} out of range 0-100")]
    SensorOutOfRange(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficLevel {
    Low,
    Moderate,
    High,
}

impl TrafficLevel {
    pub const ALL: [TrafficLevel; 3] = [TrafficLevel::Low, TrafficLevel::Moderate, TrafficLevel::High];

    pub fn label(self) -> &'static str {
        match self {
            TrafficLevel::Low => "Low Traffic (Smooth flow)",
            TrafficLevel::Moderate => "Moderate Traffic (Busy but moving)",
            TrafficLevel::High => "High Congestion (Heavy traffic)",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            TrafficLevel::Low => "Traffic is moving freely with no delays",
            TrafficLevel::Moderate => "Some congestion but traffic is still flowing",
            TrafficLevel::High => "Significant delays expected due to heavy traffic",
        }
    }

    pub fn sensor_range(self) -> RangeInclusive<u16> {
        match self {
            TrafficLevel::Low => 0..=30,
            TrafficLevel::Moderate => 31..=70,
            TrafficLevel::High => 71..=100,
        }
    }

    pub fn pin(self) -> &'static str {
        match self {
            TrafficLevel::Low => "D2",
            TrafficLevel::Moderate => "D3",
            TrafficLevel::High => "D4",
        }
    }

    pub fn led(self) -> &'static str {
        match self {
            TrafficLevel::Low => "Green LED",
            TrafficLevel::Moderate => "Yellow LED",
            TrafficLevel::High => "Red LED",
        }
    }

    /// Relevé capteur 0-100 -> niveau
    pub fn classify(sensor_value: u16) -> Result<Self, TrafficError> {
        TrafficLevel::ALL
            .into_iter()
            .find(|level| level.sensor_range().contains(&sensor_value))
            .ok_or(TrafficError::SensorOutOfRange(sensor_value))
    }

    pub fn info(self) -> LevelInfo {
        let range = self.sensor_range();
        LevelInfo {
            id: self,
            label: self.label(),
            description: self.description(),
            sensor_value: format!("{}-{}", range.start(), range.end()),
            microcontroller_pin: self.pin(),
            led_color: self.led(),
        }
    }
}

/// Métadonnées d'un niveau, telles qu'affichées sur l'écran d'accueil
#[derive(Debug, Clone, Serialize)]
pub struct LevelInfo {
    pub id: TrafficLevel,
    pub label: &'static str,
    pub description: &'static str,
    pub sensor_value: String,
    pub microcontroller_pin: &'static str,
    pub led_color: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlMode {
    #[default]
    Auto,
    Manual,
}

impl ControlMode {
    pub fn toggled(self) -> Self {
        match self {
            ControlMode::Auto => ControlMode::Manual,
            ControlMode::Manual => ControlMode::Auto,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrafficPanel {
    level: TrafficLevel,
    mode: ControlMode,
}

impl Default for TrafficPanel {
    fn default() -> Self {
        Self {
            level: TrafficLevel::Moderate,
            mode: ControlMode::Auto,
        }
    }
}

impl TrafficPanel {
    pub fn level(&self) -> TrafficLevel {
        self.level
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    pub fn toggle_mode(&mut self) -> ControlMode {
        self.mode = self.mode.toggled();
        tracing::info!("[traffic] control mode -> {:?}", self.mode);
        self.mode
    }

    /// Changement manuel ; refusé en mode auto
    pub fn set_level(&mut self, level: TrafficLevel) -> Result<(), TrafficError> {
        match self.mode {
            ControlMode::Manual => {
                self.level = level;
                Ok(())
            }
            ControlMode::Auto => Err(TrafficError::ManualModeRequired),
        }
    }

    /// Relevé capteur : appliqué seulement en mode auto.
    /// Retourne le niveau classé et s'il a été appliqué.
    pub fn apply_sensor_reading(&mut self, sensor_value: u16) -> Result<(TrafficLevel, bool), TrafficError> {
        let level = TrafficLevel::classify(sensor_value)?;
        let applied = self.mode == ControlMode::Auto;
        if applied {
            self.level = level;
        }
        Ok((level, applied))
    }
}
