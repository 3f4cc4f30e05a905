//! Registre des caméras de voie et sélection de la caméra affichée.

use crate::records::Lane;
use crate::traffic::TrafficLevel;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CameraError {
    #[error("camera not found: {0}")]
    NotFound(String),
    #[error("camera {0} is offline")]
    Offline(String),
    #[error("camera registry is empty")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraStatus {
    Active,
    Offline,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Camera {
    pub id: String,
    pub location: Lane,
    pub status: CameraStatus,
    pub traffic: TrafficLevel,
    pub avg_speed_kmh: u32,
    pub vehicle_count: u32,
}

impl Camera {
    pub fn new(id: impl Into<String>, location: Lane, status: CameraStatus, traffic: TrafficLevel) -> Self {
        let (avg_speed_kmh, vehicle_count) = match traffic {
            TrafficLevel::High => (20, 5),
            TrafficLevel::Moderate => (48, 98),
            TrafficLevel::Low => (65, 52),
        };
        Self {
            id: id.into(),
            location,
            status,
            traffic,
            avg_speed_kmh,
            vehicle_count,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == CameraStatus::Active
    }
}

#[derive(Debug, Clone)]
pub struct CameraRegistry {
    cameras: Vec<Camera>,
    selected: usize,
}

impl Default for CameraRegistry {
    fn default() -> Self {
        let cameras = vec![
            Camera::new("CAM-001", Lane::Lane1, CameraStatus::Active, TrafficLevel::High),
            Camera::new("CAM-002", Lane::Lane2, CameraStatus::Active, TrafficLevel::Moderate),
            Camera::new("CAM-003", Lane::Lane3, CameraStatus::Active, TrafficLevel::Low),
            Camera::new("CAM-004", Lane::Lane4, CameraStatus::Active, TrafficLevel::Low),
        ];
        Self { cameras, selected: 0 }
    }
}

impl CameraRegistry {
    pub fn new(cameras: Vec<Camera>) -> Result<Self, CameraError> {
        if cameras.is_empty() {
            return Err(CameraError::Empty);
        }
        Ok(Self { cameras, selected: 0 })
    }

    pub fn list(&self) -> &[Camera] {
        &self.cameras
    }

    pub fn selected(&self) -> &Camera {
        &self.cameras[self.selected]
    }

    /// Seule une caméra active peut être affichée
    pub fn select(&mut self, id: &str) -> Result<&Camera, CameraError> {
        let index = self
            .cameras
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| CameraError::NotFound(id.to_string()))?;
        if !self.cameras[index].is_active() {
            return Err(CameraError::Offline(id.to_string()));
        }
        self.selected = index;
        Ok(&self.cameras[index])
    }
}
