/**
 * PORTS MOCK - Implémentations embarquées des ports
 *
 * - MockViolationSource : les 8 infractions de démonstration (13 au 15 mars 2023)
 * - SimulatedProbe : ESP32 simulé, connecté dans ~70% des sondages
 *
 * Sur succès : adresse `<subnet>.<0..=254>`, heure locale du relevé,
 * signal entre signal_min et signal_max (70..=99 par défaut).
 */

use super::{DeviceProbe, PortInfo, ViolationSource};
use crate::config::PollerConf;
use crate::device::{local_time_of_day, DeviceStatus};
use crate::records::{Lane, ViolationRecord};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::net::Ipv4Addr;
use time::macros::date;

pub struct MockViolationSource;

impl ViolationSource for MockViolationSource {
    fn records(&self) -> Vec<ViolationRecord> {
        vec![
            ViolationRecord::new("KA-01-AB-1234", 38, "10:15 AM", date!(2023 - 03 - 15), Lane::Lane2),
            ViolationRecord::new("KA-02-CD-5678", 32, "10:32 AM", date!(2023 - 03 - 15), Lane::Lane4),
            ViolationRecord::new("KA-03-EF-9012", 25, "11:05 AM", date!(2023 - 03 - 15), Lane::Lane1),
            ViolationRecord::new("KA-04-GH-3456", 28, "11:47 AM", date!(2023 - 03 - 14), Lane::Lane3),
            ViolationRecord::new("KA-05-IJ-7890", 26, "12:23 PM", date!(2023 - 03 - 14), Lane::Lane4),
            ViolationRecord::new("KA-06-KL-1234", 29, "09:15 AM", date!(2023 - 03 - 14), Lane::Lane2),
            ViolationRecord::new("KA-07-MN-5678", 32, "08:45 AM", date!(2023 - 03 - 13), Lane::Lane1),
            ViolationRecord::new("KA-08-OP-9012", 25, "07:30 AM", date!(2023 - 03 - 13), Lane::Lane4),
        ]
    }

    fn info(&self) -> PortInfo {
        PortInfo {
            name: "violations".to_string(),
            backend: "mock".to_string(),
            description: "Journal d'infractions de démonstration compilé dans le binaire".to_string(),
        }
    }
}

pub struct SimulatedProbe {
    success_probability: f64,
    subnet: Ipv4Addr,
    signal_min: u8,
    signal_max: u8,
    rng: Mutex<StdRng>,
}

impl SimulatedProbe {
    /// `conf` doit avoir passé `PollerConf::validate`
    pub fn new(conf: &PollerConf) -> Self {
        Self::with_rng(conf, StdRng::from_entropy())
    }

    /// Sonde déterministe pour les tests
    pub fn seeded(conf: &PollerConf, seed: u64) -> Self {
        Self::with_rng(conf, StdRng::seed_from_u64(seed))
    }

    fn with_rng(conf: &PollerConf, rng: StdRng) -> Self {
        Self {
            success_probability: conf.success_probability.clamp(0.0, 1.0),
            subnet: conf.subnet,
            signal_min: conf.signal_min.min(conf.signal_max),
            signal_max: conf.signal_max,
            rng: Mutex::new(rng),
        }
    }
}

impl DeviceProbe for SimulatedProbe {
    fn probe(&self) -> DeviceStatus {
        let mut rng = self.rng.lock();
        if !rng.gen_bool(self.success_probability) {
            return DeviceStatus::Disconnected;
        }

        let [a, b, c, _] = self.subnet.octets();
        DeviceStatus::Connected {
            address: Ipv4Addr::new(a, b, c, rng.gen_range(0..=254)),
            last_update: local_time_of_day(),
            signal_quality: rng.gen_range(self.signal_min..=self.signal_max),
        }
    }

    fn info(&self) -> PortInfo {
        PortInfo {
            name: "device".to_string(),
            backend: "simulated".to_string(),
            description: format!(
                "ESP32 simulé ({}% de succès)",
                (self.success_probability * 100.0).round()
            ),
        }
    }
}
