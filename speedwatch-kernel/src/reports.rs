//! Séries de rapports (trafic + infractions) par période.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeFrame {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl TimeFrame {
    /// Période inconnue => daily, et non monthly comme l'ancien écran de rapports
    pub fn parse_lenient(input: &str) -> Self {
        match input.trim().to_ascii_lowercase().as_str() {
            "weekly" => TimeFrame::Weekly,
            "monthly" => TimeFrame::Monthly,
            _ => TimeFrame::Daily,
        }
    }

    /// Clé de l'axe X côté graphique
    pub fn x_axis_key(self) -> &'static str {
        match self {
            TimeFrame::Daily => "hour",
            TimeFrame::Weekly => "day",
            TimeFrame::Monthly => "week",
        }
    }

    fn points(self) -> &'static [(&'static str, u32, u32)] {
        match self {
            TimeFrame::Daily => &[
                ("00:00", 10, 2),
                ("03:00", 5, 0),
                ("06:00", 25, 3),
                ("09:00", 65, 12),
                ("12:00", 45, 8),
                ("15:00", 55, 10),
                ("18:00", 70, 15),
                ("21:00", 30, 5),
            ],
            TimeFrame::Weekly => &[
                ("Mon", 45, 8),
                ("Tue", 50, 10),
                ("Wed", 55, 12),
                ("Thu", 60, 14),
                ("Fri", 70, 18),
                ("Sat", 40, 7),
                ("Sun", 30, 5),
            ],
            TimeFrame::Monthly => &[
                ("Week 1", 48, 42),
                ("Week 2", 52, 45),
                ("Week 3", 58, 50),
                ("Week 4", 62, 55),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportPoint {
    pub label: &'static str,
    pub traffic: u32,
    pub violations: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportSeries {
    pub timeframe: TimeFrame,
    pub x_axis_key: &'static str,
    pub points: Vec<ReportPoint>,
    pub total_violations: u32,
    pub peak_traffic: Option<&'static str>,
}

pub fn series(timeframe: TimeFrame) -> ReportSeries {
    let points: Vec<ReportPoint> = timeframe
        .points()
        .iter()
        .map(|&(label, traffic, violations)| ReportPoint { label, traffic, violations })
        .collect();
    let total_violations = points.iter().map(|p| p.violations).sum();
    // premier maximum en cas d'égalité
    let peak_traffic = points
        .iter()
        .fold(None::<&ReportPoint>, |best, p| match best {
            Some(b) if b.traffic >= p.traffic => Some(b),
            _ => Some(p),
        })
        .map(|p| p.label);

    ReportSeries {
        timeframe,
        x_axis_key: timeframe.x_axis_key(),
        points,
        total_violations,
        peak_traffic,
    }
}
