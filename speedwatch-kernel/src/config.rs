use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;
use tokio::fs;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("success_probability must be within [0, 1], got {0}")]
    InvalidProbability(f64),
    #[error("invalid signal range {min}..={max}")]
    InvalidSignalRange { min: u8, max: u8 },
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct KernelConfig {
    pub http: HttpConf,
    pub poller: PollerConf,
    pub health: HealthConf,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConf {
    pub bind: SocketAddr,
    /// Si défini, header x-api-key obligatoire (sauf /health)
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct PollerConf {
    pub delay_ms: u64,
    pub success_probability: f64,
    pub subnet: Ipv4Addr, // seul le dernier octet est tiré au sort
    pub signal_min: u8,
    pub signal_max: u8,
    pub poll_on_start: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct HealthConf {
    /// 0 = pas de rapport périodique dans les logs
    pub report_interval_secs: u64,
}

impl Default for HttpConf {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
            api_key: None,
        }
    }
}

impl Default for PollerConf {
    fn default() -> Self {
        Self {
            delay_ms: 1500,
            success_probability: 0.7,
            subnet: Ipv4Addr::new(192, 168, 1, 0),
            signal_min: 70,
            signal_max: 99,
            poll_on_start: true,
        }
    }
}

impl Default for HealthConf {
    fn default() -> Self {
        Self { report_interval_secs: 60 }
    }
}

impl PollerConf {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.success_probability) {
            return Err(ConfigError::InvalidProbability(self.success_probability));
        }
        if self.signal_min > self.signal_max || self.signal_max > 100 {
            return Err(ConfigError::InvalidSignalRange {
                min: self.signal_min,
                max: self.signal_max,
            });
        }
        Ok(())
    }
}

/// Parse + valide une config YAML ; texte vide = config par défaut
pub fn parse_config(txt: &str) -> Result<KernelConfig, ConfigError> {
    if txt.trim().is_empty() {
        return Ok(KernelConfig::default());
    }
    let cfg: KernelConfig = serde_yaml::from_str(txt)?;
    cfg.poller.validate()?;
    Ok(cfg)
}

pub async fn load_config() -> KernelConfig {
    let path = std::env::var("SPEEDWATCH_CONFIG").unwrap_or_else(|_| "speedwatch.yaml".into());
    let mut cfg = load_config_from(Path::new(&path)).await;
    apply_env_overrides(&mut cfg);
    cfg
}

pub async fn load_config_from(path: &Path) -> KernelConfig {
    if !path.exists() {
        tracing::warn!("[kernel] no {}, using default config", path.display());
        return KernelConfig::default();
    }
    let txt = match fs::read_to_string(path).await {
        Ok(txt) => txt,
        Err(e) => {
            tracing::error!("[kernel] unreadable config {}: {e}", path.display());
            return KernelConfig::default();
        }
    };
    parse_config(&txt).unwrap_or_else(|e| {
        tracing::error!("[kernel] invalid config {}: {e}", path.display());
        KernelConfig::default()
    })
}

fn apply_env_overrides(cfg: &mut KernelConfig) {
    if let Ok(bind) = std::env::var("SPEEDWATCH_BIND") {
        match bind.parse::<SocketAddr>() {
            Ok(addr) => cfg.http.bind = addr,
            Err(e) => tracing::warn!("[kernel] ignoring SPEEDWATCH_BIND={bind}: {e}"),
        }
    }
    if let Ok(key) = std::env::var("SPEEDWATCH_API_KEY") {
        if !key.is_empty() {
            cfg.http.api_key = Some(key);
        }
    }
}
