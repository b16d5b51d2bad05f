use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub static CONFIG_PATH: Lazy<&'static Path> = Lazy::new(|| {
    Path::new(option_env!("PONTO_CONFIG_PATH").unwrap_or("/usr/local/etc/ponto/config.toml"))
});

pub static STORE_PREFIX: Lazy<&'static Path> = Lazy::new(|| {
    Path::new(option_env!("PONTO_STORE_PREFIX").unwrap_or("/usr/local/etc/ponto"))
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Acceptance threshold for recognition. The matcher floors this at 0.90
    /// no matter what is configured here.
    pub threshold: f32,
    /// Company scope for the local store.
    pub company: String,
    /// Device id stamped onto time entries from this kiosk.
    pub device: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threshold: 0.90,
            company: "default".to_string(),
            device: "totem-local".to_string(),
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = path.unwrap_or(&CONFIG_PATH);
    if !path.exists() {
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config at {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

pub fn save_config(cfg: &Config, path: Option<&Path>) -> Result<()> {
    let path = path.unwrap_or(&CONFIG_PATH);
    let data = toml::to_string_pretty(cfg)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = load_config(Some(Path::new("/nonexistent/config.toml"))).unwrap();
        assert_eq!(cfg.threshold, 0.90);
        assert_eq!(cfg.company, "default");
    }

    #[test]
    fn config_round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config {
            threshold: 0.92,
            company: "acme".to_string(),
            device: "kiosk-1".to_string(),
        };
        save_config(&cfg, Some(&path)).unwrap();
        let loaded = load_config(Some(&path)).unwrap();
        assert_eq!(loaded.threshold, 0.92);
        assert_eq!(loaded.company, "acme");
        assert_eq!(loaded.device, "kiosk-1");
    }
}
