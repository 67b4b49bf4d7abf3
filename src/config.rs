// ⚙️ Configuration - JSON settings with defaults
// Loaded once at startup by the binaries and passed down explicitly.

use crate::buckets::LabelSet;
use anyhow::{bail, Context, Result};
use chrono::{FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable pointing at a config file
pub const CONFIG_ENV: &str = "SHOP_LEDGER_CONFIG";

/// Config file picked up from the working directory when present
pub const DEFAULT_CONFIG_FILE: &str = "shop-ledger.json";

const MAX_OFFSET_MINUTES: i32 = 14 * 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Months shown in the monthly chart (6 or 12)
    pub monthly_window: usize,

    pub labels: LabelSet,

    /// Shop-local offset from UTC, in minutes
    pub utc_offset_minutes: i32,

    /// user label -> password for the login gate
    pub users: HashMap<String, String>,

    /// Directory holding sales.csv, expenses.csv and debts.csv
    pub data_dir: PathBuf,

    pub server_addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            monthly_window: 12,
            labels: LabelSet::En,
            utc_offset_minutes: 0,
            users: HashMap::new(),
            data_dir: PathBuf::from("data"),
            server_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl AppConfig {
    /// Resolve the config: `$SHOP_LEDGER_CONFIG`, then `./shop-ledger.json`,
    /// then defaults. The result is validated.
    pub fn load() -> Result<Self> {
        let config = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::load_from(Path::new(&path))?,
            Err(_) if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::load_from(Path::new(DEFAULT_CONFIG_FILE))?
            }
            Err(_) => {
                log::debug!("No config file found, using defaults");
                AppConfig::default()
            }
        };

        config.validate()?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.monthly_window != 6 && self.monthly_window != 12 {
            bail!(
                "monthly_window must be 6 or 12, got {}",
                self.monthly_window
            );
        }

        if self.utc_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            bail!(
                "utc_offset_minutes must be within ±{}, got {}",
                MAX_OFFSET_MINUTES,
                self.utc_offset_minutes
            );
        }

        Ok(())
    }

    pub fn offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .with_context(|| format!("Invalid UTC offset: {} minutes", self.utc_offset_minutes))
    }

    /// Current shop-local time. Binaries call this once per trigger and pass
    /// the value down; library code never reads the clock itself.
    pub fn now(&self) -> Result<NaiveDateTime> {
        Ok(Utc::now().with_timezone(&self.offset()?).naive_local())
    }

    pub fn sales_path(&self) -> PathBuf {
        self.data_dir.join("sales.csv")
    }

    pub fn expenses_path(&self) -> PathBuf {
        self.data_dir.join("expenses.csv")
    }

    pub fn debts_path(&self) -> PathBuf {
        self.data_dir.join("debts.csv")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.monthly_window, 12);
        assert_eq!(config.sales_path(), PathBuf::from("data/sales.csv"));
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"monthly_window": 6, "labels": "es", "users": {{"caja": "1234"}}}}"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.monthly_window, 6);
        assert_eq!(config.labels, LabelSet::Es);
        assert_eq!(config.users.get("caja").map(String::as_str), Some("1234"));
        assert_eq!(config.server_addr, "0.0.0.0:3000");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_window_and_offset() {
        let config = AppConfig {
            monthly_window: 9,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AppConfig {
            utc_offset_minutes: 15 * 60,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_offset_minutes() {
        let config = AppConfig {
            utc_offset_minutes: -300,
            ..AppConfig::default()
        };
        assert_eq!(config.offset().unwrap().local_minus_utc(), -300 * 60);
    }
}
