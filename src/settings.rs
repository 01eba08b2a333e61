use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BizError, Result};
use crate::matcher::{MatchConfig, DEFAULT_PREFIX_LEN};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    /// Year used to complete `<day> <month>` dates on PDF statements.
    #[serde(default = "default_statement_year")]
    pub statement_year: i32,
    #[serde(default = "default_prefix_len")]
    pub vendor_prefix_len: usize,
}

fn default_statement_year() -> i32 {
    2025
}

fn default_prefix_len() -> usize {
    DEFAULT_PREFIX_LEN
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            statement_year: default_statement_year(),
            vendor_prefix_len: default_prefix_len(),
        }
    }
}

impl Settings {
    pub fn match_config(&self) -> MatchConfig {
        MatchConfig::new(self.vendor_prefix_len)
    }

    pub fn rules_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("rules.json")
    }

    pub fn profile_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("profile.json")
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("bizsplit")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("bizsplit")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if !path.exists() {
        return Settings::default();
    }
    let content = std::fs::read_to_string(&path).unwrap_or_default();
    serde_json::from_str(&content).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), "malformed settings, using defaults: {e}");
        Settings::default()
    })
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| BizError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

// ---------------------------------------------------------------------------
// Business profile
// ---------------------------------------------------------------------------

/// What the user told us about their business; only feeds suggestion prompts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessProfile {
    #[serde(default)]
    pub business_type: String,
    #[serde(default)]
    pub additional_context: String,
}

pub fn load_profile(path: &Path) -> BusinessProfile {
    let Ok(content) = std::fs::read_to_string(path) else {
        return BusinessProfile::default();
    };
    serde_json::from_str(&content).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), "malformed business profile: {e}");
        BusinessProfile::default()
    })
}

pub fn save_profile(path: &Path, profile: &BusinessProfile) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(profile)?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}
