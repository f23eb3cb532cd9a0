use serde::{Deserialize, Serialize};

use crate::error::ViewerError;

pub const CONFIG_URL: &str = "assets/config.json";

/// Deployment settings read from `assets/config.json`. Scene constants are
/// not configurable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    /// Directory the texture images are served from.
    pub asset_base: String,
    /// Maximum log level (`error`, `warn`, `info`, `debug`, `trace`).
    pub log_level: String,
    /// Render into an existing canvas instead of appending a new one.
    pub canvas_id: Option<String>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        ViewerConfig {
            asset_base: "assets/images".to_string(),
            log_level: "info".to_string(),
            canvas_id: None,
        }
    }
}

impl ViewerConfig {
    pub fn from_json(text: &str) -> Result<Self, ViewerError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Falls back to `Info` when the configured level is not recognised.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }

    pub fn asset_url(&self, file_name: &str) -> String {
        let base = self.asset_base.trim_end_matches('/');
        if base.is_empty() {
            file_name.to_string()
        } else {
            format!("{}/{}", base, file_name)
        }
    }
}
