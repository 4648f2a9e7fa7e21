use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::ai_client::{AiConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::editor::DEFAULT_HIT_RADIUS_PX;

const APP_DIR: &str = "playbook_terminal";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub hit_radius_px: f64,
    pub cell_width_px: f64,
    pub cell_height_px: f64,
    pub tick_rate: Duration,
    pub export_dir: PathBuf,
    pub seed_samples: bool,
    pub ai: Option<AiConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            hit_radius_px: DEFAULT_HIT_RADIUS_PX,
            cell_width_px: 8.0,
            cell_height_px: 16.0,
            tick_rate: Duration::from_millis(250),
            export_dir: PathBuf::from("."),
            seed_samples: true,
            ai: None,
        }
    }
}

impl AppConfig {
    /// Reads settings from the process environment. Call after the dotenv
    /// files have been loaded.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let hit_radius_px = lookup("PLAYBOOK_HIT_RADIUS_PX")
            .and_then(|val| val.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(DEFAULT_HIT_RADIUS_PX)
            .clamp(4.0, 64.0);
        let cell_width_px = lookup("PLAYBOOK_CELL_WIDTH_PX")
            .and_then(|val| val.trim().parse::<u16>().ok())
            .unwrap_or(8)
            .max(1);
        let cell_height_px = lookup("PLAYBOOK_CELL_HEIGHT_PX")
            .and_then(|val| val.trim().parse::<u16>().ok())
            .unwrap_or(16)
            .max(1);
        let tick_ms = lookup("PLAYBOOK_TICK_MS")
            .and_then(|val| val.trim().parse::<u64>().ok())
            .unwrap_or(250)
            .max(50);
        let seed_samples = lookup("PLAYBOOK_SAMPLES")
            .map(|val| parse_flag(&val))
            .unwrap_or(true);

        Self {
            hit_radius_px,
            cell_width_px: f64::from(cell_width_px),
            cell_height_px: f64::from(cell_height_px),
            tick_rate: Duration::from_millis(tick_ms),
            export_dir: export_dir(&lookup),
            seed_samples,
            ai: ai_config(&lookup),
        }
    }
}

fn parse_flag(raw: &str) -> bool {
    !matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn export_dir(lookup: &impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(dir) = non_empty(lookup("PLAYBOOK_EXPORT_DIR")) {
        return PathBuf::from(dir);
    }
    // Prefer XDG data.
    if let Some(base) = non_empty(lookup("XDG_DATA_HOME")) {
        return PathBuf::from(base).join(APP_DIR);
    }
    if let Some(home) = non_empty(lookup("HOME")) {
        return PathBuf::from(home).join(".local").join("share").join(APP_DIR);
    }
    PathBuf::from(".")
}

fn ai_config(lookup: &impl Fn(&str) -> Option<String>) -> Option<AiConfig> {
    let api_key = non_empty(lookup("GEMINI_API_KEY"))?;
    let timeout_secs = lookup("AI_TIMEOUT_SECS")
        .and_then(|val| val.trim().parse::<u64>().ok())
        .unwrap_or(30)
        .clamp(1, 300);
    Some(AiConfig {
        api_key,
        model: non_empty(lookup("AI_MODEL")).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        base_url: non_empty(lookup("AI_BASE_URL")).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        timeout: Duration::from_secs(timeout_secs),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = config_from(&[]);
        assert_eq!(cfg.hit_radius_px, 16.0);
        assert_eq!(cfg.cell_width_px, 8.0);
        assert_eq!(cfg.cell_height_px, 16.0);
        assert_eq!(cfg.tick_rate, Duration::from_millis(250));
        assert_eq!(cfg.export_dir, PathBuf::from("."));
        assert!(cfg.seed_samples);
        assert!(cfg.ai.is_none());
    }

    #[test]
    fn clamps_and_falls_back_on_garbage() {
        let cfg = config_from(&[
            ("PLAYBOOK_HIT_RADIUS_PX", "500"),
            ("PLAYBOOK_TICK_MS", "5"),
            ("PLAYBOOK_CELL_WIDTH_PX", "wide"),
            ("PLAYBOOK_SAMPLES", "off"),
        ]);
        assert_eq!(cfg.hit_radius_px, 64.0);
        assert_eq!(cfg.tick_rate, Duration::from_millis(50));
        assert_eq!(cfg.cell_width_px, 8.0);
        assert!(!cfg.seed_samples);
    }

    #[test]
    fn export_dir_prefers_explicit_then_xdg_then_home() {
        let cfg = config_from(&[("HOME", "/home/coach"), ("XDG_DATA_HOME", "/data")]);
        assert_eq!(cfg.export_dir, PathBuf::from("/data/playbook_terminal"));
        let cfg = config_from(&[("HOME", "/home/coach")]);
        assert_eq!(
            cfg.export_dir,
            PathBuf::from("/home/coach/.local/share/playbook_terminal")
        );
        let cfg = config_from(&[("HOME", "/home/coach"), ("PLAYBOOK_EXPORT_DIR", "/tmp/x")]);
        assert_eq!(cfg.export_dir, PathBuf::from("/tmp/x"));
    }

    #[test]
    fn ai_enabled_only_with_key() {
        let cfg = config_from(&[("GEMINI_API_KEY", "  "), ("AI_MODEL", "other")]);
        assert!(cfg.ai.is_none());
        let cfg = config_from(&[("GEMINI_API_KEY", "secret"), ("AI_TIMEOUT_SECS", "9")]);
        let ai = cfg.ai.expect("ai config");
        assert_eq!(ai.api_key, "secret");
        assert_eq!(ai.model, DEFAULT_MODEL);
        assert_eq!(ai.timeout, Duration::from_secs(9));
    }
}
