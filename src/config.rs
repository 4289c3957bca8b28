//! Configuration for pipeline-simulator.
//!
//! Sources, later ones overriding earlier ones:
//! 1. Built-in defaults
//! 2. User config file (`~/.config/pipeline-simulator/config.toml`)
//! 3. Project-local config file (`./pipeline-simulator.toml`)
//! 4. Environment variables (`PIPESIM_STAGES`, `PIPESIM_MAX_ITEMS`,
//!    `PIPESIM_TICK_MS`, `PIPESIM_ID_PREFIX`)
//!
//! # Config File Format
//!
//! ```toml
//! stage_count = 5
//! stage_labels = ["IF", "ID", "EX", "MEM", "WB"]
//! default_count = 5
//! max_items = 20
//! tick_ms = 1000
//! ```

use crate::core::{Stage, StageSet};
use crate::error::ValidationError;
use crate::registry::{DEFAULT_ID_PREFIX, DEFAULT_MAX_ITEMS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const MIN_TICK_MS: u64 = 100;
pub const MAX_TICK_MS: u64 = 2000;

const LOCAL_CONFIG: &str = "pipeline-simulator.toml";
const CONFIG_DIR: &str = "pipeline-simulator";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Number of stages every item passes through.
    pub stage_count: usize,
    /// Short stage labels. Empty means derive from `stage_count`.
    pub stage_labels: Vec<String>,
    /// Items per run when the caller does not say.
    pub default_count: usize,
    /// Upper bound on items per run.
    pub max_items: usize,
    /// Prefix for generated identifiers.
    pub id_prefix: String,
    /// Driver tick period in milliseconds.
    pub tick_ms: u64,
    /// Keep every cycle snapshot in the run.
    pub record_history: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            stage_count: 5,
            stage_labels: Vec::new(),
            default_count: 5,
            max_items: DEFAULT_MAX_ITEMS,
            id_prefix: DEFAULT_ID_PREFIX.to_string(),
            tick_ms: 1000,
            record_history: true,
        }
    }
}

/// Partial config as read from a file; only present keys override.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    stage_count: Option<usize>,
    stage_labels: Option<Vec<String>>,
    default_count: Option<usize>,
    max_items: Option<usize>,
    id_prefix: Option<String>,
    tick_ms: Option<u64>,
    record_history: Option<bool>,
}

impl SimConfig {
    /// Load configuration from all sources.
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(path) = Self::user_config_path() {
            if let Some(file) = Self::read_file(&path) {
                config.merge(file);
            }
        }

        if let Some(file) = Self::read_file(Path::new(LOCAL_CONFIG)) {
            config.merge(file);
        }

        config.apply_env_overrides();
        log::debug!("Loaded configuration: {:?}", config);
        config
    }

    /// Defaults overridden by one explicit file. Unlike `load`, a missing or
    /// malformed file is an error.
    pub fn load_from(path: &Path) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config = Self::from_toml(&content)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ValidationError> {
        let file: ConfigFile =
            toml::from_str(content).map_err(|e| ValidationError::Config(e.to_string()))?;
        let mut config = Self::default();
        config.merge(file);
        Ok(config)
    }

    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR).join("config.toml"))
    }

    fn read_file(path: &Path) -> Option<ConfigFile> {
        if !path.exists() {
            return None;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(file) => {
                    log::info!("Loaded config from {}", path.display());
                    Some(file)
                }
                Err(e) => {
                    log::warn!("Failed to parse {}: {}", path.display(), e);
                    None
                }
            },
            Err(e) => {
                log::warn!("Failed to read {}: {}", path.display(), e);
                None
            }
        }
    }

    fn merge(&mut self, file: ConfigFile) {
        if let Some(v) = file.stage_count {
            self.stage_count = v;
        }
        if let Some(v) = file.stage_labels {
            self.stage_labels = v;
        }
        if let Some(v) = file.default_count {
            self.default_count = v;
        }
        if let Some(v) = file.max_items {
            self.max_items = v;
        }
        if let Some(v) = file.id_prefix {
            self.id_prefix = v;
        }
        if let Some(v) = file.tick_ms {
            self.tick_ms = v;
        }
        if let Some(v) = file.record_history {
            self.record_history = v;
        }
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("PIPESIM_STAGES") {
            match v.parse() {
                Ok(n) => self.stage_count = n,
                Err(_) => log::warn!("Ignoring PIPESIM_STAGES={v}: not a number"),
            }
        }
        if let Some(v) = lookup("PIPESIM_MAX_ITEMS") {
            match v.parse() {
                Ok(n) => self.max_items = n,
                Err(_) => log::warn!("Ignoring PIPESIM_MAX_ITEMS={v}: not a number"),
            }
        }
        if let Some(v) = lookup("PIPESIM_TICK_MS") {
            match v.parse() {
                Ok(n) => self.tick_ms = n,
                Err(_) => log::warn!("Ignoring PIPESIM_TICK_MS={v}: not a number"),
            }
        }
        if let Some(v) = lookup("PIPESIM_ID_PREFIX") {
            self.id_prefix = v;
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.stage_count == 0 {
            return Err(ValidationError::InvalidStageCount(0));
        }
        if !self.stage_labels.is_empty() && self.stage_labels.len() != self.stage_count {
            return Err(ValidationError::StageLabelMismatch {
                stages: self.stage_count,
                labels: self.stage_labels.len(),
            });
        }
        if self.max_items == 0 {
            return Err(ValidationError::Config("max_items must be at least 1".into()));
        }
        if self.default_count == 0 || self.default_count > self.max_items {
            return Err(ValidationError::Config(format!(
                "default_count must be within 1..={}",
                self.max_items
            )));
        }
        Ok(())
    }

    /// Stages described by this config.
    pub fn stage_set(&self) -> Result<StageSet, ValidationError> {
        self.validate()?;
        if self.stage_labels.is_empty() {
            return StageSet::with_count(self.stage_count);
        }
        let defaults = StageSet::default();
        let stages = self
            .stage_labels
            .iter()
            .map(|label| {
                let name = defaults
                    .iter()
                    .find(|s| s.label == *label)
                    .map_or_else(|| label.clone(), |s| s.name.clone());
                Stage::new(label.clone(), name)
            })
            .collect();
        StageSet::new(stages)
    }

    pub fn tick_ms_clamped(&self) -> u64 {
        self.tick_ms.clamp(MIN_TICK_MS, MAX_TICK_MS)
    }

    /// Generate a sample config file content.
    pub fn sample() -> String {
        r#"# pipeline-simulator configuration
# Place this file at ~/.config/pipeline-simulator/config.toml or ./pipeline-simulator.toml

# Stages every item passes through
stage_count = 5
# Optional short labels, one per stage
stage_labels = ["IF", "ID", "EX", "MEM", "WB"]

# Items per run and the upper bound
default_count = 5
max_items = 20

# Prefix for generated identifiers (SH-001, SH-002, ...)
id_prefix = "SH"

# Driver tick period in milliseconds (100..=2000)
tick_ms = 1000
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let cfg = SimConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.stage_set().unwrap(), StageSet::default());
        assert_eq!(cfg.max_items, 20);
    }

    #[test]
    fn sample_parses_to_defaults() {
        let cfg = SimConfig::from_toml(&SimConfig::sample()).unwrap();
        assert_eq!(cfg.stage_count, 5);
        assert_eq!(cfg.stage_set().unwrap().label(3), "MEM");
        assert_eq!(cfg.stage_set().unwrap().get(3).unwrap().name, "Memory Access");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg = SimConfig::from_toml("stage_count = 3\ntick_ms = 250\n").unwrap();
        assert_eq!(cfg.stage_count, 3);
        assert_eq!(cfg.tick_ms, 250);
        assert_eq!(cfg.max_items, 20);
        assert_eq!(cfg.stage_set().unwrap().label(0), "S1");
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        assert!(matches!(
            SimConfig::from_toml("stage_count = \"five\""),
            Err(ValidationError::Config(_))
        ));
    }

    #[test]
    fn explicit_file_reports_parse_and_read_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"max_items = 12\n").unwrap();
        assert_eq!(SimConfig::load_from(file.path()).unwrap().max_items, 12);

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        bad.write_all(b"stage_count = [").unwrap();
        let err = SimConfig::load_from(bad.path()).unwrap_err();
        assert!(matches!(err, ValidationError::Config(_)));

        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        match SimConfig::load_from(&missing) {
            Err(ValidationError::Config(msg)) => assert!(msg.contains("cannot read")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn label_count_must_match_stage_count() {
        let cfg = SimConfig {
            stage_count: 4,
            stage_labels: vec!["A".into(), "B".into()],
            ..SimConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ValidationError::StageLabelMismatch { stages: 4, labels: 2 })
        );
    }

    #[test]
    fn overrides_apply_and_bad_numbers_are_ignored() {
        let env: HashMap<&str, &str> = [
            ("PIPESIM_STAGES", "3"),
            ("PIPESIM_TICK_MS", "fast"),
            ("PIPESIM_ID_PREFIX", "CAR"),
        ]
        .into_iter()
        .collect();
        let mut cfg = SimConfig::default();
        cfg.apply_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.stage_count, 3);
        assert_eq!(cfg.tick_ms, 1000);
        assert_eq!(cfg.id_prefix, "CAR");
    }

    #[test]
    fn tick_is_clamped() {
        let cfg = SimConfig { tick_ms: 5, ..SimConfig::default() };
        assert_eq!(cfg.tick_ms_clamped(), MIN_TICK_MS);
    }
}
