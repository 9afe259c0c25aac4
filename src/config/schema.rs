use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::monitor::MonitorSettings;

/// Application settings, read from `~/.config/contact-sieve/config.yaml`.
///
/// Every field has a default, so an empty or missing file is valid.
///
/// Example:
/// ```yaml
/// rulesets_dir: ~/rulesets
/// workers: 8
/// history_retention: 90d
/// monitor:
///   min_quality_score: 75
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Directory of `<name>.yaml` rulesets (default: `<config dir>/rulesets`)
    #[serde(default)]
    pub rulesets_dir: Option<PathBuf>,

    /// Directory of monitor history files (default: `<config dir>/history`)
    #[serde(default)]
    pub history_dir: Option<PathBuf>,

    /// How long history points are kept, e.g. "90d"
    #[serde(default = "default_retention")]
    pub history_retention: String,

    /// Classification threads; 0 means one per CPU
    #[serde(default)]
    pub workers: usize,

    #[serde(default = "default_max_high_tier_pct")]
    pub max_high_tier_pct: f64,

    #[serde(default)]
    pub monitor: MonitorThresholds,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MonitorThresholds {
    #[serde(default = "default_min_quality_score")]
    pub min_quality_score: u32,
    #[serde(default = "default_min_test_accuracy")]
    pub min_test_accuracy: f64,
    #[serde(default = "default_min_throughput")]
    pub min_throughput: f64,
    #[serde(default = "default_test_samples")]
    pub test_samples: usize,
    #[serde(default = "default_benchmark_samples")]
    pub benchmark_samples: usize,
}

fn default_retention() -> String {
    "90d".to_string()
}

fn default_max_high_tier_pct() -> f64 {
    50.0
}

fn default_min_quality_score() -> u32 {
    70
}

fn default_min_test_accuracy() -> f64 {
    0.80
}

fn default_min_throughput() -> f64 {
    1000.0
}

fn default_test_samples() -> usize {
    100
}

fn default_benchmark_samples() -> usize {
    1000
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rulesets_dir: None,
            history_dir: None,
            history_retention: default_retention(),
            workers: 0,
            max_high_tier_pct: default_max_high_tier_pct(),
            monitor: MonitorThresholds::default(),
        }
    }
}

impl Default for MonitorThresholds {
    fn default() -> Self {
        Self {
            min_quality_score: default_min_quality_score(),
            min_test_accuracy: default_min_test_accuracy(),
            min_throughput: default_min_throughput(),
            test_samples: default_test_samples(),
            benchmark_samples: default_benchmark_samples(),
        }
    }
}

impl Settings {
    pub fn retention(&self) -> Result<Duration> {
        humantime::parse_duration(self.history_retention.trim())
            .with_context(|| format!("Invalid history_retention '{}'", self.history_retention))
    }

    /// Worker count with 0 resolved to the available parallelism.
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
        }
    }

    pub fn monitor_settings(&self) -> Result<MonitorSettings> {
        Ok(MonitorSettings {
            min_quality_score: self.monitor.min_quality_score,
            min_test_accuracy: self.monitor.min_test_accuracy,
            min_throughput: self.monitor.min_throughput,
            test_samples: self.monitor.test_samples,
            benchmark_samples: self.monitor.benchmark_samples,
            max_high_tier_pct: self.max_high_tier_pct,
            retention: self.retention()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let settings: Settings = serde_saphyr::from_str("{}").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.monitor_settings().unwrap(), MonitorSettings::default());
    }

    #[test]
    fn test_partial_settings() {
        let yaml = r#"
workers: 4
history_retention: 30d
monitor:
  min_quality_score: 80
"#;
        let settings: Settings = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(settings.effective_workers(), 4);
        assert_eq!(settings.retention().unwrap(), Duration::from_secs(30 * 86400));
        assert_eq!(settings.monitor.min_quality_score, 80);
        assert_eq!(settings.monitor.min_test_accuracy, 0.80);
    }

    #[test]
    fn test_invalid_retention() {
        let settings = Settings {
            history_retention: "forever".to_string(),
            ..Settings::default()
        };
        let err = settings.retention().unwrap_err();
        assert!(err.to_string().contains("forever"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: std::result::Result<Settings, _> = serde_saphyr::from_str("queries: []");
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_workers_resolves() {
        assert!(Settings::default().effective_workers() >= 1);
    }
}
