//! Periodic quality tracking per named ruleset.
//!
//! A monitoring run validates the ruleset, self-tests it against synthetic
//! samples, benchmarks it, compares the result with the recorded history
//! and appends the new point.

pub mod storage;
pub mod trend;
pub mod types;

pub use storage::{HistoryStore, JsonHistoryStore, MemoryHistoryStore};
pub use trend::{compute as compute_trend, Trend, TrendDirection};
pub use types::{History, HistoryPoint};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::harness::{generate_samples, run_benchmark, run_tests, BenchmarkOptions, BenchmarkReport, TestReport};
use crate::ruleset::Ruleset;
use crate::scoring::Classifier;
use crate::validation::{validate, QualityReport};

/// Fraction above a minimum that still raises a warning
const NEAR_MINIMUM: f64 = 0.10;
/// Decline, in percent, that raises a trend warning
const TREND_ALERT_PCT: f64 = 15.0;

/// Resolves rulesets by name.
pub trait RulesetSource: Send + Sync {
    fn load(&self, name: &str) -> Result<Ruleset>;
}

/// Rulesets held in memory, keyed by identity name.
#[derive(Debug, Default)]
pub struct MemoryRulesetSource {
    rulesets: HashMap<String, Ruleset>,
}

impl MemoryRulesetSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, ruleset: Ruleset) {
        self.rulesets.insert(ruleset.identity.name.clone(), ruleset);
    }
}

impl RulesetSource for MemoryRulesetSource {
    fn load(&self, name: &str) -> Result<Ruleset> {
        self.rulesets
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownRuleset(name.to_string()))
    }
}

/// One mutex per key, created on first use.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock guarding `key`. Every caller asking for the same key gets
    /// the same mutex.
    pub fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(key.to_string()).or_default().clone()
    }
}

/// Thresholds and workload of a monitoring run.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSettings {
    pub min_quality_score: u32,
    pub min_test_accuracy: f64,
    /// Contacts per second; only ever a warning
    pub min_throughput: f64,
    pub test_samples: usize,
    pub benchmark_samples: usize,
    pub max_high_tier_pct: f64,
    pub retention: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            min_quality_score: 70,
            min_test_accuracy: 0.80,
            min_throughput: 1000.0,
            test_samples: 100,
            benchmark_samples: 1000,
            max_high_tier_pct: 50.0,
            retention: Duration::from_secs(90 * 24 * 60 * 60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Warning,
    Critical,
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            AlertLevel::Warning => "WARNING",
            AlertLevel::Critical => "CRITICAL",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub metric: String,
    pub message: String,
}

impl Alert {
    fn new(level: AlertLevel, metric: &str, message: String) -> Self {
        Self {
            level,
            metric: metric.to_string(),
            message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricTrends {
    pub quality_score: Trend,
    pub test_accuracy: Trend,
    pub performance_speed: Trend,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitoringReport {
    pub ruleset: String,
    pub current: HistoryPoint,
    pub validation: QualityReport,
    pub test: TestReport,
    pub benchmark: BenchmarkReport,
    pub trends: MetricTrends,
    pub alerts: Vec<Alert>,
    /// Earlier points inside the requested period
    pub history_points: usize,
    /// False when the stored history could not be read
    pub history_available: bool,
}

impl MonitoringReport {
    pub fn has_critical(&self) -> bool {
        self.alerts.iter().any(|a| a.level == AlertLevel::Critical)
    }
}

/// Runs monitoring cycles against a ruleset source and a history store.
///
/// Safe to share across threads. Runs for the same ruleset are serialised;
/// runs for different rulesets proceed independently.
pub struct QualityMonitor<S, H> {
    source: S,
    store: H,
    settings: MonitorSettings,
    locks: KeyedLocks,
}

impl<S: RulesetSource, H: HistoryStore> QualityMonitor<S, H> {
    pub fn new(source: S, store: H, settings: MonitorSettings) -> Self {
        Self {
            source,
            store,
            settings,
            locks: KeyedLocks::new(),
        }
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    pub fn store(&self) -> &H {
        &self.store
    }

    /// Run one monitoring cycle for `name`, looking back over `period`.
    ///
    /// Fails only when the ruleset cannot be resolved or the new point
    /// cannot be persisted. An unreadable history yields a report without
    /// trends and is left untouched on disk.
    pub fn monitor(&self, name: &str, period: Duration) -> Result<MonitoringReport> {
        let ruleset = Arc::new(self.source.load(name)?);
        let validation = validate(&ruleset);
        let classifier = Classifier::new(Arc::clone(&ruleset));
        let samples = generate_samples(&ruleset, self.settings.test_samples);
        let test = run_tests(&classifier, &samples);
        let benchmark = run_benchmark(
            &classifier,
            self.settings.benchmark_samples,
            &BenchmarkOptions {
                max_high_tier_pct: self.settings.max_high_tier_pct,
                budget: None,
            },
        );

        let now = Utc::now();
        let current = HistoryPoint {
            timestamp: now,
            quality_score: validation.quality_score,
            test_accuracy: test.accuracy,
            performance_speed: benchmark.throughput,
            validation_passed: validation.success,
            issues_found: validation.errors.len() + validation.warnings.len() + test.issues.len(),
        };

        let lock = self.locks.lock_for(&self.store.lock_key(name));
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        let (mut history, history_available) = match self.store.load(name) {
            Ok(history) => (history, true),
            Err(e) => {
                warn!(ruleset = name, error = %e, "history unreadable, reporting without trends");
                (History::new(), false)
            }
        };

        let since = now
            .checked_sub_signed(to_chrono(period))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let window: Vec<&HistoryPoint> = history.since(since).iter().chain([&current]).collect();
        let trends = MetricTrends {
            quality_score: compute_trend(&metric(&window, |p| p.quality_score as f64)),
            test_accuracy: compute_trend(&metric(&window, |p| p.test_accuracy)),
            performance_speed: compute_trend(&metric(&window, |p| p.performance_speed)),
        };
        let history_points = window.len() - 1;
        let alerts = self.alerts(&current, &trends);

        if history_available {
            history.push(current.clone());
            let pruned = history.prune(now, to_chrono(self.settings.retention));
            self.store.save(name, &history)?;
            if pruned > 0 {
                info!(ruleset = name, pruned, "pruned expired history points");
            }
        }

        for alert in &alerts {
            warn!(ruleset = name, level = %alert.level, metric = %alert.metric, "{}", alert.message);
        }
        info!(
            ruleset = name,
            quality_score = current.quality_score,
            test_accuracy = current.test_accuracy,
            alerts = alerts.len(),
            "monitoring run complete"
        );

        Ok(MonitoringReport {
            ruleset: name.to_string(),
            current,
            validation,
            test,
            benchmark,
            trends,
            alerts,
            history_points,
            history_available,
        })
    }

    fn alerts(&self, current: &HistoryPoint, trends: &MetricTrends) -> Vec<Alert> {
        let s = &self.settings;
        let mut alerts = Vec::new();

        if !current.validation_passed {
            alerts.push(Alert::new(
                AlertLevel::Critical,
                "validation",
                "ruleset failed validation".to_string(),
            ));
        }

        let quality = current.quality_score as f64;
        let min_quality = s.min_quality_score as f64;
        if quality < min_quality {
            alerts.push(Alert::new(
                AlertLevel::Critical,
                "quality_score",
                format!("quality score {} below minimum {}", current.quality_score, s.min_quality_score),
            ));
        } else if near_minimum(quality, min_quality) {
            alerts.push(Alert::new(
                AlertLevel::Warning,
                "quality_score",
                format!("quality score {} close to minimum {}", current.quality_score, s.min_quality_score),
            ));
        }

        if current.test_accuracy < s.min_test_accuracy {
            alerts.push(Alert::new(
                AlertLevel::Critical,
                "test_accuracy",
                format!(
                    "test accuracy {:.1}% below minimum {:.1}%",
                    current.test_accuracy * 100.0,
                    s.min_test_accuracy * 100.0
                ),
            ));
        } else if near_minimum(current.test_accuracy, s.min_test_accuracy) {
            alerts.push(Alert::new(
                AlertLevel::Warning,
                "test_accuracy",
                format!(
                    "test accuracy {:.1}% close to minimum {:.1}%",
                    current.test_accuracy * 100.0,
                    s.min_test_accuracy * 100.0
                ),
            ));
        }

        if current.performance_speed < s.min_throughput * (1.0 + NEAR_MINIMUM) {
            alerts.push(Alert::new(
                AlertLevel::Warning,
                "performance_speed",
                format!(
                    "throughput {:.0} contacts/s at or below {:.0} contacts/s",
                    current.performance_speed,
                    s.min_throughput * (1.0 + NEAR_MINIMUM)
                ),
            ));
        }

        for (metric, trend) in [
            ("quality_score", &trends.quality_score),
            ("test_accuracy", &trends.test_accuracy),
            ("performance_speed", &trends.performance_speed),
        ] {
            if trend.declines_more_than(TREND_ALERT_PCT) {
                alerts.push(Alert::new(
                    AlertLevel::Warning,
                    metric,
                    format!(
                        "{} declining by {:.1}% over the period",
                        metric,
                        -trend.change_pct.unwrap_or_default()
                    ),
                ));
            }
        }

        alerts
    }
}

fn near_minimum(value: f64, minimum: f64) -> bool {
    value >= minimum && value < minimum * (1.0 + NEAR_MINIMUM)
}

fn metric(points: &[&HistoryPoint], f: impl Fn(&HistoryPoint) -> f64) -> Vec<f64> {
    points.iter().map(|p| f(*p)).collect()
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}
