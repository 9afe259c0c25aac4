use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use super::synthetic::generate_samples;
use crate::scoring::{Classifier, Tier};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BenchmarkOptions {
    /// HIGH share, in percent, above which the distribution is out of band
    pub max_high_tier_pct: f64,
    /// Wall-clock budget, checked between contacts
    pub budget: Option<Duration>,
}

impl Default for BenchmarkOptions {
    fn default() -> Self {
        Self {
            max_high_tier_pct: 50.0,
            budget: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkReport {
    /// Contacts actually classified
    pub contacts: usize,
    #[serde(serialize_with = "as_humantime")]
    pub elapsed: Duration,
    /// Contacts per second
    pub throughput: f64,
    pub tier_distribution: BTreeMap<Tier, usize>,
    pub high_tier_pct: f64,
    pub within_band: bool,
    /// The budget ran out before every contact was classified
    pub truncated: bool,
}

/// Classify `n` synthetic contacts and measure throughput.
///
/// Samples are generated before the clock starts. When a budget is set and
/// runs out, the contacts classified so far are reported and the report is
/// flagged `truncated`.
pub fn run_benchmark(classifier: &Classifier, n: usize, options: &BenchmarkOptions) -> BenchmarkReport {
    let samples = generate_samples(classifier.ruleset(), n);
    let mut distribution: BTreeMap<Tier, usize> = Tier::ALL.iter().map(|t| (*t, 0)).collect();

    let start = Instant::now();
    let mut contacts = 0;
    let mut truncated = false;
    for sample in &samples {
        if options.budget.is_some_and(|budget| start.elapsed() >= budget) {
            truncated = true;
            break;
        }
        let tier = classifier.classify_guarded(&sample.contact).tier;
        *distribution.entry(tier).or_default() += 1;
        contacts += 1;
    }
    let elapsed = start.elapsed();

    let throughput = if contacts == 0 {
        0.0
    } else {
        contacts as f64 / elapsed.as_secs_f64().max(1e-9)
    };
    let high = distribution.get(&Tier::High).copied().unwrap_or(0);
    let high_tier_pct = if contacts == 0 {
        0.0
    } else {
        high as f64 * 100.0 / contacts as f64
    };
    let within_band = high_tier_pct <= options.max_high_tier_pct;

    if truncated {
        warn!(contacts, requested = n, "benchmark budget exhausted, results are partial");
    }
    if !within_band {
        warn!(
            high_tier_pct,
            max = options.max_high_tier_pct,
            "HIGH tier share above configured maximum"
        );
    }
    info!(
        ruleset = %classifier.ruleset().identity.name,
        contacts,
        throughput = %format!("{:.0}", throughput),
        "benchmark complete"
    );

    BenchmarkReport {
        contacts,
        elapsed,
        throughput,
        tier_distribution: distribution,
        high_tier_pct,
        within_band,
        truncated,
    }
}

fn as_humantime<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&humantime::format_duration(*duration))
}
