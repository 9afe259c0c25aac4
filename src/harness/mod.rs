//! Accuracy testing against labelled contacts, and throughput benchmarks.

pub mod benchmark;
pub mod synthetic;

pub use benchmark::{run_benchmark, BenchmarkOptions, BenchmarkReport};
pub use synthetic::generate_samples;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::contact::Contact;
use crate::scoring::{Classifier, Tier};

/// A contact paired with the tier it should receive.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LabelledContact {
    pub contact: Contact,
    pub expected: Tier,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestReport {
    pub total: usize,
    pub passed: usize,
    /// Fraction of samples whose tier matched; 0.0 for an empty run
    pub accuracy: f64,
    /// One line per mismatch
    pub issues: Vec<String>,
}

/// Classify every sample and compare against its expected tier.
pub fn run_tests(classifier: &Classifier, samples: &[LabelledContact]) -> TestReport {
    let mut passed = 0;
    let mut issues = Vec::new();

    for sample in samples {
        let result = classifier.classify_guarded(&sample.contact);
        if result.tier == sample.expected {
            passed += 1;
            continue;
        }

        let reasons: Vec<&str> = result.exclusion.reasons.iter().map(|r| r.as_str()).collect();
        let issue = format!(
            "{}: expected {}, got {} (score {}{})",
            sample.contact.email.as_deref().unwrap_or("<no email>"),
            sample.expected,
            result.tier,
            result.score.total_score,
            if reasons.is_empty() {
                String::new()
            } else {
                format!(", excluded: {}", reasons.join(", "))
            }
        );
        debug!(%issue, "tier mismatch");
        issues.push(issue);
    }

    let total = samples.len();
    let accuracy = if total == 0 {
        0.0
    } else {
        passed as f64 / total as f64
    };
    info!(
        ruleset = %classifier.ruleset().identity.name,
        total,
        passed,
        accuracy,
        "test run complete"
    );

    TestReport {
        total,
        passed,
        accuracy,
        issues,
    }
}
