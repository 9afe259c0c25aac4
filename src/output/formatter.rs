use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::contact::Contact;
use crate::harness::{BenchmarkReport, TestReport};
use crate::monitor::{AlertLevel, MonitoringReport, Trend};
use crate::scoring::{Classification, Tier};
use crate::validation::QualityReport;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a number in compact notation (1.5k, 2.3M, 847)
pub fn format_compact(value: f64) -> String {
    let formatted = if value >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.1}k", value / 1_000.0)
    } else {
        format!("{:.0}", value)
    };

    // Trim trailing .0 (e.g., "1.0k" -> "1k")
    formatted.replace(".0M", "M").replace(".0k", "k")
}

pub fn format_tier(tier: Tier, use_colors: bool) -> String {
    let label = format!("{:<8}", tier.as_str());
    if !use_colors {
        return label;
    }
    match tier {
        Tier::High => label.green().bold().to_string(),
        Tier::Medium => label.yellow().to_string(),
        Tier::Low => label.to_string(),
        Tier::Excluded => label.red().dimmed().to_string(),
    }
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate text to fit available width, accounting for Unicode
fn truncate_text(text: &str, max_width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_width {
        text.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Why a contact landed where it did: exclusion reasons, else the
/// multipliers and keywords behind the score.
fn explain(result: &Classification) -> String {
    if result.exclusion.should_exclude {
        let reasons: Vec<&str> = result.exclusion.reasons.iter().map(|r| r.as_str()).collect();
        return reasons.join(", ");
    }
    let mut parts: Vec<String> = Vec::new();
    parts.extend(result.score.bonuses.iter().map(|b| format!("+{}", b)));
    parts.extend(result.score.penalties.iter().map(|p| format!("-{}", p)));
    if !result.score.matched_keywords.is_empty() {
        parts.push(format!("[{}]", result.score.matched_keywords.join(", ")));
    }
    parts.join(" ")
}

/// One row per contact: index, tier, score, email, explanation.
/// The explanation column is truncated to the terminal width.
pub fn format_classification_table(contacts: &[Contact], results: &[Classification], use_colors: bool) -> String {
    if contacts.is_empty() {
        return "No contacts to classify.".to_string();
    }

    let term_width = get_terminal_width();
    let index_width = contacts.len().to_string().len().max(2) + 1;
    let email_width = contacts
        .iter()
        .map(|c| c.email.as_deref().unwrap_or("-").chars().count())
        .max()
        .unwrap_or(1)
        .min(40);
    let separator = "  ";

    contacts
        .iter()
        .zip(results)
        .enumerate()
        .map(|(idx, (contact, result))| {
            let index_str = format!("{:>width$}", format!("{}.", idx + 1), width = index_width);
            let score_str = format!("{:>5}", result.score.total_score);
            let email = truncate_text(contact.email.as_deref().unwrap_or("-"), email_width);
            let email = format!("{:<width$}", email, width = email_width);

            let fixed_width = index_width + 1 + 8 + separator.len() * 3 + 5 + email_width;
            let explanation = explain(result);
            let explanation = match term_width {
                Some(width) if width > fixed_width + 10 => truncate_text(&explanation, width - fixed_width),
                Some(_) => truncate_text(&explanation, 20),
                None => explanation,
            };

            if use_colors {
                format!(
                    "{} {}{}{}{}{}{}{}",
                    index_str.dimmed(),
                    format_tier(result.tier, true),
                    separator,
                    score_str.bold(),
                    separator,
                    email,
                    separator,
                    explanation.dimmed()
                )
            } else {
                format!(
                    "{} {}{}{}{}{}{}{}",
                    index_str,
                    format_tier(result.tier, false),
                    separator,
                    score_str,
                    separator,
                    email,
                    separator,
                    explanation
                )
                .trim_end()
                .to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Tab-separated values for scripting
/// Columns: email, tier, score, reasons (no headers, no colors)
pub fn format_tsv(contacts: &[Contact], results: &[Classification]) -> String {
    contacts
        .iter()
        .zip(results)
        .map(|(contact, result)| {
            let reasons: Vec<&str> = result.exclusion.reasons.iter().map(|r| r.as_str()).collect();
            format!(
                "{}\t{}\t{}\t{}",
                contact.email.as_deref().unwrap_or(""),
                result.tier,
                result.score.total_score,
                reasons.join(",")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn status(ok: bool, use_colors: bool) -> String {
    match (ok, use_colors) {
        (true, true) => "PASSED".green().bold().to_string(),
        (true, false) => "PASSED".to_string(),
        (false, true) => "FAILED".red().bold().to_string(),
        (false, false) => "FAILED".to_string(),
    }
}

fn bullet_list(out: &mut Vec<String>, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    out.push(format!("{}:", title));
    out.extend(items.iter().map(|i| format!("  - {}", i)));
}

pub fn format_quality_report(report: &QualityReport, use_colors: bool) -> String {
    let mut out = vec![format!(
        "Validation {}  quality score {}/100",
        status(report.success, use_colors),
        report.quality_score
    )];
    bullet_list(&mut out, "Errors", &report.errors);
    bullet_list(&mut out, "Warnings", &report.warnings);
    bullet_list(&mut out, "Fixes applied", &report.fixes_applied);
    bullet_list(&mut out, "Recommendations", &report.recommendations);
    out.join("\n")
}

pub fn format_test_report(report: &TestReport, use_colors: bool) -> String {
    let mut out = vec![format!(
        "Tests {}/{} passed  accuracy {:.1}%",
        report.passed,
        report.total,
        report.accuracy * 100.0
    )];
    if use_colors && !report.issues.is_empty() {
        out[0] = out[0].yellow().to_string();
    }
    bullet_list(&mut out, "Mismatches", &report.issues);
    out.join("\n")
}

pub fn format_benchmark_report(report: &BenchmarkReport, use_colors: bool) -> String {
    let distribution: Vec<String> = report
        .tier_distribution
        .iter()
        .map(|(tier, count)| format!("{} {}", tier, count))
        .collect();
    let band = if report.within_band {
        "within band".to_string()
    } else if use_colors {
        "above max HIGH share".red().to_string()
    } else {
        "above max HIGH share".to_string()
    };

    let mut out = vec![
        format!(
            "Benchmark {} contacts in {}  {} contacts/s",
            report.contacts,
            humantime::format_duration(report.elapsed),
            format_compact(report.throughput)
        ),
        format!("Tiers {}", distribution.join(" | ")),
        format!("HIGH share {:.1}% ({})", report.high_tier_pct, band),
    ];
    if report.truncated {
        out.push("Budget exhausted: partial results".to_string());
    }
    out.join("\n")
}

fn format_trend(name: &str, trend: &Trend) -> String {
    match trend.change_pct {
        Some(pct) => format!("  {:<18} {} ({:+.1}%)", name, trend.direction, pct),
        None => format!("  {:<18} {}", name, trend.direction),
    }
}

pub fn format_monitoring_report(report: &MonitoringReport, use_colors: bool) -> String {
    let current = &report.current;
    let mut out = vec![
        if use_colors {
            format!("Ruleset {}", report.ruleset.bold())
        } else {
            format!("Ruleset {}", report.ruleset)
        },
        format!(
            "  quality {}/100  accuracy {:.1}%  speed {} contacts/s  validation {}",
            current.quality_score,
            current.test_accuracy * 100.0,
            format_compact(current.performance_speed),
            status(current.validation_passed, use_colors)
        ),
    ];

    if report.history_available {
        out.push(format!("Trends over {} earlier points:", report.history_points));
        out.push(format_trend("quality_score", &report.trends.quality_score));
        out.push(format_trend("test_accuracy", &report.trends.test_accuracy));
        out.push(format_trend("performance_speed", &report.trends.performance_speed));
    } else {
        out.push("History unreadable: no trends".to_string());
    }

    if report.alerts.is_empty() {
        out.push("No alerts".to_string());
    }
    for alert in &report.alerts {
        let level = match (alert.level, use_colors) {
            (AlertLevel::Critical, true) => alert.level.to_string().red().bold().to_string(),
            (AlertLevel::Warning, true) => alert.level.to_string().yellow().to_string(),
            _ => alert.level.to_string(),
        };
        out.push(format!("{} {}", level, alert.message));
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::Classifier;
    use crate::ruleset::Ruleset;
    use std::sync::Arc;

    fn classified(emails: &[&str]) -> (Vec<Contact>, Vec<Classification>) {
        let mut ruleset = Ruleset::minimal("t", "DE", "hydraulics", vec![]);
        ruleset.hard_exclusions.personal_domains = ["gmail.com".to_string()].into();
        let classifier = Classifier::new(Arc::new(ruleset));
        let contacts: Vec<Contact> = emails.iter().map(|e| Contact::new(e)).collect();
        let results = classifier.classify_batch(&contacts, 1);
        (contacts, results)
    }

    #[test]
    fn test_format_compact() {
        assert_eq!(format_compact(0.0), "0");
        assert_eq!(format_compact(847.0), "847");
        assert_eq!(format_compact(1000.0), "1k");
        assert_eq!(format_compact(1500.0), "1.5k");
        assert_eq!(format_compact(2_300_000.0), "2.3M");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("Short", 20), "Short");
        assert_eq!(truncate_text("This is a very long title", 15), "This is a ve...");
        assert_eq!(truncate_text("Hello world", 3), "Hel");
    }

    #[test]
    fn test_format_tier_plain() {
        assert_eq!(format_tier(Tier::High, false), "HIGH    ");
        assert_eq!(format_tier(Tier::Excluded, false), "EXCLUDED");
    }

    #[test]
    fn test_classification_table_empty() {
        assert_eq!(format_classification_table(&[], &[], false), "No contacts to classify.");
    }

    #[test]
    fn test_classification_table_rows() {
        let (contacts, results) = classified(&["info@firma.de", "max@gmail.com"]);
        let table = format_classification_table(&contacts, &results, false);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with(" 1."));
        assert!(lines[0].contains("info@firma.de"));
        assert!(lines[1].contains("EXCLUDED"));
        assert!(lines[1].contains("personal_domain"));
    }

    #[test]
    fn test_format_tsv() {
        let (contacts, results) = classified(&["max@gmail.com"]);
        let tsv = format_tsv(&contacts, &results);
        let columns: Vec<&str> = tsv.split('\t').collect();
        assert_eq!(columns.len(), 4);
        assert_eq!(columns[0], "max@gmail.com");
        assert_eq!(columns[1], "EXCLUDED");
        assert_eq!(columns[3], "personal_domain");
    }

    #[test]
    fn test_format_quality_report() {
        let report = QualityReport {
            success: false,
            errors: vec!["scoring.weights: sum is 0.95".to_string()],
            warnings: vec![],
            quality_score: 65,
            recommendations: vec!["Add a second language".to_string()],
            fixes_applied: vec![],
        };
        let text = format_quality_report(&report, false);
        assert!(text.starts_with("Validation FAILED  quality score 65/100"));
        assert!(text.contains("Errors:\n  - scoring.weights: sum is 0.95"));
        assert!(!text.contains("Warnings:"));
        assert!(text.contains("Recommendations:"));
    }

    #[test]
    fn test_format_test_report() {
        let report = TestReport {
            total: 4,
            passed: 3,
            accuracy: 0.75,
            issues: vec!["x@y.de: expected HIGH, got LOW (score 150)".to_string()],
        };
        let text = format_test_report(&report, false);
        assert!(text.starts_with("Tests 3/4 passed  accuracy 75.0%"));
        assert!(text.contains("expected HIGH"));
    }
}
