//! Structural and semantic checks over a ruleset, with a heuristic
//! quality estimate.
//!
//! Every check runs; errors and warnings are collected rather than
//! stopping at the first problem. Only errors block `success`.

use serde::Serialize;
use tracing::{debug, info};

use crate::builder::DEFAULT_BLOCKLIST_SUFFIXES;
use crate::ruleset::{Multiplier, Ruleset, Weights};

/// Top-level sections a ruleset document must carry
pub const REQUIRED_SECTIONS: [&str; 6] = [
    "identity",
    "target",
    "geographic",
    "hard_exclusions",
    "industry_keywords",
    "scoring",
];

const WEIGHT_SUM_MIN: f64 = 0.99;
const WEIGHT_SUM_MAX: f64 = 1.01;
const KEYWORDS_LOW: usize = 10;
const KEYWORDS_HIGH: usize = 200;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QualityReport {
    pub success: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Heuristic soundness estimate, 0-100
    pub quality_score: u32,
    pub recommendations: Vec<String>,
    /// Changes made by [`validate_and_fix`]
    pub fixes_applied: Vec<String>,
}

/// Validate a loaded ruleset.
pub fn validate(ruleset: &Ruleset) -> QualityReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    check_weights(&ruleset.scoring.weights, &mut errors);

    let t = &ruleset.scoring.thresholds;
    if !t.is_ordered() {
        errors.push(format!(
            "scoring.thresholds: must satisfy high_priority > medium_priority > low_priority, got {} / {} / {}",
            t.high_priority, t.medium_priority, t.low_priority
        ));
    }

    check_multipliers("bonus_multipliers", &ruleset.scoring.bonus_multipliers, true, &mut errors);
    check_multipliers("penalty_multipliers", &ruleset.scoring.penalty_multipliers, false, &mut errors);
    check_empty_strings(ruleset, &mut errors);
    for key in ruleset.industry_keywords.duplicate_keys() {
        errors.push(format!(
            "industry_keywords.{}: defined in more than one section",
            key
        ));
    }

    if ruleset.geographic.excluded_countries.is_none() {
        warnings.push(
            "geographic.excluded_countries: missing, no domain suffixes will be excluded".to_string(),
        );
    }

    let country = &ruleset.target.country;
    if !(country.len() == 2 && country.chars().all(|c| c.is_ascii_uppercase())) {
        errors.push(format!(
            "target.country: '{}' must be two uppercase letters",
            country
        ));
    }
    for (i, language) in ruleset.target.languages.iter().enumerate() {
        if !(language.len() == 2 && language.chars().all(|c| c.is_ascii_lowercase())) {
            errors.push(format!(
                "target.languages[{}]: '{}' must be two lowercase letters",
                i, language
            ));
        }
    }

    let keyword_count = ruleset.industry_keywords.total();
    if keyword_count < KEYWORDS_LOW {
        warnings.push(format!(
            "industry_keywords: low coverage, only {} keywords",
            keyword_count
        ));
    } else if keyword_count > KEYWORDS_HIGH {
        warnings.push(format!(
            "industry_keywords: too broad, {} keywords",
            keyword_count
        ));
    }

    for domain in &ruleset.hard_exclusions.personal_domains {
        if !domain.contains('.') || domain.contains('@') {
            errors.push(format!(
                "hard_exclusions.personal_domains: '{}' is not a domain",
                domain
            ));
        }
    }

    let quality_score = quality_score(ruleset);
    let recommendations = recommendations(ruleset);
    debug!(
        ruleset = %ruleset.identity.name,
        errors = errors.len(),
        warnings = warnings.len(),
        quality_score,
        "validated ruleset"
    );

    QualityReport {
        success: errors.is_empty(),
        errors,
        warnings,
        quality_score,
        recommendations,
        fixes_applied: Vec::new(),
    }
}

/// Validate a raw YAML document.
///
/// Section and weight-name presence can only be judged before defaults are
/// filled in, so those checks run on the untyped document first. When the
/// document also parses as a [`Ruleset`], the typed checks follow.
pub fn validate_document(yaml: &str) -> QualityReport {
    let mut structural = Vec::new();

    match serde_saphyr::from_str::<serde_json::Value>(yaml) {
        Ok(serde_json::Value::Object(doc)) => {
            for section in REQUIRED_SECTIONS {
                if !doc.contains_key(section) {
                    structural.push(format!("missing required section '{}'", section));
                }
            }
            match doc.get("scoring").and_then(|s| s.get("weights")) {
                Some(serde_json::Value::Object(weights)) => {
                    for name in Weights::NAMES {
                        if !weights.contains_key(name) {
                            structural.push(format!("scoring.weights: missing weight '{}'", name));
                        }
                    }
                }
                Some(_) => structural.push("scoring.weights: must be a mapping".to_string()),
                None if doc.contains_key("scoring") => {
                    structural.push("scoring.weights: missing".to_string())
                }
                None => {}
            }
            if doc.get("scoring").is_some_and(|s| s.get("thresholds").is_none()) {
                structural.push("scoring.thresholds: missing".to_string());
            }
        }
        Ok(_) => structural.push("ruleset document must be a mapping".to_string()),
        Err(e) => structural.push(format!("invalid YAML: {}", e)),
    }

    if !structural.is_empty() {
        return QualityReport {
            success: false,
            errors: structural,
            ..QualityReport::default()
        };
    }

    match Ruleset::from_yaml(yaml) {
        Ok(ruleset) => validate(&ruleset),
        Err(e) => QualityReport {
            success: false,
            errors: vec![format!("{:#}", e)],
            ..QualityReport::default()
        },
    }
}

/// Validate in fix mode: repair what can be repaired, then validate.
pub fn validate_and_fix(ruleset: &mut Ruleset) -> QualityReport {
    let mut fixes = Vec::new();

    if ruleset.geographic.excluded_countries.is_none() {
        ruleset.geographic.excluded_countries =
            Some(DEFAULT_BLOCKLIST_SUFFIXES.iter().map(|s| s.to_string()).collect());
        fixes.push(format!(
            "geographic.excluded_countries: populated {} default blocklist suffixes",
            DEFAULT_BLOCKLIST_SUFFIXES.len()
        ));
    }

    let merged = ruleset.industry_keywords.merge_duplicates();
    if merged > 0 {
        fixes.push(format!("industry_keywords: merged {} repeated sections", merged));
    }

    let mut dropped = 0;
    for section in ruleset.industry_keywords.sections_mut() {
        let before = section.keywords.len();
        section.keywords.retain(|k| !k.trim().is_empty());
        dropped += before - section.keywords.len();
    }
    if dropped > 0 {
        fixes.push(format!("industry_keywords: removed {} empty keywords", dropped));
    }

    if !fixes.is_empty() {
        info!(ruleset = %ruleset.identity.name, fixes = fixes.len(), "applied ruleset fixes");
    }

    let mut report = validate(ruleset);
    report.fixes_applied = fixes;
    report
}

/// Fix mode over a raw document. Repairs run before success is judged,
/// so a document rejected only for repairable defects comes back valid.
///
/// Returns the repaired ruleset when any fix was applied; the report then
/// describes the repaired document.
pub fn fix_document(yaml: &str) -> (QualityReport, Option<Ruleset>) {
    let Ok(mut ruleset) = Ruleset::from_yaml(yaml) else {
        return (validate_document(yaml), None);
    };

    let fixed = validate_and_fix(&mut ruleset);
    if fixed.fixes_applied.is_empty() {
        return (validate_document(yaml), None);
    }

    let mut report = match ruleset.to_yaml() {
        Ok(repaired) => validate_document(&repaired),
        Err(_) => fixed.clone(),
    };
    report.fixes_applied = fixed.fixes_applied;
    (report, Some(ruleset))
}

fn check_weights(weights: &Weights, errors: &mut Vec<String>) {
    let values = [
        weights.email_quality,
        weights.company_relevance,
        weights.geographic_priority,
        weights.engagement,
    ];
    for (name, value) in Weights::NAMES.iter().zip(values) {
        if value < 0.0 || !value.is_finite() {
            errors.push(format!("scoring.weights.{}: {} must be a non-negative number", name, value));
        }
    }

    let sum = weights.sum();
    if !(WEIGHT_SUM_MIN..=WEIGHT_SUM_MAX).contains(&sum) {
        errors.push(format!(
            "scoring.weights: sum is {}, must be within {} and {}",
            format_sum(sum),
            WEIGHT_SUM_MIN,
            WEIGHT_SUM_MAX
        ));
    }
}

/// Shortest rendering (2-6 decimals) of an out-of-range sum that still
/// reads as out of range, so 1.014 is never shown as 1.01.
fn format_sum(sum: f64) -> String {
    for decimals in 2..=6 {
        let text = format!("{:.*}", decimals, sum);
        let text = text.trim_end_matches('0').trim_end_matches('.').to_string();
        match text.parse::<f64>() {
            Ok(shown) if !(WEIGHT_SUM_MIN..=WEIGHT_SUM_MAX).contains(&shown) => return text,
            _ => {}
        }
    }
    sum.to_string()
}

fn check_multipliers(field: &str, list: &[Multiplier], bonus: bool, errors: &mut Vec<String>) {
    for (i, m) in list.iter().enumerate() {
        if m.name.is_bonus() != bonus {
            errors.push(format!(
                "scoring.{}[{}]: '{}' is not a {} trigger",
                field,
                i,
                m.name.as_str(),
                if bonus { "bonus" } else { "penalty" }
            ));
        }
        let on_right_side = if bonus {
            m.factor > 1.0
        } else {
            m.factor > 0.0 && m.factor < 1.0
        };
        if !on_right_side {
            errors.push(format!(
                "scoring.{}[{}]: factor {} must be {}",
                field,
                i,
                m.factor,
                if bonus { "greater than 1.0" } else { "between 0.0 and 1.0" }
            ));
        }
    }
}

fn check_empty_strings(ruleset: &Ruleset, errors: &mut Vec<String>) {
    for section in ruleset.industry_keywords.sections() {
        if section.keywords.iter().any(|k| k.trim().is_empty()) {
            errors.push(format!(
                "industry_keywords.{}{}: contains an empty keyword",
                section.category.as_str(),
                section
                    .language
                    .as_deref()
                    .map(|l| format!("[{}]", l))
                    .unwrap_or_default()
            ));
        }
    }

    let geo = &ruleset.geographic;
    let ex = &ruleset.hard_exclusions;
    let lists: [(&str, Box<dyn Iterator<Item = &String> + '_>); 7] = [
        ("geographic.priority_high", Box::new(geo.priority_high.iter())),
        ("geographic.priority_medium", Box::new(geo.priority_medium.iter())),
        ("geographic.excluded_countries", Box::new(geo.excluded_countries.iter().flatten())),
        ("geographic.excluded_cities", Box::new(geo.excluded_cities.iter())),
        ("hard_exclusions.personal_domains", Box::new(ex.personal_domains.iter())),
        ("hard_exclusions.hr_prefixes", Box::new(ex.hr_prefixes.iter())),
        ("hard_exclusions.service_prefixes", Box::new(ex.service_prefixes.iter())),
    ];
    for (field, mut entries) in lists {
        if entries.any(|s| s.trim().is_empty()) {
            errors.push(format!("{}: contains an empty entry", field));
        }
    }

    for (label, industry) in &ex.excluded_industries {
        if industry
            .keywords
            .iter()
            .chain(&industry.domain_keywords)
            .any(|k| k.trim().is_empty())
        {
            errors.push(format!(
                "hard_exclusions.excluded_industries.{}: contains an empty keyword",
                label
            ));
        }
    }
}

/// Heuristic 0-100 soundness estimate.
pub fn quality_score(ruleset: &Ruleset) -> u32 {
    let mut score = 50;

    score += match ruleset.target.languages.len() {
        0 => 0,
        1 => 10,
        _ => 15,
    };

    score += match ruleset.industry_keywords.total() {
        n if n >= 30 => 20,
        n if n >= 20 => 15,
        n if n >= 10 => 10,
        n if n >= 1 => 5,
        _ => 0,
    };

    score += match excluded_suffix_count(ruleset) {
        n if n >= 10 => 15,
        n if n >= 5 => 10,
        n if n >= 1 => 5,
        _ => 0,
    };

    let scoring = &ruleset.scoring;
    let sum = scoring.weights.sum();
    if (WEIGHT_SUM_MIN..=WEIGHT_SUM_MAX).contains(&sum) && scoring.thresholds.is_ordered() {
        score += 10;
    }

    let ex = &ruleset.hard_exclusions;
    if !ex.personal_domains.is_empty() && !ex.service_prefixes.is_empty() {
        score += 10;
    }

    score.min(100)
}

fn excluded_suffix_count(ruleset: &Ruleset) -> usize {
    ruleset
        .geographic
        .excluded_countries
        .as_ref()
        .map(Vec::len)
        .unwrap_or(0)
}

fn recommendations(ruleset: &Ruleset) -> Vec<String> {
    let mut out = Vec::new();

    if ruleset.target.languages.len() < 2 {
        out.push("Add a second language to cover multilingual company sites".to_string());
    }
    let keywords = ruleset.industry_keywords.total();
    if keywords < 30 {
        out.push(format!(
            "Extend industry keywords ({} now, 30 or more recommended)",
            keywords
        ));
    }
    if excluded_suffix_count(ruleset) < 10 {
        out.push("Add more excluded country suffixes, e.g. from blocklist analysis".to_string());
    }
    let ex = &ruleset.hard_exclusions;
    if ex.personal_domains.is_empty() {
        out.push("Add personal webmail domains to hard_exclusions".to_string());
    }
    if ex.service_prefixes.is_empty() {
        out.push("Add service prefixes such as noreply to hard_exclusions".to_string());
    }
    if ex.excluded_industries.is_empty() {
        out.push("Define excluded industries to catch off-target companies".to_string());
    }

    out
}
