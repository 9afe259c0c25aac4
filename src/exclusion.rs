use serde::Serialize;
use tracing::debug;

use crate::contact::Contact;
use crate::ruleset::RuleIndex;

/// Length of a separator-free hex run treated as machine-generated
const HEX_RUN_MIN: usize = 16;
/// Length of a separator-free alphanumeric run treated as machine-generated
const ALNUM_RUN_MIN: usize = 20;

/// Why a contact was excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonTag {
    PersonalDomain,
    HrServicePrefix,
    GeographicExclusion,
    SuspiciousPattern,
    ExcludedIndustry,
    /// The record could not be evaluated at all
    FilterError,
}

impl ReasonTag {
    pub fn as_str(self) -> &'static str {
        match self {
            ReasonTag::PersonalDomain => "personal_domain",
            ReasonTag::HrServicePrefix => "hr_service_prefix",
            ReasonTag::GeographicExclusion => "geographic_exclusion",
            ReasonTag::SuspiciousPattern => "suspicious_pattern",
            ReasonTag::ExcludedIndustry => "excluded_industry",
            ReasonTag::FilterError => "filter_error",
        }
    }
}

impl std::fmt::Display for ReasonTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Informational severity; does not affect `should_exclude`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExclusionResult {
    pub should_exclude: bool,
    pub reasons: Vec<ReasonTag>,
    pub severity: Severity,
    /// Labels of excluded industries that matched text or domain
    pub matched_industries: Vec<String>,
}

impl ExclusionResult {
    pub(crate) fn from_reasons(reasons: Vec<ReasonTag>, matched_industries: Vec<String>) -> Self {
        let severity = if reasons.len() >= 3 || reasons.contains(&ReasonTag::ExcludedIndustry) {
            Severity::Critical
        } else if reasons.len() == 2 {
            Severity::Warning
        } else {
            Severity::Low
        };
        Self {
            should_exclude: !reasons.is_empty(),
            reasons,
            severity,
            matched_industries,
        }
    }

    /// Result recorded for a record whose evaluation faulted.
    pub fn filter_error() -> Self {
        Self::from_reasons(vec![ReasonTag::FilterError], Vec::new())
    }

    pub fn has(&self, tag: ReasonTag) -> bool {
        self.reasons.contains(&tag)
    }
}

/// Evaluate every hard-exclusion rule against a contact.
///
/// Rules are independent and all contribute; a missing or malformed field
/// simply fails to match the rules that read it.
pub fn evaluate(contact: &Contact, index: &RuleIndex) -> ExclusionResult {
    let mut reasons = Vec::new();
    let email = contact.email_parts();

    if let Some(ref parts) = email {
        if index.personal_domains.contains(&parts.domain) {
            reasons.push(ReasonTag::PersonalDomain);
        }

        // Prefixes may be written with a trailing '@' to pin the whole local part
        let local_at = format!("{}@", parts.local);
        if index.hr_prefixes.iter().any(|p| local_at.starts_with(p.as_str()))
            || index.service_prefixes.iter().any(|p| local_at.contains(p.as_str()))
        {
            reasons.push(ReasonTag::HrServicePrefix);
        }
    }

    let suffix_hit = email
        .as_ref()
        .map(|parts| {
            index
                .excluded_suffixes
                .iter()
                .any(|s| parts.domain.ends_with(s.as_str()))
        })
        .unwrap_or(false);
    let location_text = contact.location_text();
    let city_hit = index
        .excluded_cities
        .iter()
        .any(|c| location_text.contains(c.as_str()));
    if suffix_hit || city_hit {
        reasons.push(ReasonTag::GeographicExclusion);
    }

    if let Some(ref parts) = email {
        if looks_generated(&parts.local) {
            reasons.push(ReasonTag::SuspiciousPattern);
        }
    }

    let matched_industries = matched_industries(contact, index);
    if !matched_industries.is_empty() {
        reasons.push(ReasonTag::ExcludedIndustry);
    }

    if !reasons.is_empty() {
        debug!(email = ?contact.email, ?reasons, "contact excluded");
    }

    ExclusionResult::from_reasons(reasons, matched_industries)
}

/// Labels of excluded industries whose text keywords hit the company text
/// or whose domain keywords hit the web domain.
pub(crate) fn matched_industries(contact: &Contact, index: &RuleIndex) -> Vec<String> {
    let text = contact.company_text();
    let domain = contact.web_domain();

    index
        .excluded_industries
        .iter()
        .filter(|industry| {
            let text_hit = industry.keywords.iter().any(|k| text.contains(k.as_str()));
            let domain_hit = domain
                .as_deref()
                .map(|d| industry.domain_keywords.iter().any(|k| d.contains(k.as_str())))
                .unwrap_or(false);
            text_hit || domain_hit
        })
        .map(|industry| industry.label.clone())
        .collect()
}

/// Heuristic for machine-generated local parts: a long separator-free run of
/// hex characters (with at least one digit) or of alphanumerics.
fn looks_generated(local: &str) -> bool {
    local
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|run| {
            let hex = run.len() >= HEX_RUN_MIN
                && run.chars().all(|c| c.is_ascii_hexdigit())
                && run.chars().any(|c| c.is_ascii_digit());
            hex || run.len() >= ALNUM_RUN_MIN
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ruleset::{ExcludedIndustry, Ruleset};

    fn sample_ruleset() -> Ruleset {
        let mut ruleset = Ruleset::minimal("test", "DE", "hydraulics", vec!["de".to_string()]);
        let ex = &mut ruleset.hard_exclusions;
        ex.personal_domains = ["gmail.com".to_string(), "web.de".to_string()].into();
        ex.hr_prefixes = ["jobs@".to_string(), "karriere".to_string()].into();
        ex.service_prefixes = ["noreply".to_string()].into();
        ex.excluded_industries.insert(
            "gastronomy".to_string(),
            ExcludedIndustry {
                keywords: ["restaurant".to_string()].into(),
                domain_keywords: ["pizza".to_string()].into(),
            },
        );
        ruleset.geographic.excluded_countries = Some(vec![".ru".to_string()]);
        ruleset.geographic.excluded_cities = ["moskau".to_string()].into();
        ruleset
    }

    fn eval(contact: &Contact) -> ExclusionResult {
        evaluate(contact, &RuleIndex::new(&sample_ruleset()))
    }

    #[test]
    fn test_clean_contact_not_excluded() {
        let result = eval(&Contact::new("info@hydraulik.de").with_company("Hydraulik AG"));
        assert!(!result.should_exclude);
        assert!(result.reasons.is_empty());
        assert_eq!(result.severity, Severity::Low);
    }

    #[test]
    fn test_personal_domain() {
        let result = eval(&Contact::new("Max@GMAIL.com"));
        assert_eq!(result.reasons, vec![ReasonTag::PersonalDomain]);
        assert_eq!(result.severity, Severity::Low);
    }

    #[test]
    fn test_hr_prefix_with_at_sign_pins_local_part() {
        assert!(eval(&Contact::new("jobs@firma.de")).has(ReasonTag::HrServicePrefix));
        assert!(!eval(&Contact::new("jobsearch@firma.de")).has(ReasonTag::HrServicePrefix));
        assert!(eval(&Contact::new("karriere.team@firma.de")).has(ReasonTag::HrServicePrefix));
    }

    #[test]
    fn test_service_prefix_matches_anywhere() {
        assert!(eval(&Contact::new("shop-noreply@firma.de")).has(ReasonTag::HrServicePrefix));
    }

    #[test]
    fn test_geographic_exclusion_by_suffix_and_city() {
        assert!(eval(&Contact::new("info@firma.ru")).has(ReasonTag::GeographicExclusion));
        let by_city = Contact::new("info@firma.com").with_description("Niederlassung Moskau");
        assert!(eval(&by_city).has(ReasonTag::GeographicExclusion));
    }

    #[test]
    fn test_suspicious_pattern() {
        assert!(eval(&Contact::new("a3f9c0d2e1b4a5f6c7@firma.de")).has(ReasonTag::SuspiciousPattern));
        assert!(eval(&Contact::new("abcdefghijklmnopqrstuv@firma.de")).has(ReasonTag::SuspiciousPattern));
        assert!(!eval(&Contact::new("max.mustermann@firma.de")).has(ReasonTag::SuspiciousPattern));
        // all-letter hex run is a word, not a hash
        assert!(!looks_generated("deadbeefcafebabe"));
    }

    #[test]
    fn test_excluded_industry_is_critical() {
        let contact = Contact::new("info@firma.de").with_company("Restaurant Adler");
        let result = eval(&contact);
        assert_eq!(result.reasons, vec![ReasonTag::ExcludedIndustry]);
        assert_eq!(result.severity, Severity::Critical);
        assert_eq!(result.matched_industries, vec!["gastronomy"]);
    }

    #[test]
    fn test_excluded_industry_by_domain_only() {
        let contact = Contact::new("info@firma.de").with_domain("pizza-roma.de");
        let result = eval(&contact);
        assert!(result.has(ReasonTag::ExcludedIndustry));
    }

    #[test]
    fn test_two_reasons_is_warning_three_is_critical() {
        let two = eval(&Contact::new("jobs@web.de"));
        assert_eq!(two.reasons, vec![ReasonTag::PersonalDomain, ReasonTag::HrServicePrefix]);
        assert_eq!(two.severity, Severity::Warning);

        let three = eval(&Contact::new("jobs@web.de").with_description("office moskau"));
        assert_eq!(three.reasons.len(), 3);
        assert_eq!(three.severity, Severity::Critical);
    }

    #[test]
    fn test_missing_email_does_not_panic() {
        let result = eval(&Contact::default());
        assert!(!result.should_exclude);

        let garbage = Contact::new("@@@").with_description("moskau");
        assert_eq!(eval(&garbage).reasons, vec![ReasonTag::GeographicExclusion]);
    }

    #[test]
    fn test_filter_error_result() {
        let result = ExclusionResult::filter_error();
        assert!(result.should_exclude);
        assert_eq!(result.reasons, vec![ReasonTag::FilterError]);
    }
}
