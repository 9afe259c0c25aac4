use std::collections::HashSet;

use super::schema::{KeywordCategory, Multiplier, Ruleset, Thresholds, Weights};

/// Keyword patterns of one excluded industry, lower-cased.
#[derive(Debug, Clone)]
pub struct IndustryPatterns {
    pub label: String,
    pub keywords: Vec<String>,
    pub domain_keywords: Vec<String>,
}

/// Read-only lookup structures derived once from a [`Ruleset`].
///
/// Every string is trimmed and lower-cased here so the engines can match
/// without re-normalising the ruleset on each call. Empty entries are
/// dropped.
#[derive(Debug, Clone)]
pub struct RuleIndex {
    pub country_tld: Option<String>,
    pub personal_domains: HashSet<String>,
    pub hr_prefixes: Vec<String>,
    pub service_prefixes: Vec<String>,
    pub excluded_suffixes: Vec<String>,
    pub excluded_cities: Vec<String>,
    pub excluded_industries: Vec<IndustryPatterns>,
    pub priority_high: Vec<String>,
    pub priority_medium: Vec<String>,
    /// Positive keywords across languages, de-duplicated, document order
    pub positive_keywords: Vec<String>,
    pub primary_keywords: Vec<String>,
    pub negative_keywords: Vec<String>,
    pub b2b_indicators: Vec<String>,
    pub domain_patterns: Vec<String>,
    pub weights: Weights,
    pub thresholds: Thresholds,
    pub bonuses: Vec<Multiplier>,
    pub penalties: Vec<Multiplier>,
}

impl RuleIndex {
    pub fn new(ruleset: &Ruleset) -> Self {
        let keywords = &ruleset.industry_keywords;
        let exclusions = &ruleset.hard_exclusions;

        let positive_keywords = normalize_all(
            keywords
                .sections()
                .iter()
                .filter(|s| s.category.is_positive())
                .flat_map(|s| s.keywords.iter().map(String::as_str)),
        );

        let excluded_industries = exclusions
            .excluded_industries
            .iter()
            .map(|(label, industry)| IndustryPatterns {
                label: label.clone(),
                keywords: normalize_all(industry.keywords.iter().map(String::as_str)),
                domain_keywords: normalize_all(industry.domain_keywords.iter().map(String::as_str)),
            })
            .collect();

        Self {
            country_tld: country_tld(&ruleset.target.country),
            personal_domains: normalize_all(exclusions.personal_domains.iter().map(String::as_str))
                .into_iter()
                .collect(),
            hr_prefixes: normalize_all(exclusions.hr_prefixes.iter().map(String::as_str)),
            service_prefixes: normalize_all(exclusions.service_prefixes.iter().map(String::as_str)),
            excluded_suffixes: normalize_all(
                ruleset
                    .geographic
                    .excluded_countries
                    .iter()
                    .flatten()
                    .map(String::as_str),
            ),
            excluded_cities: normalize_all(ruleset.geographic.excluded_cities.iter().map(String::as_str)),
            excluded_industries,
            priority_high: normalize_all(ruleset.geographic.priority_high.iter().map(String::as_str)),
            priority_medium: normalize_all(ruleset.geographic.priority_medium.iter().map(String::as_str)),
            positive_keywords,
            primary_keywords: normalize_all(keywords.in_category(KeywordCategory::PrimaryPositive)),
            negative_keywords: normalize_all(keywords.in_category(KeywordCategory::Negative)),
            b2b_indicators: normalize_all(keywords.in_category(KeywordCategory::B2bIndicator)),
            domain_patterns: normalize_all(keywords.in_category(KeywordCategory::DomainPattern)),
            weights: ruleset.scoring.weights,
            thresholds: ruleset.scoring.thresholds,
            bonuses: ruleset.scoring.bonus_multipliers.clone(),
            penalties: ruleset.scoring.penalty_multipliers.clone(),
        }
    }
}

/// Top-level domain used by the given country code, with leading dot.
pub fn country_tld(country: &str) -> Option<String> {
    let code = country.trim().to_ascii_lowercase();
    if code.is_empty() {
        return None;
    }
    Some(match code.as_str() {
        "gb" => ".uk".to_string(),
        _ => format!(".{}", code),
    })
}

/// Trim, lower-case, drop empties and duplicates while keeping first-seen order.
fn normalize_all<'a>(items: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ruleset::ExcludedIndustry;

    #[test]
    fn test_index_lowercases_and_dedups() {
        let mut ruleset = Ruleset::minimal("x", "DE", "hydraulics", vec![]);
        ruleset.hard_exclusions.personal_domains.insert("GMail.com".to_string());
        ruleset.industry_keywords.extend(
            Some("de"),
            KeywordCategory::PrimaryPositive,
            &["Hydraulik".to_string(), " ".to_string()],
        );
        ruleset.industry_keywords.extend(
            Some("en"),
            KeywordCategory::SecondaryPositive,
            &["hydraulik".to_string(), "Pumps".to_string()],
        );

        let index = RuleIndex::new(&ruleset);
        assert!(index.personal_domains.contains("gmail.com"));
        assert_eq!(index.positive_keywords, vec!["hydraulik", "pumps"]);
        assert_eq!(index.primary_keywords, vec!["hydraulik"]);
        assert_eq!(index.country_tld.as_deref(), Some(".de"));
    }

    #[test]
    fn test_index_excluded_industries() {
        let mut ruleset = Ruleset::minimal("x", "DE", "hydraulics", vec![]);
        ruleset.hard_exclusions.excluded_industries.insert(
            "gastronomy".to_string(),
            ExcludedIndustry {
                keywords: ["Restaurant".to_string()].into(),
                domain_keywords: ["pizza".to_string()].into(),
            },
        );
        let index = RuleIndex::new(&ruleset);
        assert_eq!(index.excluded_industries.len(), 1);
        assert_eq!(index.excluded_industries[0].keywords, vec!["restaurant"]);
    }

    #[test]
    fn test_country_tld_mapping() {
        assert_eq!(country_tld("GB").as_deref(), Some(".uk"));
        assert_eq!(country_tld("at").as_deref(), Some(".at"));
        assert_eq!(country_tld(""), None);
    }
}
