use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Complete declarative filter definition.
///
/// A ruleset is immutable once loaded and is shared read-only by every
/// classification call.
///
/// Example YAML:
/// ```yaml
/// identity:
///   name: de_hydraulics
///   version: "1.0.0"
/// target:
///   country: DE
///   industry: hydraulics
///   languages: [de, en]
/// geographic:
///   priority_high: [germany, deutschland, ".de"]
///   excluded_countries: [".ru", ".cn"]
/// hard_exclusions:
///   personal_domains: [gmail.com, web.de]
///   hr_prefixes: ["jobs@", "karriere"]
/// industry_keywords:
///   - { category: primary_positive, language: de, keywords: [hydraulik, zylinder] }
/// scoring:
///   weights: { email_quality: 0.1, company_relevance: 0.45, geographic_priority: 0.3, engagement: 0.15 }
///   thresholds: { high_priority: 500, medium_priority: 300, low_priority: 100 }
///   bonus_multipliers:
///     - { name: target_geography, factor: 1.1 }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Ruleset {
    pub identity: Identity,
    pub target: Target,
    #[serde(default)]
    pub geographic: GeographicRules,
    #[serde(default)]
    pub hard_exclusions: HardExclusions,
    #[serde(default)]
    pub industry_keywords: IndustryKeywords,
    pub scoring: ScoringRules,
}

impl Ruleset {
    /// An empty ruleset for the given target with default scoring.
    pub fn minimal(name: &str, country: &str, industry: &str, languages: Vec<String>) -> Self {
        Self {
            identity: Identity {
                name: name.to_string(),
                version: default_version(),
                description: String::new(),
                created_at: None,
            },
            target: Target {
                country: country.to_string(),
                industry: industry.to_string(),
                languages,
            },
            geographic: GeographicRules::default(),
            hard_exclusions: HardExclusions::default(),
            industry_keywords: IndustryKeywords::default(),
            scoring: ScoringRules::default(),
        }
    }

    /// Equality over everything except the creation timestamp.
    pub fn same_content(&self, other: &Ruleset) -> bool {
        let strip = |r: &Ruleset| {
            let mut r = r.clone();
            r.identity.created_at = None;
            r
        };
        strip(self) == strip(other)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Identity {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub description: String,
    /// Creation timestamp; metadata only, never part of content comparisons
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Target {
    /// Two-letter uppercase country code (e.g. "DE")
    pub country: String,
    pub industry: String,
    /// Two-letter lowercase language codes, in priority order
    #[serde(default)]
    pub languages: Vec<String>,
}

/// Location keywords used for tiered geographic matching and exclusion.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GeographicRules {
    /// Country names, city names or domain suffixes worth the top geo score
    #[serde(default)]
    pub priority_high: Vec<String>,

    #[serde(default)]
    pub priority_medium: Vec<String>,

    /// Domain suffixes (e.g. ".ru") excluded outright. `None` means the
    /// section was never populated, which the validator flags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluded_countries: Option<Vec<String>>,

    #[serde(default)]
    pub excluded_cities: BTreeSet<String>,
}

/// Binary, score-independent disqualification criteria.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct HardExclusions {
    /// Full free-webmail domains (e.g. "gmail.com")
    #[serde(default)]
    pub personal_domains: BTreeSet<String>,

    /// Local-part prefixes such as "jobs@" or "karriere"
    #[serde(default)]
    pub hr_prefixes: BTreeSet<String>,

    /// Fragments matched anywhere in the local part (e.g. "noreply")
    #[serde(default)]
    pub service_prefixes: BTreeSet<String>,

    #[serde(default)]
    pub excluded_industries: BTreeMap<String, ExcludedIndustry>,
}

/// Keywords identifying one excluded industry.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ExcludedIndustry {
    /// Checked against company name and description
    #[serde(default)]
    pub keywords: BTreeSet<String>,

    /// Checked against the contact's web domain
    #[serde(default)]
    pub domain_keywords: BTreeSet<String>,
}

/// Keyword vocabulary categories.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum KeywordCategory {
    PrimaryPositive,
    SecondaryPositive,
    Negative,
    B2bIndicator,
    DomainPattern,
}

impl KeywordCategory {
    pub const ALL: [KeywordCategory; 5] = [
        KeywordCategory::PrimaryPositive,
        KeywordCategory::SecondaryPositive,
        KeywordCategory::Negative,
        KeywordCategory::B2bIndicator,
        KeywordCategory::DomainPattern,
    ];

    /// Categories that count towards company relevance
    pub fn is_positive(self) -> bool {
        matches!(
            self,
            KeywordCategory::PrimaryPositive | KeywordCategory::SecondaryPositive
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            KeywordCategory::PrimaryPositive => "primary_positive",
            KeywordCategory::SecondaryPositive => "secondary_positive",
            KeywordCategory::Negative => "negative",
            KeywordCategory::B2bIndicator => "b2b_indicator",
            KeywordCategory::DomainPattern => "domain_pattern",
        }
    }
}

/// Key of one keyword section: the (language, category) pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeywordKey {
    pub language: Option<String>,
    pub category: KeywordCategory,
}

/// One list of keywords for a (language, category) pair.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct KeywordSection {
    pub category: KeywordCategory,
    /// `None` for language-neutral vocabulary (brand names, domain fragments)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl std::fmt::Display for KeywordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.language {
            Some(ref language) => write!(f, "{}[{}]", self.category.as_str(), language),
            None => f.write_str(self.category.as_str()),
        }
    }
}

impl KeywordSection {
    pub fn key(&self) -> KeywordKey {
        KeywordKey {
            language: self.language.clone(),
            category: self.category,
        }
    }
}

/// Industry vocabulary keyed by (language, category).
///
/// Stored as an ordered list of sections so the document keeps the order
/// languages were added in; at most one section exists per key.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(transparent)]
pub struct IndustryKeywords {
    sections: Vec<KeywordSection>,
}

impl IndustryKeywords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sections(&self) -> &[KeywordSection] {
        &self.sections
    }

    pub(crate) fn sections_mut(&mut self) -> &mut [KeywordSection] {
        &mut self.sections
    }

    pub fn get(&self, language: Option<&str>, category: KeywordCategory) -> Option<&KeywordSection> {
        self.sections
            .iter()
            .find(|s| s.category == category && s.language.as_deref() == language)
    }

    /// Add keywords under a key, appending to an existing section when the
    /// key is already present.
    pub fn extend(&mut self, language: Option<&str>, category: KeywordCategory, keywords: &[String]) {
        if let Some(section) = self
            .sections
            .iter_mut()
            .find(|s| s.category == category && s.language.as_deref() == language)
        {
            section.keywords.extend(keywords.iter().cloned());
        } else {
            self.sections.push(KeywordSection {
                category,
                language: language.map(str::to_string),
                keywords: keywords.to_vec(),
            });
        }
    }

    /// Keys carried by more than one section, in document order. Only a
    /// hand-written document can contain them; `extend` never creates one.
    pub fn duplicate_keys(&self) -> Vec<KeywordKey> {
        let mut seen = BTreeSet::new();
        let mut duplicates = Vec::new();
        for key in self.sections.iter().map(KeywordSection::key) {
            if !seen.insert(key.clone()) && !duplicates.contains(&key) {
                duplicates.push(key);
            }
        }
        duplicates
    }

    /// Fold every repeated section into the first one with its key.
    /// Returns how many sections were removed.
    pub fn merge_duplicates(&mut self) -> usize {
        let before = self.sections.len();
        let mut merged: Vec<KeywordSection> = Vec::with_capacity(before);
        for section in self.sections.drain(..) {
            match merged.iter_mut().find(|s| s.key() == section.key()) {
                Some(existing) => existing.keywords.extend(section.keywords),
                None => merged.push(section),
            }
        }
        self.sections = merged;
        before - self.sections.len()
    }

    /// All keywords of a category across languages, in document order.
    pub fn in_category(&self, category: KeywordCategory) -> impl Iterator<Item = &str> {
        self.sections
            .iter()
            .filter(move |s| s.category == category)
            .flat_map(|s| s.keywords.iter().map(String::as_str))
    }

    /// Total keyword count across every section.
    pub fn total(&self) -> usize {
        self.sections.iter().map(|s| s.keywords.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Weighted scoring configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScoringRules {
    pub weights: Weights,
    pub thresholds: Thresholds,

    /// Applied first, in this order, when their trigger holds
    #[serde(default)]
    pub bonus_multipliers: Vec<Multiplier>,

    /// Applied after all bonuses, in this order
    #[serde(default)]
    pub penalty_multipliers: Vec<Multiplier>,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            weights: Weights::default(),
            thresholds: Thresholds::default(),
            bonus_multipliers: vec![
                Multiplier::new(Trigger::TargetIndustry, 1.2),
                Multiplier::new(Trigger::TargetGeography, 1.1),
                Multiplier::new(Trigger::B2bIndicator, 1.1),
            ],
            penalty_multipliers: vec![
                Multiplier::new(Trigger::ExcludedIndustry, 0.3),
                Multiplier::new(Trigger::ExcludedDomainKeyword, 0.5),
                Multiplier::new(Trigger::NegativeKeyword, 0.7),
            ],
        }
    }
}

/// Component weights; must sum to 1.0 within 0.01.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Weights {
    pub email_quality: f64,
    pub company_relevance: f64,
    pub geographic_priority: f64,
    pub engagement: f64,
}

impl Weights {
    pub const NAMES: [&'static str; 4] = [
        "email_quality",
        "company_relevance",
        "geographic_priority",
        "engagement",
    ];

    pub fn sum(&self) -> f64 {
        self.email_quality + self.company_relevance + self.geographic_priority + self.engagement
    }
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            email_quality: 0.10,
            company_relevance: 0.45,
            geographic_priority: 0.30,
            engagement: 0.15,
        }
    }
}

/// Tier boundaries on the 0-1000 score scale.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Thresholds {
    pub high_priority: u32,
    pub medium_priority: u32,
    pub low_priority: u32,
}

impl Thresholds {
    pub fn is_ordered(&self) -> bool {
        self.high_priority > self.medium_priority && self.medium_priority > self.low_priority
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            high_priority: 500,
            medium_priority: 300,
            low_priority: 100,
        }
    }
}

/// Conditions that fire a bonus or penalty multiplier.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Domain carries a target-industry pattern
    TargetIndustry,
    /// Geographic priority of 80 or more
    TargetGeography,
    /// Company text carries a B2B indicator
    B2bIndicator,
    /// Company text matches an excluded-industry keyword
    ExcludedIndustry,
    /// Domain matches an excluded-industry domain keyword
    ExcludedDomainKeyword,
    /// Company text matches a negative keyword
    NegativeKeyword,
}

impl Trigger {
    pub fn is_bonus(self) -> bool {
        matches!(
            self,
            Trigger::TargetIndustry | Trigger::TargetGeography | Trigger::B2bIndicator
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Trigger::TargetIndustry => "target_industry",
            Trigger::TargetGeography => "target_geography",
            Trigger::B2bIndicator => "b2b_indicator",
            Trigger::ExcludedIndustry => "excluded_industry",
            Trigger::ExcludedDomainKeyword => "excluded_domain_keyword",
            Trigger::NegativeKeyword => "negative_keyword",
        }
    }
}

/// A named multiplicative factor (> 1.0 bonus, < 1.0 penalty).
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Multiplier {
    pub name: Trigger,
    pub factor: f64,
}

impl Multiplier {
    pub fn new(name: Trigger, factor: f64) -> Self {
        Self { name, factor }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scoring_rules() {
        let rules = ScoringRules::default();
        assert!((rules.weights.sum() - 1.0).abs() < 1e-9);
        assert!(rules.thresholds.is_ordered());
        assert!(rules.bonus_multipliers.iter().all(|m| m.name.is_bonus()));
        assert!(rules.penalty_multipliers.iter().all(|m| !m.name.is_bonus()));
    }

    #[test]
    fn test_ruleset_serde_roundtrip() {
        let mut ruleset = Ruleset::minimal("de_test", "DE", "hydraulics", vec!["de".to_string()]);
        ruleset.geographic.priority_high = vec!["germany".to_string(), ".de".to_string()];
        ruleset.geographic.excluded_countries = Some(vec![".ru".to_string()]);
        ruleset.hard_exclusions.personal_domains.insert("gmail.com".to_string());
        ruleset.hard_exclusions.excluded_industries.insert(
            "recruiting".to_string(),
            ExcludedIndustry {
                keywords: ["personalvermittlung".to_string()].into(),
                domain_keywords: ["jobs".to_string()].into(),
            },
        );
        ruleset.industry_keywords.extend(
            Some("de"),
            KeywordCategory::PrimaryPositive,
            &["hydraulik".to_string()],
        );

        let yaml = serde_saphyr::to_string(&ruleset).unwrap();
        let parsed: Ruleset = serde_saphyr::from_str(&yaml).unwrap();
        assert_eq!(ruleset, parsed);
    }

    #[test]
    fn test_partial_ruleset_parse() {
        let yaml = r#"
identity:
  name: minimal
target:
  country: DE
  industry: hydraulics
scoring:
  weights: { email_quality: 0.25, company_relevance: 0.25, geographic_priority: 0.25, engagement: 0.25 }
  thresholds: { high_priority: 300, medium_priority: 200, low_priority: 100 }
"#;
        let ruleset: Ruleset = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(ruleset.identity.version, "1.0.0");
        assert!(ruleset.target.languages.is_empty());
        assert!(ruleset.geographic.excluded_countries.is_none());
        assert!(ruleset.industry_keywords.is_empty());
        assert!(ruleset.scoring.bonus_multipliers.is_empty());
    }

    #[test]
    fn test_keyword_sections_keyed_by_language_and_category() {
        let mut keywords = IndustryKeywords::new();
        keywords.extend(Some("de"), KeywordCategory::PrimaryPositive, &["hydraulik".to_string()]);
        keywords.extend(Some("en"), KeywordCategory::PrimaryPositive, &["hydraulic".to_string()]);
        keywords.extend(Some("de"), KeywordCategory::PrimaryPositive, &["zylinder".to_string()]);

        assert_eq!(keywords.sections().len(), 2);
        assert_eq!(
            keywords.get(Some("de"), KeywordCategory::PrimaryPositive).unwrap().keywords,
            vec!["hydraulik", "zylinder"]
        );
        assert_eq!(
            keywords.in_category(KeywordCategory::PrimaryPositive).collect::<Vec<_>>(),
            vec!["hydraulik", "zylinder", "hydraulic"]
        );
        assert_eq!(keywords.total(), 3);
    }

    #[test]
    fn test_repeated_sections_detected_and_merged() {
        let yaml = r#"
- { category: primary_positive, language: de, keywords: [hydraulik] }
- { category: primary_positive, language: en, keywords: [hydraulic] }
- { category: primary_positive, language: de, keywords: [zylinder] }
"#;
        let mut keywords: IndustryKeywords = serde_saphyr::from_str(yaml).unwrap();
        let duplicates = keywords.duplicate_keys();
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].to_string(), "primary_positive[de]");

        assert_eq!(keywords.merge_duplicates(), 1);
        assert!(keywords.duplicate_keys().is_empty());
        assert_eq!(
            keywords.get(Some("de"), KeywordCategory::PrimaryPositive).unwrap().keywords,
            vec!["hydraulik", "zylinder"]
        );
        assert_eq!(keywords.total(), 3);
    }

    #[test]
    fn test_same_content_ignores_timestamp() {
        let a = Ruleset::minimal("x", "DE", "hydraulics", vec![]);
        let mut b = a.clone();
        b.identity.created_at = Some(Utc::now());
        assert!(a.same_content(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = r#"
high_priority: 3
medium_priority: 2
low_priority: 1
extreme_priority: 4
"#;
        assert!(serde_saphyr::from_str::<Thresholds>(yaml).is_err());
    }
}
