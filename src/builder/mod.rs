//! Derive a [`Ruleset`] from a country, an industry and a set of languages.

pub mod templates;

pub use templates::{
    BaselineExclusions, CountryDefaults, LanguageExclusions, TemplateLibrary, Vocabulary,
    DEFAULT_BLOCKLIST_SUFFIXES,
};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use crate::ruleset::{KeywordSection, Ruleset, ScoringRules};

/// Caller-supplied overrides layered on top of the library defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RulesetTemplate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Replaces the default scoring section entirely
    #[serde(default)]
    pub scoring: Option<ScoringRules>,
    /// Appended after the library vocabulary
    #[serde(default)]
    pub keywords: Vec<KeywordSection>,
    #[serde(default)]
    pub priority_high: Vec<String>,
    #[serde(default)]
    pub priority_medium: Vec<String>,
    #[serde(default)]
    pub personal_domains: BTreeSet<String>,
    #[serde(default)]
    pub hr_prefixes: BTreeSet<String>,
    #[serde(default)]
    pub service_prefixes: BTreeSet<String>,
}

/// Findings from analysing an existing blocklist.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BlocklistInsights {
    /// Domain suffixes over-represented among blocked addresses
    #[serde(default)]
    pub domain_suffixes: Vec<String>,
}

/// Assembles rulesets from a [`TemplateLibrary`].
pub struct ConfigBuilder<'a> {
    library: &'a TemplateLibrary,
}

impl<'a> ConfigBuilder<'a> {
    pub fn new(library: &'a TemplateLibrary) -> Self {
        Self { library }
    }

    /// Build a ruleset.
    ///
    /// Content is fully determined by the inputs; only `created_at` differs
    /// between two calls. Unknown countries or industries yield empty
    /// sections rather than an error.
    pub fn build(
        &self,
        country: &str,
        industry: &str,
        languages: &[String],
        template: Option<&RulesetTemplate>,
        insights: Option<&BlocklistInsights>,
    ) -> Ruleset {
        let country = country.trim().to_ascii_uppercase();
        let industry = industry.trim().to_lowercase();
        let languages: Vec<String> = dedup_ordered(languages.iter().map(|l| l.trim().to_lowercase()));

        let name = template
            .and_then(|t| t.name.clone())
            .unwrap_or_else(|| format!("{}_{}", country.to_lowercase(), industry));
        let mut ruleset = Ruleset::minimal(&name, &country, &industry, languages.clone());
        ruleset.identity.description = template
            .and_then(|t| t.description.clone())
            .unwrap_or_else(|| {
                format!(
                    "Contact filter for {} in {} ({})",
                    industry,
                    country,
                    languages.join(", ")
                )
            });

        self.apply_geography(&mut ruleset, &country, insights);
        self.apply_vocabulary(&mut ruleset, &industry, &languages);
        self.apply_exclusions(&mut ruleset, &languages);

        if let Some(template) = template {
            apply_template(&mut ruleset, template);
        }

        ruleset.identity.created_at = Some(Utc::now());
        info!(
            ruleset = %ruleset.identity.name,
            keywords = ruleset.industry_keywords.total(),
            personal_domains = ruleset.hard_exclusions.personal_domains.len(),
            "built ruleset"
        );
        ruleset
    }

    fn apply_geography(&self, ruleset: &mut Ruleset, country: &str, insights: Option<&BlocklistInsights>) {
        let mut excluded: Option<Vec<String>> = None;

        match self.library.country(country) {
            Some(defaults) => {
                let geo = &mut ruleset.geographic;
                geo.priority_high = defaults.priority_high.clone();
                geo.priority_medium = defaults.priority_medium.clone();
                geo.excluded_cities = defaults.excluded_cities.iter().cloned().collect();
                excluded = Some(defaults.excluded_countries.clone());
            }
            None => warn!(country, "no geographic defaults for country"),
        }

        if let Some(insights) = insights {
            let suffixes = insights.domain_suffixes.iter().map(|s| normalize_suffix(s));
            let merged = excluded.unwrap_or_default().into_iter().chain(suffixes);
            excluded = Some(dedup_ordered(merged));
            debug!(count = insights.domain_suffixes.len(), "folded blocklist insights");
        }

        ruleset.geographic.excluded_countries = excluded;
    }

    fn apply_vocabulary(&self, ruleset: &mut Ruleset, industry: &str, languages: &[String]) {
        for language in languages {
            let Some(vocabulary) = self.library.vocabulary(language, industry) else {
                warn!(language = %language, industry, "no vocabulary for language and industry");
                continue;
            };
            for (category, keywords) in vocabulary.sections() {
                ruleset
                    .industry_keywords
                    .extend(Some(language.as_str()), category, keywords);
            }
        }
    }

    fn apply_exclusions(&self, ruleset: &mut Ruleset, languages: &[String]) {
        let baseline = &self.library.baseline;
        let ex = &mut ruleset.hard_exclusions;
        ex.personal_domains.extend(baseline.personal_domains.iter().cloned());
        ex.hr_prefixes.extend(baseline.hr_prefixes.iter().cloned());
        ex.service_prefixes.extend(baseline.service_prefixes.iter().cloned());

        for language in languages {
            let Some(additions) = self.library.language(language) else {
                continue;
            };
            ex.personal_domains.extend(additions.personal_domains.iter().cloned());
            ex.hr_prefixes.extend(additions.hr_prefixes.iter().cloned());
            ex.service_prefixes.extend(additions.service_prefixes.iter().cloned());
            for (label, industry) in &additions.excluded_industries {
                let entry = ex.excluded_industries.entry(label.clone()).or_default();
                entry.keywords.extend(industry.keywords.iter().cloned());
                entry.domain_keywords.extend(industry.domain_keywords.iter().cloned());
            }
        }
    }
}

fn apply_template(ruleset: &mut Ruleset, template: &RulesetTemplate) {
    if let Some(ref scoring) = template.scoring {
        ruleset.scoring = scoring.clone();
    }
    for section in &template.keywords {
        ruleset
            .industry_keywords
            .extend(section.language.as_deref(), section.category, &section.keywords);
    }
    let geo = &mut ruleset.geographic;
    geo.priority_high = dedup_ordered(geo.priority_high.drain(..).chain(template.priority_high.iter().cloned()));
    geo.priority_medium =
        dedup_ordered(geo.priority_medium.drain(..).chain(template.priority_medium.iter().cloned()));

    let ex = &mut ruleset.hard_exclusions;
    ex.personal_domains.extend(template.personal_domains.iter().cloned());
    ex.hr_prefixes.extend(template.hr_prefixes.iter().cloned());
    ex.service_prefixes.extend(template.service_prefixes.iter().cloned());
}

fn normalize_suffix(suffix: &str) -> String {
    let suffix = suffix.trim().to_lowercase();
    if suffix.starts_with('.') {
        suffix
    } else {
        format!(".{}", suffix)
    }
}

fn dedup_ordered(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    items
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ruleset::{KeywordCategory, Multiplier, Trigger};

    fn langs(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_build_known_target() {
        let library = TemplateLibrary::builtin();
        let ruleset = ConfigBuilder::new(&library).build("de", "Hydraulics", &langs(&["DE", "en"]), None, None);

        assert_eq!(ruleset.identity.name, "de_hydraulics");
        assert_eq!(ruleset.target.country, "DE");
        assert_eq!(ruleset.target.languages, langs(&["de", "en"]));
        assert!(ruleset.geographic.priority_high.contains(&"deutschland".to_string()));
        assert!(ruleset.geographic.excluded_countries.as_ref().unwrap().contains(&".ru".to_string()));
        assert!(ruleset.hard_exclusions.personal_domains.contains("gmail.com"));
        assert!(ruleset.hard_exclusions.personal_domains.contains("web.de"));
        assert!(ruleset.hard_exclusions.excluded_industries.contains_key("gastronomy"));
        assert!(ruleset.hard_exclusions.excluded_industries.contains_key("hospitality"));
        assert!(ruleset.identity.created_at.is_some());
    }

    #[test]
    fn test_language_sections_stay_distinguishable() {
        let library = TemplateLibrary::builtin();
        let ruleset = ConfigBuilder::new(&library).build("DE", "hydraulics", &langs(&["de", "en"]), None, None);
        let keywords = &ruleset.industry_keywords;

        let de = keywords.get(Some("de"), KeywordCategory::PrimaryPositive).unwrap();
        let en = keywords.get(Some("en"), KeywordCategory::PrimaryPositive).unwrap();
        assert!(de.keywords.contains(&"hydraulik".to_string()));
        assert!(en.keywords.contains(&"hydraulic".to_string()));
        // sections appear in language order
        assert_eq!(keywords.sections()[0].language.as_deref(), Some("de"));
    }

    #[test]
    fn test_merged_exclusion_industries_union_keywords() {
        let library = TemplateLibrary::builtin();
        let ruleset = ConfigBuilder::new(&library).build("DE", "hydraulics", &langs(&["de", "en"]), None, None);
        let recruiting = &ruleset.hard_exclusions.excluded_industries["recruiting"];
        assert!(recruiting.keywords.contains("zeitarbeit"));
        assert!(recruiting.keywords.contains("staffing"));
    }

    #[test]
    fn test_build_is_deterministic() {
        let library = TemplateLibrary::builtin();
        let builder = ConfigBuilder::new(&library);
        let a = builder.build("AT", "machinery", &langs(&["de", "en"]), None, None);
        let b = builder.build("AT", "machinery", &langs(&["de", "en"]), None, None);
        assert!(a.same_content(&b));
    }

    #[test]
    fn test_unknown_target_is_minimal() {
        let library = TemplateLibrary::builtin();
        let ruleset = ConfigBuilder::new(&library).build("XX", "basket weaving", &langs(&["xx"]), None, None);

        assert!(ruleset.geographic.priority_high.is_empty());
        assert!(ruleset.geographic.excluded_countries.is_none());
        assert!(ruleset.industry_keywords.is_empty());
        assert!(!ruleset.hard_exclusions.personal_domains.is_empty());
        assert!(ruleset.scoring.thresholds.is_ordered());
    }

    #[test]
    fn test_blocklist_insights_folded_into_excluded_countries() {
        let library = TemplateLibrary::builtin();
        let insights = BlocklistInsights {
            domain_suffixes: vec!["VN".to_string(), ".ru".to_string(), ".pk".to_string()],
        };
        let ruleset = ConfigBuilder::new(&library).build("DE", "hydraulics", &langs(&["de"]), None, Some(&insights));
        let excluded = ruleset.geographic.excluded_countries.unwrap();

        assert!(excluded.contains(&".vn".to_string()));
        assert!(excluded.contains(&".pk".to_string()));
        assert_eq!(excluded.iter().filter(|s| *s == ".ru").count(), 1);

        let unknown = ConfigBuilder::new(&library).build("XX", "x", &[], None, Some(&insights));
        assert_eq!(unknown.geographic.excluded_countries.unwrap().len(), 3);
    }

    #[test]
    fn test_template_overrides() {
        let library = TemplateLibrary::builtin();
        let template = RulesetTemplate {
            name: Some("custom".to_string()),
            scoring: Some(ScoringRules {
                bonus_multipliers: vec![Multiplier::new(Trigger::TargetGeography, 1.5)],
                penalty_multipliers: vec![],
                ..ScoringRules::default()
            }),
            keywords: vec![KeywordSection {
                category: KeywordCategory::PrimaryPositive,
                language: None,
                keywords: vec!["bosch rexroth".to_string()],
            }],
            personal_domains: ["example-mail.de".to_string()].into(),
            ..RulesetTemplate::default()
        };
        let ruleset = ConfigBuilder::new(&library).build("DE", "hydraulics", &langs(&["de"]), Some(&template), None);

        assert_eq!(ruleset.identity.name, "custom");
        assert_eq!(ruleset.scoring.bonus_multipliers.len(), 1);
        assert!(ruleset.industry_keywords.get(None, KeywordCategory::PrimaryPositive).is_some());
        assert!(ruleset.hard_exclusions.personal_domains.contains("example-mail.de"));
    }
}
