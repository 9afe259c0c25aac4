use serde::Serialize;
use tracing::trace;

use super::components;
use crate::contact::Contact;
use crate::ruleset::{Multiplier, RuleIndex, Trigger};

/// Geographic priority at or above which the target-geography bonus fires
const TARGET_GEOGRAPHY_MIN: u32 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ComponentScores {
    pub email_quality: u32,
    pub company_relevance: u32,
    pub geographic_priority: u32,
    pub engagement: u32,
}

/// One multiplier that fired, with the running score around it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Adjustment {
    pub name: String,
    pub factor: f64,
    pub before: f64,
    pub after: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    pub total_score: u32,
    pub components: ComponentScores,
    /// Weighted component sum on the 0-1000 scale, before multipliers
    pub base_score: f64,
    /// Product of every applied multiplier
    pub multiplier: f64,
    pub bonuses: Vec<String>,
    pub penalties: Vec<String>,
    pub adjustments: Vec<Adjustment>,
    pub matched_keywords: Vec<String>,
}

/// Score a contact against the ruleset.
///
/// Pure: the result depends only on the contact and the index. Penalties
/// apply whether or not the exclusion engine would exclude the contact.
pub fn score(contact: &Contact, index: &RuleIndex) -> ScoreResult {
    let email = contact.email_parts();
    let (company_relevance, matched_keywords) = components::company_relevance(contact, index);
    let scores = ComponentScores {
        email_quality: components::email_quality(email.as_ref(), index),
        company_relevance,
        geographic_priority: components::geographic_priority(contact, index),
        engagement: components::engagement(email.as_ref()),
    };

    let w = &index.weights;
    let base_score = (scores.email_quality as f64 * w.email_quality
        + scores.company_relevance as f64 * w.company_relevance
        + scores.geographic_priority as f64 * w.geographic_priority
        + scores.engagement as f64 * w.engagement)
        * 10.0;

    let triggers = TriggerState::evaluate(contact, email.as_ref().map(|p| p.domain.as_str()), &scores, index);

    let mut multiplier = 1.0;
    let mut bonuses = Vec::new();
    let mut penalties = Vec::new();
    let mut adjustments = Vec::new();

    // Bonuses first, then penalties, each in declared order
    for (list, applied) in [(&index.bonuses, &mut bonuses), (&index.penalties, &mut penalties)] {
        for m in list.iter().filter(|m| triggers.holds(m.name)) {
            let before = base_score * multiplier;
            multiplier *= m.factor;
            adjustments.push(adjustment(m, before, base_score * multiplier));
            applied.push(m.name.as_str().to_string());
        }
    }

    let total_score = (base_score * multiplier).floor().max(0.0) as u32;
    trace!(email = ?contact.email, base_score, multiplier, total_score, "scored contact");

    ScoreResult {
        total_score,
        components: scores,
        base_score,
        multiplier,
        bonuses,
        penalties,
        adjustments,
        matched_keywords,
    }
}

fn adjustment(m: &Multiplier, before: f64, after: f64) -> Adjustment {
    Adjustment {
        name: m.name.as_str().to_string(),
        factor: m.factor,
        before,
        after,
    }
}

/// Which multiplier triggers hold for one contact.
struct TriggerState {
    target_industry: bool,
    target_geography: bool,
    b2b_indicator: bool,
    excluded_industry: bool,
    excluded_domain_keyword: bool,
    negative_keyword: bool,
}

impl TriggerState {
    fn evaluate(
        contact: &Contact,
        email_domain: Option<&str>,
        scores: &ComponentScores,
        index: &RuleIndex,
    ) -> Self {
        let company_text = contact.company_text();
        let web_domain = contact.web_domain();
        let domains: Vec<&str> = web_domain.as_deref().into_iter().chain(email_domain).collect();

        let patterns = if index.domain_patterns.is_empty() {
            &index.primary_keywords
        } else {
            &index.domain_patterns
        };
        let target_industry = domains
            .iter()
            .any(|d| patterns.iter().any(|p| d.contains(p.as_str())));

        let excluded_industry = index
            .excluded_industries
            .iter()
            .any(|i| i.keywords.iter().any(|k| company_text.contains(k.as_str())));
        let excluded_domain_keyword = web_domain
            .as_deref()
            .map(|d| {
                index
                    .excluded_industries
                    .iter()
                    .any(|i| i.domain_keywords.iter().any(|k| d.contains(k.as_str())))
            })
            .unwrap_or(false);

        Self {
            target_industry,
            target_geography: scores.geographic_priority >= TARGET_GEOGRAPHY_MIN,
            b2b_indicator: index
                .b2b_indicators
                .iter()
                .any(|k| company_text.contains(k.as_str())),
            excluded_industry,
            excluded_domain_keyword,
            negative_keyword: index
                .negative_keywords
                .iter()
                .any(|k| company_text.contains(k.as_str())),
        }
    }

    fn holds(&self, trigger: Trigger) -> bool {
        match trigger {
            Trigger::TargetIndustry => self.target_industry,
            Trigger::TargetGeography => self.target_geography,
            Trigger::B2bIndicator => self.b2b_indicator,
            Trigger::ExcludedIndustry => self.excluded_industry,
            Trigger::ExcludedDomainKeyword => self.excluded_domain_keyword,
            Trigger::NegativeKeyword => self.negative_keyword,
        }
    }
}
