//! The four component scores, each on a 0-100 scale.

use crate::contact::{Contact, EmailParts};
use crate::ruleset::RuleIndex;

/// Local-part prefixes that indicate a role mailbox worth contacting
pub const PROFESSIONAL_PREFIXES: [&str; 5] = ["info", "contact", "sales", "enquiry", "enquiries"];
const HIGH_ENGAGEMENT_PREFIXES: [&str; 4] = ["sales", "contact", "enquiry", "business"];
const MEDIUM_ENGAGEMENT_PREFIXES: [&str; 3] = ["info", "hello", "mail"];

const RELEVANCE_BASE: u32 = 20;
const RELEVANCE_PER_MATCH: u32 = 16;
/// Distinct keyword matches beyond this add nothing
pub const MAX_KEYWORD_MATCHES: usize = 5;

const GEO_HIGH: u32 = 100;
const GEO_MEDIUM: u32 = 60;
const GEO_DEFAULT: u32 = 30;

fn clamp(value: u32) -> u32 {
    value.min(100)
}

pub fn email_quality(email: Option<&EmailParts>, index: &RuleIndex) -> u32 {
    let Some(parts) = email else {
        return 0;
    };
    let mut score = 50;
    if !index.personal_domains.contains(&parts.domain) {
        score += 30;
    }
    if PROFESSIONAL_PREFIXES.iter().any(|p| parts.local.starts_with(p)) {
        score += 20;
    }
    if let Some(ref tld) = index.country_tld {
        if parts.domain.ends_with(tld.as_str()) {
            score += 10;
        }
    }
    clamp(score)
}

/// Relevance from distinct positive keywords found in company name,
/// description and domain. Returns the score and the keywords that counted.
pub fn company_relevance(contact: &Contact, index: &RuleIndex) -> (u32, Vec<String>) {
    let text = contact.relevance_text();
    let matched: Vec<String> = index
        .positive_keywords
        .iter()
        .filter(|k| text.contains(k.as_str()))
        .take(MAX_KEYWORD_MATCHES)
        .cloned()
        .collect();
    let score = RELEVANCE_BASE + RELEVANCE_PER_MATCH * matched.len() as u32;
    (clamp(score), matched)
}

pub fn geographic_priority(contact: &Contact, index: &RuleIndex) -> u32 {
    let text = contact.location_text();
    if index.priority_high.iter().any(|k| text.contains(k.as_str())) {
        GEO_HIGH
    } else if index.priority_medium.iter().any(|k| text.contains(k.as_str())) {
        GEO_MEDIUM
    } else {
        GEO_DEFAULT
    }
}

pub fn engagement(email: Option<&EmailParts>) -> u32 {
    let Some(parts) = email else {
        return 0;
    };
    let local = parts.local.as_str();
    if HIGH_ENGAGEMENT_PREFIXES.iter().any(|p| local.starts_with(p)) {
        90
    } else if MEDIUM_ENGAGEMENT_PREFIXES.iter().any(|p| local.starts_with(p)) {
        60
    } else if is_personal_name(local) {
        70
    } else {
        40
    }
}

/// `firstname.lastname` shape: two alphabetic parts joined by a single dot.
fn is_personal_name(local: &str) -> bool {
    match local.split_once('.') {
        Some((first, last)) => {
            let alpha = |s: &str| s.len() >= 2 && s.chars().all(char::is_alphabetic);
            alpha(first) && alpha(last)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ruleset::{KeywordCategory, Ruleset};

    fn index_with_keywords(keywords: &[&str]) -> RuleIndex {
        let mut ruleset = Ruleset::minimal("t", "DE", "hydraulics", vec!["en".to_string()]);
        ruleset.hard_exclusions.personal_domains = ["gmail.com".to_string()].into();
        ruleset.industry_keywords.extend(
            Some("en"),
            KeywordCategory::PrimaryPositive,
            &keywords.iter().map(|k| k.to_string()).collect::<Vec<_>>(),
        );
        ruleset.geographic.priority_high = vec!["germany".to_string(), ".de".to_string()];
        ruleset.geographic.priority_medium = vec!["austria".to_string()];
        RuleIndex::new(&ruleset)
    }

    #[test]
    fn test_email_quality_bonuses() {
        let index = index_with_keywords(&[]);
        let parts = |e: &str| Contact::new(e).email_parts();
        assert_eq!(email_quality(parts("info@firma.de").as_ref(), &index), 100);
        assert_eq!(email_quality(parts("max@firma.com").as_ref(), &index), 80);
        assert_eq!(email_quality(parts("max@gmail.com").as_ref(), &index), 50);
        assert_eq!(email_quality(None, &index), 0);
    }

    #[test]
    fn test_company_relevance_counts_distinct_matches() {
        let index = index_with_keywords(&["hydraulic", "cylinder", "pump"]);
        let contact = Contact::new("a@b.de")
            .with_company("Hydraulic Hydraulic Works")
            .with_description("cylinder maker");
        let (score, matched) = company_relevance(&contact, &index);
        assert_eq!(score, 52);
        assert_eq!(matched, vec!["hydraulic", "cylinder"]);
    }

    #[test]
    fn test_company_relevance_capped() {
        let index = index_with_keywords(&["a1", "b2", "c3", "d4", "e5", "f6", "g7"]);
        let contact = Contact::new("a@b.de").with_description("a1 b2 c3 d4 e5 f6 g7");
        assert_eq!(company_relevance(&contact, &index).0, 100);
    }

    #[test]
    fn test_geographic_tiers() {
        let index = index_with_keywords(&[]);
        assert_eq!(geographic_priority(&Contact::new("a@b.de"), &index), 100);
        let medium = Contact::new("a@b.com").with_description("office in Austria");
        assert_eq!(geographic_priority(&medium, &index), 60);
        assert_eq!(geographic_priority(&Contact::new("a@b.com"), &index), 30);
    }

    #[test]
    fn test_engagement_shapes() {
        let parts = |e: &str| Contact::new(e).email_parts();
        assert_eq!(engagement(parts("sales@x.de").as_ref()), 90);
        assert_eq!(engagement(parts("hello@x.de").as_ref()), 60);
        assert_eq!(engagement(parts("max.mustermann@x.de").as_ref()), 70);
        assert_eq!(engagement(parts("mm1984@x.de").as_ref()), 40);
        assert_eq!(engagement(None), 0);
    }
}
