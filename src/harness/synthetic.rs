//! Deterministic labelled contacts derived from a ruleset's own lists.
//!
//! Samples repeat a block of ten: four industry-relevant contacts expected
//! HIGH, two borderline contacts expected MEDIUM, two personal webmail
//! addresses and two HR/service mailboxes, all expected EXCLUDED.

use std::collections::HashSet;

use super::LabelledContact;
use crate::contact::Contact;
use crate::ruleset::{country_tld, KeywordCategory, Ruleset};
use crate::scoring::Tier;

const BLOCK: usize = 10;
const FIRST_NAMES: [&str; 6] = ["anna", "max", "lena", "paul", "sofia", "jonas"];
const LAST_NAMES: [&str; 6] = ["schmidt", "miller", "rossi", "garcia", "novak", "dubois"];

/// Lists pulled out of the ruleset once per generation run.
struct Pools {
    primary: Vec<String>,
    secondary: Vec<String>,
    b2b: Option<String>,
    location: Option<String>,
    tld: String,
    personal_domains: Vec<String>,
    hr_locals: Vec<String>,
    service_locals: Vec<String>,
}

impl Pools {
    fn new(ruleset: &Ruleset) -> Self {
        let keywords = &ruleset.industry_keywords;
        let collect = |category| dedup_lower(keywords.in_category(category));

        let primary = collect(KeywordCategory::PrimaryPositive);
        let mut secondary = collect(KeywordCategory::SecondaryPositive);
        if secondary.is_empty() {
            secondary = primary.clone();
        }
        let ex = &ruleset.hard_exclusions;

        Self {
            primary,
            secondary,
            b2b: collect(KeywordCategory::B2bIndicator).into_iter().next(),
            location: ruleset
                .geographic
                .priority_high
                .iter()
                .find(|k| !k.starts_with('.'))
                .map(|k| k.to_lowercase()),
            tld: country_tld(&ruleset.target.country).unwrap_or_else(|| ".com".to_string()),
            personal_domains: dedup_lower(ex.personal_domains.iter().map(String::as_str)),
            hr_locals: locals(ex.hr_prefixes.iter().map(String::as_str)),
            service_locals: locals(ex.service_prefixes.iter().map(String::as_str)),
        }
    }
}

/// Generate `n` labelled contacts. The same ruleset and count always
/// produce the same samples.
pub fn generate_samples(ruleset: &Ruleset, n: usize) -> Vec<LabelledContact> {
    let pools = Pools::new(ruleset);
    (0..n).map(|i| sample(&pools, i)).collect()
}

fn sample(pools: &Pools, i: usize) -> LabelledContact {
    let round = i / BLOCK;
    match i % BLOCK {
        slot @ 0..=3 => relevant(pools, i, round * 4 + slot),
        4 | 5 => borderline(pools, i),
        6 | 7 => personal(pools, i),
        8 => mailbox(&pools.hr_locals, "jobs", pools, i),
        _ => mailbox(&pools.service_locals, "noreply", pools, i),
    }
}

fn relevant(pools: &Pools, i: usize, nth: usize) -> LabelledContact {
    let picked: Vec<&str> = if pools.primary.is_empty() {
        Vec::new()
    } else {
        (0..3.min(pools.primary.len()))
            .map(|k| pools.primary[(nth + k) % pools.primary.len()].as_str())
            .collect()
    };

    let slug = picked.first().map(|k| slug(k)).unwrap_or_else(|| "industry".to_string());
    let mut company: Vec<String> = picked.iter().map(|k| capitalize(k)).collect();
    company.extend(pools.b2b.iter().map(|k| capitalize(k)));
    if company.is_empty() {
        company.push(format!("Company {}", i));
    }

    let mut contact = Contact::new(&format!("sales@{}-{}{}", slug, i, pools.tld))
        .with_company(&company.join(" "))
        .with_domain(&format!("{}-{}{}", slug, i, pools.tld));
    if let Some(ref location) = pools.location {
        contact = contact.with_description(&format!("Based in {}", capitalize(location)));
    }

    LabelledContact {
        contact,
        expected: Tier::High,
    }
}

fn borderline(pools: &Pools, i: usize) -> LabelledContact {
    let company = match pools.secondary.get(i % pools.secondary.len().max(1)) {
        Some(keyword) => format!("{} Partner {}", capitalize(keyword), i),
        None => format!("Partner {}", i),
    };
    LabelledContact {
        contact: Contact::new(&format!("office@generic-{}.com", i)).with_company(&company),
        expected: Tier::Medium,
    }
}

fn personal(pools: &Pools, i: usize) -> LabelledContact {
    let domain = pools
        .personal_domains
        .get(i % pools.personal_domains.len().max(1))
        .map(String::as_str)
        .unwrap_or("gmail.com");
    let first = FIRST_NAMES[i % FIRST_NAMES.len()];
    let last = LAST_NAMES[(i / 2) % LAST_NAMES.len()];
    LabelledContact {
        contact: Contact::new(&format!("{}.{}{}@{}", first, last, i, domain)),
        expected: Tier::Excluded,
    }
}

fn mailbox(locals: &[String], fallback: &str, pools: &Pools, i: usize) -> LabelledContact {
    let local = locals
        .get((i / BLOCK) % locals.len().max(1))
        .map(String::as_str)
        .unwrap_or(fallback);
    LabelledContact {
        contact: Contact::new(&format!("{}@company-{}{}", local, i, pools.tld)),
        expected: Tier::Excluded,
    }
}

/// Usable local parts from prefix entries: trailing '@' stripped, entries
/// that cannot stand alone as a local part skipped.
fn locals<'a>(prefixes: impl Iterator<Item = &'a str>) -> Vec<String> {
    dedup_lower(prefixes)
        .into_iter()
        .map(|p| p.trim_end_matches('@').to_string())
        .filter(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_alphanumeric() || "._-".contains(c)))
        .collect()
}

fn dedup_lower<'a>(items: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

/// ASCII domain label from a keyword: non-alphanumerics become '-'.
fn slug(keyword: &str) -> String {
    let raw: String = keyword
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    let trimmed = raw.trim_matches('-');
    if trimmed.is_empty() {
        "industry".to_string()
    } else {
        trimmed.to_string()
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
