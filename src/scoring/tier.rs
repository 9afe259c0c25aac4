use serde::Serialize;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

use super::engine::{score, ScoreResult};
use crate::contact::Contact;
use crate::exclusion::{evaluate, ExclusionResult};
use crate::ruleset::{RuleIndex, Ruleset, Thresholds};

/// Priority bucket assigned to a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    High,
    Medium,
    Low,
    Excluded,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::High, Tier::Medium, Tier::Low, Tier::Excluded];

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::High => "HIGH",
            Tier::Medium => "MEDIUM",
            Tier::Low => "LOW",
            Tier::Excluded => "EXCLUDED",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a score to a tier. A hard exclusion always wins over the score.
pub fn assign_tier(total_score: u32, exclusion: &ExclusionResult, thresholds: &Thresholds) -> Tier {
    if exclusion.should_exclude {
        Tier::Excluded
    } else if total_score >= thresholds.high_priority {
        Tier::High
    } else if total_score >= thresholds.medium_priority {
        Tier::Medium
    } else if total_score >= thresholds.low_priority {
        Tier::Low
    } else {
        Tier::Excluded
    }
}

/// Exclusion verdict, score and final tier of one contact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub exclusion: ExclusionResult,
    pub score: ScoreResult,
    pub tier: Tier,
}

/// A loaded ruleset plus its derived lookup index.
///
/// Cheap to share across threads; every method takes `&self`.
#[derive(Debug, Clone)]
pub struct Classifier {
    ruleset: Arc<Ruleset>,
    index: RuleIndex,
}

impl Classifier {
    pub fn new(ruleset: Arc<Ruleset>) -> Self {
        let index = RuleIndex::new(&ruleset);
        debug!(ruleset = %ruleset.identity.name, "built rule index");
        Self { ruleset, index }
    }

    pub fn ruleset(&self) -> &Ruleset {
        &self.ruleset
    }

    pub fn index(&self) -> &RuleIndex {
        &self.index
    }

    pub fn classify(&self, contact: &Contact) -> Classification {
        let exclusion = evaluate(contact, &self.index);
        let score = score(contact, &self.index);
        let tier = assign_tier(score.total_score, &exclusion, &self.index.thresholds);
        Classification {
            exclusion,
            score,
            tier,
        }
    }

    /// Classify a record, turning a fault into a `filter_error` exclusion
    /// so one bad record cannot abort a batch.
    pub fn classify_guarded(&self, contact: &Contact) -> Classification {
        match catch_unwind(AssertUnwindSafe(|| self.classify(contact))) {
            Ok(classification) => classification,
            Err(_) => {
                warn!(email = ?contact.email, "classification faulted, recording filter_error");
                self.faulted()
            }
        }
    }

    /// Classification recorded for a record that could not be evaluated.
    fn faulted(&self) -> Classification {
        Classification {
            exclusion: ExclusionResult::filter_error(),
            score: score(&Contact::default(), &self.index),
            tier: Tier::Excluded,
        }
    }

    /// Results of one joined worker. A worker that died still yields one
    /// entry per contact so the batch stays aligned with its input.
    fn chunk_results(&self, joined: std::thread::Result<Vec<Classification>>, len: usize) -> Vec<Classification> {
        match joined {
            Ok(results) => results,
            Err(_) => {
                warn!(contacts = len, "batch worker panicked, recording filter_error for its chunk");
                (0..len).map(|_| self.faulted()).collect()
            }
        }
    }

    /// Classify contacts on up to `workers` threads. Output order matches
    /// input order.
    pub fn classify_batch(&self, contacts: &[Contact], workers: usize) -> Vec<Classification> {
        let workers = workers.max(1);
        if workers == 1 || contacts.len() < 2 {
            return contacts.iter().map(|c| self.classify_guarded(c)).collect();
        }

        let chunk_size = contacts.len().div_ceil(workers);
        std::thread::scope(|scope| {
            let handles: Vec<_> = contacts
                .chunks(chunk_size)
                .map(|chunk| {
                    let handle = scope.spawn(move || {
                        chunk
                            .iter()
                            .map(|c| self.classify_guarded(c))
                            .collect::<Vec<_>>()
                    });
                    (handle, chunk.len())
                })
                .collect();

            // Join in spawn order to keep partitions in input order
            handles
                .into_iter()
                .flat_map(|(h, len)| self.chunk_results(h.join(), len))
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exclusion::ReasonTag;

    fn sample_classifier() -> Classifier {
        let mut ruleset = Ruleset::minimal("t", "DE", "hydraulics", vec![]);
        ruleset.hard_exclusions.personal_domains = ["gmail.com".to_string()].into();
        ruleset.geographic.priority_high = vec![".de".to_string()];
        ruleset.scoring.thresholds = Thresholds {
            high_priority: 600,
            medium_priority: 400,
            low_priority: 200,
        };
        Classifier::new(Arc::new(ruleset))
    }

    #[test]
    fn test_assign_tier_boundaries() {
        let t = Thresholds {
            high_priority: 100,
            medium_priority: 50,
            low_priority: 10,
        };
        let ok = ExclusionResult::from_reasons(vec![], vec![]);
        assert_eq!(assign_tier(100, &ok, &t), Tier::High);
        assert_eq!(assign_tier(99, &ok, &t), Tier::Medium);
        assert_eq!(assign_tier(50, &ok, &t), Tier::Medium);
        assert_eq!(assign_tier(10, &ok, &t), Tier::Low);
        assert_eq!(assign_tier(9, &ok, &t), Tier::Excluded);
    }

    #[test]
    fn test_exclusion_precedence() {
        let t = Thresholds::default();
        let excluded = ExclusionResult::from_reasons(vec![ReasonTag::PersonalDomain], vec![]);
        assert_eq!(assign_tier(1000, &excluded, &t), Tier::Excluded);
    }

    #[test]
    fn test_classify_personal_domain_excluded() {
        let classifier = sample_classifier();
        let result = classifier.classify(&Contact::new("info@gmail.com"));
        assert_eq!(result.tier, Tier::Excluded);
        assert!(result.score.total_score > 0);
    }

    #[test]
    fn test_batch_preserves_order() {
        let classifier = sample_classifier();
        let contacts: Vec<Contact> = (0..37)
            .map(|i| {
                if i % 3 == 0 {
                    Contact::new(&format!("user{}@gmail.com", i))
                } else {
                    Contact::new(&format!("sales{}@firma{}.de", i, i))
                }
            })
            .collect();

        let sequential = classifier.classify_batch(&contacts, 1);
        let parallel = classifier.classify_batch(&contacts, 4);
        assert_eq!(sequential, parallel);
        assert_eq!(parallel.len(), 37);
        assert_eq!(parallel[0].tier, Tier::Excluded);
        assert_ne!(parallel[1].tier, Tier::Excluded);
    }

    #[test]
    fn test_dead_worker_keeps_batch_aligned() {
        let classifier = sample_classifier();
        let results = classifier.chunk_results(Err(Box::new("worker died")), 3);
        assert_eq!(results.len(), 3);
        assert!(results
            .iter()
            .all(|r| r.tier == Tier::Excluded && r.exclusion.reasons == vec![ReasonTag::FilterError]));

        let ok = vec![classifier.classify(&Contact::new("sales@firma.de"))];
        assert_eq!(classifier.chunk_results(Ok(ok.clone()), 1), ok);
    }

    #[test]
    fn test_classify_is_idempotent() {
        let classifier = sample_classifier();
        let contact = Contact::new("sales@firma.de").with_company("Firma GmbH");
        assert_eq!(classifier.classify(&contact), classifier.classify(&contact));
    }
}
