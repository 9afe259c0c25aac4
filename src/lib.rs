//! Contact classification against declarative rulesets.
//!
//! A [`Ruleset`](ruleset::Ruleset) describes the target market: geography,
//! industry vocabulary per language, hard-exclusion criteria and weighted
//! scoring. A [`Classifier`](scoring::Classifier) evaluates contacts against
//! it, producing an exclusion verdict, a 0-1000 score and a tier.
//!
//! Around the engines:
//! - [`builder`] derives rulesets from country, industry and languages
//! - [`validation`] gates rulesets before use and estimates their quality
//! - [`harness`] measures accuracy on labelled or synthetic contacts, and throughput
//! - [`monitor`] tracks those measurements over time and raises alerts
//!
//! ```
//! use std::sync::Arc;
//! use contact_sieve::builder::{ConfigBuilder, TemplateLibrary};
//! use contact_sieve::contact::Contact;
//! use contact_sieve::scoring::{Classifier, Tier};
//!
//! let library = TemplateLibrary::builtin();
//! let ruleset = ConfigBuilder::new(&library).build("DE", "hydraulics", &["de".to_string()], None, None);
//! let classifier = Classifier::new(Arc::new(ruleset));
//!
//! let result = classifier.classify(&Contact::new("max@gmail.com"));
//! assert_eq!(result.tier, Tier::Excluded);
//! ```

pub mod builder;
pub mod config;
pub mod contact;
pub mod error;
pub mod exclusion;
pub mod harness;
pub mod monitor;
pub mod output;
pub mod ruleset;
pub mod scoring;
pub mod validation;

pub use error::{Error, Result};
