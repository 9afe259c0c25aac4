pub mod index;
pub mod schema;

pub use index::{country_tld, IndustryPatterns, RuleIndex};
pub use schema::*;

use crate::error::{Error, Result};

impl Ruleset {
    /// Parse a ruleset from its YAML representation.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_saphyr::from_str(yaml).map_err(|e| Error::InvalidRuleset(e.to_string()))
    }

    /// Serialise the ruleset to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_saphyr::to_string(self).map_err(|e| Error::Serialize(e.to_string()))
    }
}
