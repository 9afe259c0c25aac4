use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// One record to classify.
///
/// Every field is optional at this level; the engines treat missing or
/// malformed values as "no match" for whichever rule reads them.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Contact {
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub company_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub domain: Option<String>,
    /// City, country, page title and similar structured extras
    #[serde(default, deserialize_with = "lenient_map")]
    pub metadata: BTreeMap<String, String>,
}

/// Lower-cased local part and domain of a well-formed email address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailParts {
    pub local: String,
    pub domain: String,
}

impl Contact {
    pub fn new(email: &str) -> Self {
        Self {
            email: Some(email.to_string()),
            ..Self::default()
        }
    }

    pub fn with_company(mut self, company: &str) -> Self {
        self.company_name = Some(company.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_domain(mut self, domain: &str) -> Self {
        self.domain = Some(domain.to_string());
        self
    }

    /// Split the email into local part and domain.
    ///
    /// Returns `None` unless there is exactly one `@` with a non-empty local
    /// part on the left and a dotted domain without whitespace on the right.
    pub fn email_parts(&self) -> Option<EmailParts> {
        let email = self.email.as_deref()?.trim().to_lowercase();
        let (local, domain) = email.split_once('@')?;
        if local.is_empty()
            || domain.contains('@')
            || !domain.contains('.')
            || domain.starts_with('.')
            || domain.ends_with('.')
            || email.chars().any(char::is_whitespace)
        {
            return None;
        }
        Some(EmailParts {
            local: local.to_string(),
            domain: domain.to_string(),
        })
    }

    /// Lower-cased web domain, when present and non-blank.
    pub fn web_domain(&self) -> Option<String> {
        non_blank(self.domain.as_deref()).map(|d| d.to_lowercase())
    }

    /// Lower-cased company name and description, space-joined.
    pub fn company_text(&self) -> String {
        join_lower(&[self.company_name.as_deref(), self.description.as_deref()])
    }

    /// Lower-cased company name, description and web domain.
    pub fn relevance_text(&self) -> String {
        join_lower(&[
            self.company_name.as_deref(),
            self.description.as_deref(),
            self.domain.as_deref(),
        ])
    }

    /// Lower-cased email, description and web domain.
    pub fn location_text(&self) -> String {
        join_lower(&[
            self.email.as_deref(),
            self.description.as_deref(),
            self.domain.as_deref(),
        ])
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn join_lower(parts: &[Option<&str>]) -> String {
    parts
        .iter()
        .filter_map(|p| non_blank(*p))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Accept any value; keep strings, treat everything else as absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => Some(s),
        _ => None,
    })
}

/// Accept any value; keep string-valued entries of an object.
fn lenient_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Object(map) => map
            .into_iter()
            .filter_map(|(k, v)| match v {
                serde_json::Value::String(s) => Some((k, s)),
                _ => None,
            })
            .collect(),
        _ => BTreeMap::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_parts() {
        let contact = Contact::new("Info@Example.DE");
        let parts = contact.email_parts().unwrap();
        assert_eq!(parts.local, "info");
        assert_eq!(parts.domain, "example.de");
    }

    #[test]
    fn test_malformed_emails() {
        for email in ["", "no-at-sign", "@example.com", "a@b", "a@@b.com", "a b@c.com", "a@.com"] {
            assert!(Contact::new(email).email_parts().is_none(), "{email}");
        }
        assert!(Contact::default().email_parts().is_none());
    }

    #[test]
    fn test_text_helpers_skip_missing() {
        let contact = Contact::new("a@b.de").with_company("ACME GmbH").with_domain("acme.de");
        assert_eq!(contact.company_text(), "acme gmbh");
        assert_eq!(contact.relevance_text(), "acme gmbh acme.de");
        assert_eq!(contact.location_text(), "a@b.de acme.de");
    }

    #[test]
    fn test_lenient_deserialization() {
        let json = r#"{"email": 42, "company_name": "ACME", "description": null,
                       "metadata": {"city": "Berlin", "employees": 12}}"#;
        let contact: Contact = serde_json::from_str(json).unwrap();
        assert!(contact.email.is_none());
        assert_eq!(contact.company_name.as_deref(), Some("ACME"));
        assert!(contact.description.is_none());
        assert_eq!(contact.metadata.len(), 1);
        assert_eq!(contact.metadata["city"], "Berlin");
    }
}
