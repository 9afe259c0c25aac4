//! Settings and the files the CLI reads and writes: rulesets, templates,
//! contact lists and labelled samples.

mod schema;

pub use schema::{MonitorThresholds, Settings};

use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::contact::Contact;
use crate::error::Error;
use crate::harness::LabelledContact;
use crate::monitor::RulesetSource;
use crate::ruleset::Ruleset;

/// Get the config directory path (~/.config/contact-sieve/)
pub fn get_config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("contact-sieve"))
}

/// Get the default config file path (~/.config/contact-sieve/config.yaml)
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.yaml"))
}

/// Load settings from a YAML file
///
/// With no explicit path, a missing default file yields default settings.
/// An explicit path that does not exist is an error.
pub fn load_settings(path: Option<PathBuf>) -> Result<Settings> {
    let (config_path, explicit) = match path {
        Some(p) => (p, true),
        None => (get_config_path()?, false),
    };

    if !config_path.exists() {
        if explicit {
            anyhow::bail!("Config file not found at {}", config_path.display());
        }
        debug!(path = %config_path.display(), "no config file, using defaults");
        return Ok(Settings::default());
    }

    load_yaml(&config_path, "config")
}

/// Directory of named rulesets, honouring `rulesets_dir` from settings
pub fn rulesets_dir(settings: &Settings) -> Result<PathBuf> {
    match settings.rulesets_dir {
        Some(ref dir) => Ok(dir.clone()),
        None => Ok(get_config_dir()?.join("rulesets")),
    }
}

/// Directory of monitor history, honouring `history_dir` from settings
pub fn history_dir(settings: &Settings) -> Result<PathBuf> {
    match settings.history_dir {
        Some(ref dir) => Ok(dir.clone()),
        None => Ok(get_config_dir()?.join("history")),
    }
}

/// Parse any YAML document the CLI accepts (templates, insights, libraries).
pub fn load_yaml<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} file at {}", what, path.display()))?;
    serde_saphyr::from_str(&content)
        .with_context(|| format!("Failed to parse {}: invalid YAML in {}", what, path.display()))
}

pub fn load_ruleset(path: &Path) -> Result<Ruleset> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read ruleset at {}", path.display()))?;
    Ruleset::from_yaml(&content).with_context(|| format!("Invalid ruleset in {}", path.display()))
}

/// Write a ruleset as YAML, atomically.
pub fn save_ruleset(path: &Path, ruleset: &Ruleset) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory at {}", parent.display()))?;
    }

    let yaml = ruleset.to_yaml()?;
    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
    file.write_all(yaml.as_bytes()).context("Failed to write ruleset")?;
    file.commit().context("Failed to save ruleset")?;
    Ok(())
}

/// Contacts from a JSON array. Malformed fields inside a record are
/// tolerated; a document that is not an array of objects is not.
pub fn load_contacts(path: &Path) -> Result<Vec<Contact>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read contacts at {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse contacts: expected a JSON array in {}", path.display()))
}

/// Labelled samples from a JSON array of `{contact, expected}` objects.
pub fn load_samples(path: &Path) -> Result<Vec<LabelledContact>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read samples at {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse samples in {}", path.display()))
}

/// Rulesets stored as `<name>.yaml` (or `.yml`) in one directory.
#[derive(Debug, Clone)]
pub struct RulesetDir {
    dir: PathBuf,
}

impl RulesetDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn candidates(&self, name: &str) -> [PathBuf; 2] {
        [
            self.dir.join(format!("{}.yaml", name)),
            self.dir.join(format!("{}.yml", name)),
        ]
    }
}

impl RulesetSource for RulesetDir {
    fn load(&self, name: &str) -> crate::error::Result<Ruleset> {
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(Error::UnknownRuleset(name.to_string()));
        }

        for path in self.candidates(name) {
            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(Error::io(path, e)),
            };
            return Ruleset::from_yaml(&content).map_err(|e| match e {
                Error::InvalidRuleset(message) => Error::RulesetParse { path, message },
                other => other,
            });
        }
        Err(Error::UnknownRuleset(name.to_string()))
    }
}
