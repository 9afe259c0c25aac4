//! Template library: per-country geography, per-(language, industry)
//! vocabulary and per-language exclusion additions the builder draws from.
//!
//! A library can be loaded from YAML by the caller; [`TemplateLibrary::builtin`]
//! carries a starter set for common European markets.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::ruleset::{ExcludedIndustry, KeywordCategory};

/// Domain suffixes blocked by default (spam-heavy or sanctioned ccTLDs)
pub const DEFAULT_BLOCKLIST_SUFFIXES: [&str; 13] = [
    ".ru", ".cn", ".by", ".ir", ".kp", ".su", ".xyz", ".top", ".tk", ".ml", ".ga", ".cf", ".gq",
];

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TemplateLibrary {
    /// Geographic defaults keyed by uppercase country code
    #[serde(default)]
    pub countries: BTreeMap<String, CountryDefaults>,

    #[serde(default)]
    pub vocabularies: Vec<Vocabulary>,

    /// Exclusion additions keyed by lowercase language code
    #[serde(default)]
    pub languages: BTreeMap<String, LanguageExclusions>,

    #[serde(default)]
    pub baseline: BaselineExclusions,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CountryDefaults {
    #[serde(default)]
    pub priority_high: Vec<String>,
    #[serde(default)]
    pub priority_medium: Vec<String>,
    #[serde(default)]
    pub excluded_countries: Vec<String>,
    #[serde(default)]
    pub excluded_cities: Vec<String>,
}

/// Industry vocabulary in one language.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Vocabulary {
    pub language: String,
    pub industry: String,
    #[serde(default)]
    pub primary_positive: Vec<String>,
    #[serde(default)]
    pub secondary_positive: Vec<String>,
    #[serde(default)]
    pub negative: Vec<String>,
    #[serde(default)]
    pub b2b_indicators: Vec<String>,
    #[serde(default)]
    pub domain_patterns: Vec<String>,
}

impl Vocabulary {
    /// Non-empty keyword lists with their category, in category order.
    pub fn sections(&self) -> impl Iterator<Item = (KeywordCategory, &[String])> {
        [
            (KeywordCategory::PrimaryPositive, self.primary_positive.as_slice()),
            (KeywordCategory::SecondaryPositive, self.secondary_positive.as_slice()),
            (KeywordCategory::Negative, self.negative.as_slice()),
            (KeywordCategory::B2bIndicator, self.b2b_indicators.as_slice()),
            (KeywordCategory::DomainPattern, self.domain_patterns.as_slice()),
        ]
        .into_iter()
        .filter(|(_, keywords)| !keywords.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LanguageExclusions {
    #[serde(default)]
    pub personal_domains: BTreeSet<String>,
    #[serde(default)]
    pub hr_prefixes: BTreeSet<String>,
    #[serde(default)]
    pub service_prefixes: BTreeSet<String>,
    #[serde(default)]
    pub excluded_industries: BTreeMap<String, ExcludedIndustry>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BaselineExclusions {
    #[serde(default)]
    pub personal_domains: BTreeSet<String>,
    #[serde(default)]
    pub hr_prefixes: BTreeSet<String>,
    #[serde(default)]
    pub service_prefixes: BTreeSet<String>,
}

impl TemplateLibrary {
    pub fn country(&self, code: &str) -> Option<&CountryDefaults> {
        self.countries.get(code)
    }

    /// Vocabulary for an exact (language, industry) pair.
    pub fn vocabulary(&self, language: &str, industry: &str) -> Option<&Vocabulary> {
        self.vocabularies
            .iter()
            .find(|v| v.language == language && v.industry == industry)
    }

    pub fn language(&self, code: &str) -> Option<&LanguageExclusions> {
        self.languages.get(code)
    }

    /// Starter library covering DACH, the UK, FR, IT, ES, NL, PL and the US.
    pub fn builtin() -> Self {
        let mut countries = BTreeMap::new();
        let mut add_country = |code: &str, high: &[&str], medium: &[&str]| {
            countries.insert(
                code.to_string(),
                CountryDefaults {
                    priority_high: list(high),
                    priority_medium: list(medium),
                    excluded_countries: list(&DEFAULT_BLOCKLIST_SUFFIXES),
                    excluded_cities: list(&["moscow", "moskau", "minsk", "pyongyang", "tehran"]),
                },
            );
        };
        add_country(
            "DE",
            &["germany", "deutschland", ".de", "berlin", "hamburg", "münchen", "munich", "köln", "frankfurt", "stuttgart", "düsseldorf"],
            &["austria", "österreich", ".at", "switzerland", "schweiz", ".ch"],
        );
        add_country(
            "AT",
            &["austria", "österreich", ".at", "wien", "vienna", "graz", "linz", "salzburg", "innsbruck"],
            &["germany", "deutschland", ".de", ".ch"],
        );
        add_country(
            "CH",
            &["switzerland", "schweiz", "suisse", "svizzera", ".ch", "zürich", "zurich", "genf", "geneva", "basel", "bern"],
            &[".de", ".at", ".li", "liechtenstein"],
        );
        add_country(
            "GB",
            &["united kingdom", "england", "scotland", "wales", ".uk", "london", "manchester", "birmingham", "leeds", "glasgow"],
            &["ireland", ".ie"],
        );
        add_country(
            "FR",
            &["france", ".fr", "paris", "lyon", "marseille", "toulouse", "lille"],
            &["belgique", ".be", ".lu", "suisse"],
        );
        add_country(
            "IT",
            &["italia", "italy", ".it", "milano", "milan", "roma", "torino", "bologna"],
            &[".ch", ".sm"],
        );
        add_country(
            "ES",
            &["españa", "spain", ".es", "madrid", "barcelona", "valencia", "sevilla", "bilbao"],
            &["portugal", ".pt"],
        );
        add_country(
            "NL",
            &["nederland", "netherlands", ".nl", "amsterdam", "rotterdam", "eindhoven", "utrecht"],
            &["belgië", ".be"],
        );
        add_country(
            "PL",
            &["polska", "poland", ".pl", "warszawa", "warsaw", "kraków", "wrocław", "poznań", "gdańsk"],
            &[".cz", ".de"],
        );
        add_country(
            "US",
            &["united states", "usa", ".us", "new york", "chicago", "houston", "texas", "california"],
            &["canada", ".ca"],
        );

        Self {
            countries,
            vocabularies: builtin_vocabularies(),
            languages: builtin_languages(),
            baseline: BaselineExclusions {
                personal_domains: set(&[
                    "gmail.com", "googlemail.com", "yahoo.com", "hotmail.com", "outlook.com", "live.com",
                    "icloud.com", "aol.com", "gmx.com", "mail.com", "protonmail.com", "yandex.ru", "mail.ru",
                ]),
                hr_prefixes: set(&["jobs@", "job@", "career@", "careers@", "hr@", "recruiting@"]),
                service_prefixes: set(&[
                    "noreply", "no-reply", "donotreply", "mailer-daemon", "postmaster", "newsletter", "bounce",
                ]),
            },
        }
    }
}

fn builtin_vocabularies() -> Vec<Vocabulary> {
    let vocab = |language: &str,
                 industry: &str,
                 primary: &[&str],
                 secondary: &[&str],
                 negative: &[&str],
                 b2b: &[&str],
                 domains: &[&str]| Vocabulary {
        language: language.to_string(),
        industry: industry.to_string(),
        primary_positive: list(primary),
        secondary_positive: list(secondary),
        negative: list(negative),
        b2b_indicators: list(b2b),
        domain_patterns: list(domains),
    };

    vec![
        vocab(
            "de",
            "hydraulics",
            &["hydraulik", "hydraulisch", "zylinder", "hydraulikzylinder", "pumpe", "ventil"],
            &["fluidtechnik", "antriebstechnik", "maschinenbau", "pneumatik", "dichtung", "schlauch"],
            &["spielzeug", "hobby", "gebraucht"],
            &["gmbh", "hersteller", "industrie", "großhandel", "zulieferer"],
            &["hydraulik", "hydraulic", "fluid"],
        ),
        vocab(
            "en",
            "hydraulics",
            &["hydraulic", "cylinder", "pump", "valve", "hydraulics"],
            &["fluid power", "actuator", "manufacturer", "machinery", "seals", "hose", "power unit"],
            &["toy", "hobby", "second-hand", "used"],
            &["ltd", "manufacturer", "industrial", "wholesale", "supplier", "b2b"],
            &["hydraulic", "fluid", "cylinder"],
        ),
        vocab(
            "fr",
            "hydraulics",
            &["hydraulique", "vérin", "pompe", "distributeur"],
            &["transmission", "pneumatique", "fabricant", "joint"],
            &["jouet", "occasion"],
            &["sarl", "fabricant", "industriel"],
            &["hydraulique"],
        ),
        vocab(
            "it",
            "hydraulics",
            &["oleodinamica", "idraulica", "cilindro", "pompa"],
            &["valvola", "pneumatica", "produttore"],
            &["giocattolo", "usato"],
            &["srl", "spa", "produttore"],
            &["oleodinamica", "idraulica"],
        ),
        vocab(
            "es",
            "hydraulics",
            &["hidráulica", "hidraulica", "cilindro", "bomba", "válvula"],
            &["neumática", "fabricante", "maquinaria"],
            &["juguete", "segunda mano"],
            &["s.l.", "fabricante", "industrial"],
            &["hidraulica"],
        ),
        vocab(
            "de",
            "machinery",
            &["maschinenbau", "sondermaschinen", "anlagenbau", "werkzeugmaschinen"],
            &["automatisierung", "fertigung", "cnc", "zerspanung"],
            &["gebraucht", "hobby"],
            &["gmbh", "hersteller", "industrie"],
            &["maschinen", "anlagenbau"],
        ),
        vocab(
            "en",
            "machinery",
            &["machinery", "machine tools", "special purpose machines", "plant engineering"],
            &["automation", "manufacturing", "cnc", "machining"],
            &["used", "hobby"],
            &["ltd", "manufacturer", "industrial"],
            &["machine", "engineering"],
        ),
        vocab(
            "de",
            "automotive",
            &["automotive", "fahrzeugteile", "kfz-zulieferer", "fahrzeugbau"],
            &["karosserie", "antriebsstrang", "fahrwerk", "elektromobilität"],
            &["autohaus", "gebrauchtwagen", "werkstatt"],
            &["gmbh", "zulieferer", "hersteller"],
            &["automotive", "auto"],
        ),
        vocab(
            "en",
            "automotive",
            &["automotive", "vehicle components", "tier 1", "auto parts"],
            &["powertrain", "chassis", "body shop", "electric vehicle"],
            &["car dealer", "used cars", "garage"],
            &["ltd", "supplier", "manufacturer"],
            &["automotive", "auto"],
        ),
    ]
}

fn builtin_languages() -> BTreeMap<String, LanguageExclusions> {
    let mut languages = BTreeMap::new();
    let industry = |keywords: &[&str], domains: &[&str]| ExcludedIndustry {
        keywords: set(keywords),
        domain_keywords: set(domains),
    };

    languages.insert(
        "de".to_string(),
        LanguageExclusions {
            personal_domains: set(&["web.de", "gmx.de", "gmx.net", "t-online.de", "freenet.de", "arcor.de"]),
            hr_prefixes: set(&["bewerbung", "karriere", "personal@", "ausbildung"]),
            service_prefixes: set(&["keine-antwort"]),
            excluded_industries: BTreeMap::from([
                (
                    "gastronomy".to_string(),
                    industry(&["restaurant", "gaststätte", "pizzeria", "imbiss"], &["pizza", "restaurant"]),
                ),
                (
                    "recruiting".to_string(),
                    industry(&["personalvermittlung", "zeitarbeit", "personaldienstleistung"], &["zeitarbeit"]),
                ),
            ]),
        },
    );
    languages.insert(
        "en".to_string(),
        LanguageExclusions {
            personal_domains: set(&["btinternet.com", "sky.com", "virginmedia.com", "yahoo.co.uk"]),
            hr_prefixes: set(&["recruitment", "careers", "hr@"]),
            service_prefixes: set(&["unsubscribe"]),
            excluded_industries: BTreeMap::from([
                (
                    "hospitality".to_string(),
                    industry(&["restaurant", "hotel", "catering"], &["hotel", "restaurant"]),
                ),
                (
                    "recruiting".to_string(),
                    industry(&["recruitment agency", "staffing", "headhunter"], &["recruit", "staffing"]),
                ),
                (
                    "education".to_string(),
                    industry(&["university", "school", "college"], &[".edu"]),
                ),
            ]),
        },
    );
    languages.insert(
        "fr".to_string(),
        LanguageExclusions {
            personal_domains: set(&["orange.fr", "free.fr", "laposte.net", "wanadoo.fr", "sfr.fr"]),
            hr_prefixes: set(&["recrutement", "emploi", "rh@"]),
            ..LanguageExclusions::default()
        },
    );
    languages.insert(
        "it".to_string(),
        LanguageExclusions {
            personal_domains: set(&["libero.it", "virgilio.it", "alice.it", "tin.it"]),
            hr_prefixes: set(&["lavoro", "risorse.umane"]),
            ..LanguageExclusions::default()
        },
    );
    languages.insert(
        "es".to_string(),
        LanguageExclusions {
            personal_domains: set(&["telefonica.net", "terra.es"]),
            hr_prefixes: set(&["empleo", "rrhh"]),
            ..LanguageExclusions::default()
        },
    );
    languages.insert(
        "nl".to_string(),
        LanguageExclusions {
            personal_domains: set(&["ziggo.nl", "kpnmail.nl", "planet.nl"]),
            hr_prefixes: set(&["vacatures", "werken"]),
            ..LanguageExclusions::default()
        },
    );
    languages.insert(
        "pl".to_string(),
        LanguageExclusions {
            personal_domains: set(&["wp.pl", "onet.pl", "interia.pl", "o2.pl"]),
            hr_prefixes: set(&["praca", "rekrutacja", "kariera"]),
            ..LanguageExclusions::default()
        },
    );
    languages
}

fn list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}
