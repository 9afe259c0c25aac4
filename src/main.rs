use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

use contact_sieve::builder::{BlocklistInsights, ConfigBuilder, RulesetTemplate, TemplateLibrary};
use contact_sieve::config::{self, RulesetDir, Settings};
use contact_sieve::harness::{self, BenchmarkOptions};
use contact_sieve::monitor::{JsonHistoryStore, QualityMonitor, RulesetSource};
use contact_sieve::output;
use contact_sieve::ruleset::Ruleset;
use contact_sieve::scoring::Classifier;
use contact_sieve::validation;

const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_CONFIG: i32 = 4;
const EXIT_ALERT: i32 = 5;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    /// Aligned columns, colored on a terminal
    Table,
    /// Tab-separated values for scripting
    Tsv,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a ruleset for a country, industry and languages
    Build {
        /// Two-letter country code, e.g. DE
        #[arg(long)]
        country: String,
        #[arg(long)]
        industry: String,
        /// Language code; repeat for several, in priority order
        #[arg(long = "language", short = 'l', required = true)]
        languages: Vec<String>,
        /// YAML template with overrides
        #[arg(long)]
        template: Option<PathBuf>,
        /// YAML blocklist insights
        #[arg(long)]
        insights: Option<PathBuf>,
        /// YAML template library replacing the built-in one
        #[arg(long)]
        library: Option<PathBuf>,
        /// Output file (defaults to <rulesets dir>/<name>.yaml; "-" for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check a ruleset file and estimate its quality
    Validate {
        ruleset: PathBuf,
        /// Repair what can be repaired and write the file back
        #[arg(long)]
        fix: bool,
        #[arg(long)]
        json: bool,
    },
    /// Classify contacts from a JSON array file
    Classify {
        /// Ruleset file, or name of a ruleset in the rulesets directory
        ruleset: String,
        contacts: PathBuf,
        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
        /// Worker threads (defaults to settings, then CPU count)
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Measure accuracy on labelled or synthetic contacts
    Test {
        ruleset: String,
        /// JSON array of {contact, expected} samples; synthetic when omitted
        #[arg(long)]
        samples: Option<PathBuf>,
        /// Number of synthetic samples
        #[arg(long, default_value_t = 100)]
        count: usize,
        #[arg(long)]
        json: bool,
    },
    /// Measure throughput and tier distribution on synthetic contacts
    Benchmark {
        ruleset: String,
        #[arg(long)]
        count: Option<usize>,
        /// Wall-clock budget, e.g. "5s"
        #[arg(long, value_parser = humantime::parse_duration)]
        budget: Option<Duration>,
        #[arg(long)]
        json: bool,
    },
    /// Record quality metrics for a named ruleset and report trends
    Monitor {
        name: String,
        /// Look-back period for trends, e.g. "30d"
        #[arg(long, value_parser = humantime::parse_duration, default_value = "30d")]
        period: Duration,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Parser, Debug)]
#[command(name = "contact-sieve")]
#[command(about = "Exclude, score and tier contacts against a declarative ruleset", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/contact-sieve/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = match config::load_settings(cli.config.clone()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    let start_time = Instant::now();
    let code = match run(cli.command, &settings) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_ERROR
        }
    };

    if cli.verbose {
        eprintln!("Finished in {:?}", start_time.elapsed());
    }
    std::process::exit(code);
}

fn run(command: Commands, settings: &Settings) -> Result<i32> {
    let use_colors = output::should_use_colors();

    match command {
        Commands::Build {
            country,
            industry,
            languages,
            template,
            insights,
            library,
            output,
        } => {
            let library = match library {
                Some(path) => config::load_yaml::<TemplateLibrary>(&path, "template library")?,
                None => TemplateLibrary::builtin(),
            };
            let template = template
                .map(|p| config::load_yaml::<RulesetTemplate>(&p, "template"))
                .transpose()?;
            let insights = insights
                .map(|p| config::load_yaml::<BlocklistInsights>(&p, "blocklist insights"))
                .transpose()?;

            let ruleset = ConfigBuilder::new(&library).build(
                &country,
                &industry,
                &languages,
                template.as_ref(),
                insights.as_ref(),
            );
            let report = validation::validate(&ruleset);

            let to_stdout = output.as_ref().is_some_and(|p| p.as_os_str() == "-");
            if to_stdout {
                println!("{}", ruleset.to_yaml()?);
            } else {
                let path = match output {
                    Some(path) => path,
                    None => config::rulesets_dir(settings)?.join(format!("{}.yaml", ruleset.identity.name)),
                };
                config::save_ruleset(&path, &ruleset)?;
                eprintln!("Wrote ruleset '{}' to {}", ruleset.identity.name, path.display());
            }
            eprintln!("{}", output::format_quality_report(&report, use_colors));

            Ok(if report.success { EXIT_SUCCESS } else { EXIT_CONFIG })
        }

        Commands::Validate { ruleset, fix, json } => {
            let content = std::fs::read_to_string(&ruleset)
                .with_context(|| format!("Failed to read ruleset at {}", ruleset.display()))?;
            let report = if fix {
                let (report, repaired) = validation::fix_document(&content);
                if let Some(repaired) = repaired {
                    config::save_ruleset(&ruleset, &repaired)?;
                }
                report
            } else {
                validation::validate_document(&content)
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", output::format_quality_report(&report, use_colors));
            }
            Ok(if report.success { EXIT_SUCCESS } else { EXIT_CONFIG })
        }

        Commands::Classify {
            ruleset,
            contacts,
            format,
            workers,
        } => {
            let Some(classifier) = gated_classifier(&ruleset, settings, use_colors)? else {
                return Ok(EXIT_CONFIG);
            };
            let contacts = config::load_contacts(&contacts)?;
            let workers = workers.unwrap_or_else(|| settings.effective_workers());
            let results = classifier.classify_batch(&contacts, workers);

            match format {
                Format::Table => println!(
                    "{}",
                    output::format_classification_table(&contacts, &results, use_colors)
                ),
                Format::Tsv => println!("{}", output::format_tsv(&contacts, &results)),
                Format::Json => println!("{}", serde_json::to_string_pretty(&results)?),
            }
            Ok(EXIT_SUCCESS)
        }

        Commands::Test {
            ruleset,
            samples,
            count,
            json,
        } => {
            let Some(classifier) = gated_classifier(&ruleset, settings, use_colors)? else {
                return Ok(EXIT_CONFIG);
            };
            let samples = match samples {
                Some(path) => config::load_samples(&path)?,
                None => harness::generate_samples(classifier.ruleset(), count),
            };
            let report = harness::run_tests(&classifier, &samples);

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", output::format_test_report(&report, use_colors));
            }
            Ok(EXIT_SUCCESS)
        }

        Commands::Benchmark {
            ruleset,
            count,
            budget,
            json,
        } => {
            let Some(classifier) = gated_classifier(&ruleset, settings, use_colors)? else {
                return Ok(EXIT_CONFIG);
            };
            let options = BenchmarkOptions {
                max_high_tier_pct: settings.max_high_tier_pct,
                budget,
            };
            let count = count.unwrap_or(settings.monitor.benchmark_samples);
            let report = harness::run_benchmark(&classifier, count, &options);

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", output::format_benchmark_report(&report, use_colors));
            }
            Ok(EXIT_SUCCESS)
        }

        Commands::Monitor { name, period, json } => {
            let monitor = QualityMonitor::new(
                RulesetDir::new(config::rulesets_dir(settings)?),
                JsonHistoryStore::new(config::history_dir(settings)?),
                settings.monitor_settings()?,
            );
            let report = monitor.monitor(&name, period)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", output::format_monitoring_report(&report, use_colors));
            }
            Ok(if report.has_critical() { EXIT_ALERT } else { EXIT_SUCCESS })
        }
    }
}

/// Load a ruleset by path or by name from the rulesets directory.
fn resolve_ruleset(arg: &str, settings: &Settings) -> Result<Ruleset> {
    let path = Path::new(arg);
    if path.is_file() {
        return config::load_ruleset(path);
    }
    let dir = config::rulesets_dir(settings)?;
    RulesetDir::new(&dir)
        .load(arg)
        .with_context(|| format!("No ruleset file '{}' and no ruleset of that name in {}", arg, dir.display()))
}

/// A classifier for a ruleset that passes validation; `None` after
/// printing the report when it does not.
fn gated_classifier(arg: &str, settings: &Settings, use_colors: bool) -> Result<Option<Classifier>> {
    let ruleset = resolve_ruleset(arg, settings)?;
    let report = validation::validate(&ruleset);
    if !report.success {
        eprintln!("Ruleset '{}' failed validation:", ruleset.identity.name);
        eprintln!("{}", output::format_quality_report(&report, use_colors));
        return Ok(None);
    }
    Ok(Some(Classifier::new(Arc::new(ruleset))))
}
