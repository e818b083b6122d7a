//! retroprio — rank reaction templates for retrosynthesis targets.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use retroprio_common::config::{RetroprioConfig, CONFIG_ENV_VAR, DEFAULT_CONFIG_FILE};
use retroprio_common::ConfigError;
use retroprio_fingerprint::{FingerprintAdapter, FingerprintParams, FingerprintTable};
use retroprio_relevance::{RankerSettings, RelevanceScorer, TemplateLibrary, TemplateRanker};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEMO_STRUCTURES: [&str; 2] = ["CCCOCCC", "CCCNc1ccccc1"];

#[derive(Parser)]
#[command(name = "retroprio", version, about = "Template relevance prioritization")]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, env = CONFIG_ENV_VAR, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the top-k (probability, template index) pairs for two example structures
    Demo {
        #[arg(short, default_value_t = 100)]
        k: usize,
    },
    /// Rank library templates for one or more target structures
    Rank {
        /// Target structures (SMILES)
        #[arg(required = true)]
        targets: Vec<String>,

        /// Override relevance.template_count
        #[arg(long)]
        top: Option<usize>,

        /// Override relevance.max_cum_prob
        #[arg(long)]
        max_cum_prob: Option<f32>,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct RankedTarget<'a> {
    target: &'a str,
    templates: Vec<retroprio_relevance::Template>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("retroprio=info,warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Command::Demo { k } => {
            let ranker = build_ranker(&config, RankerSettings::from(&config.relevance))?;
            for structure in DEMO_STRUCTURES {
                let top = ranker.get_top_k(structure, k)?;
                let pairs: Vec<String> = top
                    .iter()
                    .map(|(prob, idx)| format!("({prob:.6}, {idx})"))
                    .collect();
                println!("{} -> [{}]", structure, pairs.join(", "));
            }
        }
        Command::Rank {
            targets,
            top,
            max_cum_prob,
            json,
        } => {
            let mut settings = RankerSettings::from(&config.relevance);
            if let Some(top) = top {
                settings = settings.with_template_count(top);
            }
            if let Some(max_cum_prob) = max_cum_prob {
                settings = settings.with_max_cum_prob(max_cum_prob);
            }
            let ranker = build_ranker(&config, settings)?;
            let library = TemplateLibrary::from_json_file(&config.templates.path).with_context(|| {
                format!("loading templates from {}", config.templates.path.display())
            })?;

            let mut ranked = Vec::with_capacity(targets.len());
            for target in &targets {
                let templates = ranker.get_priority(&library, target)?;
                if templates.is_empty() {
                    warn!("No templates ranked for {target}; structure unknown or empty");
                }
                ranked.push(RankedTarget { target, templates });
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&ranked)?);
            } else {
                for entry in &ranked {
                    println!("{}", entry.target);
                    for (rank, t) in entry.templates.iter().enumerate() {
                        println!(
                            "  {:>3}. {:.6}  #{:<6} {}",
                            rank + 1,
                            t.score,
                            t.index,
                            t.reaction_smarts
                        );
                    }
                }
            }
        }
    }

    Ok(())
}

/// Read the config file, falling back to defaults when it does not exist.
fn load_config(path: &Path) -> anyhow::Result<RetroprioConfig> {
    match RetroprioConfig::from_path(path) {
        Ok(config) => {
            info!("Configuration loaded from {}", path.display());
            Ok(config)
        }
        Err(ConfigError::NotFound(_)) => {
            warn!("Config file {} not found; using defaults", path.display());
            Ok(RetroprioConfig::default())
        }
        Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
    }
}

fn build_ranker(
    config: &RetroprioConfig,
    settings: RankerSettings,
) -> anyhow::Result<TemplateRanker> {
    let params = FingerprintParams::from(&config.fingerprint);
    let table = FingerprintTable::from_json_file(&config.fingerprint.table).with_context(|| {
        format!("loading fingerprints from {}", config.fingerprint.table.display())
    })?;
    if *table.params() != params {
        warn!(
            "Fingerprint table was computed with {:?} but {:?} is configured; lookups will miss",
            table.params(),
            params
        );
    }

    let scorer = RelevanceScorer::from_search_paths(&config.relevance.weight_paths)?;
    info!(
        "Relevance network ready: {} ({} templates)",
        scorer.weights().describe(),
        scorer.output_dim()
    );

    Ok(TemplateRanker::new(
        FingerprintAdapter::new(table, params),
        scorer,
        settings,
    )?)
}
