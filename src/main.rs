use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use podmatch::config::{get_data_dir, load_config};
use podmatch::engine::MatchEngine;
use podmatch::experiment::{assign_variant, SqliteOutcomeLog, SqliteVariantStore, VariantStore};
use podmatch::matching::rank;
use podmatch::model::{Pod, Profile};
use podmatch::store::{PodFilter, PodStore, ProfileStore};

/// podmatch - Pod Recommendation & Auto-Match Engine
/// Local inspection tool for the study-pod matching library
#[derive(Parser)]
#[command(name = "podmatch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Pod recommendation and auto-match engine", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the podmatch data directory and database
    Init,

    /// Score and rank local pod fixtures against a profile
    Rank {
        /// Path to a profile JSON file
        #[arg(long)]
        profile: PathBuf,
        /// Path to a JSON file holding an array of pods
        #[arg(long)]
        pods: PathBuf,
        /// Maximum results to print
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Run the full auto-match flow against local pod fixtures
    AutoMatch {
        /// User identifier
        #[arg(long)]
        user: String,
        /// Path to a profile JSON file
        #[arg(long)]
        profile: PathBuf,
        /// Path to a JSON file holding an array of pods
        #[arg(long)]
        pods: PathBuf,
        /// Force the prompted variant: print join targets, attempt no joins
        #[arg(long)]
        dry_run: bool,
    },

    /// Show or assign the experiment variant for a user
    Variant {
        /// User identifier
        #[arg(long)]
        user: String,
    },

    /// Show variant and outcome counts
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init => init(),
        Commands::Rank { profile, pods, limit } => rank_fixtures(&profile, &pods, limit),
        Commands::AutoMatch { user, profile, pods, dry_run } => {
            auto_match(&user, &profile, &pods, dry_run).await
        }
        Commands::Variant { user } => show_variant(&user),
        Commands::Status => status(),
    }
}

/// Profile fixture loaded from a local JSON file
struct FixtureProfileStore {
    profile: Profile,
}

#[async_trait]
impl ProfileStore for FixtureProfileStore {
    async fn get_profile(&self, _user_id: &str) -> Result<Option<Profile>> {
        Ok(Some(self.profile.clone()))
    }
}

/// Pod fixtures loaded from a local JSON file; joins only log
struct FixturePodStore {
    pods: Vec<Pod>,
}

#[async_trait]
impl PodStore for FixturePodStore {
    async fn list_pods(&self, filter: &PodFilter) -> Result<Vec<Pod>> {
        Ok(self.pods.iter().filter(|p| filter.matches(p)).cloned().collect())
    }

    async fn list_user_pods(&self, _user_id: &str) -> Result<Vec<Pod>> {
        Ok(Vec::new())
    }

    async fn join_pod(&self, pod_id: &str, user_id: &str) -> Result<()> {
        info!("Fixture join: user {} -> pod {}", user_id, pod_id);
        Ok(())
    }
}

/// Create the data directory and database schema
fn init() -> Result<()> {
    let data_dir = get_data_dir()?;
    std::fs::create_dir_all(&data_dir)?;

    let db_path = data_dir.join("experiments.sqlite");
    SqliteVariantStore::open(&db_path)?;
    SqliteOutcomeLog::open(&db_path)?;

    info!("Initialized podmatch at {:?}", data_dir);
    println!("podmatch initialized at {:?}", data_dir);
    Ok(())
}

/// Offline scoring of local JSON fixtures
fn rank_fixtures(profile_path: &PathBuf, pods_path: &PathBuf, limit: Option<usize>) -> Result<()> {
    let config = load_config(&get_data_dir()?.join("config.toml"))?;
    let limit = limit.unwrap_or(config.match_limit);

    let profile: Profile = read_json(profile_path)?;
    let pods: Vec<Pod> = read_json(pods_path)?;

    let ranked = rank(&profile, &pods, limit, Utc::now());
    if ranked.is_empty() {
        println!("No candidate pods.");
        return Ok(());
    }

    println!("{:>5}  {:>5}  pod", "rank", "score");
    for (i, result) in ranked.iter().enumerate() {
        let name = result.pod.name.as_deref().unwrap_or(&result.pod.id);
        println!("{:>5}  {:>5}  {}", i + 1, result.score, name);
    }
    Ok(())
}

/// Drive the full engine (cache, variant, joins, outcome log) against
/// local fixtures, persisting variant and outcome under the data dir
async fn auto_match(
    user_id: &str,
    profile_path: &PathBuf,
    pods_path: &PathBuf,
    dry_run: bool,
) -> Result<()> {
    let data_dir = get_data_dir()?;
    std::fs::create_dir_all(&data_dir)?;
    let config = load_config(&data_dir.join("config.toml"))?;
    let db_path = data_dir.join("experiments.sqlite");

    let profile: Profile = read_json(profile_path)?;
    let pods: Vec<Pod> = read_json(pods_path)?;

    let (match_limit, join_limit) = (config.match_limit, config.join_limit);
    let engine = MatchEngine::new(
        Arc::new(FixtureProfileStore { profile }),
        Arc::new(FixturePodStore { pods }),
        Arc::new(SqliteVariantStore::open(&db_path)?),
        Arc::new(SqliteOutcomeLog::open(&db_path)?),
        config,
    );

    let variant_override = dry_run.then_some(podmatch::model::Variant::Prompted);
    let outcome = engine
        .auto_match_and_join(user_id, match_limit, join_limit, variant_override)
        .await?;

    println!("variant: {}", outcome.variant.as_str());
    println!("recommended:");
    for result in &outcome.recommended {
        let name = result.pod.name.as_deref().unwrap_or(&result.pod.id);
        println!("  {:>3}  {}", result.score, name);
    }
    println!("join targets: {:?}", outcome.join_targets);
    println!("joined:       {:?}", outcome.joined);
    Ok(())
}

fn show_variant(user_id: &str) -> Result<()> {
    let db_path = get_data_dir()?.join("experiments.sqlite");
    let store = SqliteVariantStore::open(&db_path)?;

    let existing = store.get_variant(user_id)?;
    let variant = assign_variant(&store, user_id)?;
    match existing {
        Some(_) => println!("{}: {} (previously assigned)", user_id, variant.as_str()),
        None => println!("{}: {} (newly assigned)", user_id, variant.as_str()),
    }
    Ok(())
}

fn status() -> Result<()> {
    let db_path = get_data_dir()?.join("experiments.sqlite");
    if !db_path.exists() {
        println!("Status: not initialized (run `podmatch init`)");
        return Ok(());
    }

    let variants = SqliteVariantStore::open(&db_path)?;
    let outcomes = SqliteOutcomeLog::open(&db_path)?;
    println!("Status: ready");
    println!("  Assigned users:    {}", variants.count()?);
    println!("  Recorded outcomes: {}", outcomes.count()?);
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &PathBuf) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {:?}", path))
}
