//! Woohoo DSA Server
//!
//! Runs the REST API with the LLM judge behind it.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use woohoo_dsa::{
    api::{self, AppState},
    config::AppConfig,
    storage::{seed_problems, MemoryStore, PgConfig, PgStore, Store},
    JwtAuthority, OpenRouterJudge, Problem, SubmissionService, TokenAuthority,
};

#[derive(Parser, Debug)]
#[command(name = "woohoo-server")]
#[command(about = "Woohoo DSA backend - coding practice with an AI judge")]
struct Args {
    /// Server port
    #[arg(short, long, default_value = "8080", env = "PORT")]
    port: u16,

    /// Server host
    #[arg(long, default_value = "0.0.0.0", env = "HOST")]
    host: String,

    /// Keep everything in process memory instead of PostgreSQL
    #[arg(long)]
    in_memory: bool,

    /// JSON array of problems to load at startup
    #[arg(long)]
    seed: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("woohoo_dsa=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .init();

    let args = Args::parse();
    let config = AppConfig::from_env();

    info!("Starting Woohoo DSA server");
    info!("  Judge: {:?}", config.judge);
    info!("  Trial limit: {}", config.quota.trial_limit);

    let store: Arc<dyn Store> = if args.in_memory {
        warn!("Using in-memory storage, data is lost on exit");
        Arc::new(MemoryStore::new())
    } else {
        let pg = PgStore::connect(&PgConfig::new(config.database_url.clone()))
            .await
            .context("failed to connect to PostgreSQL")?;
        Arc::new(pg)
    };

    if let Some(path) = &args.seed {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read seed file {}", path.display()))?;
        let problems: Vec<Problem> =
            serde_json::from_str(&raw).context("seed file is not a JSON array of problems")?;
        seed_problems(store.as_ref(), &problems).await?;
    }

    if config.judge.api_key.is_empty() {
        warn!("OPENROUTER_API_KEY is not set; trial submissions will be rejected by the judge");
    }
    let judge = Arc::new(OpenRouterJudge::new(config.judge.clone())?);

    let auth: Arc<dyn TokenAuthority> = Arc::new(JwtAuthority::new(
        &config.jwt_secret,
        chrono::Duration::hours(config.token_ttl_hours),
    ));

    let submissions = Arc::new(SubmissionService::new(
        store.clone(),
        judge,
        config.quota,
        config.judge_timeout(),
        config.store_timeout(),
    ));

    let state = AppState {
        store,
        auth,
        submissions,
        store_timeout: config.store_timeout(),
    };

    api::serve(state, &args.host, args.port).await
}
