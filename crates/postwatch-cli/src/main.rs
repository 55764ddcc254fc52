//! Command-line boundary for the sync engine.
//!
//! The scraping collaborator (out of scope here) produces candidate batches
//! as JSON; `ingest` feeds them through the reconcile → deliver pipeline.
//! The remaining commands expose the maintenance and observability surface.

use std::fmt;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use postwatch_db::PoolConfig;
use postwatch_sync::RunType;

mod delivery;
mod ingest;
mod maintenance;


#[derive(Debug, Parser)]
#[command(name = "postwatch")]
#[command(about = "Community-post watcher: reconcile scraped batches and forward new posts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Submit a batch of scraped candidate posts for reconciliation and delivery
    Ingest {
        /// Path to a JSON array of candidate posts; reads stdin when omitted
        #[arg(long)]
        input: Option<PathBuf>,

        /// Activation cutoff (RFC 3339); overrides the stored cutoff
        #[arg(long)]
        cutoff: Option<String>,

        /// What triggered this run
        #[arg(long, value_enum, default_value_t = RunTypeArg::Manual)]
        run_type: RunTypeArg,
    },
    /// Re-deliver posts that were persisted but never confirmed by the sink
    Resend {
        /// Maximum number of posts to replay
        #[arg(long, default_value_t = 50)]
        limit: i64,
    },
    /// Reset the activation cutoff (defaults to now)
    Activate {
        /// Explicit cutoff instant (RFC 3339)
        #[arg(long)]
        at: Option<String>,
    },
    /// Print store totals and recent activity
    Stats,
    /// List recent sessions
    Sessions {
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },
    /// Purge old posts and sweep session history
    Cleanup {
        /// Post retention in days; defaults to POSTWATCH_MAX_AGE_DAYS
        #[arg(long)]
        max_age_days: Option<u32>,
    },
    /// Send a connectivity test ping to the configured webhook
    TestWebhook,
    /// Delete ALL stored data (debugging)
    Wipe {
        /// Required confirmation flag
        #[arg(long)]
        yes: bool,
    },
    /// Dump the full store as JSON to stdout
    Export,
}

/// CLI-facing run-type values, mapped onto [`RunType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RunTypeArg {
    Manual,
    Scheduled,
    Test,
}

impl From<RunTypeArg> for RunType {
    fn from(arg: RunTypeArg) -> Self {
        match arg {
            RunTypeArg::Manual => RunType::Manual,
            RunTypeArg::Scheduled => RunType::Scheduled,
            RunTypeArg::Test => RunType::Test,
        }
    }
}

// clap renders the default value through Display.
impl fmt::Display for RunTypeArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunTypeArg::Manual => "manual",
            RunTypeArg::Scheduled => "scheduled",
            RunTypeArg::Test => "test",
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = postwatch_core::load_app_config()?;
    init_tracing(&config.log_level);

    let pool =
        postwatch_db::connect_pool(&config.database_url, PoolConfig::from_app_config(&config))
            .await?;
    let applied = postwatch_db::run_migrations(&pool).await?;
    if applied > 0 {
        tracing::info!(applied, "applied store migrations");
    }

    match cli.command {
        Commands::Ingest {
            input,
            cutoff,
            run_type,
        } => {
            ingest::run_ingest(&pool, &config, input.as_deref(), cutoff.as_deref(), run_type.into())
                .await
        }
        Commands::Resend { limit } => delivery::run_resend(&pool, &config, limit).await,
        Commands::Activate { at } => maintenance::run_activate(&pool, at.as_deref()).await,
        Commands::Stats => maintenance::run_stats(&pool).await,
        Commands::Sessions { limit } => maintenance::run_sessions(&pool, limit).await,
        Commands::Cleanup { max_age_days } => {
            maintenance::run_cleanup(&pool, &config, max_age_days).await
        }
        Commands::TestWebhook => delivery::run_test_webhook(&config).await,
        Commands::Wipe { yes } => maintenance::run_wipe(&pool, yes).await,
        Commands::Export => maintenance::run_export(&pool).await,
    }
}

fn init_tracing(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
