//! Loads the seed document into the comments table.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context};
use clap::Parser;

use comment_board::config::AppConfig;
use comment_board::repository::postgres::{create_pool, PostgresCommentRepository};
use comment_board::seed::{self, SeedOutcome};
use comment_board::telemetry;

#[derive(Debug, Parser)]
#[command(name = "seed", version, about = "Load seed comments into the database")]
struct SeedArgs {
    /// Seed document path (defaults to SEED_FILE).
    path: Option<PathBuf>,
    /// Insert even when the comments table already has rows.
    #[arg(short, long)]
    force: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = SeedArgs::parse();
    let config = AppConfig::from_env().context("failed to load configuration")?;
    telemetry::init(&config).map_err(|e| anyhow!("failed to initialize logging: {e}"))?;

    let force = args.force;
    let path = args.path.unwrap_or_else(|| PathBuf::from(&config.seed_file));

    let document = seed::load_document(&path)?;
    tracing::info!(path = %path.display(), records = document.comments.len(), "seed document loaded");

    let pool = create_pool(
        &config.database_url,
        1,
        Duration::from_secs(config.database_acquire_timeout_secs),
    )
    .await
    .context("failed to connect to database")?;

    sqlx::migrate!().run(&pool).await?;

    let repository = PostgresCommentRepository::new(pool);
    let outcome = seed::seed_store(&repository, document, force).await;
    repository.pool().close().await;

    match outcome? {
        SeedOutcome::Inserted(count) => tracing::info!(count, "seeding finished"),
        SeedOutcome::SkippedNonEmpty(existing) => {
            tracing::info!(existing, "seeding skipped, pass --force to insert anyway")
        }
    }

    Ok(())
}
