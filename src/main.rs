use clap::Parser;
use daily_content::batch::{BatchDriver, FixedPause};
use daily_content::config::{ApiTarget, GenerationConfig};
use daily_content::llm_utils::GeminiClient;
use daily_content::poster::ContentPoster;
use daily_content::requester::ContentRequester;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Generate daily recipes, jokes and facts and post them to the content server.
#[derive(Parser)]
#[command(name = "daily_content", version, long_about = None)]
struct Cli {
    /// Number of days to generate, counting back from today
    #[arg(short = 'd', long = "days", default_value_t = 1)]
    days: u32,

    /// Post to the production deployment instead of the local development server
    #[arg(long)]
    production: bool,

    /// Enable debug logging
    #[arg(long)]
    verbose: bool,

    /// Directory the per-day JSON files are written to
    #[arg(long, default_value = "daily_outputs")]
    output_dir: PathBuf,

    /// Seconds to wait between days
    #[arg(long, default_value_t = 60)]
    pause_secs: u64,

    /// Only generate files, do not post them
    #[arg(long)]
    skip_post: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let target = ApiTarget::from_flag(cli.production);
    // Resolve the server up front so a missing production URL fails before any generation.
    let base_url = if cli.skip_post {
        None
    } else {
        Some(target.base_url()?)
    };

    let generator = GeminiClient::new(GenerationConfig::from_env()?)?;
    let driver = BatchDriver::new(
        ContentRequester::new(generator),
        FixedPause(Duration::from_secs(cli.pause_secs)),
        &cli.output_dir,
    );

    info!(
        days = cli.days,
        "generating content, this takes around {} minute(s)",
        cli.days.saturating_add(1)
    );
    let batches = driver.run(cli.days).await?;

    if let Some(base_url) = base_url {
        info!(api = ?target, url = %base_url, "posting content");
        let poster = ContentPoster::new(&base_url)?;
        let summary = poster.post_all(&batches).await?;
        info!(
            accepted = summary.accepted,
            rejected = summary.rejected,
            skipped = summary.skipped,
            "done"
        );
    }

    Ok(())
}
