use capacity_tracker::evaluate::BoaEvaluator;
use capacity_tracker::fetch::HttpFetcher;
use capacity_tracker::schedule::{self, ActiveHours, DEFAULT_EVERY_MINUTES};
use capacity_tracker::store::Backend;
use capacity_tracker::{get_now, Config, JobRunner};
use clap::{Parser, Subcommand};
use tracing::error;
use tracing_error::ErrorLayer;
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(
    name = "capacity-tracker",
    about = "Scrapes a capacity page and appends timestamped snapshots to a JSON document"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take one snapshot and exit
    Run,
    /// Take a snapshot on a fixed cadence until stopped
    Schedule {
        /// Minutes between snapshots
        #[arg(long, default_value_t = DEFAULT_EVERY_MINUTES, value_parser = clap::value_parser!(u64).range(1..))]
        every_minutes: u64,
        /// Only run inside this window, e.g. 05:00-21:30
        #[arg(long)]
        active_hours: Option<ActiveHours>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| {
                "debug,html5ever=error,selectors=error,hyper=warn,reqwest=info,sqlx=warn".into()
            }),
        )
        .with(ErrorLayer::default())
        .init();

    let cli = Cli::parse();

    let config = Config::from_env().map_err(|e| {
        error!("{}", e);
        e
    })?;

    let fetcher = HttpFetcher::new(config.fetch_timeout)?;
    let evaluator = BoaEvaluator::new(config.data_variable.as_str());
    let store = Backend::connect(&config).await?;
    let runner = JobRunner::new(config, fetcher, evaluator, store);

    match cli.command {
        Commands::Run => {
            runner
                .run_and_log(get_now(runner.config().utc_offset))
                .await;
        }
        Commands::Schedule {
            every_minutes,
            active_hours,
        } => {
            let every = schedule::cadence(every_minutes).ok_or_else(|| {
                error!("--every-minutes {} is too large", every_minutes);
                "--every-minutes is too large"
            })?;
            schedule::run_schedule(&runner, every, active_hours).await;
        }
    }

    Ok(())
}
