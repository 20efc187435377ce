use clap::{Parser, Subcommand};
use moy_risk::commands::{self, display::DISCLAIMER, AppContext, CommandError, OutputFormat};
use moy_risk::config::Settings;
use moy_risk::models::ContentCategory;
use moy_risk::services::ApiClient;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "moy-risk")]
#[command(about = "Six-month stroke risk self-assessment")]
#[command(version)]
struct Cli {
    /// Path to a configuration file (defaults to config/default.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON envelopes
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer the questionnaire and calculate your risk
    Assess,
    /// Calculate risk for a set of sample answers
    Quick,
    /// Show stroke symptoms and emergency numbers
    Education {
        /// Only typical or atypical symptoms
        #[arg(long)]
        category: Option<ContentCategory>,
    },
    /// Show emergency phone numbers
    Emergency,
    /// Show the last result saved on this device
    Last,
    /// Delete the saved result and cached content
    Clear,
    /// Check whether the scoring service is reachable
    Health,
    /// Show information about risk factors
    RiskFactors,
    /// Show the medical disclaimer
    Disclaimer,
}

fn init_logging(settings: &Settings) {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| settings.logging.level.clone());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| settings.logging.format.clone());

    // Logs go to stderr so command output stays clean
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(log_level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.compact().init();
    }
}

async fn run(cli: Cli, ctx: AppContext) -> Result<(), CommandError> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        None => commands::home(&ctx, &mut out).await,
        Some(Commands::Assess) => {
            let stdin = std::io::stdin();
            let mut input = stdin.lock();
            commands::assess(&ctx, &mut input, &mut out).await.map(|_| ())
        }
        Some(Commands::Quick) => commands::quick_check(&ctx, &mut out).await.map(|_| ()),
        Some(Commands::Education { category }) => commands::education(&ctx, category, &mut out).await,
        Some(Commands::Emergency) => commands::emergency(&ctx, &mut out).await,
        Some(Commands::Last) => commands::last_result(&ctx, &mut out).await,
        Some(Commands::Clear) => commands::clear_history(&ctx, &mut out).await,
        Some(Commands::Health) => {
            if commands::health(&ctx, &mut out).await? {
                Ok(())
            } else {
                Err(CommandError::Api(moy_risk::ApiError::Network))
            }
        }
        Some(Commands::RiskFactors) => commands::risk_factors(&ctx, &mut out).await,
        Some(Commands::Disclaimer) => {
            use std::io::Write;
            writeln!(out, "{}", DISCLAIMER)?;
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };

    init_logging(&settings);
    info!("Using scoring service at {}", settings.api.base_url);

    let client = Arc::new(ApiClient::from_settings(&settings)?);
    let format = if cli.json { OutputFormat::Json } else { OutputFormat::Text };
    let ctx = AppContext::new(client, format);

    match run(cli, ctx).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            error!("Command failed: {}", e);
            if format == OutputFormat::Json {
                commands::write_error_json(&mut std::io::stdout(), &e)?;
            } else {
                eprintln!("{}", e);
            }
            Ok(ExitCode::FAILURE)
        }
    }
}
