use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use meli_journey::browser::BrowserSession;
use meli_journey::config::LoggingConfig;
use meli_journey::html_page::HtmlPage;
use meli_journey::journey::Journey;
use meli_journey::report;
use meli_journey::screenshots::ScreenshotPlan;
use meli_journey::{extract_products, AppConfig, Extractor};

#[derive(Parser)]
#[command(name = "meli-journey", version, about = "Mercado Libre search journey check")]
struct Cli {
    /// Extra configuration file layered over the defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Number of results to extract
    #[arg(long, global = true)]
    max_products: Option<usize>,

    #[arg(long, global = true)]
    no_screenshots: bool,

    /// Show the browser window
    #[arg(long, global = true)]
    headed: bool,

    /// Print the results as JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full journey against the live site
    Run,
    /// Extract products from a saved results page
    Extract {
        #[arg(long)]
        html: PathBuf,
    },
    /// Print the effective configuration
    Config,
}

fn init_tracing(logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("meli_journey={}", logging.level).parse()?);

    let (file_layer, guard) = match &logging.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::never(directory, "meli-journey.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(max_products) = cli.max_products {
        config.extraction.max_products = max_products;
    }
    if cli.no_screenshots {
        config.screenshots.enabled = false;
    }
    if cli.headed {
        config.browser.headless = false;
    }
    config.validate()?;

    let _guard = init_tracing(&config.logging)?;
    let extractor = Extractor::new(
        config.extraction.max_products,
        config.extraction.price_fallback.clone(),
    );

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            info!("Starting journey...");
            let session = BrowserSession::launch(config.browser.clone())?;
            let screenshots = if config.screenshots.enabled {
                ScreenshotPlan::new(&config.screenshots.directory)
            } else {
                ScreenshotPlan::disabled()
            };

            let report = Journey::new(
                &session,
                &config.journey,
                &config.extraction.selectors,
                extractor,
                screenshots,
            )
            .run()
            .await?;

            info!(
                products = report.products.len(),
                screenshots = report.screenshots.len(),
                "Journey finished"
            );
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }
        Command::Extract { html } => {
            let page = HtmlPage::from_file(&html)?;
            let products = extract_products(&page, &config.extraction.selectors, &extractor).await?;
            report::log_products(&products);
            report::check_price_order(&products);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&products)?);
            }
        }
        Command::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
