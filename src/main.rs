use clap::Parser;
use scrape_page::config::ScraperConfig;
use scrape_page::messages::ContentScript;
use scrape_page::{ScrapeError, Scraper, Session, WebDriverTab};
use std::process::ExitCode;

mod args;
use args::Args;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ::log::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), ScrapeError> {
    let config = load_config(&args)?;
    ::log::debug!("Using configuration: {:?}", config);

    let mut scraper = Scraper::new(config);
    if let Some(timeout) = args.timeout {
        scraper = scraper.with_timeout(timeout);
    }

    if args.check_backend {
        let backend = scraper.backend()?;
        let health = backend.health().await?;
        println!("{}", serde_json::to_string_pretty(&health)?);
        return Ok(());
    }

    let options = args.options().union(scraper.config().options);
    let download_dir = scraper.config().download_dir.clone();

    if let Some(url) = &args.url {
        scraper = scraper.with_start_url(url);
    }

    println!("Note: scraping requires a WebDriver server (e.g., ChromeDriver).");
    let session = scraper.connect().await?;

    let outcome = match &args.message {
        Some(message) => send_message(&session, message).await,
        None => scrape(&session, options, &args, download_dir).await,
    };

    // Always end the WebDriver session, even after a failed cycle
    if let Err(e) = session.into_tab().close().await {
        ::log::warn!("Failed to close WebDriver session: {}", e);
    }

    outcome
}

/// Layer the config file, environment and command-line overrides
fn load_config(args: &Args) -> Result<ScraperConfig, ScrapeError> {
    let config = match &args.config {
        Some(path) => ScraperConfig::from_file(path)?,
        None => ScraperConfig::default(),
    };
    let mut config = config
        .apply_env()
        .apply_overrides(args.webdriver.clone(), args.backend.clone());
    if let Some(out) = &args.out {
        config.download_dir = out.clone();
    }
    Ok(config)
}

async fn scrape(
    session: &Session<WebDriverTab>,
    options: scrape_page::ExtractionOptions,
    args: &Args,
    download_dir: std::path::PathBuf,
) -> Result<(), ScrapeError> {
    ::log::info!("Scraping with {:?}", options);
    let result = session.scrape(options).await;
    println!("{}", session.status());
    result?;

    if let Some(rendered) = session.rendered() {
        println!("{}", rendered);
    }

    if !args.no_download {
        if let Some(download) = session.download() {
            let path = download.save_to(&download_dir)?;
            println!("Saved {}", path.display());
        }
    }
    Ok(())
}

async fn send_message(session: &Session<WebDriverTab>, message: &str) -> Result<(), ScrapeError> {
    let request: serde_json::Value =
        serde_json::from_str(message).map_err(|e| ScrapeError::Config(format!("message: {}", e)))?;

    let script = ContentScript::new(session.tab());
    match script.handle_raw(&request).await? {
        Some(response) => println!("{}", serde_json::to_string_pretty(&response)?),
        None => ::log::warn!("No response for message {}", request),
    }
    Ok(())
}
