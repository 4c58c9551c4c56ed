use clap::Parser;
use scrape_page::ExtractionOptions;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "scrape-page")]
#[command(about = "Capture a page from a WebDriver browser and send it to a processing backend")]
#[command(version)]
pub struct Args {
    /// Page to open before scraping (scrapes the current page when omitted)
    pub url: Option<String>,

    /// Capture the page's visible text
    #[arg(long)]
    pub text: bool,

    /// Capture http(s) links
    #[arg(long)]
    pub links: bool,

    /// Capture images
    #[arg(long)]
    pub images: bool,

    /// Capture headings
    #[arg(long)]
    pub headings: bool,

    /// Capture everything
    #[arg(short, long)]
    pub all: bool,

    /// Path to JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// WebDriver address (overrides config and WEBDRIVER_URL)
    #[arg(long)]
    pub webdriver: Option<String>,

    /// Backend endpoint (overrides config and SCRAPE_BACKEND_URL)
    #[arg(short, long)]
    pub backend: Option<String>,

    /// Directory to save the processed result in
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Print the result without saving it
    #[arg(long)]
    pub no_download: bool,

    /// Backend request timeout in seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Check the backend health endpoint and exit
    #[arg(long)]
    pub check_backend: bool,

    /// Send a content-script message (JSON) to the page instead of scraping
    #[arg(short, long)]
    pub message: Option<String>,
}

impl Args {
    /// Extraction flags chosen on the command line
    pub fn options(&self) -> ExtractionOptions {
        if self.all {
            return ExtractionOptions::all();
        }
        ExtractionOptions {
            scrape_text: self.text,
            scrape_links: self.links,
            scrape_images: self.images,
            scrape_headings: self.headings,
        }
    }
}
