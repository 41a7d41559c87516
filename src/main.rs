//! # Web Analyzer CLI Application
//!
//! This module implements the command-line interface for the web analyzer.
//!
//! ## Key Components
//!
//! - CLI argument parsing with clap
//! - Subcommands:
//!   - `serve`: Run the web front-end
//!   - `analyze`: Analyze one page or local file and print the summary
//!
//! ## Features
//!
//! - Configurable listen address, asset directories, timeouts and body cap
//! - JSON log file for the server, human-readable logs on stderr
//! - Both JSON and text output formats

mod telemetry;

use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;
use web_analyzer::analyzer::{HeadingLevel, PageReport};
use web_analyzer::fetch::{DEFAULT_MAX_BODY_BYTES, FetcherConfig, analyze_target};
use web_analyzer::web::{WebConfig, WebServer};

#[derive(Parser)]
#[command(author, version, about = "Summarise the structure of web pages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the web front-end
    Serve(ServeArgs),

    /// Analyze a single page or HTML file
    Analyze(AnalyzeArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    listen: String,

    /// Directory served under /static/
    #[arg(long, default_value = "web/static")]
    static_dir: PathBuf,

    /// Directory served under /images/
    #[arg(long, default_value = "web/util/images")]
    images_dir: PathBuf,

    /// Request timeout in seconds for fetched pages
    #[arg(short, long, default_value = "15")]
    timeout: u64,

    /// Maximum number of body bytes read from a fetched page
    #[arg(long, default_value_t = DEFAULT_MAX_BODY_BYTES)]
    max_body_bytes: usize,

    /// Directory for the JSON log file
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// URL to fetch, or path of a local HTML file
    #[arg(required = true)]
    target: String,

    /// Base URL for resolving links in a local file
    #[arg(short, long, default_value = "http://localhost/")]
    base_url: String,

    /// Output format (text|json)
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    format: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve(args)) => {
            telemetry::init_tracing(Some(&args.log_dir), "info")?;
            serve_command(args).await?;
        }
        Some(Commands::Analyze(args)) => {
            telemetry::init_tracing(None, "warn")?;
            analyze_command(args).await?;
        }
        None => {
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

#[instrument]
async fn serve_command(args: ServeArgs) -> anyhow::Result<()> {
    let fetcher = FetcherConfig::builder()
        .timeout(Duration::from_secs(args.timeout))
        .max_body_bytes(args.max_body_bytes)
        .build();
    let config = WebConfig::builder()
        .listen_addr(args.listen)
        .static_dir(args.static_dir)
        .images_dir(args.images_dir)
        .fetcher(fetcher)
        .build();

    let server = Arc::new(WebServer::bind(&config)?);
    println!("Server started at http://{}", server.local_addr());

    let shutdown = Arc::new(AtomicBool::new(false));
    let mut accept = tokio::task::spawn_blocking({
        let server = Arc::clone(&server);
        let shutdown = Arc::clone(&shutdown);
        let runtime = tokio::runtime::Handle::current();
        move || server.run(runtime, shutdown)
    });

    tokio::select! {
        result = &mut accept => {
            result??;
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("shutdown requested");
            shutdown.store(true, Ordering::Relaxed);
            accept.await??;
        }
    }

    Ok(())
}

#[instrument]
async fn analyze_command(args: AnalyzeArgs) -> anyhow::Result<()> {
    let report = if is_web_target(&args.target) {
        analyze_target(&args.target, FetcherConfig::default()).await?
    } else {
        let base_url = Url::parse(&args.base_url)?;
        PageReport::from_file(&PathBuf::from(&args.target), &base_url)?
    };

    if args.format == "json" {
        println!("{}", report.to_json()?);
    } else {
        print_report(&report);
    }

    Ok(())
}

/// Whether `target` is an http(s) URL rather than a local path
fn is_web_target(target: &str) -> bool {
    Url::parse(target.trim())
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

fn print_report(report: &PageReport) {
    let summary = &report.summary;
    let headings = HeadingLevel::ALL
        .iter()
        .map(|level| format!("{}={}", level, summary.heading_count(*level)))
        .collect::<Vec<_>>()
        .join(" ");

    println!("URL:            {}", report.url);
    println!("HTML version:   {}", summary.version_display());
    println!("Title:          {}", summary.title);
    println!("Headings:       {}", headings);
    println!("Internal links: {}", summary.internal_links);
    println!("External links: {}", summary.external_links);
    println!(
        "Login form:     {}",
        if summary.has_login_form { "yes" } else { "no" }
    );
}
