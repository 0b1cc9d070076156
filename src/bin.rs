//! Binary entry point for `mention-bot`.
//!
//! This module provides the command-line interface for mention-bot with options
//! for configuration file paths and logging verbosity. It initializes the
//! necessary components and runs the selected command.

use std::io::{self, BufRead, Write};

use clap::{Parser, Subcommand};
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::{Protocol, WithExportConfig};
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt};
use mention_bot::base::{
    config::Config,
    types::{Res, Void},
};

/// Mention-bot: turns `@` mentions in a chat into calendar events.
///
/// Configuration can come from `config.toml` or environment variables.
/// Run `init` once to store the phone number and API key, then `run` to
/// start watching the chat.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Override the config file path (optional).
    ///
    /// By default, the bot will look for a config file at `.hidden/config.toml`
    /// in the current directory.
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,
    /// Increase log verbosity (-v, -vv, etc.).
    ///
    /// Use multiple times to increase verbosity:
    /// - No flag: INFO level
    /// - -v: DEBUG level
    /// - -vv or more: TRACE level
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Export spans to an OTLP collector over HTTP.
    #[arg(long, global = true)]
    otlp: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate and store the phone number and language model API key.
    Init {
        /// Phone number, including country code, without `+` or leading zeros.
        #[arg(long)]
        phone_number: Option<String>,
        /// Language model API key.
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Open the chat and listen for `@` mentions.
    Run,
}

/// Main entry point for the mention-bot binary.
///
/// Sets up logging based on verbosity, loads configuration, and runs the command.
#[tokio::main]
async fn main() -> Void {
    let args = Args::parse();

    // Construct the level filter.

    let level = match args.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    let level_filter = tracing_subscriber::filter::LevelFilter::from_level(level);

    // Prepare the log layer.

    let stdout = tracing_subscriber::fmt::layer()
        .without_time()
        .with_ansi(true)
        .with_level(true)
        .with_file(false)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE);

    // Prepare the otlp layer, if requested.

    let otel = if args.otlp {
        let exporter = opentelemetry_otlp::SpanExporter::builder().with_http().with_protocol(Protocol::HttpBinary).build()?;
        let tracer = opentelemetry_sdk::trace::SdkTracerProvider::builder().with_simple_exporter(exporter).build().tracer("mention-bot");
        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    tracing_subscriber::registry().with(otel).with(level_filter).with(stdout).init();

    let config = Config::load(args.config.as_deref())?;

    match args.command {
        Command::Init { phone_number, api_key } => {
            let phone_number = match phone_number {
                Some(phone_number) => phone_number,
                None => prompt("Enter your WhatsApp phone number (including country code, without + or leading zeros): ")?,
            };

            let link = mention_bot::check_phone_number(&phone_number).await?;
            println!("Chat Direct Link: {link}");

            let api_key = match api_key {
                Some(api_key) => api_key,
                None => prompt("Enter your language model API key: ")?,
            };

            mention_bot::init(config, &phone_number, &api_key).await
        }
        Command::Run => mention_bot::start(config).await,
    }
}

/// Ask for a single line on stdin.
fn prompt(message: &str) -> Res<String> {
    print!("{message}");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;

    Ok(line.trim().to_string())
}
