//! Staticgen command-line interface

use clap::{Parser, Subcommand};
use staticgen::config;
use staticgen::events::Reporter;
use staticgen::generator::Generator;
use staticgen::server;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Default timeout for a whole generation run, in seconds.
const DEFAULT_TIMEOUT: u64 = 900;

/// Static website generator
///
/// Crawls a running website and captures it into a directory of static
/// files, configured through ./static.json.
#[derive(Parser, Debug)]
#[command(name = "staticgen", version, about = "Static website generator")]
struct Cli {
    /// Change working directory before doing anything else
    #[arg(short = 'C', long = "chdir", value_name = "DIR", default_value = ".")]
    chdir: PathBuf,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate the static website (the default)
    Generate {
        /// Timeout for the whole generation, in seconds
        #[arg(short = 't', long, value_name = "SECONDS", default_value_t = DEFAULT_TIMEOUT)]
        timeout: u64,
    },
    /// Serve the generated website
    Serve {
        /// Bind address
        #[arg(long, default_value = "localhost:3000")]
        address: String,
    },
    /// Print the version
    Version,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    if let Err(err) = run(cli).await {
        tracing::error!("error: {}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> staticgen::Result<()> {
    std::env::set_current_dir(&cli.chdir)?;

    match cli.command.unwrap_or(Command::Generate {
        timeout: DEFAULT_TIMEOUT,
    }) {
        Command::Generate { timeout } => generate(Duration::from_secs(timeout)).await,
        Command::Serve { address } => serve(&address).await,
        Command::Version => {
            println!("staticgen {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn setup_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::new("staticgen=info"),
        1 => EnvFilter::new("staticgen=debug,info"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Runs the generate subcommand under a deadline and Ctrl-C handler.
async fn generate(timeout: Duration) -> staticgen::Result<()> {
    let config = config::load(config::DEFAULT_PATH)?;

    let cancel = CancellationToken::new();

    let deadline = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        deadline.cancel();
    });

    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received interrupt, quitting");
            interrupt.cancel();
        }
    });

    let (events_tx, events_rx) = mpsc::channel(1000);
    let reporter = tokio::spawn(Reporter::new().report(events_rx));

    let generator = Generator::new(config, Some(events_tx));
    let result = generator.run(cancel).await;

    // Dropping the generator closes the event channel; wait for the
    // reporter to finish logging before exiting.
    drop(generator);
    let _ = reporter.await;

    result
}

/// Runs the serve subcommand over the configured output directory.
async fn serve(address: &str) -> staticgen::Result<()> {
    let config = config::load(config::DEFAULT_PATH)?;
    server::serve(config.dir, address).await
}
