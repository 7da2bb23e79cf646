use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use paper_harvester::config::{ConfigFile, HarvestConfig};
use paper_harvester::conference::ConferenceScraper;
use paper_harvester::models::{ExportField, ExportRecord};
use paper_harvester::ui;
use paper_harvester::utils::HttpClient;
use paper_harvester::Harvester;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Paper Harvester - Collect arXiv results into tables and PDF folders
#[derive(Parser, Debug)]
#[command(name = "paper-harvester")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Harvest arXiv search results and conference proceedings", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Request timeout in seconds (overrides the configuration file)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for previews
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a configured harvest: search, write tables, download files
    Harvest {
        /// Configuration file (YAML or TOML)
        config: PathBuf,
    },

    /// Print the results a configuration would harvest, without writing files
    Preview {
        /// Configuration file (YAML or TOML)
        config: PathBuf,

        /// Output format
        #[arg(long, short, value_enum, default_value_t = OutputFormat::Auto)]
        output: OutputFormat,
    },

    /// Download every PDF listed on a conference proceedings index page
    #[command(alias = "cvf")]
    Conference {
        /// Index page URL, e.g. https://openaccess.thecvf.com/CVPR2023?day=all
        url: String,

        /// Destination directory
        dst: PathBuf,
    },

    /// List the fields table exports can include
    Fields,

    /// Write a template configuration file
    Init {
        /// Where to write the file
        #[arg(default_value = "harvest.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },
}

fn load_config(path: &Path, timeout: Option<u64>) -> Result<HarvestConfig> {
    let config = HarvestConfig::load(path)
        .with_context(|| format!("Invalid configuration {}", path.display()))?;
    Ok(match timeout {
        Some(secs) => config.with_timeout(Duration::from_secs(secs)),
        None => config,
    })
}

fn print_records(records: &[ExportRecord], format: OutputFormat) -> Result<()> {
    let format = match format {
        OutputFormat::Auto if ui::is_terminal() => OutputFormat::Table,
        OutputFormat::Auto => OutputFormat::Json,
        other => other,
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(records)?),
        _ => println!("{}", ui::preview_table(records)),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| format!("paper_harvester={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let show_progress = !cli.quiet && std::io::IsTerminal::is_terminal(&std::io::stderr());

    match cli.command {
        Commands::Harvest { config } => {
            let config = load_config(&config, cli.timeout)?;
            let summary = Harvester::arxiv(config)?
                .show_progress(show_progress)
                .run()
                .await?;
            if !cli.quiet {
                println!("Harvested {}", summary);
            }
        }

        Commands::Preview { config, output } => {
            let config = load_config(&config, cli.timeout)?;
            let records = Harvester::arxiv(config)?.collect_records().await?;
            print_records(&records, output)?;
        }

        Commands::Conference { url, dst } => {
            let timeout = Duration::from_secs(
                cli.timeout
                    .unwrap_or(paper_harvester::utils::DEFAULT_TIMEOUT.as_secs()),
            );
            let report = ConferenceScraper::new(HttpClient::new(timeout)?)
                .show_progress(show_progress)
                .scrape_and_download(&url, &dst)
                .await?;
            if !cli.quiet {
                println!("Finished {}: {}", dst.display(), report);
            }
        }

        Commands::Fields => {
            for field in ExportField::ALL {
                println!("{:<20} {}", field.as_str(), field.description());
            }
        }

        Commands::Init { path, force } => {
            if path.exists() && !force {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            ConfigFile::template().save(&path)?;
            if !cli.quiet {
                println!("Wrote {}", path.display());
            }
        }
    }

    Ok(())
}
