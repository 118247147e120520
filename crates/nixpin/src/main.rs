//! nixpin command-line tool

use anyhow::Context;
use clap::{Parser, Subcommand};
use nixpin::commands::{inspect_sdist, normalize_specifiers, resolve_packages, OutputFormat};
use nixpin::{BuildStrategy, BuildSystemParser, Normalizer, Resolver, ResolverConfig};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
const LOG_ENV: &str = "NIXPIN_LOG";

#[derive(Parser)]
#[command(name = "nixpin")]
#[command(about = "Pin PyPI packages for Nix builds", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./nixpin.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log degraded resolutions in detail
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve packages to pinned descriptors
    Resolve {
        /// Package names
        #[arg(required = true)]
        packages: Vec<String>,
        /// Print a JSON array instead of one line per package
        #[arg(long)]
        json: bool,
        /// Parallel resolutions
        #[arg(short, long)]
        jobs: Option<usize>,
        /// Registry base URL
        #[arg(long)]
        registry: Option<String>,
        /// Per-request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// Build dependency detection strategy (requires|backend)
        #[arg(long)]
        strategy: Option<BuildStrategy>,
        /// Skip checking downloaded sdists against their digest
        #[arg(long)]
        no_verify: bool,
    },
    /// Map dependency specifiers to nixpkgs attributes
    Normalize {
        /// PEP 508 specifiers
        #[arg(required = true)]
        specifiers: Vec<String>,
        /// Treat specifiers as runtime dependencies (drop marker entries)
        #[arg(long)]
        runtime: bool,
    },
    /// Detect build dependencies of a local sdist
    Inspect {
        /// Path to a .tar.gz sdist
        sdist: PathBuf,
        /// Build dependency detection strategy (requires|backend)
        #[arg(long)]
        strategy: Option<BuildStrategy>,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "nixpin=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    let mut config = ResolverConfig::load(cli.config.as_deref(), &cwd)
        .context("Failed to load configuration")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Resolve {
            packages,
            json,
            jobs,
            registry,
            timeout,
            strategy,
            no_verify,
        } => {
            if let Some(jobs) = jobs {
                config.jobs = jobs;
            }
            if let Some(registry) = registry {
                config.registry_url = registry;
            }
            if let Some(timeout) = timeout {
                config.timeout_secs = timeout;
            }
            if let Some(strategy) = strategy {
                config.build_strategy = strategy;
            }
            if no_verify {
                config.verify_artifacts = false;
            }
            config.validate()?;

            let resolver = Resolver::new(&config).context("Failed to create registry client")?;
            let format = if json {
                OutputFormat::Json
            } else {
                OutputFormat::Text
            };

            let summary = resolve_packages(&resolver, &packages, format, &mut out)?;
            for name in summary.unresolved() {
                tracing::warn!(package = name, "could not pin; using pkgs.lib.fakeHash");
            }
        }
        Commands::Normalize {
            specifiers,
            runtime,
        } => {
            let normalizer = Normalizer::with_extra(&config.overrides);
            normalize_specifiers(&normalizer, &specifiers, runtime, &mut out)?;
        }
        Commands::Inspect { sdist, strategy } => {
            if let Some(strategy) = strategy {
                config.build_strategy = strategy;
            }
            let parser = BuildSystemParser::new(
                config.build_strategy,
                Normalizer::with_extra(&config.overrides),
            );
            inspect_sdist(&parser, &sdist, &mut out)
                .with_context(|| format!("Failed to inspect {}", sdist.display()))?;
        }
    }

    Ok(())
}
