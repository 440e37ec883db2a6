//! keyprov - content-protection key provisioning
//!
//! Resolves the encryption and decryption key sources for a packaging run
//! from a TOML file and command-line flags, performs the provisioning call,
//! and reports what was selected.

use anyhow::Context;
use clap::Parser;
use keyprov::Provisioner;
use keyprov_cli::{display_key_source, provisioning_failed, Config, ProvisioningArgs};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "keyprov")]
#[command(about = "Content-protection key provisioning", long_about = None)]
struct Cli {
    /// TOML configuration file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HTTP request timeout in seconds
    #[arg(long)]
    http_timeout_secs: Option<u64>,

    /// Print an example configuration file and exit
    #[arg(long)]
    print_example_config: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(flatten)]
    provisioning: ProvisioningArgs,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(cli: Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(secs) = cli.http_timeout_secs {
        config.http.timeout_secs = secs;
    }
    cli.provisioning.apply(&mut config.provisioning);
    Ok(config)
}

fn run(config: Config) -> anyhow::Result<()> {
    let timeout: Duration = config.http.timeout();
    let provisioner = Provisioner::with_http_transport(timeout)
        .context("Failed to set up HTTP transport")?;
    let provisioning = &config.provisioning;

    if provisioning.encryption_requested() {
        let source = provisioner
            .create_encryption_key_source(provisioning)
            .map_err(|e| provisioning_failed("Encryption", e))?;
        if let Some(source) = source {
            display_key_source("Encryption", &source);
        }
    } else {
        tracing::info!("Encryption not requested");
    }

    if provisioning.decryption_requested() {
        let source = provisioner
            .create_decryption_key_source(provisioning)
            .map_err(|e| provisioning_failed("Decryption", e))?;
        if let Some(source) = source {
            display_key_source("Decryption", &source);
        }
    } else {
        tracing::info!("Decryption not requested");
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.print_example_config {
        match toml::to_string_pretty(&Config::example_remote_license()) {
            Ok(example) => {
                print!("{}", example);
                return ExitCode::SUCCESS;
            }
            Err(e) => {
                tracing::error!("Cannot render example config: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    let result = load_config(cli).and_then(run);
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
