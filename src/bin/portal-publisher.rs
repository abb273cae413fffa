//! Portal Publisher CLI
//!
//! Upload bundles to the portal and follow deployments to completion

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use portal_publisher::{
    Bundle, CancellationSignal, ConfigLoadOptions, ConfigLoader, ConfigOverrides,
    DeploymentReport, EnvCredentialProvider, PollConfig, PortalApi, PortalClient, PortalConfig,
    PortalError, PublishWorkflow, WaitForPublicationWorkflow,
};
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Publish bundles through the portal publisher API
#[derive(Parser)]
#[command(name = "portal-publisher")]
#[command(version)]
#[command(about = "Publish bundles through the portal publisher API", long_about = None)]
struct Cli {
    /// Config file (defaults to ./.portal-publisher.yaml when present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Portal base URL
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a bundle and wait until it is validated
    Publish {
        /// Bundle zip to upload
        #[arg(value_name = "BUNDLE")]
        bundle: PathBuf,

        /// Deployment name (defaults to the bundle's file name)
        #[arg(long)]
        name: Option<String>,

        /// Give up after this long (e.g. 45m)
        #[arg(long, value_parser = humantime::parse_duration)]
        timeout: Option<Duration>,

        /// Time between status polls (e.g. 15s)
        #[arg(long, value_parser = humantime::parse_duration)]
        poll_interval: Option<Duration>,
    },

    /// Wait until an uploaded deployment is published
    WaitForPublication {
        /// Deployment id returned by the upload
        #[arg(value_name = "DEPLOYMENT_ID")]
        deployment_id: Option<String>,

        /// Deployment id, as a flag
        #[arg(long = "deployment-id", value_name = "ID", conflicts_with = "deployment_id")]
        deployment_id_flag: Option<String>,

        /// Give up after this long (e.g. 90m)
        #[arg(long, value_parser = humantime::parse_duration)]
        timeout: Option<Duration>,

        /// Time between status polls (e.g. 30s)
        #[arg(long, value_parser = humantime::parse_duration)]
        poll_interval: Option<Duration>,
    },

    /// Print the current status of a deployment
    Status {
        #[arg(value_name = "DEPLOYMENT_ID")]
        deployment_id: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("portal_publisher=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match run(cli).await {
        Ok(()) => process::exit(0),
        Err(e) => {
            eprintln!("\n❌ Error");
            eprintln!("{}", e);
            if let Some(portal_error) = e.downcast_ref::<PortalError>() {
                eprintln!("\nCode: {}", portal_error.code());
                for action in portal_error.suggested_actions() {
                    eprintln!("  - {}", action);
                }
            }
            process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config, cli.base_url).await?;
    let credentials = EnvCredentialProvider::from_config(&config.credentials);

    match cli.command {
        Commands::Publish {
            bundle,
            name,
            timeout,
            poll_interval,
        } => {
            let poll = override_poll(config.publish_poll()?, timeout, poll_interval)?;
            let mut bundle = Bundle::new(bundle);
            if let Some(name) = name {
                bundle = bundle.with_deployment_name(name);
            }

            let workflow = PublishWorkflow::from_config(&config, &credentials)?
                .with_poll_config(poll)
                .with_cancellation(cancel_on_ctrl_c());

            println!("\n📦 portal-publisher publish\n");
            let report = workflow.run(&bundle).await?;
            print_report(&report, "validated");
        }
        Commands::WaitForPublication {
            deployment_id,
            deployment_id_flag,
            timeout,
            poll_interval,
        } => {
            let deployment_id = deployment_id.or(deployment_id_flag).unwrap_or_default();
            let poll = override_poll(config.publication_poll()?, timeout, poll_interval)?;

            let workflow = WaitForPublicationWorkflow::from_config(&config, &credentials)?
                .with_poll_config(poll)
                .with_cancellation(cancel_on_ctrl_c());

            println!("\n📦 portal-publisher wait-for-publication\n");
            let report = workflow.run(&deployment_id).await?;
            print_report(&report, "published");
        }
        Commands::Status { deployment_id } => {
            let client = PortalClient::from_config(&config, &credentials)?;
            let status = client.get_status(&deployment_id).await?;
            let json = serde_json::to_string_pretty(&status)
                .context("Failed to render status response")?;
            println!("{}", json);
        }
    }

    Ok(())
}

async fn load_config(config_file: Option<PathBuf>, base_url: Option<String>) -> Result<PortalConfig> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let options = ConfigLoadOptions {
        config_file,
        overrides: ConfigOverrides { base_url },
        ..ConfigLoadOptions::from_env(cwd)
    };

    Ok(ConfigLoader::load(options).await?)
}

fn override_poll(
    base: PollConfig,
    timeout: Option<Duration>,
    poll_interval: Option<Duration>,
) -> Result<PollConfig> {
    let poll = PollConfig::new(
        poll_interval.unwrap_or(base.poll_interval()),
        timeout.unwrap_or(base.timeout()),
    )?;
    Ok(poll.with_max_consecutive_failures(base.max_consecutive_failures()))
}

fn cancel_on_ctrl_c() -> CancellationSignal {
    let cancel = CancellationSignal::new();
    let handle = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n⚠️  Interrupted, cancelling");
            handle.cancel();
        }
    });
    cancel
}

fn print_report(report: &DeploymentReport, outcome: &str) {
    println!(
        "\n✅ Deployment {} {} in {}",
        report.deployment_id,
        outcome,
        humantime::format_duration(Duration::from_secs(report.elapsed.as_secs()))
    );

    let purls = report.purls();
    if !purls.is_empty() {
        println!("\nPackages:");
        for purl in purls {
            println!("  - {}", purl);
        }
    }
}
