use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use reaper_azure::{ArmComputeClient, ComputeSweeper, EnvironmentCredential};
use reaper_config::ReaperConfig;
use reaper_ec2::{AwsEc2, StorageSweepSettings, StorageSweeper};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "reaper", about = "Scheduled cleanup of stale cloud resources")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Delete aged, unattached volumes and completed snapshots in every
    /// region.
    Delete,
    /// Power off running VMs and scale set VMs in the target subscription.
    PowerOff,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = ReaperConfig::from_env()?;

    match cli.cmd {
        Command::Delete => delete_storage(&config).await,
        Command::PowerOff => power_off_vms(&config).await,
    }
}

async fn delete_storage(config: &ReaperConfig) -> anyhow::Result<()> {
    tracing::info!("Preparing to delete volumes and snapshots.");

    let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let api = Arc::new(AwsEc2::new(&sdk_config));
    let sweeper = StorageSweeper::new(
        api,
        StorageSweepSettings {
            volume_age: config.volume_age,
            snapshot_age: config.snapshot_age,
            dry_run: config.dry_run,
            bypass_tag: config.bypass_tag.clone(),
        },
    );
    sweeper.sweep(Utc::now()).await?;

    Ok(())
}

async fn power_off_vms(config: &ReaperConfig) -> anyhow::Result<()> {
    tracing::info!("Preparing to power off VMs.");

    let subscription_id = config
        .azure_subscription_id
        .clone()
        .context("AZURE_SUBSCRIPTION_ID must be set")?;
    let credential = EnvironmentCredential::from_env()?;
    let api = Arc::new(ArmComputeClient::connect(credential, subscription_id).await?);
    let sweeper = ComputeSweeper::new(api, config.bypass_tag.clone());
    sweeper.sweep().await?;

    Ok(())
}
