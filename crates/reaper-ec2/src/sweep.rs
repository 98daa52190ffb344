use crate::Result;
use crate::provider::{DeleteOutcome, Ec2Api};
use chrono::{DateTime, Duration, Utc};
use reaper_core::ReapTotals;
use std::sync::Arc;
use tracing::{error, info};

/// Settings for one storage sweep, derived from the runtime config.
#[derive(Debug, Clone)]
pub struct StorageSweepSettings {
    pub volume_age: Duration,
    pub snapshot_age: Duration,
    pub dry_run: bool,
    pub bypass_tag: String,
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct StorageSummary {
    pub volumes: ReapTotals,
    pub snapshots: ReapTotals,
}

/// Drives the enumerate, filter, delete pass for volumes and snapshots
/// across every region.
pub struct StorageSweeper {
    api: Arc<dyn Ec2Api>,
    settings: StorageSweepSettings,
}

impl StorageSweeper {
    pub fn new(api: Arc<dyn Ec2Api>, settings: StorageSweepSettings) -> Self {
        Self { api, settings }
    }

    /// Sweep every region, deleting aged volumes and snapshots.
    ///
    /// Grand totals are logged even when the run aborts partway through.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<StorageSummary> {
        let mut summary = StorageSummary::default();
        let result = self.sweep_regions(now, &mut summary).await;

        info!(
            "Deleted {} volumes having total {} GB",
            summary.volumes.count, summary.volumes.size_gb
        );
        info!(
            "Deleted {} snapshots having total {} GB",
            summary.snapshots.count, summary.snapshots.size_gb
        );

        result.map(|_| summary)
    }

    async fn sweep_regions(
        &self,
        now: DateTime<Utc>,
        summary: &mut StorageSummary,
    ) -> Result<()> {
        let volume_cutoff = now - self.settings.volume_age;
        let snapshot_cutoff = now - self.settings.snapshot_age;

        info!(
            "Finding volumes older than {} ({} seconds old)",
            volume_cutoff,
            self.settings.volume_age.num_seconds()
        );
        info!(
            "Finding snapshots older than {} ({} seconds old)",
            snapshot_cutoff,
            self.settings.snapshot_age.num_seconds()
        );

        let account = self.api.account_id().await?;

        for region in self.api.region_names().await? {
            info!("Checking {region}");
            summary.volumes += self.reap_volumes(&region, volume_cutoff).await?;
            summary.snapshots += self
                .reap_snapshots(&region, &account, snapshot_cutoff)
                .await?;
        }
        Ok(())
    }

    async fn reap_volumes(&self, region: &str, cutoff: DateTime<Utc>) -> Result<ReapTotals> {
        let volumes: Vec<_> = self
            .api
            .describe_available_volumes(region)
            .await?
            .into_iter()
            .filter(|volume| volume.eligible_for_reap(cutoff, &self.settings.bypass_tag))
            .collect();
        let found_size: f64 = volumes.iter().map(|v| v.size_gb.unwrap_or(0.0)).sum();
        info!(
            "Found {} volumes having total {} GB",
            volumes.len(),
            found_size
        );

        let mut totals = ReapTotals::default();
        for volume in &volumes {
            info!(
                "Deleting volume {} (created '{}' size {} GB)",
                volume.id,
                volume.created_at,
                volume.size_gb.unwrap_or(0.0)
            );
            match self
                .api
                .delete_volume(region, &volume.id, self.settings.dry_run)
                .await
            {
                Ok(DeleteOutcome::Deleted) => totals.record(volume.size_gb),
                Ok(DeleteOutcome::Simulated) => {
                    info!("Dry run: volume {} left in place", volume.id);
                    totals.record(volume.size_gb);
                }
                Ok(DeleteOutcome::AlreadyGone) => {
                    info!("Skipping volume {}: already gone", volume.id);
                }
                Ok(DeleteOutcome::InUse) => {
                    info!("Skipping volume {}: in use", volume.id);
                }
                Err(err) => {
                    error!("Failed to delete volume {}: {err}", volume.id);
                }
            }
        }
        Ok(totals)
    }

    async fn reap_snapshots(
        &self,
        region: &str,
        account: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<ReapTotals> {
        let snapshots: Vec<_> = self
            .api
            .describe_completed_snapshots(region, account)
            .await?
            .into_iter()
            .filter(|snapshot| snapshot.eligible_for_reap(cutoff, &self.settings.bypass_tag))
            .collect();
        let found_size: f64 = snapshots
            .iter()
            .map(|s| s.volume_size_gb.unwrap_or(0.0))
            .sum();
        info!(
            "Found {} snapshots having total {} GB",
            snapshots.len(),
            found_size
        );

        let mut totals = ReapTotals::default();
        for snapshot in &snapshots {
            info!(
                "Deleting snapshot {} (started '{}' size {} GB owner {})",
                snapshot.id,
                snapshot.started_at,
                snapshot.volume_size_gb.unwrap_or(0.0),
                snapshot.owner_id
            );
            match self
                .api
                .delete_snapshot(region, &snapshot.id, self.settings.dry_run)
                .await
            {
                Ok(DeleteOutcome::Deleted) => totals.record(snapshot.volume_size_gb),
                Ok(DeleteOutcome::Simulated) => {
                    info!("Dry run: snapshot {} left in place", snapshot.id);
                    totals.record(snapshot.volume_size_gb);
                }
                Ok(DeleteOutcome::AlreadyGone) => {
                    info!("Skipping snapshot {}: already gone", snapshot.id);
                }
                Ok(DeleteOutcome::InUse) => {
                    info!("Skipping snapshot {}: in use", snapshot.id);
                }
                Err(err) => {
                    error!("Failed to delete snapshot {}: {err}", snapshot.id);
                }
            }
        }
        Ok(totals)
    }
}
