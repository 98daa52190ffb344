use crate::Result;
use async_trait::async_trait;
use reaper_core::{Snapshot, Volume};

/// How a delete attempt ended, so call sites branch on data instead of
/// provider error classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// Dry run was requested and the provider confirmed the delete would
    /// have succeeded.
    Simulated,
    /// The resource vanished before the delete landed.
    AlreadyGone,
    /// The resource is mid-use and cannot be deleted right now.
    InUse,
}

#[async_trait]
pub trait Ec2Api: Send + Sync {
    /// Account owning the resources, used to scope snapshot enumeration.
    async fn account_id(&self) -> Result<String>;

    async fn region_names(&self) -> Result<Vec<String>>;

    /// All volumes in the region that are in the `available` state,
    /// as one describe call.
    async fn describe_available_volumes(&self, region: &str) -> Result<Vec<Volume>>;

    /// All `completed` snapshots in the region owned by the given account,
    /// as one describe call.
    async fn describe_completed_snapshots(
        &self,
        region: &str,
        owner_id: &str,
    ) -> Result<Vec<Snapshot>>;

    async fn delete_volume(
        &self,
        region: &str,
        volume_id: &str,
        dry_run: bool,
    ) -> Result<DeleteOutcome>;

    async fn delete_snapshot(
        &self,
        region: &str,
        snapshot_id: &str,
        dry_run: bool,
    ) -> Result<DeleteOutcome>;
}
