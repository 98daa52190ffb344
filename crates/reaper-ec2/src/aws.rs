use crate::provider::{DeleteOutcome, Ec2Api};
use crate::{Error, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ec2::config::Region;
use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_ec2::primitives::DateTime as SdkDateTime;
use aws_sdk_ec2::types::{Filter, Tag};
use chrono::{DateTime, Utc};
use reaper_core::{SNAPSHOT_STATE_COMPLETED, Snapshot, VOLUME_STATE_AVAILABLE, Volume};
use std::collections::HashMap;

/// Thin `Ec2Api` implementation over the AWS SDK. Builds one client per
/// region from the shared base config and converts wire payloads into the
/// composite records the sweep logic consumes.
pub struct AwsEc2 {
    config: SdkConfig,
}

impl AwsEc2 {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    fn regional_client(&self, region: &str) -> aws_sdk_ec2::Client {
        let config = aws_sdk_ec2::config::Builder::from(&self.config)
            .region(Region::new(region.to_string()))
            .build();
        aws_sdk_ec2::Client::from_conf(config)
    }
}

fn timestamp(value: &SdkDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(value.secs(), value.subsec_nanos())
}

fn tag_map(tags: Option<Vec<Tag>>) -> HashMap<String, String> {
    tags.unwrap_or_default()
        .into_iter()
        .filter_map(|tag| Some((tag.key?, tag.value.unwrap_or_default())))
        .collect()
}

fn volume_record(volume: aws_sdk_ec2::types::Volume) -> Result<Volume> {
    let id = volume.volume_id.ok_or(Error::MissingField {
        kind: "volume",
        field: "VolumeId",
    })?;
    let created_at = volume
        .create_time
        .as_ref()
        .and_then(timestamp)
        .ok_or(Error::MissingField {
            kind: "volume",
            field: "CreateTime",
        })?;
    Ok(Volume {
        id,
        created_at,
        state: volume
            .state
            .map(|state| state.as_str().to_string())
            .unwrap_or_default(),
        size_gb: volume.size.map(f64::from),
        attachment_count: volume.attachments.unwrap_or_default().len(),
        tags: tag_map(volume.tags),
    })
}

fn snapshot_record(snapshot: aws_sdk_ec2::types::Snapshot) -> Result<Snapshot> {
    let id = snapshot.snapshot_id.ok_or(Error::MissingField {
        kind: "snapshot",
        field: "SnapshotId",
    })?;
    let started_at = snapshot
        .start_time
        .as_ref()
        .and_then(timestamp)
        .ok_or(Error::MissingField {
            kind: "snapshot",
            field: "StartTime",
        })?;
    Ok(Snapshot {
        id,
        started_at,
        state: snapshot
            .state
            .map(|state| state.as_str().to_string())
            .unwrap_or_default(),
        volume_size_gb: snapshot.volume_size.map(f64::from),
        owner_id: snapshot.owner_id.unwrap_or_default(),
        tags: tag_map(snapshot.tags),
    })
}

#[async_trait]
impl Ec2Api for AwsEc2 {
    async fn account_id(&self) -> Result<String> {
        let client = aws_sdk_sts::Client::new(&self.config);
        let identity = client
            .get_caller_identity()
            .send()
            .await
            .map_err(|err| Error::Api(DisplayErrorContext(&err).to_string()))?;
        identity.account.ok_or(Error::MissingAccountId)
    }

    async fn region_names(&self) -> Result<Vec<String>> {
        let client = aws_sdk_ec2::Client::new(&self.config);
        let response = client
            .describe_regions()
            .send()
            .await
            .map_err(|err| Error::Api(DisplayErrorContext(&err).to_string()))?;
        Ok(response
            .regions
            .unwrap_or_default()
            .into_iter()
            .filter_map(|region| region.region_name)
            .collect())
    }

    async fn describe_available_volumes(&self, region: &str) -> Result<Vec<Volume>> {
        let client = self.regional_client(region);
        // The described volume has "State" but the filter key is "status".
        let response = client
            .describe_volumes()
            .filters(
                Filter::builder()
                    .name("status")
                    .values(VOLUME_STATE_AVAILABLE)
                    .build(),
            )
            .send()
            .await
            .map_err(|err| Error::Api(DisplayErrorContext(&err).to_string()))?;
        response
            .volumes
            .unwrap_or_default()
            .into_iter()
            .map(volume_record)
            .collect()
    }

    async fn describe_completed_snapshots(
        &self,
        region: &str,
        owner_id: &str,
    ) -> Result<Vec<Snapshot>> {
        let client = self.regional_client(region);
        let response = client
            .describe_snapshots()
            .filters(
                Filter::builder()
                    .name("status")
                    .values(SNAPSHOT_STATE_COMPLETED)
                    .build(),
            )
            .owner_ids(owner_id)
            .send()
            .await
            .map_err(|err| Error::Api(DisplayErrorContext(&err).to_string()))?;
        response
            .snapshots
            .unwrap_or_default()
            .into_iter()
            .map(snapshot_record)
            .collect()
    }

    async fn delete_volume(
        &self,
        region: &str,
        volume_id: &str,
        dry_run: bool,
    ) -> Result<DeleteOutcome> {
        let client = self.regional_client(region);
        match client
            .delete_volume()
            .volume_id(volume_id)
            .dry_run(dry_run)
            .send()
            .await
        {
            Ok(_) => Ok(DeleteOutcome::Deleted),
            Err(err) => match err.code() {
                Some("DryRunOperation") => Ok(DeleteOutcome::Simulated),
                Some("InvalidVolume.NotFound") => Ok(DeleteOutcome::AlreadyGone),
                _ => Err(Error::Api(DisplayErrorContext(&err).to_string())),
            },
        }
    }

    async fn delete_snapshot(
        &self,
        region: &str,
        snapshot_id: &str,
        dry_run: bool,
    ) -> Result<DeleteOutcome> {
        let client = self.regional_client(region);
        match client
            .delete_snapshot()
            .snapshot_id(snapshot_id)
            .dry_run(dry_run)
            .send()
            .await
        {
            Ok(_) => Ok(DeleteOutcome::Deleted),
            Err(err) => match err.code() {
                Some("DryRunOperation") => Ok(DeleteOutcome::Simulated),
                Some("InvalidSnapshot.InUse") => Ok(DeleteOutcome::InUse),
                _ => Err(Error::Api(DisplayErrorContext(&err).to_string())),
            },
        }
    }
}
