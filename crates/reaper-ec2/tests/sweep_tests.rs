use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use reaper_core::{Snapshot, Volume};
use reaper_ec2::{
    DeleteOutcome, Ec2Api, Error, Result, StorageSweepSettings, StorageSweeper,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const BYPASS: &str = "do-not-delete";

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 10, 26, 12, 34, 56).unwrap()
}

fn settings() -> StorageSweepSettings {
    StorageSweepSettings {
        volume_age: Duration::hours(1),
        snapshot_age: Duration::hours(1),
        dry_run: false,
        bypass_tag: BYPASS.to_string(),
    }
}

fn old_volume(id: &str, size_gb: Option<f64>) -> Volume {
    Volume {
        id: id.to_string(),
        created_at: now() - Duration::days(2),
        state: "available".to_string(),
        size_gb,
        attachment_count: 0,
        tags: HashMap::new(),
    }
}

fn old_snapshot(id: &str, size_gb: Option<f64>) -> Snapshot {
    Snapshot {
        id: id.to_string(),
        started_at: now() - Duration::days(2),
        state: "completed".to_string(),
        volume_size_gb: size_gb,
        owner_id: "123456789012".to_string(),
        tags: HashMap::new(),
    }
}

#[derive(Clone, Copy)]
enum Scripted {
    Outcome(DeleteOutcome),
    Fail,
}

#[derive(Default)]
struct FakeEc2 {
    regions: Vec<String>,
    volumes: HashMap<String, Vec<Volume>>,
    snapshots: HashMap<String, Vec<Snapshot>>,
    broken_regions: Vec<String>,
    scripted: HashMap<String, Scripted>,
    volume_deletes: Mutex<Vec<(String, String, bool)>>,
    snapshot_deletes: Mutex<Vec<(String, String, bool)>>,
}

impl FakeEc2 {
    fn single_region(volumes: Vec<Volume>, snapshots: Vec<Snapshot>) -> Self {
        Self {
            regions: vec!["region-1".to_string()],
            volumes: HashMap::from([("region-1".to_string(), volumes)]),
            snapshots: HashMap::from([("region-1".to_string(), snapshots)]),
            ..Default::default()
        }
    }

    fn script(mut self, id: &str, scripted: Scripted) -> Self {
        self.scripted.insert(id.to_string(), scripted);
        self
    }

    fn delete_result(&self, id: &str) -> Result<DeleteOutcome> {
        match self.scripted.get(id) {
            Some(Scripted::Outcome(outcome)) => Ok(*outcome),
            Some(Scripted::Fail) => Err(Error::Api(format!("scripted failure for {id}"))),
            None => Ok(DeleteOutcome::Deleted),
        }
    }
}

#[async_trait]
impl Ec2Api for FakeEc2 {
    async fn account_id(&self) -> Result<String> {
        Ok("123456789012".to_string())
    }

    async fn region_names(&self) -> Result<Vec<String>> {
        Ok(self.regions.clone())
    }

    async fn describe_available_volumes(&self, region: &str) -> Result<Vec<Volume>> {
        if self.broken_regions.iter().any(|r| r == region) {
            return Err(Error::Api("scripted describe failure".to_string()));
        }
        Ok(self.volumes.get(region).cloned().unwrap_or_default())
    }

    async fn describe_completed_snapshots(
        &self,
        region: &str,
        _owner_id: &str,
    ) -> Result<Vec<Snapshot>> {
        Ok(self.snapshots.get(region).cloned().unwrap_or_default())
    }

    async fn delete_volume(
        &self,
        region: &str,
        volume_id: &str,
        dry_run: bool,
    ) -> Result<DeleteOutcome> {
        self.volume_deletes.lock().unwrap().push((
            region.to_string(),
            volume_id.to_string(),
            dry_run,
        ));
        self.delete_result(volume_id)
    }

    async fn delete_snapshot(
        &self,
        region: &str,
        snapshot_id: &str,
        dry_run: bool,
    ) -> Result<DeleteOutcome> {
        self.snapshot_deletes.lock().unwrap().push((
            region.to_string(),
            snapshot_id.to_string(),
            dry_run,
        ));
        self.delete_result(snapshot_id)
    }
}

#[tokio::test]
async fn absent_volume_size_counts_as_zero() {
    let fake = Arc::new(FakeEc2::single_region(
        vec![
            old_volume("vol-1", Some(5.0)),
            old_volume("vol-2", Some(1.0)),
            old_volume("vol-3", None),
        ],
        Vec::new(),
    ));
    let sweeper = StorageSweeper::new(fake.clone(), settings());

    let summary = sweeper.sweep(now()).await.unwrap();

    assert_eq!(summary.volumes.count, 3);
    assert_eq!(summary.volumes.size_gb, 6.0);
    assert_eq!(fake.volume_deletes.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn ineligible_volumes_are_never_deleted() {
    let mut attached = old_volume("vol-attached", Some(5.0));
    attached.attachment_count = 1;

    let mut bypassed = old_volume("vol-bypassed", Some(5.0));
    bypassed.tags = HashMap::from([(BYPASS.to_string(), "precious".to_string())]);

    let mut at_cutoff = old_volume("vol-at-cutoff", Some(5.0));
    at_cutoff.created_at = now() - Duration::hours(1);

    let mut young = old_volume("vol-young", Some(5.0));
    young.created_at = now();

    let fake = Arc::new(FakeEc2::single_region(
        vec![attached, bypassed, at_cutoff, young],
        Vec::new(),
    ));
    let sweeper = StorageSweeper::new(fake.clone(), settings());

    let summary = sweeper.sweep(now()).await.unwrap();

    assert_eq!(summary.volumes.count, 0);
    assert!(fake.volume_deletes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn one_failed_delete_does_not_abort_the_batch() {
    let fake = Arc::new(
        FakeEc2::single_region(
            vec![
                old_volume("vol-1", Some(5.0)),
                old_volume("vol-2", Some(1.0)),
                old_volume("vol-3", None),
            ],
            Vec::new(),
        )
        .script("vol-2", Scripted::Fail),
    );
    let sweeper = StorageSweeper::new(fake.clone(), settings());

    let summary = sweeper.sweep(now()).await.unwrap();

    // The failed volume is excluded, but the third is still attempted.
    assert_eq!(summary.volumes.count, 2);
    assert_eq!(summary.volumes.size_gb, 5.0);
    assert_eq!(fake.volume_deletes.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn vanished_volume_is_a_benign_skip() {
    let fake = Arc::new(
        FakeEc2::single_region(
            vec![old_volume("vol-1", Some(5.0)), old_volume("vol-2", Some(1.0))],
            Vec::new(),
        )
        .script("vol-1", Scripted::Outcome(DeleteOutcome::AlreadyGone)),
    );
    let sweeper = StorageSweeper::new(fake.clone(), settings());

    let summary = sweeper.sweep(now()).await.unwrap();

    assert_eq!(summary.volumes.count, 1);
    assert_eq!(summary.volumes.size_gb, 1.0);
}

#[tokio::test]
async fn in_use_snapshot_is_a_benign_skip() {
    let fake = Arc::new(
        FakeEc2::single_region(
            Vec::new(),
            vec![
                old_snapshot("snap-1", Some(5.0)),
                old_snapshot("snap-2", Some(1.0)),
                old_snapshot("snap-3", None),
            ],
        )
        .script("snap-2", Scripted::Outcome(DeleteOutcome::InUse)),
    );
    let sweeper = StorageSweeper::new(fake.clone(), settings());

    let summary = sweeper.sweep(now()).await.unwrap();

    assert_eq!(summary.snapshots.count, 2);
    assert_eq!(summary.snapshots.size_gb, 5.0);
    assert_eq!(fake.snapshot_deletes.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn simulated_deletes_count_and_pass_the_flag_through() {
    let fake = Arc::new(
        FakeEc2::single_region(
            vec![old_volume("vol-1", Some(5.0)), old_volume("vol-2", None)],
            Vec::new(),
        )
        .script("vol-1", Scripted::Outcome(DeleteOutcome::Simulated))
        .script("vol-2", Scripted::Outcome(DeleteOutcome::Simulated)),
    );
    let mut dry_settings = settings();
    dry_settings.dry_run = true;
    let sweeper = StorageSweeper::new(fake.clone(), dry_settings);

    let summary = sweeper.sweep(now()).await.unwrap();

    assert_eq!(summary.volumes.count, 2);
    assert_eq!(summary.volumes.size_gb, 5.0);
    let deletes = fake.volume_deletes.lock().unwrap();
    assert!(deletes.iter().all(|(_, _, dry_run)| *dry_run));
}

#[tokio::test]
async fn totals_sum_across_regions() {
    let fake = Arc::new(FakeEc2 {
        regions: vec!["region-1".to_string(), "region-2".to_string()],
        volumes: HashMap::from([
            ("region-1".to_string(), vec![old_volume("vol-1", Some(5.0))]),
            ("region-2".to_string(), vec![old_volume("vol-2", Some(5.0))]),
        ]),
        snapshots: HashMap::from([
            (
                "region-1".to_string(),
                vec![old_snapshot("snap-1", Some(3.0))],
            ),
            (
                "region-2".to_string(),
                vec![old_snapshot("snap-2", Some(3.0))],
            ),
        ]),
        ..Default::default()
    });
    let sweeper = StorageSweeper::new(fake.clone(), settings());

    let summary = sweeper.sweep(now()).await.unwrap();

    assert_eq!(summary.volumes.count, 2);
    assert_eq!(summary.volumes.size_gb, 10.0);
    assert_eq!(summary.snapshots.count, 2);
    assert_eq!(summary.snapshots.size_gb, 6.0);
}

#[tokio::test]
async fn enumeration_failure_aborts_the_run() {
    let fake = Arc::new(FakeEc2 {
        regions: vec!["region-1".to_string(), "region-2".to_string()],
        volumes: HashMap::from([(
            "region-1".to_string(),
            vec![old_volume("vol-1", Some(5.0))],
        )]),
        broken_regions: vec!["region-2".to_string()],
        ..Default::default()
    });
    let sweeper = StorageSweeper::new(fake.clone(), settings());

    let result = sweeper.sweep(now()).await;

    assert!(result.is_err());
    // The first region was still processed before the abort.
    let deletes = fake.volume_deletes.lock().unwrap();
    assert_eq!(deletes.len(), 1);
    assert_eq!(deletes[0].1, "vol-1");
}
