use chrono::{DateTime, Utc};
use std::collections::HashMap;

pub const VOLUME_STATE_AVAILABLE: &str = "available";
pub const SNAPSHOT_STATE_COMPLETED: &str = "completed";
pub const POWER_STATE_RUNNING: &str = "PowerState/running";

/// A block-storage volume as assembled from one describe call.
#[derive(Debug, Clone)]
pub struct Volume {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub state: String,
    pub size_gb: Option<f64>,
    pub attachment_count: usize,
    pub tags: HashMap<String, String>,
}

/// A volume snapshot as assembled from one describe call.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub state: String,
    pub volume_size_gb: Option<f64>,
    pub owner_id: String,
    pub tags: HashMap<String, String>,
}

/// A regular VM, merged from the tag-bearing list call and the
/// status-only list call.
#[derive(Debug, Clone)]
pub struct VirtualMachine {
    pub id: String,
    pub name: String,
    pub tags: Option<HashMap<String, String>>,
    pub power_statuses: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ScaleSet {
    pub id: String,
    pub name: String,
    pub tags: Option<HashMap<String, String>>,
}

/// A VM belonging to a scale set. One list call with the instance view
/// expanded carries tags and statuses together, so there is no merge step.
#[derive(Debug, Clone)]
pub struct ScaleSetVm {
    pub id: String,
    pub name: String,
    pub instance_id: String,
    pub tags: Option<HashMap<String, String>>,
    pub power_statuses: Vec<String>,
}

impl VirtualMachine {
    pub fn is_running(&self) -> bool {
        self.power_statuses.iter().any(|s| s == POWER_STATE_RUNNING)
    }
}

impl ScaleSetVm {
    pub fn is_running(&self) -> bool {
        self.power_statuses.iter().any(|s| s == POWER_STATE_RUNNING)
    }
}
