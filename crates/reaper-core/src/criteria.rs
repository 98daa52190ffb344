use crate::resource::{
    SNAPSHOT_STATE_COMPLETED, ScaleSet, ScaleSetVm, Snapshot, VOLUME_STATE_AVAILABLE,
    VirtualMachine, Volume,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Check whether a tag mapping contains the configured bypass key.
///
/// Only the key set matters; the tag value is never inspected. A missing
/// tag collection counts as empty.
pub fn has_bypass_tag(tags: Option<&HashMap<String, String>>, bypass_tag: &str) -> bool {
    tags.is_some_and(|tags| tags.contains_key(bypass_tag))
}

impl Volume {
    /// A volume is reaped only if it is available, unattached, strictly
    /// older than the cutoff, and does not carry the bypass tag.
    pub fn eligible_for_reap(&self, cutoff: DateTime<Utc>, bypass_tag: &str) -> bool {
        self.state == VOLUME_STATE_AVAILABLE
            && self.attachment_count == 0
            && self.created_at < cutoff
            && !has_bypass_tag(Some(&self.tags), bypass_tag)
    }
}

impl Snapshot {
    /// A snapshot is reaped only if it is completed, strictly older than
    /// the cutoff, and does not carry the bypass tag.
    pub fn eligible_for_reap(&self, cutoff: DateTime<Utc>, bypass_tag: &str) -> bool {
        self.state == SNAPSHOT_STATE_COMPLETED
            && self.started_at < cutoff
            && !has_bypass_tag(Some(&self.tags), bypass_tag)
    }
}

impl VirtualMachine {
    pub fn has_bypass_tag(&self, bypass_tag: &str) -> bool {
        has_bypass_tag(self.tags.as_ref(), bypass_tag)
    }
}

impl ScaleSet {
    pub fn has_bypass_tag(&self, bypass_tag: &str) -> bool {
        has_bypass_tag(self.tags.as_ref(), bypass_tag)
    }
}

impl ScaleSetVm {
    pub fn has_bypass_tag(&self, bypass_tag: &str) -> bool {
        has_bypass_tag(self.tags.as_ref(), bypass_tag)
    }
}
