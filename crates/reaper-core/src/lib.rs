mod criteria;
mod resource;
mod totals;

pub use criteria::has_bypass_tag;
pub use resource::{
    POWER_STATE_RUNNING, SNAPSHOT_STATE_COMPLETED, ScaleSet, ScaleSetVm, Snapshot,
    VOLUME_STATE_AVAILABLE, VirtualMachine, Volume,
};
pub use totals::ReapTotals;
