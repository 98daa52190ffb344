use crate::Result;
use async_trait::async_trait;
use reaper_core::{ScaleSet, ScaleSetVm, VirtualMachine};
use std::collections::HashMap;

/// Tag-bearing view of a VM from the plain subscription-wide list call.
/// Carries no power statuses.
#[derive(Debug, Clone)]
pub struct VmTagView {
    pub id: String,
    pub name: String,
    pub tags: Option<HashMap<String, String>>,
}

/// Status-bearing view of a VM from the status-only list call. Carries no
/// tags.
#[derive(Debug, Clone)]
pub struct VmStatusView {
    pub id: String,
    pub power_statuses: Vec<String>,
}

#[async_trait]
pub trait ComputeApi: Send + Sync {
    async fn list_vms(&self) -> Result<Vec<VmTagView>>;

    async fn list_vm_statuses(&self) -> Result<Vec<VmStatusView>>;

    async fn list_scale_sets(&self) -> Result<Vec<ScaleSet>>;

    /// Member VMs of one scale set, with the instance view expanded so tags
    /// and statuses arrive in a single call.
    async fn list_scale_set_vms(&self, scale_set: &ScaleSet) -> Result<Vec<ScaleSetVm>>;

    /// Fire-and-forget: starts the power-off and returns without awaiting
    /// the long-running operation.
    async fn power_off_vm(&self, vm: &VirtualMachine) -> Result<()>;

    async fn power_off_scale_set_vm(
        &self,
        scale_set: &ScaleSet,
        vm: &ScaleSetVm,
    ) -> Result<()>;
}
