use crate::provider::{ComputeApi, VmStatusView, VmTagView};
use crate::{Error, Result};
use reaper_core::VirtualMachine;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ComputeSummary {
    pub vms_powered_off: u64,
    pub scale_set_vms_powered_off: u64,
}

/// Powers off running VMs and scale-set VMs that lack the bypass tag.
pub struct ComputeSweeper {
    api: Arc<dyn ComputeApi>,
    bypass_tag: String,
}

impl ComputeSweeper {
    pub fn new(api: Arc<dyn ComputeApi>, bypass_tag: String) -> Self {
        Self { api, bypass_tag }
    }

    /// Sweep the subscription: the regular-VM pass, then every scale set.
    ///
    /// Totals are logged even when the run aborts partway through.
    pub async fn sweep(&self) -> Result<ComputeSummary> {
        let mut summary = ComputeSummary::default();
        let result = self.sweep_subscription(&mut summary).await;

        info!(
            "Powered off {} VMs and {} scale set VMs",
            summary.vms_powered_off, summary.scale_set_vms_powered_off
        );

        result.map(|_| summary)
    }

    async fn sweep_subscription(&self, summary: &mut ComputeSummary) -> Result<()> {
        self.power_off_regular_vms(summary).await?;
        self.power_off_scale_set_vms(summary).await
    }

    async fn power_off_regular_vms(&self, summary: &mut ComputeSummary) -> Result<()> {
        let vms = merge_vms(
            self.api.list_vms().await?,
            self.api.list_vm_statuses().await?,
        )?;
        for vm in &vms {
            if vm.has_bypass_tag(&self.bypass_tag) {
                info!("VM {} has bypass tag and will not be powered off.", vm.name);
                continue;
            }
            if !vm.is_running() {
                continue;
            }
            info!("Found running VM {}", vm.name);
            info!("Attempting to power off VM {}", vm.name);
            if let Err(err) = self.api.power_off_vm(vm).await {
                error!("Failed to power off VM {}: {err}", vm.name);
                continue;
            }
            summary.vms_powered_off += 1;
        }
        Ok(())
    }

    async fn power_off_scale_set_vms(&self, summary: &mut ComputeSummary) -> Result<()> {
        for scale_set in self.api.list_scale_sets().await? {
            if scale_set.has_bypass_tag(&self.bypass_tag) {
                info!(
                    "VM scale set {} has bypass tag and will not be powered off.",
                    scale_set.name
                );
                continue;
            }
            for vm in self.api.list_scale_set_vms(&scale_set).await? {
                if vm.has_bypass_tag(&self.bypass_tag) {
                    info!(
                        "VM scale set VM {} has bypass tag and will not be powered off.",
                        vm.name
                    );
                    continue;
                }
                if !vm.is_running() {
                    continue;
                }
                info!("Attempting to power off VM scale set VM {}", vm.name);
                if let Err(err) = self.api.power_off_scale_set_vm(&scale_set, &vm).await {
                    error!("Failed to power off VM scale set VM {}: {err}", vm.name);
                    continue;
                }
                summary.scale_set_vms_powered_off += 1;
            }
        }
        Ok(())
    }
}

/// Combine the tag view and the status view into composite records, keyed
/// by resource id and ordered as the tag view returned them.
///
/// A status entry referencing an id the tag view did not return is a
/// provider consistency violation and fails the merge rather than being
/// silently dropped.
pub fn merge_vms(
    tag_views: Vec<VmTagView>,
    status_views: Vec<VmStatusView>,
) -> Result<Vec<VirtualMachine>> {
    let mut vms: Vec<VirtualMachine> = tag_views
        .into_iter()
        .map(|view| VirtualMachine {
            id: view.id,
            name: view.name,
            tags: view.tags,
            power_statuses: Vec::new(),
        })
        .collect();
    let index: HashMap<String, usize> = vms
        .iter()
        .enumerate()
        .map(|(position, vm)| (vm.id.clone(), position))
        .collect();
    for view in status_views {
        let position = *index
            .get(&view.id)
            .ok_or_else(|| Error::UnknownVm(view.id.clone()))?;
        vms[position].power_statuses = view.power_statuses;
    }
    Ok(vms)
}
