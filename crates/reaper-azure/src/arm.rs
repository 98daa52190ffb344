use crate::auth::EnvironmentCredential;
use crate::provider::{ComputeApi, VmStatusView, VmTagView};
use crate::resource_id::resource_group;
use crate::{Error, Result};
use async_trait::async_trait;
use reaper_core::{ScaleSet, ScaleSetVm, VirtualMachine};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

const MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";
const COMPUTE_API_VERSION: &str = "2023-07-01";

/// `ComputeApi` implementation against the Azure Resource Manager REST API.
///
/// List responses are paginated; `nextLink` pages are followed here so
/// callers always see the complete result set.
pub struct ArmComputeClient {
    http: reqwest::Client,
    token: String,
    subscription_id: String,
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct Page<T> {
    #[serde(default)]
    value: Vec<T>,
    #[serde(rename = "nextLink")]
    next_link: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VmResource {
    id: String,
    name: String,
    #[serde(default)]
    tags: Option<HashMap<String, String>>,
    #[serde(default)]
    properties: Option<VmProperties>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VmProperties {
    #[serde(default)]
    instance_view: Option<InstanceView>,
}

#[derive(Deserialize)]
struct InstanceView {
    #[serde(default)]
    statuses: Vec<InstanceStatus>,
}

#[derive(Deserialize)]
struct InstanceStatus {
    #[serde(default)]
    code: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScaleSetResource {
    id: String,
    name: String,
    #[serde(default)]
    tags: Option<HashMap<String, String>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScaleSetVmResource {
    id: String,
    name: String,
    instance_id: String,
    #[serde(default)]
    tags: Option<HashMap<String, String>>,
    #[serde(default)]
    properties: Option<VmProperties>,
}

fn status_codes(properties: Option<VmProperties>) -> Vec<String> {
    properties
        .and_then(|p| p.instance_view)
        .map(|view| view.statuses.into_iter().filter_map(|s| s.code).collect())
        .unwrap_or_default()
}

impl ArmComputeClient {
    pub async fn connect(
        credential: EnvironmentCredential,
        subscription_id: String,
    ) -> Result<Self> {
        let http = reqwest::Client::new();
        // One token covers a whole sweep; ARM tokens outlive it by far.
        let token = credential.fetch_token(&http).await?;
        Ok(Self {
            http,
            token,
            subscription_id,
        })
    }

    fn subscription_url(&self, path: &str, extra_query: &str) -> String {
        format!(
            "{MANAGEMENT_ENDPOINT}/subscriptions/{}/{path}?api-version={COMPUTE_API_VERSION}{extra_query}",
            self.subscription_id
        )
    }

    async fn list_all<T: DeserializeOwned>(&self, url: String) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(url);
        while let Some(url) = next {
            let response = self.http.get(&url).bearer_auth(&self.token).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(Error::Api {
                    status: status.as_u16(),
                    body: response.text().await.unwrap_or_default(),
                });
            }
            let page: Page<T> = response.json().await?;
            items.extend(page.value);
            next = page.next_link;
        }
        Ok(items)
    }

    async fn post_action(&self, url: String) -> Result<()> {
        let response = self.http.post(&url).bearer_auth(&self.token).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ComputeApi for ArmComputeClient {
    async fn list_vms(&self) -> Result<Vec<VmTagView>> {
        let url = self.subscription_url("providers/Microsoft.Compute/virtualMachines", "");
        let vms: Vec<VmResource> = self.list_all(url).await?;
        Ok(vms
            .into_iter()
            .map(|vm| VmTagView {
                id: vm.id,
                name: vm.name,
                tags: vm.tags,
            })
            .collect())
    }

    async fn list_vm_statuses(&self) -> Result<Vec<VmStatusView>> {
        let url = self.subscription_url(
            "providers/Microsoft.Compute/virtualMachines",
            "&statusOnly=true",
        );
        let vms: Vec<VmResource> = self.list_all(url).await?;
        Ok(vms
            .into_iter()
            .map(|vm| VmStatusView {
                id: vm.id,
                power_statuses: status_codes(vm.properties),
            })
            .collect())
    }

    async fn list_scale_sets(&self) -> Result<Vec<ScaleSet>> {
        let url =
            self.subscription_url("providers/Microsoft.Compute/virtualMachineScaleSets", "");
        let sets: Vec<ScaleSetResource> = self.list_all(url).await?;
        Ok(sets
            .into_iter()
            .map(|set| ScaleSet {
                id: set.id,
                name: set.name,
                tags: set.tags,
            })
            .collect())
    }

    async fn list_scale_set_vms(&self, scale_set: &ScaleSet) -> Result<Vec<ScaleSetVm>> {
        let group = resource_group(&scale_set.id)?;
        let url = self.subscription_url(
            &format!(
                "resourceGroups/{group}/providers/Microsoft.Compute/virtualMachineScaleSets/{}/virtualMachines",
                scale_set.name
            ),
            "&$expand=instanceView",
        );
        let vms: Vec<ScaleSetVmResource> = self.list_all(url).await?;
        Ok(vms
            .into_iter()
            .map(|vm| ScaleSetVm {
                id: vm.id,
                name: vm.name,
                instance_id: vm.instance_id,
                tags: vm.tags,
                power_statuses: status_codes(vm.properties),
            })
            .collect())
    }

    async fn power_off_vm(&self, vm: &VirtualMachine) -> Result<()> {
        let group = resource_group(&vm.id)?;
        // powerOff starts a long-running operation; the poll URL in the
        // response is deliberately ignored.
        let url = self.subscription_url(
            &format!(
                "resourceGroups/{group}/providers/Microsoft.Compute/virtualMachines/{}/powerOff",
                vm.name
            ),
            "",
        );
        self.post_action(url).await
    }

    async fn power_off_scale_set_vm(
        &self,
        scale_set: &ScaleSet,
        vm: &ScaleSetVm,
    ) -> Result<()> {
        let group = resource_group(&vm.id)?;
        let url = self.subscription_url(
            &format!(
                "resourceGroups/{group}/providers/Microsoft.Compute/virtualMachineScaleSets/{}/virtualMachines/{}/powerOff",
                scale_set.name, vm.instance_id
            ),
            "",
        );
        self.post_action(url).await
    }
}
