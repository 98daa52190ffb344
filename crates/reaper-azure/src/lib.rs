mod arm;
mod auth;
mod error;
mod provider;
mod resource_id;
mod sweep;

pub use arm::ArmComputeClient;
pub use auth::EnvironmentCredential;
pub use error::{Error, Result};
pub use provider::{ComputeApi, VmStatusView, VmTagView};
pub use sweep::{ComputeSummary, ComputeSweeper, merge_vms};
