//! Machine type catalog, ordered server-side by CPU count.

use crate::error::Result;
use crate::ocm::OcmClient;
use serde::Deserialize;

const MACHINE_TYPES: &str = "/api/clusters_mgmt/v1/machine_types";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MachineTypeResource {
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub unit: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MachineType {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub cpu: MachineTypeResource,
    #[serde(default)]
    pub memory: MachineTypeResource,
}

impl OcmClient {
    /// Available machine types, smallest CPU first. Ties keep server order.
    pub async fn machine_types(&self) -> Result<Vec<MachineType>> {
        self.list_all(MACHINE_TYPES, -1, None, Some("cpu asc")).await
    }
}
