//! Cloud region catalog reads.

use crate::error::Result;
use crate::ocm::OcmClient;
use serde::Deserialize;

const REGIONS: &str = "/api/clusters_mgmt/v1/cloud_providers/aws/regions";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Region {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub supports_multi_az: bool,
}

impl OcmClient {
    pub async fn regions(&self) -> Result<Vec<Region>> {
        let regions: Vec<Region> = self.list_all(REGIONS, -1, None, None).await?;
        Ok(regions.into_iter().filter(|region| region.enabled).collect())
    }
}
