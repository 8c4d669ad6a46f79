//! Upgrade scheduling. Classic clusters schedule cluster-wide policies;
//! hosted clusters schedule control-plane policies and per-node-pool
//! policies separately.

use crate::error::Result;
use crate::ocm::clusters::cluster_path;
use crate::ocm::types::Cluster;
use crate::ocm::OcmClient;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpgradePolicy {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub schedule_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub next_run: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<super::types::IdRef>,
}

fn policies_path(cluster: &Cluster) -> String {
    if cluster.hosted_cp() {
        format!("{}/control_plane/upgrade_policies", cluster_path(&cluster.id))
    } else {
        format!("{}/upgrade_policies", cluster_path(&cluster.id))
    }
}

fn node_pool_policies_path(cluster_id: &str, node_pool_id: &str) -> String {
    format!(
        "{}/node_pools/{}/upgrade_policies",
        cluster_path(cluster_id),
        node_pool_id
    )
}

impl OcmClient {
    pub async fn upgrade_policies(&self, cluster: &Cluster) -> Result<Vec<UpgradePolicy>> {
        self.list_all(&policies_path(cluster), -1, None, None).await
    }

    pub async fn schedule_upgrade(
        &self,
        cluster: &Cluster,
        policy: &UpgradePolicy,
    ) -> Result<UpgradePolicy> {
        self.post_json(&policies_path(cluster), &[], policy).await
    }

    pub async fn cancel_upgrade(&self, cluster: &Cluster, policy_id: &str) -> Result<()> {
        self.delete(&format!("{}/{}", policies_path(cluster), policy_id))
            .await
    }

    /// Node-pool-level upgrades exist only on hosted control planes; the
    /// gate enforces that before a command gets here.
    pub async fn schedule_node_pool_upgrade(
        &self,
        cluster_id: &str,
        node_pool_id: &str,
        policy: &UpgradePolicy,
    ) -> Result<UpgradePolicy> {
        self.post_json(&node_pool_policies_path(cluster_id, node_pool_id), &[], policy)
            .await
    }
}
