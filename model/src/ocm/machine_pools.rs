//! Machine pool operations. Classic clusters expose `machine_pools`;
//! hosted-control-plane clusters expose `node_pools` with the same verbs,
//! so every operation here picks its path from the cluster flavor.

use crate::error::{Error, Result};
use crate::ocm::clusters::cluster_path;
use crate::ocm::types::Cluster;
use crate::ocm::OcmClient;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MachinePoolAutoscaling {
    #[serde(default)]
    pub min_replicas: i64,
    #[serde(default)]
    pub max_replicas: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Taint {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub effect: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MachinePool {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub instance_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoscaling: Option<MachinePoolAutoscaling>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub availability_zones: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub taints: Vec<Taint>,
}

fn pools_path(cluster: &Cluster) -> String {
    let collection = if cluster.hosted_cp() {
        "node_pools"
    } else {
        "machine_pools"
    };
    format!("{}/{}", cluster_path(&cluster.id), collection)
}

fn pool_path(cluster: &Cluster, id: &str) -> String {
    format!("{}/{}", pools_path(cluster), id)
}

impl OcmClient {
    pub async fn machine_pools(&self, cluster: &Cluster) -> Result<Vec<MachinePool>> {
        self.list_all(&pools_path(cluster), -1, None, None).await
    }

    pub async fn machine_pool(&self, cluster: &Cluster, id: &str) -> Result<MachinePool> {
        match self
            .get_json_opt(&pool_path(cluster, id), &[])
            .await?
        {
            Some(pool) => Ok(pool),
            None => Err(Error::NotFound {
                message: format!(
                    "There is no machine pool with identifier '{}' on cluster '{}'",
                    id, cluster.name
                ),
            }),
        }
    }

    pub async fn create_machine_pool(
        &self,
        cluster: &Cluster,
        pool: &MachinePool,
    ) -> Result<MachinePool> {
        self.post_json(&pools_path(cluster), &[], pool).await
    }

    pub async fn update_machine_pool(
        &self,
        cluster: &Cluster,
        pool: &MachinePool,
    ) -> Result<MachinePool> {
        self.patch_json(&pool_path(cluster, &pool.id), pool).await
    }

    pub async fn delete_machine_pool(&self, cluster: &Cluster, id: &str) -> Result<()> {
        self.delete(&pool_path(cluster, id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocm::test_support::test_client;
    use crate::ocm::types::Hypershift;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn cluster(hosted: bool) -> Cluster {
        Cluster {
            id: "abc123".to_string(),
            name: "mycluster".to_string(),
            hypershift: Hypershift { enabled: hosted },
            ..Default::default()
        }
    }

    #[test]
    fn hosted_clusters_use_node_pools() {
        assert_eq!(
            pools_path(&cluster(true)),
            "/api/clusters_mgmt/v1/clusters/abc123/node_pools"
        );
        assert_eq!(
            pools_path(&cluster(false)),
            "/api/clusters_mgmt/v1/clusters/abc123/machine_pools"
        );
    }

    #[tokio::test]
    async fn listing_pools_hits_the_right_collection() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/clusters_mgmt/v1/clusters/abc123/node_pools"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "kind": "NodePoolList",
                "page": 1,
                "size": 1,
                "total": 1,
                "items": [{"id": "workers", "instance_type": "m5.xlarge", "replicas": 3}],
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let pools = client.machine_pools(&cluster(true)).await.unwrap();
        assert_eq!(pools.len(), 1);
        assert_eq!(pools[0].replicas, Some(3));
    }

    #[tokio::test]
    async fn missing_pool_reports_the_cluster_context() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"kind": "Error"})))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client
            .machine_pool(&cluster(false), "nope")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::NotFound);
        assert!(err.to_string().contains("mycluster"));
    }
}
