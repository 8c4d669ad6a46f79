//! Log forwarder configuration under a cluster. FedRAMP environments do
//! not support log forwarding; the precondition gate blocks these
//! operations before they get here.

use crate::error::{Error, Result};
use crate::ocm::clusters::cluster_path;
use crate::ocm::OcmClient;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogForwarder {
    #[serde(default)]
    pub id: String,
    #[serde(default, rename = "type")]
    pub forwarder_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applications: Vec<String>,
}

fn forwarders_path(cluster_id: &str) -> String {
    format!("{}/log_forwarders", cluster_path(cluster_id))
}

impl OcmClient {
    pub async fn log_forwarders(&self, cluster_id: &str) -> Result<Vec<LogForwarder>> {
        self.list_all(&forwarders_path(cluster_id), -1, None, None)
            .await
    }

    pub async fn log_forwarder(&self, cluster_id: &str, id: &str) -> Result<LogForwarder> {
        match self
            .get_json_opt(&format!("{}/{}", forwarders_path(cluster_id), id), &[])
            .await?
        {
            Some(forwarder) => Ok(forwarder),
            None => Err(Error::NotFound {
                message: format!("There is no log forwarder with identifier '{}'", id),
            }),
        }
    }

    pub async fn create_log_forwarder(
        &self,
        cluster_id: &str,
        forwarder: &LogForwarder,
    ) -> Result<LogForwarder> {
        self.post_json(&forwarders_path(cluster_id), &[], forwarder)
            .await
    }

    pub async fn update_log_forwarder(
        &self,
        cluster_id: &str,
        forwarder: &LogForwarder,
    ) -> Result<LogForwarder> {
        self.patch_json(
            &format!("{}/{}", forwarders_path(cluster_id), forwarder.id),
            forwarder,
        )
        .await
    }

    pub async fn delete_log_forwarder(&self, cluster_id: &str, id: &str) -> Result<()> {
        self.delete(&format!("{}/{}", forwarders_path(cluster_id), id))
            .await
    }
}
