//! Break-glass credentials: emergency kubeconfigs issued asynchronously by
//! the control plane for hosted clusters.

use crate::constants::{BREAK_GLASS_POLL_DEADLINE, BREAK_GLASS_POLL_INTERVAL};
use crate::error::Result;
use crate::ocm::clusters::cluster_path;
use crate::ocm::OcmClient;
use crate::poll::{self, PollSpec, Progress};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BreakGlassCredential {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub expiration_timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubeconfig: Option<String>,
}

fn credentials_path(cluster_id: &str) -> String {
    format!("{}/break_glass_credentials", cluster_path(cluster_id))
}

fn credential_path(cluster_id: &str, id: &str) -> String {
    format!("{}/{}", credentials_path(cluster_id), id)
}

impl OcmClient {
    pub async fn break_glass_credentials(
        &self,
        cluster_id: &str,
    ) -> Result<Vec<BreakGlassCredential>> {
        self.list_all(&credentials_path(cluster_id), -1, None, None)
            .await
    }

    /// Fetch one credential. A 404 is a user error here, never retried.
    pub async fn break_glass_credential(
        &self,
        cluster_id: &str,
        id: &str,
    ) -> Result<BreakGlassCredential> {
        self.get_json(&credential_path(cluster_id, id), &[]).await
    }

    pub async fn create_break_glass_credential(
        &self,
        cluster_id: &str,
        username: &str,
        expiration_timestamp: Option<&str>,
    ) -> Result<BreakGlassCredential> {
        let mut body = json!({"username": username});
        if let Some(expiration) = expiration_timestamp {
            body["expiration_timestamp"] = json!(expiration);
        }
        self.post_json(&credentials_path(cluster_id), &[], &body).await
    }

    /// Revoke every credential on the cluster.
    pub async fn revoke_break_glass_credentials(&self, cluster_id: &str) -> Result<()> {
        self.delete(&credentials_path(cluster_id)).await
    }
}

/// W3: poll a credential until the control plane attaches its kubeconfig.
/// The deadline defaults to an hour; 404 aborts immediately.
pub async fn wait_for_kubeconfig(
    ocm: &OcmClient,
    cluster_id: &str,
    credential_id: &str,
    cancel: &CancellationToken,
) -> Result<String> {
    let spec = PollSpec {
        interval: BREAK_GLASS_POLL_INTERVAL,
        deadline: Some(BREAK_GLASS_POLL_DEADLINE),
    };
    poll::drive(
        spec,
        cancel,
        String::new(),
        |status| {
            format!(
                "Timed out waiting for the kubeconfig of credential '{}'; last status was '{}'",
                credential_id, status
            )
        },
        move |_| async move {
            let credential = ocm.break_glass_credential(cluster_id, credential_id).await?;
            match credential.kubeconfig.filter(|kubeconfig| !kubeconfig.is_empty()) {
                Some(kubeconfig) => Ok(Progress::Done(kubeconfig)),
                None => Ok(Progress::Pending(credential.status)),
            }
        },
    )
    .await
}
