//! OIDC trust configurations. "Managed" configs are hosted by the vendor;
//! "unmanaged" configs point at a customer-hosted issuer.

use crate::error::{Error, Result};
use crate::ocm::OcmClient;
use serde::{Deserialize, Serialize};
use serde_json::json;

const OIDC_CONFIGS: &str = "/api/clusters_mgmt/v1/oidc_configs";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OidcConfig {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub managed: bool,
    #[serde(default)]
    pub issuer_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub secret_arn: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub installer_role_arn: String,
}

impl OcmClient {
    pub async fn oidc_configs(&self) -> Result<Vec<OidcConfig>> {
        self.list_all(OIDC_CONFIGS, -1, None, None).await
    }

    pub async fn oidc_config(&self, id: &str) -> Result<OidcConfig> {
        match self
            .get_json_opt(&format!("{}/{}", OIDC_CONFIGS, id), &[])
            .await?
        {
            Some(config) => Ok(config),
            None => Err(Error::NotFound {
                message: format!("There is no OIDC configuration with identifier '{}'", id),
            }),
        }
    }

    /// Register a managed config; the vendor hosts the issuer.
    pub async fn register_managed_oidc_config(&self) -> Result<OidcConfig> {
        self.post_json(OIDC_CONFIGS, &[], &json!({"managed": true}))
            .await
    }

    /// Register an unmanaged config backed by a customer-hosted issuer.
    pub async fn register_unmanaged_oidc_config(
        &self,
        issuer_url: &str,
        secret_arn: &str,
        installer_role_arn: &str,
    ) -> Result<OidcConfig> {
        self.post_json(
            OIDC_CONFIGS,
            &[],
            &json!({
                "managed": false,
                "issuer_url": issuer_url,
                "secret_arn": secret_arn,
                "installer_role_arn": installer_role_arn,
            }),
        )
        .await
    }

    pub async fn delete_oidc_config(&self, id: &str) -> Result<()> {
        self.delete(&format!("{}/{}", OIDC_CONFIGS, id)).await
    }
}
