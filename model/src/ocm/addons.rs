//! Add-on catalog reads and per-cluster installations.

use crate::error::Result;
use crate::ocm::clusters::cluster_path;
use crate::ocm::OcmClient;
use serde::{Deserialize, Serialize};
use serde_json::json;

const ADDONS: &str = "/api/clusters_mgmt/v1/addons";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddOn {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddOnParameter {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddOnInstallation {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub addon: super::types::IdRef,
}

fn installations_path(cluster_id: &str) -> String {
    format!("{}/addons", cluster_path(cluster_id))
}

fn installation_path(cluster_id: &str, addon_id: &str) -> String {
    format!("{}/{}", installations_path(cluster_id), addon_id)
}

fn installation_body(addon_id: &str, parameters: &[AddOnParameter]) -> serde_json::Value {
    let mut body = json!({"addon": {"id": addon_id}});
    if !parameters.is_empty() {
        body["parameters"] = json!({"items": parameters});
    }
    body
}

impl OcmClient {
    /// The enabled add-ons from the catalog.
    pub async fn addons(&self) -> Result<Vec<AddOn>> {
        let search = "enabled = 't'";
        let addons: Vec<AddOn> = self.list_all(ADDONS, -1, Some(search), None).await?;
        Ok(addons)
    }

    pub async fn addon_installations(&self, cluster_id: &str) -> Result<Vec<AddOnInstallation>> {
        self.list_all(&installations_path(cluster_id), -1, None, None)
            .await
    }

    pub async fn addon_installation(
        &self,
        cluster_id: &str,
        addon_id: &str,
    ) -> Result<Option<AddOnInstallation>> {
        self.get_json_opt(&installation_path(cluster_id, addon_id), &[])
            .await
    }

    pub async fn install_addon(
        &self,
        cluster_id: &str,
        addon_id: &str,
        parameters: &[AddOnParameter],
    ) -> Result<AddOnInstallation> {
        self.post_json(
            &installations_path(cluster_id),
            &[],
            &installation_body(addon_id, parameters),
        )
        .await
    }

    pub async fn update_addon_installation(
        &self,
        cluster_id: &str,
        addon_id: &str,
        parameters: &[AddOnParameter],
    ) -> Result<AddOnInstallation> {
        self.patch_json(
            &installation_path(cluster_id, addon_id),
            &installation_body(addon_id, parameters),
        )
        .await
    }

    pub async fn uninstall_addon(&self, cluster_id: &str, addon_id: &str) -> Result<()> {
        self.delete(&installation_path(cluster_id, addon_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn installation_body_omits_empty_parameters() {
        let body = installation_body("my-addon", &[]);
        assert_eq!(body["addon"]["id"], "my-addon");
        assert!(body.get("parameters").is_none());
    }

    #[test]
    fn installation_body_carries_parameters() {
        let parameters = vec![AddOnParameter {
            id: "size".to_string(),
            value: "large".to_string(),
        }];
        let body = installation_body("my-addon", &parameters);
        assert_eq!(body["parameters"]["items"][0]["id"], "size");
    }
}
