//! Identity provider operations under a cluster.

use crate::error::{Error, Result};
use crate::ocm::clusters::cluster_path;
use crate::ocm::OcmClient;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityProvider {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub provider_type: String,
    #[serde(default)]
    pub mapping_method: String,
}

fn idps_path(cluster_id: &str) -> String {
    format!("{}/identity_providers", cluster_path(cluster_id))
}

impl OcmClient {
    pub async fn identity_providers(&self, cluster_id: &str) -> Result<Vec<IdentityProvider>> {
        self.list_all(&idps_path(cluster_id), -1, None, None).await
    }

    /// Create an identity provider. Names are unique per cluster; a
    /// duplicate is rejected locally before the request goes out.
    pub async fn create_identity_provider(
        &self,
        cluster_id: &str,
        idp: &IdentityProvider,
    ) -> Result<IdentityProvider> {
        let existing = self.identity_providers(cluster_id).await?;
        if existing.iter().any(|other| other.name == idp.name) {
            return Err(Error::Conflict {
                message: format!(
                    "An identity provider named '{}' already exists on the cluster",
                    idp.name
                ),
            });
        }
        self.post_json(&idps_path(cluster_id), &[], idp).await
    }

    pub async fn delete_identity_provider(&self, cluster_id: &str, id: &str) -> Result<()> {
        self.delete(&format!("{}/{}", idps_path(cluster_id), id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocm::test_support::test_client;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn idp_list(names: &[&str]) -> serde_json::Value {
        json!({
            "kind": "IdentityProviderList",
            "page": 1,
            "size": names.len(),
            "total": names.len(),
            "items": names.iter().map(|name| json!({
                "id": format!("idp-{name}"),
                "name": name,
                "type": "HTPasswdIdentityProvider",
            })).collect::<Vec<_>>(),
        })
    }

    #[tokio::test]
    async fn duplicate_idp_names_are_rejected_before_the_create_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/clusters_mgmt/v1/clusters/abc123/identity_providers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(idp_list(&["admins"])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let idp = IdentityProvider {
            name: "admins".to_string(),
            provider_type: "HTPasswdIdentityProvider".to_string(),
            ..Default::default()
        };
        let err = client
            .create_identity_provider("abc123", &idp)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn fresh_names_are_created() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(idp_list(&[])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/clusters_mgmt/v1/clusters/abc123/identity_providers"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "idp-new", "name": "new", "type": "GithubIdentityProvider"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let idp = IdentityProvider {
            name: "new".to_string(),
            provider_type: "GithubIdentityProvider".to_string(),
            ..Default::default()
        };
        let created = client.create_identity_provider("abc123", &idp).await.unwrap();
        assert_eq!(created.id, "idp-new");
    }
}
