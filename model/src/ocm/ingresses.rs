//! Ingress (application router) operations under a cluster.

use crate::error::{Error, Result};
use crate::ocm::clusters::cluster_path;
use crate::ocm::types::ListeningMethod;
use crate::ocm::OcmClient;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ingress {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub listening: ListeningMethod,
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub dns_name: String,
}

fn ingresses_path(cluster_id: &str) -> String {
    format!("{}/ingresses", cluster_path(cluster_id))
}

impl OcmClient {
    pub async fn ingresses(&self, cluster_id: &str) -> Result<Vec<Ingress>> {
        self.list_all(&ingresses_path(cluster_id), -1, None, None)
            .await
    }

    /// Find an ingress by id, or the default one when `id` is `None`.
    pub async fn ingress(&self, cluster_id: &str, id: Option<&str>) -> Result<Ingress> {
        let ingresses = self.ingresses(cluster_id).await?;
        let found = match id {
            Some(id) => ingresses.into_iter().find(|ingress| ingress.id == id),
            None => ingresses.into_iter().find(|ingress| ingress.default),
        };
        found.ok_or_else(|| Error::NotFound {
            message: match id {
                Some(id) => format!("There is no ingress with identifier '{}'", id),
                None => "The cluster has no default ingress".to_string(),
            },
        })
    }

    pub async fn update_ingress(&self, cluster_id: &str, ingress: &Ingress) -> Result<Ingress> {
        self.patch_json(
            &format!("{}/{}", ingresses_path(cluster_id), ingress.id),
            ingress,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocm::test_support::test_client;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn the_default_ingress_is_found_without_an_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/clusters_mgmt/v1/clusters/abc123/ingresses"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "kind": "IngressList",
                "page": 1,
                "size": 2,
                "total": 2,
                "items": [
                    {"id": "x1y2", "listening": "external", "default": false,
                     "dns_name": "apps2.mycluster.example.com"},
                    {"id": "a1b2", "listening": "external", "default": true,
                     "dns_name": "apps.mycluster.example.com"},
                ],
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let ingress = client.ingress("abc123", None).await.unwrap();
        assert_eq!(ingress.id, "a1b2");
        assert!(ingress.default);
    }
}
