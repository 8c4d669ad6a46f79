//! Accounts-management lookups: the caller's account and organization, the
//! organization's capability flags, and the subscription registry used by
//! the UUID resolution fast-path.

use crate::error::{Error, Result};
use crate::gate::CapabilitySet;
use crate::ocm::types::Page;
use crate::ocm::OcmClient;
use serde::Deserialize;

const CURRENT_ACCOUNT: &str = "/api/accounts_mgmt/v1/current_account";
const SUBSCRIPTIONS: &str = "/api/accounts_mgmt/v1/subscriptions";

fn organization_path(id: &str) -> String {
    format!("/api/accounts_mgmt/v1/organizations/{}", id)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Capability {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Organization {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub external_id: String,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Account {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub organization: Option<Organization>,
}

/// One entry in the subscription registry; `cluster_id` is the internal id
/// of the cluster the subscription tracks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Subscription {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub cluster_id: String,
}

impl OcmClient {
    /// The account behind the current tokens, or `None` when the server no
    /// longer knows it.
    pub async fn current_account(&self) -> Result<Option<Account>> {
        self.get_json_opt(CURRENT_ACCOUNT, &[]).await
    }

    pub async fn current_organization(&self) -> Result<Organization> {
        let account = self.current_account().await?.ok_or_else(|| Error::NotFound {
            message: "there is no account for the current session".to_string(),
        })?;
        account.organization.ok_or_else(|| Error::NotFound {
            message: format!(
                "account '{}' does not belong to an organization",
                account.username
            ),
        })
    }

    /// Fetch the organization's capability flags. Values on the wire are
    /// the strings "true"/"false".
    pub async fn organization_capabilities(&self, organization_id: &str) -> Result<CapabilitySet> {
        let organization: Organization = self
            .get_json(
                &organization_path(organization_id),
                &[("fetchCapabilities", "true".to_string())],
            )
            .await?;
        Ok(organization
            .capabilities
            .into_iter()
            .map(|capability| (capability.name, capability.value == "true"))
            .collect())
    }

    /// Look up a subscription by the cluster's external UUID.
    pub(crate) async fn subscription_by_external_cluster_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Subscription>> {
        let search = format!("external_cluster_id = '{}'", external_id);
        let page: Page<Subscription> = self
            .list_page(SUBSCRIPTIONS, 1, 1, Some(&search), None)
            .await?;
        Ok(page.items.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::HIBERNATE_CAPABILITY;
    use crate::ocm::test_support::test_client;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn capabilities_parse_their_string_values() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/accounts_mgmt/v1/organizations/org-1"))
            .and(query_param("fetchCapabilities", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "org-1",
                "capabilities": [
                    {"name": HIBERNATE_CAPABILITY, "value": "true"},
                    {"name": "capability.organization.other", "value": "false"},
                ]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let capabilities = client.organization_capabilities("org-1").await.unwrap();
        assert!(capabilities.enabled(HIBERNATE_CAPABILITY));
        assert!(!capabilities.enabled("capability.organization.other"));
        assert!(!capabilities.enabled("capability.organization.missing"));
    }

    #[tokio::test]
    async fn missing_current_account_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/accounts_mgmt/v1/current_account"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"kind": "Error"})))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        assert!(client.current_account().await.unwrap().is_none());
    }
}
