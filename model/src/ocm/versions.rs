//! Version catalog reads and the gating checks built on them.

use crate::error::{Error, Result};
use crate::ocm::OcmClient;
use serde::Deserialize;

const VERSIONS: &str = "/api/clusters_mgmt/v1/versions";

/// Server-side ordering; client-side semver refinement runs on top because
/// the server orders ids lexically.
const VERSIONS_ORDER: &str = "default desc, id desc";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Version {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub raw_id: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub channel_group: String,
    #[serde(default)]
    pub rosa_enabled: bool,
    #[serde(default)]
    pub hosted_control_plane_enabled: bool,
    #[serde(default)]
    pub available_upgrades: Vec<String>,
}

impl Version {
    fn semver(&self) -> Option<semver::Version> {
        let raw = if self.raw_id.is_empty() {
            self.id.trim_start_matches("openshift-v")
        } else {
            &self.raw_id
        };
        semver::Version::parse(raw).ok()
    }
}

impl OcmClient {
    /// Enabled versions for a channel group, newest first. Records whose id
    /// does not parse as semver keep their server position at the end; two
    /// equal versions keep server order.
    pub async fn versions(&self, channel_group: &str) -> Result<Vec<Version>> {
        let search = format!(
            "enabled = 'true' AND rosa_enabled = 'true' AND channel_group = '{}'",
            channel_group
        );
        let mut versions: Vec<Version> = self
            .list_all(VERSIONS, -1, Some(&search), Some(VERSIONS_ORDER))
            .await?;
        versions.sort_by(|a, b| match (a.semver(), b.semver()) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        Ok(versions)
    }

    /// The channel group's default version.
    pub async fn default_version(&self, channel_group: &str) -> Result<Version> {
        let versions = self.versions(channel_group).await?;
        versions
            .iter()
            .find(|version| version.default)
            .or_else(|| versions.first())
            .cloned()
            .ok_or_else(|| Error::NotFound {
                message: format!(
                    "there are no enabled versions in channel group '{}'",
                    channel_group
                ),
            })
    }

    /// Whether the given version id exists and is enabled in the channel
    /// group; consulted before create and upgrade requests.
    pub async fn has_version(&self, channel_group: &str, id: &str) -> Result<bool> {
        let versions = self.versions(channel_group).await?;
        Ok(versions
            .iter()
            .any(|version| version.id == id || version.raw_id == id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocm::test_support::test_client;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn version_body(entries: &[(&str, bool)]) -> serde_json::Value {
        json!({
            "kind": "VersionList",
            "page": 1,
            "size": entries.len(),
            "total": entries.len(),
            "items": entries.iter().map(|(raw, default)| json!({
                "id": format!("openshift-v{raw}"),
                "raw_id": raw,
                "enabled": true,
                "default": default,
                "rosa_enabled": true,
                "channel_group": "stable",
            })).collect::<Vec<_>>(),
        })
    }

    #[tokio::test]
    async fn versions_are_refined_by_semver_not_lexically() {
        let server = MockServer::start().await;
        // Lexical server order would put 4.9.10 before 4.10.2.
        Mock::given(method("GET"))
            .and(path("/api/clusters_mgmt/v1/versions"))
            .and(query_param("order", "default desc, id desc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(version_body(&[
                ("4.9.10", false),
                ("4.9.2", false),
                ("4.10.2", true),
            ])))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let versions = client.versions("stable").await.unwrap();
        let raw: Vec<&str> = versions.iter().map(|v| v.raw_id.as_str()).collect();
        assert_eq!(raw, ["4.10.2", "4.9.10", "4.9.2"]);
    }

    #[tokio::test]
    async fn the_search_is_scoped_to_enabled_rosa_versions() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/clusters_mgmt/v1/versions"))
            .and(query_param(
                "search",
                "enabled = 'true' AND rosa_enabled = 'true' AND channel_group = 'candidate'",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(version_body(&[])))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let versions = client.versions("candidate").await.unwrap();
        assert!(versions.is_empty());
    }

    #[tokio::test]
    async fn default_version_prefers_the_flag() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(version_body(&[
                ("4.14.5", false),
                ("4.13.9", true),
            ])))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let version = client.default_version("stable").await.unwrap();
        assert_eq!(version.raw_id, "4.13.9");
    }

    #[tokio::test]
    async fn has_version_matches_either_id_form() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(version_body(&[("4.14.5", true)])),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        assert!(client.has_version("stable", "4.14.5").await.unwrap());
        assert!(client
            .has_version("stable", "openshift-v4.14.5")
            .await
            .unwrap());
        assert!(!client.has_version("stable", "4.2.0").await.unwrap());
    }
}
