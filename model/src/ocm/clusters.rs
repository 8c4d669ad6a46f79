//! Cluster operations: key classification, the identity-scoped resolver,
//! creation payload assembly, and lifecycle actions.

use crate::aws::{AccessKey, Creator};
use crate::constants::{CLI_VERSION_PROPERTY, CREATOR_ARN_PROPERTY, MAX_CLUSTER_NAME_LENGTH};
use crate::error::{Error, Result};
use crate::ocm::types::{Cluster, Page};
use crate::ocm::OcmClient;
use chrono::{DateTime, SecondsFormat, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

pub(crate) const CLUSTERS: &str = "/api/clusters_mgmt/v1/clusters";

pub(crate) fn cluster_path(id: &str) -> String {
    format!("{}/{}", CLUSTERS, id)
}

lazy_static! {
    // The identifier or name given by the user must be safe to embed in a
    // search expression; anything else is rejected before any network call.
    static ref CLUSTER_KEY_RE: Regex = Regex::new(r"^[A-Za-z0-9_-]+$").expect("static regex");
    // Cluster names must be valid DNS-1035 labels: lower case alphanumerics
    // or '-', starting with a letter, ending with an alphanumeric.
    static ref CLUSTER_NAME_RE: Regex =
        Regex::new(r"^[a-z]([-a-z0-9]{0,13}[a-z0-9])?$").expect("static regex");
}

/// How a cluster key is looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPath {
    /// Longer than a valid name and shaped like a UUID: resolved through
    /// the subscription's external cluster id first.
    ExternalUuid,
    /// Longer than a valid name but not a UUID: tried as an internal id.
    Id,
    /// Short enough to be a name; resolved by the filtered search.
    NameOrId,
}

/// The user's opaque identifier for a cluster, validated on construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterKey(String);

impl ClusterKey {
    pub fn parse(raw: &str) -> Result<Self> {
        if !CLUSTER_KEY_RE.is_match(raw) {
            return Err(Error::InvalidInput {
                message: format!(
                    "Cluster name, identifier or external identifier '{}' isn't valid: it \
                     must contain only letters, digits, dashes and underscores",
                    raw
                ),
            });
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn path(&self) -> KeyPath {
        if self.0.len() > MAX_CLUSTER_NAME_LENGTH {
            if self.0.len() == 36 && Uuid::parse_str(&self.0).is_ok() {
                KeyPath::ExternalUuid
            } else {
                KeyPath::Id
            }
        } else {
            KeyPath::NameOrId
        }
    }
}

impl fmt::Display for ClusterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

pub fn is_valid_cluster_name(name: &str) -> bool {
    CLUSTER_NAME_RE.is_match(name)
}

/// The canonical predicate restricting lists to clusters owned by the
/// caller's cloud account. Mandatory on every list that resolves a cluster.
pub fn creator_filter(creator: &Creator) -> String {
    format!(
        "product.id = 'rosa' AND (properties.{} LIKE '%:{}:%' OR aws.sts.role_arn LIKE '%:{}:%')",
        CREATOR_ARN_PROPERTY, creator.account_id, creator.account_id
    )
}

impl OcmClient {
    /// Fetch a cluster by its internal id.
    pub async fn cluster_by_id(&self, id: &str) -> Result<Cluster> {
        self.get_json(&cluster_path(id), &[]).await
    }

    async fn cluster_by_id_opt(&self, id: &str) -> Result<Option<Cluster>> {
        self.get_json_opt(&cluster_path(id), &[]).await
    }

    /// Resolve a user-supplied key to exactly one cluster owned by the
    /// caller. UUID-shaped keys go through the subscription registry and a
    /// direct fetch first; everything falls back to the filtered search.
    pub async fn cluster_by_key(&self, key: &ClusterKey, creator: &Creator) -> Result<Cluster> {
        match key.path() {
            KeyPath::ExternalUuid => {
                if let Some(subscription) =
                    self.subscription_by_external_cluster_id(key.as_str()).await?
                {
                    if !subscription.cluster_id.is_empty() {
                        if let Some(cluster) =
                            self.cluster_by_id_opt(&subscription.cluster_id).await?
                        {
                            return Ok(cluster);
                        }
                    }
                }
                if let Some(cluster) = self.cluster_by_id_opt(key.as_str()).await? {
                    return Ok(cluster);
                }
            }
            KeyPath::Id => {
                if let Some(cluster) = self.cluster_by_id_opt(key.as_str()).await? {
                    return Ok(cluster);
                }
            }
            KeyPath::NameOrId => {}
        }

        let search = format!(
            "{} AND (id = '{key}' OR name = '{key}' OR external_id = '{key}')",
            creator_filter(creator),
            key = key.as_str(),
        );
        let page: Page<Cluster> = self.list_page(CLUSTERS, 1, 1, Some(&search), None).await?;
        match page.total {
            0 => Err(Error::NotFound {
                message: format!("There is no cluster with identifier or name '{}'", key),
            }),
            1 => page.items.into_iter().next().ok_or_else(|| Error::Server {
                message: format!(
                    "the server reported one match for '{}' but returned none",
                    key
                ),
                operation_id: None,
            }),
            total => Err(Error::Conflict {
                message: format!(
                    "There are {} clusters with identifier or name '{}'",
                    total, key
                ),
            }),
        }
    }

    /// Whether the caller owns any clusters at all.
    pub async fn has_clusters(&self, creator: &Creator) -> Result<bool> {
        let page: Page<Cluster> = self
            .list_page(CLUSTERS, 1, 1, Some(&creator_filter(creator)), None)
            .await?;
        Ok(page.total > 0)
    }

    /// All of the caller's clusters, fetched `page_size` at a time.
    pub async fn clusters(&self, creator: &Creator, page_size: i64) -> Result<Vec<Cluster>> {
        self.list_all(CLUSTERS, page_size, Some(&creator_filter(creator)), None)
            .await
    }

    /// Whether the caller owns any STS cluster.
    pub async fn sts_cluster_exists(&self, creator: &Creator) -> Result<bool> {
        let search = format!("{} AND aws.sts.role_arn != ''", creator_filter(creator));
        let page: Page<Cluster> = self.list_page(CLUSTERS, 1, 1, Some(&search), None).await?;
        Ok(page.total > 0)
    }

    /// The caller's pending non-STS cluster, if one exists. Installation of
    /// such clusters is serialized per account (workflow W1).
    pub async fn pending_cluster_for_creator(
        &self,
        creator: &Creator,
    ) -> Result<Option<Cluster>> {
        let search = format!(
            "state = 'pending' AND product.id = 'rosa' AND aws.sts.role_arn = '' \
             AND properties.{} LIKE '%:{}:%'",
            CREATOR_ARN_PROPERTY, creator.account_id
        );
        let page: Page<Cluster> = self.list_page(CLUSTERS, 1, 1, Some(&search), None).await?;
        Ok(page.items.into_iter().next())
    }

    /// Submit a create request. With `dry_run` the server validates the
    /// payload without provisioning and no cluster is returned.
    pub async fn create_cluster(
        &self,
        payload: &serde_json::Value,
        dry_run: bool,
    ) -> Result<Option<Cluster>> {
        let query = [("dryRun", dry_run.to_string())];
        if dry_run {
            self.post_json_status(CLUSTERS, &query, payload).await?;
            return Ok(None);
        }
        let cluster: Cluster = self.post_json(CLUSTERS, &query, payload).await?;
        Ok(Some(cluster))
    }

    pub async fn update_cluster(
        &self,
        id: &str,
        patch: &serde_json::Value,
    ) -> Result<Cluster> {
        self.patch_json(&cluster_path(id), patch).await
    }

    pub async fn delete_cluster(&self, id: &str) -> Result<()> {
        self.delete(&cluster_path(id)).await
    }

    pub async fn hibernate_cluster(&self, id: &str) -> Result<()> {
        self.post_empty(&format!("{}/hibernate", cluster_path(id))).await
    }

    pub async fn resume_cluster(&self, id: &str) -> Result<()> {
        self.post_empty(&format!("{}/resume", cluster_path(id))).await
    }
}

/// STS role set for clusters backed by short-lived credentials.
#[derive(Debug, Clone, Default)]
pub struct StsSpec {
    pub role_arn: String,
    pub support_role_arn: String,
    pub master_role_arn: String,
    pub worker_role_arn: String,
    pub operator_roles: Vec<OperatorIamRole>,
    pub external_id: String,
    pub oidc_config_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct OperatorIamRole {
    pub name: String,
    pub namespace: String,
    pub role_arn: String,
}

/// Everything a create request can carry. Assembled by the command runner
/// from its options; turned into the wire payload by
/// [`build_cluster_payload`], which is a pure function over this value.
#[derive(Debug, Clone, Default)]
pub struct ClusterSpec {
    pub name: String,
    pub region: String,
    pub multi_az: bool,
    pub hosted_cp: bool,
    pub version: Option<String>,
    pub channel_group: Option<String>,
    pub expiration: Option<DateTime<Utc>>,
    pub compute_machine_type: Option<String>,
    pub compute_nodes: Option<i64>,
    /// `(min, max)` replica bounds; mutually exclusive with `compute_nodes`.
    pub autoscaling: Option<(i64, i64)>,
    pub availability_zones: Vec<String>,
    pub subnet_ids: Vec<String>,
    pub machine_cidr: Option<String>,
    pub service_cidr: Option<String>,
    pub pod_cidr: Option<String>,
    pub host_prefix: Option<i64>,
    pub private: Option<bool>,
    pub private_link: Option<bool>,
    pub etcd_encryption: bool,
    pub kms_key_arn: Option<String>,
    pub disable_workload_monitoring: bool,
    pub disable_scp_checks: bool,
    pub http_proxy: Option<String>,
    pub https_proxy: Option<String>,
    pub additional_trust_bundle: Option<String>,
    pub custom_properties: BTreeMap<String, String>,
    pub tags: BTreeMap<String, String>,
    pub sts: Option<StsSpec>,
}

/// Build the create payload. Non-STS specs embed the given access key; STS
/// specs carry the role set instead and must not receive one.
pub fn build_cluster_payload(
    spec: &ClusterSpec,
    creator: &Creator,
    access_key: Option<&AccessKey>,
    cli_version: &str,
) -> Result<serde_json::Value> {
    if !is_valid_cluster_name(&spec.name) {
        return Err(Error::InvalidInput {
            message: format!(
                "Cluster name '{}' must consist of no more than {} lowercase alphanumeric \
                 characters or '-', start with a letter, and end with an alphanumeric character",
                spec.name, MAX_CLUSTER_NAME_LENGTH
            ),
        });
    }

    let mut properties = spec.custom_properties.clone();
    for reserved in [CREATOR_ARN_PROPERTY, CLI_VERSION_PROPERTY] {
        if properties.contains_key(reserved) {
            return Err(Error::InvalidInput {
                message: format!(
                    "Custom properties key '{}' collides with a property needed by rosa",
                    reserved
                ),
            });
        }
    }
    properties.insert(CREATOR_ARN_PROPERTY.to_string(), creator.arn.clone());
    properties.insert(CLI_VERSION_PROPERTY.to_string(), cli_version.to_string());

    let mut cluster = json!({
        "name": spec.name,
        "display_name": spec.name,
        "multi_az": spec.multi_az,
        "product": {"id": "rosa"},
        "region": {"id": spec.region},
        "properties": properties,
        "etcd_encryption": spec.etcd_encryption,
        "disable_user_workload_monitoring": spec.disable_workload_monitoring,
        "hypershift": {"enabled": spec.hosted_cp},
    });

    if let Some(version) = &spec.version {
        cluster["version"] = json!({
            "id": version,
            "channel_group": spec.channel_group.as_deref().unwrap_or("stable"),
        });
    }

    if let Some(expiration) = &spec.expiration {
        cluster["expiration_timestamp"] =
            json!(expiration.to_rfc3339_opts(SecondsFormat::Secs, true));
    }

    let mut nodes = serde_json::Map::new();
    if let Some(machine_type) = &spec.compute_machine_type {
        nodes.insert("compute_machine_type".to_string(), json!({"id": machine_type}));
    }
    if let Some((min, max)) = spec.autoscaling {
        nodes.insert(
            "autoscale_compute".to_string(),
            json!({"min_replicas": min, "max_replicas": max}),
        );
    } else if let Some(compute) = spec.compute_nodes {
        nodes.insert("compute".to_string(), json!(compute));
    }
    if !spec.availability_zones.is_empty() {
        nodes.insert("availability_zones".to_string(), json!(spec.availability_zones));
    }
    if !nodes.is_empty() {
        cluster["nodes"] = serde_json::Value::Object(nodes);
    }

    let mut network = serde_json::Map::new();
    if let Some(cidr) = &spec.machine_cidr {
        network.insert("machine_cidr".to_string(), json!(cidr));
    }
    if let Some(cidr) = &spec.service_cidr {
        network.insert("service_cidr".to_string(), json!(cidr));
    }
    if let Some(cidr) = &spec.pod_cidr {
        network.insert("pod_cidr".to_string(), json!(cidr));
    }
    if let Some(host_prefix) = spec.host_prefix {
        network.insert("host_prefix".to_string(), json!(host_prefix));
    }
    if !network.is_empty() {
        cluster["network"] = serde_json::Value::Object(network);
    }

    let mut aws = serde_json::Map::new();
    aws.insert("account_id".to_string(), json!(creator.account_id));
    if !spec.subnet_ids.is_empty() {
        aws.insert("subnet_ids".to_string(), json!(spec.subnet_ids));
    }
    if let Some(private_link) = spec.private_link {
        aws.insert("private_link".to_string(), json!(private_link));
    }
    if let Some(kms_key_arn) = &spec.kms_key_arn {
        aws.insert("kms_key_arn".to_string(), json!(kms_key_arn));
    }
    if !spec.tags.is_empty() {
        aws.insert("tags".to_string(), json!(spec.tags));
    }
    match (&spec.sts, access_key) {
        (Some(sts), _) => {
            let mut sts_body = serde_json::Map::new();
            sts_body.insert("role_arn".to_string(), json!(sts.role_arn));
            if !sts.support_role_arn.is_empty() {
                sts_body.insert("support_role_arn".to_string(), json!(sts.support_role_arn));
            }
            if !sts.external_id.is_empty() {
                sts_body.insert("external_id".to_string(), json!(sts.external_id));
            }
            if !sts.oidc_config_id.is_empty() {
                sts_body.insert("oidc_config".to_string(), json!({"id": sts.oidc_config_id}));
            }
            if !sts.operator_roles.is_empty() {
                sts_body.insert(
                    "operator_iam_roles".to_string(),
                    json!(sts
                        .operator_roles
                        .iter()
                        .map(|role| json!({
                            "name": role.name,
                            "namespace": role.namespace,
                            "role_arn": role.role_arn,
                        }))
                        .collect::<Vec<_>>()),
                );
            }
            let mut instance_roles = serde_json::Map::new();
            if !sts.master_role_arn.is_empty() {
                instance_roles.insert("master_role_arn".to_string(), json!(sts.master_role_arn));
            }
            if !sts.worker_role_arn.is_empty() {
                instance_roles.insert("worker_role_arn".to_string(), json!(sts.worker_role_arn));
            }
            if !instance_roles.is_empty() {
                sts_body.insert(
                    "instance_iam_roles".to_string(),
                    serde_json::Value::Object(instance_roles),
                );
            }
            aws.insert("sts".to_string(), serde_json::Value::Object(sts_body));
        }
        (None, Some(key)) => {
            aws.insert("access_key_id".to_string(), json!(key.access_key_id));
            aws.insert("secret_access_key".to_string(), json!(key.secret_access_key));
        }
        (None, None) => {
            return Err(Error::InvalidInput {
                message: "access keys are required to create a non-STS cluster".to_string(),
            });
        }
    }
    cluster["aws"] = serde_json::Value::Object(aws);

    // PrivateLink implies a private API.
    let private = spec.private.unwrap_or(false) || spec.private_link.unwrap_or(false);
    if spec.private.is_some() || spec.private_link.is_some() {
        cluster["api"] = json!({"listening": if private { "internal" } else { "external" }});
    }

    if spec.disable_scp_checks {
        cluster["ccs"] = json!({"enabled": true, "disable_scp_checks": true});
    }

    if spec.http_proxy.is_some() || spec.https_proxy.is_some() {
        let mut proxy = serde_json::Map::new();
        if let Some(http_proxy) = &spec.http_proxy {
            proxy.insert("http_proxy".to_string(), json!(http_proxy));
        }
        if let Some(https_proxy) = &spec.https_proxy {
            proxy.insert("https_proxy".to_string(), json!(https_proxy));
        }
        cluster["proxy"] = serde_json::Value::Object(proxy);
    }

    if let Some(bundle) = &spec.additional_trust_bundle {
        cluster["additional_trust_bundle"] = json!(bundle);
    }

    Ok(cluster)
}

/// Build the patch body for `edit cluster`: only expiration, compute
/// scaling, and API visibility can change after installation.
pub fn build_cluster_patch(spec: &ClusterSpec) -> serde_json::Value {
    let mut patch = serde_json::Map::new();
    if let Some(expiration) = &spec.expiration {
        patch.insert(
            "expiration_timestamp".to_string(),
            json!(expiration.to_rfc3339_opts(SecondsFormat::Secs, true)),
        );
    }
    if let Some((min, max)) = spec.autoscaling {
        patch.insert(
            "nodes".to_string(),
            json!({"autoscale_compute": {"min_replicas": min, "max_replicas": max}}),
        );
    } else if let Some(compute) = spec.compute_nodes {
        patch.insert("nodes".to_string(), json!({"compute": compute}));
    }
    if let Some(private) = spec.private {
        patch.insert(
            "api".to_string(),
            json!({"listening": if private { "internal" } else { "external" }}),
        );
    }
    serde_json::Value::Object(patch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocm::test_support::test_client;
    use crate::ErrorKind;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn creator() -> Creator {
        Creator {
            arn: "arn:aws:iam::12345678:user/alice".to_string(),
            account_id: "12345678".to_string(),
            is_sts: false,
        }
    }

    fn cluster_list_body(names: &[&str], total: i64) -> serde_json::Value {
        json!({
            "kind": "ClusterList",
            "page": 1,
            "size": names.len(),
            "total": total,
            "items": names
                .iter()
                .map(|name| json!({"id": format!("id-{name}"), "name": name, "state": "ready"}))
                .collect::<Vec<_>>(),
        })
    }

    #[test]
    fn keys_at_the_name_length_bound_take_the_name_path() {
        let key = ClusterKey::parse(&"a".repeat(MAX_CLUSTER_NAME_LENGTH)).unwrap();
        assert_eq!(key.path(), KeyPath::NameOrId);
    }

    #[test]
    fn long_non_uuid_keys_take_the_id_path() {
        let key = ClusterKey::parse(&"a".repeat(MAX_CLUSTER_NAME_LENGTH + 1)).unwrap();
        assert_eq!(key.path(), KeyPath::Id);
        let key = ClusterKey::parse("1v2rgt2f2cgc9jtkb2l7mmdkivqvbbrd").unwrap();
        assert_eq!(key.path(), KeyPath::Id);
    }

    #[test]
    fn uuid_shaped_keys_take_the_uuid_path() {
        let key = ClusterKey::parse("7c4d8b3a-9c2e-4f6a-b1d0-5e8f7a6b5c4d").unwrap();
        assert_eq!(key.path(), KeyPath::ExternalUuid);
    }

    #[test]
    fn invalid_keys_are_rejected_before_any_network_call() {
        assert_eq!(
            ClusterKey::parse("").unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            ClusterKey::parse("my cluster").unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            ClusterKey::parse("x'; DROP TABLE --").unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
    }

    #[test]
    fn creator_filter_has_the_canonical_form() {
        assert_eq!(
            creator_filter(&creator()),
            "product.id = 'rosa' AND (properties.rosa_creator_arn LIKE '%:12345678:%' \
             OR aws.sts.role_arn LIKE '%:12345678:%')"
        );
    }

    #[tokio::test]
    async fn resolve_by_name_issues_one_scoped_list_call() {
        let server = MockServer::start().await;
        let expected = "product.id = 'rosa' AND (properties.rosa_creator_arn LIKE \
                        '%:12345678:%' OR aws.sts.role_arn LIKE '%:12345678:%') AND \
                        (id = 'mycluster' OR name = 'mycluster' OR external_id = 'mycluster')";
        Mock::given(method("GET"))
            .and(path("/api/clusters_mgmt/v1/clusters"))
            .and(query_param("search", expected))
            .and(query_param("page", "1"))
            .and(query_param("size", "1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(cluster_list_body(&["mycluster"], 1)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let key = ClusterKey::parse("mycluster").unwrap();
        let cluster = client.cluster_by_key(&key, &creator()).await.unwrap();
        assert_eq!(cluster.name, "mycluster");
    }

    #[tokio::test]
    async fn resolve_miss_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/clusters_mgmt/v1/clusters"))
            .respond_with(ResponseTemplate::new(200).set_body_json(cluster_list_body(&[], 0)))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let key = ClusterKey::parse("missing").unwrap();
        let err = client.cluster_by_key(&key, &creator()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(
            err.to_string(),
            "There is no cluster with identifier or name 'missing'"
        );
    }

    #[tokio::test]
    async fn ambiguous_keys_surface_the_match_count() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/clusters_mgmt/v1/clusters"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(cluster_list_body(&["mycluster"], 2)),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let key = ClusterKey::parse("mycluster").unwrap();
        let err = client.cluster_by_key(&key, &creator()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(
            err.to_string(),
            "There are 2 clusters with identifier or name 'mycluster'"
        );
    }

    #[tokio::test]
    async fn uuid_keys_try_subscription_then_direct_fetch_then_search() {
        let uuid = "7c4d8b3a-9c2e-4f6a-b1d0-5e8f7a6b5c4d";
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/accounts_mgmt/v1/subscriptions"))
            .and(query_param(
                "search",
                format!("external_cluster_id = '{}'", uuid),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "kind": "SubscriptionList", "page": 1, "size": 0, "total": 0, "items": []
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/api/clusters_mgmt/v1/clusters/{}", uuid)))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"kind": "Error"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/clusters_mgmt/v1/clusters"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(cluster_list_body(&["mycluster"], 1)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let key = ClusterKey::parse(uuid).unwrap();
        let cluster = client.cluster_by_key(&key, &creator()).await.unwrap();
        assert_eq!(cluster.name, "mycluster");
    }

    #[tokio::test]
    async fn uuid_keys_resolve_through_the_subscription_registry() {
        let uuid = "7c4d8b3a-9c2e-4f6a-b1d0-5e8f7a6b5c4d";
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/accounts_mgmt/v1/subscriptions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "kind": "SubscriptionList", "page": 1, "size": 1, "total": 1,
                "items": [{"id": "sub-1", "cluster_id": "internal-1"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/clusters_mgmt/v1/clusters/internal-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "internal-1", "name": "mycluster", "state": "ready"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let key = ClusterKey::parse(uuid).unwrap();
        let cluster = client.cluster_by_key(&key, &creator()).await.unwrap();
        assert_eq!(cluster.id, "internal-1");
    }

    #[tokio::test]
    async fn has_clusters_uses_the_creator_filter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/clusters_mgmt/v1/clusters"))
            .and(query_param("search", creator_filter(&creator())))
            .and(query_param("size", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(cluster_list_body(&[], 7)))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        assert!(client.has_clusters(&creator()).await.unwrap());
    }

    #[tokio::test]
    async fn sts_cluster_check_appends_to_the_creator_filter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/clusters_mgmt/v1/clusters"))
            .and(query_param(
                "search",
                format!("{} AND aws.sts.role_arn != ''", creator_filter(&creator())),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(cluster_list_body(&[], 0)))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        assert!(!client.sts_cluster_exists(&creator()).await.unwrap());
    }

    #[tokio::test]
    async fn a_resolved_cluster_re_resolves_identically_by_id() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "id": "id-mycluster", "name": "mycluster", "state": "ready",
            "external_id": "7c4d8b3a-9c2e-4f6a-b1d0-5e8f7a6b5c4d",
            "region": {"id": "us-east-1"},
        });
        Mock::given(method("GET"))
            .and(path("/api/clusters_mgmt/v1/clusters"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "kind": "ClusterList", "page": 1, "size": 1, "total": 1,
                "items": [body.clone()],
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/clusters_mgmt/v1/clusters/id-mycluster"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let key = ClusterKey::parse("mycluster").unwrap();
        let resolved = client.cluster_by_key(&key, &creator()).await.unwrap();
        let refetched = client.cluster_by_id(&resolved.id).await.unwrap();
        assert_eq!(resolved.id, refetched.id);
        assert_eq!(resolved.name, refetched.name);
        assert_eq!(resolved.external_id, refetched.external_id);
        assert_eq!(resolved.state, refetched.state);
        assert_eq!(resolved.region, refetched.region);
    }

    #[tokio::test]
    async fn pending_cluster_query_is_scoped_to_non_sts_creators() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/clusters_mgmt/v1/clusters"))
            .and(query_param(
                "search",
                "state = 'pending' AND product.id = 'rosa' AND aws.sts.role_arn = '' \
                 AND properties.rosa_creator_arn LIKE '%:12345678:%'",
            ))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(cluster_list_body(&["pending1"], 1)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let pending = client
            .pending_cluster_for_creator(&creator())
            .await
            .unwrap();
        assert_eq!(pending.unwrap().name, "pending1");
    }

    fn base_spec() -> ClusterSpec {
        ClusterSpec {
            name: "mycluster".to_string(),
            region: "us-east-1".to_string(),
            ..Default::default()
        }
    }

    fn access_key() -> AccessKey {
        AccessKey {
            access_key_id: "AKIA123".to_string(),
            secret_access_key: "secret".to_string(),
        }
    }

    #[test]
    fn payload_reserves_the_creator_arn_property() {
        let payload =
            build_cluster_payload(&base_spec(), &creator(), Some(&access_key()), "0.1.0").unwrap();
        assert_eq!(
            payload["properties"][CREATOR_ARN_PROPERTY],
            "arn:aws:iam::12345678:user/alice"
        );
        assert_eq!(payload["properties"][CLI_VERSION_PROPERTY], "0.1.0");
        assert_eq!(payload["product"]["id"], "rosa");
    }

    #[test]
    fn payload_rejects_reserved_property_collisions() {
        let mut spec = base_spec();
        spec.custom_properties
            .insert(CREATOR_ARN_PROPERTY.to_string(), "spoofed".to_string());
        let err =
            build_cluster_payload(&spec, &creator(), Some(&access_key()), "0.1.0").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn payload_rejects_invalid_names() {
        let mut spec = base_spec();
        spec.name = "MyCluster".to_string();
        let err =
            build_cluster_payload(&spec, &creator(), Some(&access_key()), "0.1.0").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn sts_specs_carry_the_role_set_and_no_keys() {
        let mut spec = base_spec();
        spec.sts = Some(StsSpec {
            role_arn: "arn:aws:iam::12345678:role/Installer".to_string(),
            support_role_arn: "arn:aws:iam::12345678:role/Support".to_string(),
            master_role_arn: "arn:aws:iam::12345678:role/Master".to_string(),
            worker_role_arn: "arn:aws:iam::12345678:role/Worker".to_string(),
            ..Default::default()
        });
        let payload = build_cluster_payload(&spec, &creator(), None, "0.1.0").unwrap();
        assert_eq!(
            payload["aws"]["sts"]["role_arn"],
            "arn:aws:iam::12345678:role/Installer"
        );
        assert!(payload["aws"].get("access_key_id").is_none());
    }

    #[test]
    fn non_sts_specs_require_access_keys() {
        let err = build_cluster_payload(&base_spec(), &creator(), None, "0.1.0").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn private_link_implies_an_internal_api() {
        let mut spec = base_spec();
        spec.private_link = Some(true);
        let payload =
            build_cluster_payload(&spec, &creator(), Some(&access_key()), "0.1.0").unwrap();
        assert_eq!(payload["api"]["listening"], "internal");
        assert_eq!(payload["aws"]["private_link"], true);
    }

    #[test]
    fn edit_patch_contains_only_what_changed() {
        let mut spec = base_spec();
        spec.compute_nodes = Some(6);
        spec.private = Some(false);
        let patch = build_cluster_patch(&spec);
        assert_eq!(patch["nodes"]["compute"], 6);
        assert_eq!(patch["api"]["listening"], "external");
        assert!(patch.get("expiration_timestamp").is_none());
    }
}
