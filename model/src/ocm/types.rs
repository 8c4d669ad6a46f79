//! Wire entities for the cluster-management API.
//!
//! Every value here is an immutable snapshot of what the server returned;
//! nothing in the core mutates them in place. Entity kinds on the wire use
//! a `kind` discriminator which is accepted and ignored on read.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One page of a list response: `{kind, page, size, total, items}`.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    #[serde(default)]
    pub page: i64,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub items: Vec<T>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterState {
    Waiting,
    Pending,
    Installing,
    Ready,
    Error,
    Hibernating,
    Uninstalling,
    #[serde(other)]
    Unknown,
}

serde_plain::derive_display_from_serialize!(ClusterState);

impl Default for ClusterState {
    fn default() -> Self {
        ClusterState::Unknown
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListeningMethod {
    Internal,
    External,
}

serde_plain::derive_display_from_serialize!(ListeningMethod);

impl Default for ListeningMethod {
    fn default() -> Self {
        ListeningMethod::External
    }
}

/// A reference to another object by id, e.g. `{"kind": "CloudRegion",
/// "id": "us-east-1"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRef {
    #[serde(default)]
    pub id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterApi {
    #[serde(default)]
    pub listening: ListeningMethod,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Hypershift {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sts {
    #[serde(default)]
    pub role_arn: String,
    #[serde(default)]
    pub support_role_arn: String,
    #[serde(default)]
    pub oidc_endpoint_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oidc_config: Option<IdRef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterAws {
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub subnet_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sts: Option<Sts>,
    #[serde(default)]
    pub private_link: bool,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterVersion {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub raw_id: String,
    #[serde(default)]
    pub channel_group: String,
    #[serde(default)]
    pub available_upgrades: Vec<String>,
}

/// The fields of a cluster the core consumes. The server returns more;
/// unknown fields are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cluster {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub external_id: String,
    #[serde(default)]
    pub state: ClusterState,
    #[serde(default)]
    pub region: IdRef,
    #[serde(default)]
    pub multi_az: bool,
    #[serde(default)]
    pub hypershift: Hypershift,
    #[serde(default)]
    pub api: ClusterApi,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws: Option<ClusterAws>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<ClusterVersion>,
}

impl Cluster {
    /// Whether the control plane runs in a vendor-managed account.
    pub fn hosted_cp(&self) -> bool {
        self.hypershift.enabled
    }

    /// The installer role ARN for STS clusters; empty-or-absent means the
    /// cluster uses long-lived credentials.
    pub fn sts_role_arn(&self) -> Option<&str> {
        self.aws
            .as_ref()
            .and_then(|aws| aws.sts.as_ref())
            .map(|sts| sts.role_arn.as_str())
            .filter(|arn| !arn.is_empty())
    }

    pub fn oidc_endpoint_url(&self) -> Option<&str> {
        self.aws
            .as_ref()
            .and_then(|aws| aws.sts.as_ref())
            .map(|sts| sts.oidc_endpoint_url.as_str())
            .filter(|url| !url.is_empty())
    }

    pub fn subnet_ids(&self) -> &[String] {
        self.aws
            .as_ref()
            .map(|aws| aws.subnet_ids.as_slice())
            .unwrap_or_default()
    }

    pub fn available_upgrades(&self) -> &[String] {
        self.version
            .as_ref()
            .map(|version| version.available_upgrades.as_slice())
            .unwrap_or_default()
    }
}
