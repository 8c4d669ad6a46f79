//! Subnet network verification: submission and the watch workflow.
//!
//! Submitting a verification creates one record per subnet; each record
//! moves `pending -> running -> passed|failed`. The watch mode polls the
//! outstanding set and reports subnets in the order they finalize, which is
//! not necessarily the input order.

use crate::constants::NETWORK_VERIFY_INTERVAL;
use crate::error::Result;
use crate::ocm::clusters::cluster_path;
use crate::ocm::OcmClient;
use crate::poll::{self, PollSpec, Progress};
use crate::reporter::Reporter;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;

const NETWORK_VERIFICATIONS: &str = "/api/clusters_mgmt/v1/network_verifications";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubnetVerifyState {
    Pending,
    Running,
    Passed,
    Failed,
    #[serde(other)]
    Unknown,
}

serde_plain::derive_display_from_serialize!(SubnetVerifyState);

impl Default for SubnetVerifyState {
    fn default() -> Self {
        SubnetVerifyState::Pending
    }
}

impl SubnetVerifyState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SubnetVerifyState::Passed | SubnetVerifyState::Failed)
    }
}

/// Platform configuration the verifier runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "aws-classic")]
    AwsClassic,
    #[serde(rename = "aws-hosted-cp")]
    AwsHostedCp,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubnetVerification {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub state: SubnetVerifyState,
    #[serde(default)]
    pub details: Vec<String>,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
struct NetworkVerification {
    #[serde(default)]
    items: Vec<SubnetVerification>,
}

impl OcmClient {
    /// Submit verification for an explicit subnet list.
    pub async fn verify_network_subnets(
        &self,
        role_arn: &str,
        region: &str,
        subnet_ids: &[String],
        tags: &BTreeMap<String, String>,
        platform: Platform,
    ) -> Result<Vec<SubnetVerification>> {
        let body = json!({
            "cloud_provider_data": {
                "aws": {
                    "sts": {"role_arn": role_arn},
                    "region": {"id": region},
                    "subnet_ids": subnet_ids,
                    "tags": tags,
                },
            },
            "platform": platform,
        });
        let verification: NetworkVerification =
            self.post_json(NETWORK_VERIFICATIONS, &[], &body).await?;
        Ok(verification.items)
    }

    /// Submit verification for all of a cluster's subnets; the server
    /// derives role, region and subnet list from the cluster record.
    pub async fn verify_network_subnets_by_cluster(
        &self,
        cluster_id: &str,
        tags: &BTreeMap<String, String>,
    ) -> Result<Vec<SubnetVerification>> {
        let body = json!({"tags": tags});
        let verification: NetworkVerification = self
            .post_json(
                &format!("{}/network_verification", cluster_path(cluster_id)),
                &[],
                &body,
            )
            .await?;
        Ok(verification.items)
    }

    /// One subnet's current verification record.
    pub async fn subnet_verification(&self, subnet_id: &str) -> Result<SubnetVerification> {
        self.get_json(&format!("{}/{}", NETWORK_VERIFICATIONS, subnet_id), &[])
            .await
    }
}

fn report_subnet(reporter: &Reporter, verification: &SubnetVerification) {
    if verification.state == SubnetVerifyState::Failed {
        reporter.info(format!(
            "{}: {} Unable to verify egress to: {:?}",
            verification.id, verification.state, verification.details
        ));
    } else {
        reporter.info(format!("{}: {}", verification.id, verification.state));
    }
}

/// Watch mode: poll the outstanding subnets every interval, shrinking the
/// set as records finalize. Returns the records in finalization order.
/// An empty input returns immediately without sleeping.
pub async fn watch_subnet_verifications(
    ocm: &OcmClient,
    reporter: &Reporter,
    subnet_ids: Vec<String>,
    cancel: &CancellationToken,
) -> Result<Vec<SubnetVerification>> {
    if subnet_ids.is_empty() {
        return Ok(Vec::new());
    }
    let spec = PollSpec {
        interval: NETWORK_VERIFY_INTERVAL,
        deadline: None,
    };
    poll::drive(
        spec,
        cancel,
        (subnet_ids, Vec::new()),
        |(remaining, _)| format!("subnets still pending: {}", remaining.join(", ")),
        move |(remaining, mut finalized)| async move {
            let mut still_pending = Vec::new();
            for subnet_id in remaining {
                let verification = ocm.subnet_verification(&subnet_id).await?;
                if verification.state.is_terminal() {
                    report_subnet(reporter, &verification);
                    finalized.push(verification);
                } else {
                    still_pending.push(subnet_id);
                }
            }
            if still_pending.is_empty() {
                Ok(Progress::Done(finalized))
            } else {
                Ok(Progress::Pending((still_pending, finalized)))
            }
        },
    )
    .await
}

/// One-shot mode: a single query per subnet. Returns the subnets that have
/// not reached a terminal state, so the caller can print a resume hint.
pub async fn check_subnet_verifications(
    ocm: &OcmClient,
    reporter: &Reporter,
    subnet_ids: &[String],
) -> Result<Vec<String>> {
    let mut pending = Vec::new();
    for subnet_id in subnet_ids {
        let verification = ocm.subnet_verification(subnet_id).await?;
        report_subnet(reporter, &verification);
        if !verification.state.is_terminal() {
            pending.push(subnet_id.clone());
        }
    }
    Ok(pending)
}
