//! AWS caller-identity probe.
//!
//! The core never provisions cloud resources itself; the only AWS values it
//! materializes are the caller's identity and, on the non-STS create path,
//! a fresh access key for the admin IAM user.

use crate::constants::{ADMIN_USER_NAME, DEFAULT_REGION, ENV_AWS_PROFILE};
use crate::error::{self, Result};
use aws_sdk_sts::Region;
use log::info;
use snafu::{OptionExt, ResultExt};
use std::env;

/// The resolved caller identity. Immutable for the life of a Runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Creator {
    pub arn: String,
    pub account_id: String,
    pub is_sts: bool,
}

/// A long-lived access key pair, embedded in non-STS create requests.
#[derive(Debug, Clone)]
pub struct AccessKey {
    pub access_key_id: String,
    pub secret_access_key: String,
}

pub struct AwsClient {
    sts: aws_sdk_sts::Client,
    iam: aws_sdk_iam::Client,
    region: String,
}

impl AwsClient {
    /// Build the AWS sub-client from the standard credential chain. The
    /// `--profile` flag is exported as `AWS_PROFILE` so that the chain picks
    /// it up the same way the AWS CLI would.
    pub async fn new(profile: Option<&str>, region: Option<&str>) -> Result<Self> {
        if let Some(profile) = profile {
            env::set_var(ENV_AWS_PROFILE, profile);
        }
        let region = region.unwrap_or(DEFAULT_REGION).to_string();
        info!("Using AWS region '{}'", region);

        let config = aws_config::from_env()
            .region(Region::new(region.clone()))
            .load()
            .await;
        Ok(Self {
            sts: aws_sdk_sts::Client::new(&config),
            iam: aws_sdk_iam::Client::new(&config),
            region,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Resolve the caller's identity from STS. An assumed-role session ARN
    /// marks the caller as STS-backed; cluster creation then goes through
    /// the role-ARN path and never touches long-lived keys.
    pub async fn creator(&self) -> Result<Creator> {
        let identity = self
            .sts
            .get_caller_identity()
            .send()
            .await
            .context(error::CallerIdentitySnafu)?;
        let arn = identity
            .arn()
            .context(error::MissingSnafu {
                what: "arn",
                from: "caller identity",
            })?
            .to_string();
        let account_id = identity
            .account()
            .context(error::MissingSnafu {
                what: "account",
                from: "caller identity",
            })?
            .to_string();
        let is_sts = is_sts_arn(&arn);
        Ok(Creator {
            arn,
            account_id,
            is_sts,
        })
    }

    /// Create an access key for the admin IAM user. Only valid on the
    /// local-credentials path; STS callers never reach this.
    pub async fn access_keys(&self) -> Result<AccessKey> {
        let output = self
            .iam
            .create_access_key()
            .user_name(ADMIN_USER_NAME)
            .send()
            .await
            .context(error::AccessKeysSnafu {
                user_name: ADMIN_USER_NAME,
            })?;
        let key = output.access_key().context(error::MissingSnafu {
            what: "access key",
            from: "CreateAccessKey response",
        })?;
        Ok(AccessKey {
            access_key_id: key
                .access_key_id()
                .context(error::MissingSnafu {
                    what: "access key id",
                    from: "CreateAccessKey response",
                })?
                .to_string(),
            secret_access_key: key
                .secret_access_key()
                .context(error::MissingSnafu {
                    what: "secret access key",
                    from: "CreateAccessKey response",
                })?
                .to_string(),
        })
    }
}

fn is_sts_arn(arn: &str) -> bool {
    arn.contains(":sts:") && arn.contains(":assumed-role/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assumed_role_arns_are_sts() {
        assert!(is_sts_arn(
            "arn:aws:sts::123456789012:assumed-role/ManagedOpenShift-Installer-Role/mysession"
        ));
    }

    #[test]
    fn iam_user_arns_are_not_sts() {
        assert!(!is_sts_arn("arn:aws:iam::123456789012:user/alice"));
        assert!(!is_sts_arn("arn:aws:iam::123456789012:role/some-role"));
    }
}
