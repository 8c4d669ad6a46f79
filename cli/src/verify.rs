use anyhow::Result;
use clap::Parser;
use rosa_model::ocm::network_verification::{self, Platform};
use rosa_model::Runtime;
use std::collections::BTreeMap;

#[derive(Debug, Parser)]
pub(crate) struct Verify {
    #[clap(subcommand)]
    target: Target,
}

#[derive(Debug, Parser)]
enum Target {
    /// Verify that VPC subnets are configured correctly.
    Network(VerifyNetwork),
}

impl Verify {
    pub(crate) async fn run(self, runtime: Runtime) -> Result<()> {
        match self.target {
            Target::Network(command) => command.run(runtime).await,
        }
    }
}

#[derive(Debug, Parser)]
pub(crate) struct VerifyNetwork {
    /// Subnet IDs to verify. Defaults to the cluster's subnets when
    /// --cluster is given. Comma separated.
    #[clap(long, use_value_delimiter = true)]
    subnet_ids: Vec<String>,

    /// STS role ARN the verifier runs with.
    #[clap(long)]
    role_arn: Option<String>,

    /// Run the verifier with the hosted-control-plane platform
    /// configuration.
    #[clap(long)]
    hosted_cp: bool,

    /// Watch verification progress until every subnet finishes.
    #[clap(long, short = 'w')]
    watch: bool,

    /// Check the status of previously submitted subnets without
    /// re-submitting.
    #[clap(long, short = 's')]
    status_only: bool,
}

impl VerifyNetwork {
    pub(crate) async fn run(self, runtime: Runtime) -> Result<()> {
        let mut runtime = if runtime.options().cluster.is_some() {
            runtime.with_aws().await?.with_ocm().await?
        } else {
            runtime.with_ocm().await?
        };
        let result = self.execute(&runtime).await;
        runtime.cleanup();
        Ok(result?)
    }

    async fn execute(&self, runtime: &Runtime) -> rosa_model::Result<()> {
        let ocm = runtime.ocm()?;
        let reporter = &runtime.reporter;

        let cluster = match runtime.options().cluster {
            Some(_) => Some(runtime.fetch_cluster().await?),
            None => None,
        };

        let subnet_ids = if !self.subnet_ids.is_empty() {
            self.subnet_ids.clone()
        } else if let Some(cluster) = &cluster {
            let subnets = cluster.subnet_ids().to_vec();
            if subnets.is_empty() {
                return Err(rosa_model::Error::InvalidInput {
                    message: "running the network verifier is only supported for BYO VPC clusters"
                        .to_string(),
                });
            }
            subnets
        } else {
            return Err(rosa_model::Error::InvalidInput {
                message: "at least one subnet ID is required".to_string(),
            });
        };

        let region = match (&runtime.options().region, &cluster) {
            (Some(region), _) => region.clone(),
            (None, Some(cluster)) => cluster.region.id.clone(),
            (None, None) => {
                return Err(rosa_model::Error::InvalidInput {
                    message: "the --region flag is required".to_string(),
                })
            }
        };

        if !self.status_only {
            match &cluster {
                Some(cluster) => {
                    reporter.info(format!(
                        "Verifying the subnets of cluster '{}' are configured correctly: {:?}",
                        cluster.name, subnet_ids
                    ));
                    ocm.verify_network_subnets_by_cluster(&cluster.id, &BTreeMap::new())
                        .await?;
                }
                None => {
                    let role_arn = self.role_arn.as_deref().ok_or_else(|| {
                        rosa_model::Error::InvalidInput {
                            message: "the --role-arn flag is required without --cluster"
                                .to_string(),
                        }
                    })?;
                    let platform = if self.hosted_cp {
                        Platform::AwsHostedCp
                    } else {
                        Platform::AwsClassic
                    };
                    reporter.info(format!(
                        "Verifying the following subnet IDs are configured correctly: {:?}",
                        subnet_ids
                    ));
                    ocm.verify_network_subnets(
                        role_arn,
                        &region,
                        &subnet_ids,
                        &BTreeMap::new(),
                        platform,
                    )
                    .await?;
                }
            }
        } else {
            reporter.info(format!(
                "Checking the status of the following subnet IDs: {:?}",
                subnet_ids
            ));
        }

        if self.watch {
            network_verification::watch_subnet_verifications(
                ocm,
                reporter,
                subnet_ids,
                runtime.cancel_token(),
            )
            .await?;
        } else {
            let pending =
                network_verification::check_subnet_verifications(ocm, reporter, &subnet_ids)
                    .await?;
            if !pending.is_empty() {
                reporter.info(format!(
                    "Run the following command to wait for verification of all subnets to \
                     complete:\nrosa verify network --watch --status-only --region {} \
                     --subnet-ids {}",
                    region,
                    pending.join(",")
                ));
            }
        }
        Ok(())
    }
}
