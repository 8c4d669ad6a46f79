use anyhow::Result;
use clap::Parser;
use rosa_model::gate::profiles;
use rosa_model::Runtime;

#[derive(Debug, Parser)]
pub(crate) struct Delete {
    #[clap(subcommand)]
    resource: Resource,
}

#[derive(Debug, Parser)]
enum Resource {
    /// Delete a cluster.
    Cluster(DeleteCluster),
    /// Delete a machine pool.
    Machinepool(DeleteMachinePool),
    /// Delete an identity provider.
    Idp(DeleteIdp),
    /// Delete a log forwarder.
    Logforwarder(DeleteLogForwarder),
    /// Delete a registered OIDC configuration.
    Oidcconfig(DeleteOidcConfig),
}

impl Delete {
    pub(crate) async fn run(self, runtime: Runtime) -> Result<()> {
        let mut runtime = match self.resource {
            Resource::Oidcconfig(_) => runtime.with_ocm().await?,
            _ => runtime.with_aws().await?.with_ocm().await?,
        };
        let result = self.execute(&runtime).await;
        runtime.cleanup();
        // Absence on a delete path is a failed precondition, never
        // informational.
        match result {
            Err(err) if err.kind() == rosa_model::ErrorKind::NotFound => {
                Err(rosa_model::Error::Precondition {
                    message: err.to_string(),
                }
                .into())
            }
            result => Ok(result?),
        }
    }

    async fn execute(&self, runtime: &Runtime) -> rosa_model::Result<()> {
        match &self.resource {
            Resource::Cluster(options) => {
                let cluster = runtime.fetch_cluster().await?;
                runtime.gate(&cluster, &profiles::DELETE_CLUSTER).await?;
                if !options.yes {
                    return Err(rosa_model::Error::InvalidInput {
                        message: format!(
                            "deleting cluster '{}' is irreversible; re-run with --yes to confirm",
                            cluster.name
                        ),
                    });
                }
                runtime.ocm()?.delete_cluster(&cluster.id).await?;
                runtime.reporter.info(format!(
                    "Cluster '{}' will start uninstalling now",
                    cluster.name
                ));
            }
            Resource::Machinepool(options) => {
                let cluster = runtime.fetch_cluster().await?;
                runtime.gate(&cluster, &profiles::EDIT_MACHINE_POOL).await?;
                runtime
                    .ocm()?
                    .delete_machine_pool(&cluster, &options.name)
                    .await?;
                runtime.reporter.info(format!(
                    "Machine pool '{}' deleted from cluster '{}'",
                    options.name, cluster.name
                ));
            }
            Resource::Idp(options) => {
                let cluster = runtime.fetch_cluster().await?;
                runtime.gate(&cluster, &profiles::DELETE_IDP).await?;
                let idps = runtime.ocm()?.identity_providers(&cluster.id).await?;
                let idp = idps
                    .into_iter()
                    .find(|idp| idp.name == options.name)
                    .ok_or_else(|| rosa_model::Error::Precondition {
                        message: format!(
                            "there is no identity provider named '{}' on cluster '{}'",
                            options.name, cluster.name
                        ),
                    })?;
                runtime
                    .ocm()?
                    .delete_identity_provider(&cluster.id, &idp.id)
                    .await?;
                runtime.reporter.info(format!(
                    "Identity provider '{}' deleted from cluster '{}'",
                    options.name, cluster.name
                ));
            }
            Resource::Logforwarder(options) => {
                let cluster = runtime.fetch_cluster().await?;
                runtime.gate(&cluster, &profiles::DELETE_LOG_FORWARDER).await?;
                runtime
                    .ocm()?
                    .delete_log_forwarder(&cluster.id, &options.id)
                    .await?;
                runtime.reporter.info(format!(
                    "Log forwarder '{}' deleted from cluster '{}'",
                    options.id, cluster.name
                ));
            }
            Resource::Oidcconfig(options) => {
                let config = runtime.ocm()?.oidc_config(&options.id).await?;
                runtime.ocm()?.delete_oidc_config(&config.id).await?;
                runtime
                    .reporter
                    .info(format!("OIDC configuration '{}' deleted", config.id));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub(crate) struct DeleteCluster {
    /// Skip the confirmation prompt.
    #[clap(long, short = 'y')]
    yes: bool,
}

#[derive(Debug, Parser)]
pub(crate) struct DeleteMachinePool {
    /// Identifier of the machine pool.
    name: String,
}

#[derive(Debug, Parser)]
pub(crate) struct DeleteIdp {
    /// Name of the identity provider.
    name: String,
}

#[derive(Debug, Parser)]
pub(crate) struct DeleteLogForwarder {
    /// Identifier of the log forwarder.
    id: String,
}

#[derive(Debug, Parser)]
pub(crate) struct DeleteOidcConfig {
    /// Identifier of the OIDC configuration.
    id: String,
}
