use anyhow::Result;
use clap::Parser;
use rosa_model::gate::profiles;
use rosa_model::ocm::upgrade_policies::UpgradePolicy;
use rosa_model::Runtime;

#[derive(Debug, Parser)]
pub(crate) struct Upgrade {
    #[clap(subcommand)]
    target: Target,
}

#[derive(Debug, Parser)]
enum Target {
    /// Schedule an upgrade of the cluster (or, for hosted clusters, of the
    /// control plane).
    Cluster(UpgradeCluster),
    /// Schedule an upgrade of one node pool of a hosted cluster.
    Nodepool(UpgradeNodePool),
}

impl Upgrade {
    pub(crate) async fn run(self, runtime: Runtime) -> Result<()> {
        let mut runtime = runtime.with_aws().await?.with_ocm().await?;
        let result = self.execute(&runtime).await;
        runtime.cleanup();
        Ok(result?)
    }

    async fn execute(&self, runtime: &Runtime) -> rosa_model::Result<()> {
        match &self.target {
            Target::Cluster(options) => options.execute(runtime).await,
            Target::Nodepool(options) => options.execute(runtime).await,
        }
    }
}

fn ensure_available(cluster_upgrades: &[String], version: &str) -> rosa_model::Result<()> {
    if !cluster_upgrades.iter().any(|upgrade| upgrade == version) {
        return Err(rosa_model::Error::InvalidInput {
            message: format!(
                "version '{}' is not an available upgrade; available: {}",
                version,
                if cluster_upgrades.is_empty() {
                    "none".to_string()
                } else {
                    cluster_upgrades.join(", ")
                }
            ),
        });
    }
    Ok(())
}

#[derive(Debug, Parser)]
pub(crate) struct UpgradeCluster {
    /// Version to upgrade to.
    #[clap(long)]
    version: String,

    /// RFC 3339 timestamp to run the upgrade at; immediately when omitted.
    #[clap(long)]
    schedule_date: Option<String>,
}

impl UpgradeCluster {
    async fn execute(&self, runtime: &Runtime) -> rosa_model::Result<()> {
        let cluster = runtime.fetch_cluster().await?;
        runtime.gate(&cluster, &profiles::SCHEDULE_UPGRADE).await?;
        ensure_available(cluster.available_upgrades(), &self.version)?;

        let policy = UpgradePolicy {
            version: self.version.clone(),
            schedule_type: "manual".to_string(),
            next_run: self.schedule_date.clone().unwrap_or_default(),
            ..Default::default()
        };
        let scheduled = runtime.ocm()?.schedule_upgrade(&cluster, &policy).await?;
        runtime.reporter.info(format!(
            "Upgrade of cluster '{}' to version '{}' scheduled ('{}')",
            cluster.name, scheduled.version, scheduled.id
        ));
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub(crate) struct UpgradeNodePool {
    /// Identifier of the node pool.
    name: String,

    /// Version to upgrade to.
    #[clap(long)]
    version: String,
}

impl UpgradeNodePool {
    async fn execute(&self, runtime: &Runtime) -> rosa_model::Result<()> {
        let cluster = runtime.fetch_cluster().await?;
        runtime
            .gate(&cluster, &profiles::SCHEDULE_NODE_POOL_UPGRADE)
            .await?;

        let policy = UpgradePolicy {
            version: self.version.clone(),
            schedule_type: "manual".to_string(),
            ..Default::default()
        };
        let scheduled = runtime
            .ocm()?
            .schedule_node_pool_upgrade(&cluster.id, &self.name, &policy)
            .await?;
        runtime.reporter.info(format!(
            "Upgrade of node pool '{}' on cluster '{}' to version '{}' scheduled",
            self.name, cluster.name, scheduled.version
        ));
        Ok(())
    }
}
