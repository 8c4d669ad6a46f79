use anyhow::Result;
use clap::Parser;
use rosa_model::gate::profiles;
use rosa_model::Runtime;

/// Hibernate a cluster, stopping its compute without uninstalling.
#[derive(Debug, Parser)]
pub(crate) struct Hibernate {}

impl Hibernate {
    pub(crate) async fn run(self, runtime: Runtime) -> Result<()> {
        let mut runtime = runtime.with_aws().await?.with_ocm().await?;
        let result = self.execute(&runtime).await;
        runtime.cleanup();
        Ok(result?)
    }

    async fn execute(&self, runtime: &Runtime) -> rosa_model::Result<()> {
        let cluster = runtime.fetch_cluster().await?;
        runtime.gate(&cluster, &profiles::HIBERNATE_CLUSTER).await?;
        runtime.ocm()?.hibernate_cluster(&cluster.id).await?;
        runtime
            .reporter
            .info(format!("Cluster '{}' is hibernating", cluster.name));
        Ok(())
    }
}
