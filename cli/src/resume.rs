use anyhow::Result;
use clap::Parser;
use rosa_model::gate::profiles;
use rosa_model::Runtime;

/// Resume a hibernating cluster.
#[derive(Debug, Parser)]
pub(crate) struct Resume {}

impl Resume {
    pub(crate) async fn run(self, runtime: Runtime) -> Result<()> {
        let mut runtime = runtime.with_aws().await?.with_ocm().await?;
        let result = self.execute(&runtime).await;
        runtime.cleanup();
        Ok(result?)
    }

    async fn execute(&self, runtime: &Runtime) -> rosa_model::Result<()> {
        let cluster = runtime.fetch_cluster().await?;
        runtime.gate(&cluster, &profiles::RESUME_CLUSTER).await?;
        runtime.ocm()?.resume_cluster(&cluster.id).await?;
        runtime
            .reporter
            .info(format!("Cluster '{}' is resuming", cluster.name));
        Ok(())
    }
}
