use anyhow::Result;
use clap::Parser;
use rosa_model::gate::profiles;
use rosa_model::ocm::clusters::{build_cluster_patch, ClusterSpec};
use rosa_model::ocm::machine_pools::MachinePoolAutoscaling;
use rosa_model::ocm::types::ListeningMethod;
use rosa_model::Runtime;

#[derive(Debug, Parser)]
pub(crate) struct Edit {
    #[clap(subcommand)]
    resource: Resource,
}

#[derive(Debug, Parser)]
enum Resource {
    /// Edit a cluster.
    Cluster(EditCluster),
    /// Edit a machine pool.
    Machinepool(EditMachinePool),
    /// Edit an ingress.
    Ingress(EditIngress),
}

impl Edit {
    pub(crate) async fn run(self, runtime: Runtime) -> Result<()> {
        let mut runtime = runtime.with_aws().await?.with_ocm().await?;
        let result = self.execute(&runtime).await;
        runtime.cleanup();
        Ok(result?)
    }

    async fn execute(&self, runtime: &Runtime) -> rosa_model::Result<()> {
        match &self.resource {
            Resource::Cluster(options) => options.execute(runtime).await,
            Resource::Machinepool(options) => options.execute(runtime).await,
            Resource::Ingress(options) => options.execute(runtime).await,
        }
    }
}

#[derive(Debug, Parser)]
pub(crate) struct EditCluster {
    /// Number of compute nodes.
    #[clap(long, conflicts_with = "enable-autoscaling")]
    compute_nodes: Option<i64>,

    /// Enable compute autoscaling.
    #[clap(long)]
    enable_autoscaling: bool,

    /// Minimum number of compute nodes when autoscaling.
    #[clap(long, requires = "enable-autoscaling")]
    min_replicas: Option<i64>,

    /// Maximum number of compute nodes when autoscaling.
    #[clap(long, requires = "enable-autoscaling")]
    max_replicas: Option<i64>,

    /// Restrict the API to internal access.
    #[clap(long, conflicts_with = "public")]
    private: bool,

    /// Expose the API publicly.
    #[clap(long)]
    public: bool,
}

impl EditCluster {
    async fn execute(&self, runtime: &Runtime) -> rosa_model::Result<()> {
        let cluster = runtime.fetch_cluster().await?;
        runtime.gate(&cluster, &profiles::EDIT_CLUSTER).await?;

        let spec = ClusterSpec {
            compute_nodes: self.compute_nodes,
            autoscaling: self.enable_autoscaling.then(|| {
                (
                    self.min_replicas.unwrap_or(2),
                    self.max_replicas.unwrap_or(2),
                )
            }),
            private: if self.private {
                Some(true)
            } else if self.public {
                Some(false)
            } else {
                None
            },
            ..Default::default()
        };
        let patch = build_cluster_patch(&spec);
        if patch.as_object().map(|object| object.is_empty()).unwrap_or(true) {
            return Err(rosa_model::Error::InvalidInput {
                message: "nothing to edit; pass at least one change".to_string(),
            });
        }
        let updated = runtime.ocm()?.update_cluster(&cluster.id, &patch).await?;
        runtime
            .reporter
            .info(format!("Cluster '{}' updated", updated.name));
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub(crate) struct EditMachinePool {
    /// Identifier of the machine pool.
    name: String,

    /// Fixed number of replicas.
    #[clap(long, conflicts_with = "enable-autoscaling")]
    replicas: Option<i64>,

    /// Enable autoscaling for the pool.
    #[clap(long)]
    enable_autoscaling: bool,

    /// Minimum replicas when autoscaling.
    #[clap(long, requires = "enable-autoscaling")]
    min_replicas: Option<i64>,

    /// Maximum replicas when autoscaling.
    #[clap(long, requires = "enable-autoscaling")]
    max_replicas: Option<i64>,
}

impl EditMachinePool {
    async fn execute(&self, runtime: &Runtime) -> rosa_model::Result<()> {
        let cluster = runtime.fetch_cluster().await?;
        runtime.gate(&cluster, &profiles::EDIT_MACHINE_POOL).await?;

        let mut pool = runtime.ocm()?.machine_pool(&cluster, &self.name).await?;
        if self.enable_autoscaling {
            pool.replicas = None;
            pool.autoscaling = Some(MachinePoolAutoscaling {
                min_replicas: self.min_replicas.unwrap_or(1),
                max_replicas: self.max_replicas.unwrap_or(1),
            });
        } else if let Some(replicas) = self.replicas {
            pool.autoscaling = None;
            pool.replicas = Some(replicas);
        }
        let updated = runtime.ocm()?.update_machine_pool(&cluster, &pool).await?;
        runtime.reporter.info(format!(
            "Machine pool '{}' on cluster '{}' updated",
            updated.id, cluster.name
        ));
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub(crate) struct EditIngress {
    /// Identifier of the ingress; the default ingress when omitted.
    id: Option<String>,

    /// Restrict the ingress to internal traffic.
    #[clap(long, conflicts_with = "public")]
    private: bool,

    /// Expose the ingress publicly.
    #[clap(long)]
    public: bool,
}

impl EditIngress {
    async fn execute(&self, runtime: &Runtime) -> rosa_model::Result<()> {
        let cluster = runtime.fetch_cluster().await?;
        runtime.gate(&cluster, &profiles::EDIT_INGRESS).await?;

        let mut ingress = runtime
            .ocm()?
            .ingress(&cluster.id, self.id.as_deref())
            .await?;
        if self.private {
            ingress.listening = ListeningMethod::Internal;
        } else if self.public {
            ingress.listening = ListeningMethod::External;
        }
        let updated = runtime.ocm()?.update_ingress(&cluster.id, &ingress).await?;
        runtime.reporter.info(format!(
            "Ingress '{}' on cluster '{}' updated",
            updated.id, cluster.name
        ));
        Ok(())
    }
}
