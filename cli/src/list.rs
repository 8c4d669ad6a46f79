use anyhow::Result;
use clap::Parser;
use rosa_model::constants::DEFAULT_PAGE_SIZE;
use rosa_model::gate::profiles;
use rosa_model::Runtime;

#[derive(Debug, Parser)]
pub(crate) struct List {
    #[clap(subcommand)]
    resource: Resource,
}

#[derive(Debug, Parser)]
enum Resource {
    /// List your clusters.
    Clusters,
    /// List the machine pools of a cluster.
    Machinepools,
    /// List the identity providers of a cluster.
    Idps,
    /// List the break-glass credentials of a hosted cluster.
    Breakglasscredentials,
    /// List the log forwarders of a cluster.
    Logforwarders,
    /// List the available add-ons.
    Addons,
    /// List the available OpenShift versions.
    Versions(ListVersions),
    /// List the available AWS regions.
    Regions,
    /// List the available machine types.
    Machinetypes,
    /// List the scheduled upgrades of a cluster.
    Upgrades,
    /// List the registered OIDC configurations.
    Oidcconfigs,
}

impl List {
    pub(crate) async fn run(self, runtime: Runtime) -> Result<()> {
        let mut runtime = match self.resource {
            // Catalog reads don't need the caller identity.
            Resource::Versions(_)
            | Resource::Regions
            | Resource::Machinetypes
            | Resource::Addons
            | Resource::Oidcconfigs => runtime.with_ocm().await?,
            _ => runtime.with_aws().await?.with_ocm().await?,
        };
        let result = self.execute(&runtime).await;
        runtime.cleanup();
        Ok(result?)
    }

    async fn execute(&self, runtime: &Runtime) -> rosa_model::Result<()> {
        let ocm = runtime.ocm()?;
        match &self.resource {
            Resource::Clusters => {
                let clusters = ocm.clusters(runtime.creator()?, DEFAULT_PAGE_SIZE).await?;
                if clusters.is_empty() {
                    runtime.reporter.info("There are no clusters for your account");
                    return Ok(());
                }
                for cluster in clusters {
                    println!("{}  {}  {}", cluster.id, cluster.name, cluster.state);
                }
            }
            Resource::Machinepools => {
                let cluster = runtime.fetch_cluster().await?;
                for pool in ocm.machine_pools(&cluster).await? {
                    let replicas = match (&pool.autoscaling, pool.replicas) {
                        (Some(autoscaling), _) => format!(
                            "{}-{}",
                            autoscaling.min_replicas, autoscaling.max_replicas
                        ),
                        (None, Some(replicas)) => replicas.to_string(),
                        (None, None) => "-".to_string(),
                    };
                    println!("{}  {}  {}", pool.id, pool.instance_type, replicas);
                }
            }
            Resource::Idps => {
                let cluster = runtime.fetch_cluster().await?;
                for idp in ocm.identity_providers(&cluster.id).await? {
                    println!("{}  {}  {}", idp.name, idp.provider_type, idp.mapping_method);
                }
            }
            Resource::Breakglasscredentials => {
                let cluster = runtime.fetch_cluster().await?;
                runtime
                    .gate(&cluster, &profiles::DESCRIBE_BREAK_GLASS_CREDENTIAL)
                    .await?;
                for credential in ocm.break_glass_credentials(&cluster.id).await? {
                    println!(
                        "{}  {}  {}",
                        credential.id, credential.username, credential.status
                    );
                }
            }
            Resource::Logforwarders => {
                let cluster = runtime.fetch_cluster().await?;
                runtime.gate(&cluster, &profiles::LIST_LOG_FORWARDERS).await?;
                for forwarder in ocm.log_forwarders(&cluster.id).await? {
                    println!("{}  {}", forwarder.id, forwarder.forwarder_type);
                }
            }
            Resource::Addons => {
                for addon in ocm.addons().await? {
                    println!("{}  {}", addon.id, addon.name);
                }
            }
            Resource::Versions(options) => {
                for version in ocm.versions(&options.channel_group).await? {
                    let marker = if version.default { " (default)" } else { "" };
                    println!("{}{}", version.raw_id, marker);
                }
            }
            Resource::Regions => {
                for region in ocm.regions().await? {
                    let multi_az = if region.supports_multi_az {
                        "multi-az"
                    } else {
                        "single-az"
                    };
                    println!("{}  {}", region.id, multi_az);
                }
            }
            Resource::Machinetypes => {
                for machine_type in ocm.machine_types().await? {
                    println!(
                        "{}  {} {}",
                        machine_type.id, machine_type.cpu.value, machine_type.cpu.unit
                    );
                }
            }
            Resource::Upgrades => {
                let cluster = runtime.fetch_cluster().await?;
                for policy in ocm.upgrade_policies(&cluster).await? {
                    println!("{}  {}  {}", policy.id, policy.version, policy.next_run);
                }
            }
            Resource::Oidcconfigs => {
                for config in ocm.oidc_configs().await? {
                    let managed = if config.managed { "managed" } else { "unmanaged" };
                    println!("{}  {}  {}", config.id, managed, config.issuer_url);
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub(crate) struct ListVersions {
    /// Channel group to list versions from.
    #[clap(long, default_value = "stable")]
    channel_group: String,
}
