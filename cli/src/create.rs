use anyhow::Result;
use clap::Parser;
use rosa_model::gate::profiles;
use rosa_model::ocm::break_glass;
use rosa_model::ocm::clusters::{build_cluster_payload, ClusterSpec, StsSpec};
use rosa_model::ocm::idps::IdentityProvider;
use rosa_model::ocm::log_forwarders::LogForwarder;
use rosa_model::ocm::machine_pools::{MachinePool, MachinePoolAutoscaling};
use rosa_model::poll;
use rosa_model::Runtime;
use std::collections::BTreeMap;

#[derive(Debug, Parser)]
pub(crate) struct Create {
    #[clap(subcommand)]
    resource: Resource,
}

#[derive(Debug, Parser)]
enum Resource {
    /// Create a cluster.
    Cluster(CreateCluster),
    /// Create a machine pool on a cluster.
    Machinepool(CreateMachinePool),
    /// Create an identity provider on a cluster.
    Idp(CreateIdp),
    /// Create a break-glass credential on a hosted cluster.
    Breakglasscredential(CreateBreakGlassCredential),
    /// Create a log forwarder on a cluster.
    Logforwarder(CreateLogForwarder),
    /// Register an OIDC configuration.
    Oidcconfig(CreateOidcConfig),
}

impl Create {
    pub(crate) async fn run(self, runtime: Runtime) -> Result<()> {
        match self.resource {
            Resource::Cluster(command) => command.run(runtime).await,
            Resource::Machinepool(command) => command.run(runtime).await,
            Resource::Idp(command) => command.run(runtime).await,
            Resource::Breakglasscredential(command) => command.run(runtime).await,
            Resource::Logforwarder(command) => command.run(runtime).await,
            Resource::Oidcconfig(command) => command.run(runtime).await,
        }
    }
}

/// Parse repeated `key=value` arguments.
fn parse_key_values(pairs: &[String], flag: &str) -> rosa_model::Result<BTreeMap<String, String>> {
    let mut map = BTreeMap::new();
    for pair in pairs {
        match pair.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                map.insert(key.to_string(), value.to_string());
            }
            _ => {
                return Err(rosa_model::Error::InvalidInput {
                    message: format!(
                        "expected --{} entries of the form 'key=value', got '{}'",
                        flag, pair
                    ),
                });
            }
        }
    }
    Ok(map)
}

#[derive(Debug, Parser)]
pub(crate) struct CreateCluster {
    /// Name of the cluster. Must be a valid DNS label of at most 15
    /// characters.
    #[clap(long)]
    cluster_name: String,

    /// Deploy to multiple availability zones.
    #[clap(long)]
    multi_az: bool,

    /// Deploy a cluster with a hosted control plane.
    #[clap(long)]
    hosted_cp: bool,

    /// OpenShift version to install.
    #[clap(long)]
    version: Option<String>,

    /// Channel group to pick the version from.
    #[clap(long, default_value = "stable")]
    channel_group: String,

    /// Instance type for the compute nodes.
    #[clap(long)]
    compute_machine_type: Option<String>,

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

    /// Subnet IDs for a BYO-VPC install. Comma separated.
    #[clap(long, use_value_delimiter = true)]
    subnet_ids: Vec<String>,

    /// Availability zones to deploy to. Comma separated.
    #[clap(long, use_value_delimiter = true)]
    availability_zones: Vec<String>,

    /// IP range for the machines.
    #[clap(long)]
    machine_cidr: Option<String>,

    /// IP range for services.
    #[clap(long)]
    service_cidr: Option<String>,

    /// IP range for pods.
    #[clap(long)]
    pod_cidr: Option<String>,

    /// Subnet prefix length assigned to each node.
    #[clap(long)]
    host_prefix: Option<i64>,

    /// Restrict the API to internal access.
    #[clap(long)]
    private: bool,

    /// Use AWS PrivateLink for the control plane. Implies --private.
    #[clap(long)]
    private_link: bool,

    /// Encrypt etcd data.
    #[clap(long)]
    etcd_encryption: bool,

    /// KMS key for volume encryption.
    #[clap(long)]
    kms_key_arn: Option<String>,

    /// Disable monitoring of user-defined workloads.
    #[clap(long)]
    disable_workload_monitoring: bool,

    /// Skip the SCP policy checks in the installer.
    #[clap(long)]
    disable_scp_checks: bool,

    /// HTTP proxy for the cluster.
    #[clap(long)]
    http_proxy: Option<String>,

    /// HTTPS proxy for the cluster.
    #[clap(long)]
    https_proxy: Option<String>,

    /// ARN of the installer role. Makes this an STS cluster.
    #[clap(long)]
    role_arn: Option<String>,

    /// ARN of the support role.
    #[clap(long, requires = "role-arn")]
    support_role_arn: Option<String>,

    /// ARN of the control-plane instance role.
    #[clap(long, requires = "role-arn")]
    controlplane_iam_role: Option<String>,

    /// ARN of the worker instance role.
    #[clap(long, requires = "role-arn")]
    worker_iam_role: Option<String>,

    /// Identifier of a registered OIDC configuration.
    #[clap(long, requires = "role-arn")]
    oidc_config_id: Option<String>,

    /// External ID passed on role assumption.
    #[clap(long, requires = "role-arn")]
    external_id: Option<String>,

    /// AWS resource tags, as key=value. Comma separated.
    #[clap(long, use_value_delimiter = true)]
    tags: Vec<String>,

    /// Custom cluster properties, as key=value. Comma separated.
    #[clap(long, use_value_delimiter = true)]
    properties: Vec<String>,

    /// Validate the request without creating anything.
    #[clap(long)]
    dry_run: bool,
}

impl CreateCluster {
    pub(crate) async fn run(self, runtime: Runtime) -> Result<()> {
        let mut runtime = runtime.with_aws().await?.with_ocm().await?;
        let result = self.execute(&runtime).await;
        runtime.cleanup();
        Ok(result?)
    }

    async fn execute(&self, runtime: &Runtime) -> rosa_model::Result<()> {
        let ocm = runtime.ocm()?;
        let creator = runtime.creator()?;
        let reporter = &runtime.reporter;

        if let Some(version) = &self.version {
            if !ocm.has_version(&self.channel_group, version).await? {
                return Err(rosa_model::Error::InvalidInput {
                    message: format!(
                        "version '{}' is not available in channel group '{}'",
                        version, self.channel_group
                    ),
                });
            }
        }

        let region = match &runtime.options().region {
            Some(region) => region.clone(),
            None => runtime.aws()?.region().to_string(),
        };

        let sts = self.role_arn.as_ref().map(|role_arn| StsSpec {
            role_arn: role_arn.clone(),
            support_role_arn: self.support_role_arn.clone().unwrap_or_default(),
            master_role_arn: self.controlplane_iam_role.clone().unwrap_or_default(),
            worker_role_arn: self.worker_iam_role.clone().unwrap_or_default(),
            oidc_config_id: self.oidc_config_id.clone().unwrap_or_default(),
            external_id: self.external_id.clone().unwrap_or_default(),
            ..Default::default()
        });

        // Non-STS installs are serialized per account and embed long-lived
        // access keys; STS installs go straight through on the role ARN.
        let access_key = match &sts {
            Some(_) => None,
            None => {
                poll::wait_for_install_slot(ocm, reporter, creator, runtime.cancel_token())
                    .await?;
                Some(runtime.aws()?.access_keys().await?)
            }
        };

        let autoscaling = if self.enable_autoscaling {
            Some((
                self.min_replicas.unwrap_or(2),
                self.max_replicas.unwrap_or(2),
            ))
        } else {
            None
        };

        let spec = ClusterSpec {
            name: self.cluster_name.clone(),
            region,
            multi_az: self.multi_az,
            hosted_cp: self.hosted_cp,
            version: self.version.clone(),
            channel_group: Some(self.channel_group.clone()),
            compute_machine_type: self.compute_machine_type.clone(),
            compute_nodes: self.compute_nodes,
            autoscaling,
            availability_zones: self.availability_zones.clone(),
            subnet_ids: self.subnet_ids.clone(),
            machine_cidr: self.machine_cidr.clone(),
            service_cidr: self.service_cidr.clone(),
            pod_cidr: self.pod_cidr.clone(),
            host_prefix: self.host_prefix,
            private: self.private.then_some(true),
            private_link: self.private_link.then_some(true),
            etcd_encryption: self.etcd_encryption,
            kms_key_arn: self.kms_key_arn.clone(),
            disable_workload_monitoring: self.disable_workload_monitoring,
            disable_scp_checks: self.disable_scp_checks,
            http_proxy: self.http_proxy.clone(),
            https_proxy: self.https_proxy.clone(),
            custom_properties: parse_key_values(&self.properties, "properties")?,
            tags: parse_key_values(&self.tags, "tags")?,
            sts,
            expiration: None,
            additional_trust_bundle: None,
        };

        let payload =
            build_cluster_payload(&spec, creator, access_key.as_ref(), env!("CARGO_PKG_VERSION"))?;
        match ocm.create_cluster(&payload, self.dry_run).await? {
            None => reporter.info("Dry run: the cluster specification is valid"),
            Some(cluster) => {
                reporter.info(format!(
                    "Cluster '{}' is being created with identifier '{}'",
                    cluster.name, cluster.id
                ));
                reporter.info(format!(
                    "To watch installation progress run: rosa describe cluster -c {}",
                    cluster.name
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub(crate) struct CreateMachinePool {
    /// Identifier of the machine pool.
    name: String,

    /// Instance type for the pool's nodes.
    #[clap(long)]
    instance_type: String,

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

    /// Node labels, as key=value. Comma separated.
    #[clap(long, use_value_delimiter = true)]
    labels: Vec<String>,
}

impl CreateMachinePool {
    pub(crate) async fn run(self, runtime: Runtime) -> Result<()> {
        let mut runtime = runtime.with_aws().await?.with_ocm().await?;
        let result = self.execute(&runtime).await;
        runtime.cleanup();
        Ok(result?)
    }

    async fn execute(&self, runtime: &Runtime) -> rosa_model::Result<()> {
        let cluster = runtime.fetch_cluster().await?;
        runtime.gate(&cluster, &profiles::EDIT_MACHINE_POOL).await?;

        let pool = MachinePool {
            id: self.name.clone(),
            instance_type: self.instance_type.clone(),
            replicas: if self.enable_autoscaling {
                None
            } else {
                Some(self.replicas.unwrap_or(0))
            },
            autoscaling: self.enable_autoscaling.then(|| MachinePoolAutoscaling {
                min_replicas: self.min_replicas.unwrap_or(1),
                max_replicas: self.max_replicas.unwrap_or(1),
            }),
            labels: parse_key_values(&self.labels, "labels")?,
            ..Default::default()
        };
        let created = runtime.ocm()?.create_machine_pool(&cluster, &pool).await?;
        runtime.reporter.info(format!(
            "Machine pool '{}' created on cluster '{}'",
            created.id, cluster.name
        ));
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub(crate) struct CreateIdp {
    /// Name of the identity provider.
    #[clap(long)]
    name: String,

    /// Type of identity provider, e.g. 'HTPasswdIdentityProvider'.
    #[clap(long = "type")]
    provider_type: String,

    /// How identities are mapped to users.
    #[clap(long, default_value = "claim")]
    mapping_method: String,
}

impl CreateIdp {
    pub(crate) async fn run(self, runtime: Runtime) -> Result<()> {
        let mut runtime = runtime.with_aws().await?.with_ocm().await?;
        let result = self.execute(&runtime).await;
        runtime.cleanup();
        Ok(result?)
    }

    async fn execute(&self, runtime: &Runtime) -> rosa_model::Result<()> {
        let cluster = runtime.fetch_cluster().await?;
        runtime.gate(&cluster, &profiles::CREATE_IDP).await?;

        let idp = IdentityProvider {
            name: self.name.clone(),
            provider_type: self.provider_type.clone(),
            mapping_method: self.mapping_method.clone(),
            ..Default::default()
        };
        let created = runtime
            .ocm()?
            .create_identity_provider(&cluster.id, &idp)
            .await?;
        runtime.reporter.info(format!(
            "Identity provider '{}' created on cluster '{}'",
            created.name, cluster.name
        ));
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub(crate) struct CreateBreakGlassCredential {
    /// Username for the credential.
    #[clap(long)]
    username: Option<String>,

    /// How long the credential stays valid, in hours.
    #[clap(long)]
    expiration: Option<i64>,

    /// Wait for the kubeconfig to be issued and print it.
    #[clap(long)]
    wait: bool,
}

impl CreateBreakGlassCredential {
    pub(crate) async fn run(self, runtime: Runtime) -> Result<()> {
        let mut runtime = runtime.with_aws().await?.with_ocm().await?;
        let result = self.execute(&runtime).await;
        runtime.cleanup();
        Ok(result?)
    }

    async fn execute(&self, runtime: &Runtime) -> rosa_model::Result<()> {
        let cluster = runtime.fetch_cluster().await?;
        runtime
            .gate(&cluster, &profiles::CREATE_BREAK_GLASS_CREDENTIAL)
            .await?;

        let username = self.username.clone().unwrap_or_else(|| "break-glass".to_string());
        let expiration = self.expiration.map(|hours| {
            (chrono::Utc::now() + chrono::Duration::hours(hours))
                .to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
        });
        let credential = runtime
            .ocm()?
            .create_break_glass_credential(&cluster.id, &username, expiration.as_deref())
            .await?;
        runtime.reporter.info(format!(
            "Break-glass credential '{}' created on cluster '{}'",
            credential.id, cluster.name
        ));

        if self.wait {
            let kubeconfig = break_glass::wait_for_kubeconfig(
                runtime.ocm()?,
                &cluster.id,
                &credential.id,
                runtime.cancel_token(),
            )
            .await?;
            println!("{}", kubeconfig);
        }
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub(crate) struct CreateLogForwarder {
    /// Forwarder type, e.g. 'cloudwatch'.
    #[clap(long = "type")]
    forwarder_type: String,

    /// Endpoint logs are forwarded to.
    #[clap(long)]
    endpoint: Option<String>,

    /// Log streams to forward. Comma separated.
    #[clap(long, use_value_delimiter = true)]
    applications: Vec<String>,
}

impl CreateLogForwarder {
    pub(crate) async fn run(self, runtime: Runtime) -> Result<()> {
        let mut runtime = runtime.with_aws().await?.with_ocm().await?;
        let result = self.execute(&runtime).await;
        runtime.cleanup();
        Ok(result?)
    }

    async fn execute(&self, runtime: &Runtime) -> rosa_model::Result<()> {
        let cluster = runtime.fetch_cluster().await?;
        runtime.gate(&cluster, &profiles::CREATE_LOG_FORWARDER).await?;

        let forwarder = LogForwarder {
            forwarder_type: self.forwarder_type.clone(),
            endpoint: self.endpoint.clone().unwrap_or_default(),
            applications: self.applications.clone(),
            ..Default::default()
        };
        let created = runtime
            .ocm()?
            .create_log_forwarder(&cluster.id, &forwarder)
            .await?;
        runtime.reporter.info(format!(
            "Log forwarder '{}' created on cluster '{}'",
            created.id, cluster.name
        ));
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub(crate) struct CreateOidcConfig {
    /// Let the vendor host the OIDC issuer.
    #[clap(long, conflicts_with_all = &["issuer-url", "secret-arn", "installer-role-arn"])]
    managed: bool,

    /// Issuer URL of a customer-hosted configuration.
    #[clap(long, required_unless_present = "managed")]
    issuer_url: Option<String>,

    /// Secrets Manager ARN holding the private key.
    #[clap(long, required_unless_present = "managed")]
    secret_arn: Option<String>,

    /// Installer role allowed to read the secret.
    #[clap(long, required_unless_present = "managed")]
    installer_role_arn: Option<String>,
}

impl CreateOidcConfig {
    pub(crate) async fn run(self, runtime: Runtime) -> Result<()> {
        let mut runtime = runtime.with_ocm().await?;
        let result = self.execute(&runtime).await;
        runtime.cleanup();
        Ok(result?)
    }

    async fn execute(&self, runtime: &Runtime) -> rosa_model::Result<()> {
        let ocm = runtime.ocm()?;
        let config = if self.managed {
            ocm.register_managed_oidc_config().await?
        } else {
            ocm.register_unmanaged_oidc_config(
                self.issuer_url.as_deref().unwrap_or_default(),
                self.secret_arn.as_deref().unwrap_or_default(),
                self.installer_role_arn.as_deref().unwrap_or_default(),
            )
            .await?
        };
        runtime.reporter.info(format!(
            "OIDC configuration '{}' registered with issuer '{}'",
            config.id, config.issuer_url
        ));
        Ok(())
    }
}
