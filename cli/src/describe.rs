use anyhow::Result;
use clap::Parser;
use rosa_model::gate::profiles;
use rosa_model::ocm::break_glass;
use rosa_model::{ErrorKind, Runtime};

#[derive(Debug, Parser)]
pub(crate) struct Describe {
    #[clap(subcommand)]
    resource: Resource,
}

#[derive(Debug, Parser)]
enum Resource {
    /// Show the details of a cluster.
    Cluster,
    /// Show the details of a break-glass credential.
    Breakglasscredential(DescribeBreakGlassCredential),
}

impl Describe {
    pub(crate) async fn run(self, runtime: Runtime) -> Result<()> {
        let mut runtime = runtime.with_aws().await?.with_ocm().await?;
        let reporter = runtime.reporter;
        let result = self.execute(&runtime).await;
        runtime.cleanup();
        // Absence is informational for describe commands, not a failure.
        match result {
            Err(err) if err.kind() == ErrorKind::NotFound => {
                reporter.info(err.to_string());
                Ok(())
            }
            result => Ok(result?),
        }
    }

    async fn execute(&self, runtime: &Runtime) -> rosa_model::Result<()> {
        match &self.resource {
            Resource::Cluster => {
                let cluster = runtime.fetch_cluster().await?;
                println!("Name:        {}", cluster.name);
                println!("ID:          {}", cluster.id);
                println!("External ID: {}", cluster.external_id);
                println!("State:       {}", cluster.state);
                println!("Region:      {}", cluster.region.id);
                println!("Multi-AZ:    {}", cluster.multi_az);
                println!("Hosted CP:   {}", cluster.hosted_cp());
                println!("API:         {}", cluster.api.listening);
                if let Some(role_arn) = cluster.sts_role_arn() {
                    println!("Role ARN:    {}", role_arn);
                }
                if let Some(oidc) = cluster.oidc_endpoint_url() {
                    println!("OIDC:        {}", oidc);
                }
                if let Some(version) = &cluster.version {
                    println!("Version:     {}", version.raw_id);
                    if !version.available_upgrades.is_empty() {
                        println!(
                            "Upgrades:    {}",
                            version.available_upgrades.join(", ")
                        );
                    }
                }
            }
            Resource::Breakglasscredential(options) => {
                let cluster = runtime.fetch_cluster().await?;
                runtime
                    .gate(&cluster, &profiles::DESCRIBE_BREAK_GLASS_CREDENTIAL)
                    .await?;
                let credential = runtime
                    .ocm()?
                    .break_glass_credential(&cluster.id, &options.id)
                    .await?;
                println!("ID:         {}", credential.id);
                println!("Username:   {}", credential.username);
                println!("Status:     {}", credential.status);
                println!("Expires:    {}", credential.expiration_timestamp);
                if options.kubeconfig {
                    let kubeconfig = break_glass::wait_for_kubeconfig(
                        runtime.ocm()?,
                        &cluster.id,
                        &credential.id,
                        runtime.cancel_token(),
                    )
                    .await?;
                    println!("{}", kubeconfig);
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub(crate) struct DescribeBreakGlassCredential {
    /// Identifier of the credential.
    id: String,

    /// Wait for the kubeconfig and print it.
    #[clap(long)]
    kubeconfig: bool,
}
