use anyhow::Result;
use clap::Parser;
use rosa_model::gate::profiles;
use rosa_model::Runtime;

#[derive(Debug, Parser)]
pub(crate) struct Revoke {
    #[clap(subcommand)]
    target: Target,
}

#[derive(Debug, Parser)]
enum Target {
    /// Revoke an admin role from a user on a cluster.
    User(RevokeUser),
    /// Revoke every break-glass credential on a hosted cluster.
    Breakglasscredentials,
}

impl Revoke {
    pub(crate) async fn run(self, runtime: Runtime) -> Result<()> {
        let mut runtime = runtime.with_aws().await?.with_ocm().await?;
        let result = self.execute(&runtime).await;
        runtime.cleanup();
        Ok(result?)
    }

    async fn execute(&self, runtime: &Runtime) -> rosa_model::Result<()> {
        match &self.target {
            Target::User(options) => {
                let group = crate::grant::validate_role(&options.role)?;
                let cluster = runtime.fetch_cluster().await?;
                runtime.gate(&cluster, &profiles::EDIT_USERS).await?;
                runtime
                    .ocm()?
                    .remove_group_user(&cluster.id, group, &options.user)
                    .await?;
                runtime.reporter.info(format!(
                    "Revoked role '{}' from user '{}' on cluster '{}'",
                    group, options.user, cluster.name
                ));
            }
            Target::Breakglasscredentials => {
                let cluster = runtime.fetch_cluster().await?;
                runtime
                    .gate(&cluster, &profiles::CREATE_BREAK_GLASS_CREDENTIAL)
                    .await?;
                runtime
                    .ocm()?
                    .revoke_break_glass_credentials(&cluster.id)
                    .await?;
                runtime.reporter.info(format!(
                    "All break-glass credentials on cluster '{}' are being revoked",
                    cluster.name
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub(crate) struct RevokeUser {
    /// Role to revoke: 'dedicated-admins' or 'cluster-admins'.
    role: String,

    /// Username to revoke the role from.
    #[clap(long, short = 'u')]
    user: String,
}
