use anyhow::Result;
use clap::Parser;
use rosa_model::gate::profiles;
use rosa_model::ocm::users::{CLUSTER_ADMINS, DEDICATED_ADMINS};
use rosa_model::Runtime;

#[derive(Debug, Parser)]
pub(crate) struct Grant {
    #[clap(subcommand)]
    target: Target,
}

#[derive(Debug, Parser)]
enum Target {
    /// Grant an admin role to a user on a cluster.
    User(GrantUser),
}

impl Grant {
    pub(crate) async fn run(self, runtime: Runtime) -> Result<()> {
        match self.target {
            Target::User(command) => command.run(runtime).await,
        }
    }
}

#[derive(Debug, Parser)]
pub(crate) struct GrantUser {
    /// Role to grant: 'dedicated-admins' or 'cluster-admins'.
    role: String,

    /// Username to grant the role to.
    #[clap(long, short = 'u')]
    user: String,
}

impl GrantUser {
    pub(crate) async fn run(self, runtime: Runtime) -> Result<()> {
        let mut runtime = runtime.with_aws().await?.with_ocm().await?;
        let result = self.execute(&runtime).await;
        runtime.cleanup();
        Ok(result?)
    }

    async fn execute(&self, runtime: &Runtime) -> rosa_model::Result<()> {
        let group = validate_role(&self.role)?;
        let cluster = runtime.fetch_cluster().await?;
        runtime.gate(&cluster, &profiles::EDIT_USERS).await?;
        runtime
            .ocm()?
            .add_group_user(&cluster.id, group, &self.user)
            .await?;
        runtime.reporter.info(format!(
            "Granted role '{}' to user '{}' on cluster '{}'",
            group, self.user, cluster.name
        ));
        Ok(())
    }
}

pub(crate) fn validate_role(role: &str) -> rosa_model::Result<&str> {
    match role {
        DEDICATED_ADMINS => Ok(DEDICATED_ADMINS),
        CLUSTER_ADMINS => Ok(CLUSTER_ADMINS),
        other => Err(rosa_model::Error::InvalidInput {
            message: format!(
                "unknown role '{}'; expected '{}' or '{}'",
                other, DEDICATED_ADMINS, CLUSTER_ADMINS
            ),
        }),
    }
}
