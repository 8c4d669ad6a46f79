use anyhow::Result;
use clap::Parser;
use rosa_model::constants::TOKEN_MIN_VALIDITY;
use rosa_model::Runtime;

/// Print an access token that stays valid for at least ten minutes,
/// refreshing the session if needed.
#[derive(Debug, Parser)]
pub(crate) struct Token {
    /// Print the refresh token instead of the access token.
    #[clap(long)]
    refresh: bool,
}

impl Token {
    pub(crate) async fn run(self, runtime: Runtime) -> Result<()> {
        let mut runtime = runtime.with_ocm().await?;
        let result = self.execute(&runtime).await;
        runtime.cleanup();
        Ok(result?)
    }

    async fn execute(&self, runtime: &Runtime) -> rosa_model::Result<()> {
        let pair = runtime
            .ocm()?
            .connection_tokens(TOKEN_MIN_VALIDITY)
            .await?;
        if self.refresh {
            println!("{}", pair.refresh);
        } else {
            println!("{}", pair.access);
        }
        Ok(())
    }
}
