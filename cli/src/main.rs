/*!

This is the command line interface for administering ROSA clusters and the
cloud-provider artifacts they depend on. Every command runs through the
`rosa-model` Runtime: resolve the caller identity, resolve the cluster,
consult the precondition gate, talk to the control plane.

!*/

mod config_cmd;
mod create;
mod delete;
mod describe;
mod edit;
mod grant;
mod hibernate;
mod list;
mod resume;
mod revoke;
mod token_cmd;
mod upgrade;
mod verify;

use anyhow::Result;
use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;
use rosa_model::{Runtime, RuntimeOptions};

/// The command line interface for administering ROSA clusters.
#[derive(Debug, Parser)]
#[clap(author, version, about, name = "rosa")]
struct Args {
    /// Set logging verbosity [trace|debug|info|warn|error]. If the environment variable `RUST_LOG`
    /// is present, it overrides the default logging behavior. See https://docs.rs/env_logger/latest
    #[clap(long = "log-level", default_value = "info", global = true)]
    log_level: LevelFilter,

    /// Name, identifier or external identifier of the cluster to operate on.
    #[clap(long, short = 'c', global = true)]
    cluster: Option<String>,

    /// AWS profile to resolve credentials from.
    #[clap(long, global = true)]
    profile: Option<String>,

    /// AWS region to use.
    #[clap(long, global = true)]
    region: Option<String>,

    /// Use the FedRAMP (GovCloud) environment.
    #[clap(long, global = true)]
    govcloud: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Parser)]
enum Command {
    /// Create a cluster or one of its resources.
    Create(create::Create),
    /// List clusters or related resources.
    List(list::List),
    /// Show the details of a cluster or one of its resources.
    Describe(describe::Describe),
    /// Edit a cluster or one of its resources.
    Edit(edit::Edit),
    /// Delete a cluster or one of its resources.
    Delete(delete::Delete),
    /// Hibernate a cluster.
    Hibernate(hibernate::Hibernate),
    /// Resume a hibernating cluster.
    Resume(resume::Resume),
    /// Schedule an upgrade.
    Upgrade(upgrade::Upgrade),
    /// Verify cloud-provider prerequisites.
    Verify(verify::Verify),
    /// Grant a role to a user on a cluster.
    Grant(grant::Grant),
    /// Revoke a role or credentials.
    Revoke(revoke::Revoke),
    /// Read or change the persistent configuration.
    Config(config_cmd::ConfigCmd),
    /// Print a valid access token.
    Token(token_cmd::Token),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logger(args.log_level);
    if let Err(e) = run(args).await {
        eprintln!("ERROR: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    // The config command works before the first login; everything else
    // needs a Runtime.
    let command = match args.command {
        Command::Config(config) => return config.run(),
        command => command,
    };

    let runtime = Runtime::new(RuntimeOptions {
        cluster: args.cluster,
        profile: args.profile,
        region: args.region,
        govcloud: args.govcloud,
    })?;

    match command {
        Command::Create(create) => create.run(runtime).await,
        Command::List(list) => list.run(runtime).await,
        Command::Describe(describe) => describe.run(runtime).await,
        Command::Edit(edit) => edit.run(runtime).await,
        Command::Delete(delete) => delete.run(runtime).await,
        Command::Hibernate(hibernate) => hibernate.run(runtime).await,
        Command::Resume(resume) => resume.run(runtime).await,
        Command::Upgrade(upgrade) => upgrade.run(runtime).await,
        Command::Verify(verify) => verify.run(runtime).await,
        Command::Grant(grant) => grant.run(runtime).await,
        Command::Revoke(revoke) => revoke.run(runtime).await,
        Command::Config(config) => config.run(),
        Command::Token(token) => token.run(runtime).await,
    }
}

/// Initialize the logger with the value passed by `--log-level` (or its default) when the
/// `RUST_LOG` environment variable is not present. If present, the `RUST_LOG` environment variable
/// overrides `--log-level`/`level`.
fn init_logger(level: LevelFilter) {
    match std::env::var(env_logger::DEFAULT_FILTER_ENV).ok() {
        Some(_) => {
            // RUST_LOG exists; env_logger will use it.
            Builder::from_default_env().init();
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            Builder::new()
                .filter(Some(env!("CARGO_CRATE_NAME")), level)
                .init();
        }
    }
}
