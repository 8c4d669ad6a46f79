use anyhow::Result;
use clap::Parser;
use rosa_model::config::{self, Config};

/// Properties readable with `config get`.
const GETTABLE: &[&str] = &[
    "url",
    "token_url",
    "client_id",
    "client_secret",
    "scopes",
    "access_token",
    "refresh_token",
    "insecure",
    "user_agent",
    "version",
    "fedramp",
];

/// Properties writable with `config set`. Derived values are excluded.
const SETTABLE: &[&str] = &[
    "url",
    "token_url",
    "client_id",
    "client_secret",
    "access_token",
    "refresh_token",
    "insecure",
    "fedramp",
];

#[derive(Debug, Parser)]
pub(crate) struct ConfigCmd {
    #[clap(subcommand)]
    action: Action,
}

#[derive(Debug, Parser)]
enum Action {
    /// Print one configuration property.
    Get(GetProperty),
    /// Change one configuration property.
    Set(SetProperty),
}

#[derive(Debug, Parser)]
pub(crate) struct GetProperty {
    /// Property name.
    property: String,
}

#[derive(Debug, Parser)]
pub(crate) struct SetProperty {
    /// Property name.
    property: String,

    /// New value.
    value: String,
}

impl ConfigCmd {
    pub(crate) fn run(self) -> Result<()> {
        match self.action {
            Action::Get(options) => {
                let cfg = config::load()?.unwrap_or_default();
                println!("{}", get_property(&cfg, &options.property)?);
            }
            Action::Set(options) => {
                let mut cfg = config::load()?.unwrap_or_default();
                set_property(&mut cfg, &options.property, &options.value)?;
                config::save(&cfg)?;
            }
        }
        Ok(())
    }
}

fn get_property(cfg: &Config, property: &str) -> rosa_model::Result<String> {
    let value = match property {
        "url" => cfg.url.clone(),
        "token_url" => cfg.token_url.clone(),
        "client_id" => cfg.client_id.clone(),
        "client_secret" => cfg.client_secret.clone(),
        "scopes" => cfg.scopes.clone().unwrap_or_default().join(" "),
        "access_token" => cfg.access_token.clone(),
        "refresh_token" => cfg.refresh_token.clone(),
        "insecure" => cfg.insecure.to_string(),
        "user_agent" => cfg.user_agent.clone(),
        "version" => cfg.version.clone(),
        "fedramp" => cfg.fedramp.to_string(),
        other => {
            return Err(rosa_model::Error::InvalidInput {
                message: format!(
                    "unknown property '{}'; expected one of: {}",
                    other,
                    GETTABLE.join(", ")
                ),
            })
        }
    };
    Ok(value)
}

fn set_property(cfg: &mut Config, property: &str, value: &str) -> rosa_model::Result<()> {
    let parse_bool = |value: &str| -> rosa_model::Result<bool> {
        value.parse().map_err(|_| rosa_model::Error::InvalidInput {
            message: format!("expected 'true' or 'false', got '{}'", value),
        })
    };
    match property {
        "url" => cfg.url = value.to_string(),
        "token_url" => cfg.token_url = value.to_string(),
        "client_id" => cfg.client_id = value.to_string(),
        "client_secret" => cfg.client_secret = value.to_string(),
        "access_token" => cfg.access_token = value.to_string(),
        "refresh_token" => cfg.refresh_token = value.to_string(),
        "insecure" => cfg.insecure = parse_bool(value)?,
        "fedramp" => cfg.fedramp = parse_bool(value)?,
        other => {
            return Err(rosa_model::Error::InvalidInput {
                message: format!(
                    "property '{}' cannot be set; settable properties: {}",
                    other,
                    SETTABLE.join(", ")
                ),
            })
        }
    }
    Ok(())
}
