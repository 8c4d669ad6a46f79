//! Persistent session configuration.
//!
//! The config file carries the API endpoints and the token pair across
//! invocations. It lives at `~/.config/ocm/ocm.json` unless the
//! `OCM_CONFIG` environment variable points somewhere else, and is written
//! atomically with owner-only permissions: concurrent invocations may race,
//! last writer wins.

use crate::constants::ENV_CONFIG;
use crate::error::{self, Result};
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use std::env;
use std::path::PathBuf;

/// The persistent record described in the config-file schema. Empty strings
/// are omitted on write so that a config produced by this crate round-trips
/// through other clients of the same file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub access_token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub insecure: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_agent: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fedramp: bool,
}

/// Where the config file lives. `OCM_CONFIG` overrides the default
/// user-home location.
pub fn location() -> Result<PathBuf> {
    if let Ok(path) = env::var(ENV_CONFIG) {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    let home = dirs::home_dir().ok_or(error::Error::NoHomeDir)?;
    Ok(home.join(".config").join("ocm").join("ocm.json"))
}

/// Load the config file. Returns `None` when the file does not exist, which
/// callers surface as "not logged in".
pub fn load() -> Result<Option<Config>> {
    let path = location()?;
    let data = match std::fs::read(&path) {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err).context(error::ConfigReadSnafu { path }),
    };
    if data.is_empty() {
        return Ok(None);
    }
    let cfg = serde_json::from_slice(&data).context(error::ConfigParseSnafu { path })?;
    Ok(Some(cfg))
}

/// Save the config file atomically: serialize to a temporary file in the
/// same directory, fix the permissions, then rename over the target. A
/// crash mid-save never leaves a partially-written file behind.
pub fn save(cfg: &Config) -> Result<()> {
    let path = location()?;
    let dir = path.parent().map(PathBuf::from).unwrap_or_default();
    std::fs::create_dir_all(&dir).context(error::ConfigWriteSnafu { path: path.clone() })?;

    let data = serde_json::to_vec_pretty(cfg).map_err(|source| error::Error::ConfigParse {
        path: path.clone(),
        source,
    })?;

    let tmp = tempfile::NamedTempFile::new_in(&dir)
        .context(error::ConfigWriteSnafu { path: path.clone() })?;
    std::io::Write::write_all(&mut tmp.as_file(), &data)
        .context(error::ConfigWriteSnafu { path: path.clone() })?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o600))
            .context(error::ConfigWriteSnafu { path: path.clone() })?;
    }
    tmp.persist(&path)
        .map_err(|err| err.error)
        .context(error::ConfigWriteSnafu { path })?;
    Ok(())
}

/// Partial update: rewrite only the token fields. When `cfg` is `None` the
/// current file is loaded first so that concurrent edits to other fields
/// are not clobbered more than necessary.
pub fn persist_tokens(cfg: Option<&Config>, access_token: &str, refresh_token: &str) -> Result<()> {
    let mut updated = match cfg {
        Some(cfg) => cfg.clone(),
        None => load()?.unwrap_or_default(),
    };
    updated.access_token = access_token.to_string();
    updated.refresh_token = refresh_token.to_string();
    save(&updated)
}
