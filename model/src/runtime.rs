//! The per-invocation composition root handed to every command runner.
//!
//! A `Runtime` starts empty and opts into sub-clients with `with_aws` and
//! `with_ocm`; each is built once. The execution mode is decided here, at
//! construction, from the config and the `--govcloud` flag, and never
//! changes afterwards. Command runners defer `cleanup`.

use crate::aws::{AwsClient, Creator};
use crate::config::{self, Config};
use crate::error::{Error, Result};
use crate::gate::{self, CapabilitySet, OperationProfile};
use crate::ocm::clusters::ClusterKey;
use crate::ocm::types::Cluster;
use crate::ocm::OcmClient;
use crate::reporter::Reporter;
use tokio_util::sync::CancellationToken;

/// Execution mode, decided once per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    FedRamp,
}

/// The universal flags every command shares.
#[derive(Debug, Clone, Default)]
pub struct RuntimeOptions {
    pub cluster: Option<String>,
    pub profile: Option<String>,
    pub region: Option<String>,
    pub govcloud: bool,
}

pub struct Runtime {
    pub reporter: Reporter,
    options: RuntimeOptions,
    mode: Mode,
    config: Config,
    ocm: Option<OcmClient>,
    aws: Option<AwsClient>,
    creator: Option<Creator>,
    cancel: CancellationToken,
    cleaned: bool,
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("reporter", &self.reporter)
            .field("options", &self.options)
            .field("mode", &self.mode)
            .field("config", &self.config)
            .field("ocm", &self.ocm.is_some())
            .field("aws", &self.aws.is_some())
            .field("creator", &self.creator)
            .field("cancel", &self.cancel)
            .field("cleaned", &self.cleaned)
            .finish()
    }
}

impl Runtime {
    /// Load the config and decide the mode. Fails when the user has never
    /// logged in. Installs a Ctrl-C watcher that cancels every polling
    /// loop derived from this runtime.
    pub fn new(options: RuntimeOptions) -> Result<Self> {
        let config = config::load()?.ok_or(Error::NotLoggedIn)?;
        let mode = if config.fedramp || options.govcloud {
            Mode::FedRamp
        } else {
            Mode::Normal
        };
        let cancel = CancellationToken::new();
        spawn_signal_watcher(cancel.clone());
        Ok(Self {
            reporter: Reporter::new(),
            options,
            mode,
            config,
            ocm: None,
            aws: None,
            creator: None,
            cancel,
            cleaned: false,
        })
    }

    /// Build the OCM connection, validating and persisting tokens.
    pub async fn with_ocm(mut self) -> Result<Self> {
        if self.ocm.is_none() {
            let client = OcmClient::builder()
                .config(self.config.clone())
                .reporter(self.reporter)
                .govcloud(self.options.govcloud)
                .build()
                .await?;
            self.ocm = Some(client);
        }
        Ok(self)
    }

    /// Build the AWS sub-client and resolve the caller identity.
    pub async fn with_aws(mut self) -> Result<Self> {
        if self.aws.is_none() {
            let aws = AwsClient::new(
                self.options.profile.as_deref(),
                self.options.region.as_deref(),
            )
            .await?;
            let creator = aws.creator().await?;
            self.reporter
                .debug(format!("Using caller identity '{}'", creator.arn));
            self.aws = Some(aws);
            self.creator = Some(creator);
        }
        Ok(self)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn ocm(&self) -> Result<&OcmClient> {
        self.ocm.as_ref().ok_or_else(|| Error::Server {
            message: "the OCM connection is not initialized; this is a bug in the command setup"
                .to_string(),
            operation_id: None,
        })
    }

    pub fn aws(&self) -> Result<&AwsClient> {
        self.aws.as_ref().ok_or_else(|| Error::Server {
            message: "the AWS client is not initialized; this is a bug in the command setup"
                .to_string(),
            operation_id: None,
        })
    }

    pub fn creator(&self) -> Result<&Creator> {
        self.creator.as_ref().ok_or_else(|| Error::Server {
            message: "the caller identity is not resolved; this is a bug in the command setup"
                .to_string(),
            operation_id: None,
        })
    }

    /// Normalize and validate the `--cluster` argument.
    pub fn cluster_key(&self) -> Result<ClusterKey> {
        let raw = self
            .options
            .cluster
            .as_deref()
            .ok_or_else(|| Error::InvalidInput {
                message: "the --cluster flag is required for this command".to_string(),
            })?;
        ClusterKey::parse(raw)
    }

    /// Resolve the `--cluster` argument to exactly one cluster owned by the
    /// caller.
    pub async fn fetch_cluster(&self) -> Result<Cluster> {
        let key = self.cluster_key()?;
        let creator = self.creator()?;
        self.reporter.debug(format!("Loading cluster '{}'", key));
        self.ocm()?.cluster_by_key(&key, creator).await
    }

    /// Evaluate the precondition gate for an operation on a resolved
    /// cluster. Capability flags are fetched (and cached) only when the
    /// profile needs them.
    pub async fn gate(&self, cluster: &Cluster, profile: &OperationProfile) -> Result<()> {
        let capabilities = if profile.capability.is_some() {
            self.ocm()?.capabilities().await?.clone()
        } else {
            CapabilitySet::default()
        };
        gate::check(cluster, self.mode, &capabilities, profile)
    }

    /// Tear down the runtime: close the OCM connection and flush token
    /// persistence. Safe to call more than once.
    pub fn cleanup(&mut self) {
        if self.cleaned {
            return;
        }
        self.cleaned = true;
        if let Some(ocm) = self.ocm.take() {
            if let Err(err) = ocm.close() {
                self.reporter
                    .debug(format!("failed to close the OCM connection: {}", err));
            }
        }
    }
}

fn spawn_signal_watcher(cancel: CancellationToken) {
    // Runtime construction happens inside the async main; the guard keeps
    // unit tests that run outside a reactor working.
    if let Ok(handle) = tokio::runtime::Handle::try_current() {
        handle.spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }
}
