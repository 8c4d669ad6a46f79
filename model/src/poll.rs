//! The polling engine shared by every long-running workflow.
//!
//! Each workflow is an initial request, a loop until a terminal phase or a
//! deadline, and a final result. They all run through [`drive`] so that
//! cancellation, deadlines, and the sleep cadence behave identically. The
//! only suspension points are the sleeps between attempts; each attempt's
//! HTTP calls are sequential within it.

use crate::aws::Creator;
use crate::constants::{INSTALLER_WAIT_DEADLINE, INSTALLER_WAIT_INTERVAL};
use crate::error::{Error, Result};
use crate::ocm::OcmClient;
use crate::reporter::Reporter;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// What a polling step observed: a final result, or the state to carry into
/// the next round.
pub enum Progress<T, S> {
    Done(T),
    Pending(S),
}

#[derive(Debug, Clone, Copy)]
pub struct PollSpec {
    pub interval: Duration,
    /// `None` polls until a terminal phase with no overall deadline.
    pub deadline: Option<Duration>,
}

/// Run a polling loop: call `step` immediately, then sleep `interval`
/// between further attempts until it reports `Done`, the deadline elapses,
/// or the caller cancels. On timeout, `timeout_message` renders the last
/// observed state into the error. Cancellation is honored at the top of
/// every iteration and during the sleep.
pub async fn drive<S, T, F, Fut>(
    spec: PollSpec,
    cancel: &CancellationToken,
    mut state: S,
    timeout_message: impl Fn(&S) -> String,
    mut step: F,
) -> Result<T>
where
    F: FnMut(S) -> Fut,
    Fut: Future<Output = Result<Progress<T, S>>>,
{
    let deadline = spec.deadline.map(|d| tokio::time::Instant::now() + d);
    loop {
        if cancel.is_cancelled() {
            return Err(Error::UserAbort);
        }
        match step(state).await? {
            Progress::Done(value) => return Ok(value),
            Progress::Pending(next) => {
                if let Some(deadline) = deadline {
                    if tokio::time::Instant::now() >= deadline {
                        return Err(Error::Timeout {
                            message: timeout_message(&next),
                        });
                    }
                }
                state = next;
            }
        }
        tokio::select! {
            _ = cancel.cancelled() => return Err(Error::UserAbort),
            _ = tokio::time::sleep(spec.interval) => {}
        }
    }
}

/// W1: serialize non-STS installs per account. The backend cannot install
/// two clusters whose creator ARN maps to the same account at once, so
/// creation waits until no pending non-STS cluster remains for the caller.
pub async fn wait_for_install_slot(
    ocm: &OcmClient,
    reporter: &Reporter,
    creator: &Creator,
    cancel: &CancellationToken,
) -> Result<()> {
    let spec = PollSpec {
        interval: INSTALLER_WAIT_INTERVAL,
        deadline: Some(INSTALLER_WAIT_DEADLINE),
    };
    drive(
        spec,
        cancel,
        String::new(),
        |pending_id| {
            format!(
                "Timeout waiting for the cluster '{}' installation. Try again in a few minutes",
                pending_id
            )
        },
        move |_| async move {
            match ocm.pending_cluster_for_creator(creator).await? {
                None => Ok(Progress::Done(())),
                Some(cluster) => {
                    reporter.info(format!(
                        "Waiting for cluster '{}' with the same creator ARN to start installing",
                        cluster.id
                    ));
                    Ok(Progress::Pending(cluster.id))
                }
            }
        },
    )
    .await
}
