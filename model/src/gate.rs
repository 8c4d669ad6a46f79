//! The precondition gate applied before every mutating operation.
//!
//! The gate is a pure function over the resolved cluster, the execution
//! mode, the organization's capability flags, and a per-operation profile.
//! It performs no I/O; capability lookup happens once per Runtime and the
//! cached set is passed in.

use crate::error::{Error, Result};
use crate::ocm::types::{Cluster, ClusterState};
use crate::runtime::Mode;
use std::collections::BTreeMap;

/// Per-organization feature flags, cached for the life of a Runtime.
#[derive(Debug, Clone, Default)]
pub struct CapabilitySet(BTreeMap<String, bool>);

impl CapabilitySet {
    pub fn enabled(&self, name: &str) -> bool {
        self.0.get(name).copied().unwrap_or(false)
    }

    pub fn insert(&mut self, name: impl Into<String>, enabled: bool) {
        self.0.insert(name.into(), enabled);
    }
}

impl FromIterator<(String, bool)> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = (String, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Which control-plane flavors an operation supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPlane {
    Any,
    ClassicOnly,
    HostedOnly,
}

/// The decision inputs for one operation class. Profiles are consts; the
/// same profile is shared by every command that performs the operation.
#[derive(Debug, Clone, Copy)]
pub struct OperationProfile {
    pub name: &'static str,
    /// Cluster states the operation may run in.
    pub allowed_states: &'static [ClusterState],
    pub control_plane: ControlPlane,
    /// Capability that must be enabled for the organization, if any.
    pub capability: Option<&'static str>,
    /// Refusal message when running in FedRAMP mode, if the operation is
    /// not supported on GovCloud.
    pub fedramp_block: Option<&'static str>,
}

/// States in which most mutations are allowed.
pub const READY_OR_HIBERNATING: &[ClusterState] =
    &[ClusterState::Ready, ClusterState::Hibernating];

/// States for operations that need a live control plane.
pub const READY: &[ClusterState] = &[ClusterState::Ready];

/// States in which read-only status inspection makes sense.
pub const STATUS_READ: &[ClusterState] = &[
    ClusterState::Ready,
    ClusterState::Error,
    ClusterState::Hibernating,
    ClusterState::Installing,
    ClusterState::Uninstalling,
];

pub mod profiles {
    use super::*;
    use crate::constants::HIBERNATE_CAPABILITY;

    const GOVCLOUD_LOG_FORWARDING: &str = "log forwarding is not supported on Govcloud";

    macro_rules! profile {
        ($const_name:ident, $name:literal, $states:expr, $cp:expr, $cap:expr, $fedramp:expr) => {
            pub const $const_name: OperationProfile = OperationProfile {
                name: $name,
                allowed_states: $states,
                control_plane: $cp,
                capability: $cap,
                fedramp_block: $fedramp,
            };
        };
    }

    profile!(DESCRIBE_CLUSTER, "describe-cluster", STATUS_READ, ControlPlane::Any, None, None);
    profile!(EDIT_CLUSTER, "edit-cluster", READY_OR_HIBERNATING, ControlPlane::Any, None, None);
    profile!(DELETE_CLUSTER, "delete-cluster", STATUS_READ, ControlPlane::Any, None, None);
    profile!(
        HIBERNATE_CLUSTER,
        "hibernate-cluster",
        READY,
        ControlPlane::ClassicOnly,
        Some(HIBERNATE_CAPABILITY),
        None
    );
    profile!(
        RESUME_CLUSTER,
        "resume-cluster",
        &[ClusterState::Hibernating],
        ControlPlane::ClassicOnly,
        Some(HIBERNATE_CAPABILITY),
        None
    );
    profile!(EDIT_MACHINE_POOL, "edit-machine-pool", READY_OR_HIBERNATING, ControlPlane::Any, None, None);
    profile!(CREATE_IDP, "create-idp", READY, ControlPlane::Any, None, None);
    profile!(DELETE_IDP, "delete-idp", READY, ControlPlane::Any, None, None);
    profile!(EDIT_USERS, "edit-users", READY, ControlPlane::Any, None, None);
    profile!(EDIT_INGRESS, "edit-ingress", READY_OR_HIBERNATING, ControlPlane::Any, None, None);
    profile!(EDIT_ADDON, "edit-addon", READY, ControlPlane::Any, None, None);
    profile!(SCHEDULE_UPGRADE, "schedule-upgrade", READY, ControlPlane::Any, None, None);
    profile!(
        SCHEDULE_NODE_POOL_UPGRADE,
        "schedule-node-pool-upgrade",
        READY,
        ControlPlane::HostedOnly,
        None,
        None
    );
    profile!(
        CREATE_BREAK_GLASS_CREDENTIAL,
        "create-break-glass-credential",
        READY,
        ControlPlane::HostedOnly,
        None,
        None
    );
    profile!(
        DESCRIBE_BREAK_GLASS_CREDENTIAL,
        "describe-break-glass-credential",
        STATUS_READ,
        ControlPlane::HostedOnly,
        None,
        None
    );
    profile!(
        CREATE_LOG_FORWARDER,
        "create-log-forwarder",
        READY,
        ControlPlane::Any,
        None,
        Some(GOVCLOUD_LOG_FORWARDING)
    );
    profile!(
        DELETE_LOG_FORWARDER,
        "delete-log-forwarder",
        READY,
        ControlPlane::Any,
        None,
        Some(GOVCLOUD_LOG_FORWARDING)
    );
    profile!(
        LIST_LOG_FORWARDERS,
        "list-log-forwarders",
        STATUS_READ,
        ControlPlane::Any,
        None,
        Some(GOVCLOUD_LOG_FORWARDING)
    );
}

/// Evaluate the gate. Checks run in a fixed order: cluster state, FedRAMP
/// compatibility, capability, control-plane constraint. The first failing
/// check decides the error.
pub fn check(
    cluster: &Cluster,
    mode: Mode,
    capabilities: &CapabilitySet,
    profile: &OperationProfile,
) -> Result<()> {
    if !profile.allowed_states.contains(&cluster.state) {
        return Err(Error::Precondition {
            message: format!(
                "Cluster '{}' is not yet ready. Current state is '{}'",
                cluster.name, cluster.state
            ),
        });
    }

    if mode == Mode::FedRamp {
        if let Some(message) = profile.fedramp_block {
            return Err(Error::InvalidInput {
                message: message.to_string(),
            });
        }
    }

    if let Some(capability) = profile.capability {
        if !capabilities.enabled(capability) {
            return Err(Error::Forbidden {
                message: format!(
                    "The '{}' capability is not set for your organization",
                    capability
                ),
            });
        }
    }

    match profile.control_plane {
        ControlPlane::Any => {}
        ControlPlane::HostedOnly if !cluster.hosted_cp() => {
            return Err(Error::InvalidInput {
                message: format!(
                    "The '{}' operation is only supported for Hosted Control Plane clusters",
                    profile.name
                ),
            });
        }
        ControlPlane::ClassicOnly if cluster.hosted_cp() => {
            return Err(Error::InvalidInput {
                message: format!(
                    "The '{}' operation is not supported for Hosted Control Plane clusters",
                    profile.name
                ),
            });
        }
        _ => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::HIBERNATE_CAPABILITY;
    use crate::ErrorKind;

    fn cluster(name: &str, state: ClusterState, hosted: bool) -> Cluster {
        Cluster {
            id: "abc123".to_string(),
            name: name.to_string(),
            state,
            hypershift: crate::ocm::types::Hypershift { enabled: hosted },
            ..Default::default()
        }
    }

    fn caps(pairs: &[(&str, bool)]) -> CapabilitySet {
        pairs
            .iter()
            .map(|(name, enabled)| (name.to_string(), *enabled))
            .collect()
    }

    #[test]
    fn mutation_on_installing_cluster_is_refused() {
        let err = check(
            &cluster("mycluster", ClusterState::Installing, false),
            Mode::Normal,
            &CapabilitySet::default(),
            &profiles::DELETE_LOG_FORWARDER,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert!(err.to_string().contains("is not yet ready"));
        assert!(err.to_string().contains("mycluster"));
    }

    #[test]
    fn log_forwarding_is_blocked_on_govcloud() {
        let err = check(
            &cluster("mycluster", ClusterState::Ready, false),
            Mode::FedRamp,
            &CapabilitySet::default(),
            &profiles::CREATE_LOG_FORWARDER,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(err.to_string(), "log forwarding is not supported on Govcloud");
    }

    #[test]
    fn hibernate_requires_the_capability() {
        let ready = cluster("mycluster", ClusterState::Ready, false);
        let err = check(
            &ready,
            Mode::Normal,
            &CapabilitySet::default(),
            &profiles::HIBERNATE_CLUSTER,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        check(
            &ready,
            Mode::Normal,
            &caps(&[(HIBERNATE_CAPABILITY, true)]),
            &profiles::HIBERNATE_CLUSTER,
        )
        .unwrap();
    }

    #[test]
    fn break_glass_is_hosted_only() {
        let err = check(
            &cluster("mycluster", ClusterState::Ready, false),
            Mode::Normal,
            &CapabilitySet::default(),
            &profiles::CREATE_BREAK_GLASS_CREDENTIAL,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        check(
            &cluster("mycluster", ClusterState::Ready, true),
            Mode::Normal,
            &CapabilitySet::default(),
            &profiles::CREATE_BREAK_GLASS_CREDENTIAL,
        )
        .unwrap();
    }

    #[test]
    fn hibernate_is_classic_only() {
        let err = check(
            &cluster("mycluster", ClusterState::Ready, true),
            Mode::Normal,
            &caps(&[(HIBERNATE_CAPABILITY, true)]),
            &profiles::HIBERNATE_CLUSTER,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn status_reads_are_allowed_while_installing() {
        check(
            &cluster("mycluster", ClusterState::Installing, false),
            Mode::Normal,
            &CapabilitySet::default(),
            &profiles::DESCRIBE_CLUSTER,
        )
        .unwrap();
    }
}
