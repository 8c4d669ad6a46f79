/*!

This library is the middle layer of the `rosa` command line interface: the
session config store, the OCM connection with its token handling, the AWS
caller-identity probe, the cluster resolver, the precondition gate, the
polling coordinator, and the `Runtime` value that composes them for the
command runners.

!*/

pub use config::Config;
pub use error::{classify, ApiError, Error, ErrorKind, Result};
pub use gate::{CapabilitySet, ControlPlane, OperationProfile};
pub use ocm::clusters::{ClusterKey, KeyPath};
pub use ocm::types::{Cluster, ClusterState};
pub use ocm::OcmClient;
pub use reporter::Reporter;
pub use runtime::{Mode, Runtime, RuntimeOptions};
pub use token::TokenManager;

pub mod aws;
pub mod config;
pub mod constants;
mod error;
pub mod gate;
pub mod ocm;
pub mod poll;
mod reporter;
pub mod runtime;
pub mod token;

#[cfg(test)]
pub(crate) mod test_util {
    use crate::constants::ENV_CONFIG;
    use lazy_static::lazy_static;
    use std::path::PathBuf;
    use std::sync::{Mutex, MutexGuard, PoisonError};

    lazy_static! {
        // Tests mutate the OCM_CONFIG environment variable; serialize them.
        static ref ENV_LOCK: Mutex<()> = Mutex::new(());
    }

    /// Points `OCM_CONFIG` at a fresh temp directory for the guard's
    /// lifetime, holding the env lock so tests cannot interleave.
    pub(crate) struct TempConfigEnv {
        _guard: MutexGuard<'static, ()>,
        _dir: tempfile::TempDir,
        pub path: PathBuf,
    }

    impl TempConfigEnv {
        pub(crate) fn new() -> Self {
            let guard = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
            let dir = tempfile::tempdir().expect("failed to create temp dir");
            let path = dir.path().join("ocm.json");
            std::env::set_var(ENV_CONFIG, &path);
            Self {
                _guard: guard,
                _dir: dir,
                path,
            }
        }
    }

    impl Drop for TempConfigEnv {
        fn drop(&mut self) {
            std::env::remove_var(ENV_CONFIG);
        }
    }

    pub(crate) fn with_temp_config<F: FnOnce(&std::path::Path)>(f: F) {
        let env = TempConfigEnv::new();
        f(&env.path);
    }

    /// Build a JWT with the given claims and an unverifiable signature.
    /// Claims are the only thing the crate ever reads from a token.
    pub(crate) fn test_jwt(exp: i64, scope: Option<&str>) -> String {
        let header = r#"{"alg":"RS256","typ":"JWT"}"#;
        let mut claims = serde_json::json!({ "exp": exp });
        if let Some(scope) = scope {
            claims["scope"] = serde_json::Value::String(scope.to_string());
        }
        format!(
            "{}.{}.c2ln",
            base64::encode_config(header, base64::URL_SAFE_NO_PAD),
            base64::encode_config(claims.to_string(), base64::URL_SAFE_NO_PAD)
        )
    }
}
