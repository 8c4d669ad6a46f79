use std::time::Duration;

// API endpoints
pub const DEFAULT_URL: &str = "https://api.openshift.com";
pub const FEDRAMP_URL: &str = "https://api.openshiftusgov.com";
pub const DEFAULT_TOKEN_URL: &str =
    "https://sso.redhat.com/auth/realms/redhat-external/protocol/openid-connect/token";

// Agent string sent with every request, completed at runtime with the
// version of this crate.
pub const DEFAULT_USER_AGENT: &str = "rosa";

// Environment variables
pub const ENV_CONFIG: &str = "OCM_CONFIG";
pub const ENV_AWS_PROFILE: &str = "AWS_PROFILE";

// Reserved cluster property keys
pub const CREATOR_ARN_PROPERTY: &str = "rosa_creator_arn";
pub const CLI_VERSION_PROPERTY: &str = "rosa_cli_version";

// Per-organization capability flags
pub const HIBERNATE_CAPABILITY: &str = "capability.organization.hibernate_cluster";

// Cluster names must be valid DNS-1035 labels; anything longer than this is
// an identifier, never a name.
pub const MAX_CLUSTER_NAME_LENGTH: usize = 15;

// The IAM user whose access keys are embedded in non-STS create requests.
pub const ADMIN_USER_NAME: &str = "osdCcsAdmin";

pub const DEFAULT_REGION: &str = "us-east-1";

// Tokens handed to the SDK must remain valid at least this long.
pub const TOKEN_MIN_VALIDITY: Duration = Duration::from_secs(10 * 60);

// Default page size for list operations; -1 asks the server for its maximum.
pub const DEFAULT_PAGE_SIZE: i64 = 100;

// Polling cadence
pub const INSTALLER_WAIT_INTERVAL: Duration = Duration::from_secs(30);
pub const INSTALLER_WAIT_DEADLINE: Duration = Duration::from_secs(5 * 60);
pub const NETWORK_VERIFY_INTERVAL: Duration = Duration::from_secs(5);
pub const BREAK_GLASS_POLL_INTERVAL: Duration = Duration::from_secs(200);
pub const BREAK_GLASS_POLL_DEADLINE: Duration = Duration::from_secs(60 * 60);
