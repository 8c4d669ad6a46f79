use aws_sdk_iam::error::CreateAccessKeyError;
use aws_sdk_sts::error::GetCallerIdentityError;
use aws_sdk_sts::types::SdkError;
use reqwest::StatusCode;
use serde::Deserialize;
use snafu::Snafu;
use std::path::PathBuf;

/// The `Result` type returned by `rosa-model`.
pub type Result<T> = std::result::Result<T, Error>;

/// The normalized error taxonomy. Every failure that can reach a command
/// runner is one of these variants; `Error::kind` projects onto the small
/// kind set used for exit-code decisions.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
#[allow(clippy::large_enum_variant)]
pub enum Error {
    #[snafu(display("{}", message))]
    NotFound { message: String },

    #[snafu(display("{}", message))]
    Conflict { message: String },

    #[snafu(display("{}", message))]
    Unauthorized { message: String },

    #[snafu(display("{}", message))]
    Forbidden { message: String },

    #[snafu(display("{}", message))]
    InvalidInput { message: String },

    #[snafu(display("{}", message))]
    Precondition { message: String },

    #[snafu(display("{}", message))]
    Timeout { message: String },

    #[snafu(display("Can't reach the API gateway: {}", source))]
    Network { source: reqwest::Error },

    #[snafu(display("{}{}", message, operation_id_suffix(operation_id)))]
    Server {
        message: String,
        operation_id: Option<String>,
    },

    #[snafu(display("Interrupted by the user"))]
    UserAbort,

    #[snafu(display("Not logged in, run the 'rosa login' command"))]
    NotLoggedIn,

    #[snafu(display("Failed to read config file '{}': {}", path.display(), source))]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Failed to write config file '{}': {}", path.display(), source))]
    ConfigWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Failed to parse config file '{}': {}", path.display(), source))]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[snafu(display("Can't find a home directory for the config file"))]
    NoHomeDir,

    #[snafu(display(
        "Your authorization tokens are malformed. Please login again: {}",
        source
    ))]
    MalformedToken {
        source: jsonwebtoken::errors::Error,
    },

    #[snafu(display("Invalid API gateway URL '{}': {}", url, source))]
    InvalidEndpoint {
        url: String,
        source: url::ParseError,
    },

    #[snafu(display("Failed to parse response from the API gateway: {}", source))]
    ResponseParse { source: reqwest::Error },

    #[snafu(display("Failed to get caller identity: {}", source))]
    CallerIdentity {
        source: SdkError<GetCallerIdentityError>,
    },

    #[snafu(display("{} was missing from {}", what, from))]
    Missing { what: String, from: String },

    #[snafu(display("Failed to create access key for user '{}': {}", user_name, source))]
    AccessKeys {
        user_name: String,
        source: SdkError<CreateAccessKeyError>,
    },
}

/// The kind a failure classifies as. Command runners decide exit behavior
/// from this, never from variant internals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Unauthorized,
    Forbidden,
    InvalidInput,
    Precondition,
    Timeout,
    Network,
    Server,
    UserAbort,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Conflict { .. } => ErrorKind::Conflict,
            Error::Unauthorized { .. } | Error::NotLoggedIn | Error::MalformedToken { .. } => {
                ErrorKind::Unauthorized
            }
            Error::Forbidden { .. } | Error::AccessKeys { .. } => ErrorKind::Forbidden,
            Error::InvalidInput { .. }
            | Error::ConfigRead { .. }
            | Error::ConfigWrite { .. }
            | Error::ConfigParse { .. }
            | Error::NoHomeDir
            | Error::InvalidEndpoint { .. } => ErrorKind::InvalidInput,
            Error::Precondition { .. } => ErrorKind::Precondition,
            Error::Timeout { .. } => ErrorKind::Timeout,
            Error::Network { .. } | Error::CallerIdentity { .. } => ErrorKind::Network,
            Error::Server { .. } | Error::ResponseParse { .. } | Error::Missing { .. } => {
                ErrorKind::Server
            }
            Error::UserAbort => ErrorKind::UserAbort,
        }
    }
}

/// The error body returned by the control plane for non-2xx responses.
#[derive(Debug, Default, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub operation_id: Option<String>,
}

const TERMS_MESSAGE: &str = "You must accept the Terms and Conditions in order to continue.\n\
     Go to https://www.redhat.com/wapps/tnc/ackrequired?site=ocm&event=register\n\
     Once you accept the terms, you will need to retry the action that was blocked.";

/// Single classification point for control-plane failures: maps an HTTP
/// status and the (optional) typed error body onto the taxonomy.
pub fn classify(status: StatusCode, api: Option<ApiError>) -> Error {
    let reason = api
        .as_ref()
        .map(|a| a.reason.clone())
        .filter(|r| !r.is_empty());
    let operation_id = api.as_ref().and_then(|a| a.operation_id.clone());

    if let Some(api) = &api {
        if api.code == "CLUSTERS-MGMT-451" {
            return Error::InvalidInput {
                message: TERMS_MESSAGE.to_string(),
            };
        }
    }

    match status {
        StatusCode::UNAUTHORIZED => Error::Unauthorized {
            message: reason.unwrap_or_else(|| "login required or expired".to_string()),
        },
        StatusCode::FORBIDDEN => Error::Forbidden {
            message: reason
                .unwrap_or_else(|| "the server refused this operation for your account".to_string()),
        },
        StatusCode::NOT_FOUND => Error::NotFound {
            message: reason.unwrap_or_else(|| "the requested resource does not exist".to_string()),
        },
        StatusCode::CONFLICT => Error::Conflict {
            message: reason.unwrap_or_else(|| "the request conflicts with existing state".to_string()),
        },
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => Error::InvalidInput {
            message: reason.unwrap_or_else(|| "the server rejected the request".to_string()),
        },
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => Error::Timeout {
            message: reason.unwrap_or_else(|| format!("the server timed out ({})", status)),
        },
        _ => Error::Server {
            message: reason.unwrap_or_else(|| format!("the server returned an error ({})", status)),
            operation_id,
        },
    }
}

fn operation_id_suffix(operation_id: &Option<String>) -> String {
    match operation_id {
        Some(id) => format!(" (operation ID: '{}')", id),
        None => String::new(),
    }
}
