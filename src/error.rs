use serde::Serialize;
use strum::{AsRefStr, Display};
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Infrastructure-level failures
///
/// Protocol-level negative outcomes are values ([`DenyReason`]), never errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Handler initialization failed")]
    Initialization(#[source] BoxError),

    #[error("Policy source unreachable")]
    PolicyResolution(#[source] BoxError),

    #[error("Grant validation backend failed")]
    GrantValidation(#[source] BoxError),

    #[error("Action executor failed")]
    ActionExecution(#[source] BoxError),

    #[error("Token issuance backend failed")]
    Issuance(#[source] BoxError),

    #[error("Sync lock table poisoned")]
    SyncPoisoned,
}

impl Error {
    #[track_caller]
    pub fn initialization(err: impl Into<BoxError>) -> Self {
        Self::Initialization(err.into())
    }

    #[track_caller]
    pub fn policy_resolution(err: impl Into<BoxError>) -> Self {
        Self::PolicyResolution(err.into())
    }

    #[track_caller]
    pub fn grant_validation(err: impl Into<BoxError>) -> Self {
        Self::GrantValidation(err.into())
    }

    #[track_caller]
    pub fn action_execution(err: impl Into<BoxError>) -> Self {
        Self::ActionExecution(err.into())
    }

    #[track_caller]
    pub fn issuance(err: impl Into<BoxError>) -> Self {
        Self::Issuance(err.into())
    }
}

/// Why the pipeline refused to issue a token
///
/// Serializes to the RFC 6749 error codes so the protocol-compliance
/// layer can forward it verbatim.
#[derive(AsRefStr, Clone, Copy, Debug, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DenyReason {
    InvalidClient,
    InvalidGrant,
    UnauthorizedClient,
    AccessDenied,
    InvalidScope,
    UnsupportedGrantType,
    ExtensionFailure,
}
