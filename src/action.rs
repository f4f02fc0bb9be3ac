use crate::{context::GrantContext, error::Result, flow::TokenResponse};
use compact_str::CompactString;
use serde::Serialize;
use std::future::Future;
use strum::{AsRefStr, Display};

/// Response fields extensions may not touch
const RESERVED_FIELDS: &[&str] = &[
    "access_token",
    "token_type",
    "refresh_token",
    "expires_in",
    "scope",
];

/// One mutation an extension wants applied to the prospective token response
#[derive(Clone, Debug, Serialize)]
pub struct PerformableOperation {
    pub kind: OperationKind,
    pub path: CompactString,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<sonic_rs::Value>,
}

#[derive(AsRefStr, Clone, Copy, Debug, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OperationKind {
    Add,
    Remove,
    Replace,
}

#[derive(AsRefStr, Clone, Copy, Debug, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OperationStatus {
    Success,
    Failure,
}

/// The outcome of applying a single [`PerformableOperation`]
///
/// Exactly one of these exists per operation attempted, in operation order,
/// so failures can be attributed. Handed to auditing collaborators verbatim.
#[derive(Clone, Debug, Serialize)]
pub struct ExecutionResult {
    pub operation: PerformableOperation,
    pub status: OperationStatus,
    pub message: CompactString,
}

impl ExecutionResult {
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.status == OperationStatus::Failure
    }
}

/// Runs registered pre-issuance actions against the prospective response
///
/// The core treats this as an opaque step. Whether a failure here aborts
/// issuance is deployment policy, see [`ExtensionFailurePolicy`].
pub trait ActionExecutor {
    fn execute(
        &self,
        ctx: &GrantContext<'_>,
        response: &TokenResponse<'_>,
    ) -> impl Future<Output = Result<Vec<PerformableOperation>>> + Send;
}

/// Executor for deployments without registered actions
#[derive(Clone, Copy, Default)]
pub struct NoActions;

impl ActionExecutor for NoActions {
    async fn execute(
        &self,
        _ctx: &GrantContext<'_>,
        _response: &TokenResponse<'_>,
    ) -> Result<Vec<PerformableOperation>> {
        Ok(Vec::new())
    }
}

/// What to do when the action executor itself fails
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ExtensionFailurePolicy {
    /// Fail open: proceed with zero operations, record the failure in the logs
    #[default]
    Record,
    /// Fail closed: abort issuance with a denial
    Abort,
}

/// Apply `operations` to `response` in sequence order
///
/// A failed operation leaves the response untouched and is recorded as a
/// [`OperationStatus::Failure`] with a message describing the cause. The
/// returned list always has exactly one entry per operation, in order.
pub fn apply(
    response: &mut TokenResponse<'_>,
    operations: Vec<PerformableOperation>,
) -> Vec<ExecutionResult> {
    operations
        .into_iter()
        .map(|operation| {
            let (status, message) = match apply_one(response, &operation) {
                Ok(()) => (OperationStatus::Success, CompactString::default()),
                Err(message) => {
                    debug!(kind = %operation.kind, path = %operation.path, %message, "operation rejected");
                    (OperationStatus::Failure, message)
                }
            };

            ExecutionResult {
                operation,
                status,
                message,
            }
        })
        .collect()
}

fn apply_one(
    response: &mut TokenResponse<'_>,
    operation: &PerformableOperation,
) -> Result<(), CompactString> {
    if RESERVED_FIELDS.contains(&operation.path.as_str()) {
        return Err(CompactString::const_new("protected field"));
    }

    match operation.kind {
        OperationKind::Add => {
            let Some(ref value) = operation.value else {
                return Err(CompactString::const_new("missing value"));
            };
            if response.claims.contains_key(&operation.path) {
                return Err(CompactString::const_new("conflicting claim"));
            }

            response.claims.insert(operation.path.clone(), value.clone());
        }
        OperationKind::Replace => {
            let Some(ref value) = operation.value else {
                return Err(CompactString::const_new("missing value"));
            };
            let Some(slot) = response.claims.get_mut(&operation.path) else {
                return Err(CompactString::const_new("no such claim"));
            };

            *slot = value.clone();
        }
        OperationKind::Remove => {
            if response.claims.shift_remove(&operation.path).is_none() {
                return Err(CompactString::const_new("no such claim"));
            }
        }
    }

    Ok(())
}
