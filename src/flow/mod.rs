use crate::{
    action::{self, ActionExecutor, ExecutionResult, ExtensionFailurePolicy},
    context::{GrantContext, TokenFlags, TokenKind, TokenRequest},
    error::{DenyReason, Result},
    primitive::GrantType,
    scope::Scope,
    sync::LockMap,
    ClientExtractor, TokenFinalizer,
};
use compact_str::CompactString;
use indexmap::IndexMap;
use serde::Serialize;
use std::{borrow::Cow, future::Future};

pub mod authorization;
pub mod client_credentials;
pub mod password;
pub mod refresh;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum TokenType {
    Bearer,
}

/// The prospective (and eventually final) token response
///
/// `claims` is the surface pre-issuance actions are allowed to mutate;
/// it flattens into the response body on serialization.
#[derive(Clone, Debug, Serialize)]
pub struct TokenResponse<'a> {
    pub access_token: Cow<'a, str>,
    pub token_type: TokenType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<Cow<'a, str>>,
    pub expires_in: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    #[serde(flatten)]
    pub claims: IndexMap<CompactString, sonic_rs::Value>,
}

impl TokenResponse<'_> {
    #[must_use]
    pub fn into_owned(self) -> TokenResponse<'static> {
        TokenResponse {
            access_token: self.access_token.into_owned().into(),
            token_type: self.token_type,
            refresh_token: self.refresh_token.map(|token| token.into_owned().into()),
            expires_in: self.expires_in,
            scope: self.scope,
            claims: self.claims,
        }
    }
}

/// Terminal outcome of one request's trip through the pipeline
#[derive(Debug)]
pub enum Outcome<'a> {
    /// Every requested operation applied cleanly; the response is finalized
    Issued {
        response: TokenResponse<'a>,
        results: Vec<ExecutionResult>,
    },
    /// Protocol-level refusal; no token left the building
    Denied(DenyReason),
    /// Some operations failed to apply
    ///
    /// The response carries the successful operations but is NOT finalized;
    /// the caller decides whether to retry, accept, or deny. The result list
    /// is always complete, for audit.
    PartialFailure {
        response: TokenResponse<'a>,
        results: Vec<ExecutionResult>,
    },
}

impl Outcome<'_> {
    #[must_use]
    pub fn is_issued(&self) -> bool {
        matches!(self, Self::Issued { .. })
    }
}

/// The per-grant-type protocol, the extension point new grant types implement
///
/// A handler only exists after a successful [`init`](Self::init), is immutable
/// afterwards, and is shared across every request of its grant type. All
/// per-request state lives on the [`GrantContext`].
///
/// The validation operations return `Ok(false)` for protocol-level denials
/// and reserve `Err` for infrastructure failures of their backing
/// collaborators.
pub trait GrantHandler {
    type Config;

    /// One-time setup; fails when required configuration is missing or invalid
    fn init(config: Self::Config) -> Result<Self>
    where
        Self: Sized;

    fn grant_type(&self) -> GrantType;

    /// Whether clients using this grant type are confidential
    fn is_confidential_client(&self) -> Result<bool>;

    /// Whether this grant type may issue refresh tokens
    fn issue_refresh_token(&self) -> Result<bool>;

    /// Whether tokens issued by this grant type act on behalf of a user
    fn is_of_type_application_user(&self) -> Result<bool>;

    /// Whether the request satisfies the structural minimum for this grant type
    fn validate_grant(
        &self,
        ctx: &mut GrantContext<'_>,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Whether the client is permitted to use this grant type at all
    fn is_authorized_client(
        &self,
        ctx: &GrantContext<'_>,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Whether the resolved resource owner is the rightful owner
    /// for the requested delegation
    fn authorize_access_delegation(
        &self,
        ctx: &GrantContext<'_>,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Narrow the requested scopes to what the client/owner is entitled to
    fn validate_scope(
        &self,
        ctx: &mut GrantContext<'_>,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Mint the prospective token response
    fn issue(
        &self,
        ctx: &mut GrantContext<'_>,
    ) -> impl Future<Output = Result<TokenResponse<'static>>> + Send;

    /// Key under which issuance for this request has to be serialized
    ///
    /// `None` is a first-class case and means "no serialization required".
    /// Grant types at risk of duplicate issuance MUST override this.
    fn sync_lock_key(&self, ctx: &GrantContext<'_>) -> Option<CompactString> {
        let _ = ctx;
        None
    }
}

/// Shared intersection check of scope validation
///
/// The granted set is the intersection of requested and entitled scopes,
/// which may be a strict subset of the request. An empty request falls back
/// to the full entitlement; a request with no entitled scope at all is a
/// denial.
pub(crate) fn narrow_scopes(ctx: &mut GrantContext<'_>, entitled: &Scope) -> bool {
    if ctx.requested_scopes.is_empty() {
        ctx.set_granted_scopes(entitled.clone());
        return true;
    }

    let granted = ctx.requested_scopes.narrow(entitled);
    if granted.is_empty() {
        debug!(client_id = ?ctx.client.client_id, "no requested scope is entitled");
        return false;
    }

    ctx.set_granted_scopes(granted);
    true
}

/// Everything the pipeline itself owns: the lock table, the action layer,
/// and the finalization backend
pub struct Pipeline<AE, TF> {
    locks: LockMap,
    actions: AE,
    finalizer: TF,
    extension_failures: ExtensionFailurePolicy,
}

impl<AE, TF> Pipeline<AE, TF>
where
    AE: ActionExecutor,
    TF: TokenFinalizer,
{
    pub fn new(actions: AE, finalizer: TF, extension_failures: ExtensionFailurePolicy) -> Self {
        Self {
            locks: LockMap::new(),
            actions,
            finalizer,
            extension_failures,
        }
    }

    /// Drive one request through the issuance protocol
    ///
    /// The validation steps run strictly in order and short-circuit: any
    /// `false` yields a [`Outcome::Denied`] without executing later steps,
    /// so scope validation never runs against an unauthorized delegation
    /// and `issue` never runs for a denied request.
    #[instrument(skip_all, fields(client_id = %ctx.client.client_id, grant_type = %ctx.grant_type))]
    pub async fn run<H>(&self, handler: &H, mut ctx: GrantContext<'_>) -> Result<Outcome<'static>>
    where
        H: GrantHandler,
    {
        let _guard = match handler.sync_lock_key(&ctx) {
            Some(key) => Some(self.locks.acquire(&key).await?),
            None => None,
        };

        let kind = if handler.is_of_type_application_user()? {
            TokenKind::ApplicationUser
        } else {
            TokenKind::Application
        };
        ctx.set_flags(TokenFlags {
            confidential_client: handler.is_confidential_client()?,
            issue_refresh_token: handler.issue_refresh_token()?,
            kind,
        });

        if !handler.validate_grant(&mut ctx).await? {
            debug!("grant validation failed");
            return Ok(Outcome::Denied(DenyReason::InvalidGrant));
        }
        if !handler.is_authorized_client(&ctx).await? {
            debug!("client not authorized for this grant type");
            return Ok(Outcome::Denied(DenyReason::UnauthorizedClient));
        }
        if !handler.authorize_access_delegation(&ctx).await? {
            debug!("delegation not authorized");
            return Ok(Outcome::Denied(DenyReason::AccessDenied));
        }
        if !handler.validate_scope(&mut ctx).await? {
            debug!("requested scope exceeds entitlement");
            return Ok(Outcome::Denied(DenyReason::InvalidScope));
        }

        let mut response = handler.issue(&mut ctx).await?;

        let operations = match self.actions.execute(&ctx, &response).await {
            Ok(operations) => operations,
            Err(error) => match self.extension_failures {
                ExtensionFailurePolicy::Record => {
                    warn!(?error, "action executor failed; proceeding without operations");
                    Vec::new()
                }
                ExtensionFailurePolicy::Abort => {
                    error!(?error, "action executor failed; aborting issuance");
                    return Ok(Outcome::Denied(DenyReason::ExtensionFailure));
                }
            },
        };

        let results = action::apply(&mut response, operations);
        if results.iter().any(ExecutionResult::is_failure) {
            return Ok(Outcome::PartialFailure { response, results });
        }

        self.finalizer.finalize(&ctx, &mut response).await?;
        debug!("token successfully issued");

        Ok(Outcome::Issued { response, results })
    }
}

/// One initialized handler per supported grant type
pub struct Impls<AC, CC, PW, RT, CE> {
    pub authorization: AC,
    pub client_credentials: CC,
    pub password: PW,
    pub refresh: RT,
    pub client_extractor: CE,
}

/// Route a token request to the handler for its grant type
#[instrument(skip_all, fields(grant_type = %req.grant_type))]
pub async fn dispatch<AC, CC, PW, RT, CE, AE, TF>(
    req: TokenRequest<'_>,
    pipeline: &Pipeline<AE, TF>,
    impls: &Impls<AC, CC, PW, RT, CE>,
) -> Result<Outcome<'static>>
where
    AC: GrantHandler,
    CC: GrantHandler,
    PW: GrantHandler,
    RT: GrantHandler,
    CE: ClientExtractor,
    AE: ActionExecutor,
    TF: TokenFinalizer,
{
    let Ok(grant_type) = req.grant_type.parse::<GrantType>() else {
        debug!("unsupported grant type");
        return Ok(Outcome::Denied(DenyReason::UnsupportedGrantType));
    };

    let Some(client) = impls
        .client_extractor
        .extract(req.client_id, req.client_secret)
        .await?
    else {
        debug!(client_id = ?req.client_id, "unknown client or bad secret");
        return Ok(Outcome::Denied(DenyReason::InvalidClient));
    };

    let requested_scopes = req
        .scope
        .map(|scope| scope.parse::<Scope>().unwrap())
        .unwrap_or_default();
    let ctx = GrantContext::new(client.into_owned(), grant_type, requested_scopes, req.params);

    match grant_type {
        GrantType::AuthorizationCode => pipeline.run(&impls.authorization, ctx).await,
        GrantType::ClientCredentials => pipeline.run(&impls.client_credentials, ctx).await,
        GrantType::Password => pipeline.run(&impls.password, ctx).await,
        GrantType::RefreshToken => pipeline.run(&impls.refresh, ctx).await,
    }
}
