use crate::{
    context::GrantContext,
    error::{Error, Result},
    flow::{self, GrantHandler, TokenResponse},
    primitive::{Authorization, GrantType},
    TokenMinter,
};
use compact_str::{format_compact, CompactString};
use std::future::Future;

/// Storage for pending authorization-code grants
pub trait Store {
    /// Load a stored grant by its code
    ///
    /// Expired or unknown codes read back as `None`.
    fn load_authorization(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<Option<Authorization<'_>>>> + Send;

    /// Invalidate a code after it minted a token. Codes are single-use.
    fn consume(&self, code: &str) -> impl Future<Output = Result<()>> + Send;
}

pub struct Config<S, M> {
    pub store: S,
    pub minter: M,
    /// Reject public clients whose stored grant carries no PKCE challenge
    pub enforce_pkce_for_public: bool,
}

pub struct Grant<S, M> {
    store: S,
    minter: M,
    enforce_pkce_for_public: bool,
}

impl<S, M> GrantHandler for Grant<S, M>
where
    S: Store + Send + Sync,
    M: TokenMinter + Send + Sync,
{
    type Config = Config<S, M>;

    fn init(config: Self::Config) -> Result<Self> {
        Ok(Self {
            store: config.store,
            minter: config.minter,
            enforce_pkce_for_public: config.enforce_pkce_for_public,
        })
    }

    fn grant_type(&self) -> GrantType {
        GrantType::AuthorizationCode
    }

    fn is_confidential_client(&self) -> Result<bool> {
        // Public clients are admitted, they just have to bring PKCE
        Ok(false)
    }

    fn issue_refresh_token(&self) -> Result<bool> {
        Ok(true)
    }

    fn is_of_type_application_user(&self) -> Result<bool> {
        Ok(true)
    }

    async fn validate_grant(&self, ctx: &mut GrantContext<'_>) -> Result<bool> {
        let Some(code) = ctx.params.get("code") else {
            debug!("missing code parameter");
            return Ok(false);
        };

        let Some(authorization) = self.store.load_authorization(code).await? else {
            debug!("unknown or expired code");
            return Ok(false);
        };

        // Constant time comparison
        if authorization.client != ctx.client {
            debug!(client_id = ?ctx.client.client_id, "code was issued to a different client");
            return Ok(false);
        }

        match ctx.params.get("redirect_uri") {
            Some(redirect_uri) if authorization.redirect_uri == *redirect_uri => {}
            _ => {
                debug!(client_id = ?ctx.client.client_id, "redirect uri doesn't match");
                return Ok(false);
            }
        }

        if let Some(ref pkce) = authorization.pkce_payload {
            let Some(code_verifier) = ctx.params.get("code_verifier") else {
                debug!("challenge present but no code_verifier");
                return Ok(false);
            };

            if let Err(error) = pkce.verify(code_verifier) {
                debug!(?error, "pkce verification failed");
                return Ok(false);
            }
        } else if self.enforce_pkce_for_public && !ctx.client.confidential {
            debug!(client_id = ?ctx.client.client_id, "public client without pkce");
            return Ok(false);
        }

        ctx.set_resource_owner(authorization.user_id.into_owned());
        ctx.set_entitlement(authorization.scopes);

        Ok(true)
    }

    async fn is_authorized_client(&self, ctx: &GrantContext<'_>) -> Result<bool> {
        Ok(ctx.client.grant_types.contains(&self.grant_type()))
    }

    async fn authorize_access_delegation(&self, ctx: &GrantContext<'_>) -> Result<bool> {
        // The owner/client binding was established when the code was handed
        // out at the authorize endpoint; here it only has to still be present
        Ok(ctx.resource_owner().is_some())
    }

    async fn validate_scope(&self, ctx: &mut GrantContext<'_>) -> Result<bool> {
        let Some(entitled) = ctx.entitlement().cloned() else {
            return Ok(false);
        };

        Ok(flow::narrow_scopes(ctx, &entitled))
    }

    async fn issue(&self, ctx: &mut GrantContext<'_>) -> Result<TokenResponse<'static>> {
        let response = self.minter.mint(ctx).await?;

        let code = ctx
            .params
            .get("code")
            .ok_or_else(|| Error::issuance("code parameter vanished mid-request"))?;
        self.store.consume(code).await?;

        Ok(response)
    }

    fn sync_lock_key(&self, ctx: &GrantContext<'_>) -> Option<CompactString> {
        // Codes are single-use but only consumed at issue time; two
        // concurrent exchanges of the same code have to be serialized or
        // both would validate against the still-unconsumed grant
        let code = ctx.params.get("code").map_or("", |code| code);

        Some(format_compact!("{}:{code}", ctx.client.client_id))
    }
}
