use crate::{
    context::GrantContext,
    error::{Error, Result},
    flow::{self, GrantHandler, TokenResponse},
    primitive::{Client, GrantType},
    scope::Scope,
    TokenMinter,
};
use compact_str::{format_compact, CompactString};
use std::{borrow::Cow, future::Future};

/// What the token store remembers about a previously issued token
#[derive(Clone, Debug)]
pub struct IssuedToken<'a> {
    pub client: Client<'a>,
    pub user_id: Option<Cow<'a, str>>,
    pub scopes: Scope,
}

pub trait Store {
    /// Look up an issued token by its refresh token
    fn load_token(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<Option<IssuedToken<'_>>>> + Send;

    /// Revoke the old token pair after rotation
    fn revoke(&self, refresh_token: &str) -> impl Future<Output = Result<()>> + Send;
}

pub struct Config<S, M> {
    pub store: S,
    pub minter: M,
}

pub struct Grant<S, M> {
    store: S,
    minter: M,
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
        })
    }

    fn grant_type(&self) -> GrantType {
        GrantType::RefreshToken
    }

    fn is_confidential_client(&self) -> Result<bool> {
        Ok(false)
    }

    fn issue_refresh_token(&self) -> Result<bool> {
        Ok(true)
    }

    fn is_of_type_application_user(&self) -> Result<bool> {
        Ok(true)
    }

    async fn validate_grant(&self, ctx: &mut GrantContext<'_>) -> Result<bool> {
        let Some(refresh_token) = ctx.params.get("refresh_token") else {
            debug!("missing refresh_token parameter");
            return Ok(false);
        };

        let Some(token) = self.store.load_token(refresh_token).await? else {
            debug!("unknown or revoked refresh token");
            return Ok(false);
        };

        // Constant time comparison
        if token.client != ctx.client {
            debug!(client_id = ?ctx.client.client_id, "token belongs to a different client");
            return Ok(false);
        }

        if let Some(user_id) = token.user_id {
            ctx.set_resource_owner(user_id.into_owned());
        }
        ctx.set_entitlement(token.scopes);

        Ok(true)
    }

    async fn is_authorized_client(&self, ctx: &GrantContext<'_>) -> Result<bool> {
        Ok(ctx.client.grant_types.contains(&self.grant_type()))
    }

    async fn authorize_access_delegation(&self, _ctx: &GrantContext<'_>) -> Result<bool> {
        // Delegation was authorized when the original grant went through;
        // a rotation can't change whose token it is
        Ok(true)
    }

    async fn validate_scope(&self, ctx: &mut GrantContext<'_>) -> Result<bool> {
        // A refresh may narrow but never escalate beyond the original grant
        let Some(original) = ctx.entitlement().cloned() else {
            return Ok(false);
        };

        if !original.can_perform(&ctx.requested_scopes) {
            debug!(client_id = ?ctx.client.client_id, "refresh requests scopes beyond the original grant");
            return Ok(false);
        }

        Ok(flow::narrow_scopes(ctx, &original))
    }

    async fn issue(&self, ctx: &mut GrantContext<'_>) -> Result<TokenResponse<'static>> {
        let response = self.minter.mint(ctx).await?;

        // Rotation: the old pair dies with the new one minted
        let refresh_token = ctx
            .params
            .get("refresh_token")
            .ok_or_else(|| Error::issuance("refresh_token parameter vanished mid-request"))?;
        self.store.revoke(refresh_token).await?;

        Ok(response)
    }

    fn sync_lock_key(&self, ctx: &GrantContext<'_>) -> Option<CompactString> {
        // Derived before validation runs, so only request material is
        // available: client + token identifier is enough to serialize
        // concurrent rotations of the same refresh token
        let refresh_token = ctx.params.get("refresh_token").map_or("", |token| token);

        Some(format_compact!(
            "{}:{refresh_token}",
            ctx.client.client_id
        ))
    }
}
