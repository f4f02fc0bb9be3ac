use crate::{
    context::GrantContext,
    error::{Error, Result},
    flow::{self, GrantHandler, TokenResponse},
    primitive::GrantType,
    ScopePolicy, TokenMinter,
};

pub struct Config<P, M> {
    pub policy: P,
    pub minter: M,
    /// RFC 6749 section 4.4.3: refresh tokens SHOULD NOT be included.
    /// Left configurable so a misconfiguration fails loudly at init.
    pub issue_refresh_tokens: bool,
}

pub struct Grant<P, M> {
    policy: P,
    minter: M,
}

impl<P, M> GrantHandler for Grant<P, M>
where
    P: ScopePolicy + Send + Sync,
    M: TokenMinter + Send + Sync,
{
    type Config = Config<P, M>;

    fn init(config: Self::Config) -> Result<Self> {
        if config.issue_refresh_tokens {
            return Err(Error::initialization(
                "client_credentials must not issue refresh tokens",
            ));
        }

        Ok(Self {
            policy: config.policy,
            minter: config.minter,
        })
    }

    fn grant_type(&self) -> GrantType {
        GrantType::ClientCredentials
    }

    fn is_confidential_client(&self) -> Result<bool> {
        Ok(true)
    }

    fn issue_refresh_token(&self) -> Result<bool> {
        Ok(false)
    }

    fn is_of_type_application_user(&self) -> Result<bool> {
        Ok(false)
    }

    async fn validate_grant(&self, ctx: &mut GrantContext<'_>) -> Result<bool> {
        // There is no grant artifact to check; the request stands or falls
        // with the client authentication that already happened. Only
        // confidential clients qualify.
        if !ctx.client.confidential {
            debug!(client_id = ?ctx.client.client_id, "public client");
            return Ok(false);
        }

        Ok(true)
    }

    async fn is_authorized_client(&self, ctx: &GrantContext<'_>) -> Result<bool> {
        Ok(ctx.client.grant_types.contains(&self.grant_type()))
    }

    async fn authorize_access_delegation(&self, _ctx: &GrantContext<'_>) -> Result<bool> {
        // No resource owner involved; the client acts on its own behalf
        Ok(true)
    }

    async fn validate_scope(&self, ctx: &mut GrantContext<'_>) -> Result<bool> {
        let entitled = self.policy.entitled(&ctx.client, None).await?;
        Ok(flow::narrow_scopes(ctx, &entitled))
    }

    async fn issue(&self, ctx: &mut GrantContext<'_>) -> Result<TokenResponse<'static>> {
        self.minter.mint(ctx).await
    }
}
