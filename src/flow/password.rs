use crate::{
    context::GrantContext,
    error::Result,
    flow::{self, GrantHandler, TokenResponse},
    primitive::GrantType,
    OwnerResolver, ScopePolicy, TokenMinter,
};

pub struct Config<R, P, M> {
    pub resolver: R,
    pub policy: P,
    pub minter: M,
    pub issue_refresh_tokens: bool,
}

pub struct Grant<R, P, M> {
    resolver: R,
    policy: P,
    minter: M,
    issue_refresh_tokens: bool,
}

impl<R, P, M> GrantHandler for Grant<R, P, M>
where
    R: OwnerResolver + Send + Sync,
    P: ScopePolicy + Send + Sync,
    M: TokenMinter + Send + Sync,
{
    type Config = Config<R, P, M>;

    fn init(config: Self::Config) -> Result<Self> {
        Ok(Self {
            resolver: config.resolver,
            policy: config.policy,
            minter: config.minter,
            issue_refresh_tokens: config.issue_refresh_tokens,
        })
    }

    fn grant_type(&self) -> GrantType {
        GrantType::Password
    }

    fn is_confidential_client(&self) -> Result<bool> {
        Ok(true)
    }

    fn issue_refresh_token(&self) -> Result<bool> {
        Ok(self.issue_refresh_tokens)
    }

    fn is_of_type_application_user(&self) -> Result<bool> {
        Ok(true)
    }

    async fn validate_grant(&self, ctx: &mut GrantContext<'_>) -> Result<bool> {
        let (Some(username), Some(password)) =
            (ctx.params.get("username"), ctx.params.get("password"))
        else {
            debug!("missing owner credentials");
            return Ok(false);
        };

        let Some(owner) = self.resolver.resolve(username, password).await? else {
            debug!("owner credentials rejected");
            return Ok(false);
        };

        ctx.set_resource_owner(owner);
        Ok(true)
    }

    async fn is_authorized_client(&self, ctx: &GrantContext<'_>) -> Result<bool> {
        Ok(ctx.client.grant_types.contains(&self.grant_type()))
    }

    async fn authorize_access_delegation(&self, ctx: &GrantContext<'_>) -> Result<bool> {
        let Some(owner) = ctx.resource_owner() else {
            return Ok(false);
        };

        self.resolver.verify(owner, &ctx.client).await
    }

    async fn validate_scope(&self, ctx: &mut GrantContext<'_>) -> Result<bool> {
        let entitled = self
            .policy
            .entitled(&ctx.client, ctx.resource_owner())
            .await?;

        Ok(flow::narrow_scopes(ctx, &entitled))
    }

    async fn issue(&self, ctx: &mut GrantContext<'_>) -> Result<TokenResponse<'static>> {
        self.minter.mint(ctx).await
    }
}
