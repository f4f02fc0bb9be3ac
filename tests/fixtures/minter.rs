use super::{generate_secret, stores};
use goshuin::{
    flow::{TokenResponse, TokenType},
    GrantContext, TokenFinalizer, TokenMinter,
};
use indexmap::IndexMap;
use std::sync::{Arc, Mutex};

/// Deterministic in-memory minter; doubles as the finalization backend
/// and records which access tokens it finalized
#[derive(Clone)]
pub struct Minter {
    token_storage: stores::TokenStore,
    finalized: Arc<Mutex<Vec<String>>>,
}

impl Minter {
    pub fn new(token_storage: stores::TokenStore) -> Self {
        Self {
            token_storage,
            finalized: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn finalized(&self) -> Vec<String> {
        self.finalized.lock().unwrap().clone()
    }
}

impl TokenMinter for Minter {
    async fn mint(&self, ctx: &GrantContext<'_>) -> goshuin::Result<TokenResponse<'static>> {
        let access_token = generate_secret();

        let refresh_token = if ctx.flags().issue_refresh_token {
            let refresh_token = generate_secret();
            self.token_storage.insert(
                refresh_token.clone(),
                stores::StoredToken {
                    access_token: access_token.clone(),
                    client: ctx.client.clone().into_owned(),
                    user_id: ctx.resource_owner().map(String::from),
                    scopes: ctx.granted_scopes().clone(),
                },
            );

            Some(refresh_token.into())
        } else {
            None
        };

        Ok(TokenResponse {
            access_token: access_token.into(),
            token_type: TokenType::Bearer,
            refresh_token,
            expires_in: 3600,
            scope: Some(ctx.granted_scopes().clone()),
            claims: IndexMap::new(),
        })
    }
}

impl TokenFinalizer for Minter {
    async fn finalize(
        &self,
        _ctx: &GrantContext<'_>,
        response: &mut TokenResponse<'static>,
    ) -> goshuin::Result<()> {
        let mut guard = self.finalized.lock().unwrap();
        guard.push(response.access_token.clone().into_owned());
        Ok(())
    }
}
