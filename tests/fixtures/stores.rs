use goshuin::{
    flow::{authorization, refresh},
    scope::Scope,
    Authorization, Client,
};
use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

#[derive(Clone, Default)]
pub struct AuthStore {
    inner: Arc<Mutex<HashMap<String, Authorization<'static>>>>,
}

impl AuthStore {
    pub fn insert(&self, authorization: Authorization<'static>) {
        let mut guard = self.inner.lock().unwrap();
        guard.insert(authorization.code.clone().into_owned(), authorization);
    }

    pub fn contains(&self, code: &str) -> bool {
        self.inner.lock().unwrap().contains_key(code)
    }
}

impl authorization::Store for AuthStore {
    async fn load_authorization(
        &self,
        code: &str,
    ) -> goshuin::Result<Option<Authorization<'_>>> {
        let guard = self.inner.lock().unwrap();
        Ok(guard.get(code).cloned())
    }

    async fn consume(&self, code: &str) -> goshuin::Result<()> {
        let mut guard = self.inner.lock().unwrap();
        guard.remove(code);
        Ok(())
    }
}

#[derive(Clone)]
pub struct StoredToken {
    pub access_token: String,
    pub client: Client<'static>,
    pub user_id: Option<String>,
    pub scopes: Scope,
}

/// Issued-token store keyed by refresh token
#[derive(Clone, Default)]
pub struct TokenStore {
    inner: Arc<Mutex<HashMap<String, StoredToken>>>,
}

impl TokenStore {
    pub fn insert(&self, refresh_token: String, token: StoredToken) {
        let mut guard = self.inner.lock().unwrap();
        guard.insert(refresh_token, token);
    }

    pub fn get(&self, refresh_token: &str) -> Option<StoredToken> {
        self.inner.lock().unwrap().get(refresh_token).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }
}

impl refresh::Store for TokenStore {
    async fn load_token(
        &self,
        refresh_token: &str,
    ) -> goshuin::Result<Option<refresh::IssuedToken<'_>>> {
        let guard = self.inner.lock().unwrap();
        let token = guard.get(refresh_token).map(|token| refresh::IssuedToken {
            client: token.client.clone(),
            user_id: token.user_id.clone().map(Into::into),
            scopes: token.scopes.clone(),
        });

        Ok(token)
    }

    async fn revoke(&self, refresh_token: &str) -> goshuin::Result<()> {
        let mut guard = self.inner.lock().unwrap();
        guard.remove(refresh_token);
        Ok(())
    }
}

/// Owner credential resolver with an optional delegation deny-list
#[derive(Clone, Default)]
pub struct Owners {
    credentials: Arc<Mutex<HashMap<String, String>>>,
    delegation_denied: Arc<Mutex<HashSet<String>>>,
}

impl Owners {
    pub fn insert(&self, username: &str, password: &str) {
        let mut guard = self.credentials.lock().unwrap();
        guard.insert(username.into(), password.into());
    }

    pub fn deny_delegation(&self, username: &str) {
        let mut guard = self.delegation_denied.lock().unwrap();
        guard.insert(username.into());
    }
}

impl goshuin::OwnerResolver for Owners {
    async fn resolve(
        &self,
        username: &str,
        password: &str,
    ) -> goshuin::Result<Option<String>> {
        let guard = self.credentials.lock().unwrap();
        let resolved = guard
            .get(username)
            .filter(|stored| *stored == password)
            .map(|_| username.to_string());

        Ok(resolved)
    }

    async fn verify(&self, owner: &str, _client: &Client<'_>) -> goshuin::Result<bool> {
        let guard = self.delegation_denied.lock().unwrap();
        Ok(!guard.contains(owner))
    }
}

/// Entitles every client to exactly its registered scopes
#[derive(Clone, Copy, Default)]
pub struct Policy;

impl goshuin::ScopePolicy for Policy {
    async fn entitled(
        &self,
        client: &Client<'_>,
        _owner: Option<&str>,
    ) -> goshuin::Result<Scope> {
        Ok(client.scopes.clone())
    }
}
