#[macro_use]
extern crate tracing;

pub use self::context::{GrantContext, TokenKind, TokenRequest};
pub use self::error::{DenyReason, Error, Result};
pub use self::params::ParamStorage;
pub use self::primitive::{Authorization, Client, GrantType};

pub mod action;
pub mod context;
pub mod error;
pub mod flow;
pub mod params;
pub mod pkce;
pub mod primitive;
pub mod scope;
pub mod sync;

use std::future::Future;

/// Resolves a client identity from the credential store.
///
/// Returns `Ok(None)` when the client is unknown or the presented secret
/// doesn't match; secret comparison has to be constant time
/// (see [`Client`]s `PartialEq` impl).
pub trait ClientExtractor {
    fn extract(
        &self,
        client_id: &str,
        client_secret: Option<&str>,
    ) -> impl Future<Output = Result<Option<Client<'_>>>> + Send;
}

/// Resolves and validates resource-owner identities
pub trait OwnerResolver {
    /// Validate owner credentials, returning the canonical owner identifier
    ///
    /// `Ok(None)` means the credentials are simply wrong, which is a protocol
    /// denial and not an error
    fn resolve(
        &self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Whether `owner` may delegate access to `client`
    fn verify(
        &self,
        owner: &str,
        client: &Client<'_>,
    ) -> impl Future<Output = Result<bool>> + Send;
}

/// Resolves the scopes a client/owner pair is entitled to
pub trait ScopePolicy {
    fn entitled(
        &self,
        client: &Client<'_>,
        owner: Option<&str>,
    ) -> impl Future<Output = Result<scope::Scope>> + Send;
}

/// Mints the prospective token response for a validated grant
pub trait TokenMinter {
    fn mint(
        &self,
        ctx: &GrantContext<'_>,
    ) -> impl Future<Output = Result<flow::TokenResponse<'static>>> + Send;
}

/// Durably stores and cryptographically finalizes an issued token
///
/// Only invoked after every requested operation applied cleanly.
/// Partial failures hand the unfinalized response back to the caller instead.
pub trait TokenFinalizer {
    fn finalize(
        &self,
        ctx: &GrantContext<'_>,
        response: &mut flow::TokenResponse<'static>,
    ) -> impl Future<Output = Result<()>> + Send;
}
