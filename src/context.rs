use crate::{params::ParamStorage, primitive::Client, primitive::GrantType, scope::Scope};
use std::borrow::Cow;

/// Whether the token acts on behalf of the application itself or of a user
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TokenKind {
    #[default]
    Application,
    ApplicationUser,
}

/// Capability flags stamped onto the context before validation runs
#[derive(Clone, Copy, Debug, Default)]
pub struct TokenFlags {
    pub confidential_client: bool,
    pub issue_refresh_token: bool,
    pub kind: TokenKind,
}

/// An already-parsed token request, as handed over by the transport layer
pub struct TokenRequest<'a> {
    pub grant_type: &'a str,
    pub client_id: &'a str,
    pub client_secret: Option<&'a str>,
    pub scope: Option<&'a str>,
    pub params: ParamStorage<Cow<'a, str>, Cow<'a, str>>,
}

/// Per-request scratch state
///
/// Owned exclusively by the request's processing path. Handlers accumulate
/// validation state here instead of on themselves, which is what keeps them
/// shareable across concurrent requests.
pub struct GrantContext<'a> {
    pub client: Client<'a>,
    pub grant_type: GrantType,
    pub requested_scopes: Scope,
    pub params: ParamStorage<Cow<'a, str>, Cow<'a, str>>,

    resource_owner: Option<Cow<'a, str>>,
    entitlement: Option<Scope>,
    granted_scopes: Option<Scope>,
    flags: TokenFlags,
}

impl<'a> GrantContext<'a> {
    #[must_use]
    pub fn new(
        client: Client<'a>,
        grant_type: GrantType,
        requested_scopes: Scope,
        params: ParamStorage<Cow<'a, str>, Cow<'a, str>>,
    ) -> Self {
        Self {
            client,
            grant_type,
            requested_scopes,
            params,
            resource_owner: None,
            entitlement: None,
            granted_scopes: None,
            flags: TokenFlags::default(),
        }
    }

    #[must_use]
    pub fn resource_owner(&self) -> Option<&str> {
        self.resource_owner.as_deref()
    }

    pub fn set_resource_owner(&mut self, owner: impl Into<Cow<'a, str>>) {
        self.resource_owner = Some(owner.into());
    }

    /// Scopes the backing grant entitles this request to, recorded by
    /// `validate_grant` when the grant itself carries them (stored
    /// authorization, original refresh-token grant)
    #[must_use]
    pub fn entitlement(&self) -> Option<&Scope> {
        self.entitlement.as_ref()
    }

    pub fn set_entitlement(&mut self, entitlement: Scope) {
        self.entitlement = Some(entitlement);
    }

    /// The scopes the token will actually carry
    ///
    /// Falls back to the requested set until `validate_scope` narrowed it.
    #[must_use]
    pub fn granted_scopes(&self) -> &Scope {
        self.granted_scopes
            .as_ref()
            .unwrap_or(&self.requested_scopes)
    }

    pub fn set_granted_scopes(&mut self, granted: Scope) {
        self.granted_scopes = Some(granted);
    }

    #[must_use]
    pub fn flags(&self) -> TokenFlags {
        self.flags
    }

    pub(crate) fn set_flags(&mut self, flags: TokenFlags) {
        self.flags = flags;
    }
}
