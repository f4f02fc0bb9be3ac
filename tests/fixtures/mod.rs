#![allow(dead_code)]

use goshuin::{
    action::{ExtensionFailurePolicy, NoActions},
    flow::{self, GrantHandler, Impls, Pipeline},
};

pub mod client_extractor;
pub mod minter;
pub mod stores;

#[allow(clippy::unreadable_literal)]
pub const RNG_SEED: u64 = 0xBADD1E;

#[inline]
pub fn generate_secret() -> String {
    (0..16).map(|_| fastrand::lowercase()).collect()
}

pub type AuthCodeGrant = flow::authorization::Grant<stores::AuthStore, minter::Minter>;
pub type ClientCredentialsGrant =
    flow::client_credentials::Grant<stores::Policy, minter::Minter>;
pub type PasswordGrant =
    flow::password::Grant<stores::Owners, stores::Policy, minter::Minter>;
pub type RefreshGrant = flow::refresh::Grant<stores::TokenStore, minter::Minter>;

pub type FixtureImpls = Impls<
    AuthCodeGrant,
    ClientCredentialsGrant,
    PasswordGrant,
    RefreshGrant,
    client_extractor::ClientExtractor,
>;

pub struct Fixture {
    pub impls: FixtureImpls,
    pub pipeline: Pipeline<NoActions, minter::Minter>,
    pub auth_storage: stores::AuthStore,
    pub token_storage: stores::TokenStore,
    pub owners: stores::Owners,
    pub minter: minter::Minter,
}

impl Fixture {
    pub fn generate() -> Self {
        let auth_storage = stores::AuthStore::default();
        let token_storage = stores::TokenStore::default();
        let owners = stores::Owners::default();
        let policy = stores::Policy;
        let minter = minter::Minter::new(token_storage.clone());

        let impls = Impls {
            authorization: flow::authorization::Grant::init(flow::authorization::Config {
                store: auth_storage.clone(),
                minter: minter.clone(),
                enforce_pkce_for_public: true,
            })
            .unwrap(),
            client_credentials: flow::client_credentials::Grant::init(
                flow::client_credentials::Config {
                    policy,
                    minter: minter.clone(),
                    issue_refresh_tokens: false,
                },
            )
            .unwrap(),
            password: flow::password::Grant::init(flow::password::Config {
                resolver: owners.clone(),
                policy,
                minter: minter.clone(),
                issue_refresh_tokens: true,
            })
            .unwrap(),
            refresh: flow::refresh::Grant::init(flow::refresh::Config {
                store: token_storage.clone(),
                minter: minter.clone(),
            })
            .unwrap(),
            client_extractor: client_extractor::ClientExtractor::default(),
        };

        let pipeline = Pipeline::new(
            NoActions,
            minter.clone(),
            ExtensionFailurePolicy::default(),
        );

        Self {
            impls,
            pipeline,
            auth_storage,
            token_storage,
            owners,
            minter,
        }
    }
}
