use goshuin::{scope::Scope, Client, GrantType};
use std::{borrow::Cow, collections::HashMap};

fn define_client(
    client_name: &str,
    scopes: Scope,
    confidential: bool,
    grant_types: Vec<GrantType>,
) -> Client<'static> {
    Client {
        client_id: Cow::Owned(client_name.into()),
        client_secret: Cow::Owned(format!("{client_name}_sec")),
        scopes,
        confidential,
        grant_types,
    }
}

#[derive(Clone)]
pub struct ClientExtractor {
    clients: HashMap<String, Client<'static>>,
}

impl ClientExtractor {
    pub fn empty() -> Self {
        Self {
            clients: HashMap::new(),
        }
    }

    fn insert(&mut self, client: Client<'static>) {
        self.clients
            .insert(client.client_id.clone().into_owned(), client);
    }

    pub fn get(&self, client_id: &str) -> Client<'static> {
        self.clients.get(client_id).unwrap().clone()
    }
}

impl Default for ClientExtractor {
    fn default() -> Self {
        Self::from_iter([
            define_client(
                "client_1",
                Scope::from_iter(["read", "write"]),
                true,
                vec![
                    GrantType::AuthorizationCode,
                    GrantType::ClientCredentials,
                    GrantType::Password,
                    GrantType::RefreshToken,
                ],
            ),
            define_client(
                "client_2",
                Scope::from_iter(["follow", "push"]),
                false,
                vec![GrantType::AuthorizationCode, GrantType::RefreshToken],
            ),
            define_client(
                "client_3",
                Scope::from_iter(["read"]),
                true,
                vec![GrantType::ClientCredentials],
            ),
        ])
    }
}

impl FromIterator<Client<'static>> for ClientExtractor {
    fn from_iter<T: IntoIterator<Item = Client<'static>>>(iter: T) -> Self {
        iter.into_iter().fold(Self::empty(), |mut acc, item| {
            acc.insert(item);
            acc
        })
    }
}

impl goshuin::ClientExtractor for ClientExtractor {
    async fn extract(
        &self,
        client_id: &str,
        client_secret: Option<&str>,
    ) -> goshuin::Result<Option<Client<'_>>> {
        let Some(client) = self.clients.get(client_id) else {
            return Ok(None);
        };

        if let Some(client_secret) = client_secret {
            if client.client_secret != client_secret {
                return Ok(None);
            }
        }

        Ok(Some(client.clone()))
    }
}
