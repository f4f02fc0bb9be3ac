pub use self::authorization::Authorization;
pub use self::client::Client;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

mod authorization;
mod client;

#[derive(
    AsRefStr, Clone, Copy, Debug, Deserialize, Display, EnumString, Eq, Hash, PartialEq, Serialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GrantType {
    AuthorizationCode,
    ClientCredentials,
    Password,
    RefreshToken,
}
