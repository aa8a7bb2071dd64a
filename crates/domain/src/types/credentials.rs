//! Names of the secrets kept in the credential store.

use crate::impl_domain_enum_conversions;

/// Logical secrets persisted in the platform keychain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKey {
    Url,
    ClientId,
    ClientSecret,
    Token,
    TokenExpiration,
}

impl CredentialKey {
    /// Every secret, in the order setup writes them.
    pub const ALL: [Self; 5] =
        [Self::Url, Self::ClientId, Self::ClientSecret, Self::Token, Self::TokenExpiration];
}

impl_domain_enum_conversions!(CredentialKey {
    Url => "url",
    ClientId => "client_id",
    ClientSecret => "client_secret",
    Token => "token",
    TokenExpiration => "token_expiration",
});
