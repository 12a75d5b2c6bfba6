use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use time::OffsetDateTime;

use crate::time_ext::OffsetDateTimeExt;

/// Decoded payload of a token. Only the claims this crate acts on are typed, everything else is
/// kept as is so that a stored record round-trips unchanged.
///
/// See: <https://openid.net/specs/openid-connect-core-1_0.html#IDToken>
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TokenClaims {
    /// (exp) Expiration time as seconds since the unix epoch. May be fractional.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<serde_json::Number>,

    /// (nonce) Value passed through unmodified from the authentication request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    #[serde(flatten)]
    pub remaining: HashMap<String, serde_json::Value>,
}

impl TokenClaims {
    pub fn expires_at_seconds(&self) -> Option<f64> {
        self.exp.as_ref().and_then(serde_json::Number::as_f64)
    }

    pub fn expires_at(&self) -> Option<OffsetDateTime> {
        let seconds = self.expires_at_seconds()?;
        let nanos = (seconds * 1_000_000_000.0) as i128;
        OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()
    }

    /// Whether `now` lies strictly after `exp`. Claims without `exp` never expire.
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        match self.expires_at_seconds() {
            Some(exp) => now.unix_timestamp_f64() > exp,
            None => false,
        }
    }

    /// Time left until `exp`. Negative once expired.
    pub fn time_left(&self, now: OffsetDateTime) -> Option<time::Duration> {
        let exp = self.expires_at_seconds()?;
        Some(time::Duration::saturating_seconds_f64(exp - now.unix_timestamp_f64()))
    }
}

/// The tokens deciding whether a user is authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TokenKind {
    IdToken,
    AccessToken,
}

impl TokenKind {
    pub const ALL: [TokenKind; 2] = [TokenKind::IdToken, TokenKind::AccessToken];

    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::IdToken => "id_token",
            TokenKind::AccessToken => "access_token",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted under [`AUTH_KEY`](crate::storage::AUTH_KEY): token name to decoded claims.
///
/// Usually holds `id_token` and/or `access_token`, but records written by other code may carry
/// additional token kinds. Those take part in expiry checks and timers.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct AuthRecord {
    tokens: BTreeMap<String, TokenClaims>,
}

impl AuthRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: TokenKind, claims: TokenClaims) {
        self.tokens.insert(kind.as_str().to_owned(), claims);
    }

    pub fn get(&self, kind: TokenKind) -> Option<&TokenClaims> {
        self.tokens.get(kind.as_str())
    }

    pub fn get_by_name(&self, name: &str) -> Option<&TokenClaims> {
        self.tokens.get(name)
    }

    pub fn id_token(&self) -> Option<&TokenClaims> {
        self.get(TokenKind::IdToken)
    }

    pub fn access_token(&self) -> Option<&TokenClaims> {
        self.get(TokenKind::AccessToken)
    }

    /// All stored tokens, including kinds other than [`TokenKind`].
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TokenClaims)> {
        self.tokens
            .iter()
            .map(|(name, claims)| (name.as_str(), claims))
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
