use serde::{Deserialize, Serialize};

/// Error codes an authorization server may return to the redirect uri of an implicit flow
/// authorization request.
///
/// See [RFC 6749 Section 4.2.2.1](https://datatracker.ietf.org/doc/html/rfc6749#section-4.2.2.1)
/// and [OpenID Connect Core Section 3.1.2.6](https://openid.net/specs/openid-connect-core-1_0.html#AuthError).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub enum KnownOidcErrorCode {
    /// The request is missing a required parameter, includes an invalid parameter value,
    /// includes a parameter more than once, or is otherwise malformed.
    #[serde(rename = "invalid_request")]
    InvalidRequest,

    /// The client is not authorized to request an access token using this method.
    #[serde(rename = "unauthorized_client")]
    UnauthorizedClient,

    /// The resource owner or authorization server denied the request.
    #[serde(rename = "access_denied")]
    AccessDenied,

    /// The authorization server does not support obtaining an access token using this method.
    #[serde(rename = "unsupported_response_type")]
    UnsupportedResponseType,

    /// The requested scope is invalid, unknown, or malformed.
    #[serde(rename = "invalid_scope")]
    InvalidScope,

    #[serde(rename = "server_error")]
    ServerError,

    #[serde(rename = "temporarily_unavailable")]
    TemporarilyUnavailable,

    /// The authorization server requires end-user interaction of some form to proceed.
    /// Returned when `prompt=none` was requested but cannot be honored.
    #[serde(rename = "interaction_required")]
    InteractionRequired,

    /// The authorization server requires end-user authentication.
    /// Returned for a silent (`prompt=none`) request while no session exists at the server.
    #[serde(rename = "login_required")]
    LoginRequired,

    #[serde(rename = "account_selection_required")]
    AccountSelectionRequired,

    #[serde(rename = "consent_required")]
    ConsentRequired,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum OidcErrorCode {
    Known(KnownOidcErrorCode),
    Unknown(String),
}

impl OidcErrorCode {
    pub fn parse(code: &str) -> Self {
        serde_json::from_value(serde_json::Value::String(code.to_owned()))
            .unwrap_or_else(|_err| OidcErrorCode::Unknown(code.to_owned()))
    }
}

/// Error response received in the fragment of a redirect back from the authorization server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AuthorizationError {
    /// The error code (e.g., `login_required` or `access_denied`).
    pub error: OidcErrorCode,

    /// OPTIONAL. Human-readable ASCII text providing additional information.
    pub error_description: Option<String>,
}

impl AuthorizationError {
    /// Whether a silent authentication attempt failed only because the user has no session at
    /// the authorization server. A regular, interactive login is required.
    pub fn requires_interaction(&self) -> bool {
        matches!(
            self.error,
            OidcErrorCode::Known(
                KnownOidcErrorCode::LoginRequired
                    | KnownOidcErrorCode::InteractionRequired
                    | KnownOidcErrorCode::ConsentRequired
                    | KnownOidcErrorCode::AccountSelectionRequired
            )
        )
    }
}
