use crate::config::ResponseType;
use crate::error::SessionAuthError;
use crate::nonce::Nonce;
use crate::redirect::encode_uri;
use std::str::FromStr;

/// Value of the `prompt` parameter of an authorization request.
///
/// See: <https://openid.net/specs/openid-connect-core-1_0.html#AuthRequest>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Prompt {
    /// Do not display any authentication or consent user interface pages.
    /// Used to silently re-authenticate on page load.
    None,

    /// Prompt the End-User for reauthentication.
    #[default]
    Login,

    /// Prompt the End-User for consent before returning information to the Client.
    Consent,

    /// Prompt the End-User to select a user account.
    SelectAccount,
}

impl Prompt {
    pub const ALL: [Prompt; 4] = [
        Prompt::None,
        Prompt::Login,
        Prompt::Consent,
        Prompt::SelectAccount,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Prompt::None => "none",
            Prompt::Login => "login",
            Prompt::Consent => "consent",
            Prompt::SelectAccount => "select_account",
        }
    }
}

impl std::fmt::Display for Prompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Prompt {
    type Err = SessionAuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Prompt::ALL
            .into_iter()
            .find(|it| it.as_str() == s)
            .ok_or_else(|| SessionAuthError::InvalidPrompt {
                prompt: s.to_owned(),
            })
    }
}

pub(crate) fn create_login_uri(
    authorization_endpoint: &str,
    response_type: ResponseType,
    prompt: Prompt,
    client_id: &str,
    nonce: &Nonce,
    redirect_uri: &str,
) -> String {
    let login_uri = format!(
        "{authorization_endpoint}?response_type={response_type}&prompt={prompt}&client_id={client_id}&nonce={nonce}&redirect_uri={redirect_uri}"
    );
    encode_uri(&login_uri)
}
