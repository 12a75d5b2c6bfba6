use crate::decoder::DecodeError;
use crate::navigator::NavigationError;
use crate::redirect::Intention;
use crate::storage::StorageError;
use crate::timers::SchedulerError;
use crate::token::TokenKind;
use snafu::Snafu;

/// Rejection of a configuration document. Construction of a
/// [`SessionAuthManager`](crate::SessionAuthManager) fails on the first violated rule.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    #[snafu(display("config is not valid JSON: {source}"))]
    Parse { source: serde_json::Error },

    #[snafu(display("config must be an object"))]
    NotAnObject,

    #[snafu(display("client id in config must be present and typeof [string]"))]
    ClientId,

    #[snafu(display("base url in config must be present and typeof [string]"))]
    BaseUrl,

    #[snafu(display("base url must start with https://"))]
    BaseUrlScheme,

    #[snafu(display("realm name in config must be present and typeof [string]"))]
    RealmName,

    #[snafu(display(
        "If passing in a custom redirectURI it must either be a function or a string"
    ))]
    RedirectUriType,

    #[snafu(display("If passing in a custom redirectURI as a function it must return a string"))]
    RedirectUriReturn,

    #[snafu(display("loginURIResponseType in config must be typeof [string]"))]
    ResponseTypeType,

    #[snafu(display(
        "loginURIResponseType isn't valid, please view https://openid.net/specs/openid-connect-core-1_0.html#ImplicitAuthRequest for details"
    ))]
    ResponseTypeInvalid,

    #[snafu(display("hooks in config must be typeof [object]"))]
    HooksType,

    #[snafu(display(
        "{name} in config.hooks is not a valid hook, please see API Docs for information on valid hooks"
    ))]
    UnknownHook { name: String },

    #[snafu(display("config.hooks.{name} must be typeof [function]"))]
    HookNotCallable { name: String },
}

/// Errors raised by a constructed manager.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SessionAuthError {
    #[snafu(display(
        "SessionAuthError: Prompt type must one of none,login,consent,select_account. Got: {prompt}"
    ))]
    InvalidPrompt { prompt: String },

    #[snafu(display("SessionAuthError: Storage access failed"))]
    Storage { source: StorageError },

    #[snafu(display("SessionAuthError: Could not schedule token expiry timer"))]
    Scheduler { source: SchedulerError },

    #[snafu(display("SessionAuthError: Navigation failed"))]
    Navigation { source: NavigationError },

    #[snafu(display(
        "SessionAuthError: The redirectURI function produced no uri for intention {intention}"
    ))]
    RedirectUriUnavailable { intention: Intention },
}

impl From<StorageError> for SessionAuthError {
    fn from(source: StorageError) -> Self {
        Self::Storage { source }
    }
}

/// Reasons for refusing tokens received from the authorization server.
/// Never surfaced to callers, only logged.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub(crate) enum SaveAuthDataError {
    #[snafu(display("SaveAuthDataError: Could not decode {kind}"))]
    DecodeToken { kind: TokenKind, source: DecodeError },

    #[snafu(display(
        "SaveAuthDataError: Authentication failed due to possible replay attack. Nonce of {kind} does not match"
    ))]
    ReplayAttack { kind: TokenKind },

    #[snafu(display("SaveAuthDataError: Could not access storage"))]
    PersistAuthData { source: StorageError },
}
