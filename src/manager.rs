use snafu::{OptionExt, ResultExt};

use crate::callback::CallbackFragment;
use crate::config::{Config, ConfigInput, ResponseType};
use crate::endpoints::DerivedEndpoints;
use crate::environment::Environment;
use crate::error::{
    ConfigError, DecodeTokenSnafu, NavigationSnafu, PersistAuthDataSnafu,
    RedirectUriUnavailableSnafu, ReplayAttackSnafu, SaveAuthDataError, SchedulerSnafu,
    SessionAuthError,
};
use crate::hooks::{Hook, Hooks};
use crate::login::{self, Prompt};
use crate::logout;
use crate::nonce::{Nonce, NonceLedger, RequestKey};
use crate::redirect::{Intention, RedirectUri};
use crate::response::AuthorizationError;
use crate::session;
use crate::storage::{self, AUTH_KEY};
use crate::timers::TimerHandle;
use crate::token::{AuthRecord, TokenClaims, TokenKind};

/// What [`SessionAuthManager::handle_page_load`] did.
#[derive(Debug)]
pub enum PageLoadOutcome {
    /// Valid tokens were already stored. Expiry timers were armed.
    Authenticated { timers: Vec<TimerHandle> },

    /// Nothing stored and not landing from the authorization server. The browser was sent to a
    /// silent login.
    RedirectedToLogin { uri: String },

    /// Landed from the authorization server. The received tokens were stored and expiry timers
    /// were armed. A fragment carrying only an error leaves an empty record and no timers.
    CallbackAccepted { timers: Vec<TimerHandle> },

    /// Landed from the authorization server, but the received tokens were refused.
    /// Carries the error reported by the authorization server, if there was one.
    CallbackRejected { error: Option<AuthorizationError> },

    /// Landed from the authorization server with a fragment not usable for authentication.
    InvalidCallback,
}

/// Browser side session management for the OpenID Connect implicit flow against Keycloak.
///
/// Holds no session state of its own. Everything is re-read from the [`Environment`]'s store
/// on each call, as other code on the same origin may change it at any time.
#[derive(Debug)]
pub struct SessionAuthManager {
    config: Config,
    endpoints: DerivedEndpoints,
    env: Environment,
}

impl SessionAuthManager {
    pub fn new(input: impl Into<ConfigInput>, env: Environment) -> Result<Self, ConfigError> {
        let config = Config::validate(input.into())?;
        Ok(Self::from_config(config, env))
    }

    pub fn from_config(config: Config, env: Environment) -> Self {
        let endpoints = DerivedEndpoints::new(config.base_url(), config.realm_name());
        tracing::trace!(?endpoints, "Derived endpoints");
        Self {
            config,
            endpoints,
            env,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn client_id(&self) -> &str {
        self.config.client_id()
    }

    pub fn login_uri_response_type(&self) -> ResponseType {
        self.config.login_uri_response_type()
    }

    pub fn hooks(&self) -> &Hooks {
        self.config.hooks()
    }

    pub fn endpoints(&self) -> &DerivedEndpoints {
        &self.endpoints
    }

    pub fn base_auth_endpoint(&self) -> &str {
        self.endpoints.authorization_endpoint()
    }

    pub fn base_logout_endpoint(&self) -> &str {
        self.endpoints.end_session_endpoint()
    }

    /// The configured redirect uri, falling back to the current origin.
    pub fn redirect_uri(&self) -> RedirectUri {
        match self.config.redirect_uri() {
            Some(redirect_uri) => redirect_uri.clone(),
            None => RedirectUri::Static(self.env.navigator.current_origin()),
        }
    }

    pub fn sso_redirect_uri(&self, intention: Intention) -> Result<String, SessionAuthError> {
        self.redirect_uri()
            .resolve(intention)
            .context(RedirectUriUnavailableSnafu { intention })
    }

    /// Build the uri of an authorization request.
    ///
    /// Creates a new nonce, invalidating the one of any previous login attempt.
    pub fn sso_login_uri(&self, prompt: Prompt) -> Result<String, SessionAuthError> {
        let redirect_uri = self.sso_redirect_uri(Intention::Login)?;
        let nonce = self.create_nonce()?;
        Ok(login::create_login_uri(
            self.base_auth_endpoint(),
            self.login_uri_response_type(),
            prompt,
            self.client_id(),
            &nonce,
            &redirect_uri,
        ))
    }

    /// Login uri not showing any user interface at the authorization server.
    pub fn sso_login_uri_for_page_load_redirect(&self) -> Result<String, SessionAuthError> {
        self.sso_login_uri(Prompt::None)
    }

    pub fn sso_logout_uri(&self) -> Result<String, SessionAuthError> {
        let redirect_uri = self.sso_redirect_uri(Intention::Logout)?;
        Ok(logout::create_logout_uri(
            self.base_logout_endpoint(),
            &redirect_uri,
        ))
    }

    fn nonce_ledger(&self) -> NonceLedger<'_> {
        NonceLedger::new(self.env.store.as_ref())
    }

    pub fn create_request_key(&self) -> RequestKey {
        self.nonce_ledger().create_request_key()
    }

    pub fn create_nonce(&self) -> Result<Nonce, SessionAuthError> {
        Ok(self.nonce_ledger().create_nonce()?)
    }

    pub fn is_a_replay_attack(&self, nonce: Option<&str>) -> Result<bool, SessionAuthError> {
        Ok(self.nonce_ledger().is_a_replay_attack(nonce)?)
    }

    pub fn clear_nonce(&self) -> Result<(), SessionAuthError> {
        Ok(self.nonce_ledger().clear_nonce()?)
    }

    /// Parameters of the current url fragment.
    pub fn callback_fragment(&self) -> CallbackFragment {
        CallbackFragment::parse(&self.env.navigator.current_fragment())
    }

    pub fn is_page_load_from_sso_redirect(&self) -> bool {
        self.callback_fragment().is_sso_redirect()
    }

    /// See [`CallbackFragment::is_valid_for_authentication`] for how little this checks.
    pub fn is_page_load_hash_valid_for_authentication(&self) -> bool {
        self.callback_fragment().is_valid_for_authentication()
    }

    /// Decode the given tokens, check their nonces and store their claims.
    ///
    /// Either all given tokens are stored or none. Failures are logged and reported as `false`.
    /// Without any token an empty record is stored.
    pub fn save_auth_data_in_local(&self, access_token: Option<&str>, id_token: Option<&str>) -> bool {
        match self.try_save_auth_data(access_token, id_token) {
            Ok(record) => {
                tracing::trace!(tokens = record.len(), "Stored auth data");
                true
            }
            Err(err) => {
                tracing::warn!(%err, "Refusing received tokens");
                false
            }
        }
    }

    fn try_save_auth_data(
        &self,
        access_token: Option<&str>,
        id_token: Option<&str>,
    ) -> Result<AuthRecord, SaveAuthDataError> {
        let mut record = AuthRecord::new();
        let received = [
            (TokenKind::AccessToken, access_token),
            (TokenKind::IdToken, id_token),
        ];
        for (kind, token) in received {
            let Some(token) = token.filter(|token| !token.is_empty()) else {
                continue;
            };
            let claims = self
                .env
                .decoder
                .decode(token)
                .context(DecodeTokenSnafu { kind })?;
            let replayed = self
                .nonce_ledger()
                .is_a_replay_attack(claims.nonce.as_deref())
                .context(PersistAuthDataSnafu)?;
            if replayed {
                return ReplayAttackSnafu { kind }.fail();
            }
            record.insert(kind, claims);
        }
        storage::write_value(self.env.store.as_ref(), AUTH_KEY, &record)
            .context(PersistAuthDataSnafu)?;
        Ok(record)
    }

    /// The stored auth record, if there is a readable one.
    pub fn auth_data(&self) -> Result<Option<AuthRecord>, SessionAuthError> {
        Ok(session::read_auth_record(self.env.store.as_ref())?)
    }

    pub fn access_token(&self) -> Result<Option<TokenClaims>, SessionAuthError> {
        Ok(self
            .auth_data()?
            .and_then(|record| record.access_token().cloned()))
    }

    pub fn id_token(&self) -> Result<Option<TokenClaims>, SessionAuthError> {
        Ok(self.auth_data()?.and_then(|record| record.id_token().cloned()))
    }

    pub fn is_token_expired(&self, token: &TokenClaims) -> bool {
        token.is_expired(self.env.clock.now())
    }

    pub fn are_tokens_expired(&self) -> Result<bool, SessionAuthError> {
        let record = self.auth_data()?;
        Ok(session::are_tokens_expired(
            record.as_ref(),
            self.env.clock.now(),
        ))
    }

    pub fn is_authenticated(&self) -> Result<bool, SessionAuthError> {
        let record = self.auth_data()?;
        Ok(session::is_authenticated(record.as_ref(), self.env.clock.now()))
    }

    /// Arm a timer per stored token firing `onTokenExpired` once it expires.
    ///
    /// Timers keep running when the returned handles are dropped. Cancel them explicitly if
    /// needed.
    pub fn set_token_expiry_timers(&self) -> Result<Vec<TimerHandle>, SessionAuthError> {
        let Some(record) = self.auth_data()? else {
            return Ok(Vec::new());
        };
        session::set_token_expiry_timers(
            &record,
            self.env.clock.now(),
            self.env.timers.as_ref(),
            self.hooks().handler(Hook::OnTokenExpired),
        )
        .context(SchedulerSnafu)
    }

    /// Remove the `sso` and `auth` records, then fire `onAuthLocalStorageCleared`.
    pub fn clear_auth_local_storage(&self) -> Result<(), SessionAuthError> {
        let store = self.env.store.as_ref();
        storage::remove_value(store, storage::SSO_KEY)?;
        storage::remove_value(store, AUTH_KEY)?;
        self.hooks().fire(Hook::OnAuthLocalStorageCleared);
        Ok(())
    }

    /// Decide what to do with the page which just loaded.
    ///
    /// - Already authenticated: arm expiry timers and fire `onAuthenticateSuccess`.
    /// - Not landing from the authorization server: fire `onBeforeAuthRedirect` and navigate to
    ///   a silent login.
    /// - Landing with a usable fragment: fire `onAfterAuthRedirect` and try to store the received
    ///   tokens. On success fire `onAuthenticateSuccess` and arm expiry timers, otherwise fire
    ///   `onAuthenticateFail` and clear all stored session data.
    /// - Landing with an unusable fragment: clear all stored session data.
    ///
    /// The nonce is cleared whenever landing from the authorization server.
    pub fn handle_page_load(&self) -> Result<PageLoadOutcome, SessionAuthError> {
        let hooks = self.hooks();

        if self.is_authenticated()? {
            tracing::trace!("Already authenticated");
            let timers = self.set_token_expiry_timers()?;
            hooks.fire(Hook::OnAuthenticateSuccess);
            return Ok(PageLoadOutcome::Authenticated { timers });
        }

        let fragment = self.callback_fragment();
        if !fragment.is_sso_redirect() {
            hooks.fire(Hook::OnBeforeAuthRedirect);
            let uri = self.sso_login_uri_for_page_load_redirect()?;
            tracing::trace!(%uri, "Not authenticated. Redirecting to silent login");
            self.env
                .navigator
                .navigate_to(&uri)
                .context(NavigationSnafu)?;
            return Ok(PageLoadOutcome::RedirectedToLogin { uri });
        }

        let outcome = if fragment.is_valid_for_authentication() {
            hooks.fire(Hook::OnAfterAuthRedirect);
            if let Some(error) = fragment.authorization_error() {
                tracing::warn!(?error, "Authorization server reported an error");
            }
            let saved = self.save_auth_data_in_local(
                fragment.access_token.as_deref(),
                fragment.id_token.as_deref(),
            );
            if saved {
                hooks.fire(Hook::OnAuthenticateSuccess);
                self.set_token_expiry_timers()
                    .map(|timers| PageLoadOutcome::CallbackAccepted { timers })
            } else {
                hooks.fire(Hook::OnAuthenticateFail);
                self.clear_auth_local_storage()
                    .map(|()| PageLoadOutcome::CallbackRejected {
                        error: fragment.authorization_error(),
                    })
            }
        } else {
            tracing::warn!("Callback fragment is not usable for authentication. Clearing session");
            self.clear_auth_local_storage()
                .map(|()| PageLoadOutcome::InvalidCallback)
        };

        // The nonce is spent even when handling the callback failed.
        let cleared = self.clear_nonce();
        let outcome = outcome?;
        cleared?;
        Ok(outcome)
    }
}
