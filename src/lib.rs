//! Browser side session management for Keycloak secured applications using the OpenID Connect
//! implicit flow.
//!
//! A [`SessionAuthManager`] builds login and logout uris, recognizes the redirect back from
//! Keycloak, checks the nonce of received tokens against the last login attempt, stores their
//! claims and keeps track of their expiry.
//!
//! ```
//! use keycloak_implicit_auth::{
//!     ConfigInput, Environment, ManualScheduler, MemoryStore, PageLoadOutcome,
//!     RecordingNavigator, SessionAuthManager,
//! };
//! use serde_json::json;
//!
//! let navigator = RecordingNavigator::new("https://app.example");
//! let env = Environment::new(MemoryStore::new(), navigator.clone(), ManualScheduler::new());
//!
//! let config = ConfigInput::new(json!({
//!     "clientId": "my-app",
//!     "baseURL": "https://sso.example",
//!     "realmName": "my-realm",
//! }))
//! .hook("onAuthenticateSuccess", || println!("Welcome back!"));
//!
//! let manager = SessionAuthManager::new(config, env).unwrap();
//!
//! // Nobody is logged in and we did not land from Keycloak: off to a silent login.
//! match manager.handle_page_load().unwrap() {
//!     PageLoadOutcome::RedirectedToLogin { uri } => {
//!         assert!(uri.starts_with(manager.base_auth_endpoint()));
//!     }
//!     other => panic!("unexpected outcome {other:?}"),
//! }
//! ```
//!
//! With the `browser` feature, [`Environment::browser`] backs everything with `localStorage`,
//! `window.location` and `setTimeout`.

#[cfg(feature = "browser")]
pub mod browser;
pub mod callback;
pub mod clock;
pub mod config;
pub mod decoder;
pub mod endpoints;
pub mod environment;
pub mod error;
pub mod hooks;
pub mod login;
mod logout;
pub mod manager;
pub mod navigator;
pub mod nonce;
pub mod redirect;
pub mod response;
pub mod session;
pub mod storage;
mod time_ext;
pub mod timers;
pub mod token;

pub use callback::{get_parameter_by_name, CallbackFragment};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{Config, ConfigInput, ResponseType};
pub use decoder::{DecodeError, TokenDecoder, UnverifiedJwtDecoder};
pub use endpoints::DerivedEndpoints;
pub use environment::Environment;
pub use error::{ConfigError, SessionAuthError};
pub use hooks::{Hook, HookFn, Hooks};
pub use login::Prompt;
pub use manager::{PageLoadOutcome, SessionAuthManager};
pub use navigator::{NavigationError, Navigator, RecordingNavigator};
pub use nonce::{Nonce, NonceLedger, RequestKey};
pub use redirect::{Intention, RedirectLanding, RedirectUri};
pub use response::{AuthorizationError, KnownOidcErrorCode, OidcErrorCode};
pub use storage::{KeyValueStore, MemoryStore, StorageError};
pub use timers::{ManualScheduler, SchedulerError, TimerHandle, TimerScheduler};
pub use token::{AuthRecord, TokenClaims, TokenKind};
pub use url::Url;

type AuthorizationEndpoint = String;
type EndSessionEndpoint = String;
