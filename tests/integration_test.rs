use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use assertr::prelude::*;
use keycloak_implicit_auth::{
    ConfigInput, Environment, FixedClock, Hook, Intention, KeyValueStore, KnownOidcErrorCode,
    ManualScheduler, MemoryStore, Navigator, OidcErrorCode, PageLoadOutcome, Prompt,
    RecordingNavigator, RedirectLanding, SessionAuthManager, Url,
};
use serde_json::json;
use time::OffsetDateTime;

mod common;

const NOW: i64 = 1_700_000_000;
const BASE_AUTH_ENDPOINT: &str =
    "https://sso-dev.pathfinder.gov.bc.ca/auth/realms/someRealm/protocol/openid-connect/auth";

struct Browser {
    store: MemoryStore,
    navigator: RecordingNavigator,
    scheduler: ManualScheduler,
    clock: FixedClock,
    fired: Rc<RefCell<Vec<Hook>>>,
}

impl Browser {
    fn new() -> Self {
        common::tracing::init_subscriber();
        Self {
            store: MemoryStore::new(),
            navigator: RecordingNavigator::new("https://app.example"),
            scheduler: ManualScheduler::new(),
            clock: FixedClock::new(OffsetDateTime::from_unix_timestamp(NOW).unwrap()),
            fired: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// A manager as freshly constructed on page load, recording every hook it fires.
    fn load_page(&self, document: serde_json::Value) -> SessionAuthManager {
        let mut input = ConfigInput::new(document);
        for hook in Hook::ALL {
            let fired = self.fired.clone();
            input = input.hook(hook.as_str(), move || fired.borrow_mut().push(hook));
        }
        let env = Environment::new(
            self.store.clone(),
            self.navigator.clone(),
            self.scheduler.clone(),
        )
        .with_clock(self.clock.clone());
        SessionAuthManager::new(input, env).unwrap()
    }

    fn take_fired(&self) -> Vec<Hook> {
        std::mem::take(&mut *self.fired.borrow_mut())
    }

    fn stored_request_key(&self) -> Option<String> {
        let raw = self.store.get("sso").unwrap()?;
        let record: serde_json::Value = serde_json::from_str(&raw).unwrap();
        record["requestKey"].as_str().map(ToOwned::to_owned)
    }
}

fn pathfinder() -> serde_json::Value {
    json!({
        "clientId": "aweb-app",
        "baseURL": "https://sso-dev.pathfinder.gov.bc.ca",
        "realmName": "someRealm",
        "redirectURI": "mysite.com",
    })
}

fn sha256_hex(value: &str) -> String {
    use sha2::{Digest, Sha256};
    format!("{:x}", Sha256::digest(value.as_bytes()))
}

fn mint(claims: serde_json::Value) -> String {
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(b"keycloak-realm-secret"),
    )
    .unwrap()
}

/// Walk through a login: build the login uri, then land back with tokens bound to its nonce.
fn land_with_tokens(browser: &Browser, expires_in: i64) {
    let manager = browser.load_page(pathfinder());
    manager.sso_login_uri(Prompt::Login).unwrap();
    let nonce = sha256_hex(&browser.stored_request_key().unwrap());

    let access_token = mint(json!({ "exp": NOW + expires_in, "nonce": nonce }));
    let id_token = mint(json!({ "exp": NOW + expires_in, "nonce": nonce, "sub": "someone" }));
    browser
        .navigator
        .set_fragment(format!("#access_token={access_token}&id_token={id_token}"));
}

#[test]
fn logout_uri_for_static_redirect_uri() {
    let browser = Browser::new();
    let manager = browser.load_page(pathfinder());

    assert_that(manager.sso_logout_uri().unwrap()).is_equal_to(
        "https://sso-dev.pathfinder.gov.bc.ca/auth/realms/someRealm/protocol/openid-connect/logout?redirect_uri=mysite.com?intention=LOGOUT&sso=true".to_owned(),
    );
}

#[test]
fn login_uri_for_static_redirect_uri() {
    let browser = Browser::new();
    let manager = browser.load_page(pathfinder());

    let uri = manager.sso_login_uri(Prompt::default()).unwrap();

    let nonce = sha256_hex(&browser.stored_request_key().unwrap());
    assert_that(uri).is_equal_to(format!(
        "{BASE_AUTH_ENDPOINT}?response_type=id_token&prompt=login&client_id=aweb-app&nonce={nonce}&redirect_uri=mysite.com?intention=LOGIN&sso=true"
    ));
}

#[test]
fn login_uri_encodes_response_type() {
    let browser = Browser::new();
    let mut document = pathfinder();
    document["loginURIResponseType"] = json!("id_token token");
    let manager = browser.load_page(document);

    assert_that(manager.sso_login_uri(Prompt::Consent).unwrap().as_str())
        .contains("?response_type=id_token%20token&prompt=consent&");
}

#[test]
fn redirect_landing_reveals_intention() {
    let browser = Browser::new();
    let mut document = pathfinder();
    document["redirectURI"] = json!("https://app.example/");
    let manager = browser.load_page(document);

    let landing = Url::parse(&manager.sso_redirect_uri(Intention::Logout).unwrap()).unwrap();

    assert_that(RedirectLanding::from_url(&landing)).is_equal_to(Some(RedirectLanding {
        intention: Intention::Logout,
    }));
}

#[test]
fn first_visit_redirects_to_silent_login() {
    let browser = Browser::new();
    let manager = browser.load_page(pathfinder());

    let outcome = manager.handle_page_load().unwrap();

    let uri = match outcome {
        PageLoadOutcome::RedirectedToLogin { uri } => uri,
        other => panic!("expected redirect to login, got {other:?}"),
    };
    assert_that(uri.as_str()).starts_with(BASE_AUTH_ENDPOINT);
    assert_that(uri.as_str()).contains("&prompt=none&");
    assert_that(browser.navigator.navigations()).is_equal_to(vec![uri]);
    assert_that(browser.take_fired()).is_equal_to(vec![Hook::OnBeforeAuthRedirect]);
    assert_that(browser.stored_request_key().is_some()).is_true();
}

#[test]
fn landing_with_tokens_for_our_nonce_authenticates() {
    let browser = Browser::new();
    land_with_tokens(&browser, 60);

    let manager = browser.load_page(pathfinder());
    let outcome = manager.handle_page_load().unwrap();

    let timers = match outcome {
        PageLoadOutcome::CallbackAccepted { timers } => timers,
        other => panic!("expected accepted callback, got {other:?}"),
    };
    assert_that(timers.len()).is_equal_to(2);
    assert_that(browser.take_fired())
        .is_equal_to(vec![Hook::OnAfterAuthRedirect, Hook::OnAuthenticateSuccess]);
    assert_that(manager.is_authenticated().unwrap()).is_true();
    assert_that(manager.are_tokens_expired().unwrap()).is_false();
    assert_that(browser.stored_request_key().is_none())
        .with_detail_message("The nonce must be cleared once a callback was handled.")
        .is_true();
    assert_that(
        manager
            .id_token()
            .unwrap()
            .unwrap()
            .remaining
            .get("sub")
            .cloned(),
    )
    .is_equal_to(Some(json!("someone")));
}

#[test]
fn tokens_expire_while_the_page_is_open() {
    let browser = Browser::new();
    land_with_tokens(&browser, 60);
    browser.load_page(pathfinder()).handle_page_load().unwrap();
    browser.take_fired();

    browser.scheduler.advance(Duration::from_secs(59));
    assert_that(browser.take_fired().len()).is_equal_to(0);

    browser.scheduler.advance(Duration::from_secs(1));
    browser.clock.advance(time::Duration::seconds(61));
    assert_that(browser.take_fired())
        .is_equal_to(vec![Hook::OnTokenExpired, Hook::OnTokenExpired]);

    let manager = browser.load_page(pathfinder());
    assert_that(manager.is_authenticated().unwrap()).is_false();
    assert_that(manager.are_tokens_expired().unwrap()).is_true();
}

#[test]
fn reload_while_authenticated_arms_timers_again() {
    let browser = Browser::new();
    land_with_tokens(&browser, 120);
    browser.load_page(pathfinder()).handle_page_load().unwrap();
    browser.navigator.set_fragment("");
    browser.take_fired();

    let outcome = browser.load_page(pathfinder()).handle_page_load().unwrap();

    let timers = match outcome {
        PageLoadOutcome::Authenticated { timers } => timers,
        other => panic!("expected authenticated, got {other:?}"),
    };
    assert_that(timers.len()).is_equal_to(2);
    assert_that(browser.take_fired()).is_equal_to(vec![Hook::OnAuthenticateSuccess]);
    assert_that(browser.navigator.navigations().len()).is_equal_to(0);
}

#[test]
fn cancelled_expiry_timers_stay_silent() {
    let browser = Browser::new();
    land_with_tokens(&browser, 60);
    let outcome = browser.load_page(pathfinder()).handle_page_load().unwrap();
    browser.take_fired();

    if let PageLoadOutcome::CallbackAccepted { timers } = outcome {
        for timer in timers {
            timer.cancel();
        }
    }
    browser.scheduler.advance(Duration::from_secs(3600));

    assert_that(browser.take_fired().len()).is_equal_to(0);
    assert_that(browser.scheduler.pending()).is_equal_to(0);
}

#[test]
fn tokens_from_another_login_attempt_are_rejected() {
    let browser = Browser::new();
    land_with_tokens(&browser, 60);
    // A second login attempt replaces the nonce the tokens were issued for.
    browser
        .load_page(pathfinder())
        .sso_login_uri(Prompt::Login)
        .unwrap();
    browser.store.set("unrelated", "kept").unwrap();

    let manager = browser.load_page(pathfinder());
    let outcome = manager.handle_page_load().unwrap();

    assert_that(matches!(
        outcome,
        PageLoadOutcome::CallbackRejected { error: None }
    ))
    .is_true();
    assert_that(browser.take_fired()).is_equal_to(vec![
        Hook::OnAfterAuthRedirect,
        Hook::OnAuthenticateFail,
        Hook::OnAuthLocalStorageCleared,
    ]);
    assert_that(browser.store.get("auth").unwrap().is_none()).is_true();
    assert_that(browser.store.get("sso").unwrap().is_none()).is_true();
    assert_that(browser.store.get("unrelated").unwrap())
        .is_equal_to(Some("kept".to_owned()));
}

#[test]
fn error_from_authorization_server_counts_as_a_callback_without_tokens() {
    let browser = Browser::new();
    browser.load_page(pathfinder()).handle_page_load().unwrap();
    browser
        .navigator
        .set_fragment("#error=login_required&error_description=Login+required&state=x");
    browser.take_fired();

    let manager = browser.load_page(pathfinder());
    let error = manager.callback_fragment().authorization_error().unwrap();
    assert_that(error.error.clone()).is_equal_to(OidcErrorCode::Known(KnownOidcErrorCode::LoginRequired));
    assert_that(error.requires_interaction()).is_true();

    let outcome = manager.handle_page_load().unwrap();

    let timers = match outcome {
        PageLoadOutcome::CallbackAccepted { timers } => timers,
        other => panic!("expected accepted callback, got {other:?}"),
    };
    assert_that(timers.len()).is_equal_to(0);
    assert_that(browser.take_fired()).is_equal_to(vec![
        Hook::OnAfterAuthRedirect,
        Hook::OnAuthenticateSuccess,
    ]);
    assert_that(browser.store.get("auth").unwrap()).is_equal_to(Some("{}".to_owned()));
    assert_that(browser.store.get("sso").unwrap().is_none()).is_true();
    assert_that(manager.is_authenticated().unwrap()).is_false();
}

#[test]
fn complete_fragment_with_session_state_is_not_used() {
    let browser = Browser::new();
    land_with_tokens(&browser, 60);
    let fragment = browser.navigator.current_fragment();
    browser
        .navigator
        .set_fragment(format!("{fragment}&session_state=abc"));
    browser.take_fired();

    let manager = browser.load_page(pathfinder());
    let outcome = manager.handle_page_load().unwrap();

    assert_that(matches!(outcome, PageLoadOutcome::InvalidCallback)).is_true();
    assert_that(browser.take_fired()).is_equal_to(vec![Hook::OnAuthLocalStorageCleared]);
    assert_that(browser.store.is_empty()).is_true();
    assert_that(manager.is_authenticated().unwrap()).is_false();
}

#[test]
fn legacy_storage_values_are_tolerated() {
    let browser = Browser::new();
    browser.store.set("auth", "not json at all").unwrap();
    browser.store.set("sso", "some value").unwrap();
    let manager = browser.load_page(pathfinder());

    assert_that(manager.auth_data().unwrap().is_none()).is_true();
    assert_that(manager.is_authenticated().unwrap()).is_false();
    assert_that(manager.are_tokens_expired().unwrap()).is_true();
    assert_that(manager.is_a_replay_attack(Some("some value")).unwrap()).is_true();
}
