use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;
use std::str::FromStr;

/// Callback invoked when a lifecycle hook fires.
pub type HookFn = Rc<dyn Fn()>;

/// The closed set of lifecycle hooks a manager may fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Hook {
    /// Fired right before navigating to the authorization server.
    OnBeforeAuthRedirect,
    /// Fired after `sso` and `auth` were removed from storage.
    OnAuthLocalStorageCleared,
    /// Fired once per stored token when that token expires.
    OnTokenExpired,
    OnAuthenticateSuccess,
    OnAuthenticateFail,
    /// Fired when landing back from the authorization server with a usable fragment.
    OnAfterAuthRedirect,
}

impl Hook {
    pub const ALL: [Hook; 6] = [
        Hook::OnBeforeAuthRedirect,
        Hook::OnAuthLocalStorageCleared,
        Hook::OnTokenExpired,
        Hook::OnAuthenticateSuccess,
        Hook::OnAuthenticateFail,
        Hook::OnAfterAuthRedirect,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Hook::OnBeforeAuthRedirect => "onBeforeAuthRedirect",
            Hook::OnAuthLocalStorageCleared => "onAuthLocalStorageCleared",
            Hook::OnTokenExpired => "onTokenExpired",
            Hook::OnAuthenticateSuccess => "onAuthenticateSuccess",
            Hook::OnAuthenticateFail => "onAuthenticateFail",
            Hook::OnAfterAuthRedirect => "onAfterAuthRedirect",
        }
    }
}

impl std::fmt::Display for Hook {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownHook(pub String);

impl FromStr for Hook {
    type Err = UnknownHook;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hook::ALL
            .into_iter()
            .find(|hook| hook.as_str() == s)
            .ok_or_else(|| UnknownHook(s.to_owned()))
    }
}

/// One handler per [`Hook`]. Hooks without a registered handler do nothing.
#[derive(Clone, Default)]
pub struct Hooks {
    handlers: BTreeMap<Hook, HookFn>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `hook`, replacing any previous handler.
    pub fn set(&mut self, hook: Hook, handler: HookFn) {
        self.handlers.insert(hook, handler);
    }

    pub fn with(mut self, hook: Hook, handler: impl Fn() + 'static) -> Self {
        self.set(hook, Rc::new(handler));
        self
    }

    pub fn is_registered(&self, hook: Hook) -> bool {
        self.handlers.contains_key(&hook)
    }

    pub(crate) fn handler(&self, hook: Hook) -> Option<HookFn> {
        self.handlers.get(&hook).cloned()
    }

    pub(crate) fn fire(&self, hook: Hook) {
        tracing::trace!(%hook, "Firing hook");
        if let Some(handler) = self.handlers.get(&hook) {
            handler();
        }
    }
}

impl Debug for Hooks {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}
