use std::fmt::{Debug, Formatter};
use std::rc::Rc;
use std::str::FromStr;
use url::Url;

/// Resolves the redirect uri for an [`Intention`]. Returning `None` means no uri can be given.
pub type RedirectUriFn = Rc<dyn Fn(Intention) -> Option<String>>;

/// Which flow a round-trip through the authorization server was started for.
///
/// Travels as the `intention` query parameter of the redirect uri, so the application can tell
/// what just completed when the browser lands back on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intention {
    Login,
    Logout,
}

impl Intention {
    pub const ALL: [Intention; 2] = [Intention::Login, Intention::Logout];

    pub fn as_str(self) -> &'static str {
        match self {
            Intention::Login => "LOGIN",
            Intention::Logout => "LOGOUT",
        }
    }
}

impl std::fmt::Display for Intention {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownIntention(pub String);

impl FromStr for Intention {
    type Err = UnknownIntention;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Intention::ALL
            .into_iter()
            .find(|it| it.as_str() == s)
            .ok_or_else(|| UnknownIntention(s.to_owned()))
    }
}

/// Where the authorization server should send the browser back to.
#[derive(Clone)]
pub enum RedirectUri {
    /// A fixed uri. The intention and an `sso=true` marker are appended as query parameters.
    Static(String),

    /// A user supplied function receiving the intention, returning the full uri.
    Dynamic(RedirectUriFn),
}

impl RedirectUri {
    pub fn dynamic(resolver: impl Fn(Intention) -> Option<String> + 'static) -> Self {
        Self::Dynamic(Rc::new(resolver))
    }

    pub fn resolve(&self, intention: Intention) -> Option<String> {
        match self {
            RedirectUri::Static(uri) => Some(format!("{uri}?intention={intention}&sso=true")),
            RedirectUri::Dynamic(resolver) => resolver(intention),
        }
    }
}

impl Debug for RedirectUri {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RedirectUri::Static(uri) => f.debug_tuple("Static").field(uri).finish(),
            RedirectUri::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// The markers a static redirect uri carries when the browser lands back on the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedirectLanding {
    pub intention: Intention,
}

impl RedirectLanding {
    /// Read `intention` and `sso=true` from the query of the url the browser landed on.
    /// Returns `None` for urls not produced by a static redirect uri.
    pub fn from_url(url: &Url) -> Option<Self> {
        let mut intention = None;
        let mut sso = false;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "intention" => intention = value.parse::<Intention>().ok(),
                "sso" => sso = value == "true",
                _ => {}
            }
        }
        match (sso, intention) {
            (true, Some(intention)) => Some(Self { intention }),
            _ => None,
        }
    }
}

/// Percent-encode everything but the characters allowed to appear anywhere in a uri,
/// leaving reserved delimiters such as `?`, `&`, `=` and `#` untouched.
pub(crate) fn encode_uri(uri: &str) -> String {
    const PRESERVED: &str = ";,/?:@&=+$-_.!~*'()#";

    let mut encoded = String::with_capacity(uri.len());
    let mut buf = [0u8; 4];
    for c in uri.chars() {
        if c.is_ascii_alphanumeric() || PRESERVED.contains(c) {
            encoded.push(c);
        } else {
            encoded.push_str(&urlencoding::encode(c.encode_utf8(&mut buf)));
        }
    }
    encoded
}
