use serde_json::{Map, Value};
use snafu::{OptionExt, ResultExt};
use std::fmt::Formatter;
use std::rc::Rc;
use std::str::FromStr;

use crate::error::{
    BaseUrlSchemeSnafu, BaseUrlSnafu, ClientIdSnafu, ConfigError, HookNotCallableSnafu,
    HooksTypeSnafu, NotAnObjectSnafu, ParseSnafu, RealmNameSnafu, RedirectUriReturnSnafu,
    RedirectUriTypeSnafu, ResponseTypeInvalidSnafu, ResponseTypeTypeSnafu, UnknownHookSnafu,
};
use crate::hooks::{Hook, HookFn, Hooks};
use crate::redirect::{Intention, RedirectUri, RedirectUriFn};

/// The `response_type` requested from the authorization endpoint.
///
/// See <https://openid.net/specs/openid-connect-core-1_0.html#ImplicitAuthRequest>
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ResponseType {
    #[default]
    IdToken,
    Token,
    IdTokenToken,
}

impl ResponseType {
    pub const ALL: [ResponseType; 3] = [
        ResponseType::IdToken,
        ResponseType::Token,
        ResponseType::IdTokenToken,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResponseType::IdToken => "id_token",
            ResponseType::Token => "token",
            ResponseType::IdTokenToken => "id_token token",
        }
    }
}

impl std::fmt::Display for ResponseType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownResponseType(pub String);

impl FromStr for ResponseType {
    type Err = UnknownResponseType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResponseType::ALL
            .into_iter()
            .find(|it| it.as_str() == s)
            .ok_or_else(|| UnknownResponseType(s.to_owned()))
    }
}

/// Raw, unvalidated configuration.
///
/// The data part is a JSON document using the keys `clientId`, `baseURL`, `realmName`,
/// `redirectURI`, `loginURIResponseType` and `hooks`. Functions cannot be expressed in JSON and
/// are attached with [`ConfigInput::redirect_uri_with`] and [`ConfigInput::hook`].
#[derive(Clone)]
pub struct ConfigInput {
    document: Value,
    redirect_uri: Option<RedirectUriFn>,
    hooks: Vec<(String, HookFn)>,
}

impl ConfigInput {
    pub fn new(document: Value) -> Self {
        Self {
            document,
            redirect_uri: None,
            hooks: Vec::new(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let document = serde_json::from_str::<Value>(json).context(ParseSnafu {})?;
        Ok(Self::new(document))
    }

    /// Resolve the redirect uri by calling `resolver` with the intention of each round-trip.
    /// Takes precedence over a `redirectURI` given in the document.
    pub fn redirect_uri_with(
        mut self,
        resolver: impl Fn(Intention) -> Option<String> + 'static,
    ) -> Self {
        self.redirect_uri = Some(Rc::new(resolver));
        self
    }

    /// Attach a handler for the hook called `name`, e.g. `"onAuthenticateSuccess"`.
    /// Names are checked during validation.
    pub fn hook(mut self, name: impl Into<String>, handler: impl Fn() + 'static) -> Self {
        self.hooks.push((name.into(), Rc::new(handler)));
        self
    }
}

impl std::fmt::Debug for ConfigInput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigInput")
            .field("document", &self.document)
            .field("redirect_uri", &self.redirect_uri.as_ref().map(|_| ".."))
            .field(
                "hooks",
                &self.hooks.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl From<Value> for ConfigInput {
    fn from(document: Value) -> Self {
        Self::new(document)
    }
}

/// Validated configuration. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct Config {
    client_id: String,
    base_url: String,
    realm_name: String,
    redirect_uri: Option<RedirectUri>,
    login_uri_response_type: ResponseType,
    hooks: Hooks,
}

impl Config {
    /// Validate `input`, failing on the first violated rule.
    ///
    /// Rules are checked in this order: the document must be an object; `clientId`, `baseURL`
    /// (which must use `https://`) and `realmName` must be non-empty strings; `redirectURI` must
    /// be a string or a resolver producing a uri for [`Intention::Login`];
    /// `loginURIResponseType` must name a [`ResponseType`]; `hooks` must be an object of known
    /// hooks mapping to functions. Optional values which are `null`, `false`, `0` or `""` count
    /// as absent.
    pub fn validate(input: ConfigInput) -> Result<Self, ConfigError> {
        let ConfigInput {
            document,
            redirect_uri: redirect_uri_resolver,
            hooks: hook_handlers,
        } = input;

        let Value::Object(document) = document else {
            return NotAnObjectSnafu.fail();
        };

        let client_id = required_string(&document, "clientId").context(ClientIdSnafu)?;
        let base_url = required_string(&document, "baseURL").context(BaseUrlSnafu)?;
        if !base_url.starts_with("https://") {
            return BaseUrlSchemeSnafu.fail();
        }
        let realm_name = required_string(&document, "realmName").context(RealmNameSnafu)?;

        let declared_redirect_uri = match optional(&document, "redirectURI") {
            None => None,
            Some(Value::String(uri)) => Some(uri),
            Some(_) => return RedirectUriTypeSnafu.fail(),
        };
        let redirect_uri = match redirect_uri_resolver {
            Some(resolver) => {
                if resolver(Intention::Login).is_none() {
                    return RedirectUriReturnSnafu.fail();
                }
                Some(RedirectUri::Dynamic(resolver))
            }
            None => declared_redirect_uri.map(|uri| RedirectUri::Static(uri.clone())),
        };

        let login_uri_response_type = match optional(&document, "loginURIResponseType") {
            None => ResponseType::default(),
            Some(Value::String(response_type)) => response_type
                .parse::<ResponseType>()
                .ok()
                .context(ResponseTypeInvalidSnafu)?,
            Some(_) => return ResponseTypeTypeSnafu.fail(),
        };

        let mut hooks = Hooks::new();
        match optional(&document, "hooks") {
            None => {}
            Some(Value::Object(declared)) => {
                if let Some(name) = declared.keys().next() {
                    // JSON cannot carry functions, so any declared hook is either unknown or not callable.
                    return match Hook::from_str(name) {
                        Ok(_) => HookNotCallableSnafu { name }.fail(),
                        Err(_) => UnknownHookSnafu { name }.fail(),
                    };
                }
            }
            Some(_) => return HooksTypeSnafu.fail(),
        }
        for (name, handler) in hook_handlers {
            let hook = Hook::from_str(&name)
                .ok()
                .context(UnknownHookSnafu { name: name.clone() })?;
            hooks.set(hook, handler);
        }

        let config = Self {
            client_id: client_id.to_owned(),
            base_url: base_url.to_owned(),
            realm_name: realm_name.to_owned(),
            redirect_uri,
            login_uri_response_type,
            hooks,
        };
        tracing::trace!(?config, "Validated config");
        Ok(config)
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn realm_name(&self) -> &str {
        &self.realm_name
    }

    /// The configured redirect uri. `None` means the current origin is used.
    pub fn redirect_uri(&self) -> Option<&RedirectUri> {
        self.redirect_uri.as_ref()
    }

    pub fn login_uri_response_type(&self) -> ResponseType {
        self.login_uri_response_type
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }
}

impl TryFrom<ConfigInput> for Config {
    type Error = ConfigError;

    fn try_from(input: ConfigInput) -> Result<Self, Self::Error> {
        Config::validate(input)
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::String(text) => text.is_empty(),
        Value::Number(number) => number.as_f64() == Some(0.0),
        _ => false,
    }
}

fn optional<'a>(document: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    document.get(key).filter(|value| !is_falsy(value))
}

fn required_string<'a>(document: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    optional(document, key).and_then(Value::as_str)
}
