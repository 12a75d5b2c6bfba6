use crate::response::{AuthorizationError, OidcErrorCode};

/// Extract the value of parameter `name` from a url fragment like `#a=1&b=2`.
///
/// A parameter starts after a `#` or `&` and its value runs up to the next `&`, so values may
/// contain `#` and other fragment-safe punctuation. Plus signs decode to spaces and percent
/// escapes are resolved. Returns `None` if the parameter is absent.
pub fn get_parameter_by_name(fragment: &str, name: &str) -> Option<String> {
    if name.is_empty() {
        return None;
    }
    let bytes = fragment.as_bytes();
    let mut search_from = 0;
    while let Some(offset) = fragment[search_from..].find(name) {
        let start = search_from + offset;
        let value_start = start + name.len();
        let delimited = start > 0 && matches!(bytes[start - 1], b'#' | b'&');
        if delimited && bytes.get(value_start) == Some(&b'=') {
            let value_start = value_start + 1;
            let value_end = fragment[value_start..]
                .find('&')
                .map_or(fragment.len(), |end| value_start + end);
            return Some(decode_component(&fragment[value_start..value_end]));
        }
        search_from = start + 1;
        while !fragment.is_char_boundary(search_from) {
            search_from += 1;
        }
    }
    None
}

fn decode_component(raw: &str) -> String {
    let raw = raw.replace('+', " ");
    match urlencoding::decode(&raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(err) => {
            tracing::debug!(?err, "Fragment value is not valid UTF-8 once decoded. Using it as is.");
            raw
        }
    }
}

/// The parameters of a redirect back from the authorization server we care about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackFragment {
    pub access_token: Option<String>,
    pub id_token: Option<String>,
    pub session_state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl CallbackFragment {
    pub fn parse(fragment: &str) -> Self {
        Self {
            access_token: access_token_from_fragment(fragment),
            id_token: id_token_from_fragment(fragment),
            session_state: session_state_from_fragment(fragment),
            error: error_from_fragment(fragment),
            error_description: get_parameter_by_name(fragment, "error_description"),
        }
    }

    /// A redirect carries at least one of `access_token`, `id_token` or `error`.
    pub fn is_sso_redirect(&self) -> bool {
        self.access_token.is_some() || self.id_token.is_some() || self.error.is_some()
    }

    /// Accepts the fragment when `session_state` is missing or either token is missing.
    ///
    /// This is intentionally loose: a fragment carrying `session_state` and both tokens is
    /// rejected, while an error-only fragment is accepted.
    pub fn is_valid_for_authentication(&self) -> bool {
        self.session_state.is_none() || self.id_token.is_none() || self.access_token.is_none()
    }

    pub fn authorization_error(&self) -> Option<AuthorizationError> {
        self.error.as_deref().map(|error| AuthorizationError {
            error: OidcErrorCode::parse(error),
            error_description: self.error_description.clone(),
        })
    }
}

pub fn access_token_from_fragment(fragment: &str) -> Option<String> {
    get_parameter_by_name(fragment, "access_token")
}

pub fn id_token_from_fragment(fragment: &str) -> Option<String> {
    get_parameter_by_name(fragment, "id_token")
}

pub fn error_from_fragment(fragment: &str) -> Option<String> {
    get_parameter_by_name(fragment, "error")
}

pub fn session_state_from_fragment(fragment: &str) -> Option<String> {
    get_parameter_by_name(fragment, "session_state")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::KnownOidcErrorCode;
    use assertr::prelude::*;

    const FRAGMENT: &str = "#value1=23109482304923&complexValue=#$*)4!@#(*dsf8ad9f08a7sdf981239816547836423&anotherValue=true";

    #[test]
    fn extracts_parameters_from_fragment() {
        assert_that(get_parameter_by_name(FRAGMENT, "value1"))
            .is_equal_to(Some("23109482304923".to_owned()));
        assert_that(get_parameter_by_name(FRAGMENT, "complexValue"))
            .is_equal_to(Some("#$*)4!@#(*dsf8ad9f08a7sdf981239816547836423".to_owned()));
        assert_that(get_parameter_by_name(FRAGMENT, "anotherValue"))
            .is_equal_to(Some("true".to_owned()));
    }

    #[test]
    fn absent_parameter_yields_none() {
        assert_that(get_parameter_by_name(FRAGMENT, "notARealValue").is_none()).is_true();
        assert_that(get_parameter_by_name(FRAGMENT, "").is_none()).is_true();
    }

    #[test]
    fn name_must_be_delimited() {
        let fragment = "#xaccess_token=wrong&other=1";
        assert_that(get_parameter_by_name(fragment, "access_token").is_none()).is_true();

        let fragment = "#access_token_hint=wrong&access_token=right";
        assert_that(get_parameter_by_name(fragment, "access_token"))
            .is_equal_to(Some("right".to_owned()));
    }

    #[test]
    fn values_are_url_decoded() {
        let encoded = urlencoding::encode("a value with & and = and #");
        let fragment = format!("#state=1&description={encoded}&x=y");
        assert_that(get_parameter_by_name(&fragment, "description"))
            .is_equal_to(Some("a value with & and = and #".to_owned()));

        assert_that(get_parameter_by_name("#msg=hello+world", "msg"))
            .is_equal_to(Some("hello world".to_owned()));
    }

    #[test]
    fn empty_value_is_present() {
        assert_that(get_parameter_by_name("#a=&b=1", "a")).is_equal_to(Some(String::new()));
    }

    #[test]
    fn detects_sso_redirects() {
        let fragment = CallbackFragment::parse(
            "#session_state=123123&access_token=342109908dfjlsdf&id_token=32123908123",
        );
        assert_that(fragment.is_sso_redirect()).is_true();
        assert_that(CallbackFragment::parse("#error=login_required").is_sso_redirect()).is_true();
        assert_that(CallbackFragment::parse("#page=2").is_sso_redirect()).is_false();
        assert_that(CallbackFragment::parse("").is_sso_redirect()).is_false();
    }

    #[test]
    fn validity_check_is_loose() {
        let complete = CallbackFragment::parse("#session_state=1&access_token=a&id_token=b");
        assert_that(complete.is_valid_for_authentication()).is_false();

        let id_only = CallbackFragment::parse("#session_state=1&id_token=b");
        assert_that(id_only.is_valid_for_authentication()).is_true();

        let no_session_state = CallbackFragment::parse("#access_token=a&id_token=b");
        assert_that(no_session_state.is_valid_for_authentication()).is_true();
    }

    #[test]
    fn error_fragments_are_typed() {
        let fragment = CallbackFragment::parse(
            "#error=login_required&error_description=Login+required&state=abc",
        );
        let err = fragment.authorization_error().unwrap();
        assert_that(err.error)
            .is_equal_to(OidcErrorCode::Known(KnownOidcErrorCode::LoginRequired));
        assert_that(err.error_description).is_equal_to(Some("Login required".to_owned()));
    }
}
