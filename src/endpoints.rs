use crate::{AuthorizationEndpoint, EndSessionEndpoint};

/// Endpoint uris derived once from the configured base url and realm.
///
/// Both follow the Keycloak layout `{base_url}/auth/realms/{realm}/protocol/openid-connect/...`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::struct_field_names)] // Allow all field names to end with `_endpoint`.
pub struct DerivedEndpoints {
    pub(crate) authorization_endpoint: AuthorizationEndpoint,
    pub(crate) end_session_endpoint: EndSessionEndpoint,
}

impl DerivedEndpoints {
    pub(crate) fn new(base_url: &str, realm_name: &str) -> Self {
        let base = format!("{base_url}/auth/realms/{realm_name}/protocol/openid-connect");
        Self {
            authorization_endpoint: format!("{base}/auth"),
            end_session_endpoint: format!("{base}/logout"),
        }
    }

    pub fn authorization_endpoint(&self) -> &str {
        &self.authorization_endpoint
    }

    pub fn end_session_endpoint(&self) -> &str {
        &self.end_session_endpoint
    }
}
