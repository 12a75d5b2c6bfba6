use crate::redirect::encode_uri;

pub(crate) fn create_logout_uri(end_session_endpoint: &str, redirect_uri: &str) -> String {
    let logout_uri = format!("{end_session_endpoint}?redirect_uri={redirect_uri}");
    encode_uri(&logout_uri)
}
