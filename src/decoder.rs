use snafu::{ResultExt, Snafu};

use crate::token::TokenClaims;

#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DecodeError {
    #[snafu(display("DecodeError: Could not decode JWT. Input may have the wrong format"))]
    Decode { source: jsonwebtoken::errors::Error },

    #[snafu(display("DecodeError: {message}"))]
    Custom { message: String },
}

/// Parses a compact token into its claims.
pub trait TokenDecoder {
    fn decode(&self, token: &str) -> Result<TokenClaims, DecodeError>;
}

/// Reads the payload of a JWT without verifying its signature or any of its claims.
///
/// Tokens arrive through the url fragment of the browser's own navigation and are only used to
/// learn their expiry and nonce. Never use the decoded claims for authorization decisions on a
/// server.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnverifiedJwtDecoder;

impl TokenDecoder for UnverifiedJwtDecoder {
    fn decode(&self, token: &str) -> Result<TokenClaims, DecodeError> {
        let mut validation = jsonwebtoken::Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let token_data = jsonwebtoken::decode::<TokenClaims>(
            token,
            &jsonwebtoken::DecodingKey::from_secret(&[]),
            &validation,
        )
        .context(DecodeSnafu {})?;

        tracing::trace!(header = ?token_data.header, claims = ?token_data.claims, "Decoded JWT");
        Ok(token_data.claims)
    }
}
