//! Access credential inspection.
//!
//! Decodes the JWT payload WITHOUT verifying its signature. The result only
//! decides whether a refresh is worth attempting; the server stays the sole
//! authority on whether a credential is valid.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::domain::foundation::{Timestamp, ValidationError};

/// Claims read from an access credential.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CredentialClaims {
    /// Subject, the account email for this service.
    pub sub: Option<String>,
    /// Expiry in seconds since the Unix epoch.
    pub exp: Option<i64>,
}

fn unverified_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    validation
}

/// Reads the claims of a JWT without checking its signature.
///
/// # Errors
///
/// Returns `ValidationError::InvalidFormat` if the token is not a decodable JWT.
pub fn decode_claims(token: &str) -> Result<CredentialClaims, ValidationError> {
    let key = DecodingKey::from_secret(&[]);
    decode::<CredentialClaims>(token, &key, &unverified_validation())
        .map(|data| data.claims)
        .map_err(|e| ValidationError::invalid_format("access_credential", e.to_string()))
}

/// Whether the credential is expired at `now`, allowing `leeway_secs` of
/// early expiry.
///
/// Malformed tokens and tokens without an `exp` claim count as expired.
pub fn is_expired_at(token: &str, now: Timestamp, leeway_secs: i64) -> bool {
    match decode_claims(token) {
        Ok(CredentialClaims { exp: Some(exp), .. }) => exp <= now.unix_seconds() + leeway_secs,
        Ok(_) => {
            tracing::debug!("Access credential has no exp claim, treating as expired");
            true
        }
        Err(e) => {
            tracing::debug!("Access credential could not be decoded: {}", e);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use proptest::prelude::*;
    use serde_json::json;

    fn token(claims: serde_json::Value) -> String {
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"not-the-server-key"),
        )
        .unwrap()
    }

    fn is_expired(token: &str) -> bool {
        is_expired_at(token, Timestamp::now(), 0)
    }

    #[test]
    fn future_expiry_is_not_expired() {
        let exp = Timestamp::now().plus_seconds(3600).unix_seconds();
        assert!(!is_expired(&token(json!({ "sub": "a@b.c", "exp": exp }))));
    }

    #[test]
    fn past_expiry_is_expired() {
        let exp = Timestamp::now().plus_seconds(-60).unix_seconds();
        assert!(is_expired(&token(json!({ "sub": "a@b.c", "exp": exp }))));
    }

    #[test]
    fn leeway_expires_tokens_early() {
        let now = Timestamp::now();
        let t = token(json!({ "exp": now.plus_seconds(20).unix_seconds() }));
        assert!(!is_expired_at(&t, now, 0));
        assert!(is_expired_at(&t, now, 30));
    }

    #[test]
    fn missing_exp_is_expired() {
        assert!(is_expired(&token(json!({ "sub": "a@b.c" }))));
    }

    #[test]
    fn signature_is_not_checked() {
        let exp = Timestamp::now().plus_seconds(3600).unix_seconds();
        let claims = decode_claims(&token(json!({ "sub": "user@example.com", "exp": exp })))
            .unwrap();
        assert_eq!(claims.sub.as_deref(), Some("user@example.com"));
        assert_eq!(claims.exp, Some(exp));
    }

    #[test]
    fn audience_claim_does_not_break_decoding() {
        let exp = Timestamp::now().plus_seconds(3600).unix_seconds();
        let t = token(json!({ "sub": "x", "exp": exp, "aud": "lottomate" }));
        assert!(!is_expired(&t));
    }

    #[test]
    fn garbage_is_expired() {
        assert!(is_expired(""));
        assert!(is_expired("not-a-jwt"));
        assert!(is_expired("a.b.c"));
    }

    proptest! {
        #[test]
        fn arbitrary_strings_fail_closed(s in "[A-Za-z0-9._-]{0,64}") {
            // Random input is never a well-formed JWT with a future exp.
            prop_assert!(is_expired(&s));
        }
    }
}
