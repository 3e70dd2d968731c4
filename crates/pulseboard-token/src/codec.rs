//! Splitting and decoding credential strings.
//!
//! A credential looks like `header.payload.signature`, each part
//! base64url-encoded. We only ever decode the middle part. Anything that
//! does not have that shape is treated as unusable: [`TokenCodec::decode`]
//! reports why, and [`TokenCodec::is_expired`] simply says "expired" so
//! callers never have to branch on a decoding error.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::{Claims, TokenError};

/// Decodes credentials into [`Claims`] and answers expiry questions.
///
/// Stateless and `Copy`; hold one wherever it is needed.
///
/// ## Example
///
/// ```rust
/// use pulseboard_token::TokenCodec;
///
/// let codec = TokenCodec;
///
/// // Not three segments: unusable, so it counts as expired.
/// assert!(codec.is_expired("not-a-token"));
///
/// // {"sub":"u1"} with no exp never expires.
/// let token = "eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiJ1MSJ9.c2ln";
/// assert!(!codec.is_expired(token));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenCodec;

impl TokenCodec {
    /// Decodes the payload segment of `credential`.
    ///
    /// # Errors
    /// - [`TokenError::Malformed`] unless there are exactly three
    ///   non-empty segments
    /// - [`TokenError::Encoding`] if the payload is not base64url
    /// - [`TokenError::Payload`] if the payload is not a JSON object
    pub fn decode(&self, credential: &str) -> Result<Claims, TokenError> {
        let segments: Vec<&str> = credential.split('.').collect();
        let [header, payload, signature] = segments.as_slice() else {
            return Err(TokenError::Malformed(segments.len()));
        };
        if header.is_empty() || payload.is_empty() || signature.is_empty() {
            return Err(TokenError::Malformed(segments.len()));
        }

        // Some issuers keep the `=` padding; the URL-safe alphabet is
        // otherwise identical.
        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
        let claims = serde_json::from_slice(&bytes)?;
        Ok(claims)
    }

    /// Returns `true` if `credential` is expired or unusable.
    ///
    /// Fails closed: a credential that cannot be decoded is reported as
    /// expired and the reason is logged. A payload without `exp` is
    /// treated as never expiring.
    pub fn is_expired(&self, credential: &str) -> bool {
        self.is_expired_at(credential, now_millis())
    }

    /// Same as [`is_expired`](Self::is_expired) against an explicit clock
    /// (milliseconds since the Unix epoch).
    pub fn is_expired_at(&self, credential: &str, now_millis: i64) -> bool {
        match self.decode(credential) {
            Ok(claims) => {
                if claims.exp.is_none() {
                    tracing::debug!(
                        sub = ?claims.sub,
                        "credential has no exp claim, treating as non-expiring"
                    );
                }
                claims.is_expired_at(now_millis)
            }
            Err(e) => {
                tracing::warn!(error = %e, "unreadable credential, treating as expired");
                true
            }
        }
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    /// Builds a credential with the given JSON payload.
    fn token(payload: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload);
        format!("{header}.{body}.signature")
    }

    #[test]
    fn test_decode_valid_token_returns_claims() {
        let claims = TokenCodec
            .decode(&token(r#"{"exp":1700000100,"sub":"42"}"#))
            .expect("should decode");
        assert_eq!(claims.exp, Some(1_700_000_100.0));
        assert_eq!(claims.sub.as_deref(), Some("42"));
    }

    #[test]
    fn test_decode_padded_payload_is_accepted() {
        let header = URL_SAFE_NO_PAD.encode("{}");
        let body = base64::engine::general_purpose::URL_SAFE
            .encode(r#"{"exp":12}"#);
        assert!(body.ends_with('='), "fixture should carry padding");

        let claims = TokenCodec
            .decode(&format!("{header}.{body}.sig"))
            .expect("should decode");
        assert_eq!(claims.exp, Some(12.0));
    }

    #[test]
    fn test_decode_wrong_segment_count_returns_malformed() {
        for bad in ["", "a", "a.b", "a.b.c.d"] {
            assert!(
                matches!(TokenCodec.decode(bad), Err(TokenError::Malformed(_))),
                "{bad:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_decode_empty_segment_returns_malformed() {
        assert!(matches!(
            TokenCodec.decode("a..c"),
            Err(TokenError::Malformed(3))
        ));
    }

    #[test]
    fn test_decode_bad_base64_returns_encoding_error() {
        assert!(matches!(
            TokenCodec.decode("a.!!!.c"),
            Err(TokenError::Encoding(_))
        ));
    }

    #[test]
    fn test_decode_non_json_payload_returns_payload_error() {
        let body = URL_SAFE_NO_PAD.encode("not json");
        assert!(matches!(
            TokenCodec.decode(&format!("a.{body}.c")),
            Err(TokenError::Payload(_))
        ));
    }

    #[test]
    fn test_is_expired_past_exp_returns_true() {
        let t = token(r#"{"exp":1699999999}"#);
        assert!(TokenCodec.is_expired_at(&t, NOW));
    }

    #[test]
    fn test_is_expired_future_exp_returns_false() {
        let t = token(r#"{"exp":1700000001}"#);
        assert!(!TokenCodec.is_expired_at(&t, NOW));
    }

    #[test]
    fn test_decode_float_exp_returns_claims() {
        let claims = TokenCodec
            .decode(&token(r#"{"exp":4102444800.0}"#))
            .expect("should decode");
        assert_eq!(claims.exp, Some(4_102_444_800.0));
    }

    #[test]
    fn test_is_expired_future_float_exp_returns_false() {
        let t = token(r#"{"exp":4102444800.0}"#);
        assert!(!TokenCodec.is_expired_at(&t, NOW));
        assert!(!TokenCodec.is_expired(&t));

        let t = token(r#"{"exp":1.6e9}"#);
        assert!(TokenCodec.is_expired_at(&t, NOW));
    }

    #[test]
    fn test_is_expired_missing_exp_returns_false() {
        let t = token(r#"{"sub":"42"}"#);
        assert!(!TokenCodec.is_expired_at(&t, NOW));
    }

    #[test]
    fn test_is_expired_malformed_returns_true() {
        assert!(TokenCodec.is_expired_at("only.two", NOW));
        assert!(TokenCodec.is_expired_at("", NOW));
        assert!(TokenCodec.is_expired_at("x.y.z", NOW));
    }

    #[test]
    fn test_is_expired_non_numeric_exp_returns_true() {
        let t = token(r#"{"exp":"tomorrow"}"#);
        assert!(TokenCodec.is_expired_at(&t, NOW));
    }

    #[test]
    fn test_is_expired_uses_wall_clock() {
        let t = token(r#"{"exp":1}"#);
        assert!(TokenCodec.is_expired(&t));
        let t = token(r#"{"exp":99999999999}"#);
        assert!(!TokenCodec.is_expired(&t));
    }
}
