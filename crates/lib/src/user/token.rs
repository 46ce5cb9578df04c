//! HS256 JSON Web Tokens for session authentication.
//!
//! Only the compact serialization with the `HS256` algorithm is produced or
//! accepted. Signatures are compared in constant time.

use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::errors::UserError;
use super::types::UserId;
use crate::Result;

type HmacSha256 = Hmac<Sha256>;

/// Whether a token grants API access or can only be exchanged for new tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Registered and private claims carried by every token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub typ: TokenKind,
    /// Issued at, in seconds since the epoch.
    pub iat: i64,
    /// Expiry, in seconds since the epoch.
    pub exp: i64,
    pub jti: String,
}

#[derive(Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Signs and verifies tokens with one shared secret.
#[derive(Clone)]
pub struct JwtSigner {
    key: Vec<u8>,
}

impl std::fmt::Debug for JwtSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSigner").finish_non_exhaustive()
    }
}

impl JwtSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            key: secret.as_ref().to_vec(),
        }
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(&self.key).map_err(|e| {
            UserError::InvalidToken {
                reason: format!("unusable signing key: {e}"),
            }
            .into()
        })
    }

    /// Encode and sign `claims`.
    pub fn sign(&self, claims: &Claims) -> Result<String> {
        let header = Header {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        };
        let header = Base64UrlUnpadded::encode_string(&serde_json::to_vec(&header)?);
        let payload = Base64UrlUnpadded::encode_string(&serde_json::to_vec(claims)?);
        let signing_input = format!("{header}.{payload}");

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes());

        Ok(format!("{signing_input}.{signature}"))
    }

    /// Check the signature, kind and expiry of `token` and return its claims.
    ///
    /// # Errors
    /// * [`UserError::InvalidToken`] for malformed tokens, bad signatures or the wrong kind
    /// * [`UserError::TokenExpired`] if `exp` is not after `now_secs`
    pub fn verify(&self, token: &str, expected: TokenKind, now_secs: i64) -> Result<Claims> {
        let invalid = |reason: &str| UserError::InvalidToken {
            reason: reason.to_string(),
        };

        let mut parts = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid("expected three segments").into());
        };

        let signature = Base64UrlUnpadded::decode_vec(signature)
            .map_err(|_| invalid("bad signature encoding"))?;
        let mut mac = self.mac()?;
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| invalid("signature mismatch"))?;

        let header: Header = Base64UrlUnpadded::decode_vec(header)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .ok_or_else(|| invalid("bad header"))?;
        if header.alg != "HS256" {
            return Err(invalid("unsupported algorithm").into());
        }

        let claims: Claims = Base64UrlUnpadded::decode_vec(payload)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .ok_or_else(|| invalid("bad claims"))?;

        if claims.typ != expected {
            return Err(invalid("wrong token type").into());
        }
        if claims.exp <= now_secs {
            return Err(UserError::TokenExpired.into());
        }
        Ok(claims)
    }
}
