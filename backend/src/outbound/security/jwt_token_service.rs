//! `TokenService` issuing HS256-signed JWTs.
//!
//! Expiry is checked against the injected clock rather than the system time
//! so tests can move time forward deterministically.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::domain::ports::{TokenError, TokenService};
use crate::domain::{AccessToken, Role, TokenClaims, UserId};

/// Wire form of the token payload.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    #[serde(default)]
    sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    exp: i64,
    #[serde(default)]
    iat: i64,
}

/// HS256 token signer and verifier sharing one secret.
#[derive(Clone)]
pub struct JwtTokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl JwtTokenService {
    /// Build a service from raw secret bytes. The caller's buffer is wiped
    /// when dropped.
    pub fn new(secret: Zeroizing<Vec<u8>>, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["sub", "exp"]);
        Self {
            encoding: EncodingKey::from_secret(&secret),
            decoding: DecodingKey::from_secret(&secret),
            validation,
            clock,
        }
    }
}

fn invalid(reason: impl Into<String>) -> TokenError {
    TokenError::invalid(reason)
}

impl TokenService for JwtTokenService {
    fn issue(
        &self,
        subject: &UserId,
        role: Option<Role>,
        ttl: Duration,
    ) -> Result<AccessToken, TokenError> {
        let issued_at = self.clock.utc();
        let expires_at = issued_at + ttl;
        let claims = Claims {
            sub: subject.to_string(),
            role: role.map(|role| role.as_str().to_owned()),
            exp: expires_at.timestamp(),
            iat: issued_at.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| TokenError::signing(err.to_string()))?;
        Ok(AccessToken { token, expires_at })
    }

    fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|err| {
            match err.kind() {
                ErrorKind::InvalidSignature => invalid("signature mismatch"),
                ErrorKind::MissingRequiredClaim(claim) => invalid(format!("missing {claim}")),
                _ => invalid("malformed token"),
            }
        })?;
        let claims = data.claims;

        let now = self.clock.utc().timestamp();
        if claims.exp <= now {
            return Err(invalid("token expired"));
        }
        let expires_at =
            DateTime::<Utc>::from_timestamp(claims.exp, 0).ok_or_else(|| invalid("bad expiry"))?;
        let subject = UserId::new(&claims.sub).map_err(|_| invalid("subject is not a user id"))?;
        let role = claims
            .role
            .as_deref()
            .map(Role::from_str)
            .transpose()
            .map_err(|_| invalid("unknown role"))?;

        Ok(TokenClaims {
            subject,
            role,
            expires_at,
        })
    }
}
