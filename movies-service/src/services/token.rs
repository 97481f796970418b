use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::JwtConfig;
use crate::services::roles::{Authority, AuthoritySet};

const ALGORITHM: Algorithm = Algorithm::HS512;
const GENERATED_SECRET_BYTES: usize = 64;
pub const MIN_SECRET_BYTES: usize = 32;
/// One year.
pub const MAX_EXPIRY_MINUTES: i64 = 525_600;

/// Signs and verifies session tokens.
///
/// Pure over its inputs plus the signing secret; holds no per-token state.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

/// Claims carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user email)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Role claims as issued, before hierarchy expansion
    pub roles: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub subject: String,
    pub authorities: AuthoritySet,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,

    #[error("token signature is invalid")]
    BadSignature,

    #[error("token expired")]
    Expired,
}

impl TokenCodec {
    pub fn new(secret: &[u8], ttl: Duration) -> Result<Self, anyhow::Error> {
        if secret.len() < MIN_SECRET_BYTES {
            anyhow::bail!(
                "JWT secret must be at least {} bytes, got {}",
                MIN_SECRET_BYTES,
                secret.len()
            );
        }
        if ttl <= Duration::zero() {
            anyhow::bail!("token lifetime must be positive");
        }
        if ttl > Duration::minutes(MAX_EXPIRY_MINUTES) {
            anyhow::bail!("token lifetime must not exceed {} minutes", MAX_EXPIRY_MINUTES);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
        })
    }

    /// Build from configuration. Without a configured secret a random key is
    /// generated, so tokens die with the process and are not shared across
    /// instances.
    pub fn from_config(config: &JwtConfig) -> Result<Self, anyhow::Error> {
        if !(1..=MAX_EXPIRY_MINUTES).contains(&config.expiry_minutes) {
            anyhow::bail!(
                "JWT_EXPIRY_MINUTES must be between 1 and {}, got {}",
                MAX_EXPIRY_MINUTES,
                config.expiry_minutes
            );
        }
        let ttl = Duration::minutes(config.expiry_minutes);

        match config.secret.as_deref() {
            Some(secret) => {
                tracing::info!("Token codec initialized with configured HS512 secret");
                Self::new(secret.as_bytes(), ttl)
            }
            None => {
                tracing::warn!(
                    "JWT_SECRET not set; using an ephemeral signing key. Issued tokens become invalid on restart and are not accepted by other instances"
                );
                Self::ephemeral(ttl)
            }
        }
    }

    pub fn ephemeral(ttl: Duration) -> Result<Self, anyhow::Error> {
        let mut secret = [0u8; GENERATED_SECRET_BYTES];
        rand::thread_rng().fill_bytes(&mut secret);
        Self::new(&secret, ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(
        &self,
        subject: &str,
        authorities: &AuthoritySet,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, anyhow::Error> {
        // Second precision on both ends so decode sees the same instants.
        let issued_at = truncate_to_seconds(now);
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| anyhow::anyhow!("token expiry is out of range"))?;

        let claims = SessionClaims {
            sub: subject.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            roles: authorities.iter().map(|a| a.to_string()).collect(),
        };

        let token = encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode session token: {}", e))?;

        Ok(IssuedToken {
            token,
            issued_at,
            expires_at,
        })
    }

    /// Verify signature and claims, then check expiry against `now`.
    ///
    /// Expired iff `now >= expires_at`.
    pub fn decode(&self, raw: &str, now: DateTime<Utc>) -> Result<VerifiedToken, TokenError> {
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<SessionClaims>(raw, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::BadSignature
                }
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            }
        })?;
        let claims = data.claims;

        let expires_at =
            DateTime::<Utc>::from_timestamp(claims.exp, 0).ok_or(TokenError::Malformed)?;
        if claims.sub.is_empty() || claims.iat > claims.exp {
            return Err(TokenError::Malformed);
        }
        if now >= expires_at {
            return Err(TokenError::Expired);
        }

        let authorities = claims
            .roles
            .iter()
            .map(|r| Authority::new(r))
            .collect::<Result<AuthoritySet, _>>()
            .map_err(|_| TokenError::Malformed)?;

        Ok(VerifiedToken {
            subject: claims.sub,
            authorities,
            expires_at,
        })
    }
}

fn truncate_to_seconds(instant: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(instant.timestamp(), 0).unwrap_or(instant)
}
