use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::TOKEN_TYPE;
use crate::config::TokenConfig;
use crate::errors::AppError;

/// Claims carried by every access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// External identifier of the authenticated identity.
    pub sub: String,
    /// Expiry (Unix timestamp).
    pub exp: i64,
    /// Issued at (Unix timestamp).
    pub iat: i64,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Response body of `POST /token`.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl From<IssuedToken> for TokenResponse {
    fn from(issued: IssuedToken) -> Self {
        Self {
            access_token: issued.access_token,
            token_type: TOKEN_TYPE.to_string(),
        }
    }
}

/// Signs and verifies stateless access tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(cfg: &TokenConfig) -> anyhow::Result<Self> {
        let lifetime = Duration::try_minutes(cfg.expire_minutes).ok_or_else(|| {
            anyhow::anyhow!("token lifetime of {} minutes is out of range", cfg.expire_minutes)
        })?;

        Ok(Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            algorithm: cfg.algorithm,
            lifetime,
        })
    }

    pub fn issue(&self, subject: &str) -> anyhow::Result<IssuedToken> {
        self.issue_at(subject, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(&self, subject: &str, now: DateTime<Utc>) -> anyhow::Result<IssuedToken> {
        let expires_at = now
            .checked_add_signed(self.lifetime)
            .ok_or_else(|| anyhow::anyhow!("token expiry overflows the calendar"))?;
        let claims = Claims {
            sub: subject.to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };

        let access_token = encode(&Header::new(self.algorithm), &claims, &self.encoding)
            .map_err(|e| anyhow::anyhow!("token signing failed: {}", e))?;

        Ok(IssuedToken {
            access_token,
            expires_at,
        })
    }

    /// Verify signature and expiry, returning the claims.
    /// Tokens are accepted strictly until `exp`; no leeway, no revocation.
    pub fn decode(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "access token rejected");
                AppError::InvalidToken
            })
    }
}

/// Convenience for displaying a Unix timestamp claim.
pub fn timestamp_to_datetime(ts: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(ts, 0).single()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(minutes: i64) -> TokenConfig {
        TokenConfig {
            secret: "test-secret".to_string(),
            algorithm: Algorithm::HS256,
            expire_minutes: minutes,
        }
    }

    fn issuer(minutes: i64) -> TokenIssuer {
        TokenIssuer::new(&config(minutes)).unwrap()
    }

    #[test]
    fn test_issued_token_carries_subject_and_expiry() {
        let issuer = issuer(30);
        let now = Utc::now();
        let issued = issuer.issue_at("vk123", now).unwrap();

        let claims = issuer.decode(&issued.access_token).unwrap();
        assert_eq!(claims.sub, "vk123");
        assert_eq!(claims.iat, now.timestamp());
        assert_eq!(claims.exp, now.timestamp() + 30 * 60);
        assert_eq!(issued.expires_at.timestamp(), claims.exp);
    }

    #[test]
    fn test_expired_token_rejected() {
        let issuer = issuer(30);
        let issued = issuer
            .issue_at("vk123", Utc::now() - Duration::hours(2))
            .unwrap();
        assert!(matches!(
            issuer.decode(&issued.access_token),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let other = TokenIssuer::new(&TokenConfig {
            secret: "someone-else".to_string(),
            algorithm: Algorithm::HS256,
            expire_minutes: 30,
        })
        .unwrap();
        let issued = other.issue("vk123").unwrap();
        assert!(issuer(30).decode(&issued.access_token).is_err());
    }

    #[test]
    fn test_algorithm_mismatch_rejected() {
        let hs512 = TokenIssuer::new(&TokenConfig {
            secret: "test-secret".to_string(),
            algorithm: Algorithm::HS512,
            expire_minutes: 30,
        })
        .unwrap();
        let issued = hs512.issue("vk123").unwrap();
        assert!(issuer(30).decode(&issued.access_token).is_err());
    }

    #[test]
    fn test_out_of_range_lifetime_is_an_error() {
        assert!(TokenIssuer::new(&config(i64::MAX)).is_err());
    }

    #[test]
    fn test_expiry_overflow_is_an_error_not_a_panic() {
        let issuer = issuer(1_000_000_000_000);
        let result = issuer.issue("vk123");
        assert!(result.unwrap_err().to_string().contains("overflows"));
    }

    #[test]
    fn test_one_year_lifetime_issues() {
        let issuer = issuer(crate::config::MAX_EXPIRE_MINUTES);
        let now = Utc::now();
        let issued = issuer.issue_at("vk123", now).unwrap();
        assert_eq!(
            issued.expires_at.timestamp(),
            now.timestamp() + crate::config::MAX_EXPIRE_MINUTES * 60
        );
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(issuer(30).decode("not-a-jwt").is_err());
        assert!(issuer(30).decode("").is_err());
    }

    #[test]
    fn test_token_response_type_is_bearer() {
        let issued = issuer(5).issue("vk1").unwrap();
        let resp = TokenResponse::from(issued);
        assert_eq!(resp.token_type, "bearer");
    }

    #[test]
    fn test_timestamp_to_datetime() {
        let dt = timestamp_to_datetime(1_700_000_000).unwrap();
        assert_eq!(dt.timestamp(), 1_700_000_000);
    }
}
