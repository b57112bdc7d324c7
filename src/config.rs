use std::fmt;

use jsonwebtoken::Algorithm;

const INSECURE_SECRET_PLACEHOLDER: &str = "CHANGE_ME_READROOM_SECRET_KEY";

/// Upper bound on token lifetime: one year.
pub const MAX_EXPIRE_MINUTES: i64 = 525_600;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub token: TokenConfig,
    /// VK app secret used to check launch-parameter signatures.
    /// When unset every VK credential check fails closed.
    pub vk_client_secret: Option<String>,
    /// Allowed CORS origins. A single `*` allows any origin.
    pub cors_origins: Vec<String>,
}

/// Signing settings handed to the token issuer at construction.
#[derive(Clone)]
pub struct TokenConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub expire_minutes: i64,
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"****")
            .field("algorithm", &self.algorithm)
            .field("expire_minutes", &self.expire_minutes)
            .finish()
    }
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();
    from_lookup(|key| std::env::var(key).ok())
}

/// Build the config from an arbitrary key lookup. `load` feeds it the process
/// environment.
pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let secret = lookup("SECRET_KEY").unwrap_or_else(|| INSECURE_SECRET_PLACEHOLDER.into());

    if secret == INSECURE_SECRET_PLACEHOLDER {
        let env_mode = lookup("READROOM_ENV")
            .or_else(|| lookup("RUST_ENV"))
            .unwrap_or_default();
        if env_mode == "production" {
            anyhow::bail!(
                "SECRET_KEY is still the insecure placeholder. \
                 Set a proper signing secret before running in production."
            );
        }
        tracing::warn!("SECRET_KEY is not set, using insecure placeholder");
    }

    let algorithm = parse_algorithm(&lookup("ALGORITHM").unwrap_or_else(|| "HS256".into()))?;

    let expire_minutes = match lookup("ACCESS_TOKEN_EXPIRE_MINUTES") {
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|m| (1..=MAX_EXPIRE_MINUTES).contains(m))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "ACCESS_TOKEN_EXPIRE_MINUTES must be an integer between 1 and {}, got '{}'",
                    MAX_EXPIRE_MINUTES,
                    raw
                )
            })?,
        None => 30,
    };

    Ok(Config {
        port: lookup("READROOM_PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(8000),
        database_url: lookup("DATABASE_URL")
            .unwrap_or_else(|| "postgres://localhost/readroom".into()),
        token: TokenConfig {
            secret,
            algorithm,
            expire_minutes,
        },
        vk_client_secret: lookup("CLIENT_SECRET").filter(|s| !s.is_empty()),
        cors_origins: lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "*".into())
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
    })
}

/// Only the HMAC family is accepted: the service signs with a shared secret.
fn parse_algorithm(raw: &str) -> anyhow::Result<Algorithm> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => anyhow::bail!("unsupported ALGORITHM '{}': expected HS256, HS384 or HS512", other),
    }
}
