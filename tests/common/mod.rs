//! Shared fixtures: an in-memory store, a stub verifier and a router built
//! from the same `AppState` the binary uses.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use jsonwebtoken::Algorithm;
use readroom::auth::CredentialVerifier;
use readroom::config::{Config, TokenConfig};
use readroom::models::identity::Identity;
use readroom::models::identity::{NewIdentity, ProfileUpdate};
use readroom::store::memory::MemoryStore;
use readroom::store::{IdentityStore, StoreError};
use readroom::{api, AppState};
use tower::ServiceExt;

pub const LIFETIME_MINUTES: i64 = 30;

/// Accepts exactly one credential value for every identity.
pub struct AcceptValue(pub &'static str);

impl CredentialVerifier for AcceptValue {
    fn verify(&self, _identity: &Identity, presented: &str) -> bool {
        presented == self.0
    }
}

/// Every call fails as if the database were unreachable.
pub struct BrokenStore;

#[async_trait::async_trait]
impl IdentityStore for BrokenStore {
    async fn find_by_external_id(&self, _external_id: &str) -> anyhow::Result<Option<Identity>> {
        anyhow::bail!("connection refused")
    }

    async fn create(&self, _new: &NewIdentity) -> Result<Identity, StoreError> {
        Err(StoreError::Other(anyhow::anyhow!("connection refused")))
    }

    async fn update_profile(
        &self,
        _external_id: &str,
        _update: &ProfileUpdate,
    ) -> Result<Option<Identity>, StoreError> {
        Err(StoreError::Other(anyhow::anyhow!("connection refused")))
    }

    async fn ping(&self) -> anyhow::Result<()> {
        anyhow::bail!("connection refused")
    }
}

pub fn test_config() -> Config {
    Config {
        port: 0,
        database_url: "postgres://unused".to_string(),
        token: TokenConfig {
            secret: "integration-test-secret".to_string(),
            algorithm: Algorithm::HS256,
            expire_minutes: LIFETIME_MINUTES,
        },
        vk_client_secret: None,
        cors_origins: vec!["*".to_string()],
    }
}

/// Store seeded with an active `vk123` and an inactive `vk555`.
pub fn seeded_store() -> MemoryStore {
    let mut inactive = Identity::new(2, "vk555");
    inactive.is_active = false;

    let mut reader = Identity::new(1, "vk123");
    reader.full_name = Some("Anna Reader".to_string());

    vec![reader, inactive].into_iter().collect()
}

pub fn app_state(verifier: Arc<dyn CredentialVerifier>) -> Arc<AppState> {
    Arc::new(AppState::new(
        test_config(),
        Arc::new(seeded_store()),
        verifier,
    )
    .unwrap())
}

pub fn default_state() -> Arc<AppState> {
    app_state(Arc::new(AcceptValue("https://ok")))
}

pub fn router(state: &Arc<AppState>) -> Router {
    api::router(state.clone())
}

pub fn form_login(username: &str, password: &str) -> Request<Body> {
    let body = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("username", username)
        .append_pair("password", password)
        .finish();
    Request::builder()
        .method("POST")
        .uri("/token")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

pub fn json_login(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/token")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn send(app: Router, req: Request<Body>) -> Response<Body> {
    app.oneshot(req).await.unwrap()
}

pub async fn body_bytes(resp: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(resp: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(resp).await).unwrap()
}
