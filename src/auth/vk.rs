//! VK Mini App launch-parameter verification.
//!
//! VK appends signed launch parameters to the app URL:
//! `?vk_user_id=494075&vk_app_id=6736218&...&sign=<digest>`.
//! `sign` is HMAC-SHA256 over the `vk_*` parameters (sorted by key and
//! form-urlencoded), keyed by the app's client secret and encoded as
//! unpadded URL-safe base64.

use std::collections::BTreeMap;

use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::CredentialVerifier;
use crate::models::identity::Identity;

type HmacSha256 = Hmac<Sha256>;

/// Accepts a launch URL (or bare query string) whose `vk_user_id` matches the
/// identity and whose `sign` verifies against the client secret.
pub struct VkLaunchVerifier {
    client_secret: Option<String>,
}

impl VkLaunchVerifier {
    pub fn new(client_secret: Option<String>) -> Self {
        if client_secret.is_none() {
            tracing::warn!("CLIENT_SECRET is not set; all VK launch-parameter checks will fail");
        }
        Self { client_secret }
    }
}

impl CredentialVerifier for VkLaunchVerifier {
    fn verify(&self, identity: &Identity, presented: &str) -> bool {
        let Some(secret) = self.client_secret.as_deref() else {
            return false;
        };

        let params = launch_params(presented);
        if params.is_empty() {
            tracing::debug!("no launch parameters in presented credential");
            return false;
        }

        if params.get("vk_user_id").map(String::as_str) != Some(identity.external_id.as_str()) {
            tracing::debug!(external_id = %identity.external_id, "vk_user_id does not match identity");
            return false;
        }

        let Some(sign) = params.get("sign") else {
            tracing::debug!("no 'sign' parameter in launch parameters");
            return false;
        };

        match sign_launch_params(&params, secret) {
            Some(expected) => expected.as_bytes().ct_eq(sign.as_bytes()).into(),
            None => {
                tracing::debug!("no vk_* parameters to verify");
                false
            }
        }
    }
}

/// Parse the query part of a launch URL. A value without `?` is treated as
/// the query itself; the fragment is ignored. Repeated keys keep the last value.
pub fn launch_params(presented: &str) -> BTreeMap<String, String> {
    let query = presented
        .split_once('?')
        .map(|(_, q)| q)
        .unwrap_or(presented);
    let query = query.split('#').next().unwrap_or_default();

    url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

/// VK signs with Python's `urlencode`, which leaves `~` bare and escapes `*`.
/// The WHATWG form serializer does the reverse. A literal `%` is always
/// emitted as `%25`, so neither replacement can hit input text.
fn python_form_escapes(encoded: &str) -> String {
    encoded.replace("%7E", "~").replace('*', "%2A")
}

/// Compute the expected `sign` for a set of launch parameters.
/// Returns `None` when there are no `vk_*` parameters to sign.
pub fn sign_launch_params(params: &BTreeMap<String, String>, secret: &str) -> Option<String> {
    let vk_params: Vec<(&String, &String)> = params
        .iter()
        .filter(|(key, _)| key.starts_with("vk_"))
        .collect();
    if vk_params.is_empty() {
        return None;
    }

    let payload = python_form_escapes(
        &url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(vk_params)
            .finish(),
    );

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(payload.as_bytes());
    let digest = mac.finalize().into_bytes();

    Some(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest))
}
