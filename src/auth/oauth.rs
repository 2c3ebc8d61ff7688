use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{anyhow, bail, Context, Result};
use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::OAuthConfig;

/// Who is looking at the dashboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
    pub email: Option<String>,
}

impl Identity {
    fn from_claims(claims: &Value) -> Result<Self> {
        let subject = claims
            .get("sub")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("token missing 'sub' claim"))?
            .to_string();

        // Only an explicitly verified address is trusted for domain checks
        let verified = claims
            .get("email_verified")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let email = claims
            .get("email")
            .and_then(Value::as_str)
            .filter(|_| verified)
            .map(str::to_string);

        Ok(Self { subject, email })
    }
}

type KeyMap = HashMap<String, Arc<DecodingKey>>;

/// Validates bearer tokens against the issuer's JWKS, refreshing keys after the cache TTL
#[derive(Clone)]
pub struct OAuthValidator {
    issuer: String,
    audience: String,
    jwks_uri: String,
    client: Client,
    keys: Arc<RwLock<KeyMap>>,
    last_refresh: Arc<RwLock<Option<Instant>>>,
    cache_ttl: Duration,
}

impl OAuthValidator {
    pub async fn from_config(config: &OAuthConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent("nudgeboard-oauth-validator/0.1.0")
            .build()
            .context("failed to build HTTP client for OAuth validation")?;

        let jwks_uri = resolve_jwks_uri(config, &client).await?;
        let validator = Self {
            issuer: config.issuer_url.clone(),
            audience: config.audience.clone(),
            jwks_uri,
            client,
            keys: Arc::new(RwLock::new(HashMap::new())),
            last_refresh: Arc::new(RwLock::new(None)),
            cache_ttl: Duration::from_secs(config.jwks_cache_ttl_secs.max(60)),
        };

        validator.refresh_keys().await?;

        Ok(validator)
    }

    /// Verify the token and extract the caller's identity
    pub async fn validate(&self, token: &str) -> Result<Identity> {
        let header = decode_header(token).context("failed to parse token header")?;
        let kid = header
            .kid
            .ok_or_else(|| anyhow!("token header missing 'kid'"))?;

        let key = self.key_for(&kid).await?;

        let mut validation = Validation::new(header.alg);
        validation.set_issuer(&[&self.issuer]);
        validation.validate_aud = false;

        let claims = decode::<Value>(token, key.as_ref(), &validation)
            .context("token failed signature or structural validation")?
            .claims;

        if !audience_matches(claims.get("aud"), &self.audience) {
            bail!("token audience does not include expected value");
        }

        Identity::from_claims(&claims)
    }

    async fn key_for(&self, kid: &str) -> Result<Arc<DecodingKey>> {
        let stale = match *self.last_refresh.read().await {
            Some(last) => last.elapsed() > self.cache_ttl,
            None => true,
        };
        let cached = self.keys.read().await.get(kid).cloned();

        match cached {
            Some(key) if !stale => Ok(key),
            _ => {
                debug!(kid, stale, "refreshing JWKS cache");
                self.refresh_keys().await?;
                self.keys
                    .read()
                    .await
                    .get(kid)
                    .cloned()
                    .ok_or_else(|| anyhow!("no JWKS entry found for key id '{kid}'"))
            }
        }
    }

    async fn refresh_keys(&self) -> Result<()> {
        let jwks: JwkSet = self
            .client
            .get(&self.jwks_uri)
            .send()
            .await
            .context("failed to request JWKS")?
            .error_for_status()
            .context("JWKS endpoint returned an error status")?
            .json()
            .await
            .context("failed to parse JWKS response")?;

        let new_keys = decoding_keys(jwks)?;

        *self.keys.write().await = new_keys;
        *self.last_refresh.write().await = Some(Instant::now());

        Ok(())
    }
}

fn decoding_keys(jwks: JwkSet) -> Result<KeyMap> {
    let mut keys = KeyMap::new();

    for jwk in jwks.keys {
        let Some(kid) = jwk.kid else {
            warn!("Skipping JWKS entry without 'kid'");
            continue;
        };

        let key = match jwk.kty.as_str() {
            "RSA" => {
                let n = jwk
                    .n
                    .as_deref()
                    .ok_or_else(|| anyhow!("JWKS RSA key missing modulus"))?;
                let e = jwk
                    .e
                    .as_deref()
                    .ok_or_else(|| anyhow!("JWKS RSA key missing exponent"))?;
                DecodingKey::from_rsa_components(n, e)
                    .context("failed to build RSA decoding key from JWKS entry")?
            }
            "oct" => {
                let secret = jwk
                    .k
                    .as_deref()
                    .ok_or_else(|| anyhow!("JWKS symmetric key missing 'k'"))?;
                DecodingKey::from_base64_secret(secret)
                    .context("failed to build HMAC decoding key from JWKS entry")?
            }
            other => {
                warn!("Skipping unsupported JWKS key type: {other}");
                continue;
            }
        };
        keys.insert(kid, Arc::new(key));
    }

    if keys.is_empty() {
        bail!("JWKS response did not contain any usable keys");
    }

    Ok(keys)
}

fn audience_matches(aud_claim: Option<&Value>, expected: &str) -> bool {
    match aud_claim {
        Some(Value::String(aud)) => aud == expected,
        Some(Value::Array(entries)) => entries
            .iter()
            .filter_map(Value::as_str)
            .any(|entry| entry == expected),
        _ => false,
    }
}

async fn resolve_jwks_uri(config: &OAuthConfig, client: &Client) -> Result<String> {
    if let Some(url) = &config.jwks_url {
        return Ok(url.clone());
    }

    let issuer = config.issuer_url.trim_end_matches('/');
    let discovery_url = format!("{issuer}/.well-known/openid-configuration");
    let metadata: OpenIdProviderMetadata = client
        .get(&discovery_url)
        .send()
        .await
        .context("failed to request OpenID provider metadata")?
        .error_for_status()
        .context("OpenID provider metadata endpoint returned an error status")?
        .json()
        .await
        .context("failed to parse OpenID provider metadata")?;

    metadata
        .jwks_uri
        .ok_or_else(|| anyhow!("OpenID provider metadata did not include 'jwks_uri'"))
}

#[derive(Debug, Deserialize)]
struct OpenIdProviderMetadata {
    jwks_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: Option<String>,
    #[serde(default)]
    kty: String,
    #[serde(default)]
    n: Option<String>,
    #[serde(default)]
    e: Option<String>,
    #[serde(default)]
    k: Option<String>,
}
