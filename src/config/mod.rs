use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::dataset::{DatasetPaths, DatasetSource, DirectorySource, HttpSource};
use crate::models::OpenEndPolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_server: ServerConfig,
    pub data: DataConfig,
    pub auth: AuthConfig,
    pub frontend: FrontendConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "location")]
pub enum DataSourceConfig {
    /// Static asset host base URL
    Http(String),
    /// Local directory holding the dataset files
    Directory(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub source: DataSourceConfig,
    pub campaign_path: String,
    pub activity_path: String,
    pub monthly_path: String,
    /// Reload interval; `None` loads once at startup
    #[serde(default)]
    pub refresh_interval_secs: Option<u64>,
    #[serde(default)]
    pub open_end: OpenEndPolicy,
}

impl DataConfig {
    pub fn paths(&self) -> DatasetPaths {
        DatasetPaths {
            campaign: self.campaign_path.clone(),
            activity: self.activity_path.clone(),
            monthly: self.monthly_path.clone(),
        }
    }

    pub fn build_source(&self) -> anyhow::Result<Arc<dyn DatasetSource>> {
        let source: Arc<dyn DatasetSource> = match &self.source {
            DataSourceConfig::Http(url) => Arc::new(HttpSource::new(url)?),
            DataSourceConfig::Directory(dir) => Arc::new(DirectorySource::new(dir)),
        };
        Ok(source)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    None,
    Oauth,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub mode: AuthMode,
    #[serde(default)]
    pub oauth: Option<OAuthConfig>,
    /// Only identities whose `email` claim ends with `@<domain>` are admitted
    #[serde(default)]
    pub allowed_email_domain: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    pub issuer_url: String,
    pub audience: String,
    #[serde(default)]
    pub jwks_url: Option<String>,
    #[serde(default = "OAuthConfig::default_cache_ttl_secs")]
    pub jwks_cache_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontendConfig {
    /// Path to directory containing static frontend files
    /// If None, uses embedded frontend (if available)
    pub static_dir: Option<String>,
}

impl OAuthConfig {
    const fn default_cache_ttl_secs() -> u64 {
        300
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let api_host = std::env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let api_port = std::env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .context("API_PORT must be a valid port number")?;

        let source = match std::env::var("DATA_BASE_URL") {
            Ok(url) if !url.trim().is_empty() => DataSourceConfig::Http(url),
            _ => DataSourceConfig::Directory(
                std::env::var("DATA_DIR").unwrap_or_else(|_| "./public".to_string()),
            ),
        };

        let defaults = DatasetPaths::default();
        let campaign_path = std::env::var("DATA_CAMPAIGN_PATH").unwrap_or(defaults.campaign);
        let activity_path = std::env::var("DATA_ACTIVITY_PATH").unwrap_or(defaults.activity);
        let monthly_path = std::env::var("DATA_MONTHLY_PATH").unwrap_or(defaults.monthly);

        let refresh_interval_secs = match std::env::var("DATA_REFRESH_SECS") {
            Ok(v) => Some(
                v.parse::<u64>()
                    .context("DATA_REFRESH_SECS must be a whole number of seconds")?,
            )
            .filter(|secs| *secs > 0),
            Err(_) => None,
        };

        let open_end = match std::env::var("FILTER_OPEN_END")
            .unwrap_or_else(|_| "single_day".to_string())
            .to_lowercase()
            .as_str()
        {
            "single_day" => OpenEndPolicy::SingleDay,
            "through_today" => OpenEndPolicy::ThroughToday,
            other => {
                tracing::warn!(
                    "Unknown FILTER_OPEN_END '{other}', falling back to 'single_day'. Supported values: single_day, through_today"
                );
                OpenEndPolicy::SingleDay
            }
        };

        let disable_auth = std::env::var("DISABLE_AUTH")
            .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);

        let mut auth_mode = std::env::var("AUTH_MODE")
            .unwrap_or_else(|_| "none".to_string())
            .to_lowercase();

        if disable_auth {
            auth_mode = "none".to_string();
        }

        let auth_mode = match auth_mode.as_str() {
            "none" => AuthMode::None,
            "oauth" => AuthMode::Oauth,
            other => {
                tracing::warn!(
                    "Unknown AUTH_MODE '{other}', falling back to 'none'. Supported values: none, oauth"
                );
                AuthMode::None
            }
        };

        let oauth = if matches!(auth_mode, AuthMode::Oauth) {
            let issuer_url = std::env::var("OAUTH_ISSUER_URL")
                .context("OAUTH_ISSUER_URL must be set when AUTH_MODE=oauth")?;
            let audience = std::env::var("OAUTH_AUDIENCE")
                .context("OAUTH_AUDIENCE must be set when AUTH_MODE=oauth")?;
            let jwks_url = std::env::var("OAUTH_JWKS_URL").ok();
            let jwks_cache_ttl_secs = std::env::var("OAUTH_JWKS_CACHE_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or_else(OAuthConfig::default_cache_ttl_secs);

            Some(OAuthConfig {
                issuer_url,
                audience,
                jwks_url,
                jwks_cache_ttl_secs,
            })
        } else {
            None
        };

        let allowed_email_domain = std::env::var("ALLOWED_EMAIL_DOMAIN")
            .ok()
            .map(|d| d.trim().trim_start_matches('@').to_lowercase())
            .filter(|d| !d.is_empty());

        let frontend_static_dir = std::env::var("FRONTEND_STATIC_DIR").ok();

        Ok(Config {
            api_server: ServerConfig {
                host: api_host,
                port: api_port,
            },
            data: DataConfig {
                source,
                campaign_path,
                activity_path,
                monthly_path,
                refresh_interval_secs,
                open_end,
            },
            auth: AuthConfig {
                mode: auth_mode,
                oauth,
                allowed_email_domain,
            },
            frontend: FrontendConfig {
                static_dir: frontend_static_dir,
            },
        })
    }
}
