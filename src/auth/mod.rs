mod oauth;

use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::{AuthConfig, AuthMode};

pub use oauth::{Identity, OAuthValidator};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("invalid token")]
    InvalidToken,
    #[error("token carries no verified email")]
    MissingEmail,
    #[error("email domain is not allowed")]
    DomainNotAllowed,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingToken | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::MissingEmail | AuthError::DomainNotAllowed => StatusCode::FORBIDDEN,
        }
    }
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut response = (
            status,
            Json(AuthErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                header::HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}

/// Gate in front of the dashboard API
pub struct AuthService {
    validator: Option<OAuthValidator>,
    allowed_email_domain: Option<String>,
}

impl AuthService {
    pub async fn new(config: AuthConfig) -> anyhow::Result<Self> {
        let validator = match config.mode {
            AuthMode::None => None,
            AuthMode::Oauth => {
                let oauth = config.oauth.as_ref().ok_or_else(|| {
                    anyhow::anyhow!("OAuth configuration is required when AUTH_MODE=oauth")
                })?;
                Some(OAuthValidator::from_config(oauth).await?)
            }
        };

        Ok(Self {
            validator,
            allowed_email_domain: config.allowed_email_domain,
        })
    }

    /// Admits every request
    pub fn disabled() -> Self {
        Self {
            validator: None,
            allowed_email_domain: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.validator.is_some()
    }

    /// Resolve the caller, or `None` when authentication is disabled
    pub async fn authorize(&self, headers: &HeaderMap) -> Result<Option<Identity>, AuthError> {
        let Some(validator) = &self.validator else {
            return Ok(None);
        };

        let token = bearer_token(headers).ok_or(AuthError::MissingToken)?;
        let identity = validator.validate(token).await.map_err(|e| {
            debug!(error = %e, "rejected bearer token");
            AuthError::InvalidToken
        })?;

        admit(identity, self.allowed_email_domain.as_deref()).map(Some)
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

fn admit(identity: Identity, allowed_domain: Option<&str>) -> Result<Identity, AuthError> {
    let Some(domain) = allowed_domain else {
        return Ok(identity);
    };

    let email = identity.email.as_deref().ok_or(AuthError::MissingEmail)?;
    if email_in_domain(email, domain) {
        Ok(identity)
    } else {
        warn!(subject = %identity.subject, "sign-in from outside the allowed email domain");
        Err(AuthError::DomainNotAllowed)
    }
}

/// Case-insensitive `@domain` suffix match; subdomains do not count
pub fn email_in_domain(email: &str, domain: &str) -> bool {
    let email = email.trim().to_ascii_lowercase();
    let domain = domain.trim().trim_start_matches('@').to_ascii_lowercase();

    match email.rsplit_once('@') {
        Some((local, host)) => !local.is_empty() && host == domain,
        None => false,
    }
}

pub async fn auth_middleware(
    auth_service: Arc<AuthService>,
    mut request: Request,
    next: Next,
) -> Response {
    match auth_service.authorize(request.headers()).await {
        Ok(identity) => {
            if let Some(identity) = identity {
                request.extensions_mut().insert(identity);
            }
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}
