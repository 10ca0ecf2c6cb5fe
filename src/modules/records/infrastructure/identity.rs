use crate::modules::records::domain::{AuthUser, IdentityProvider};
use crate::shared::config::RemoteStoreConfig;
use crate::shared::errors::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Identity fixed at construction: a signed-in user or no session at all
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    user: Option<AuthUser>,
}

impl StaticIdentity {
    pub fn signed_in(id: Uuid) -> Self {
        Self {
            user: Some(AuthUser::new(id)),
        }
    }

    pub fn with_user(user: AuthUser) -> Self {
        Self { user: Some(user) }
    }

    pub fn anonymous() -> Self {
        Self { user: None }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_user(&self) -> AppResult<Option<AuthUser>> {
        Ok(self.user.clone())
    }
}

/// Resolves the session token against the hosted auth endpoint
pub struct SupabaseIdentity {
    client: Client,
    base_url: String,
    anon_key: String,
    access_token: Option<String>,
}

impl SupabaseIdentity {
    pub fn new(config: &RemoteStoreConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            access_token: config.access_token.clone(),
        })
    }
}

#[async_trait]
impl IdentityProvider for SupabaseIdentity {
    async fn current_user(&self) -> AppResult<Option<AuthUser>> {
        let Some(token) = self.access_token.as_deref() else {
            debug!("No session token configured");
            return Ok(None);
        };

        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                debug!("Session token rejected by auth endpoint");
                Ok(None)
            }
            status if status.is_success() => Ok(Some(response.json::<AuthUser>().await?)),
            status => Err(AppError::ExternalServiceError(format!(
                "Auth endpoint returned HTTP {}",
                status
            ))),
        }
    }
}
