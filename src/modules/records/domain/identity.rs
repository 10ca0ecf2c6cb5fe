/// Identity provider abstraction
///
/// Answers "who is submitting this request". The record store trusts the same
/// session, so the owner returned here is the owner every row is scoped to.
use crate::shared::errors::AppResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

impl AuthUser {
    pub fn new(id: Uuid) -> Self {
        Self { id, email: None }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The signed-in user, or `None` when there is no session
    async fn current_user(&self) -> AppResult<Option<AuthUser>>;
}
