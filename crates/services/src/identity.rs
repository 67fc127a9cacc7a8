use async_trait::async_trait;
use voice_core::model::UserId;

use crate::error::IdentityError;

/// Source of the authenticated caller's identity.
///
/// The real identity lives with an external auth provider; the pipeline
/// only ever asks "who is calling" and scopes every read and write to the
/// answer.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::NotAuthenticated` when nobody is signed in.
    async fn current_user(&self) -> Result<UserId, IdentityError>;
}

/// Identity provider with a pre-resolved user, e.g. from CLI flags or a
/// verified session token.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    user: Option<UserId>,
}

impl StaticIdentity {
    #[must_use]
    pub fn signed_in(user: UserId) -> Self {
        Self { user: Some(user) }
    }

    #[must_use]
    pub fn signed_out() -> Self {
        Self { user: None }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_user(&self) -> Result<UserId, IdentityError> {
        self.user.ok_or(IdentityError::NotAuthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn signed_in_resolves_the_user() {
        let user = UserId::random();
        let identity = StaticIdentity::signed_in(user);
        assert_eq!(identity.current_user().await.unwrap(), user);
    }

    #[tokio::test]
    async fn signed_out_is_an_error() {
        let err = StaticIdentity::signed_out().current_user().await.unwrap_err();
        assert_eq!(err, IdentityError::NotAuthenticated);
    }
}
