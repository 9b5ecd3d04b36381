use museum_types::models::{Artwork, User};

use crate::error::{ApiError, ApiResult};

/// Who is making the current request. Resolved once per request by
/// [`crate::middleware::resolve_session`] and passed explicitly into every
/// service call.
#[derive(Debug, Clone)]
pub struct RequestContext {
    user: Option<User>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self { user: None }
    }

    pub fn for_user(user: User) -> Self {
        Self { user: Some(user) }
    }

    pub fn require_authenticated(&self) -> ApiResult<&User> {
        self.user.as_ref().ok_or(ApiError::Unauthorized)
    }

    pub fn require_admin(&self) -> ApiResult<&User> {
        let user = self.require_authenticated()?;
        if user.is_admin() {
            Ok(user)
        } else {
            Err(ApiError::Forbidden)
        }
    }

    /// Passes for the owner of a resource or any admin.
    pub fn require_owner_or_admin(&self, owner_id: i64) -> ApiResult<&User> {
        let user = self.require_authenticated()?;
        if user.id == owner_id || user.is_admin() {
            Ok(user)
        } else {
            Err(ApiError::Forbidden)
        }
    }

    pub fn can_view_premium(&self) -> bool {
        self.user
            .as_ref()
            .is_some_and(|user| user.is_premium || user.is_admin())
    }

    pub fn gate_premium(&self, artwork: Artwork) -> ApiResult<Artwork> {
        if !artwork.is_premium || self.can_view_premium() {
            Ok(artwork)
        } else {
            Err(ApiError::PremiumRequired)
        }
    }
}
