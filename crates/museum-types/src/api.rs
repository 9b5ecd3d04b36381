use serde::{Deserialize, Serialize};

use crate::models::{Role, User};

// -- JWT Claims --

/// Claims carried by session tokens. Only `sub` is trusted; the user row is
/// re-read on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetRoleRequest {
    pub role: Role,
}

// -- Categories --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub display_order: Option<i64>,
}

// -- Artworks --

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtworkQuery {
    pub category_id: Option<i64>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateArtworkRequest {
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub video_url: Option<String>,
    pub category_id: i64,
    pub is_premium: Option<bool>,
    pub comments_enabled: Option<bool>,
    pub display_order: Option<i64>,
    pub aspect_ratio: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SetPremiumRequest {
    pub is_premium: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumStatusResponse {
    pub success: bool,
    pub is_premium: bool,
}

// -- Interactions --

#[derive(Debug, Serialize, Deserialize)]
pub struct LikeResponse {
    pub liked: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookmarkResponse {
    pub bookmarked: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserActionsResponse {
    pub liked: bool,
    pub bookmarked: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ViewsResponse {
    pub views: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentsEnabledResponse {
    pub comments_enabled: bool,
}

// -- Comments --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCommentRequest {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReportResponse {
    pub reported: bool,
    /// Distinct reporters for the comment so far.
    pub reports: i64,
}

// -- Ads --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpsertAdSlotRequest {
    pub image_url: String,
    pub link_url: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}
