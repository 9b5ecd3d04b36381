use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::{debug, info};

use museum_db::Database;
use museum_types::api::{
    BookmarkResponse, CommentsEnabledResponse, LikeResponse, UserActionsResponse, ViewsResponse,
};

use crate::error::{ApiError, ApiResult};
use crate::session::RequestContext;
use crate::state::{AppState, run_blocking};

fn ensure_artwork(db: &Database, artwork_id: i64) -> ApiResult<()> {
    match db.get_artwork(artwork_id)? {
        Some(_) => Ok(()),
        None => Err(ApiError::ArtworkNotFound),
    }
}

pub fn toggle_like(db: &Database, ctx: &RequestContext, artwork_id: i64) -> ApiResult<LikeResponse> {
    let user = ctx.require_authenticated()?;
    ensure_artwork(db, artwork_id)?;

    let liked = db.toggle_like(user.id, artwork_id)?;
    debug!("User {} like on artwork {} -> {}", user.id, artwork_id, liked);
    Ok(LikeResponse { liked })
}

pub fn toggle_bookmark(db: &Database, ctx: &RequestContext, artwork_id: i64) -> ApiResult<BookmarkResponse> {
    let user = ctx.require_authenticated()?;
    ensure_artwork(db, artwork_id)?;

    let bookmarked = db.toggle_bookmark(user.id, artwork_id)?;
    debug!("User {} bookmark on artwork {} -> {}", user.id, artwork_id, bookmarked);
    Ok(BookmarkResponse { bookmarked })
}

pub fn user_actions(db: &Database, ctx: &RequestContext, artwork_id: i64) -> ApiResult<UserActionsResponse> {
    let user = ctx.require_authenticated()?;
    ensure_artwork(db, artwork_id)?;

    Ok(UserActionsResponse {
        liked: db.has_liked(user.id, artwork_id)?,
        bookmarked: db.has_bookmarked(user.id, artwork_id)?,
    })
}

/// Every call counts; there is no per-visitor dedup.
pub fn record_view(db: &Database, artwork_id: i64) -> ApiResult<ViewsResponse> {
    let views = db
        .increment_views(artwork_id)?
        .ok_or(ApiError::ArtworkNotFound)?;
    Ok(ViewsResponse { views })
}

pub fn toggle_comments_enabled(
    db: &Database,
    ctx: &RequestContext,
    artwork_id: i64,
) -> ApiResult<CommentsEnabledResponse> {
    let admin = ctx.require_admin()?;
    let comments_enabled = db
        .toggle_comments_enabled(artwork_id)?
        .ok_or(ApiError::ArtworkNotFound)?;
    info!(
        "Admin {} set comments on artwork {} to {}",
        admin.id, artwork_id, comments_enabled
    );
    Ok(CommentsEnabledResponse { comments_enabled })
}

// -- Handlers --

pub async fn post_like(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(artwork_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let result = run_blocking(&state, move |s| toggle_like(&s.db, &ctx, artwork_id)).await?;
    Ok(Json(result))
}

pub async fn post_bookmark(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(artwork_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let result = run_blocking(&state, move |s| toggle_bookmark(&s.db, &ctx, artwork_id)).await?;
    Ok(Json(result))
}

pub async fn get_user_actions(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(artwork_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let result = run_blocking(&state, move |s| user_actions(&s.db, &ctx, artwork_id)).await?;
    Ok(Json(result))
}

pub async fn post_view(
    State(state): State<AppState>,
    Path(artwork_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let result = run_blocking(&state, move |s| record_view(&s.db, artwork_id)).await?;
    Ok(Json(result))
}

pub async fn post_comments_toggle(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(artwork_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let result = run_blocking(&state, move |s| toggle_comments_enabled(&s.db, &ctx, artwork_id)).await?;
    Ok(Json(result))
}
