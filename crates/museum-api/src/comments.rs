use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{info, warn};

use museum_db::Database;
use museum_db::models::CommentInsert;
use museum_types::api::{CreateCommentRequest, ReportResponse};
use museum_types::models::Comment;

use crate::error::{ApiError, ApiResult};
use crate::session::RequestContext;
use crate::state::{AppState, run_blocking};

const MAX_COMMENT_CHARS: usize = 2000;

pub fn list_comments(db: &Database, artwork_id: i64) -> ApiResult<Vec<Comment>> {
    if db.get_artwork(artwork_id)?.is_none() {
        return Err(ApiError::ArtworkNotFound);
    }
    Ok(db.list_comments(artwork_id)?.into_iter().map(Comment::from).collect())
}

pub fn create_comment(
    db: &Database,
    ctx: &RequestContext,
    artwork_id: i64,
    content: &str,
) -> ApiResult<Comment> {
    let user = ctx.require_authenticated()?;

    let content = content.trim();
    if content.is_empty() {
        return Err(ApiError::Validation("Comment cannot be empty".into()));
    }
    if content.chars().count() > MAX_COMMENT_CHARS {
        return Err(ApiError::Validation(format!(
            "Comment cannot exceed {} characters",
            MAX_COMMENT_CHARS
        )));
    }

    match db.insert_comment(artwork_id, user.id, content)? {
        CommentInsert::Created(row) => Ok(row.into()),
        CommentInsert::ArtworkMissing => Err(ApiError::ArtworkNotFound),
        CommentInsert::CommentsDisabled => Err(ApiError::CommentsDisabled),
    }
}

pub fn delete_comment(db: &Database, ctx: &RequestContext, comment_id: i64) -> ApiResult<()> {
    ctx.require_authenticated()?;
    let comment = db.get_comment(comment_id)?.ok_or(ApiError::CommentNotFound)?;
    let requester = ctx.require_owner_or_admin(comment.user_id)?;

    if !db.delete_comment(comment_id)? {
        return Err(ApiError::CommentNotFound);
    }
    info!("User {} deleted comment {}", requester.id, comment_id);
    Ok(())
}

/// Reports are idempotent per reporter and never hide the comment.
pub fn report_comment(db: &Database, ctx: &RequestContext, comment_id: i64) -> ApiResult<ReportResponse> {
    let reporter = ctx.require_authenticated()?;
    let reports = db
        .report_comment(comment_id, reporter.id)?
        .ok_or(ApiError::CommentNotFound)?;
    warn!(
        "Comment {} reported by user {} ({} distinct reports)",
        comment_id, reporter.id, reports
    );
    Ok(ReportResponse {
        reported: true,
        reports,
    })
}

// -- Handlers --

pub async fn get_comments(
    State(state): State<AppState>,
    Path(artwork_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let comments = run_blocking(&state, move |s| list_comments(&s.db, artwork_id)).await?;
    Ok(Json(comments))
}

pub async fn post_comment(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(artwork_id): Path<i64>,
    Json(req): Json<CreateCommentRequest>,
) -> ApiResult<impl IntoResponse> {
    let comment =
        run_blocking(&state, move |s| create_comment(&s.db, &ctx, artwork_id, &req.content)).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn remove_comment(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(comment_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    run_blocking(&state, move |s| delete_comment(&s.db, &ctx, comment_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn post_report(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(comment_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let result = run_blocking(&state, move |s| report_comment(&s.db, &ctx, comment_id)).await?;
    Ok(Json(result))
}
