use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use museum_db::Database;
use museum_db::models::NewArtwork;
use museum_types::api::{ArtworkQuery, CreateArtworkRequest, PremiumStatusResponse, SetPremiumRequest};
use museum_types::models::Artwork;

use crate::error::{ApiError, ApiResult};
use crate::session::RequestContext;
use crate::state::{AppState, run_blocking};

const DEFAULT_PAGE_SIZE: u32 = 50;
const MAX_PAGE_SIZE: u32 = 200;

/// Lists artworks in display order. Premium entries stay in the listing,
/// but requesters without premium access only get a locked preview.
pub fn list_artworks(db: &Database, ctx: &RequestContext, query: &ArtworkQuery) -> ApiResult<Vec<Artwork>> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0);
    let full_access = ctx.can_view_premium();

    let artworks = db
        .list_artworks(query.category_id, limit, offset)?
        .into_iter()
        .map(Artwork::from)
        .map(|artwork| {
            if artwork.is_premium && !full_access {
                artwork.into_preview()
            } else {
                artwork
            }
        })
        .collect();

    Ok(artworks)
}

pub fn get_artwork(db: &Database, ctx: &RequestContext, id: i64) -> ApiResult<Artwork> {
    let artwork = db
        .get_artwork(id)?
        .map(Artwork::from)
        .ok_or(ApiError::ArtworkNotFound)?;
    ctx.gate_premium(artwork)
}

pub fn create_artwork(db: &Database, ctx: &RequestContext, req: &CreateArtworkRequest) -> ApiResult<Artwork> {
    let user = ctx.require_authenticated()?;

    let title = required(&req.title, "title")?;
    let description = required(&req.description, "description")?;
    let image_url = required(&req.image_url, "imageUrl")?;
    let video_url = req
        .video_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty());

    let aspect_ratio = req.aspect_ratio.unwrap_or(1.0);
    if !aspect_ratio.is_finite() || aspect_ratio <= 0.0 {
        return Err(ApiError::Validation("aspectRatio must be a positive number".into()));
    }

    if !db.category_exists(req.category_id)? {
        return Err(ApiError::Validation(format!(
            "Category {} does not exist",
            req.category_id
        )));
    }

    let id = db.insert_artwork(&NewArtwork {
        title,
        description,
        image_url,
        video_url,
        category_id: req.category_id,
        is_premium: req.is_premium.unwrap_or(false),
        comments_enabled: req.comments_enabled.unwrap_or(true),
        display_order: req.display_order.unwrap_or(0),
        aspect_ratio,
    })?;
    info!("User {} created artwork {}", user.id, id);

    db.get_artwork(id)?
        .map(Artwork::from)
        .ok_or(ApiError::ArtworkNotFound)
}

pub fn set_premium_status(
    db: &Database,
    ctx: &RequestContext,
    id: i64,
    is_premium: bool,
) -> ApiResult<PremiumStatusResponse> {
    let admin = ctx.require_admin()?;
    if !db.set_artwork_premium(id, is_premium)? {
        return Err(ApiError::ArtworkNotFound);
    }
    info!("Admin {} set artwork {} premium={}", admin.id, id, is_premium);
    Ok(PremiumStatusResponse {
        success: true,
        is_premium,
    })
}

fn required<'a>(value: &'a str, field: &str) -> ApiResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        Err(ApiError::Validation(format!("{} is required", field)))
    } else {
        Ok(value)
    }
}

// -- Handlers --

pub async fn get_artworks(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<ArtworkQuery>,
) -> ApiResult<impl IntoResponse> {
    let artworks = run_blocking(&state, move |s| list_artworks(&s.db, &ctx, &query)).await?;
    Ok(Json(artworks))
}

pub async fn get_artwork_by_id(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let artwork = run_blocking(&state, move |s| get_artwork(&s.db, &ctx, id)).await?;
    Ok(Json(artwork))
}

pub async fn post_artwork(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(req): Json<CreateArtworkRequest>,
) -> ApiResult<impl IntoResponse> {
    let artwork = run_blocking(&state, move |s| create_artwork(&s.db, &ctx, &req)).await?;
    Ok((StatusCode::CREATED, Json(artwork)))
}

pub async fn post_premium_status(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<i64>,
    Json(req): Json<SetPremiumRequest>,
) -> ApiResult<impl IntoResponse> {
    let status = run_blocking(&state, move |s| set_premium_status(&s.db, &ctx, id, req.is_premium)).await?;
    Ok(Json(status))
}
