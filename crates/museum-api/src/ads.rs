use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::info;

use museum_db::Database;
use museum_types::api::UpsertAdSlotRequest;
use museum_types::models::AdSlot;

use crate::error::{ApiError, ApiResult};
use crate::session::RequestContext;
use crate::state::{AppState, run_blocking};

pub fn list_ad_slots(db: &Database) -> ApiResult<Vec<AdSlot>> {
    Ok(db.list_enabled_ad_slots()?.into_iter().map(AdSlot::from).collect())
}

pub fn upsert_ad_slot(
    db: &Database,
    ctx: &RequestContext,
    slot: &str,
    req: &UpsertAdSlotRequest,
) -> ApiResult<AdSlot> {
    let admin = ctx.require_admin()?;

    let slot = slot.trim();
    let image_url = req.image_url.trim();
    let link_url = req.link_url.trim();
    if slot.is_empty() || image_url.is_empty() || link_url.is_empty() {
        return Err(ApiError::Validation(
            "slot, imageUrl and linkUrl are required".into(),
        ));
    }

    let row = db.upsert_ad_slot(slot, image_url, link_url, req.enabled)?;
    info!("Admin {} configured ad slot '{}' (enabled={})", admin.id, slot, req.enabled);
    Ok(row.into())
}

pub async fn get_ads(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let slots = run_blocking(&state, |s| list_ad_slots(&s.db)).await?;
    Ok(Json(slots))
}

pub async fn put_ad(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(slot): Path<String>,
    Json(req): Json<UpsertAdSlotRequest>,
) -> ApiResult<impl IntoResponse> {
    let slot = run_blocking(&state, move |s| upsert_ad_slot(&s.db, &ctx, &slot, &req)).await?;
    Ok(Json(slot))
}
