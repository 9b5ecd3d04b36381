use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};

use museum_db::Database;
use museum_types::api::CreateCategoryRequest;
use museum_types::models::Category;

use crate::error::{ApiError, ApiResult};
use crate::session::RequestContext;
use crate::state::{AppState, run_blocking};

pub fn list_categories(db: &Database) -> ApiResult<Vec<Category>> {
    Ok(db.list_categories()?.into_iter().map(Category::from).collect())
}

pub fn create_category(db: &Database, ctx: &RequestContext, req: &CreateCategoryRequest) -> ApiResult<Category> {
    ctx.require_authenticated()?;

    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("Category name is required".into()));
    }

    let row = db.create_category(name, req.description.trim(), req.display_order.unwrap_or(0))?;
    Ok(row.into())
}

pub async fn get_categories(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let categories = run_blocking(&state, |s| list_categories(&s.db)).await?;
    Ok(Json(categories))
}

pub async fn post_category(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(req): Json<CreateCategoryRequest>,
) -> ApiResult<impl IntoResponse> {
    let category = run_blocking(&state, move |s| create_category(&s.db, &ctx, &req)).await?;
    Ok((StatusCode::CREATED, Json(category)))
}
