use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use crate::state::AppState;
use crate::{ads, artworks, auth, categories, comments, interactions};

/// All `/api` routes. Every request passes through session resolution;
/// each handler applies its own auth requirements.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .route("/api/user", get(auth::current_user))
        .route("/api/user/premium", post(auth::upgrade_premium))
        .route("/api/users/{id}/role", post(auth::update_role))
        .route(
            "/api/categories",
            get(categories::get_categories).post(categories::post_category),
        )
        .route(
            "/api/artworks",
            get(artworks::get_artworks).post(artworks::post_artwork),
        )
        .route("/api/artworks/{id}", get(artworks::get_artwork_by_id))
        .route("/api/artworks/{id}/premium", post(artworks::post_premium_status))
        .route(
            "/api/artworks/{id}/comments",
            get(comments::get_comments).post(comments::post_comment),
        )
        .route(
            "/api/artworks/{id}/comments/toggle",
            post(interactions::post_comments_toggle),
        )
        .route("/api/artworks/{id}/view", post(interactions::post_view))
        .route("/api/artworks/{id}/like", post(interactions::post_like))
        .route("/api/artworks/{id}/bookmark", post(interactions::post_bookmark))
        .route("/api/artworks/{id}/user-actions", get(interactions::get_user_actions))
        .route("/api/comments/{id}", delete(comments::remove_comment))
        .route("/api/comments/{id}/report", post(comments::post_report))
        .route("/api/ads", get(ads::get_ads))
        .route("/api/ads/{slot}", put(ads::put_ad))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::resolve_session,
        ))
        .with_state(state)
}
