use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use jsonwebtoken::{DecodingKey, Validation, decode};
use tracing::debug;

use museum_types::api::Claims;

use crate::error::ApiResult;
use crate::session::RequestContext;
use crate::state::{AppState, run_blocking};

/// Resolve the bearer token (if any) into a [`RequestContext`] extension.
///
/// Missing or invalid tokens yield an anonymous context; handlers decide
/// whether that is acceptable.
pub async fn resolve_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> ApiResult<Response> {
    let claims = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .and_then(|auth| decode_token(&state.jwt_secret, auth.token()));

    let ctx = match claims {
        Some(claims) => {
            let user_id = claims.sub;
            let row = run_blocking(&state, move |s| Ok(s.db.get_user_by_id(user_id)?)).await?;
            match row {
                Some(row) => RequestContext::for_user(row.into_user()),
                None => {
                    debug!("Token for unknown user {}", user_id);
                    RequestContext::anonymous()
                }
            }
        }
        None => RequestContext::anonymous(),
    };

    req.extensions_mut().insert(ctx);
    Ok(next.run(req).await)
}

fn decode_token(secret: &str, token: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| debug!("Rejected session token: {}", e))
    .ok()
}
