use argon2::Argon2;
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{info, warn};

use museum_db::Database;
use museum_types::api::{AuthResponse, Claims, LoginRequest, RegisterRequest, SetRoleRequest};
use museum_types::models::{Role, User};

use crate::error::{ApiError, ApiResult};
use crate::session::RequestContext;
use crate::state::{AppState, AppStateInner, run_blocking};

const KEY_LEN: usize = 32;
const SALT_LEN: usize = 16;
const TOKEN_TTL_DAYS: i64 = 30;
const DUMMY_SALT: [u8; SALT_LEN] = [0x5a; SALT_LEN];

// -- Password hashing --

/// Hashes a password as `hex(key).hex(salt)` using Argon2id with a fresh
/// random salt.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt: [u8; SALT_LEN] = rand::random();
    let key = derive_key(password.as_bytes(), &salt)?;
    Ok(format!("{}.{}", hex::encode(key), hex::encode(salt)))
}

/// Checks a password against a stored `hash.salt` value. Malformed stored
/// values never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((hash_hex, salt_hex)) = stored.split_once('.') else {
        return false;
    };
    let (Ok(expected), Ok(salt)) = (hex::decode(hash_hex), hex::decode(salt_hex)) else {
        return false;
    };

    match derive_key(password.as_bytes(), &salt) {
        Ok(derived) => constant_time_eq(&derived, &expected),
        Err(e) => {
            warn!("Password verification failed to derive key: {}", e);
            false
        }
    }
}

/// Checks a login attempt. A missing account still costs one key
/// derivation, so unknown usernames and wrong passwords take the same time.
fn verify_account(password: &str, stored: Option<&str>) -> bool {
    match stored {
        Some(stored) => verify_password(password, stored),
        None => {
            let _ = std::hint::black_box(derive_key(password.as_bytes(), &DUMMY_SALT));
            false
        }
    }
}

fn derive_key(password: &[u8], salt: &[u8]) -> anyhow::Result<[u8; KEY_LEN]> {
    let mut key = [0u8; KEY_LEN];
    Argon2::default()
        .hash_password_into(password, salt, &mut key)
        .map_err(|e| anyhow::anyhow!("argon2 key derivation failed: {}", e))?;
    Ok(key)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    // Still walk the longer input when lengths differ
    let len_match = a.len() == b.len();
    let max_len = a.len().max(b.len());

    let mut diff = 0u8;
    for i in 0..max_len {
        diff |= a.get(i).copied().unwrap_or(0) ^ b.get(i).copied().unwrap_or(0);
    }

    len_match && diff == 0
}

// -- Tokens --

pub fn create_token(secret: &str, user: &User) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        exp: (chrono::Utc::now() + chrono::Duration::days(TOKEN_TTL_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

// -- Services --

pub fn register_user(state: &AppStateInner, req: &RegisterRequest) -> ApiResult<AuthResponse> {
    let username = req.username.trim();
    if username.chars().count() < 3 || username.chars().count() > 32 {
        return Err(ApiError::Validation(
            "Username must be between 3 and 32 characters".into(),
        ));
    }
    if req.password.is_empty() {
        return Err(ApiError::Validation("Password is required".into()));
    }

    if state.db.get_user_by_username(username)?.is_some() {
        return Err(ApiError::DuplicateUsername);
    }

    let role = if state.is_bootstrap_admin(username) {
        Role::Admin
    } else {
        Role::User
    };

    let password_hash = hash_password(&req.password)?;
    let user_id = state
        .db
        .create_user(username, &password_hash, role)?
        .ok_or(ApiError::DuplicateUsername)?;

    let user = load_user(&state.db, user_id)?;
    info!("Registered user {} ({}) as {}", user.username, user.id, user.role);

    let token = create_token(&state.jwt_secret, &user)?;
    Ok(AuthResponse { user, token })
}

pub fn login_user(state: &AppStateInner, req: &LoginRequest) -> ApiResult<AuthResponse> {
    let row = state.db.get_user_by_username(req.username.trim())?;
    if !verify_account(&req.password, row.as_ref().map(|r| r.password.as_str())) {
        return Err(ApiError::Unauthorized);
    }
    let user = row.ok_or(ApiError::Unauthorized)?.into_user();
    let token = create_token(&state.jwt_secret, &user)?;
    Ok(AuthResponse { user, token })
}

/// Marks the requester as premium. Payment happens out of band.
pub fn purchase_premium(db: &Database, ctx: &RequestContext) -> ApiResult<User> {
    let user = ctx.require_authenticated()?;
    db.set_user_premium(user.id, true)?;
    info!("User {} upgraded to premium", user.id);
    load_user(db, user.id)
}

pub fn set_role(db: &Database, ctx: &RequestContext, user_id: i64, role: Role) -> ApiResult<User> {
    let admin = ctx.require_admin()?;
    if !db.set_user_role(user_id, role)? {
        return Err(ApiError::NotFound("User"));
    }
    info!("Admin {} set role of user {} to {}", admin.id, user_id, role);
    load_user(db, user_id)
}

fn load_user(db: &Database, id: i64) -> ApiResult<User> {
    db.get_user_by_id(id)?
        .map(|row| row.into_user())
        .ok_or(ApiError::NotFound("User"))
}

// -- Handlers --

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let response = run_blocking(&state, move |s| register_user(s, &req)).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let response = run_blocking(&state, move |s| login_user(s, &req)).await?;
    Ok(Json(response))
}

pub async fn current_user(Extension(ctx): Extension<RequestContext>) -> ApiResult<impl IntoResponse> {
    Ok(Json(ctx.require_authenticated()?.clone()))
}

pub async fn upgrade_premium(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> ApiResult<impl IntoResponse> {
    let user = run_blocking(&state, move |s| purchase_premium(&s.db, &ctx)).await?;
    Ok(Json(user))
}

pub async fn update_role(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(user_id): Path<i64>,
    Json(req): Json<SetRoleRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = run_blocking(&state, move |s| set_role(&s.db, &ctx, user_id, req.role)).await?;
    Ok(Json(user))
}
