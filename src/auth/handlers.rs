use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            CurrentUser, ForgotPasswordRequest, LoginRequest, MeResponse, MessageResponse,
            ResetPasswordRequest, SignupRequest, TokenResponse,
        },
        error::AuthError,
        jwt::{AuthUser, JwtKeys},
        password::{hash_password, verify_password},
        repo_types::NewUser,
        reset, validation,
    },
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), AuthError> {
    validation::validate_signup(&payload)?;

    if state.store.find_by_email(&payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(AuthError::DuplicateEmail);
    }

    let hash = hash_password(&payload.password).map_err(AuthError::Hashing)?;

    let user = state
        .store
        .create(NewUser {
            name: payload.name,
            email: payload.email,
            password_hash: hash,
        })
        .await?;

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id, user.role)?;

    info!(user_id = %user.id, email = %user.email, "user signed up");
    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AuthError> {
    validation::validate_login(&payload)?;

    // unknown email and wrong password answer identically
    let user = match state.store.find_by_email(&payload.email).await? {
        Some(user) => user,
        None => {
            warn!(email = %payload.email, "login with unknown email");
            return Err(AuthError::InvalidCredentials);
        }
    };

    let ok = verify_password(&payload.password, &user.password_hash).map_err(AuthError::Hashing)?;
    if !ok {
        warn!(email = %payload.email, user_id = %user.id, "login with wrong password");
        return Err(AuthError::InvalidCredentials);
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id, user.role)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(TokenResponse { token }))
}

/// Identity comes straight from the verified claims; no store lookup.
#[instrument]
pub async fn get_me(AuthUser { id, role }: AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        user: CurrentUser { id, role },
    })
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    let user = match state.store.find_by_email(&payload.email).await? {
        Some(user) => user,
        None => {
            warn!(email = %payload.email, "forgot-password for unknown email");
            return Err(AuthError::UserNotFound);
        }
    };

    let token = reset::generate_reset_token();
    let expiry = reset::expiry_from(OffsetDateTime::now_utc());
    state
        .store
        .set_reset_token(&user.email, &token, expiry)
        .await?;

    // hand-off only; the response does not depend on delivery
    if let Err(e) = state.mailer.send_password_reset(&user.email, &token).await {
        warn!(error = %e, user_id = %user.id, "reset mail hand-off failed");
    }

    info!(user_id = %user.id, "password reset token issued");
    Ok(Json(MessageResponse {
        message: "Reset link sent to your email".into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    let now = OffsetDateTime::now_utc();
    let user = match state
        .store
        .find_by_valid_reset_token(&payload.token, now)
        .await?
    {
        Some(user) => user,
        None => {
            warn!("reset-password with unknown or expired token");
            return Err(AuthError::InvalidOrExpiredToken);
        }
    };

    let hash = hash_password(&payload.new_password).map_err(AuthError::Hashing)?;
    state.store.reset_password(user.id, &hash).await?;

    info!(user_id = %user.id, "password reset completed");
    Ok(Json(MessageResponse {
        message: "Password reset successfully".into(),
    }))
}
