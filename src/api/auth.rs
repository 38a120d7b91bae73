/// /auth/* endpoints: signup, login, profile, and password lifecycle
use crate::{
    account::{
        ChangePasswordRequest, DeleteAccountRequest, LoginRequest, MessageResponse, ProfileUpdate,
        RequestPasswordReset, ResetPasswordRequest, SignupRequest, TokenResponse, UserPublic,
    },
    auth::AuthContext,
    context::AppContext,
    error::{AuthError, AuthResult},
};
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use validator::Validate;

/// Build auth routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me).patch(update_me))
        .route("/auth/request-password-reset", post(request_password_reset))
        .route("/auth/reset-password", post(reset_password))
        .route("/auth/change-password", post(change_password))
        .route("/auth/delete-account", post(delete_account))
}

/// Registration endpoint
async fn signup(
    State(ctx): State<AppContext>,
    Json(req): Json<SignupRequest>,
) -> AuthResult<(StatusCode, Json<UserPublic>)> {
    req.validate()
        .map_err(|e| AuthError::Validation(e.to_string()))?;

    let user = ctx.auth.signup(req).await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Login endpoint, issues a bearer token
async fn login(
    State(ctx): State<AppContext>,
    Json(req): Json<LoginRequest>,
) -> AuthResult<Json<TokenResponse>> {
    let token = ctx.auth.login(&req.email, &req.password).await?;

    Ok(Json(TokenResponse::bearer(token)))
}

/// Current user endpoint
async fn me(auth: AuthContext) -> Json<UserPublic> {
    Json(auth.user.into())
}

/// Profile update endpoint
async fn update_me(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Json(req): Json<ProfileUpdate>,
) -> AuthResult<Json<UserPublic>> {
    req.validate()
        .map_err(|e| AuthError::Validation(e.to_string()))?;

    let updated = ctx.auth.update_profile(&auth.user, req).await?;

    Ok(Json(updated.into()))
}

/// Start a password reset.
///
/// The response body is identical whether or not the email maps to an
/// account.
async fn request_password_reset(
    State(ctx): State<AppContext>,
    Json(req): Json<RequestPasswordReset>,
) -> AuthResult<Json<MessageResponse>> {
    ctx.passwords.request_reset(&req.email).await?;

    Ok(Json(MessageResponse {
        message: "If an account with that email exists, a password reset link has been sent"
            .to_string(),
    }))
}

/// Complete a password reset with an emailed token
async fn reset_password(
    State(ctx): State<AppContext>,
    Json(req): Json<ResetPasswordRequest>,
) -> AuthResult<Json<MessageResponse>> {
    ctx.passwords
        .confirm_reset(&req.token, &req.new_password)
        .await?;

    Ok(Json(MessageResponse {
        message: "Password has been reset successfully".to_string(),
    }))
}

/// Authenticated password change
async fn change_password(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Json(req): Json<ChangePasswordRequest>,
) -> AuthResult<Json<MessageResponse>> {
    let changed = ctx
        .passwords
        .change_password(&auth.user, &req.current_password, &req.new_password)
        .await?;

    if !changed {
        return Err(AuthError::CurrentPasswordMismatch);
    }

    Ok(Json(MessageResponse {
        message: "Password has been changed successfully".to_string(),
    }))
}

/// Delete the authenticated account and everything it owns
async fn delete_account(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Json(req): Json<DeleteAccountRequest>,
) -> AuthResult<StatusCode> {
    let deleted = ctx
        .auth
        .delete_account(&auth.user, &req.current_password)
        .await?;

    if !deleted {
        return Err(AuthError::CurrentPasswordMismatch);
    }

    Ok(StatusCode::NO_CONTENT)
}
