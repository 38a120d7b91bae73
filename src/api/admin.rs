/// /admin/* endpoints, gated on the admin role
use crate::{
    account::UserPublic,
    auth::AdminContext,
    context::AppContext,
    error::{AuthError, AuthResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;

/// Build admin routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/users/count", get(count_users))
        .route("/admin/users/:user_id", delete(delete_user))
}

/// Pagination and search parameters for user listing
#[derive(Debug, Deserialize)]
struct ListUsersQuery {
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_limit")]
    limit: i64,
    search: Option<String>,
}

fn default_limit() -> i64 {
    10
}

/// List user profiles with pagination and search
async fn list_users(
    State(ctx): State<AppContext>,
    admin: AdminContext,
    Query(query): Query<ListUsersQuery>,
) -> AuthResult<Json<Vec<UserPublic>>> {
    if query.skip < 0 || query.limit < 1 || query.limit > 100 {
        return Err(AuthError::Validation(
            "skip must be >= 0 and limit between 1 and 100".to_string(),
        ));
    }

    tracing::info!(admin_id = %admin.user.id, "Admin requested user listing");

    let users = ctx
        .users
        .list(query.skip, query.limit, query.search.as_deref())
        .await?;

    Ok(Json(users.into_iter().map(UserPublic::from).collect()))
}

/// Total user count, optionally filtered by the listing search
async fn count_users(
    State(ctx): State<AppContext>,
    admin: AdminContext,
    Query(query): Query<ListUsersQuery>,
) -> AuthResult<Json<i64>> {
    tracing::info!(admin_id = %admin.user.id, "Admin requested user count");

    let count = ctx.users.count(query.search.as_deref()).await?;

    Ok(Json(count))
}

/// Delete a user account by id, including everything it owns
async fn delete_user(
    State(ctx): State<AppContext>,
    admin: AdminContext,
    Path(user_id): Path<String>,
) -> AuthResult<StatusCode> {
    tracing::info!(admin_id = %admin.user.id, target = %user_id, "Admin requested user deletion");

    let deleted = ctx.users.delete_cascade(&user_id).await?;
    if !deleted {
        return Err(AuthError::NotFound(
            "User not found or could not be deleted".to_string(),
        ));
    }

    Ok(StatusCode::NO_CONTENT)
}
