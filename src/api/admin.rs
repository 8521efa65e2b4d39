use crate::auth::auth::AuthUser;
use crate::auth::handlers::is_username_available;
use crate::auth::password::hash_password;
use crate::error::{ApiError, is_unique_violation};
use crate::model::user::{UserResponse, UserRow};
use crate::utils::{leave_limit_cache, username_cache};
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::ToSchema;

const MIN_PASSWORD_CHARS: usize = 4;

#[derive(Deserialize, ToSchema)]
pub struct SetLeaveLimit {
    #[schema(example = 2)]
    pub limit: i64,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveLimitResponse {
    #[schema(example = 2)]
    pub monthly_leave_limit: u32,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateUser {
    #[schema(example = "maria.silva")]
    pub username: Option<String>,
    #[schema(example = "n3wpass")]
    pub new_password: Option<String>,
}

fn validate_limit(limit: i64) -> Result<u32, ApiError> {
    u32::try_from(limit).map_err(|_| ApiError::bad_request("Invalid limit"))
}

/// Fields to change for a user update, after validation.
#[derive(Debug, PartialEq)]
struct UserChanges {
    username: Option<String>,
    new_password: Option<String>,
}

/// The new name, unless it is exactly the current one.
fn rename_target(requested: Option<String>, current: &str) -> Option<String> {
    requested.filter(|new_name| new_name != current)
}

fn validate_user_update(payload: &UpdateUser) -> Result<UserChanges, ApiError> {
    let username = payload
        .username
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string);

    let new_password = payload
        .new_password
        .as_deref()
        .filter(|p| !p.is_empty())
        .map(str::to_string);

    if let Some(password) = &new_password {
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(ApiError::bad_request(format!(
                "New password must have at least {MIN_PASSWORD_CHARS} characters"
            )));
        }
    }

    if username.is_none() && new_password.is_none() {
        return Err(ApiError::bad_request("No data to update was provided"));
    }

    Ok(UserChanges {
        username,
        new_password,
    })
}

/// Current monthly leave limit
#[utoipa::path(
    get,
    path = "/api/admin/settings/leave-limit",
    responses(
        (status = 200, description = "Current limit", body = LeaveLimitResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_leave_limit(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let limit = leave_limit_cache::monthly_limit(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(LeaveLimitResponse {
        monthly_leave_limit: limit,
    }))
}

/// Set the monthly leave limit
#[utoipa::path(
    post,
    path = "/api/admin/settings/leave-limit",
    request_body = SetLeaveLimit,
    responses(
        (status = 200, description = "Limit updated", body = Object, example = json!({
            "message": "Monthly leave limit set to 3"
        })),
        (status = 400, description = "Negative or out-of-range limit"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn set_leave_limit(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<SetLeaveLimit>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let limit = validate_limit(payload.limit)?;
    leave_limit_cache::set_monthly_limit(pool.get_ref(), limit).await?;

    tracing::info!(limit, admin = %auth.username, "Monthly leave limit changed");

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Monthly leave limit set to {limit}")
    })))
}

/// All users, without password hashes
#[utoipa::path(
    get,
    path = "/api/admin/users",
    responses(
        (status = 200, description = "Users", body = Vec<UserResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_users(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let rows = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, username, role_id, created_at, last_login_at
        FROM users
        ORDER BY username
        "#,
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(ApiError::db("Failed to fetch users"))?;

    let users: Vec<UserResponse> = rows.into_iter().map(UserResponse::from).collect();
    Ok(HttpResponse::Ok().json(users))
}

/// Rename a user and/or reset their password
#[utoipa::path(
    put,
    path = "/api/admin/users/{user_id}",
    params(("user_id" = u64, Path, description = "ID of the user")),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = Object, example = json!({
            "message": "User updated"
        })),
        (status = 400, description = "Nothing to update or password too short"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Username already in use")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateUser>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let user_id = path.into_inner();
    let changes = validate_user_update(&payload)?;

    let current = sqlx::query_scalar::<_, String>("SELECT username FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(ApiError::db("Failed to fetch user"))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let rename = rename_target(changes.username, &current);

    // a case-only rename keeps the row's own slot in the unique index
    if let Some(new_name) = rename.as_deref().filter(|n| !n.eq_ignore_ascii_case(&current)) {
        if !is_username_available(new_name, pool.get_ref()).await? {
            return Err(ApiError::conflict("Username already in use"));
        }
    }

    let hashed = match &changes.new_password {
        Some(password) => Some(hash_password(password).map_err(|e| {
            tracing::error!(error = %e, "Failed to hash password");
            ApiError::Internal
        })?),
        None => None,
    };

    if rename.is_none() && hashed.is_none() {
        // same name as before and no password
        return Ok(HttpResponse::Ok().json(json!({ "message": "User updated" })));
    }

    let result = sqlx::query(
        r#"
        UPDATE users
        SET username = COALESCE(?, username),
            password = COALESCE(?, password)
        WHERE id = ?
        "#,
    )
    .bind(rename.as_deref())
    .bind(hashed.as_deref())
    .bind(user_id)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => {
            return Err(ApiError::conflict("Username already in use"));
        }
        Err(e) => {
            tracing::error!(error = %e, user_id, "Failed to update user");
            return Err(ApiError::Internal);
        }
    }

    if let Some(new_name) = &rename {
        username_cache::release(&current).await;
        username_cache::mark_taken(new_name).await;
    }

    tracing::info!(
        user_id,
        admin = %auth.username,
        renamed = rename.is_some(),
        password_reset = hashed.is_some(),
        "User updated"
    );

    Ok(HttpResponse::Ok().json(json!({ "message": "User updated" })))
}
