use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::role::Role;

/// Row used for credential checks. Never serialized.
#[derive(sqlx::FromRow)]
pub struct UserCredentials {
    pub id: u64,
    pub username: String,
    pub password: String,
    pub role_id: u8,
}

#[derive(sqlx::FromRow)]
pub struct UserRow {
    pub id: u64,
    pub username: String,
    pub role_id: u8,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// User as shown to administrators, without the password hash.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    #[schema(example = 7)]
    pub id: u64,
    #[schema(example = "maria")]
    pub username: String,
    #[schema(example = false)]
    pub is_admin: bool,
    #[schema(example = "2024-03-01T09:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(example = "2024-03-05T08:55:00Z", format = "date-time", value_type = Option<String>)]
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<UserRow> for UserResponse {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            is_admin: Role::from_id(row.role_id).is_some_and(Role::is_admin),
            created_at: row.created_at,
            last_login_at: row.last_login_at,
        }
    }
}
