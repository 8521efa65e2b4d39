use std::str::FromStr;

use crate::api::hours::parse_date;
use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::tracking::{
    calendar::month_range,
    format::{format_date_dmy, leave_status_label},
    quota::can_accept,
};
use crate::utils::leave_limit_cache;
use actix_web::{HttpResponse, web};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{MySqlPool, prelude::FromRow};
use utoipa::{IntoParams, ToSchema};

const MAX_REASON_CHARS: usize = 500;

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "2026-01-01", format = "date")]
    pub date: String,
    #[schema(example = "Medical appointment")]
    #[serde(default)]
    pub reason: String,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateLeaveStatus {
    #[schema(example = "approved")]
    pub status: String,
}

#[derive(Serialize, ToSchema)]
#[schema(example = json!({
    "data": [
        {
            "id": 1,
            "user_id": 7,
            "username": "maria",
            "date": "2026-01-02",
            "date_display": "02/01/2026",
            "reason": "Medical appointment",
            "status": "pending",
            "status_label": "Pendente",
            "created_at": "2026-01-01T00:00:00Z"
        }
    ],
    "page": 1,
    "per_page": 10,
    "total": 1
}))]
pub struct LeaveListResponse {
    pub data: Vec<LeaveResponse>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    #[schema(example = 7)]
    /// Filter by user ID
    pub user_id: Option<u64>,
    #[schema(example = "pending")]
    /// Filter by leave status
    pub status: Option<String>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u32>,
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u32>,
}

/// `(page, per_page, offset)`; page starts at 1, at most 100 rows per page.
fn paginate(page: Option<u32>, per_page: Option<u32>) -> (u32, u32, u64) {
    let per_page = per_page.unwrap_or(10).clamp(1, 100);
    let page = page.unwrap_or(1).max(1);
    let offset = u64::from(page - 1) * u64::from(per_page);
    (page, per_page, offset)
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    user_id: u64,
    username: String,
    leave_date: NaiveDate,
    reason: String,
    status: String,
    created_at: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveResponse {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 7)]
    pub user_id: u64,
    #[schema(example = "maria")]
    pub username: String,
    #[schema(example = "2026-01-02", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "02/01/2026")]
    pub date_display: String,
    #[schema(example = "Medical appointment")]
    pub reason: String,
    #[schema(example = "pending")]
    pub status: String,
    #[schema(example = "Pendente")]
    pub status_label: String,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

impl From<LeaveRow> for LeaveResponse {
    fn from(row: LeaveRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            username: row.username,
            date_display: format_date_dmy(&row.leave_date.format("%Y-%m-%d").to_string()),
            date: row.leave_date,
            reason: row.reason,
            status_label: leave_status_label(&row.status).to_string(),
            status: row.status,
            created_at: row.created_at,
        }
    }
}

const LEAVE_SELECT: &str = r#"
    SELECT l.id, l.user_id, u.username, l.leave_date, l.reason, l.status, l.created_at
    FROM leave_requests l
    JOIN users u ON u.id = l.user_id
"#;

fn validate_reason(raw: &str) -> Result<String, ApiError> {
    let reason = raw.trim();
    if reason.chars().count() > MAX_REASON_CHARS {
        return Err(ApiError::bad_request(format!(
            "Reason must be at most {MAX_REASON_CHARS} characters"
        )));
    }
    Ok(reason.to_string())
}

/// Parses a requested decision; only `approved` and `denied` are accepted.
fn parse_decision(raw: &str) -> Result<LeaveStatus, ApiError> {
    match LeaveStatus::from_str(raw.trim()) {
        Ok(next) if LeaveStatus::Pending.can_transition_to(next) => Ok(next),
        _ => Err(ApiError::bad_request(
            "Invalid status. Allowed: approved, denied",
        )),
    }
}

async fn fetch_leave(pool: &MySqlPool, leave_id: u64) -> Result<Option<LeaveResponse>, ApiError> {
    let sql = format!("{LEAVE_SELECT} WHERE l.id = ?");
    let row = sqlx::query_as::<_, LeaveRow>(&sql)
        .bind(leave_id)
        .fetch_optional(pool)
        .await
        .map_err(ApiError::db("Failed to fetch leave request"))?;
    Ok(row.map(LeaveResponse::from))
}

/* =========================
Own leave requests
========================= */
/// Leave requests of the logged-in user, latest date first
#[utoipa::path(
    get,
    path = "/api/leave-requests",
    responses(
        (status = 200, description = "Caller's leave requests", body = Vec<LeaveResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn my_leaves(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, ApiError> {
    let sql = format!("{LEAVE_SELECT} WHERE l.user_id = ? ORDER BY l.leave_date DESC, l.id DESC");
    let rows = sqlx::query_as::<_, LeaveRow>(&sql)
        .bind(auth.user_id)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = auth.user_id, "Failed to fetch own leave requests");
            ApiError::Internal
        })?;

    let data: Vec<LeaveResponse> = rows.into_iter().map(LeaveResponse::from).collect();
    Ok(HttpResponse::Ok().json(data))
}

/* =========================
Create leave request
========================= */
/// Submit a leave request, subject to the monthly limit
#[utoipa::path(
    post,
    path = "/api/leave-requests",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = LeaveResponse),
        (status = 400, description = "Malformed date, reason too long or monthly limit reached", body = Object,
         example = json!({
            "error": "Monthly limit of 2 leave request(s) reached"
         })
        ),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeave>,
) -> Result<HttpResponse, ApiError> {
    let user_id = auth.user_id;

    // 1️⃣ validate input
    let date = parse_date(&payload.date)?;
    let reason = validate_reason(&payload.reason)?;
    let (month_start, month_end) = month_range(date.year(), date.month())
        .ok_or_else(|| ApiError::bad_request("Invalid date"))?;

    let limit = leave_limit_cache::monthly_limit(pool.get_ref()).await?;

    // 2️⃣ count and insert under a lock on the user row
    let mut tx = pool
        .begin()
        .await
        .map_err(ApiError::db("Failed to start transaction"))?;

    let locked = sqlx::query_scalar::<_, u64>("SELECT id FROM users WHERE id = ? FOR UPDATE")
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(ApiError::db("Failed to lock user"))?;
    if locked.is_none() {
        return Err(ApiError::Unauthorized("User no longer exists".into()));
    }

    let existing = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM leave_requests
        WHERE user_id = ?
        AND leave_date >= ?
        AND leave_date < ?
        "#,
    )
    .bind(user_id)
    .bind(month_start)
    .bind(month_end)
    .fetch_one(&mut *tx)
    .await
    .map_err(ApiError::db("Failed to count leave requests"))?;

    if !can_accept(existing.max(0) as u64, limit) {
        tracing::info!(user_id, existing, limit, "Leave request rejected by monthly limit");
        return Err(ApiError::bad_request(format!(
            "Monthly limit of {limit} leave request(s) reached"
        )));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO leave_requests (user_id, leave_date, reason, status)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(date)
    .bind(&reason)
    .bind(LeaveStatus::Pending.as_ref())
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, user_id, "Failed to create leave request");
        ApiError::Internal
    })?;

    tx.commit()
        .await
        .map_err(ApiError::db("Failed to commit leave request"))?;

    let leave_id = result.last_insert_id();
    tracing::info!(user_id, leave_id, %date, "Leave request submitted");

    match fetch_leave(pool.get_ref(), leave_id).await? {
        Some(created) => Ok(HttpResponse::Created().json(created)),
        None => Err(ApiError::Internal),
    }
}

/* =========================
Admin: list all
========================= */
/// All leave requests, most recently created first
#[utoipa::path(
    get,
    path = "/api/admin/leave-requests",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn leave_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    // -------------------------
    // Pagination
    // -------------------------
    let (page, per_page, offset) = paginate(query.page, query.per_page);

    // -------------------------
    // WHERE clause
    // -------------------------
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(user_id) = query.user_id {
        where_sql.push_str(" AND l.user_id = ?");
        args.push(FilterValue::U64(user_id));
    }

    if let Some(status) = query.status.as_deref() {
        where_sql.push_str(" AND l.status = ?");
        args.push(FilterValue::Str(status));
    }

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!("SELECT COUNT(*) FROM leave_requests l{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }

    let total = count_q
        .fetch_one(pool.get_ref())
        .await
        .map_err(ApiError::db("Failed to count leave requests"))?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!(
        "{LEAVE_SELECT}{where_sql} ORDER BY l.created_at DESC, l.id DESC LIMIT ? OFFSET ?"
    );

    let mut data_q = sqlx::query_as::<_, LeaveRow>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let rows = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(ApiError::db("Failed to fetch leave list"))?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data: rows.into_iter().map(LeaveResponse::from).collect(),
        page,
        per_page,
        total,
    }))
}

/* =========================
Admin: decide
========================= */
/// Approve or deny a pending leave request
#[utoipa::path(
    put,
    path = "/api/admin/leave-requests/{leave_id}/status",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request")
    ),
    request_body = UpdateLeaveStatus,
    responses(
        (status = 200, description = "Status updated", body = Object, example = json!({
            "message": "Leave request approved"
        })),
        (status = 400, description = "Status is not approved/denied"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already decided")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn set_leave_status(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateLeaveStatus>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let leave_id = path.into_inner();
    let next = parse_decision(&payload.status)?;

    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = ?
        WHERE id = ?
        AND status = ?
        "#,
    )
    .bind(next.as_ref())
    .bind(leave_id)
    .bind(LeaveStatus::Pending.as_ref())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Update leave status failed");
        ApiError::Internal
    })?;

    if result.rows_affected() == 0 {
        let current = sqlx::query_as::<_, LeaveRequest>(
            "SELECT id, user_id, leave_date, reason, status, created_at FROM leave_requests WHERE id = ?",
        )
        .bind(leave_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(ApiError::db("Failed to fetch leave request"))?;

        return Err(match current {
            None => ApiError::not_found("Leave request not found"),
            Some(leave) => ApiError::conflict(format!(
                "Leave request already {}",
                leave.status
            )),
        });
    }

    tracing::info!(leave_id, admin = %auth.username, status = %next, "Leave request decided");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": format!("Leave request {next}")
    })))
}

/* =========================
Admin: delete
========================= */
/// Delete a leave request in any state
#[utoipa::path(
    delete,
    path = "/api/admin/leave-requests/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request")
    ),
    responses(
        (status = 200, description = "Deleted", body = Object, example = json!({
            "message": "Leave request deleted"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let leave_id = path.into_inner();

    let result = sqlx::query("DELETE FROM leave_requests WHERE id = ?")
        .bind(leave_id)
        .execute(pool.get_ref())
        .await
        .map_err(ApiError::db("Delete leave request failed"))?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Leave request not found"));
    }

    tracing::info!(leave_id, admin = %auth.username, "Leave request deleted");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave request deleted"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate_defaults_and_bounds() {
        assert_eq!(paginate(None, None), (1, 10, 0));
        assert_eq!(paginate(Some(0), Some(0)), (1, 1, 0));
        assert_eq!(paginate(Some(3), Some(500)), (3, 100, 200));
    }

    #[test]
    fn test_paginate_last_page_does_not_overflow() {
        let (page, per_page, offset) = paginate(Some(u32::MAX), Some(100));
        assert_eq!(page, u32::MAX);
        assert_eq!(per_page, 100);
        assert_eq!(offset, (u64::from(u32::MAX) - 1) * 100);
    }

    #[test]
    fn test_parse_decision() {
        assert_eq!(parse_decision("approved").unwrap(), LeaveStatus::Approved);
        assert_eq!(parse_decision(" denied ").unwrap(), LeaveStatus::Denied);
        assert!(parse_decision("pending").is_err());
        assert!(parse_decision("rejected").is_err());
        assert!(parse_decision("").is_err());
    }

    #[test]
    fn test_validate_reason() {
        assert_eq!(validate_reason("  dentist  ").unwrap(), "dentist");
        assert_eq!(validate_reason("").unwrap(), "");
        assert!(validate_reason(&"x".repeat(MAX_REASON_CHARS)).is_ok());
        assert!(validate_reason(&"x".repeat(MAX_REASON_CHARS + 1)).is_err());
    }

    #[test]
    fn test_response_from_row() {
        let row = LeaveRow {
            id: 4,
            user_id: 7,
            username: "maria".into(),
            leave_date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            reason: "dentist".into(),
            status: "denied".into(),
            created_at: DateTime::<Utc>::from_timestamp(0, 0).unwrap(),
        };
        let resp = LeaveResponse::from(row);
        assert_eq!(resp.date_display, "05/03/2024");
        assert_eq!(resp.status_label, "Negado");
        assert_eq!(resp.status, "denied");
    }
}
