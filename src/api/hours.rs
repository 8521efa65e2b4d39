use std::collections::HashMap;

use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::daily_record::DailyRecord;
use crate::tracking::{
    calendar::{month_range, week_buckets, week_hours},
    duration::{Minutes, format_colon, format_words, sum_tokens},
    format::is_iso_date,
    report::{month_csv, month_csv_filename},
};
use actix_web::{
    HttpResponse,
    http::header::{ContentDisposition, DispositionParam, DispositionType},
    web,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::ToSchema;

/// Either raw form entries to be parsed and summed, or an already computed
/// total. `entries` wins when both are present.
#[derive(Deserialize, ToSchema)]
pub struct SaveHours {
    #[schema(example = json!(["2h30m", "1:15", "45m"]))]
    pub entries: Option<Vec<String>>,
    #[schema(example = 270)]
    pub total_minutes: Option<i64>,
}

#[derive(Serialize, ToSchema)]
pub struct DayHoursResponse {
    #[schema(example = "2024-03-05", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = 270)]
    pub total_minutes: Minutes,
    #[schema(example = "04:30")]
    pub formatted: String,
}

#[derive(Serialize, ToSchema)]
pub struct WeekHoursResponse {
    /// Sunday..Saturday
    #[schema(example = json!(["2024-03-03", "2024-03-04", "2024-03-05", "2024-03-06", "2024-03-07", "2024-03-08", "2024-03-09"]), value_type = Vec<String>)]
    pub dates: [NaiveDate; 7],
    #[schema(example = json!([0.0, 8.0, 4.5, 0.0, 0.0, 0.0, 0.0]), value_type = Vec<f64>)]
    pub hours: [f64; 7],
}

#[derive(Serialize, ToSchema)]
pub struct MonthSummaryResponse {
    #[schema(example = 2024)]
    pub year: i32,
    #[schema(example = 3)]
    pub month: u32,
    #[schema(example = 750)]
    pub total_month_minutes: i64,
    #[schema(example = "12:30")]
    pub formatted: String,
    #[schema(example = "12h 30m")]
    pub formatted_words: String,
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, ApiError> {
    let invalid = || ApiError::bad_request(format!("Invalid date \"{raw}\", expected YYYY-MM-DD"));
    // chrono's %Y alone would also take signed and wider years
    if !is_iso_date(raw) {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid())
}

fn parse_month(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), ApiError> {
    month_range(year, month).ok_or_else(|| ApiError::bad_request("Invalid year or month"))
}

/// Works out the minutes to store from a save payload.
fn minutes_to_save(payload: &SaveHours) -> Result<Minutes, ApiError> {
    if let Some(entries) = &payload.entries {
        return Ok(sum_tokens(entries)?);
    }
    match payload.total_minutes {
        Some(total) => Minutes::try_from(total)
            .map_err(|_| ApiError::bad_request("total_minutes must be a non-negative number")),
        None => Err(ApiError::bad_request(
            "Provide either entries or total_minutes",
        )),
    }
}

async fn fetch_range(
    pool: &MySqlPool,
    user_id: u64,
    from: NaiveDate,
    until: NaiveDate,
) -> Result<Vec<DailyRecord>, ApiError> {
    sqlx::query_as::<_, DailyRecord>(
        r#"
        SELECT user_id, work_date, minutes
        FROM daily_records
        WHERE user_id = ?
        AND work_date >= ?
        AND work_date < ?
        ORDER BY work_date
        "#,
    )
    .bind(user_id)
    .bind(from)
    .bind(until)
    .fetch_all(pool)
    .await
    .map_err(ApiError::db("Failed to fetch daily records"))
}

/// Worked minutes for a single day
#[utoipa::path(
    get,
    path = "/api/hours/{date}",
    params(("date" = String, Path, description = "Day as YYYY-MM-DD")),
    responses(
        (status = 200, description = "Minutes for the day, 0 when nothing was saved", body = DayHoursResponse),
        (status = 400, description = "Malformed date"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Hours"
)]
pub async fn get_day(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let date = parse_date(&path)?;

    let minutes = sqlx::query_scalar::<_, Minutes>(
        "SELECT minutes FROM daily_records WHERE user_id = ? AND work_date = ?",
    )
    .bind(auth.user_id)
    .bind(date)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(ApiError::db("Failed to fetch daily record"))?
    .unwrap_or(0);

    Ok(HttpResponse::Ok().json(DayHoursResponse {
        date,
        total_minutes: minutes,
        formatted: format_colon(i64::from(minutes)),
    }))
}

/// Save (create or overwrite) the worked minutes for a day
#[utoipa::path(
    post,
    path = "/api/hours/{date}",
    params(("date" = String, Path, description = "Day as YYYY-MM-DD")),
    request_body = SaveHours,
    responses(
        (status = 200, description = "Saved", body = DayHoursResponse),
        (status = 400, description = "Malformed date or duration entry", body = Object, example = json!({
            "error": "Invalid duration format: \"abc\""
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Hours"
)]
pub async fn save_day(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
    payload: web::Json<SaveHours>,
) -> Result<HttpResponse, ApiError> {
    let date = parse_date(&path)?;
    let minutes = minutes_to_save(&payload)?;

    sqlx::query(
        r#"
        INSERT INTO daily_records (user_id, work_date, minutes)
        VALUES (?, ?, ?)
        ON DUPLICATE KEY UPDATE minutes = VALUES(minutes)
        "#,
    )
    .bind(auth.user_id)
    .bind(date)
    .bind(minutes)
    .execute(pool.get_ref())
    .await
    .map_err(ApiError::db("Failed to save daily record"))?;

    tracing::info!(user_id = auth.user_id, %date, minutes, "Daily record saved");

    Ok(HttpResponse::Ok().json(DayHoursResponse {
        date,
        total_minutes: minutes,
        formatted: format_colon(i64::from(minutes)),
    }))
}

/// Hours per day for the Sunday-first week containing the date
#[utoipa::path(
    get,
    path = "/api/week-data/{date}",
    params(("date" = String, Path, description = "Any day of the week, YYYY-MM-DD")),
    responses(
        (status = 200, description = "Seven days of hours", body = WeekHoursResponse),
        (status = 400, description = "Malformed date"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Hours"
)]
pub async fn week_data(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let anchor = parse_date(&path)?;
    let dates = week_buckets(anchor).ok_or_else(|| ApiError::bad_request("Date out of range"))?;
    let until = dates[6].succ_opt().unwrap_or(dates[6]);

    let records: HashMap<NaiveDate, Minutes> =
        fetch_range(pool.get_ref(), auth.user_id, dates[0], until)
            .await?
            .into_iter()
            .map(|r| (r.work_date, r.minutes))
            .collect();

    Ok(HttpResponse::Ok().json(WeekHoursResponse {
        hours: week_hours(&records, &dates),
        dates,
    }))
}

/// Total worked minutes in a calendar month
#[utoipa::path(
    get,
    path = "/api/month-summary/{year}/{month}",
    params(
        ("year" = i32, Path, description = "Year, e.g. 2024"),
        ("month" = u32, Path, description = "Month 1-12")
    ),
    responses(
        (status = 200, description = "Month total", body = MonthSummaryResponse),
        (status = 400, description = "Invalid year or month"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Hours"
)]
pub async fn month_summary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(i32, u32)>,
) -> Result<HttpResponse, ApiError> {
    let (year, month) = path.into_inner();
    let (from, until) = parse_month(year, month)?;

    // SUM() is DECIMAL in MySQL
    let total = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT CAST(COALESCE(SUM(minutes), 0) AS SIGNED)
        FROM daily_records
        WHERE user_id = ?
        AND work_date >= ?
        AND work_date < ?
        "#,
    )
    .bind(auth.user_id)
    .bind(from)
    .bind(until)
    .fetch_one(pool.get_ref())
    .await
    .map_err(ApiError::db("Failed to sum month"))?;

    Ok(HttpResponse::Ok().json(MonthSummaryResponse {
        year,
        month,
        total_month_minutes: total,
        formatted: format_colon(total),
        formatted_words: format_words(total),
    }))
}

/// CSV report of a month's daily records
#[utoipa::path(
    get,
    path = "/api/export/month/{year}/{month}",
    params(
        ("year" = i32, Path, description = "Year, e.g. 2024"),
        ("month" = u32, Path, description = "Month 1-12")
    ),
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv", body = String,
         example = json!("data,horas_trabalhadas\n05/03/2024,\"02:30\"\n")),
        (status = 400, description = "Invalid year or month"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Hours"
)]
pub async fn export_month(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(i32, u32)>,
) -> Result<HttpResponse, ApiError> {
    let (year, month) = path.into_inner();
    let (from, until) = parse_month(year, month)?;

    let rows: Vec<(NaiveDate, Minutes)> = fetch_range(pool.get_ref(), auth.user_id, from, until)
        .await?
        .into_iter()
        .map(|r| (r.work_date, r.minutes))
        .collect();

    let disposition = ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![DispositionParam::Filename(month_csv_filename(
            &auth.username,
            year,
            month,
        ))],
    };

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header(disposition)
        .body(month_csv(&rows)))
}
