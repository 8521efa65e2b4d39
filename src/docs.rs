use crate::api::admin::{LeaveLimitResponse, SetLeaveLimit, UpdateUser};
use crate::api::hours::{DayHoursResponse, MonthSummaryResponse, SaveHours, WeekHoursResponse};
use crate::api::leave_request::{
    CreateLeave, LeaveFilter, LeaveListResponse, LeaveResponse, UpdateLeaveStatus,
};
use crate::model::leave_request::LeaveStatus;
use crate::model::user::UserResponse;
use crate::models::{LoginReqDto, LoginResponse, RegisterReq};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Timesheet API",
        version = "1.0.0",
        description = r#"
## Timesheet & leave requests

Users log the minutes they worked each day, look at weekly and monthly
totals and download a monthly CSV report. They can also ask for days off,
up to a monthly limit set by administrators.

### Durations
`POST /api/hours/{date}` accepts free-form entries which are summed:
`8` or `2.5` (hours), `1:45`, `2h30m`, `2.5h`, `45m`.

### Security
All `/api` endpoints need a **JWT Bearer** token from `/auth/login`.
`/api/admin/*` endpoints are for administrators only.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,

        crate::api::hours::get_day,
        crate::api::hours::save_day,
        crate::api::hours::week_data,
        crate::api::hours::month_summary,
        crate::api::hours::export_month,

        crate::api::leave_request::my_leaves,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::set_leave_status,
        crate::api::leave_request::delete_leave,

        crate::api::admin::get_leave_limit,
        crate::api::admin::set_leave_limit,
        crate::api::admin::list_users,
        crate::api::admin::update_user
    ),
    components(
        schemas(
            RegisterReq,
            LoginReqDto,
            LoginResponse,
            SaveHours,
            DayHoursResponse,
            WeekHoursResponse,
            MonthSummaryResponse,
            CreateLeave,
            UpdateLeaveStatus,
            LeaveStatus,
            LeaveFilter,
            LeaveResponse,
            LeaveListResponse,
            SetLeaveLimit,
            LeaveLimitResponse,
            UpdateUser,
            UserResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration and login"),
        (name = "Hours", description = "Worked hours, summaries and export"),
        (name = "Leave", description = "Leave requests"),
        (name = "Admin", description = "Administration"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by the protected paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_routes_and_security() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json["paths"]["/api/hours/{date}"]["post"].is_object());
        assert!(json["paths"]["/api/leave-requests"]["post"].is_object());
        assert!(json["paths"]["/api/admin/users/{user_id}"]["put"].is_object());
        assert!(json["components"]["securitySchemes"]["bearer_auth"].is_object());
    }
}
