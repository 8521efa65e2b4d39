pub mod daily_record;
pub mod leave_request;
pub mod role;
pub mod user;
