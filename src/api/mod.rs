pub mod admin;
pub mod hours;
pub mod leave_request;
