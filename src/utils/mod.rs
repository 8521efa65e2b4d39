pub mod leave_limit_cache;
pub mod username_cache;
