//! Time-tracking rules: duration parsing, formatting, week/month
//! aggregation and the monthly leave allowance. Nothing here touches the
//! database or the request.

pub mod calendar;
pub mod duration;
pub mod format;
pub mod quota;
pub mod report;
