use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::tracking::duration::Minutes;

/// Worked minutes for one user on one date. `(user_id, work_date)` is unique.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct DailyRecord {
    pub user_id: u64,
    pub work_date: NaiveDate,
    pub minutes: Minutes,
}
