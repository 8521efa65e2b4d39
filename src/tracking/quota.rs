//! Monthly leave allowance.
//!
//! Every request dated in the month counts against the allowance, whatever
//! its status. A denied request still uses up a slot.

use serde::{Deserialize, Serialize};

/// Used both to seed the settings row and when no settings row exists.
pub const DEFAULT_MONTHLY_LEAVE_LIMIT: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeaveQuotaConfig {
    pub monthly_leave_limit: u32,
}

impl Default for LeaveQuotaConfig {
    fn default() -> Self {
        Self {
            monthly_leave_limit: DEFAULT_MONTHLY_LEAVE_LIMIT,
        }
    }
}

pub fn can_accept(existing_this_month: u64, limit: u32) -> bool {
    existing_this_month < u64::from(limit)
}

pub fn effective_limit(config: Option<&LeaveQuotaConfig>) -> u32 {
    config
        .map(|c| c.monthly_leave_limit)
        .unwrap_or(DEFAULT_MONTHLY_LEAVE_LIMIT)
}
