use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Credits granted to every account at registration.
pub const SIGNUP_CREDITS: i64 = 3;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub plan: Plan,
    pub credits: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Subscription tier. Variants are declared in ascending order so that
/// `Ord` can be used to keep plan changes upward-only.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Plan {
    Free,
    Starter,
    Pro,
}

impl Plan {
    /// The higher of the two tiers.
    pub fn upgraded_to(self, other: Plan) -> Plan {
        self.max(other)
    }
}

impl Account {
    pub fn new(id: String, email: String) -> Self {
        let now = Utc::now();

        Self {
            id,
            email,
            plan: Plan::Free,
            credits: SIGNUP_CREDITS,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_credits(&self) -> bool {
        self.credits > 0
    }
}
