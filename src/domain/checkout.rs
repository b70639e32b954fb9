use super::account::Plan;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata key carrying the account id on a checkout session.
pub const METADATA_ACCOUNT_KEY: &str = "uid";
/// Metadata key carrying the chosen price id on a checkout session.
pub const METADATA_PRICE_KEY: &str = "priceId";

/// What the user asked to buy. Lives only as session metadata at the
/// payment provider and comes back on the completion webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutIntent {
    pub account_id: String,
    pub price_id: String,
}

impl CheckoutIntent {
    pub fn new(account_id: String, price_id: String) -> Self {
        Self {
            account_id,
            price_id,
        }
    }

    pub fn to_metadata(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (METADATA_ACCOUNT_KEY.to_string(), self.account_id.clone()),
            (METADATA_PRICE_KEY.to_string(), self.price_id.clone()),
        ])
    }

    /// Returns `None` when either key is missing, blank or not a string.
    pub fn from_metadata(metadata: &serde_json::Value) -> Option<Self> {
        let field = |key: &str| {
            metadata
                .get(key)
                .and_then(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Some(Self {
            account_id: field(METADATA_ACCOUNT_KEY)?,
            price_id: field(METADATA_PRICE_KEY)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceTier {
    pub price_id: String,
    pub plan: Plan,
    pub credits: i64,
}

/// Fixed mapping from provider price ids to plan + credit grant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceTable {
    tiers: Vec<PriceTier>,
}

impl PriceTable {
    pub fn new(tiers: Vec<PriceTier>) -> Self {
        Self { tiers }
    }

    /// Starter and pro tiers; unset or blank price ids are left out.
    pub fn from_prices(
        starter_price_id: Option<&str>,
        starter_credits: i64,
        pro_price_id: Option<&str>,
        pro_credits: i64,
    ) -> Self {
        let mut tiers = Vec::with_capacity(2);

        for (price_id, plan, credits) in [
            (starter_price_id, Plan::Starter, starter_credits),
            (pro_price_id, Plan::Pro, pro_credits),
        ] {
            if let Some(id) = price_id.map(str::trim).filter(|s| !s.is_empty()) {
                tiers.push(PriceTier {
                    price_id: id.to_string(),
                    plan,
                    credits,
                });
            }
        }

        Self { tiers }
    }

    pub fn lookup(&self, price_id: &str) -> Option<&PriceTier> {
        self.tiers.iter().find(|t| t.price_id == price_id)
    }

    /// Credits granted for a price id; zero when the id is unknown.
    pub fn credits_for(&self, price_id: &str) -> i64 {
        self.lookup(price_id).map(|t| t.credits).unwrap_or(0)
    }
}

/// A resolved, not yet applied credit grant for one completed checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditGrant {
    /// Provider checkout session id; the dedup key for replays.
    pub session_id: String,
    pub account_id: String,
    pub price_id: String,
    pub plan: Plan,
    pub credits: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantOutcome {
    Applied,
    Duplicate,
}
