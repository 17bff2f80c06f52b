//! Billing cycles and the day counts used to compute expiry dates.
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Day count applied when a cycle is missing or not recognised.
pub const DEFAULT_CYCLE_DAYS: i64 = 30;

/// Days added per month of renewal.
pub const RENEWAL_DAYS_PER_MONTH: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    Monthly,
    Quarterly,
    Semiannually,
    Annually,
    Biennially,
    Triennially,
}

impl BillingCycle {
    pub fn days(&self) -> i64 {
        match self {
            BillingCycle::Monthly => 30,
            BillingCycle::Quarterly => 90,
            BillingCycle::Semiannually => 180,
            BillingCycle::Annually => 365,
            BillingCycle::Biennially => 730,
            BillingCycle::Triennially => 1095,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::Monthly => "monthly",
            BillingCycle::Quarterly => "quarterly",
            BillingCycle::Semiannually => "semiannually",
            BillingCycle::Annually => "annually",
            BillingCycle::Biennially => "biennially",
            BillingCycle::Triennially => "triennially",
        }
    }
}

impl FromStr for BillingCycle {
    type Err = ();

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "monthly" => Ok(BillingCycle::Monthly),
            "quarterly" => Ok(BillingCycle::Quarterly),
            "semiannually" => Ok(BillingCycle::Semiannually),
            "annually" => Ok(BillingCycle::Annually),
            "biennially" => Ok(BillingCycle::Biennially),
            "triennially" => Ok(BillingCycle::Triennially),
            _ => Err(()),
        }
    }
}

/// Expiry offset in days for a stored cycle string.
pub fn cycle_days(cycle: Option<&str>) -> i64 {
    cycle
        .and_then(|c| c.parse::<BillingCycle>().ok())
        .map(|c| c.days())
        .unwrap_or(DEFAULT_CYCLE_DAYS)
}
