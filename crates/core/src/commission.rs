use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::employee::{CommissionTier, Employee};
use crate::domain::role::Role;

/// Calendar days of tenure after which a new agent moves onto the
/// veteran plan.
pub const VETERAN_TENURE_DAYS: i64 = 180;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CommissionError {
    #[error("commission is not defined for role `{role}`")]
    UnsupportedRole { role: Role },
}

/// Pay terms attached to one tier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTerms {
    pub base_salary: Decimal,
    pub commission_rate_pct: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionSchedule {
    pub new_terms: TierTerms,
    pub veteran_terms: TierTerms,
    pub veteran_tenure_days: i64,
}

impl Default for CommissionSchedule {
    fn default() -> Self {
        Self {
            new_terms: TierTerms {
                base_salary: Decimal::new(60_000, 0),
                commission_rate_pct: Decimal::new(5, 0),
            },
            veteran_terms: TierTerms {
                base_salary: Decimal::new(30_000, 0),
                commission_rate_pct: Decimal::new(20, 0),
            },
            veteran_tenure_days: VETERAN_TENURE_DAYS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionResult {
    pub tier: CommissionTier,
    pub base_salary: Decimal,
    pub commission_rate_pct: Decimal,
    pub will_change_to_veteran: bool,
    pub days_until_change: Option<i64>,
    pub is_early_promotion: bool,
}

impl CommissionSchedule {
    /// Effective commission terms for an agent at `now`.
    ///
    /// The stored tier is advisory: an agent stored as `New` (or with no
    /// tier at all) past the tenure threshold is computed as `Veteran`,
    /// and a stored `Veteran` below the threshold is honored but flagged
    /// as an early promotion.
    pub fn calculate(
        &self,
        employee: &Employee,
        now: DateTime<Utc>,
    ) -> Result<CommissionResult, CommissionError> {
        if employee.role != Role::Agent {
            return Err(CommissionError::UnsupportedRole { role: employee.role });
        }

        let tenure_days = employee.tenure_days(now);
        let stored_tier = employee.commission_tier.unwrap_or(CommissionTier::New);
        let seasoned = tenure_days >= self.veteran_tenure_days;

        let tier = match stored_tier {
            CommissionTier::Veteran => CommissionTier::Veteran,
            CommissionTier::New if seasoned => CommissionTier::Veteran,
            CommissionTier::New => CommissionTier::New,
        };

        let terms = match tier {
            CommissionTier::New => &self.new_terms,
            CommissionTier::Veteran => &self.veteran_terms,
        };

        let will_change_to_veteran = tier == CommissionTier::New;
        let days_until_change =
            will_change_to_veteran.then(|| self.veteran_tenure_days - tenure_days);
        let is_early_promotion = stored_tier == CommissionTier::Veteran && !seasoned;

        Ok(CommissionResult {
            tier,
            base_salary: terms.base_salary,
            commission_rate_pct: terms.commission_rate_pct,
            will_change_to_veteran,
            days_until_change,
            is_early_promotion,
        })
    }
}
