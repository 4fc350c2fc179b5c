//! Purchase Records
//!
//! One purchase per checkout attempt. Status moves exactly once from
//! `Pending` to a terminal state and never back.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::error::{LmsError, Result};
use crate::ids::{CourseId, PurchaseId, UserId};

/// Purchase lifecycle state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

impl PurchaseStatus {
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final result reported by the payment provider
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaymentOutcome {
    Succeeded,
    Failed,
}

impl PaymentOutcome {
    /// Status a pending purchase moves to on this outcome
    pub const fn target_status(self) -> PurchaseStatus {
        match self {
            Self::Succeeded => PurchaseStatus::Completed,
            Self::Failed => PurchaseStatus::Failed,
        }
    }
}

/// A purchase document
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: PurchaseId,

    pub user_id: UserId,

    pub course_id: CourseId,

    /// Server-computed charge; immutable after creation
    pub amount: Decimal,

    pub status: PurchaseStatus,

    /// Checkout session id issued by the payment provider
    #[serde(default)]
    pub session_id: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Purchase {
    /// Create a pending purchase with a fresh id
    pub fn new(user_id: UserId, course_id: CourseId, amount: Decimal) -> Self {
        let now = Utc::now();
        Self {
            id: PurchaseId::generate(),
            user_id,
            course_id,
            amount,
            status: PurchaseStatus::Pending,
            session_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Status this purchase would move to, or `None` once terminal
    pub const fn next_status(&self, outcome: PaymentOutcome) -> Option<PurchaseStatus> {
        if self.status.is_terminal() {
            None
        } else {
            Some(outcome.target_status())
        }
    }

    /// Amount in minor currency units (cents), truncated
    pub fn amount_minor_units(&self) -> Result<i64> {
        self.amount
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.trunc().to_i64())
            .ok_or_else(|| LmsError::InvalidInput(format!("Amount out of range: {}", self.amount)))
    }
}
