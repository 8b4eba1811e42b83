//! # Payment Plan Math
//!
//! The installment arithmetic shared by the sale create and update paths,
//! plus the collapse-to-first-payment derivation that runs after every
//! sale update.
//!
//! ## The Money Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  total_price = Σ item sale prices (precision-checked per item + sum)   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PAY_LATER?  months = max(1, requested ?? 1)                           │
//! │              monthly = total.div_round(months)                         │
//! │              first_payment_now = requested ?? true                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  paid_now = total            (PAID_NOW)                                │
//! │           | monthly          (PAY_LATER, first payment now)            │
//! │           | explicit ?? 0    (PAY_LATER, deferred; create path only —  │
//! │                               the update path always uses 0)           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  remaining = total - paid_now   (must be ≥ 0)                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Two Independent Computations — Intentional
//! After an update persists the recomputed plan, the collapse step keeps
//! only the earliest payment activity and re-derives paid_now/remaining/
//! payment_type from that single activity's amount. The two computations
//! can disagree after repeated edits. That divergence is preserved
//! behavior, not a bug; do not unify them without product clarification.

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, Precision};
use crate::types::PaymentType;

// =============================================================================
// Payment Terms
// =============================================================================

/// The payment-shape fields of a sale request, with money already parsed.
#[derive(Debug, Clone)]
pub struct PaymentTerms {
    pub payment_type: PaymentType,
    pub installment_months: Option<i64>,
    pub first_payment_now: Option<bool>,
    /// Explicit up-front amount; only consulted by the create path.
    pub paid_now: Option<Money>,
}

// =============================================================================
// Payment Plan
// =============================================================================

/// The fully derived money state persisted onto a sale row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentPlan {
    pub total_price: Money,
    pub paid_now: Money,
    pub remaining: Money,
    pub installment_months: Option<i64>,
    pub first_payment_now: Option<bool>,
    pub monthly_installment: Option<Money>,
}

impl PaymentPlan {
    /// Derives the plan for a new sale.
    pub fn for_create(total_price: Money, terms: &PaymentTerms) -> CoreResult<PaymentPlan> {
        Self::compute(total_price, terms, terms.paid_now)
    }

    /// Derives the plan for a sale update.
    ///
    /// Differences from create:
    /// - the explicit up-front amount is never consulted (deferred first
    ///   payment means paid_now = 0),
    /// - PAID_NOW is guarded to be fully paid rather than auto-corrected.
    pub fn for_update(total_price: Money, terms: &PaymentTerms) -> CoreResult<PaymentPlan> {
        let plan = Self::compute(total_price, terms, None)?;

        if terms.payment_type == PaymentType::PaidNow && plan.paid_now < total_price {
            return Err(CoreError::PaidNowBelowTotal {
                paid_now_cents: plan.paid_now.cents(),
                total_cents: total_price.cents(),
            });
        }

        Ok(plan)
    }

    fn compute(
        total_price: Money,
        terms: &PaymentTerms,
        explicit_paid_now: Option<Money>,
    ) -> CoreResult<PaymentPlan> {
        total_price.ensure_fits_precision("total_price", Precision::Standard)?;

        let (installment_months, monthly_installment, first_payment_now) =
            match terms.payment_type {
                PaymentType::PaidNow => (None, None, None),
                PaymentType::PayLater => {
                    let months = terms.installment_months.unwrap_or(1).max(1);
                    let monthly = total_price
                        .div_round(months)
                        .ensure_fits_precision("monthly_installment", Precision::Standard)?;
                    (
                        Some(months),
                        Some(monthly),
                        Some(terms.first_payment_now.unwrap_or(true)),
                    )
                }
            };

        let paid_now = match terms.payment_type {
            PaymentType::PaidNow => total_price,
            PaymentType::PayLater => {
                if first_payment_now == Some(true) {
                    monthly_installment.unwrap_or(Money::zero())
                } else {
                    explicit_paid_now.unwrap_or(Money::zero())
                }
            }
        };
        paid_now.ensure_fits_precision("paid_now", Precision::Standard)?;

        let remaining = (total_price - paid_now)
            .ensure_non_negative_remaining()?
            .ensure_fits_precision("remaining", Precision::Standard)?;

        Ok(PaymentPlan {
            total_price,
            paid_now,
            remaining,
            installment_months,
            first_payment_now,
            monthly_installment,
        })
    }

    /// Re-derives the sale money state from its single retained payment
    /// activity (collapse-to-first-payment post-processing).
    ///
    /// Unlike the plan computation, this clamps instead of failing: the
    /// retained amount is forced into `[0, total]`.
    pub fn collapse_to_first_payment(
        total_price: Money,
        first_amount: Money,
    ) -> (Money, Money, PaymentType) {
        let paid_now = first_amount.clamp(Money::zero(), total_price);
        let remaining = total_price - paid_now;
        let payment_type = if remaining.cents() <= 0 {
            PaymentType::PaidNow
        } else {
            PaymentType::PayLater
        };
        (paid_now, remaining, payment_type)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
