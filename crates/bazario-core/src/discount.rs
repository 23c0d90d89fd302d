//! # Discount Calculator
//!
//! Pure computation of the discount a voucher grants over a cart snapshot.
//!
//! ## Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Discount Computation                                 │
//! │                                                                         │
//! │  1. total = Σ quantity × unit_price over the whole cart                │
//! │       │                                                                 │
//! │       ├── total < min_purchase ──► BelowMinimum                        │
//! │       ▼                                                                 │
//! │  2. scope: applicable_products empty?                                  │
//! │       ├── yes ──► applicable items = whole cart                        │
//! │       └── no  ──► filter cart by product id                            │
//! │                     └── filtered empty ──► NotApplicable               │
//! │       ▼                                                                 │
//! │  3. applicable_value = Σ over applicable items                         │
//! │  4. discount = rate × applicable_value, round half up                  │
//! │       ├── clamp to max_discount (if set)                               │
//! │       └── clamp to applicable_value (never discount more than the      │
//! │           items being discounted are worth)                            │
//! │  5. final = total − discount                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every intermediate value is returned in the breakdown so the merchant
//! terminal can display the computation and audits can replay it.

use serde::{Deserialize, Serialize};

use crate::error::DiscountError;
use crate::money::{DiscountRate, Money};
use crate::types::CartItem;

// =============================================================================
// Inputs & Outputs
// =============================================================================

/// The cart-applicability terms of a voucher, detached from its lifecycle
/// state so the calculator stays a pure function of its arguments.
#[derive(Debug, Clone)]
pub struct DiscountTerms {
    pub rate: DiscountRate,
    /// Product ids the discount is scoped to. Empty = whole cart.
    pub applicable_products: Vec<String>,
    /// Floor on the full cart value required to redeem.
    pub min_purchase: Money,
    /// Optional cap on the absolute discount. None = uncapped.
    pub max_discount: Option<Money>,
}

/// The full audit record of one discount computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountBreakdown {
    /// Σ quantity × unit_price over all items.
    pub total_cart_value: Money,
    /// Σ over the items the voucher applies to.
    pub applicable_cart_value: Money,
    /// How many cart lines the voucher applied to.
    pub applicable_item_count: usize,
    /// The voucher's rate in basis points.
    pub discount_rate_bps: u32,
    /// The computed discount after clamping.
    pub discount_amount: Money,
    /// True when the cap reduced the raw rate × value figure.
    pub capped_at_max: bool,
    /// total − discount.
    pub final_amount: Money,
}

// =============================================================================
// Computation
// =============================================================================

/// Computes the discount `terms` grant over `cart`.
///
/// Pure: no I/O, no clock, no state. Rejections are business outcomes
/// ([`DiscountError`]), not faults.
pub fn compute_discount(
    terms: &DiscountTerms,
    cart: &[CartItem],
) -> Result<DiscountBreakdown, DiscountError> {
    let total_cart_value = cart
        .iter()
        .fold(Money::zero(), |acc, item| acc + item.line_total());

    if total_cart_value < terms.min_purchase {
        return Err(DiscountError::BelowMinimum {
            minimum: terms.min_purchase,
            cart_total: total_cart_value,
        });
    }

    let applicable: Vec<&CartItem> = if terms.applicable_products.is_empty() {
        cart.iter().collect()
    } else {
        cart.iter()
            .filter(|item| terms.applicable_products.contains(&item.product_id))
            .collect()
    };

    if !terms.applicable_products.is_empty() && applicable.is_empty() {
        return Err(DiscountError::NotApplicable);
    }

    let applicable_cart_value = applicable
        .iter()
        .fold(Money::zero(), |acc, item| acc + item.line_total());

    let raw_discount = terms.rate.apply_to(applicable_cart_value);

    let capped = terms.max_discount.map_or(raw_discount, |cap| raw_discount.min(cap));
    // A rate over 100% can never discount more than the applicable items.
    let discount_amount = capped.min(applicable_cart_value);

    Ok(DiscountBreakdown {
        total_cart_value,
        applicable_cart_value,
        applicable_item_count: applicable.len(),
        discount_rate_bps: terms.rate.bps(),
        discount_amount,
        capped_at_max: discount_amount < raw_discount,
        final_amount: total_cart_value - discount_amount,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item(product_id: &str, quantity: i64, unit_price_cents: i64) -> CartItem {
        CartItem {
            product_id: product_id.to_string(),
            quantity,
            unit_price_cents,
        }
    }

    fn terms(rate_pct: f64) -> DiscountTerms {
        DiscountTerms {
            rate: DiscountRate::from_percentage(rate_pct),
            applicable_products: vec![],
            min_purchase: Money::zero(),
            max_discount: None,
        }
    }

    #[test]
    fn test_whole_cart_discount() {
        // ₹1000 cart at 20% → ₹200 off, ₹800 final
        let cart = vec![item("p1", 2, 25000), item("p2", 1, 50000)];
        let b = compute_discount(&terms(20.0), &cart).unwrap();

        assert_eq!(b.total_cart_value.cents(), 100000);
        assert_eq!(b.applicable_cart_value.cents(), 100000);
        assert_eq!(b.discount_amount.cents(), 20000);
        assert_eq!(b.final_amount.cents(), 80000);
        assert!(!b.capped_at_max);
    }

    #[test]
    fn test_discount_clamped_to_cap() {
        // ₹1000 cart, 20% voucher, ₹150 cap → ₹150 (not ₹200), ₹850 final
        let cart = vec![item("p1", 1, 100000)];
        let mut t = terms(20.0);
        t.max_discount = Some(Money::from_cents(15000));

        let b = compute_discount(&t, &cart).unwrap();
        assert_eq!(b.discount_amount.cents(), 15000);
        assert_eq!(b.final_amount.cents(), 85000);
        assert!(b.capped_at_max);
    }

    #[test]
    fn test_below_minimum_rejected() {
        // min ₹500, cart ₹400 → BelowMinimum
        let cart = vec![item("p1", 4, 10000)];
        let mut t = terms(20.0);
        t.min_purchase = Money::from_cents(50000);

        let err = compute_discount(&t, &cart).unwrap_err();
        match err {
            DiscountError::BelowMinimum { minimum, cart_total } => {
                assert_eq!(minimum.cents(), 50000);
                assert_eq!(cart_total.cents(), 40000);
            }
            other => panic!("expected BelowMinimum, got {other:?}"),
        }
    }

    #[test]
    fn test_scoped_voucher_discounts_subset_only() {
        // Scoped to p1: cart [p1 ₹100, p2 ₹200] → discount on ₹100 only
        let cart = vec![item("p1", 1, 10000), item("p2", 1, 20000)];
        let mut t = terms(20.0);
        t.applicable_products = vec!["p1".to_string()];

        let b = compute_discount(&t, &cart).unwrap();
        assert_eq!(b.total_cart_value.cents(), 30000);
        assert_eq!(b.applicable_cart_value.cents(), 10000);
        assert_eq!(b.applicable_item_count, 1);
        assert_eq!(b.discount_amount.cents(), 2000);
        assert_eq!(b.final_amount.cents(), 28000);
    }

    #[test]
    fn test_scoped_voucher_with_no_matching_items() {
        let cart = vec![item("p2", 1, 20000)];
        let mut t = terms(20.0);
        t.applicable_products = vec!["p1".to_string()];

        assert!(matches!(
            compute_discount(&t, &cart),
            Err(DiscountError::NotApplicable)
        ));
    }

    #[test]
    fn test_minimum_checked_against_full_cart_before_scoping() {
        // min ₹250 met by the full cart even though the applicable subset
        // alone (₹100) is below it
        let cart = vec![item("p1", 1, 10000), item("p2", 1, 20000)];
        let mut t = terms(10.0);
        t.applicable_products = vec!["p1".to_string()];
        t.min_purchase = Money::from_cents(25000);

        let b = compute_discount(&t, &cart).unwrap();
        assert_eq!(b.discount_amount.cents(), 1000);
    }

    #[test]
    fn test_oversized_rate_clamped_to_applicable_value() {
        let cart = vec![item("p1", 1, 10000)];
        let t = terms(150.0);

        let b = compute_discount(&t, &cart).unwrap();
        assert_eq!(b.discount_amount.cents(), 10000);
        assert_eq!(b.final_amount.cents(), 0);
    }

    #[test]
    fn test_empty_cart() {
        // No minimum, no scope: an empty cart yields a zero discount
        let b = compute_discount(&terms(20.0), &[]).unwrap();
        assert_eq!(b.total_cart_value, Money::zero());
        assert_eq!(b.discount_amount, Money::zero());
        assert_eq!(b.final_amount, Money::zero());
    }
}
