//! Account aggregate - the buyer/student principal and its entitlements.
//!
//! An account exclusively owns two entitlement collections:
//!
//! - `enrollments`: at most one entry per course id
//! - `purchases`: at most one entry per product id; repeat purchases merge
//!   additively into the existing entry's quantity
//!
//! Entitlements are only ever added or merged by the reconciliation workflow,
//! never removed, so both collections grow monotonically.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AccountId, CourseId, ProductId, Timestamp, ValidationError};

/// A course enrollment held by an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub course_id: CourseId,
    pub enrolled_at: Timestamp,
    /// Completion progress, 0-100.
    pub progress: u8,
    pub completed: bool,
    pub completed_at: Option<Timestamp>,
}

impl Enrollment {
    /// Creates a fresh enrollment at zero progress.
    pub fn new(course_id: CourseId, enrolled_at: Timestamp) -> Self {
        Self {
            course_id,
            enrolled_at,
            progress: 0,
            completed: false,
            completed_at: None,
        }
    }

    /// Sets progress, validating the 0-100 range.
    pub fn set_progress(&mut self, progress: u8) -> Result<(), ValidationError> {
        if progress > 100 {
            return Err(ValidationError::out_of_range(
                "progress",
                0,
                100,
                i64::from(progress),
            ));
        }
        self.progress = progress;
        Ok(())
    }
}

/// A product purchase held by an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub product_id: ProductId,
    pub purchased_at: Timestamp,
    /// Always at least 1.
    pub quantity: u32,
}

/// The buyer/student principal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub enrollments: Vec<Enrollment>,
    pub purchases: Vec<Purchase>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Account {
    /// Creates a new account with empty entitlement collections.
    pub fn new(
        id: AccountId,
        full_name: impl Into<String>,
        email: impl Into<String>,
        phone: Option<String>,
    ) -> Result<Self, ValidationError> {
        let full_name = full_name.into();
        let email = email.into();

        if full_name.trim().is_empty() {
            return Err(ValidationError::empty_field("full_name"));
        }
        if email.trim().is_empty() {
            return Err(ValidationError::empty_field("email"));
        }
        if !email.contains('@') {
            return Err(ValidationError::invalid_format("email", "missing @ symbol"));
        }

        let now = Timestamp::now();
        Ok(Self {
            id,
            full_name,
            email,
            phone,
            enrollments: Vec::new(),
            purchases: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Whether the account already holds an enrollment for the course.
    pub fn is_enrolled(&self, course_id: &CourseId) -> bool {
        self.enrollments.iter().any(|e| &e.course_id == course_id)
    }

    /// Current merged quantity for a product, zero if never purchased.
    pub fn purchased_quantity(&self, product_id: &ProductId) -> u32 {
        self.purchases
            .iter()
            .find(|p| &p.product_id == product_id)
            .map(|p| p.quantity)
            .unwrap_or(0)
    }

    /// Adds an enrollment if none exists for the course.
    ///
    /// Returns `true` if a new enrollment was added, `false` if the account
    /// was already enrolled (a no-op, not an error).
    pub fn enroll(&mut self, course_id: CourseId, now: Timestamp) -> bool {
        if self.is_enrolled(&course_id) {
            return false;
        }
        self.enrollments.push(Enrollment::new(course_id, now));
        self.updated_at = now;
        true
    }

    /// Merges a product purchase into the account.
    ///
    /// Quantities below 1 are treated as 1. If an entry for the product
    /// already exists its quantity is incremented; otherwise a new entry is
    /// created. Returns the merged quantity after the operation.
    pub fn add_purchase(&mut self, product_id: ProductId, quantity: u32, now: Timestamp) -> u32 {
        let quantity = quantity.max(1);
        self.updated_at = now;

        if let Some(existing) = self
            .purchases
            .iter_mut()
            .find(|p| p.product_id == product_id)
        {
            existing.quantity = existing.quantity.saturating_add(quantity);
            return existing.quantity;
        }

        self.purchases.push(Purchase {
            product_id,
            purchased_at: now,
            quantity,
        });
        quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_account() -> Account {
        Account::new(
            AccountId::new(),
            "Ada Obi",
            "ada@example.com",
            Some("+2348012345678".to_string()),
        )
        .unwrap()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Construction Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn new_account_starts_with_no_entitlements() {
        let account = test_account();
        assert!(account.enrollments.is_empty());
        assert!(account.purchases.is_empty());
    }

    #[test]
    fn new_account_rejects_empty_name() {
        let result = Account::new(AccountId::new(), "  ", "ada@example.com", None);
        assert!(result.is_err());
    }

    #[test]
    fn new_account_rejects_invalid_email() {
        let result = Account::new(AccountId::new(), "Ada Obi", "not-an-email", None);
        assert!(matches!(result, Err(ValidationError::InvalidFormat { .. })));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Enrollment Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn enroll_adds_entry_with_zero_progress() {
        let mut account = test_account();
        let course = CourseId::new();

        assert!(account.enroll(course, Timestamp::now()));

        assert_eq!(account.enrollments.len(), 1);
        assert_eq!(account.enrollments[0].progress, 0);
        assert!(!account.enrollments[0].completed);
        assert!(account.is_enrolled(&course));
    }

    #[test]
    fn enroll_twice_is_a_noop() {
        let mut account = test_account();
        let course = CourseId::new();

        assert!(account.enroll(course, Timestamp::now()));
        assert!(!account.enroll(course, Timestamp::now()));

        assert_eq!(account.enrollments.len(), 1);
    }

    #[test]
    fn enrollment_progress_validates_range() {
        let mut enrollment = Enrollment::new(CourseId::new(), Timestamp::now());
        assert!(enrollment.set_progress(100).is_ok());
        assert!(enrollment.set_progress(101).is_err());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Purchase Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn add_purchase_creates_entry() {
        let mut account = test_account();
        let product = ProductId::new();

        let merged = account.add_purchase(product, 2, Timestamp::now());

        assert_eq!(merged, 2);
        assert_eq!(account.purchases.len(), 1);
        assert_eq!(account.purchased_quantity(&product), 2);
    }

    #[test]
    fn add_purchase_merges_quantity_into_existing_entry() {
        let mut account = test_account();
        let product = ProductId::new();

        account.add_purchase(product, 2, Timestamp::now());
        let merged = account.add_purchase(product, 3, Timestamp::now());

        assert_eq!(merged, 5);
        assert_eq!(account.purchases.len(), 1);
        assert_eq!(account.purchased_quantity(&product), 5);
    }

    #[test]
    fn add_purchase_clamps_zero_quantity_to_one() {
        let mut account = test_account();
        let product = ProductId::new();

        let merged = account.add_purchase(product, 0, Timestamp::now());

        assert_eq!(merged, 1);
    }

    #[test]
    fn purchases_of_different_products_stay_separate() {
        let mut account = test_account();
        let first = ProductId::new();
        let second = ProductId::new();

        account.add_purchase(first, 1, Timestamp::now());
        account.add_purchase(second, 4, Timestamp::now());

        assert_eq!(account.purchases.len(), 2);
        assert_eq!(account.purchased_quantity(&first), 1);
        assert_eq!(account.purchased_quantity(&second), 4);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Monotonicity Properties
    // ════════════════════════════════════════════════════════════════════════════

    proptest! {
        #[test]
        fn purchase_merges_are_additive_and_monotonic(quantities in proptest::collection::vec(1u32..1000, 1..20)) {
            let mut account = Account::new(
                AccountId::new(),
                "Prop Tester",
                "prop@example.com",
                None,
            ).unwrap();
            let product = ProductId::new();

            let mut expected: u64 = 0;
            let mut previous = 0u32;
            for quantity in quantities {
                expected += u64::from(quantity);
                let merged = account.add_purchase(product, quantity, Timestamp::now());
                // Quantity never shrinks and there is only ever one entry.
                prop_assert!(merged >= previous);
                prop_assert_eq!(account.purchases.len(), 1);
                previous = merged;
            }
            prop_assert_eq!(u64::from(previous), expected);
        }

        #[test]
        fn repeated_enrollment_never_duplicates(attempts in 1usize..10) {
            let mut account = Account::new(
                AccountId::new(),
                "Prop Tester",
                "prop@example.com",
                None,
            ).unwrap();
            let course = CourseId::new();

            for _ in 0..attempts {
                account.enroll(course, Timestamp::now());
            }
            prop_assert_eq!(account.enrollments.len(), 1);
        }
    }
}
