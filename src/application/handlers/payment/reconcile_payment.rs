//! ReconcilePaymentHandler - Command handler for payment confirmation and
//! entitlement reconciliation.
//!
//! Given a client-submitted gateway reference and the buyer-declared item
//! list, the handler verifies the payment against the gateway and applies the
//! purchased entitlements exactly once:
//!
//! 1. verification happens-before any entitlement mutation
//! 2. entitlement mutation happens-before order creation
//! 3. order creation happens-before the receipt notification
//!
//! Replays of an already-reconciled reference return the prior outcome
//! without mutating state. The order store's reference-uniqueness constraint
//! is the single point of truth for "already reconciled"; in-process, the
//! per-account lock makes the check-then-grant sequence atomic so a racing
//! double-submit cannot double-merge product quantities.

use std::sync::Arc;

use crate::domain::foundation::{AccountId, Amount, CourseId, ProductId};
use crate::domain::order::{LineItem, NewOrder, Order};
use crate::domain::reconciliation::ReconciliationError;
use crate::ports::{
    AccountStore, EntitlementLedger, GatewayError, GatewayVerification, LedgerError, OrderStore,
    OrderStoreError, PaymentGateway, Receipt, ReceiptNotifier,
};

use super::AccountLocks;

/// Command to reconcile a client-submitted payment reference.
#[derive(Debug, Clone)]
pub struct ReconcilePaymentCommand {
    /// Authenticated account id, supplied by the auth layer - never taken
    /// from the client payload.
    pub account_id: AccountId,

    /// Gateway transaction reference.
    pub reference: String,

    /// Buyer-declared item list.
    pub items: Vec<RequestedItem>,
}

/// A buyer-declared item in the reconciliation request.
///
/// Closed over the entitlement kinds the platform sells; adding a kind makes
/// every match site a compile error until handled.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestedItem {
    Course {
        course_id: CourseId,
        name: Option<String>,
        unit_price: Option<Amount>,
    },
    Product {
        product_id: ProductId,
        name: Option<String>,
        unit_price: Option<Amount>,
        quantity: u32,
    },
}

/// Outcome of a reconciliation attempt.
///
/// A gateway that authoritatively reports the payment as unsuccessful is a
/// legitimate terminal state, not an error - hence a variant here rather than
/// a `ReconciliationError`.
#[derive(Debug, Clone)]
pub enum ReconcileOutcome {
    /// Payment verified; entitlements applied (or already applied under this
    /// reference).
    Completed(CompletedReconciliation),

    /// The gateway reports the payment as not successful. No state was
    /// mutated. Retrying with the same reference will not succeed.
    NotVerified {
        reference: String,
        gateway_status: String,
    },
}

/// A verified, persisted reconciliation.
#[derive(Debug, Clone)]
pub struct CompletedReconciliation {
    /// The persisted order record.
    pub order: Order,

    /// Count of courses newly granted by this attempt. For replays, the
    /// course line-item count of the original order.
    pub enrolled_courses: u32,

    /// The gateway's settlement data for this reference.
    pub verification: GatewayVerification,

    /// True when the reference had already been reconciled and the prior
    /// outcome was replayed without mutating state.
    pub replayed: bool,
}

/// Handler orchestrating the payment reconciliation workflow.
pub struct ReconcilePaymentHandler {
    gateway: Arc<dyn PaymentGateway>,
    accounts: Arc<dyn AccountStore>,
    ledger: Arc<dyn EntitlementLedger>,
    orders: Arc<dyn OrderStore>,
    notifier: Arc<dyn ReceiptNotifier>,
    account_locks: AccountLocks,
}

impl ReconcilePaymentHandler {
    /// Creates a handler.
    ///
    /// `account_locks` must be the process-wide registry so that handlers
    /// built per-request still serialize per-account critical sections.
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        accounts: Arc<dyn AccountStore>,
        ledger: Arc<dyn EntitlementLedger>,
        orders: Arc<dyn OrderStore>,
        notifier: Arc<dyn ReceiptNotifier>,
        account_locks: AccountLocks,
    ) -> Self {
        Self {
            gateway,
            accounts,
            ledger,
            orders,
            notifier,
            account_locks,
        }
    }

    pub async fn handle(
        &self,
        cmd: ReconcilePaymentCommand,
    ) -> Result<ReconcileOutcome, ReconciliationError> {
        if cmd.reference.trim().is_empty() {
            return Err(ReconciliationError::invalid_request(
                "reference",
                "Reference is required",
            ));
        }

        // 1. Authoritative verification. Nothing mutates before this succeeds.
        let verification = match self.gateway.verify(&cmd.reference).await {
            Ok(verification) => verification,
            Err(GatewayError::Rejected { status }) => {
                tracing::info!(
                    reference = %cmd.reference,
                    gateway_status = %status,
                    "payment not verified by gateway"
                );
                return Ok(ReconcileOutcome::NotVerified {
                    reference: cmd.reference,
                    gateway_status: status,
                });
            }
            Err(err) => {
                tracing::warn!(
                    reference = %cmd.reference,
                    error = %err,
                    "gateway verification unavailable"
                );
                return Err(ReconciliationError::verification_unavailable(err.to_string()));
            }
        };

        // 2. Idempotency guard: a reference that already produced an order is
        // replayed, not re-applied.
        if let Some(existing) = self.find_existing(&cmd.reference).await? {
            return Ok(ReconcileOutcome::Completed(
                self.replay(existing, verification),
            ));
        }

        // 3-5. Account load, grants, and order creation inside the
        // per-account critical section.
        let completed = {
            let _guard = self.account_locks.acquire(&cmd.account_id).await;

            // Re-check under the lock: a double-submit racing on this account
            // must observe the winner's order before granting anything.
            if let Some(existing) = self.find_existing(&cmd.reference).await? {
                self.replay(existing, verification)
            } else {
                self.apply(&cmd, verification).await?
            }
        };

        // 6. Best-effort receipt. Failures are logged, never propagated.
        if !completed.replayed {
            self.notify(&completed).await;
        }

        Ok(ReconcileOutcome::Completed(completed))
    }

    async fn find_existing(
        &self,
        reference: &str,
    ) -> Result<Option<Order>, ReconciliationError> {
        self.orders
            .find_by_reference(reference)
            .await
            .map_err(|err| ReconciliationError::infrastructure(err.to_string()))
    }

    /// Builds the replay response for an already-reconciled reference.
    fn replay(
        &self,
        order: Order,
        verification: GatewayVerification,
    ) -> CompletedReconciliation {
        tracing::info!(
            reference = %order.reference,
            order_id = %order.id,
            "reference already reconciled, replaying prior outcome"
        );
        CompletedReconciliation {
            enrolled_courses: order.course_item_count(),
            order,
            verification,
            replayed: true,
        }
    }

    /// Applies grants and records the order. Runs inside the account lock.
    async fn apply(
        &self,
        cmd: &ReconcilePaymentCommand,
        verification: GatewayVerification,
    ) -> Result<CompletedReconciliation, ReconciliationError> {
        let account = self
            .accounts
            .find_by_id(&cmd.account_id)
            .await
            .map_err(|err| ReconciliationError::infrastructure(err.to_string()))?
            .ok_or(ReconciliationError::AccountNotFound(cmd.account_id))?;

        let mut enrolled_courses = 0u32;
        let mut items = Vec::with_capacity(cmd.items.len());

        for item in &cmd.items {
            match item {
                RequestedItem::Course {
                    course_id,
                    name,
                    unit_price,
                } => {
                    let grant = self
                        .ledger
                        .grant_course(&cmd.account_id, course_id)
                        .await
                        .map_err(map_ledger_error)?;
                    if grant.granted {
                        enrolled_courses += 1;
                    }
                    items.push(LineItem::course(*course_id, name.clone(), *unit_price));
                }
                RequestedItem::Product {
                    product_id,
                    name,
                    unit_price,
                    quantity,
                } => {
                    let grant = self
                        .ledger
                        .grant_product(&cmd.account_id, product_id, *quantity)
                        .await
                        .map_err(map_ledger_error)?;
                    tracing::debug!(
                        product_id = %product_id,
                        merged_quantity = grant.merged_quantity,
                        "product purchase merged"
                    );
                    items.push(LineItem::product(
                        *product_id,
                        name.clone(),
                        *unit_price,
                        *quantity,
                    ));
                }
            }
        }

        // The total is the gateway's settled amount. Client-declared prices
        // are display data only.
        let buyer_email = verification
            .customer_email
            .clone()
            .unwrap_or_else(|| account.email.clone());

        let new_order = NewOrder::paid(
            cmd.account_id,
            items,
            verification.amount,
            cmd.reference.clone(),
            Some(buyer_email),
            account.phone.clone(),
        );

        match self.orders.create(new_order).await {
            Ok(order) => {
                tracing::info!(
                    order_id = %order.id,
                    reference = %order.reference,
                    enrolled_courses,
                    total = %order.total,
                    "payment reconciled"
                );
                Ok(CompletedReconciliation {
                    order,
                    enrolled_courses,
                    verification,
                    replayed: false,
                })
            }
            Err(OrderStoreError::DuplicateReference { reference }) => {
                // Lost the first-writer race; degrade to the replay response.
                tracing::info!(
                    reference = %reference,
                    "reference reconciled by a concurrent attempt"
                );
                let existing = self
                    .find_existing(&reference)
                    .await?
                    .ok_or_else(|| ReconciliationError::duplicate_reference(reference))?;
                Ok(self.replay(existing, verification))
            }
            Err(OrderStoreError::Storage(message)) => {
                Err(ReconciliationError::infrastructure(message))
            }
        }
    }

    async fn notify(&self, completed: &CompletedReconciliation) {
        let Some(to) = completed.order.email.clone() else {
            tracing::warn!(
                reference = %completed.order.reference,
                "no recipient address for receipt"
            );
            return;
        };

        let receipt = Receipt {
            to,
            reference: completed.order.reference.clone(),
            amount: completed.verification.amount,
            paid_at: completed.verification.paid_at,
            gateway_response: completed.verification.gateway_response.clone(),
            enrolled_courses: completed.enrolled_courses,
        };

        if let Err(err) = self.notifier.send_receipt(receipt).await {
            tracing::warn!(
                reference = %completed.order.reference,
                error = %err,
                "receipt notification failed"
            );
        }
    }
}

fn map_ledger_error(err: LedgerError) -> ReconciliationError {
    match err {
        LedgerError::AccountNotFound(account_id) => {
            ReconciliationError::AccountNotFound(account_id)
        }
        LedgerError::Storage(message) => ReconciliationError::Infrastructure(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryAccountStore, InMemoryOrderStore};
    use crate::domain::account::Account;
    use crate::domain::foundation::Timestamp;
    use crate::ports::NotifyError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    // ════════════════════════════════════════════════════════════════════════════
    // Mock Implementations
    // ════════════════════════════════════════════════════════════════════════════

    struct MockGateway {
        result: Result<GatewayVerification, GatewayError>,
    }

    impl MockGateway {
        fn verified(amount_minor: i64) -> Self {
            Self {
                result: Ok(GatewayVerification {
                    reference: "ref-123".to_string(),
                    amount: Amount::from_minor(amount_minor),
                    customer_email: Some("buyer@gateway.example.com".to_string()),
                    paid_at: Timestamp::parse_rfc3339("2026-01-15T10:30:00Z"),
                    gateway_response: "Successful".to_string(),
                }),
            }
        }

        fn verified_without_email(amount_minor: i64) -> Self {
            let mut gateway = Self::verified(amount_minor);
            if let Ok(v) = &mut gateway.result {
                v.customer_email = None;
            }
            gateway
        }

        fn rejected(status: &str) -> Self {
            Self {
                result: Err(GatewayError::rejected(status)),
            }
        }

        fn unreachable() -> Self {
            Self {
                result: Err(GatewayError::unreachable("connection timed out")),
            }
        }

        fn misconfigured() -> Self {
            Self {
                result: Err(GatewayError::config("secret key missing")),
            }
        }
    }

    #[async_trait]
    impl PaymentGateway for MockGateway {
        async fn verify(&self, reference: &str) -> Result<GatewayVerification, GatewayError> {
            self.result.clone().map(|mut verification| {
                verification.reference = reference.to_string();
                verification
            })
        }
    }

    struct MockNotifier {
        sent: Mutex<Vec<Receipt>>,
        fail: bool,
    }

    impl MockNotifier {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        fn sent_receipts(&self) -> Vec<Receipt> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReceiptNotifier for MockNotifier {
        async fn send_receipt(&self, receipt: Receipt) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError::Delivery("smtp refused".to_string()));
            }
            self.sent.lock().unwrap().push(receipt);
            Ok(())
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Test Helpers
    // ════════════════════════════════════════════════════════════════════════════

    struct Fixture {
        accounts: Arc<InMemoryAccountStore>,
        orders: Arc<InMemoryOrderStore>,
        notifier: Arc<MockNotifier>,
        handler: Arc<ReconcilePaymentHandler>,
        account_id: AccountId,
    }

    fn fixture(gateway: MockGateway) -> Fixture {
        fixture_with_notifier(gateway, MockNotifier::new())
    }

    fn fixture_with_notifier(gateway: MockGateway, notifier: MockNotifier) -> Fixture {
        let account = Account::new(
            AccountId::new(),
            "Ada Obi",
            "ada@example.com",
            Some("+2348012345678".to_string()),
        )
        .unwrap();
        let account_id = account.id;

        let accounts = Arc::new(InMemoryAccountStore::with_account(account));
        let orders = Arc::new(InMemoryOrderStore::new());
        let notifier = Arc::new(notifier);

        let handler = Arc::new(ReconcilePaymentHandler::new(
            Arc::new(gateway),
            accounts.clone(),
            accounts.clone(),
            orders.clone(),
            notifier.clone(),
            AccountLocks::new(),
        ));

        Fixture {
            accounts,
            orders,
            notifier,
            handler,
            account_id,
        }
    }

    fn course_item(course_id: CourseId, price_minor: i64) -> RequestedItem {
        RequestedItem::Course {
            course_id,
            name: Some("Rust for Beginners".to_string()),
            unit_price: Some(Amount::from_minor(price_minor)),
        }
    }

    fn product_item(product_id: ProductId, price_minor: i64, quantity: u32) -> RequestedItem {
        RequestedItem::Product {
            product_id,
            name: Some("Study Pack".to_string()),
            unit_price: Some(Amount::from_minor(price_minor)),
            quantity,
        }
    }

    fn command(
        account_id: AccountId,
        reference: &str,
        items: Vec<RequestedItem>,
    ) -> ReconcilePaymentCommand {
        ReconcilePaymentCommand {
            account_id,
            reference: reference.to_string(),
            items,
        }
    }

    fn expect_completed(outcome: ReconcileOutcome) -> CompletedReconciliation {
        match outcome {
            ReconcileOutcome::Completed(completed) => completed,
            other => panic!("expected Completed, got {:?}", other),
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Happy Path
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn verified_payment_grants_entitlements_and_records_order() {
        // Account enrolls in a course (500.00) and buys 2 products (100.00
        // each); the gateway settles 700.00 = 70000 minor units.
        let fx = fixture(MockGateway::verified(70000));
        let course = CourseId::new();
        let product = ProductId::new();

        let outcome = fx
            .handler
            .handle(command(
                fx.account_id,
                "ref-123",
                vec![course_item(course, 50000), product_item(product, 10000, 2)],
            ))
            .await
            .unwrap();

        let completed = expect_completed(outcome);
        assert!(!completed.replayed);
        assert_eq!(completed.enrolled_courses, 1);
        assert_eq!(completed.order.total, Amount::from_minor(70000));
        assert_eq!(completed.order.total.major_units(), 700);
        assert_eq!(completed.order.reference, "ref-123");

        let account = fx.accounts.get(&fx.account_id).unwrap();
        assert!(account.is_enrolled(&course));
        assert_eq!(account.enrollments[0].progress, 0);
        assert_eq!(account.purchased_quantity(&product), 2);
        assert_eq!(fx.orders.order_count(), 1);
    }

    #[tokio::test]
    async fn order_total_comes_from_gateway_not_client_prices() {
        // Client declares absurdly low prices; the persisted total must be
        // the gateway-settled amount.
        let fx = fixture(MockGateway::verified(70000));

        let outcome = fx
            .handler
            .handle(command(
                fx.account_id,
                "ref-123",
                vec![course_item(CourseId::new(), 1)],
            ))
            .await
            .unwrap();

        let completed = expect_completed(outcome);
        assert_eq!(completed.order.total, Amount::from_minor(70000));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Idempotency
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn replaying_a_reference_yields_one_order_and_one_enrollment() {
        let fx = fixture(MockGateway::verified(50000));
        let course = CourseId::new();
        let cmd = command(fx.account_id, "ref-123", vec![course_item(course, 50000)]);

        let first = expect_completed(fx.handler.handle(cmd.clone()).await.unwrap());
        let second = expect_completed(fx.handler.handle(cmd).await.unwrap());

        assert!(!first.replayed);
        assert!(second.replayed);
        assert_eq!(fx.orders.order_count(), 1);

        let account = fx.accounts.get(&fx.account_id).unwrap();
        assert_eq!(account.enrollments.len(), 1);
    }

    #[tokio::test]
    async fn replay_response_is_equivalent_to_the_first_success() {
        let fx = fixture(MockGateway::verified(50000));
        let cmd = command(
            fx.account_id,
            "ref-123",
            vec![course_item(CourseId::new(), 50000)],
        );

        let first = expect_completed(fx.handler.handle(cmd.clone()).await.unwrap());
        let second = expect_completed(fx.handler.handle(cmd).await.unwrap());

        assert_eq!(first.order.id, second.order.id);
        assert_eq!(first.enrolled_courses, second.enrolled_courses);
        assert_eq!(first.order.total, second.order.total);
        assert_eq!(first.verification.amount, second.verification.amount);
    }

    #[tokio::test]
    async fn replay_does_not_send_a_second_receipt() {
        let fx = fixture(MockGateway::verified(50000));
        let cmd = command(
            fx.account_id,
            "ref-123",
            vec![course_item(CourseId::new(), 50000)],
        );

        fx.handler.handle(cmd.clone()).await.unwrap();
        fx.handler.handle(cmd).await.unwrap();

        assert_eq!(fx.notifier.sent_receipts().len(), 1);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Entitlement Merging
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn separate_purchases_of_one_product_merge_quantities() {
        let fx = fixture(MockGateway::verified(20000));
        let product = ProductId::new();

        fx.handler
            .handle(command(
                fx.account_id,
                "ref-1",
                vec![product_item(product, 10000, 2)],
            ))
            .await
            .unwrap();
        fx.handler
            .handle(command(
                fx.account_id,
                "ref-2",
                vec![product_item(product, 10000, 3)],
            ))
            .await
            .unwrap();

        let account = fx.accounts.get(&fx.account_id).unwrap();
        assert_eq!(account.purchases.len(), 1);
        assert_eq!(account.purchased_quantity(&product), 5);
        assert_eq!(fx.orders.order_count(), 2);
    }

    #[tokio::test]
    async fn enrolling_in_an_already_held_course_is_a_noop() {
        let fx = fixture(MockGateway::verified(50000));
        let course = CourseId::new();

        let first = expect_completed(
            fx.handler
                .handle(command(fx.account_id, "ref-1", vec![course_item(course, 50000)]))
                .await
                .unwrap(),
        );
        let second = expect_completed(
            fx.handler
                .handle(command(fx.account_id, "ref-2", vec![course_item(course, 50000)]))
                .await
                .unwrap(),
        );

        assert_eq!(first.enrolled_courses, 1);
        assert_eq!(second.enrolled_courses, 0);

        let account = fx.accounts.get(&fx.account_id).unwrap();
        assert_eq!(account.enrollments.len(), 1);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Rejection and Failure Paths
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn gateway_rejection_mutates_nothing() {
        let fx = fixture(MockGateway::rejected("abandoned"));

        let outcome = fx
            .handler
            .handle(command(
                fx.account_id,
                "ref-123",
                vec![course_item(CourseId::new(), 50000)],
            ))
            .await
            .unwrap();

        match outcome {
            ReconcileOutcome::NotVerified {
                reference,
                gateway_status,
            } => {
                assert_eq!(reference, "ref-123");
                assert_eq!(gateway_status, "abandoned");
            }
            other => panic!("expected NotVerified, got {:?}", other),
        }

        assert_eq!(fx.orders.order_count(), 0);
        let account = fx.accounts.get(&fx.account_id).unwrap();
        assert!(account.enrollments.is_empty());
        assert!(account.purchases.is_empty());
        assert!(fx.notifier.sent_receipts().is_empty());
    }

    #[tokio::test]
    async fn empty_reference_is_an_invalid_request() {
        let fx = fixture(MockGateway::verified(50000));

        let result = fx
            .handler
            .handle(command(fx.account_id, "   ", vec![]))
            .await;

        assert!(matches!(
            result,
            Err(ReconciliationError::InvalidRequest { .. })
        ));
        assert_eq!(fx.orders.order_count(), 0);
    }

    #[tokio::test]
    async fn unreachable_gateway_surfaces_as_retryable_unavailability() {
        let fx = fixture(MockGateway::unreachable());

        let result = fx
            .handler
            .handle(command(
                fx.account_id,
                "ref-123",
                vec![course_item(CourseId::new(), 50000)],
            ))
            .await;

        let err = result.unwrap_err();
        assert!(matches!(
            err,
            ReconciliationError::VerificationUnavailable { .. }
        ));
        assert!(err.is_retryable());
        assert_eq!(fx.orders.order_count(), 0);
    }

    #[tokio::test]
    async fn misconfigured_gateway_surfaces_as_unavailability() {
        let fx = fixture(MockGateway::misconfigured());

        let result = fx
            .handler
            .handle(command(fx.account_id, "ref-123", vec![]))
            .await;

        assert!(matches!(
            result,
            Err(ReconciliationError::VerificationUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn unknown_account_fails_without_creating_an_order() {
        let fx = fixture(MockGateway::verified(50000));
        let stranger = AccountId::new();

        let result = fx
            .handler
            .handle(command(
                stranger,
                "ref-123",
                vec![course_item(CourseId::new(), 50000)],
            ))
            .await;

        assert!(matches!(
            result,
            Err(ReconciliationError::AccountNotFound(id)) if id == stranger
        ));
        assert_eq!(fx.orders.order_count(), 0);
    }

    #[tokio::test]
    async fn notification_failure_does_not_fail_the_reconciliation() {
        let fx = fixture_with_notifier(MockGateway::verified(50000), MockNotifier::failing());

        let outcome = fx
            .handler
            .handle(command(
                fx.account_id,
                "ref-123",
                vec![course_item(CourseId::new(), 50000)],
            ))
            .await
            .unwrap();

        let completed = expect_completed(outcome);
        assert!(!completed.replayed);
        assert_eq!(fx.orders.order_count(), 1);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Receipt Routing
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn receipt_goes_to_the_gateway_reported_email() {
        let fx = fixture(MockGateway::verified(50000));

        fx.handler
            .handle(command(
                fx.account_id,
                "ref-123",
                vec![course_item(CourseId::new(), 50000)],
            ))
            .await
            .unwrap();

        let receipts = fx.notifier.sent_receipts();
        assert_eq!(receipts.len(), 1);
        assert_eq!(receipts[0].to, "buyer@gateway.example.com");
        assert_eq!(receipts[0].enrolled_courses, 1);
        assert_eq!(receipts[0].amount, Amount::from_minor(50000));
    }

    #[tokio::test]
    async fn receipt_falls_back_to_the_account_email() {
        let fx = fixture(MockGateway::verified_without_email(50000));

        fx.handler
            .handle(command(
                fx.account_id,
                "ref-123",
                vec![course_item(CourseId::new(), 50000)],
            ))
            .await
            .unwrap();

        let receipts = fx.notifier.sent_receipts();
        assert_eq!(receipts.len(), 1);
        assert_eq!(receipts[0].to, "ada@example.com");
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Concurrency
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn concurrent_double_submit_produces_exactly_one_order() {
        let fx = fixture(MockGateway::verified(20000));
        let product = ProductId::new();
        let cmd = command(
            fx.account_id,
            "ref-123",
            vec![product_item(product, 10000, 2)],
        );

        let first = {
            let handler = fx.handler.clone();
            let cmd = cmd.clone();
            tokio::spawn(async move { handler.handle(cmd).await })
        };
        let second = {
            let handler = fx.handler.clone();
            let cmd = cmd.clone();
            tokio::spawn(async move { handler.handle(cmd).await })
        };

        let first = expect_completed(first.await.unwrap().unwrap());
        let second = expect_completed(second.await.unwrap().unwrap());

        // Both callers see success, exactly one order exists, and the
        // product quantity was merged once, not twice.
        assert_eq!(fx.orders.order_count(), 1);
        assert_eq!(first.order.id, second.order.id);
        assert!(first.replayed != second.replayed);

        let account = fx.accounts.get(&fx.account_id).unwrap();
        assert_eq!(account.purchased_quantity(&product), 2);
    }

    #[tokio::test]
    async fn concurrent_purchases_with_distinct_references_both_apply() {
        let fx = fixture(MockGateway::verified(10000));
        let product = ProductId::new();

        let first = {
            let handler = fx.handler.clone();
            let cmd = command(fx.account_id, "ref-a", vec![product_item(product, 10000, 2)]);
            tokio::spawn(async move { handler.handle(cmd).await })
        };
        let second = {
            let handler = fx.handler.clone();
            let cmd = command(fx.account_id, "ref-b", vec![product_item(product, 10000, 3)]);
            tokio::spawn(async move { handler.handle(cmd).await })
        };

        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        assert_eq!(fx.orders.order_count(), 2);
        let account = fx.accounts.get(&fx.account_id).unwrap();
        assert_eq!(account.purchased_quantity(&product), 5);
    }
}
