//! Integration tests for the bill transaction pipeline.
//!
//! Each test runs against a fresh in-memory database, seeds a drawer and
//! catalogue, and drives `BillingService` end to end: success paths assert
//! the whole persisted state (bill, lines, change, stock, drawer), failure
//! paths assert the typed error AND that nothing was mutated.

use till_core::{BillRequest, BillRequestLine, BillingError, TenderEntry};
use till_db::repository::product::NewProduct;
use till_db::{Database, DbConfig, DbError, NotificationDispatcher};

/// The standard drawer float used across tests: value × count.
const DRAWER_SEED: &[(i64, i64)] = &[
    (500, 10),
    (200, 20),
    (100, 30),
    (50, 40),
    (20, 50),
    (10, 60),
    (5, 70),
    (2, 80),
    (1, 90),
];

async fn test_db() -> Database {
    // Honors RUST_LOG when debugging a failing test; no-op after the first call.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database")
}

async fn seed_drawer(db: &Database, levels: &[(i64, i64)]) {
    for &(value, count) in levels {
        db.denominations()
            .create(value, count)
            .await
            .expect("seed denomination");
    }
}

async fn seed_product(db: &Database, product_id: &str, price_cents: i64, bps: u32, stock: i64) {
    db.products()
        .create(NewProduct {
            product_id: product_id.to_string(),
            name: format!("Test {product_id}"),
            available_stock: stock,
            unit_price_cents: price_cents,
            tax_rate_bps: bps,
        })
        .await
        .expect("seed product");
}

async fn drawer_count(db: &Database, value: i64) -> i64 {
    db.denominations()
        .get(value)
        .await
        .expect("drawer read")
        .expect("denomination exists")
        .count
}

async fn stock_of(db: &Database, product_id: &str) -> i64 {
    db.products()
        .get_by_product_id(product_id)
        .await
        .expect("product read")
        .expect("product exists")
        .available_stock
}

fn request(email: &str, lines: Vec<(&str, i64)>, tender: Vec<(i64, i64)>) -> BillRequest {
    let tender: Vec<TenderEntry> = tender
        .into_iter()
        .map(|(value, count)| TenderEntry { value, count })
        .collect();
    let paid_cents = tender.iter().map(TenderEntry::amount_cents).sum();
    BillRequest {
        customer_email: email.to_string(),
        lines: lines
            .into_iter()
            .map(|(product_id, quantity)| BillRequestLine {
                product_id: product_id.to_string(),
                quantity,
            })
            .collect(),
        tender,
        paid_cents,
    }
}

// =============================================================================
// Successful Transactions
// =============================================================================

#[tokio::test]
async fn completed_sale_persists_bill_stock_and_drawer() {
    let db = test_db().await;
    seed_drawer(&db, DRAWER_SEED).await;
    seed_product(&db, "P1", 10000, 1800, 5).await;

    // 100.00 × 2 at 18% = 236.00 due; paid 250.00 as 200×1 + 50×1.
    let receipt = db
        .billing()
        .create_bill(&request(
            "alice@example.test",
            vec![("P1", 2)],
            vec![(200, 1), (50, 1)],
        ))
        .await
        .expect("bill should commit");

    let bill = &receipt.bill;
    assert_eq!(bill.total_cents, 23600);
    assert_eq!(bill.tax_cents, 3600);
    assert_eq!(bill.rounded_total_cents, 23600);
    assert_eq!(bill.dropped_remainder_cents, 0);
    assert_eq!(bill.paid_cents, 25000);
    assert_eq!(bill.balance_cents, 1400);
    assert!(!bill.mail_sent);

    assert_eq!(receipt.lines.len(), 1);
    let line = &receipt.lines[0];
    assert_eq!(line.product_id, "P1");
    assert_eq!(line.name_snapshot, "Test P1");
    assert_eq!(line.quantity, 2);
    assert_eq!(line.unit_price_cents, 10000);
    assert_eq!(line.tax_rate_bps, 1800);
    assert_eq!(line.tax_cents, 3600);
    assert_eq!(line.total_cents, 23600);

    // Change for 14 units, greedy against the seeded drawer: 10×1, 2×2.
    let change: Vec<(i64, i64)> = receipt.change.iter().map(|c| (c.value, c.count)).collect();
    assert_eq!(change, vec![(10, 1), (2, 2)]);

    // Stock decremented.
    assert_eq!(stock_of(&db, "P1").await, 3);

    // Drawer absorbed the tender and dispensed the change.
    assert_eq!(drawer_count(&db, 200).await, 21);
    assert_eq!(drawer_count(&db, 50).await, 41);
    assert_eq!(drawer_count(&db, 10).await, 59);
    assert_eq!(drawer_count(&db, 2).await, 78);

    // Untouched denominations stay put.
    assert_eq!(drawer_count(&db, 500).await, 10);
    assert_eq!(drawer_count(&db, 1).await, 90);

    // Cash conservation: tendered − dispensed == drawer delta.
    let dispensed: i64 = receipt.change.iter().map(|c| c.value * c.count).sum();
    assert_eq!(bill.paid_cents - dispensed * 100, bill.rounded_total_cents);
}

#[tokio::test]
async fn fractional_total_floors_to_whole_unit_and_reports_remainder() {
    let db = test_db().await;
    seed_drawer(&db, DRAWER_SEED).await;
    // 10.50 at 5%: tax 0.53, total 11.03 → due 11.00, remainder 0.03.
    seed_product(&db, "P2", 1050, 500, 5).await;

    let receipt = db
        .billing()
        .create_bill(&request("bob@example.test", vec![("P2", 1)], vec![(20, 1)]))
        .await
        .expect("bill should commit");

    assert_eq!(receipt.bill.total_cents, 1103);
    assert_eq!(receipt.bill.tax_cents, 53);
    assert_eq!(receipt.bill.rounded_total_cents, 1100);
    assert_eq!(receipt.bill.dropped_remainder_cents, 3);
    assert_eq!(receipt.bill.paid_cents, 2000);
    assert_eq!(receipt.bill.balance_cents, 900);

    // 9 units of change: 5×1, 2×2.
    let change: Vec<(i64, i64)> = receipt.change.iter().map(|c| (c.value, c.count)).collect();
    assert_eq!(change, vec![(5, 1), (2, 2)]);
}

#[tokio::test]
async fn repeated_product_lines_accumulate_and_exact_payment_yields_no_change() {
    let db = test_db().await;
    seed_drawer(&db, DRAWER_SEED).await;
    // 50.00 at 0%, stock 5; two lines of 2 and 3 consume it exactly.
    seed_product(&db, "P3", 5000, 0, 5).await;

    let receipt = db
        .billing()
        .create_bill(&request(
            "carol@example.test",
            vec![("P3", 2), ("P3", 3)],
            vec![(200, 1), (50, 1)],
        ))
        .await
        .expect("bill should commit");

    assert_eq!(receipt.bill.rounded_total_cents, 25000);
    assert_eq!(receipt.bill.balance_cents, 0);
    assert!(receipt.change.is_empty());
    assert_eq!(receipt.lines.len(), 2);
    assert_eq!(stock_of(&db, "P3").await, 0);
}

// =============================================================================
// Rejected Transactions (no mutation)
// =============================================================================

#[tokio::test]
async fn insufficient_stock_rejects_without_mutation() {
    let db = test_db().await;
    seed_drawer(&db, DRAWER_SEED).await;
    seed_product(&db, "P1", 10000, 1800, 3).await;

    let err = db
        .billing()
        .create_bill(&request("alice@example.test", vec![("P1", 10)], vec![(500, 3)]))
        .await
        .expect_err("should reject");

    match err {
        BillingError::InsufficientStock {
            product_id,
            available,
            requested,
        } => {
            assert_eq!(product_id, "P1");
            assert_eq!(available, 3);
            assert_eq!(requested, 10);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    assert_eq!(stock_of(&db, "P1").await, 3);
    assert_eq!(drawer_count(&db, 500).await, 10);
    assert!(db.customers().get_by_email("alice@example.test").await.unwrap().is_none());
}

#[tokio::test]
async fn repeated_lines_fail_on_cumulative_quantity() {
    let db = test_db().await;
    seed_drawer(&db, DRAWER_SEED).await;
    seed_product(&db, "P1", 5000, 0, 5).await;

    // 3 + 3 against a stock of 5: second line tips it over.
    let err = db
        .billing()
        .create_bill(&request(
            "alice@example.test",
            vec![("P1", 3), ("P1", 3)],
            vec![(500, 1)],
        ))
        .await
        .expect_err("should reject");

    match err {
        BillingError::InsufficientStock {
            available, requested, ..
        } => {
            assert_eq!(available, 5);
            assert_eq!(requested, 6);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }
    assert_eq!(stock_of(&db, "P1").await, 5);
}

#[tokio::test]
async fn mismatched_payment_reports_both_amounts() {
    let db = test_db().await;
    seed_drawer(&db, DRAWER_SEED).await;
    seed_product(&db, "P1", 9000, 0, 5).await;

    // Tender sums to 99.00 but the declared paid amount says 100.00.
    let mut req = request(
        "alice@example.test",
        vec![("P1", 1)],
        vec![(50, 1), (20, 2), (5, 1), (2, 2)],
    );
    req.paid_cents = 10000;

    let err = db.billing().create_bill(&req).await.expect_err("should reject");

    match err {
        BillingError::MismatchedPayment {
            declared_cents,
            tendered_cents,
        } => {
            assert_eq!(declared_cents, 10000);
            assert_eq!(tendered_cents, 9900);
        }
        other => panic!("expected MismatchedPayment, got {other:?}"),
    }
    assert_eq!(stock_of(&db, "P1").await, 5);
}

#[tokio::test]
async fn unknown_denominations_rejected_as_batch() {
    let db = test_db().await;
    seed_drawer(&db, DRAWER_SEED).await;
    seed_product(&db, "P1", 1000, 0, 5).await;

    let err = db
        .billing()
        .create_bill(&request(
            "alice@example.test",
            vec![("P1", 1)],
            vec![(10, 1), (7, 1), (3, 1)],
        ))
        .await
        .expect_err("should reject");

    match err {
        BillingError::UnsupportedDenomination { values } => {
            assert_eq!(values, vec![7, 3]);
        }
        other => panic!("expected UnsupportedDenomination, got {other:?}"),
    }
    assert_eq!(drawer_count(&db, 10).await, 60);
}

#[tokio::test]
async fn insufficient_payment_rejected() {
    let db = test_db().await;
    seed_drawer(&db, DRAWER_SEED).await;
    seed_product(&db, "P1", 10000, 0, 5).await;

    let err = db
        .billing()
        .create_bill(&request("alice@example.test", vec![("P1", 1)], vec![(50, 1)]))
        .await
        .expect_err("should reject");

    match err {
        BillingError::InsufficientPayment {
            due_cents,
            paid_cents,
        } => {
            assert_eq!(due_cents, 10000);
            assert_eq!(paid_cents, 5000);
        }
        other => panic!("expected InsufficientPayment, got {other:?}"),
    }
}

#[tokio::test]
async fn infeasible_change_aborts_before_any_mutation() {
    let db = test_db().await;
    // A drawer with nothing smaller than 5.
    seed_drawer(&db, &[(500, 10), (100, 10), (50, 10), (20, 10), (10, 10), (5, 10)]).await;
    seed_product(&db, "P1", 9700, 0, 5).await;

    // Due 97, paid 100: balance 3 is unmakeable.
    let err = db
        .billing()
        .create_bill(&request("alice@example.test", vec![("P1", 1)], vec![(100, 1)]))
        .await
        .expect_err("should reject");

    match err {
        BillingError::ChangeInfeasible { remainder } => assert_eq!(remainder, 3),
        other => panic!("expected ChangeInfeasible, got {other:?}"),
    }

    assert_eq!(stock_of(&db, "P1").await, 5);
    assert_eq!(drawer_count(&db, 100).await, 10);
    assert!(db.customers().get_by_email("alice@example.test").await.unwrap().is_none());
}

#[tokio::test]
async fn unknown_product_rejected() {
    let db = test_db().await;
    seed_drawer(&db, DRAWER_SEED).await;

    let err = db
        .billing()
        .create_bill(&request("alice@example.test", vec![("NOPE", 1)], vec![(10, 1)]))
        .await
        .expect_err("should reject");

    match err {
        BillingError::ProductNotFound(id) => assert_eq!(id, "NOPE"),
        other => panic!("expected ProductNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn absurd_tender_count_rejected_before_summing() {
    let db = test_db().await;
    seed_drawer(&db, DRAWER_SEED).await;
    seed_product(&db, "P1", 1000, 0, 5).await;

    // A count this large would wrap i64 when value × count × 100 is summed;
    // shape validation must refuse it before any arithmetic runs.
    let mut req = request("alice@example.test", vec![("P1", 1)], vec![]);
    req.tender = vec![TenderEntry {
        value: 100_000,
        count: i64::MAX / 1_000,
    }];
    req.paid_cents = 1000;

    let err = db.billing().create_bill(&req).await.expect_err("should reject");
    assert!(matches!(err, BillingError::Validation(_)));
    assert_eq!(stock_of(&db, "P1").await, 5);
}

#[tokio::test]
async fn empty_cart_rejected_by_validation() {
    let db = test_db().await;
    seed_drawer(&db, DRAWER_SEED).await;

    let err = db
        .billing()
        .create_bill(&request("alice@example.test", vec![], vec![(10, 1)]))
        .await
        .expect_err("should reject");

    assert!(matches!(err, BillingError::Validation(_)));
}

// =============================================================================
// Customers and Receipts
// =============================================================================

#[tokio::test]
async fn customer_is_created_once_and_bills_accumulate() {
    let db = test_db().await;
    seed_drawer(&db, DRAWER_SEED).await;
    seed_product(&db, "P1", 1000, 0, 10).await;

    let first = db
        .billing()
        .create_bill(&request("dave@example.test", vec![("P1", 1)], vec![(10, 1)]))
        .await
        .expect("first bill");
    let second = db
        .billing()
        .create_bill(&request("dave@example.test", vec![("P1", 2)], vec![(20, 1)]))
        .await
        .expect("second bill");

    assert_eq!(first.bill.customer_id, second.bill.customer_id);

    let receipts = db
        .bills()
        .list_for_customer("dave@example.test")
        .await
        .expect("customer history");
    assert_eq!(receipts.len(), 2);
}

#[tokio::test]
async fn receipt_can_be_fetched_by_bill_id() {
    let db = test_db().await;
    seed_drawer(&db, DRAWER_SEED).await;
    seed_product(&db, "P1", 10000, 1800, 5).await;

    let committed = db
        .billing()
        .create_bill(&request(
            "alice@example.test",
            vec![("P1", 2)],
            vec![(200, 1), (50, 1)],
        ))
        .await
        .expect("bill should commit");

    let fetched = db
        .bills()
        .get(&committed.bill.id)
        .await
        .expect("receipt read")
        .expect("receipt exists");

    assert_eq!(fetched.bill.total_cents, committed.bill.total_cents);
    assert_eq!(fetched.lines.len(), committed.lines.len());
    assert_eq!(fetched.change.len(), committed.change.len());

    assert!(db.bills().get("no-such-bill").await.unwrap().is_none());
}

#[tokio::test]
async fn history_for_unknown_customer_is_not_found() {
    let db = test_db().await;

    let err = db
        .bills()
        .list_for_customer("ghost@example.test")
        .await
        .expect_err("should reject");
    assert!(matches!(err, DbError::NotFound { .. }));
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test]
async fn concurrent_bills_for_same_stock_never_oversell() {
    let db = test_db().await;
    seed_drawer(&db, DRAWER_SEED).await;
    seed_product(&db, "P1", 1000, 0, 5).await;

    let req_a = request("a@example.test", vec![("P1", 3)], vec![(20, 1), (10, 1)]);
    let req_b = request("b@example.test", vec![("P1", 3)], vec![(20, 1), (10, 1)]);

    let billing_a = db.billing();
    let billing_b = db.billing();
    let (res_a, res_b) = tokio::join!(billing_a.create_bill(&req_a), billing_b.create_bill(&req_b));

    let outcomes = [res_a, res_b];
    let ok_count = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(ok_count, 1, "exactly one of the racing bills may commit");

    for outcome in &outcomes {
        if let Err(err) = outcome {
            assert!(
                matches!(
                    err,
                    BillingError::InsufficientStock { .. } | BillingError::ConcurrentConflict
                ),
                "loser must fail on stock or conflict, got {err:?}"
            );
        }
    }

    assert_eq!(stock_of(&db, "P1").await, 2);
}

// =============================================================================
// Notifications
// =============================================================================

#[tokio::test]
async fn notification_dispatcher_marks_bill_as_mailed() {
    let db = test_db().await;
    seed_drawer(&db, DRAWER_SEED).await;
    seed_product(&db, "P1", 1000, 0, 5).await;

    let (sender, handle) = NotificationDispatcher::spawn(db.bills());

    let receipt = db
        .billing_with_notifications(sender)
        .create_bill(&request("eve@example.test", vec![("P1", 1)], vec![(10, 1)]))
        .await
        .expect("bill should commit");
    assert!(!receipt.bill.mail_sent);

    // Delivery is asynchronous; poll for the flag.
    let mut mailed = false;
    for _ in 0..50 {
        let fetched = db
            .bills()
            .get(&receipt.bill.id)
            .await
            .expect("receipt read")
            .expect("receipt exists");
        if fetched.bill.mail_sent {
            mailed = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert!(mailed, "dispatcher should flag the bill as mailed");

    drop(db);
    handle.abort();
}

// =============================================================================
// Admin Surface
// =============================================================================

#[tokio::test]
async fn duplicate_product_id_is_rejected() {
    let db = test_db().await;
    seed_product(&db, "P1", 1000, 0, 5).await;

    let err = db
        .products()
        .create(NewProduct {
            product_id: "P1".to_string(),
            name: "Duplicate".to_string(),
            available_stock: 1,
            unit_price_cents: 100,
            tax_rate_bps: 0,
        })
        .await
        .expect_err("should reject");

    assert!(matches!(err, DbError::UniqueViolation { .. }));
    assert_eq!(db.products().count().await.unwrap(), 1);
}

#[tokio::test]
async fn product_create_rejects_invalid_fields_with_typed_error() {
    let db = test_db().await;

    // Tax rate above 100%.
    let err = db
        .products()
        .create(NewProduct {
            product_id: "P1".to_string(),
            name: "Overtaxed".to_string(),
            available_stock: 1,
            unit_price_cents: 100,
            tax_rate_bps: 10_001,
        })
        .await
        .expect_err("should reject");
    assert!(matches!(err, DbError::InvalidInput(_)));

    // Malformed business id.
    let err = db
        .products()
        .create(NewProduct {
            product_id: "has space".to_string(),
            name: "Bad id".to_string(),
            available_stock: 1,
            unit_price_cents: 100,
            tax_rate_bps: 0,
        })
        .await
        .expect_err("should reject");
    assert!(matches!(err, DbError::InvalidInput(_)));

    // Negative stock.
    let err = db
        .products()
        .create(NewProduct {
            product_id: "P2".to_string(),
            name: "Backordered".to_string(),
            available_stock: -1,
            unit_price_cents: 100,
            tax_rate_bps: 0,
        })
        .await
        .expect_err("should reject");
    assert!(matches!(err, DbError::InvalidInput(_)));

    assert_eq!(db.products().count().await.unwrap(), 0);
}

#[tokio::test]
async fn denomination_create_rejects_invalid_values_with_typed_error() {
    let db = test_db().await;

    let err = db.denominations().create(0, 10).await.expect_err("should reject");
    assert!(matches!(err, DbError::InvalidInput(_)));

    let err = db.denominations().create(50, -5).await.expect_err("should reject");
    assert!(matches!(err, DbError::InvalidInput(_)));

    db.denominations().create(50, 5).await.expect("valid create");
    let err = db
        .denominations()
        .set_count(50, -1)
        .await
        .expect_err("should reject");
    assert!(matches!(err, DbError::InvalidInput(_)));
    assert_eq!(drawer_count(&db, 50).await, 5);
}

#[tokio::test]
async fn duplicate_denomination_value_is_rejected() {
    let db = test_db().await;
    db.denominations().create(50, 40).await.expect("create");

    let err = db
        .denominations()
        .create(50, 99)
        .await
        .expect_err("should reject");
    assert!(matches!(err, DbError::UniqueViolation { .. }));
    assert_eq!(drawer_count(&db, 50).await, 40);
}

#[tokio::test]
async fn drawer_recount_and_restock() {
    let db = test_db().await;
    db.denominations().create(50, 40).await.expect("create");
    seed_product(&db, "P1", 1000, 0, 5).await;

    db.denominations().set_count(50, 7).await.expect("recount");
    assert_eq!(drawer_count(&db, 50).await, 7);

    db.products().set_stock("P1", 42).await.expect("restock");
    assert_eq!(stock_of(&db, "P1").await, 42);

    db.products().adjust_stock("P1", -2).await.expect("shrinkage");
    assert_eq!(stock_of(&db, "P1").await, 40);

    let err = db
        .products()
        .adjust_stock("P1", -100)
        .await
        .expect_err("should reject negative stock");
    assert!(matches!(err, DbError::NotFound { .. }));

    let err = db
        .denominations()
        .set_count(999, 1)
        .await
        .expect_err("should reject");
    assert!(matches!(err, DbError::NotFound { .. }));

    let err = db.products().set_stock("NOPE", 1).await.expect_err("should reject");
    assert!(matches!(err, DbError::NotFound { .. }));

    let err = db.products().set_stock("P1", -1).await.expect_err("should reject");
    assert!(matches!(err, DbError::InvalidInput(_)));
}

#[tokio::test]
async fn drawer_lists_in_descending_value_order() {
    let db = test_db().await;
    seed_drawer(&db, &[(10, 1), (500, 1), (50, 1)]).await;

    let values: Vec<i64> = db
        .denominations()
        .list_desc()
        .await
        .expect("drawer read")
        .iter()
        .map(|d| d.value)
        .collect();
    assert_eq!(values, vec![500, 50, 10]);
}
