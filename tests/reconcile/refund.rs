//! Refund notification tests - delta bookkeeping and idempotence

#[path = "../common/mod.rs"]
mod common;

use common::*;

#[test]
fn test_unknown_refund_is_recorded_once() {
    let mut conn = setup_test_db();
    let event = create_test_event(&conn, "rust-conf", None);
    let order = create_test_order(&conn, &event.id, 5_000);
    let payment = create_test_payment(&conn, &order.id, 5_000);
    let payment = confirm_test_payment(&mut conn, &payment.id);
    let sale = gateway_sale("sale-1", "partially_refunded");
    let refund = gateway_refund("ref-1", "completed", "12.50");

    let report = reconcile::apply_refund(&mut conn, &payment, &sale, &refund)
        .expect("apply_refund failed")
        .expect("payment is on the refund path");

    assert_eq!(report.recorded_cents, Some(1_250), "12.50 should become 1250 cents");
    let refunds = queries::refunds_for_payment(&conn, &payment.id).expect("Query failed");
    assert_eq!(refunds.len(), 1, "exactly one refund row expected");
    assert_eq!(refunds[0].amount_cents, 1_250, "amount should match");
    assert_eq!(
        refunds[0].gateway_id.as_deref(),
        Some("ref-1"),
        "gateway id should be indexed"
    );
}

#[test]
fn test_refund_redelivery_adds_nothing() {
    let mut conn = setup_test_db();
    let event = create_test_event(&conn, "rust-conf", None);
    let order = create_test_order(&conn, &event.id, 5_000);
    let payment = create_test_payment(&conn, &order.id, 5_000);
    let payment = confirm_test_payment(&mut conn, &payment.id);
    let sale = gateway_sale("sale-1", "partially_refunded");
    let refund = gateway_refund("ref-1", "completed", "12.50");

    reconcile::apply_refund(&mut conn, &payment, &sale, &refund).expect("first apply failed");
    let report = reconcile::apply_refund(&mut conn, &payment, &sale, &refund)
        .expect("second apply failed")
        .expect("payment is on the refund path");

    assert_eq!(report.recorded_cents, None, "refund is already known");
    assert_eq!(report.delta_cents, None, "no delta without a cumulative total");
    assert_eq!(
        queries::refund_known_sum(&conn, &payment.id).expect("Query failed"),
        1_250,
        "known sum unchanged by redelivery"
    );
}

#[test]
fn test_cumulative_total_tops_up_with_a_delta() {
    let mut conn = setup_test_db();
    let event = create_test_event(&conn, "rust-conf", None);
    let order = create_test_order(&conn, &event.id, 5_000);
    let payment = create_test_payment(&conn, &order.id, 5_000);
    let payment = confirm_test_payment(&mut conn, &payment.id);
    let sale = gateway_sale("sale-1", "partially_refunded");
    // The gateway reports 30.00 refunded in total but only notified 12.50.
    let refund = gateway_refund_with_total("ref-1", "completed", "12.50", "30.00");

    let report = reconcile::apply_refund(&mut conn, &payment, &sale, &refund)
        .expect("apply_refund failed")
        .expect("payment is on the refund path");

    assert_eq!(report.recorded_cents, Some(1_250), "the notified refund is recorded");
    assert_eq!(report.delta_cents, Some(1_750), "the silent remainder is added");
    assert_eq!(
        queries::refund_known_sum(&conn, &payment.id).expect("Query failed"),
        3_000,
        "known sum should equal the cumulative total"
    );
}

#[test]
fn test_cumulative_total_is_clamped_to_the_payment_amount() {
    let mut conn = setup_test_db();
    let event = create_test_event(&conn, "rust-conf", None);
    let order = create_test_order(&conn, &event.id, 2_000);
    let payment = create_test_payment(&conn, &order.id, 2_000);
    let payment = confirm_test_payment(&mut conn, &payment.id);
    let sale = gateway_sale("sale-1", "refunded");
    let refund = gateway_refund_with_total("ref-1", "completed", "12.50", "30.00");

    let report = reconcile::apply_refund(&mut conn, &payment, &sale, &refund)
        .expect("apply_refund failed")
        .expect("payment is on the refund path");

    assert_eq!(report.recorded_cents, Some(1_250), "the notified refund is recorded");
    assert_eq!(
        report.delta_cents,
        Some(750),
        "the delta stops at the payment amount"
    );
    assert_eq!(
        queries::refund_known_sum(&conn, &payment.id).expect("Query failed"),
        2_000,
        "known sum never exceeds the payment"
    );
    assert_eq!(
        reload_payment(&conn, &payment.id).state,
        PaymentState::Refunded,
        "fully covered payment flips to refunded"
    );
    assert_eq!(
        reload_order(&conn, &order.id).status,
        OrderStatus::Canceled,
        "order should be canceled"
    );
}

#[test]
fn test_known_refund_is_marked_done_on_completion() {
    let mut conn = setup_test_db();
    let event = create_test_event(&conn, "rust-conf", None);
    let order = create_test_order(&conn, &event.id, 5_000);
    let payment = create_test_payment(&conn, &order.id, 5_000);
    let payment = confirm_test_payment(&mut conn, &payment.id);
    queries::create_refund(&conn, &payment.id, 1_250, Some("ref-1"))
        .expect("Failed to create refund");
    let sale = gateway_sale("sale-1", "partially_refunded");
    let refund = gateway_refund("ref-1", "completed", "12.50");

    let report = reconcile::apply_refund(&mut conn, &payment, &sale, &refund)
        .expect("apply_refund failed")
        .expect("payment is on the refund path");

    assert_eq!(report.recorded_cents, None, "the refund was already known");
    assert!(report.marked_done, "the known refund should complete");
    let refunds = queries::refunds_for_payment(&conn, &payment.id).expect("Query failed");
    assert_eq!(refunds.len(), 1, "no duplicate row");
    assert_eq!(refunds[0].state, RefundState::Done, "refund should be done");
}

#[test]
fn test_refund_off_the_refund_path_is_inert() {
    let mut conn = setup_test_db();
    let event = create_test_event(&conn, "rust-conf", None);
    let order = create_test_order(&conn, &event.id, 5_000);
    let payment = create_test_payment(&conn, &order.id, 5_000);
    let sale = gateway_sale("sale-1", "completed");
    let refund = gateway_refund("ref-1", "completed", "12.50");

    let report = reconcile::apply_refund(&mut conn, &payment, &sale, &refund)
        .expect("apply_refund failed");

    assert!(report.is_none(), "an unconfirmed payment has no refund path");
    assert!(
        queries::refunds_for_payment(&conn, &payment.id)
            .expect("Query failed")
            .is_empty(),
        "no refund rows recorded"
    );
}
