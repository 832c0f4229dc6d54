//! Return-flow tests - signal verification and ledger application

#[path = "../common/mod.rs"]
mod common;

use common::*;
use taquilla::error::AppError;

#[test]
fn test_verify_rejects_reference_mismatch() {
    let gateway = gateway_payment("payment-1", "approved", "accredited");

    let result = reconcile::verify_return_signal(&gateway, "payment-2", "approved");

    assert!(
        matches!(result, Err(AppError::BadRequest(_))),
        "a reference mismatch is a spoofing attempt"
    );
}

#[test]
fn test_verify_rejects_status_mismatch() {
    let gateway = gateway_payment("payment-1", "rejected", "cc_rejected_other_reason");

    let result = reconcile::verify_return_signal(&gateway, "payment-1", "approved");

    assert!(
        matches!(result, Err(AppError::BadRequest(_))),
        "a status mismatch is a spoofing attempt"
    );
}

#[test]
fn test_verify_accepts_matching_signal() {
    let gateway = gateway_payment("payment-1", "approved", "accredited");

    reconcile::verify_return_signal(&gateway, "payment-1", "approved")
        .expect("matching signal should verify");
}

#[test]
fn test_apply_return_pays_order_on_approved() {
    let mut conn = setup_test_db();
    let event = create_test_event(&conn, "rust-conf", None);
    let order = create_test_order(&conn, &event.id, 5000);
    let payment = create_test_payment(&conn, &order.id, 5000);
    let gateway = gateway_payment(&payment.id, "approved", "accredited");

    let order = reconcile::apply_return(&mut conn, &payment, &gateway)
        .expect("apply_return failed");

    assert_eq!(order.status, OrderStatus::Paid, "order should be paid");
    let payment = reload_payment(&conn, &payment.id);
    assert_eq!(payment.state, PaymentState::Confirmed, "payment should be confirmed");
    assert_eq!(
        payment.info.as_deref(),
        Some("accredited"),
        "status detail should be recorded"
    );
}

#[test]
fn test_apply_return_cancels_order_on_rejected() {
    let mut conn = setup_test_db();
    let event = create_test_event(&conn, "rust-conf", None);
    let order = create_test_order(&conn, &event.id, 5000);
    let payment = create_test_payment(&conn, &order.id, 5000);
    let gateway = gateway_payment(&payment.id, "rejected", "cc_rejected_bad_filled_security_code");

    let order = reconcile::apply_return(&mut conn, &payment, &gateway)
        .expect("apply_return failed");

    assert_eq!(order.status, OrderStatus::Canceled, "order should be canceled");
    assert_eq!(
        reload_payment(&conn, &payment.id).state,
        PaymentState::Failed,
        "payment should be failed"
    );
}

#[test]
fn test_apply_return_unmapped_status_records_detail_only() {
    let mut conn = setup_test_db();
    let event = create_test_event(&conn, "rust-conf", None);
    let order = create_test_order(&conn, &event.id, 5000);
    let payment = create_test_payment(&conn, &order.id, 5000);
    let gateway = gateway_payment(&payment.id, "some_future_status", "under_review");

    let order = reconcile::apply_return(&mut conn, &payment, &gateway)
        .expect("apply_return failed");

    assert_eq!(order.status, OrderStatus::Pending, "order must not transition");
    let payment = reload_payment(&conn, &payment.id);
    assert_eq!(payment.state, PaymentState::Created, "payment must not transition");
    assert_eq!(
        payment.info.as_deref(),
        Some("under_review"),
        "detail should still be recorded"
    );
}

#[test]
fn test_apply_return_is_idempotent() {
    let mut conn = setup_test_db();
    let event = create_test_event(&conn, "rust-conf", None);
    let order = create_test_order(&conn, &event.id, 5000);
    let payment = create_test_payment(&conn, &order.id, 5000);
    let gateway = gateway_payment(&payment.id, "approved", "accredited");

    reconcile::apply_return(&mut conn, &payment, &gateway).expect("first apply failed");
    let payment = reload_payment(&conn, &payment.id);
    let order = reconcile::apply_return(&mut conn, &payment, &gateway)
        .expect("second apply failed");

    assert_eq!(order.status, OrderStatus::Paid, "order stays paid");
    assert_eq!(
        reload_payment(&conn, &payment.id).state,
        PaymentState::Confirmed,
        "payment stays confirmed"
    );
}
