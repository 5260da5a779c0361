//! Transition coverage for the purchase wizard.

use rstest::{fixture, rstest};

use super::*;
use crate::domain::{AccountPayload, PhoneNumber, VerificationCode};
use crate::test_support::{sample_buyer, sample_country};

fn account(n: u32) -> DeliveredAccount {
    DeliveredAccount {
        phone_number: PhoneNumber::new(format!("+96650{}", 1_234_567 + n)).expect("phone"),
        verification_code: None,
        two_factor_password: None,
        payload: AccountPayload::Sessions {
            session_data: format!("data-{n}"),
            session_string: format!("string-{n}"),
        },
    }
}

fn delivery(count: u32) -> Delivery {
    Delivery::new((0..count).map(account).collect())
}

fn login_code() -> LoginCode {
    LoginCode {
        code: VerificationCode::new("48213").expect("code"),
        two_factor_password: Some("second-factor".to_owned()),
    }
}

#[fixture]
fn single() -> PurchaseSession {
    PurchaseSession::open(PurchaseType::Single, sample_country(), sample_buyer())
}

#[fixture]
fn bulk() -> PurchaseSession {
    PurchaseSession::open(PurchaseType::Bulk, sample_country(), sample_buyer())
}

#[rstest]
fn insufficient_balance_blocks_confirm() {
    let buyer = sample_buyer().with_balance(Money::from_cents(100));
    let session = PurchaseSession::open(PurchaseType::Single, sample_country(), buyer);
    let expected = PurchaseRejection::InsufficientBalance {
        balance: Money::from_cents(100),
        price: Money::from_cents(250),
    };

    assert_eq!(session.confirm_gate(), ConfirmGate::Disabled(expected.clone()));
    assert_eq!(session.confirm(), Err(expected));
    assert_eq!(session.step(), PurchaseStep::Confirm);
}

#[rstest]
fn exact_balance_is_enough() {
    let buyer = sample_buyer().with_balance(Money::from_cents(250));
    let session = PurchaseSession::open(PurchaseType::Single, sample_country(), buyer);
    assert!(session.confirm_gate().is_enabled());
}

#[rstest]
fn single_confirm_goes_straight_to_processing(single: PurchaseSession) {
    let next = single.confirm().expect("confirm");
    assert_eq!(next.step(), PurchaseStep::Processing);
    assert_eq!(next.quantity(), 1);
}

#[rstest]
fn bulk_walks_quantity_and_data_type(bulk: PurchaseSession) {
    let quantity = bulk.confirm().expect("confirm");
    assert_eq!(quantity.step(), PurchaseStep::Quantity);

    let data_type = quantity.select_quantity(50).expect("tier");
    assert_eq!(data_type.step(), PurchaseStep::DataType);
    assert_eq!(data_type.quantity(), 50);
    assert_eq!(data_type.total(), Some(Money::from_cents(12_500)));

    let processing = data_type.select_data_type(DataType::Tdata).expect("data type");
    assert_eq!(processing.step(), PurchaseStep::Processing);
    assert_eq!(processing.data_type(), DataType::Tdata);
}

#[rstest]
#[case(0)]
#[case(15)]
#[case(1000)]
fn off_tier_quantities_are_refused(bulk: PurchaseSession, #[case] quantity: u32) {
    let at_quantity = bulk.confirm().expect("confirm");
    assert_eq!(
        at_quantity.select_quantity(quantity),
        Err(PurchaseRejection::UnsupportedQuantity { quantity })
    );
}

#[rstest]
fn single_delivery_moves_to_code(single: PurchaseSession) {
    let code = single
        .confirm()
        .and_then(|s| s.fulfilment_succeeded(delivery(1)))
        .expect("delivered");
    assert_eq!(code.step(), PurchaseStep::Code);
    assert_eq!(
        code.delivered_account().map(|a| a.phone_number.as_str()),
        Some("+966501234567")
    );
}

#[rstest]
fn bulk_delivery_moves_to_success(bulk: PurchaseSession) {
    let success = bulk
        .confirm()
        .and_then(|s| s.select_quantity(10))
        .and_then(|s| s.select_data_type(DataType::Sessions))
        .and_then(|s| s.fulfilment_succeeded(delivery(10)))
        .expect("delivered");
    assert_eq!(success.step(), PurchaseStep::Success);
    assert_eq!(success.delivery().map(Delivery::len), Some(10));
    assert!(success.delivered_account().is_none());
}

#[rstest]
fn short_delivery_fails_the_purchase(bulk: PurchaseSession) {
    let failed = bulk
        .confirm()
        .and_then(|s| s.select_quantity(20))
        .and_then(|s| s.select_data_type(DataType::Sessions))
        .and_then(|s| s.fulfilment_succeeded(delivery(19)))
        .expect("mismatch is a transition");
    assert_eq!(failed.step(), PurchaseStep::Failed);
    assert_eq!(
        failed.failure(),
        Some(&PurchaseFailure::DeliveryMismatch {
            expected: 20,
            delivered: 19
        })
    );
}

#[rstest]
fn fulfilment_failure_is_terminal_and_distinct(single: PurchaseSession) {
    let failed = single
        .confirm()
        .and_then(|s| s.fulfilment_failed(PurchaseFailure::TimedOut))
        .expect("failure recorded");
    assert_eq!(failed.step(), PurchaseStep::Failed);
    assert_ne!(failed.step(), PurchaseStep::Success);
    assert!(failed.step().is_terminal());
    assert_eq!(
        failed.fulfilment_succeeded(delivery(1)),
        Err(PurchaseRejection::NotAccepted {
            step: PurchaseStep::Failed
        })
    );
}

#[rstest]
fn single_purchase_stays_in_code_until_acknowledged(single: PurchaseSession) {
    let at_code = single
        .confirm()
        .and_then(|s| s.fulfilment_succeeded(delivery(1)))
        .expect("delivered");
    assert_eq!(
        at_code.acknowledge(),
        Err(PurchaseRejection::NotAccepted {
            step: PurchaseStep::Code
        })
    );

    let with_code = at_code.code_received(login_code()).expect("code stored");
    assert_eq!(with_code.step(), PurchaseStep::Code);
    assert_eq!(
        with_code.login_code().map(|c| c.code.as_str()),
        Some("48213")
    );

    let done = with_code.acknowledge().expect("acknowledged");
    assert_eq!(done.step(), PurchaseStep::Success);
}

#[rstest]
fn close_is_accepted_everywhere(single: PurchaseSession) {
    let processing = single.confirm().expect("confirm");
    assert_eq!(processing.close().step(), PurchaseStep::Closed);
    assert_eq!(
        processing.apply(PurchaseEvent::Close).map(|s| s.step()),
        Ok(PurchaseStep::Closed)
    );
    assert_eq!(single.close().step(), PurchaseStep::Closed);
}

#[rstest]
fn out_of_step_actions_leave_session_untouched(single: PurchaseSession) {
    let before = single.clone();
    assert_eq!(
        single.select_quantity(10),
        Err(PurchaseRejection::NotAccepted {
            step: PurchaseStep::Confirm
        })
    );
    assert_eq!(
        single.code_received(login_code()),
        Err(PurchaseRejection::NotAccepted {
            step: PurchaseStep::Confirm
        })
    );
    assert_eq!(single, before);
}

#[rstest]
fn confirm_gate_is_disabled_after_confirmation(single: PurchaseSession) {
    let processing = single.confirm().expect("confirm");
    assert!(!processing.confirm_gate().is_enabled());
}

#[rstest]
fn rejections_are_preconditions() {
    let rejection = PurchaseRejection::UnsupportedQuantity { quantity: 3 };
    assert_eq!(rejection.kind(), FailureKind::Precondition);
    assert_eq!(rejection.message_key(), "purchase.unsupported_quantity");
}
