//! Tests for the verification controller.

use std::sync::Arc;

use rstest::{fixture, rstest};
use tokio::sync::oneshot::error::TryRecvError;

use super::*;
use crate::domain::VerificationCode;
use crate::domain::ports::{FixtureVerificationProvider, MockVerificationProvider};

#[fixture]
fn phone() -> PhoneNumber {
    PhoneNumber::new("+966501234567").expect("fixture phone")
}

fn fixture_controller(
    phone: PhoneNumber,
) -> (VerificationController, oneshot::Receiver<VerificationOutcome>) {
    let provider = FixtureVerificationProvider::new(VerificationCode::new("13579").expect("code"));
    VerificationController::new(phone, VerificationPolicy::default(), Arc::new(provider))
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn send_failure_keeps_step_zero_and_is_retryable(phone: PhoneNumber) {
    let mut provider = MockVerificationProvider::new();
    let mut calls = 0;
    provider.expect_send_code().times(2).returning(move |_| {
        calls += 1;
        if calls == 1 {
            Err(VerificationProviderError::send("gateway timeout"))
        } else {
            Ok(())
        }
    });
    let (mut controller, _outcome) =
        VerificationController::new(phone, VerificationPolicy::default(), Arc::new(provider));

    let err = controller.send_code().await.expect_err("first send fails");
    assert_eq!(err.kind(), FailureKind::Transport);
    assert_eq!(err.user_message(), UserMessage::SendFailed);
    assert_eq!(controller.session().step(), VerificationStep::SendCode);
    assert!(!controller.is_ticking());

    controller.send_code().await.expect("retry succeeds");
    assert_eq!(controller.session().step(), VerificationStep::VerifyCode);
    assert!(controller.is_ticking());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn malformed_code_never_reaches_provider(phone: PhoneNumber) {
    let mut provider = MockVerificationProvider::new();
    provider.expect_send_code().times(1).returning(|_| Ok(()));
    provider.expect_verify_code().times(0);
    let (mut controller, _outcome) =
        VerificationController::new(phone, VerificationPolicy::default(), Arc::new(provider));
    controller.send_code().await.expect("sent");

    let err = controller.submit_code("1234").await.expect_err("short code");
    assert_eq!(
        err,
        VerificationFlowError::Rejected(VerificationRejection::InvalidCode)
    );
    assert_eq!(err.kind(), FailureKind::Precondition);
    assert_eq!(controller.session().attempts(), 0);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn provider_error_on_verify_leaves_attempts_untouched(phone: PhoneNumber) {
    let mut provider = MockVerificationProvider::new();
    provider.expect_send_code().returning(|_| Ok(()));
    provider
        .expect_verify_code()
        .times(1)
        .returning(|_, _| Err(VerificationProviderError::connection("reset")));
    let (mut controller, _outcome) =
        VerificationController::new(phone, VerificationPolicy::default(), Arc::new(provider));
    controller.send_code().await.expect("sent");

    let err = controller.submit_code("12345").await.expect_err("transport");
    assert_eq!(err.user_message(), UserMessage::VerifyFailed);
    assert_eq!(controller.session().attempts(), 0);
    assert_eq!(controller.session().step(), VerificationStep::VerifyCode);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn three_wrong_codes_fail_and_emit_once(phone: PhoneNumber) {
    let (mut controller, mut outcome) = fixture_controller(phone);
    controller.send_code().await.expect("sent");

    let first = controller.submit_code("11111").await.expect_err("wrong");
    assert_eq!(
        first,
        VerificationFlowError::Rejected(VerificationRejection::WrongCode { remaining: 2 })
    );
    assert_eq!(first.kind(), FailureKind::RetryableVerification);
    assert_eq!(outcome.try_recv(), Err(TryRecvError::Empty));

    controller.submit_code("22222").await.expect_err("wrong");
    let last = controller.submit_code("33333").await.expect_err("exhausted");
    assert_eq!(last.kind(), FailureKind::ExhaustedAttempts);
    assert!(controller.session().is_failed());
    assert!(!controller.is_ticking());

    let after = controller.submit_code("13579").await.expect_err("terminal");
    assert_eq!(
        after,
        VerificationFlowError::Rejected(VerificationRejection::AttemptsExhausted)
    );
    assert_eq!(controller.session().attempts(), 3);

    assert_eq!(
        outcome.await.expect("outcome emitted"),
        VerificationOutcome::Failed(VerificationFailure::AttemptsExhausted)
    );
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn correct_code_then_skip_completes(phone: PhoneNumber) {
    let (mut controller, outcome) = fixture_controller(phone);
    controller.send_code().await.expect("sent");

    let step = controller.submit_code("13579").await.expect("accepted");
    assert_eq!(step, VerificationStep::TwoFactor);
    assert!(!controller.is_ticking());

    controller.skip_two_factor().expect("skip");
    match outcome.await.expect("outcome emitted") {
        VerificationOutcome::Completed(payload) => {
            assert_eq!(payload.session_payload, "session:+966501234567");
            assert_eq!(payload.tdata_payload, None);
            assert_eq!(payload.two_factor_password, None);
        }
        other => panic!("expected completion, got {other:?}"),
    }
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn two_factor_completion_carries_tdata(phone: PhoneNumber) {
    let (mut controller, outcome) = fixture_controller(phone);
    controller.send_code().await.expect("sent");
    controller.submit_code("13579").await.expect("accepted");

    let err = controller.submit_two_factor(" ").await.expect_err("blank");
    assert_eq!(err.user_message(), UserMessage::TwoFactorPasswordRequired);

    controller
        .submit_two_factor("second-factor")
        .await
        .expect("two-factor accepted");
    let VerificationOutcome::Completed(payload) = outcome.await.expect("outcome") else {
        panic!("expected completion");
    };
    assert_eq!(payload.two_factor_password.as_deref(), Some("second-factor"));
    assert_eq!(payload.tdata_payload.as_deref(), Some("tdata:+966501234567"));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn sixty_ticks_enable_resend(phone: PhoneNumber) {
    let (mut controller, _outcome) = fixture_controller(phone);
    controller.send_code().await.expect("sent");

    let err = controller.resend().await.expect_err("cooling down");
    assert_eq!(
        err,
        VerificationFlowError::Rejected(VerificationRejection::CooldownActive { remaining: 60 })
    );

    let mut ticks = 0;
    while let Some(cooldown) = controller.tick().await {
        ticks += 1;
        if cooldown.can_resend() {
            break;
        }
    }
    assert_eq!(ticks, 60);
    assert_eq!(controller.session().cooldown().remaining(), 0);
    assert!(controller.session().can_resend());
    assert!(!controller.is_ticking());
    assert_eq!(controller.tick().await, None);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn resend_restarts_cooldown_and_keeps_attempts(phone: PhoneNumber) {
    let (mut controller, _outcome) = fixture_controller(phone);
    controller.send_code().await.expect("sent");
    controller.submit_code("11111").await.expect_err("wrong");

    let cooldown = controller.wait_for_resend().await;
    assert!(cooldown.can_resend());

    controller.resend().await.expect("resent");
    assert_eq!(controller.session().step(), VerificationStep::VerifyCode);
    assert_eq!(controller.session().cooldown().remaining(), 60);
    assert_eq!(controller.session().attempts(), 1);
    assert!(controller.is_ticking());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn close_stops_ticker_and_reports_abandoned(phone: PhoneNumber) {
    let (mut controller, outcome) = fixture_controller(phone);
    controller.send_code().await.expect("sent");
    assert!(controller.is_ticking());

    controller.close();
    assert!(!controller.is_ticking());
    assert_eq!(
        outcome.await.expect("outcome"),
        VerificationOutcome::Failed(VerificationFailure::Abandoned)
    );
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn dropping_the_controller_reports_abandoned(phone: PhoneNumber) {
    let (mut controller, outcome) = fixture_controller(phone);
    controller.send_code().await.expect("sent");
    drop(controller);

    assert_eq!(
        outcome.await.expect("outcome"),
        VerificationOutcome::Failed(VerificationFailure::Abandoned)
    );
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn completion_is_not_followed_by_abandonment(phone: PhoneNumber) {
    let (mut controller, mut outcome) = fixture_controller(phone);
    controller.send_code().await.expect("sent");
    controller.submit_code("13579").await.expect("accepted");
    controller.skip_two_factor().expect("skip");
    controller.close();

    assert!(matches!(
        outcome.try_recv(),
        Ok(VerificationOutcome::Completed(_))
    ));
}
