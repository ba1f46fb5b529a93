use chrono::Duration;

use talaro_recovery::domain::types::{ACTION_RESET, ActionStatus};
use talaro_recovery::error::{CredentialFailure, RecoveryError, ValidationFailure};

use crate::helpers::{
    Harness, MockSender, NEW_PASSWORD, confirm_input, other_identity, stored_code, test_identity,
};

fn is_invalid_credentials(result: &Result<(), RecoveryError>) -> bool {
    matches!(result, Err(RecoveryError::InvalidCredentials(_)))
}

#[tokio::test]
async fn should_reject_missing_fields() {
    let user = test_identity();
    let h = Harness::new(vec![user.clone()]);

    for (email, code, password) in [
        ("", "123456", NEW_PASSWORD),
        (user.email.as_str(), "", NEW_PASSWORD),
        (user.email.as_str(), "123456", ""),
    ] {
        let result = h.confirm(email, code, password).await;
        assert!(
            matches!(
                result,
                Err(RecoveryError::Validation(ValidationFailure::ResetFieldsRequired))
            ),
            "expected ResetFieldsRequired, got {result:?}"
        );
    }
    assert_eq!(h.directory.lookup_count(), 0);
}

#[tokio::test]
async fn should_reject_short_password_before_any_lookup() {
    let user = test_identity();
    let code = stored_code(&user, "123456", Duration::minutes(1));
    let h = Harness::new(vec![user.clone()]).with_codes(vec![code.clone()]);

    let result = h.confirm(&user.email, "123456", "abc123").await;

    assert!(
        matches!(
            result,
            Err(RecoveryError::Validation(ValidationFailure::PasswordTooShort))
        ),
        "expected PasswordTooShort, got {result:?}"
    );
    assert_eq!(h.directory.lookup_count(), 0);
    assert_eq!(h.codes.attempt_count(), 0);
    assert_eq!(h.codes.get(code.id), code, "code state must not change");
}

#[tokio::test]
async fn should_accept_password_of_exactly_minimum_length() {
    let user = test_identity();
    let code = stored_code(&user, "123456", Duration::minutes(1));
    let h = Harness::new(vec![user.clone()]).with_codes(vec![code]);

    h.confirm(&user.email, "123456", "12345678").await.unwrap();

    assert_eq!(h.directory.credential_of(user.id).as_deref(), Some("12345678"));
}

#[tokio::test]
async fn should_reset_password_with_valid_code() {
    let user = test_identity();
    let code = stored_code(&user, "042917", Duration::minutes(3));
    let h = Harness::new(vec![user.clone()]).with_codes(vec![code.clone()]);

    h.confirm(&user.email, "042917", NEW_PASSWORD).await.unwrap();

    assert_eq!(h.directory.credential_of(user.id).as_deref(), Some(NEW_PASSWORD));
    assert!(h.codes.get(code.id).used);

    let sent = h.sender.messages();
    assert_eq!(sent.len(), 1, "a confirmation message should be sent");
    assert_eq!(sent[0].to, user.email);

    let entry = h.audit.last();
    assert_eq!(entry.action, ACTION_RESET);
    assert_eq!(entry.status, ActionStatus::Success);
}

#[tokio::test]
async fn should_reject_reuse_of_consumed_code() {
    let user = test_identity();
    let code = stored_code(&user, "042917", Duration::minutes(3));
    let h = Harness::new(vec![user.clone()]).with_codes(vec![code]);

    h.confirm(&user.email, "042917", NEW_PASSWORD).await.unwrap();
    let result = h.confirm(&user.email, "042917", "another-password").await;

    assert!(is_invalid_credentials(&result), "got {result:?}");
    assert_eq!(h.directory.credential_of(user.id).as_deref(), Some(NEW_PASSWORD));
}

#[tokio::test]
async fn should_reject_unknown_email_as_invalid_credentials() {
    let h = Harness::new(vec![test_identity()]);

    let result = h.confirm("nobody@example.com", "123456", NEW_PASSWORD).await;

    assert!(
        matches!(
            result,
            Err(RecoveryError::InvalidCredentials(CredentialFailure::UnknownIdentity))
        ),
        "got {result:?}"
    );
    let entry = h.audit.last();
    assert_eq!(entry.status, ActionStatus::Failed);
    assert_eq!(entry.details["result"], "user_not_found");
    assert_eq!(entry.details["attempted_email"], "nobody@example.com");
}

#[tokio::test]
async fn should_render_same_message_for_every_credential_failure() {
    let user = test_identity();
    let expired = stored_code(&user, "111111", Duration::minutes(20));
    let h = Harness::new(vec![user.clone()]).with_codes(vec![expired]);

    let unknown_identity = h.confirm("nobody@example.com", "111111", NEW_PASSWORD).await;
    let expired = h.confirm(&user.email, "111111", NEW_PASSWORD).await;

    let a = unknown_identity.unwrap_err().to_string();
    let b = expired.unwrap_err().to_string();
    assert_eq!(a, "Invalid or expired OTP");
    assert_eq!(a, b);
}

#[tokio::test]
async fn should_reject_expired_code_and_charge_attempt() {
    let user = test_identity();
    let code = stored_code(&user, "555555", Duration::minutes(16));
    let h = Harness::new(vec![user.clone()]).with_codes(vec![code.clone()]);

    let result = h.confirm(&user.email, "555555", NEW_PASSWORD).await;

    assert!(
        matches!(
            result,
            Err(RecoveryError::InvalidCredentials(CredentialFailure::Expired))
        ),
        "got {result:?}"
    );
    let stored = h.codes.get(code.id);
    assert_eq!(stored.attempts, 1);
    assert!(!stored.used, "expiry does not finalize the record");
    assert_eq!(h.directory.credential_of(user.id), None);
}

#[tokio::test]
async fn should_charge_wrong_digits_against_outstanding_code() {
    let user = test_identity();
    let code = stored_code(&user, "123456", Duration::minutes(1));
    let h = Harness::new(vec![user.clone()]).with_codes(vec![code.clone()]);

    let result = h.confirm(&user.email, "654321", NEW_PASSWORD).await;

    assert!(
        matches!(
            result,
            Err(RecoveryError::InvalidCredentials(CredentialFailure::UnknownCode))
        ),
        "got {result:?}"
    );
    assert_eq!(h.codes.get(code.id).attempts, 1);
    assert!(!h.codes.get(code.id).used);
}

#[tokio::test]
async fn should_exhaust_code_after_five_wrong_attempts() {
    let user = test_identity();
    let code = stored_code(&user, "123456", Duration::minutes(1));
    let h = Harness::new(vec![user.clone()]).with_codes(vec![code.clone()]);

    for _ in 0..4 {
        let result = h.confirm(&user.email, "000000", NEW_PASSWORD).await;
        assert!(is_invalid_credentials(&result), "got {result:?}");
    }
    let fifth = h.confirm(&user.email, "000000", NEW_PASSWORD).await;
    assert!(
        matches!(fifth, Err(RecoveryError::AttemptsExceeded)),
        "expected AttemptsExceeded, got {fifth:?}"
    );
    assert_eq!(
        fifth.unwrap_err().to_string(),
        "Maximum OTP verification attempts exceeded. Please request a new OTP."
    );

    let stored = h.codes.get(code.id);
    assert!(stored.used);
    assert_eq!(stored.attempts, 5);

    // The correct digits no longer work once the budget is spent.
    let late = h.confirm(&user.email, "123456", NEW_PASSWORD).await;
    assert!(is_invalid_credentials(&late), "got {late:?}");
    assert_eq!(h.directory.credential_of(user.id), None);
}

#[tokio::test]
async fn should_report_exhaustion_for_code_with_spent_budget() {
    let user = test_identity();
    let mut code = stored_code(&user, "123456", Duration::minutes(1));
    code.attempts = 5;
    let h = Harness::new(vec![user.clone()]).with_codes(vec![code.clone()]);

    let result = h.confirm(&user.email, "123456", NEW_PASSWORD).await;

    assert!(
        matches!(result, Err(RecoveryError::AttemptsExceeded)),
        "got {result:?}"
    );
    assert!(h.codes.get(code.id).used);
    assert_eq!(h.directory.credential_of(user.id), None);
    assert_eq!(h.audit.last().details["result"], "max_attempts_exceeded");
}

#[tokio::test]
async fn should_finalize_sibling_codes_on_success() {
    let user = test_identity();
    let older = stored_code(&user, "111111", Duration::minutes(5));
    let newer = stored_code(&user, "222222", Duration::minutes(2));
    let h = Harness::new(vec![user.clone()]).with_codes(vec![older.clone(), newer.clone()]);

    h.confirm(&user.email, "111111", NEW_PASSWORD).await.unwrap();

    assert!(h.codes.get(older.id).used);
    assert!(h.codes.get(newer.id).used, "sibling must be finalized");
    assert_eq!(h.codes.get(newer.id).attempts, 0);
}

#[tokio::test]
async fn should_pick_most_recent_code_when_digits_collide() {
    let user = test_identity();
    let older = stored_code(&user, "333333", Duration::minutes(20));
    let newer = stored_code(&user, "333333", Duration::minutes(1));
    let h = Harness::new(vec![user.clone()]).with_codes(vec![older.clone(), newer.clone()]);

    h.confirm(&user.email, "333333", NEW_PASSWORD).await.unwrap();

    assert!(h.codes.get(newer.id).used);
    assert_eq!(h.codes.get(older.id).attempts, 0, "expired twin is never evaluated");
}

#[tokio::test]
async fn should_not_accept_code_issued_to_another_identity() {
    let user = test_identity();
    let other = other_identity();
    let foreign = stored_code(&other, "777777", Duration::minutes(1));
    let h = Harness::new(vec![user.clone(), other]).with_codes(vec![foreign.clone()]);

    let result = h.confirm(&user.email, "777777", NEW_PASSWORD).await;

    assert!(is_invalid_credentials(&result), "got {result:?}");
    assert!(!h.codes.get(foreign.id).used);
    assert_eq!(h.codes.get(foreign.id).attempts, 0);
}

#[tokio::test]
async fn should_succeed_when_confirmation_delivery_fails() {
    let user = test_identity();
    let code = stored_code(&user, "123456", Duration::minutes(1));
    let h = Harness::new(vec![user.clone()])
        .with_codes(vec![code])
        .with_sender(MockSender::failing());

    h.confirm(&user.email, "123456", NEW_PASSWORD).await.unwrap();

    assert_eq!(h.directory.credential_of(user.id).as_deref(), Some(NEW_PASSWORD));
}

#[tokio::test]
async fn should_consume_code_once_under_concurrent_attempts() {
    let user = test_identity();
    let code = stored_code(&user, "123456", Duration::minutes(1));
    let h = Harness::new(vec![user.clone()]).with_codes(vec![code]);
    let verifier = h.verifier();

    let (a, b) = tokio::join!(
        verifier.execute(confirm_input(&user.email, "123456", "first-password")),
        verifier.execute(confirm_input(&user.email, "123456", "second-password")),
    );

    let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one attempt may succeed: {a:?} {b:?}");
    assert!(is_invalid_credentials(if a.is_ok() { &b } else { &a }));
}
