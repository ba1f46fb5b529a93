use talaro_recovery::error::RecoveryError;

use crate::helpers::{Harness, NEW_PASSWORD, test_identity};

#[tokio::test]
async fn should_change_credential_after_request_and_confirm() {
    let user = test_identity();
    let h = Harness::new(vec![user.clone()]);

    h.request(&user.email).await.unwrap();
    let code = h.outstanding(&user);

    h.confirm("User@Example.com", &code.code, NEW_PASSWORD)
        .await
        .unwrap();

    assert_eq!(h.directory.credential_of(user.id).as_deref(), Some(NEW_PASSWORD));
    assert!(h.codes.all().iter().all(|c| c.used));

    let subjects: Vec<_> = h.sender.messages().into_iter().map(|m| m.subject).collect();
    assert_eq!(
        subjects,
        [
            "Password Reset OTP - Talaro",
            "Password Reset Successful - Talaro"
        ]
    );
}

#[tokio::test]
async fn should_invalidate_first_code_once_second_is_issued() {
    let user = test_identity();
    let h = Harness::new(vec![user.clone()]);

    h.request(&user.email).await.unwrap();
    let first = h.outstanding(&user);
    h.request(&user.email).await.unwrap();
    let second = h.outstanding(&user);

    // Digits may collide by chance; an independent first code is what matters.
    if first.code != second.code {
        let result = h.confirm(&user.email, &first.code, NEW_PASSWORD).await;
        assert!(
            matches!(result, Err(RecoveryError::InvalidCredentials(_))),
            "got {result:?}"
        );
    }

    h.confirm(&user.email, &second.code, NEW_PASSWORD)
        .await
        .unwrap();
}
