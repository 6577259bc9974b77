use std::sync::Arc;
use std::time::Duration;

use courier_api::error::ApiError;
use courier_api::usecase::bulk::{
    BulkSendInput, BulkSendUseCase, BulkSettings, INVALID_EMAIL_FORMAT,
};
use courier_domain::history::{EmailKind, EmailStatus};
use courier_domain::recipient::Recipient;

use crate::helpers::{
    MockCredentialRepo, MockHistoryRepo, MockMailer, test_credential, test_user, wait_for_records,
};

const NO_PACING: BulkSettings = BulkSettings {
    max_concurrency: 5,
    pacing: Duration::ZERO,
};

fn usecase(
    credentials: MockCredentialRepo,
    mailer: Arc<MockMailer>,
    history: Arc<MockHistoryRepo>,
) -> BulkSendUseCase<MockCredentialRepo, MockMailer, MockHistoryRepo> {
    BulkSendUseCase {
        credentials,
        mailer,
        history,
        settings: NO_PACING,
    }
}

fn input(recipients: Vec<Recipient>) -> BulkSendInput {
    BulkSendInput {
        subject: "Hello {{name}}".to_owned(),
        body: "Hi {{Name}}, welcome. Bye {{name}}.".to_owned(),
        recipients,
    }
}

fn recipients(n: usize) -> Vec<Recipient> {
    (0..n)
        .map(|i| Recipient::new(format!("user{i}@example.com"), format!("User{i}")))
        .collect()
}

// ── Validation ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_reject_empty_batch_before_sending() {
    let user = test_user();
    let mailer = Arc::new(MockMailer::new());
    let history = Arc::new(MockHistoryRepo::empty());
    let usecase = usecase(
        MockCredentialRepo::new(vec![test_credential(user.id)]),
        Arc::clone(&mailer),
        Arc::clone(&history),
    );

    let result = usecase.execute(user.id, input(vec![])).await;

    assert!(matches!(result, Err(ApiError::NoRecipients)), "got {result:?}");
    assert!(mailer.sent_handle().lock().unwrap().is_empty());
    assert!(history.records_handle().lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_reject_more_than_one_hundred_recipients() {
    let user = test_user();
    let mailer = Arc::new(MockMailer::new());
    let usecase = usecase(
        MockCredentialRepo::new(vec![test_credential(user.id)]),
        Arc::clone(&mailer),
        Arc::new(MockHistoryRepo::empty()),
    );

    let result = usecase.execute(user.id, input(recipients(101))).await;

    assert!(matches!(result, Err(ApiError::TooManyRecipients)), "got {result:?}");
    assert!(mailer.sent_handle().lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_require_subject_and_body() {
    let user = test_user();
    let usecase = usecase(
        MockCredentialRepo::new(vec![test_credential(user.id)]),
        Arc::new(MockMailer::new()),
        Arc::new(MockHistoryRepo::empty()),
    );

    let mut blank_subject = input(recipients(1));
    blank_subject.subject = "   ".to_owned();
    let result = usecase.execute(user.id, blank_subject).await;
    assert!(matches!(result, Err(ApiError::InvalidInput(_))), "got {result:?}");

    let mut blank_body = input(recipients(1));
    blank_body.body = String::new();
    let result = usecase.execute(user.id, blank_body).await;
    assert!(matches!(result, Err(ApiError::InvalidInput(_))), "got {result:?}");
}

#[tokio::test]
async fn should_fail_when_gmail_not_connected() {
    let user = test_user();
    let mailer = Arc::new(MockMailer::new());
    let usecase = usecase(
        MockCredentialRepo::empty(),
        Arc::clone(&mailer),
        Arc::new(MockHistoryRepo::empty()),
    );

    let result = usecase.execute(user.id, input(recipients(3))).await;

    assert!(matches!(result, Err(ApiError::GmailNotConnected)), "got {result:?}");
    assert!(mailer.sent_handle().lock().unwrap().is_empty());
}

// ── Dispatch ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_return_results_in_input_order() {
    let user = test_user();
    let usecase = usecase(
        MockCredentialRepo::new(vec![test_credential(user.id)]),
        Arc::new(MockMailer::with_latency(Duration::from_millis(2))),
        Arc::new(MockHistoryRepo::empty()),
    );
    let batch = recipients(25);

    let out = usecase.execute(user.id, input(batch.clone())).await.unwrap();

    assert_eq!(out.total_emails, 25);
    assert_eq!(out.results.len(), 25);
    for (result, recipient) in out.results.iter().zip(&batch) {
        assert_eq!(result.email, recipient.email);
        assert!(result.success);
        assert!(result.error.is_none());
    }
    assert_eq!(out.success_count, 25);
    assert_eq!(out.failure_count, 0);
}

#[tokio::test]
async fn should_count_failures_without_failing_the_batch() {
    let user = test_user();
    let mailer = Arc::new(MockMailer::failing_for(&["user1@example.com"]));
    let usecase = usecase(
        MockCredentialRepo::new(vec![test_credential(user.id)]),
        Arc::clone(&mailer),
        Arc::new(MockHistoryRepo::empty()),
    );
    let mut batch = recipients(3);
    batch.push(Recipient::new("not-an-email", "Nope"));

    let out = usecase.execute(user.id, input(batch)).await.unwrap();

    assert_eq!(out.success_count + out.failure_count, out.total_emails);
    assert_eq!(out.success_count, 2);
    assert_eq!(out.failure_count, 2);

    let failed = &out.results[1];
    assert!(!failed.success);
    assert!(
        failed.error.as_deref().unwrap().starts_with("Failed to send: "),
        "got {:?}",
        failed.error
    );

    let invalid = &out.results[3];
    assert_eq!(invalid.error.as_deref(), Some(INVALID_EMAIL_FORMAT));
    // Invalid addresses never reach the mail sender.
    let sent = mailer.sent_handle();
    assert!(sent.lock().unwrap().iter().all(|m| m.to != "not-an-email"));
    assert_eq!(sent.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn should_personalize_subject_and_body_per_recipient() {
    let user = test_user();
    let mailer = Arc::new(MockMailer::new());
    let usecase = usecase(
        MockCredentialRepo::new(vec![test_credential(user.id)]),
        Arc::clone(&mailer),
        Arc::new(MockHistoryRepo::empty()),
    );
    let batch = vec![
        Recipient::new("al@example.com", "Al"),
        Recipient::new("anon@example.com", ""),
    ];

    usecase.execute(user.id, input(batch)).await.unwrap();

    let sent = mailer.sent_handle();
    let sent = sent.lock().unwrap();
    let al = sent.iter().find(|m| m.to == "al@example.com").unwrap();
    assert_eq!(al.subject, "Hello Al");
    assert_eq!(al.body, "Hi Al, welcome. Bye Al.");

    let anon = sent.iter().find(|m| m.to == "anon@example.com").unwrap();
    assert_eq!(anon.subject, "Hello {{name}}");
}

#[tokio::test]
async fn should_never_exceed_concurrency_cap() {
    let user = test_user();
    let mailer = Arc::new(MockMailer::with_latency(Duration::from_millis(10)));
    let usecase = usecase(
        MockCredentialRepo::new(vec![test_credential(user.id)]),
        Arc::clone(&mailer),
        Arc::new(MockHistoryRepo::empty()),
    );

    let out = usecase.execute(user.id, input(recipients(30))).await.unwrap();

    assert_eq!(out.success_count, 30);
    assert!(mailer.peak() <= 5, "peak concurrency was {}", mailer.peak());
    assert!(mailer.peak() >= 2, "sends never overlapped");
}

#[tokio::test(start_paused = true)]
async fn should_pace_sends_after_the_first() {
    let user = test_user();
    let usecase = BulkSendUseCase {
        credentials: MockCredentialRepo::new(vec![test_credential(user.id)]),
        mailer: Arc::new(MockMailer::new()),
        history: Arc::new(MockHistoryRepo::empty()),
        settings: BulkSettings {
            max_concurrency: 1,
            pacing: Duration::from_millis(100),
        },
    };

    let out = usecase.execute(user.id, input(recipients(4))).await.unwrap();

    // Three paced sends behind a single permit.
    assert!(
        out.processing_time >= Duration::from_millis(300),
        "took {:?}",
        out.processing_time
    );
}

// ── History ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_record_one_history_row_per_recipient_with_shared_batch() {
    let user = test_user();
    let history = Arc::new(MockHistoryRepo::empty());
    let usecase = usecase(
        MockCredentialRepo::new(vec![test_credential(user.id)]),
        Arc::new(MockMailer::failing_for(&["user0@example.com"])),
        Arc::clone(&history),
    );

    let out = usecase.execute(user.id, input(recipients(4))).await.unwrap();

    let handle = history.records_handle();
    wait_for_records(&handle, 4).await;
    let rows = handle.lock().unwrap();
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|r| r.batch_id == out.batch_id));
    assert!(rows.iter().all(|r| r.kind == EmailKind::Bulk));
    assert!(rows.iter().all(|r| r.user_id == user.id));

    let failed = rows
        .iter()
        .find(|r| r.recipient_email == "user0@example.com")
        .unwrap();
    assert_eq!(failed.status, EmailStatus::Failed);
    assert!(!failed.error_message.is_empty());

    let sent = rows
        .iter()
        .find(|r| r.recipient_email == "user2@example.com")
        .unwrap();
    assert_eq!(sent.status, EmailStatus::Sent);
    assert_eq!(sent.recipient_name, "User2");
    // Template subject, personalized body.
    assert_eq!(sent.subject, "Hello {{name}}");
    assert_eq!(sent.body, "Hi User2, welcome. Bye User2.");
}

#[tokio::test]
async fn should_not_fail_batch_when_history_write_fails() {
    let user = test_user();
    let usecase = usecase(
        MockCredentialRepo::new(vec![test_credential(user.id)]),
        Arc::new(MockMailer::new()),
        Arc::new(MockHistoryRepo::failing()),
    );

    let out = usecase.execute(user.id, input(recipients(2))).await.unwrap();

    assert_eq!(out.success_count, 2);
}
