use std::sync::Arc;

use courier_api::config::GoogleOAuthConfig;
use courier_api::error::ApiError;
use courier_api::usecase::gmail::{
    AuthUrlUseCase, DisconnectGmailUseCase, GmailStatus, GmailStatusUseCase, SendEmailInput,
    SendEmailUseCase,
};
use courier_domain::history::{EmailKind, EmailStatus};

use crate::helpers::{
    MockCredentialRepo, MockHistoryRepo, MockMailer, test_credential, test_user,
};

fn send_input(to: &str) -> SendEmailInput {
    SendEmailInput {
        to: to.to_owned(),
        subject: "Quarterly report".to_owned(),
        body: "See attached.".to_owned(),
    }
}

// ── AuthUrlUseCase ───────────────────────────────────────────────────────────

#[test]
fn should_build_consent_url_with_user_state() {
    let user = test_user();
    let usecase = AuthUrlUseCase {
        google: Arc::new(GoogleOAuthConfig {
            client_id: "client-123.apps.googleusercontent.com".to_owned(),
            client_secret: "secret".to_owned(),
            redirect_url: "postmessage".to_owned(),
        }),
    };

    let out = usecase.execute(user.id).unwrap();

    assert!(out.state.starts_with(&format!("user_{}_", user.id)));
    let url = url::Url::parse(&out.auth_url).unwrap();
    let params: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    let get = |k: &str| {
        params
            .iter()
            .find(|(key, _)| key == k)
            .map(|(_, v)| v.as_str())
    };
    assert_eq!(get("state"), Some(out.state.as_str()));
    assert_eq!(get("access_type"), Some("offline"));
    assert_eq!(get("prompt"), Some("consent"));
    assert_eq!(get("client_id"), Some("client-123.apps.googleusercontent.com"));
}

// ── GmailStatusUseCase / DisconnectGmailUseCase ──────────────────────────────

#[tokio::test]
async fn should_report_status_for_linked_and_unlinked_accounts() {
    let user = test_user();
    let credential = test_credential(user.id);

    let linked = GmailStatusUseCase {
        credentials: MockCredentialRepo::new(vec![credential.clone()]),
    };
    assert_eq!(
        linked.execute(user.id).await.unwrap(),
        GmailStatus::Connected {
            expires_at: credential.expires_at,
            expired: false,
            scope: credential.scope.clone(),
        }
    );

    let unlinked = GmailStatusUseCase {
        credentials: MockCredentialRepo::empty(),
    };
    assert_eq!(unlinked.execute(user.id).await.unwrap(), GmailStatus::NotConnected);
}

#[tokio::test]
async fn should_disconnect_and_report_whether_anything_was_removed() {
    let user = test_user();
    let credentials = MockCredentialRepo::new(vec![test_credential(user.id)]);
    let handle = credentials.credentials_handle();
    let usecase = DisconnectGmailUseCase { credentials };

    assert!(usecase.execute(user.id).await.unwrap());
    assert!(handle.lock().unwrap().is_empty());
    assert!(!usecase.execute(user.id).await.unwrap());
}

// ── SendEmailUseCase ─────────────────────────────────────────────────────────

#[tokio::test]
async fn should_send_and_record_single_history_row() {
    let user = test_user();
    let mailer = MockMailer::new();
    let sent = mailer.sent_handle();
    let history = MockHistoryRepo::empty();
    let rows = history.records_handle();
    let usecase = SendEmailUseCase {
        credentials: MockCredentialRepo::new(vec![test_credential(user.id)]),
        mailer,
        history,
    };

    let out = usecase
        .execute(user.id, &user.email, send_input("bob@example.com"))
        .await
        .unwrap();

    assert_eq!(out.to, "bob@example.com");
    assert_eq!(out.from, user.email);
    assert_eq!(sent.lock().unwrap().len(), 1);

    let rows = rows.lock().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].kind, EmailKind::Single);
    assert_eq!(rows[0].status, EmailStatus::Sent);
    assert!(rows[0].batch_id.is_empty());
    assert!(rows[0].recipient_name.is_empty());
}

#[tokio::test]
async fn should_record_failure_and_return_send_failed() {
    let user = test_user();
    let history = MockHistoryRepo::empty();
    let rows = history.records_handle();
    let usecase = SendEmailUseCase {
        credentials: MockCredentialRepo::new(vec![test_credential(user.id)]),
        mailer: MockMailer::failing_for(&["bob@example.com"]),
        history,
    };

    let result = usecase
        .execute(user.id, &user.email, send_input("bob@example.com"))
        .await;

    assert!(matches!(result, Err(ApiError::SendFailed(_))), "got {result:?}");
    let rows = rows.lock().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status, EmailStatus::Failed);
    assert!(rows[0].error_message.contains("rate limited"));
}

#[tokio::test]
async fn should_validate_before_looking_up_credential() {
    let user = test_user();
    let mailer = MockMailer::new();
    let sent = mailer.sent_handle();
    let usecase = SendEmailUseCase {
        credentials: MockCredentialRepo::empty(),
        mailer,
        history: MockHistoryRepo::empty(),
    };

    let result = usecase
        .execute(user.id, &user.email, send_input("nope"))
        .await;
    assert!(matches!(result, Err(ApiError::InvalidInput(_))), "got {result:?}");

    let result = usecase
        .execute(user.id, &user.email, send_input("bob@example.com"))
        .await;
    assert!(matches!(result, Err(ApiError::GmailNotConnected)), "got {result:?}");
    assert!(sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_succeed_even_if_history_write_fails() {
    let user = test_user();
    let usecase = SendEmailUseCase {
        credentials: MockCredentialRepo::new(vec![test_credential(user.id)]),
        mailer: MockMailer::new(),
        history: MockHistoryRepo::failing(),
    };

    let result = usecase
        .execute(user.id, &user.email, send_input("bob@example.com"))
        .await;

    assert!(result.is_ok(), "got {result:?}");
}
