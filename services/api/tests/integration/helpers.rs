#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use courier_api::domain::repository::{
    EmailHistoryRepository, GmailCredentialRepository, GoogleOAuthPort, MailSender,
    PasswordHasher, UserRepository,
};
use courier_api::domain::types::{
    DeliveryError, EmailHistoryRecord, GmailCredential, GmailGrant, GoogleProfile, HistoryStats,
    OAuthTokens, OutgoingMessage, User,
};
use courier_api::error::ApiError;
use courier_domain::history::{EmailKind, EmailStatus};
use courier_domain::pagination::PageRequest;

pub use courier_testing::auth::TEST_JWT_SECRET;

// ── MockUserRepo ─────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockUserRepo {
    pub users: Arc<Mutex<Vec<User>>>,
}

impl MockUserRepo {
    pub fn new(users: Vec<User>) -> Self {
        Self {
            users: Arc::new(Mutex::new(users)),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns a shared handle to the stored users for post-execution inspection.
    pub fn users_handle(&self) -> Arc<Mutex<Vec<User>>> {
        Arc::clone(&self.users)
    }
}

impl UserRepository for MockUserRepo {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn create(&self, user: &User) -> Result<(), ApiError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(ApiError::UserAlreadyExists);
        }
        users.push(user.clone());
        Ok(())
    }
}

// ── MockCredentialRepo ───────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockCredentialRepo {
    pub credentials: Arc<Mutex<Vec<GmailCredential>>>,
}

impl MockCredentialRepo {
    pub fn new(credentials: Vec<GmailCredential>) -> Self {
        Self {
            credentials: Arc::new(Mutex::new(credentials)),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn credentials_handle(&self) -> Arc<Mutex<Vec<GmailCredential>>> {
        Arc::clone(&self.credentials)
    }
}

impl GmailCredentialRepository for MockCredentialRepo {
    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<GmailCredential>, ApiError> {
        Ok(self
            .credentials
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.user_id == user_id)
            .cloned())
    }

    async fn upsert(&self, user_id: Uuid, grant: &GmailGrant) -> Result<GmailCredential, ApiError> {
        let now = Utc::now();
        let mut credentials = self.credentials.lock().unwrap();
        if let Some(c) = credentials.iter_mut().find(|c| c.user_id == user_id) {
            c.access_token = grant.access_token.clone();
            c.refresh_token = grant.refresh_token.clone();
            c.token_type = grant.token_type.clone();
            c.expires_at = grant.expires_at;
            c.scope = grant.scope.clone();
            c.updated_at = now;
            return Ok(c.clone());
        }
        let credential = GmailCredential {
            id: Uuid::now_v7(),
            user_id,
            access_token: grant.access_token.clone(),
            refresh_token: grant.refresh_token.clone(),
            token_type: grant.token_type.clone(),
            expires_at: grant.expires_at,
            scope: grant.scope.clone(),
            created_at: now,
            updated_at: now,
        };
        credentials.push(credential.clone());
        Ok(credential)
    }

    async fn delete_by_user(&self, user_id: Uuid) -> Result<bool, ApiError> {
        let mut credentials = self.credentials.lock().unwrap();
        let before = credentials.len();
        credentials.retain(|c| c.user_id != user_id);
        Ok(credentials.len() < before)
    }
}

// ── MockHistoryRepo ──────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockHistoryRepo {
    pub records: Arc<Mutex<Vec<EmailHistoryRecord>>>,
    pub fail_writes: bool,
}

impl MockHistoryRepo {
    pub fn new(records: Vec<EmailHistoryRecord>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
            fail_writes: false,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Every `record` call fails.
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn records_handle(&self) -> Arc<Mutex<Vec<EmailHistoryRecord>>> {
        Arc::clone(&self.records)
    }
}

impl EmailHistoryRepository for MockHistoryRepo {
    async fn record(&self, record: &EmailHistoryRecord) -> Result<(), ApiError> {
        if self.fail_writes {
            return Err(ApiError::Internal(anyhow::anyhow!("history table unavailable")));
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn list(
        &self,
        user_id: Uuid,
        kind: Option<EmailKind>,
        page: PageRequest,
    ) -> Result<(Vec<EmailHistoryRecord>, u64), ApiError> {
        let mut rows: Vec<EmailHistoryRecord> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id && kind.is_none_or(|k| r.kind == k))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
        let total = rows.len() as u64;
        let page_rows = rows
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.page_size as usize)
            .collect();
        Ok((page_rows, total))
    }

    async fn stats(&self, user_id: Uuid, since: DateTime<Utc>) -> Result<HistoryStats, ApiError> {
        let records = self.records.lock().unwrap();
        let mine: Vec<&EmailHistoryRecord> =
            records.iter().filter(|r| r.user_id == user_id).collect();
        let count = |f: &dyn Fn(&EmailHistoryRecord) -> bool| {
            mine.iter().filter(|r| f(**r)).count() as u64
        };
        Ok(HistoryStats {
            total_sent: count(&|r| r.status == EmailStatus::Sent),
            total_failed: count(&|r| r.status == EmailStatus::Failed),
            single_emails: count(&|r| r.kind == EmailKind::Single),
            bulk_emails: count(&|r| r.kind == EmailKind::Bulk),
            last_7_days_sent: count(&|r| r.status == EmailStatus::Sent && r.sent_at >= since),
            last_7_days_failed: count(&|r| r.status == EmailStatus::Failed && r.sent_at >= since),
        })
    }
}

// ── MockGoogle ───────────────────────────────────────────────────────────────

/// Google OAuth double. A `None` profile rejects every token as invalid.
#[derive(Clone)]
pub struct MockGoogle {
    pub profile: Option<GoogleProfile>,
    pub tokens: OAuthTokens,
    pub exchanged_codes: Arc<Mutex<Vec<String>>>,
}

impl MockGoogle {
    pub fn new(email: &str, name: &str) -> Self {
        Self {
            profile: Some(GoogleProfile {
                email: email.to_owned(),
                name: name.to_owned(),
            }),
            tokens: OAuthTokens {
                access_token: "ya29.mock-access".to_owned(),
                refresh_token: "1//mock-refresh".to_owned(),
                token_type: "Bearer".to_owned(),
                expires_in: 3599,
            },
            exchanged_codes: Arc::new(Mutex::new(vec![])),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            profile: None,
            ..Self::new("", "")
        }
    }

    fn resolve(&self) -> Result<GoogleProfile, ApiError> {
        self.profile.clone().ok_or(ApiError::InvalidGoogleToken)
    }
}

impl GoogleOAuthPort for MockGoogle {
    async fn exchange_code(&self, code: &str) -> Result<OAuthTokens, ApiError> {
        self.exchanged_codes.lock().unwrap().push(code.to_owned());
        Ok(self.tokens.clone())
    }

    async fn userinfo(&self, _access_token: &str) -> Result<GoogleProfile, ApiError> {
        self.resolve()
    }

    async fn verify_id_token(&self, _id_token: &str) -> Result<GoogleProfile, ApiError> {
        self.resolve()
    }
}

// ── MockMailer ───────────────────────────────────────────────────────────────

/// Records every message and tracks peak concurrency.
#[derive(Default)]
pub struct MockMailer {
    pub sent: Arc<Mutex<Vec<OutgoingMessage>>>,
    /// Recipients whose send fails with `rate limited`.
    pub fail_for: Vec<String>,
    /// Simulated network latency per send.
    pub latency: Duration,
    in_flight: AtomicUsize,
    pub peak_in_flight: AtomicUsize,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(recipients: &[&str]) -> Self {
        Self {
            fail_for: recipients.iter().map(|s| (*s).to_owned()).collect(),
            ..Self::default()
        }
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    pub fn sent_handle(&self) -> Arc<Mutex<Vec<OutgoingMessage>>> {
        Arc::clone(&self.sent)
    }

    pub fn peak(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

impl MailSender for MockMailer {
    async fn send(
        &self,
        _access_token: &str,
        message: &OutgoingMessage,
    ) -> Result<(), DeliveryError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.sent.lock().unwrap().push(message.clone());
        if self.fail_for.contains(&message.to) {
            return Err(DeliveryError("gmail returned 429 Too Many Requests: rate limited".to_owned()));
        }
        Ok(())
    }
}

// ── PlainHasher ──────────────────────────────────────────────────────────────

/// Reversible stand-in for Argon2 so tests stay fast.
#[derive(Clone, Default)]
pub struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, password: &str) -> Result<String, ApiError> {
        Ok(format!("plain:{password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, ApiError> {
        Ok(hash == format!("plain:{password}"))
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

pub fn test_user() -> User {
    User::new(
        "alice@example.com".to_owned(),
        "Alice".to_owned(),
        "plain:correct-horse".to_owned(),
    )
}

pub fn test_credential(user_id: Uuid) -> GmailCredential {
    let now = Utc::now();
    GmailCredential {
        id: Uuid::now_v7(),
        user_id,
        access_token: "ya29.stored-access".to_owned(),
        refresh_token: "1//stored-refresh".to_owned(),
        token_type: "Bearer".to_owned(),
        expires_at: now + chrono::Duration::hours(1),
        scope: "https://www.googleapis.com/auth/gmail.send".to_owned(),
        created_at: now,
        updated_at: now,
    }
}

pub fn history_row(
    user_id: Uuid,
    kind: EmailKind,
    status: EmailStatus,
    sent_at: DateTime<Utc>,
) -> EmailHistoryRecord {
    EmailHistoryRecord {
        id: Uuid::now_v7(),
        user_id,
        kind,
        recipient_email: "to@example.com".to_owned(),
        recipient_name: String::new(),
        subject: "subject".to_owned(),
        body: "body".to_owned(),
        status,
        error_message: String::new(),
        batch_id: String::new(),
        sent_at,
        created_at: sent_at,
    }
}

/// Wait until `n` history rows exist; bulk writes land asynchronously.
pub async fn wait_for_records(handle: &Arc<Mutex<Vec<EmailHistoryRecord>>>, n: usize) {
    for _ in 0..200 {
        if handle.lock().unwrap().len() >= n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!(
        "expected {n} history rows, found {}",
        handle.lock().unwrap().len()
    );
}
