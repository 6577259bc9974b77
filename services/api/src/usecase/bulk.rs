//! Bulk dispatcher: one personalized message per recipient, bounded concurrency.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::Instant;
use uuid::Uuid;

use courier_domain::email::is_valid_email;
use courier_domain::history::EmailKind;
use courier_domain::recipient::{MAX_BULK_RECIPIENTS, Recipient, personalize};

use crate::domain::repository::{EmailHistoryRepository, GmailCredentialRepository, MailSender};
use crate::domain::types::{DeliveryOutcome, EmailHistoryRecord, OutgoingMessage};
use crate::error::ApiError;

pub const INVALID_EMAIL_FORMAT: &str = "Invalid email format";

/// Concurrency and pacing for one bulk batch.
#[derive(Debug, Clone, Copy)]
pub struct BulkSettings {
    /// Maximum simultaneous sends.
    pub max_concurrency: usize,
    /// Delay after acquiring a permit, for every recipient but the first.
    pub pacing: Duration,
}

impl Default for BulkSettings {
    fn default() -> Self {
        Self {
            max_concurrency: 5,
            pacing: Duration::from_millis(100),
        }
    }
}

pub struct BulkSendInput {
    pub subject: String,
    pub body: String,
    pub recipients: Vec<Recipient>,
}

/// Outcome for one recipient, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientResult {
    pub email: String,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct BulkSendOutput {
    pub batch_id: String,
    pub total_emails: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub results: Vec<RecipientResult>,
    pub processing_time: Duration,
}

/// Shared between workers; one lock guards slots and counters together.
struct Tally {
    results: Vec<Option<RecipientResult>>,
    success: usize,
    failure: usize,
}

pub struct BulkSendUseCase<C, M, H>
where
    C: GmailCredentialRepository,
    M: MailSender + 'static,
    H: EmailHistoryRepository + 'static,
{
    pub credentials: C,
    pub mailer: Arc<M>,
    pub history: Arc<H>,
    pub settings: BulkSettings,
}

impl<C, M, H> BulkSendUseCase<C, M, H>
where
    C: GmailCredentialRepository,
    M: MailSender + 'static,
    H: EmailHistoryRepository + 'static,
{
    pub async fn execute(
        &self,
        user_id: Uuid,
        input: BulkSendInput,
    ) -> Result<BulkSendOutput, ApiError> {
        if input.recipients.is_empty() {
            return Err(ApiError::NoRecipients);
        }
        if input.recipients.len() > MAX_BULK_RECIPIENTS {
            return Err(ApiError::TooManyRecipients);
        }
        if input.subject.trim().is_empty() {
            return Err(ApiError::InvalidInput("subject is required".to_owned()));
        }
        if input.body.trim().is_empty() {
            return Err(ApiError::InvalidInput("body is required".to_owned()));
        }

        let credential = self
            .credentials
            .find_by_user(user_id)
            .await?
            .ok_or(ApiError::GmailNotConnected)?;

        let started = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        let total = input.recipients.len();
        let emails: Vec<String> = input.recipients.iter().map(|r| r.email.clone()).collect();

        let access_token: Arc<str> = credential.access_token.into();
        let subject: Arc<str> = input.subject.into();
        let body: Arc<str> = input.body.into();
        let semaphore = Arc::new(Semaphore::new(self.settings.max_concurrency.max(1)));
        let tally = Arc::new(Mutex::new(Tally {
            results: vec![None; total],
            success: 0,
            failure: 0,
        }));

        let mut workers = Vec::with_capacity(total);
        for (index, recipient) in input.recipients.into_iter().enumerate() {
            let job = Job {
                index,
                recipient,
                user_id,
                batch_id: batch_id.clone(),
                subject: Arc::clone(&subject),
                body: Arc::clone(&body),
                access_token: Arc::clone(&access_token),
                pacing: self.settings.pacing,
            };
            let semaphore = Arc::clone(&semaphore);
            let tally = Arc::clone(&tally);
            let mailer = Arc::clone(&self.mailer);
            let history = Arc::clone(&self.history);

            workers.push(tokio::spawn(async move {
                // Never closed, so `acquire_owned` cannot fail here.
                let _permit = semaphore.acquire_owned().await.ok();
                if job.index > 0 && !job.pacing.is_zero() {
                    tokio::time::sleep(job.pacing).await;
                }
                let outcome = job.run(mailer.as_ref()).await;

                let record = EmailHistoryRecord::attempt(job.user_id, EmailKind::Bulk, &outcome);
                tokio::spawn(async move {
                    if let Err(e) = history.record(&record).await {
                        tracing::warn!(
                            error = %e,
                            batch_id = %record.batch_id,
                            "failed to record bulk email history"
                        );
                    }
                });

                let mut tally = tally.lock().await;
                if outcome.error.is_none() {
                    tally.success += 1;
                } else {
                    tally.failure += 1;
                }
                tally.results[job.index] = Some(RecipientResult {
                    email: outcome.recipient_email,
                    success: outcome.error.is_none(),
                    error: outcome.error,
                });
            }));
        }

        for joined in join_all(workers).await {
            if let Err(e) = joined {
                tracing::error!(error = %e, batch_id = %batch_id, "bulk worker panicked");
            }
        }

        let (results, success_count, failure_count) = {
            let mut tally = tally.lock().await;
            let slots = std::mem::take(&mut tally.results);
            let mut failure = tally.failure;
            // A slot is only empty if its worker panicked before reporting.
            let results: Vec<RecipientResult> = slots
                .into_iter()
                .zip(&emails)
                .map(|(slot, email)| {
                    slot.unwrap_or_else(|| {
                        failure += 1;
                        RecipientResult {
                            email: email.clone(),
                            success: false,
                            error: Some("Failed to send: worker aborted".to_owned()),
                        }
                    })
                })
                .collect();
            (results, tally.success, failure)
        };
        let processing_time = started.elapsed();

        tracing::info!(
            user_id = %user_id,
            batch_id = %batch_id,
            total = total,
            success = success_count,
            failed = failure_count,
            elapsed_ms = processing_time.as_millis() as u64,
            "bulk send finished"
        );

        Ok(BulkSendOutput {
            batch_id,
            total_emails: total,
            success_count,
            failure_count,
            results,
            processing_time,
        })
    }
}

/// Everything one worker needs, moved into its task.
struct Job {
    index: usize,
    recipient: Recipient,
    user_id: Uuid,
    batch_id: String,
    subject: Arc<str>,
    body: Arc<str>,
    access_token: Arc<str>,
    pacing: Duration,
}

impl Job {
    /// Personalize, validate and send. Never fails; the error lands in the outcome.
    async fn run<M: MailSender>(&self, mailer: &M) -> DeliveryOutcome {
        let name = self.recipient.name.as_str();
        let subject = personalize(&self.subject, name);
        let body = personalize(&self.body, name);

        let error = if !is_valid_email(&self.recipient.email) {
            Some(INVALID_EMAIL_FORMAT.to_owned())
        } else {
            let message = OutgoingMessage {
                to: self.recipient.email.clone(),
                subject,
                body: body.clone(),
            };
            mailer
                .send(&self.access_token, &message)
                .await
                .err()
                .map(|e| format!("Failed to send: {e}"))
        };

        // History keeps the template subject and the personalized body.
        DeliveryOutcome {
            recipient_email: self.recipient.email.clone(),
            recipient_name: self.recipient.name.clone(),
            subject: self.subject.to_string(),
            body,
            batch_id: self.batch_id.clone(),
            error,
        }
    }
}
