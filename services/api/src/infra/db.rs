use anyhow::{Context as _, anyhow};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, Insert, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, SqlErr,
};
use uuid::Uuid;

use courier_api_schema::{email_histories, gmail_credentials, users};
use courier_domain::history::{EmailKind, EmailStatus};
use courier_domain::pagination::PageRequest;

use crate::domain::repository::{
    EmailHistoryRepository, GmailCredentialRepository, UserRepository,
};
use crate::domain::types::{EmailHistoryRecord, GmailCredential, GmailGrant, HistoryStats, User};
use crate::error::ApiError;

// ── User repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl UserRepository for DbUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .filter(users::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .context("find user by email")?;
        Ok(model.map(user_from_model))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        let model = users::Entity::find_by_id(id)
            .filter(users::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .context("find user by id")?;
        Ok(model.map(user_from_model))
    }

    async fn create(&self, user: &User) -> Result<(), ApiError> {
        let result = users::Entity::insert(users::ActiveModel {
            id: Set(user.id),
            email: Set(user.email.clone()),
            name: Set(user.name.clone()),
            password_hash: Set(user.password_hash.clone()),
            created_at: Set(user.created_at),
            updated_at: Set(user.updated_at),
            deleted_at: Set(None),
        })
        .exec(&self.db)
        .await;
        match result {
            Ok(_) => Ok(()),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(ApiError::UserAlreadyExists)
            }
            Err(e) => Err(ApiError::Internal(anyhow::Error::new(e).context("create user"))),
        }
    }
}

fn user_from_model(model: users::Model) -> User {
    User {
        id: model.id,
        email: model.email,
        name: model.name,
        password_hash: model.password_hash,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

// ── Gmail credential repository ──────────────────────────────────────────────

#[derive(Clone)]
pub struct DbGmailCredentialRepository {
    pub db: DatabaseConnection,
}

impl GmailCredentialRepository for DbGmailCredentialRepository {
    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<GmailCredential>, ApiError> {
        let model = gmail_credentials::Entity::find()
            .filter(gmail_credentials::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .context("find gmail credential")?;
        Ok(model.map(credential_from_model))
    }

    async fn upsert(&self, user_id: Uuid, grant: &GmailGrant) -> Result<GmailCredential, ApiError> {
        let model = credential_upsert(user_id, grant, Utc::now())
            .exec_with_returning(&self.db)
            .await
            .context("upsert gmail credential")?;
        Ok(credential_from_model(model))
    }

    async fn delete_by_user(&self, user_id: Uuid) -> Result<bool, ApiError> {
        let result = gmail_credentials::Entity::delete_many()
            .filter(gmail_credentials::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .context("delete gmail credential")?;
        Ok(result.rows_affected > 0)
    }
}

/// One row per user: a repeated grant overwrites the tokens, expiry and scope
/// in place, keeping `id` and `created_at`.
fn credential_upsert(
    user_id: Uuid,
    grant: &GmailGrant,
    now: DateTime<Utc>,
) -> Insert<gmail_credentials::ActiveModel> {
    gmail_credentials::Entity::insert(gmail_credentials::ActiveModel {
        id: Set(Uuid::now_v7()),
        user_id: Set(user_id),
        access_token: Set(grant.access_token.clone()),
        refresh_token: Set(grant.refresh_token.clone()),
        token_type: Set(grant.token_type.clone()),
        expires_at: Set(grant.expires_at),
        scope: Set(grant.scope.clone()),
        created_at: Set(now),
        updated_at: Set(now),
    })
    .on_conflict(
        OnConflict::column(gmail_credentials::Column::UserId)
            .update_columns([
                gmail_credentials::Column::AccessToken,
                gmail_credentials::Column::RefreshToken,
                gmail_credentials::Column::TokenType,
                gmail_credentials::Column::ExpiresAt,
                gmail_credentials::Column::Scope,
                gmail_credentials::Column::UpdatedAt,
            ])
            .to_owned(),
    )
}

fn credential_from_model(model: gmail_credentials::Model) -> GmailCredential {
    GmailCredential {
        id: model.id,
        user_id: model.user_id,
        access_token: model.access_token,
        refresh_token: model.refresh_token,
        token_type: model.token_type,
        expires_at: model.expires_at,
        scope: model.scope,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

// ── Email history repository ─────────────────────────────────────────────────

type HistorySelect = sea_orm::Select<email_histories::Entity>;

#[derive(Clone)]
pub struct DbEmailHistoryRepository {
    pub db: DatabaseConnection,
}

impl DbEmailHistoryRepository {
    async fn count_where(
        &self,
        user_id: Uuid,
        filter: impl FnOnce(HistorySelect) -> HistorySelect,
    ) -> Result<u64, ApiError> {
        let query = email_histories::Entity::find()
            .filter(email_histories::Column::UserId.eq(user_id));
        let count = filter(query)
            .count(&self.db)
            .await
            .context("count email history")?;
        Ok(count)
    }
}

impl EmailHistoryRepository for DbEmailHistoryRepository {
    async fn record(&self, record: &EmailHistoryRecord) -> Result<(), ApiError> {
        email_histories::Entity::insert(email_histories::ActiveModel {
            id: Set(record.id),
            user_id: Set(record.user_id),
            kind: Set(record.kind.as_str().to_owned()),
            recipient_email: Set(record.recipient_email.clone()),
            recipient_name: Set(record.recipient_name.clone()),
            subject: Set(record.subject.clone()),
            body: Set(record.body.clone()),
            status: Set(record.status.as_str().to_owned()),
            error_message: Set(record.error_message.clone()),
            batch_id: Set(record.batch_id.clone()),
            sent_at: Set(record.sent_at),
            created_at: Set(record.created_at),
        })
        .exec(&self.db)
        .await
        .context("insert email history")?;
        Ok(())
    }

    async fn list(
        &self,
        user_id: Uuid,
        kind: Option<EmailKind>,
        page: PageRequest,
    ) -> Result<(Vec<EmailHistoryRecord>, u64), ApiError> {
        let mut query =
            email_histories::Entity::find().filter(email_histories::Column::UserId.eq(user_id));
        if let Some(kind) = kind {
            query = query.filter(email_histories::Column::Kind.eq(kind.as_str()));
        }

        let total = query
            .clone()
            .count(&self.db)
            .await
            .context("count email history")?;
        let models = query
            .order_by_desc(email_histories::Column::SentAt)
            .offset(page.offset())
            .limit(page.page_size)
            .all(&self.db)
            .await
            .context("list email history")?;

        let records = models
            .into_iter()
            .map(history_from_model)
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok((records, total))
    }

    async fn stats(&self, user_id: Uuid, since: DateTime<Utc>) -> Result<HistoryStats, ApiError> {
        use email_histories::Column;

        let status_eq = |s: EmailStatus| Column::Status.eq(s.as_str());
        let kind_eq = |k: EmailKind| Column::Kind.eq(k.as_str());

        Ok(HistoryStats {
            total_sent: self
                .count_where(user_id, |q| q.filter(status_eq(EmailStatus::Sent)))
                .await?,
            total_failed: self
                .count_where(user_id, |q| q.filter(status_eq(EmailStatus::Failed)))
                .await?,
            single_emails: self
                .count_where(user_id, |q| q.filter(kind_eq(EmailKind::Single)))
                .await?,
            bulk_emails: self
                .count_where(user_id, |q| q.filter(kind_eq(EmailKind::Bulk)))
                .await?,
            last_7_days_sent: self
                .count_where(user_id, |q| {
                    q.filter(status_eq(EmailStatus::Sent))
                        .filter(Column::SentAt.gte(since))
                })
                .await?,
            last_7_days_failed: self
                .count_where(user_id, |q| {
                    q.filter(status_eq(EmailStatus::Failed))
                        .filter(Column::SentAt.gte(since))
                })
                .await?,
        })
    }
}

fn history_from_model(model: email_histories::Model) -> anyhow::Result<EmailHistoryRecord> {
    let kind = model
        .kind
        .parse::<EmailKind>()
        .map_err(|e| anyhow!("email_histories.kind: {e}"))?;
    let status = model
        .status
        .parse::<EmailStatus>()
        .map_err(|e| anyhow!("email_histories.status: {e}"))?;
    Ok(EmailHistoryRecord {
        id: model.id,
        user_id: model.user_id,
        kind,
        recipient_email: model.recipient_email,
        recipient_name: model.recipient_name,
        subject: model.subject,
        body: model.body,
        status,
        error_message: model.error_message,
        batch_id: model.batch_id,
        sent_at: model.sent_at,
        created_at: model.created_at,
    })
}
