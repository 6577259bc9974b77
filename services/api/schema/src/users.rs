use sea_orm::entity::prelude::*;

/// Account record. `password_hash` is empty for Google-only accounts.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub deleted_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::gmail_credentials::Entity")]
    GmailCredential,
    #[sea_orm(has_many = "super::email_histories::Entity")]
    EmailHistories,
}

impl Related<super::gmail_credentials::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GmailCredential.def()
    }
}

impl Related<super::email_histories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EmailHistories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
