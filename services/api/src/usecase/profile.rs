use uuid::Uuid;

use crate::domain::repository::{GmailCredentialRepository, UserRepository};
use crate::domain::types::{GmailCredential, User};
use crate::error::ApiError;

#[derive(Debug)]
pub struct ProfileOutput {
    pub user: User,
    pub credential: Option<GmailCredential>,
}

pub struct GetProfileUseCase<U: UserRepository, C: GmailCredentialRepository> {
    pub users: U,
    pub credentials: C,
}

impl<U: UserRepository, C: GmailCredentialRepository> GetProfileUseCase<U, C> {
    pub async fn execute(&self, user_id: Uuid) -> Result<ProfileOutput, ApiError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(ApiError::UserNotFound)?;
        let credential = self.credentials.find_by_user(user_id).await?;
        Ok(ProfileOutput { user, credential })
    }
}
