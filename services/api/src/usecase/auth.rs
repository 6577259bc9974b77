use chrono::{Duration, Utc};

use courier_auth_types::token::issue_token;
use courier_domain::email::{is_valid_email, local_part};

use crate::domain::repository::{
    GmailCredentialRepository, GoogleOAuthPort, PasswordHasher, UserRepository,
};
use crate::domain::types::{GmailCredential, GmailGrant, GoogleProfile, User};
use crate::error::ApiError;

/// Shortest accepted password.
pub const MIN_PASSWORD_LEN: usize = 6;

/// A signed session for a user.
#[derive(Debug)]
pub struct SessionOutput {
    pub token: String,
    pub user: User,
    /// Set only by the Google callback, which links Gmail in the same step.
    pub credential: Option<GmailCredential>,
}

fn issue_session(user: User, secret: &str) -> Result<SessionOutput, ApiError> {
    let token =
        issue_token(user.id, &user.email, secret).map_err(|e| ApiError::Internal(e.into()))?;
    Ok(SessionOutput {
        token,
        user,
        credential: None,
    })
}

/// Look up a user by email, creating an OAuth-only account on first sight.
async fn find_or_create_user<U: UserRepository>(
    users: &U,
    profile: &GoogleProfile,
) -> Result<User, ApiError> {
    if let Some(user) = users.find_by_email(&profile.email).await? {
        return Ok(user);
    }

    let name = if profile.name.trim().is_empty() {
        local_part(&profile.email).to_owned()
    } else {
        profile.name.clone()
    };
    let user = User::new(profile.email.clone(), name, String::new());
    match users.create(&user).await {
        Ok(()) => {
            tracing::info!(user_id = %user.id, "created account from google profile");
            Ok(user)
        }
        // Lost a race with a concurrent sign-in for the same email.
        Err(ApiError::UserAlreadyExists) => users
            .find_by_email(&profile.email)
            .await?
            .ok_or(ApiError::UserNotFound),
        Err(e) => Err(e),
    }
}

// ── Register ─────────────────────────────────────────────────────────────────

pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

pub struct RegisterUseCase<U: UserRepository, P: PasswordHasher> {
    pub users: U,
    pub hasher: P,
    pub jwt_secret: String,
}

impl<U: UserRepository, P: PasswordHasher> RegisterUseCase<U, P> {
    pub async fn execute(&self, input: RegisterInput) -> Result<SessionOutput, ApiError> {
        let name = input.name.trim();
        let email = input.email.trim();
        if name.is_empty() {
            return Err(ApiError::InvalidInput("name is required".to_owned()));
        }
        if !is_valid_email(email) {
            return Err(ApiError::InvalidInput("email must be a valid email".to_owned()));
        }
        if input.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::InvalidInput(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        if self.users.find_by_email(email).await?.is_some() {
            return Err(ApiError::UserAlreadyExists);
        }

        let hash = self.hasher.hash(&input.password)?;
        let user = User::new(email.to_owned(), name.to_owned(), hash);
        self.users.create(&user).await?;
        tracing::info!(user_id = %user.id, "registered account");

        issue_session(user, &self.jwt_secret)
    }
}

// ── Login ────────────────────────────────────────────────────────────────────

pub struct LoginInput {
    pub email: String,
    pub password: String,
}

pub struct LoginUseCase<U: UserRepository, P: PasswordHasher> {
    pub users: U,
    pub hasher: P,
    pub jwt_secret: String,
}

impl<U: UserRepository, P: PasswordHasher> LoginUseCase<U, P> {
    pub async fn execute(&self, input: LoginInput) -> Result<SessionOutput, ApiError> {
        let user = self
            .users
            .find_by_email(input.email.trim())
            .await?
            .ok_or(ApiError::InvalidCredentials)?;

        // Google-only accounts have no password to check against.
        if !user.has_password() || !self.hasher.verify(&input.password, &user.password_hash)? {
            return Err(ApiError::InvalidCredentials);
        }

        issue_session(user, &self.jwt_secret)
    }
}

// ── Google sign-in ───────────────────────────────────────────────────────────

/// Token presented by the browser's Google sign-in flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoogleToken {
    /// OAuth access token, resolved through the userinfo endpoint.
    AccessToken(String),
    /// ID token (the `credential` of Google Identity Services).
    IdToken(String),
}

impl GoogleToken {
    /// Pick the presented token. The access token wins when both are sent.
    pub fn from_parts(
        credential: Option<String>,
        access_token: Option<String>,
    ) -> Result<Self, ApiError> {
        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        match (present(access_token), present(credential)) {
            (Some(access_token), _) => Ok(Self::AccessToken(access_token)),
            (None, Some(id_token)) => Ok(Self::IdToken(id_token)),
            (None, None) => Err(ApiError::MissingGoogleToken),
        }
    }
}

pub struct GoogleSignInUseCase<U: UserRepository, G: GoogleOAuthPort> {
    pub users: U,
    pub google: G,
    pub jwt_secret: String,
}

impl<U: UserRepository, G: GoogleOAuthPort> GoogleSignInUseCase<U, G> {
    pub async fn execute(&self, token: GoogleToken) -> Result<SessionOutput, ApiError> {
        let profile = match &token {
            GoogleToken::AccessToken(t) => self.google.userinfo(t).await?,
            GoogleToken::IdToken(t) => self.google.verify_id_token(t).await?,
        };
        let user = find_or_create_user(&self.users, &profile).await?;
        issue_session(user, &self.jwt_secret)
    }
}

// ── Google callback ──────────────────────────────────────────────────────────

pub struct GoogleCallbackInput {
    pub code: String,
    pub scope: String,
}

/// Exchange an authorization code, sign the user in and link Gmail in one step.
pub struct GoogleCallbackUseCase<U, C, G>
where
    U: UserRepository,
    C: GmailCredentialRepository,
    G: GoogleOAuthPort,
{
    pub users: U,
    pub credentials: C,
    pub google: G,
    pub jwt_secret: String,
}

impl<U, C, G> GoogleCallbackUseCase<U, C, G>
where
    U: UserRepository,
    C: GmailCredentialRepository,
    G: GoogleOAuthPort,
{
    pub async fn execute(&self, input: GoogleCallbackInput) -> Result<SessionOutput, ApiError> {
        let code = input.code.trim();
        if code.is_empty() {
            return Err(ApiError::InvalidInput("code is required".to_owned()));
        }

        let tokens = self.google.exchange_code(code).await?;
        let profile = self.google.userinfo(&tokens.access_token).await?;
        let user = find_or_create_user(&self.users, &profile).await?;

        let grant = GmailGrant {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: tokens.token_type,
            expires_at: Utc::now() + Duration::seconds(tokens.expires_in),
            scope: input.scope,
        };
        let credential = self.credentials.upsert(user.id, &grant).await?;
        tracing::info!(user_id = %user.id, "gmail account linked");

        let mut session = issue_session(user, &self.jwt_secret)?;
        session.credential = Some(credential);
        Ok(session)
    }
}
