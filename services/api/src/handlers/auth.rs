use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};

use crate::domain::types::UserView;
use crate::error::ApiError;
use crate::state::AppState;
use crate::usecase::auth::{
    GoogleCallbackInput, GoogleCallbackUseCase, GoogleSignInUseCase, GoogleToken, LoginInput,
    LoginUseCase, RegisterInput, RegisterUseCase, SessionOutput,
};

#[derive(Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserView,
}

impl From<SessionOutput> for SessionResponse {
    fn from(out: SessionOutput) -> Self {
        Self {
            user: UserView::new(&out.user, out.credential.as_ref()),
            token: out.token,
        }
    }
}

// ── POST /api/auth/register ──────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = RegisterUseCase {
        users: state.user_repo(),
        hasher: state.password_hasher(),
        jwt_secret: state.jwt_secret.clone(),
    };
    let out = usecase
        .execute(RegisterInput {
            name: body.name,
            email: body.email,
            password: body.password,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(SessionResponse::from(out))))
}

// ── POST /api/auth/login ─────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = LoginUseCase {
        users: state.user_repo(),
        hasher: state.password_hasher(),
        jwt_secret: state.jwt_secret.clone(),
    };
    let out = usecase
        .execute(LoginInput {
            email: body.email,
            password: body.password,
        })
        .await?;
    Ok(Json(SessionResponse::from(out)))
}

// ── POST /api/auth/google ────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct GoogleSignInRequest {
    pub credential: Option<String>,
    /// Older clients send the ID token under this name.
    pub id_token: Option<String>,
    pub access_token: Option<String>,
}

pub async fn google_sign_in(
    State(state): State<AppState>,
    Json(body): Json<GoogleSignInRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let token = GoogleToken::from_parts(body.credential.or(body.id_token), body.access_token)?;
    let usecase = GoogleSignInUseCase {
        users: state.user_repo(),
        google: state.google_oauth(),
        jwt_secret: state.jwt_secret.clone(),
    };
    let out = usecase.execute(token).await?;
    Ok(Json(SessionResponse::from(out)))
}

// ── POST /api/auth/google/callback ───────────────────────────────────────────

#[derive(Deserialize)]
pub struct GoogleCallbackRequest {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub scope: String,
}

#[derive(Serialize)]
pub struct GoogleCallbackResponse {
    pub token: String,
    pub user: UserView,
    pub message: &'static str,
    pub gmail_connected: bool,
}

pub async fn google_callback(
    State(state): State<AppState>,
    Json(body): Json<GoogleCallbackRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = GoogleCallbackUseCase {
        users: state.user_repo(),
        credentials: state.gmail_credential_repo(),
        google: state.google_oauth(),
        jwt_secret: state.jwt_secret.clone(),
    };
    let out = usecase
        .execute(GoogleCallbackInput {
            code: body.code,
            scope: body.scope,
        })
        .await?;
    let session = SessionResponse::from(out);
    Ok(Json(GoogleCallbackResponse {
        token: session.token,
        user: session.user,
        message: "Gmail authentication and connection successful",
        gmail_connected: true,
    }))
}
