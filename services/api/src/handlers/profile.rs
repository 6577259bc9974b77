use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;

use courier_auth_types::identity::Identity;

use crate::domain::types::UserView;
use crate::error::ApiError;
use crate::state::AppState;
use crate::usecase::profile::GetProfileUseCase;

#[derive(Serialize)]
pub struct ProfileResponse {
    pub user: UserView,
}

// ── GET /api/profile ─────────────────────────────────────────────────────────

pub async fn get_profile(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = GetProfileUseCase {
        users: state.user_repo(),
        credentials: state.gmail_credential_repo(),
    };
    let out = usecase.execute(identity.user_id).await?;
    Ok(Json(ProfileResponse {
        user: UserView::new(&out.user, out.credential.as_ref()),
    }))
}
