use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::api::errors::ApiError;
use crate::domain::user::User;
use crate::server::AppState;
use crate::services::{NewUser, UserChanges};

/// Request body for user creation
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for user updates; omitted fields are left unchanged
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Unwraps a JSON body, turning every rejection into a 400
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected request body");
        ApiError::bad_request("Invalid request body")
    })
}

/// Create a user
///
/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let req = json_body(payload)?;

    let user = state
        .users
        .create_user(NewUser {
            id: req.id,
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Get a user by id
///
/// GET /api/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let user = state.users.get_user(&id).await?;
    Ok(Json(user))
}

/// Update a user's email and/or password
///
/// PUT /api/users/:id
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let req = json_body(payload)?;

    let user = state
        .users
        .update_user(
            &id,
            UserChanges {
                email: req.email,
                password: req.password,
            },
        )
        .await?;

    Ok(Json(user))
}

/// Delete a user
///
/// DELETE /api/users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.users.delete_user(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
