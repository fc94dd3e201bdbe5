use crate::error::ApiError;
use crate::helper::token_helpers::TokenIssuer;
use crate::models::db_operations::users_db_operations;
use crate::models::{Profile, Role};
use crate::DbPool;
use actix_web::web;
use serde::{Deserialize, Serialize};

pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: Profile,
}

pub fn validate_signup(request: &SignupRequest) -> Result<(), ApiError> {
    if request.name.trim().is_empty() {
        return Err(ApiError::InvalidInput("Name is mandatory and cannot be empty.".to_string()));
    }
    let email = request.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::InvalidInput("A valid email address is required.".to_string()));
    }
    if request.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::InvalidInput(format!(
            "Password must be at least {} characters long.",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Creates the account. Hashing is CPU-bound, so it runs off the worker thread.
pub async fn signup(pool: &web::Data<DbPool>, request: SignupRequest) -> Result<Profile, ApiError> {
    validate_signup(&request)?;

    let pool = pool.clone();
    let user = web::block(move || -> Result<_, ApiError> {
        let conn = pool.get()?;
        users_db_operations::create_user(&conn, &request.name, &request.email, &request.password, request.role)
            .map_err(|e| {
                if users_db_operations::is_unique_violation(&e) {
                    ApiError::Conflict("An account with this email already exists.".to_string())
                } else {
                    ApiError::from(e)
                }
            })
    })
    .await??;

    log::info!("New {} account created: {}", user.role, user.id);
    Ok(user.profile())
}

pub async fn login(
    pool: &web::Data<DbPool>,
    issuer: &web::Data<TokenIssuer>,
    request: LoginRequest,
) -> Result<LoginResponse, ApiError> {
    let pool = pool.clone();
    let user = web::block(move || -> Result<_, ApiError> {
        let conn = pool.get()?;
        Ok(users_db_operations::verify_credentials(&conn, &request.email, &request.password)?)
    })
    .await??
    .ok_or_else(|| ApiError::Unauthenticated("Invalid email or password.".to_string()))?;

    let token = issuer.issue(&user)?;
    log::info!("User {} logged in.", user.id);
    Ok(LoginResponse {
        token,
        user: user.profile(),
    })
}
