use crate::error::ApiError;
use crate::helper::token_helpers::TokenIssuer;
use crate::models::Role;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{dev, web, FromRequest, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

/// The caller behind a valid bearer token. Taking this as a handler argument
/// is what makes a route require authentication.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub role: Role,
}

impl AuthenticatedUser {
    pub fn require_role(&self, role: Role, action: &str) -> Result<(), ApiError> {
        if self.role == role {
            Ok(())
        } else {
            log::warn!("User {} ({}) tried to {} without the {} role.", self.id, self.role, action, role);
            Err(ApiError::Forbidden(format!("Only a {} can {}.", role, action)))
        }
    }
}

fn bearer_token(req: &HttpRequest) -> Result<&str, ApiError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthenticated("Missing Authorization header".to_string()))?;
    let value = header
        .to_str()
        .map_err(|_| ApiError::Unauthenticated("Malformed Authorization header".to_string()))?;

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(ApiError::Unauthenticated("Authorization header must use the Bearer scheme".to_string())),
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, ApiError> {
    let issuer = req
        .app_data::<web::Data<TokenIssuer>>()
        .ok_or_else(|| ApiError::Internal("TokenIssuer is not registered as app data".to_string()))?;

    let claims = issuer.verify(bearer_token(req)?)?;
    let id = Uuid::parse_str(&claims.sub)
        .map_err(|_| ApiError::Unauthenticated("Invalid token".to_string()))?;

    Ok(AuthenticatedUser { id, role: claims.role })
}

impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        ready(authenticate(req))
    }
}
