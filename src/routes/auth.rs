use crate::error::ApiError;
use crate::helper::auth_helpers::{self, LoginRequest, SignupRequest};
use crate::helper::directory_helpers;
use crate::helper::token_helpers::TokenIssuer;
use crate::middleware::AuthenticatedUser;
use crate::routes::ApiResponse;
use crate::DbPool;
use actix_web::{web, HttpResponse};

pub fn config_auth(cfg: &mut web::ServiceConfig) {
    cfg.route("/signup", web::post().to(handle_signup))
        .route("/login", web::post().to(handle_login))
        .route("/profile", web::get().to(get_profile));
}

async fn handle_signup(pool: web::Data<DbPool>, body: web::Json<SignupRequest>) -> Result<HttpResponse, ApiError> {
    let profile = auth_helpers::signup(&pool, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::with_message(profile, "User registered successfully")))
}

async fn handle_login(
    pool: web::Data<DbPool>,
    issuer: web::Data<TokenIssuer>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let login = auth_helpers::login(&pool, &issuer, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::data(login)))
}

async fn get_profile(user: AuthenticatedUser, pool: web::Data<DbPool>) -> Result<HttpResponse, ApiError> {
    let profile = directory_helpers::get_profile(&pool, user.id)?;
    Ok(HttpResponse::Ok().json(ApiResponse::data(profile)))
}
