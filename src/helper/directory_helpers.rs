use crate::error::ApiError;
use crate::models::db_operations::users_db_operations;
use crate::models::{Profile, Role, User, UserSummary};
use crate::DbPool;
use actix_web::web;
use uuid::Uuid;

/// The one capability check behind every assignment target: the id must
/// resolve to a user, and that user must hold `expected_role`.
pub fn resolve_user_with_role(pool: &web::Data<DbPool>, user_id: Uuid, expected_role: Role) -> Result<User, ApiError> {
    let conn = pool.get()?;
    let user = users_db_operations::read_user_by_id(&conn, user_id)?
        .ok_or_else(|| ApiError::NotFound(format!("{} not found", capitalize(expected_role.as_str()))))?;

    if user.role != expected_role {
        log::warn!("User {} was offered as a {} but holds the {} role.", user_id, expected_role, user.role);
        return Err(ApiError::InvalidTarget(format!("User {} is not a {}.", user_id, expected_role)));
    }
    Ok(user)
}

pub fn list_users_with_role(pool: &web::Data<DbPool>, role: Role) -> Result<Vec<UserSummary>, ApiError> {
    let conn = pool.get()?;
    Ok(users_db_operations::list_users_by_role(&conn, role)?)
}

pub fn get_profile(pool: &web::Data<DbPool>, user_id: Uuid) -> Result<Profile, ApiError> {
    let conn = pool.get()?;
    users_db_operations::read_user_by_id(&conn, user_id)?
        .map(|user| user.profile())
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
