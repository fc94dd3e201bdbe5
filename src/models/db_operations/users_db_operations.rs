use crate::models::{Role, User, UserSummary};
use bcrypt::{hash, verify, BcryptError};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Error as RusqliteError, ErrorCode, OptionalExtension, Row};
use uuid::Uuid;

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at";

fn bcrypt_to_rusqlite_error(e: BcryptError) -> RusqliteError {
    RusqliteError::ToSqlConversionFailure(Box::new(e))
}

fn conversion_error<E>(column: usize, e: E) -> RusqliteError
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    RusqliteError::FromSqlConversionFailure(column, Type::Text, e.into())
}

fn row_to_user(row: &Row) -> Result<User, RusqliteError> {
    let id: String = row.get(0)?;
    let role: String = row.get(4)?;
    let created_at: String = row.get(5)?;

    Ok(User {
        id: Uuid::parse_str(&id).map_err(|e| conversion_error(0, e))?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role: role.parse::<Role>().map_err(|e| conversion_error(4, e))?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| conversion_error(5, e))?,
    })
}

/// Emails are compared case-insensitively everywhere.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_unique_violation(e: &RusqliteError) -> bool {
    matches!(e, RusqliteError::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation)
}

pub fn create_user(
    conn: &Connection,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> Result<User, RusqliteError> {
    let hashed_password = hash(password, bcrypt::DEFAULT_COST).map_err(bcrypt_to_rusqlite_error)?;
    let user = User {
        id: Uuid::new_v4(),
        name: name.trim().to_string(),
        email: normalize_email(email),
        password_hash: hashed_password,
        role,
        created_at: Utc::now(),
    };
    conn.execute(
        "INSERT INTO users (id, name, email, password_hash, role, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user.id.to_string(),
            user.name,
            user.email,
            user.password_hash,
            user.role.as_str(),
            user.created_at.to_rfc3339()
        ],
    )?;
    Ok(user)
}

pub fn read_user_by_id(conn: &Connection, user_id: Uuid) -> Result<Option<User>, RusqliteError> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
        [user_id.to_string()],
        row_to_user,
    )
    .optional()
}

pub fn read_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>, RusqliteError> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS),
        [normalize_email(email)],
        row_to_user,
    )
    .optional()
}

pub fn read_all_users(conn: &Connection) -> Result<Vec<User>, RusqliteError> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM users ORDER BY created_at", USER_COLUMNS))?;
    let users = stmt.query_map([], row_to_user)?.collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}

/// Directory listing: id, name and email only.
pub fn list_users_by_role(conn: &Connection, role: Role) -> Result<Vec<UserSummary>, RusqliteError> {
    let mut stmt = conn.prepare("SELECT id, name, email FROM users WHERE role = ?1 ORDER BY name COLLATE NOCASE, email")?;
    let rows = stmt.query_map([role.as_str()], |row| {
        let id: String = row.get(0)?;
        Ok(UserSummary {
            id: Uuid::parse_str(&id).map_err(|e| conversion_error(0, e))?,
            name: row.get(1)?,
            email: row.get(2)?,
        })
    })?;

    let mut users = Vec::new();
    for user in rows {
        users.push(user?);
    }
    Ok(users)
}

/// `Ok(None)` for an unknown email or a wrong password; read failures are
/// returned so callers can tell them apart from bad credentials.
pub fn verify_credentials(conn: &Connection, email: &str, password: &str) -> Result<Option<User>, RusqliteError> {
    let user = match read_user_by_email(conn, email)? {
        Some(user) => user,
        None => return Ok(None),
    };
    match verify(password, &user.password_hash) {
        Ok(true) => Ok(Some(user)),
        Ok(false) => Ok(None),
        Err(e) => {
            log::warn!("Stored password hash for user {} could not be checked: {}", user.id, e);
            Ok(None)
        }
    }
}
