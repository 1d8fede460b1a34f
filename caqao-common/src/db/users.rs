//! User queries
//!
//! Users only exist so promoted records can name an owner; there is no
//! authentication here. Callers hash passwords before storing them.

use serde::Serialize;
use sqlx::{Row, SqlitePool};

use crate::{Error, Result};

/// User as stored (password hash omitted)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
}

/// Fields required to create a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
}

/// Insert a user, returning its id.
///
/// A duplicate username or email is reported as [`Error::InvalidInput`].
pub async fn create_user(pool: &SqlitePool, user: &NewUser) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO users (first_name, last_name, email, username, password_hash)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.email)
    .bind(&user.username)
    .bind(&user.password_hash)
    .execute(pool)
    .await
    .map_err(|e| {
        let unique_violation = matches!(
            &e,
            sqlx::Error::Database(db_err) if db_err.is_unique_violation()
        );
        if unique_violation {
            Error::InvalidInput(format!(
                "Username {:?} or email {:?} already registered",
                user.username, user.email
            ))
        } else {
            Error::Database(e)
        }
    })?;

    Ok(result.last_insert_rowid())
}

/// Load a user by id
pub async fn get_user(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(
        "SELECT id, first_name, last_name, email, username FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(|row| -> Result<User> {
        Ok(User {
            id: row.try_get("id")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            email: row.try_get("email")?,
            username: row.try_get("username")?,
        })
    })
    .transpose()
}
