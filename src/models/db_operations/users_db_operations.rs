use crate::models::AdminUser;
use bcrypt::{hash, verify, BcryptError};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Error as RusqliteError};

fn bcrypt_to_rusqlite_error(e: BcryptError) -> RusqliteError {
    RusqliteError::ToSqlConversionFailure(Box::new(e))
}

pub fn create_user(
    conn: &Connection,
    username: &str,
    password: &str,
    role: &str,
) -> Result<(), RusqliteError> {
    let hashed_password = hash(password, bcrypt::DEFAULT_COST).map_err(bcrypt_to_rusqlite_error)?;
    conn.execute(
        "INSERT INTO users (username, password_hash, role) VALUES (?1, ?2, ?3)",
        params![username, hashed_password, role],
    )?;
    Ok(())
}

pub fn read_all_users(conn: &Connection) -> Result<Vec<AdminUser>, RusqliteError> {
    let mut stmt = conn.prepare(
        "SELECT id, username, role, is_active, last_login_time FROM users ORDER BY id",
    )?;
    let user_iter = stmt.query_map([], |row| {
        Ok(AdminUser {
            id: row.get(0)?,
            username: row.get(1)?,
            role: row.get(2)?,
            is_active: row.get(3)?,
            last_login_time: row.get(4)?,
        })
    })?;

    let users = user_iter.filter_map(|u| u.ok()).collect();
    Ok(users)
}

pub fn update_password(
    conn: &Connection,
    username: &str,
    new_password: &str,
) -> Result<usize, RusqliteError> {
    let hashed_password =
        hash(new_password, bcrypt::DEFAULT_COST).map_err(bcrypt_to_rusqlite_error)?;
    conn.execute(
        "UPDATE users SET password_hash = ?1 WHERE username = ?2",
        params![hashed_password, username],
    )
}

pub fn verify_credentials(
    conn: &Connection,
    username: &str,
    password: &str,
) -> Option<(String, String)> {
    let res: rusqlite::Result<(String, String, bool)> = conn.query_row(
        "SELECT password_hash, role, is_active FROM users WHERE username = ?1",
        [username],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    );

    if let Ok((hash, role, is_active)) = res {
        if is_active && verify(password, &hash).unwrap_or(false) {
            return Some((username.to_string(), role));
        }
    }
    None
}

pub fn update_last_login_time(conn: &Connection, username: &str) -> Result<(), RusqliteError> {
    let now = Utc::now().to_rfc3339();
    conn.execute("UPDATE users SET last_login_time = ?1 WHERE username = ?2", params![now, username])?;
    Ok(())
}

pub fn read_setting(conn: &Connection, key: &str) -> Option<String> {
    conn.query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| row.get(0))
        .optional()
        .unwrap_or(None)
}

pub fn update_setting(conn: &Connection, key: &str, value: &str) -> Result<(), RusqliteError> {
    conn.execute(
        "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
        [key, value],
    )?;
    Ok(())
}
