use crate::models::db_operations::{content_db_operations, leads_db_operations, users_db_operations};
use crate::models::{AdminUser, BlogComment, CollegeDetails, CollegeReview, Lead, PgListing};
use crate::DbPool;
use actix_web::web;
use redb::Database;
use rusqlite::Connection;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdminHelperError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Content database error: {0}")]
    ContentDatabase(#[from] content_db_operations::DbError),
    #[error("R2D2 Pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("Item not found")]
    NotFound,
}

#[derive(Serialize)]
pub struct Settings {
    pub max_file_upload_size_mb: String,
    pub allowed_mime_types: String,
    pub contact_email: String,
}

fn get_conn(pool: &web::Data<DbPool>) -> Result<r2d2::PooledConnection<r2d2_sqlite::SqliteConnectionManager>, AdminHelperError> {
    pool.get().map_err(AdminHelperError::Pool)
}

// This function takes a direct connection because it is also used during
// server startup before the pool lands in Actix's app_data.
pub fn get_settings(conn: &Connection) -> Settings {
    let max_size = users_db_operations::read_setting(conn, "max_file_upload_size_mb")
        .unwrap_or_else(|| "10".to_string());

    let mime_types = users_db_operations::read_setting(conn, "allowed_mime_types")
        .unwrap_or_else(|| "".to_string()); // Secure default

    let contact_email = users_db_operations::read_setting(conn, "contact_email")
        .unwrap_or_else(|| "".to_string());

    Settings {
        max_file_upload_size_mb: max_size,
        allowed_mime_types: mime_types,
        contact_email,
    }
}

pub fn update_setting(pool: &web::Data<DbPool>, key: &str, value: &str) -> Result<(), AdminHelperError> {
    let conn = get_conn(pool)?;
    users_db_operations::update_setting(&conn, key, value)?;
    Ok(())
}

pub fn fetch_all_admins(pool: &web::Data<DbPool>) -> Result<Vec<AdminUser>, AdminHelperError> {
    let conn = get_conn(pool)?;
    Ok(users_db_operations::read_all_users(&conn)?)
}

// --- College management ---

pub fn create_college(db: &web::Data<Database>, details: &CollegeDetails) -> Result<String, AdminHelperError> {
    Ok(content_db_operations::create_college(db, details)?)
}

pub fn update_college(db: &web::Data<Database>, id: &str, details: &CollegeDetails) -> Result<(), AdminHelperError> {
    Ok(content_db_operations::update_college(db, id, details)?)
}

pub fn delete_college(db: &web::Data<Database>, id: &str) -> Result<(), AdminHelperError> {
    Ok(content_db_operations::delete_college(db, id)?)
}

// --- Lead-side moderation ---

pub fn fetch_leads(pool: &web::Data<DbPool>, limit: u32, offset: u32) -> Result<Vec<Lead>, AdminHelperError> {
    let conn = get_conn(pool)?;
    Ok(leads_db_operations::read_leads(&conn, limit, offset)?)
}

pub fn fetch_pg_enquiries(
    pool: &web::Data<DbPool>,
    limit: u32,
    offset: u32,
) -> Result<Vec<crate::models::PgEnquiry>, AdminHelperError> {
    let conn = get_conn(pool)?;
    Ok(leads_db_operations::read_pg_enquiries(&conn, limit, offset)?)
}

pub fn fetch_counseling_bookings(
    pool: &web::Data<DbPool>,
    limit: u32,
    offset: u32,
) -> Result<Vec<crate::models::CounselingBooking>, AdminHelperError> {
    let conn = get_conn(pool)?;
    Ok(leads_db_operations::read_counseling_bookings(&conn, limit, offset)?)
}

pub fn fetch_pending_reviews(pool: &web::Data<DbPool>) -> Result<Vec<CollegeReview>, AdminHelperError> {
    let conn = get_conn(pool)?;
    Ok(leads_db_operations::read_pending_reviews(&conn)?)
}

pub fn approve_review(pool: &web::Data<DbPool>, id: i64) -> Result<usize, AdminHelperError> {
    let conn = get_conn(pool)?;
    Ok(leads_db_operations::approve_review(&conn, id)?)
}

pub fn delete_review(pool: &web::Data<DbPool>, id: i64) -> Result<usize, AdminHelperError> {
    let conn = get_conn(pool)?;
    Ok(leads_db_operations::delete_review(&conn, id)?)
}

pub fn fetch_pending_comments(pool: &web::Data<DbPool>) -> Result<Vec<BlogComment>, AdminHelperError> {
    let conn = get_conn(pool)?;
    Ok(leads_db_operations::read_pending_comments(&conn)?)
}

pub fn approve_comment(pool: &web::Data<DbPool>, id: i64) -> Result<usize, AdminHelperError> {
    let conn = get_conn(pool)?;
    Ok(leads_db_operations::approve_comment(&conn, id)?)
}

pub fn delete_comment(pool: &web::Data<DbPool>, id: i64) -> Result<usize, AdminHelperError> {
    let conn = get_conn(pool)?;
    Ok(leads_db_operations::delete_comment(&conn, id)?)
}

pub fn fetch_pending_pg_listings(pool: &web::Data<DbPool>) -> Result<Vec<PgListing>, AdminHelperError> {
    let conn = get_conn(pool)?;
    Ok(leads_db_operations::read_pending_pg_listings(&conn)?)
}

pub fn approve_pg_listing(pool: &web::Data<DbPool>, id: i64) -> Result<usize, AdminHelperError> {
    let conn = get_conn(pool)?;
    Ok(leads_db_operations::approve_pg_listing(&conn, id)?)
}

pub fn delete_pg_listing(pool: &web::Data<DbPool>, id: i64) -> Result<usize, AdminHelperError> {
    let conn = get_conn(pool)?;
    Ok(leads_db_operations::delete_pg_listing(&conn, id)?)
}

pub fn approve_success_story(pool: &web::Data<DbPool>, id: i64) -> Result<usize, AdminHelperError> {
    let conn = get_conn(pool)?;
    Ok(leads_db_operations::approve_success_story(&conn, id)?)
}

pub fn fetch_pending_success_stories(
    pool: &web::Data<DbPool>,
) -> Result<Vec<crate::models::SuccessStory>, AdminHelperError> {
    let conn = get_conn(pool)?;
    Ok(leads_db_operations::read_pending_success_stories(&conn)?)
}

// --- Brochure upload ---

fn mime_to_safe_extension(mime: &str) -> Option<&'static str> {
    match mime {
        "application/pdf" => Some("pdf"),
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Streams an uploaded brochure/image into the media directory and returns
/// its public URL. MIME allowlist and size cap come from the settings table;
/// an empty allowlist disables uploads entirely.
pub async fn save_brochure_file(
    config: web::Data<crate::config::Config>,
    pool: web::Data<DbPool>,
    mut payload: actix_multipart::Multipart,
) -> Result<String, Box<dyn std::error::Error>> {
    use futures_util::StreamExt;
    use std::collections::HashSet;
    use std::fs;
    use std::io::Write;
    use std::path::PathBuf;
    use uuid::Uuid;

    let conn = pool.get()?;

    let max_file_size_mb = users_db_operations::read_setting(&conn, "max_file_upload_size_mb")
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(10);
    let max_file_size_bytes = max_file_size_mb * 1024 * 1024;

    let allowed_mime_types_str = users_db_operations::read_setting(&conn, "allowed_mime_types")
        .unwrap_or_else(|| "".to_string());

    // Empty allowlist means uploads are off. This is a secure default.
    if allowed_mime_types_str.is_empty() {
        return Err("File uploads are currently disabled. No MIME types are configured.".into());
    }

    let allowed_mime_types: HashSet<String> = allowed_mime_types_str
        .split(',')
        .map(|s| s.trim().to_string())
        .collect();

    let file_id = Uuid::new_v4().to_string();
    let mut file_size: u64 = 0;

    while let Some(item) = payload.next().await {
        let mut field = item?;
        let field_name = field.content_disposition().get_name().unwrap_or_default().to_string();

        if field_name != "file" {
            continue;
        }

        let content_type = field.content_type().ok_or("Content-Type not available.")?;
        let content_type_str = content_type.to_string();

        if !allowed_mime_types.contains(&content_type_str) {
            return Err(format!(
                "Unsupported file type: '{}'. Please upload one of the allowed types.",
                content_type_str
            )
            .into());
        }

        let file_ext = match mime_to_safe_extension(&content_type_str) {
            Some(ext) => ext,
            None => {
                log::error!(
                    "Admin configured allowed MIME type '{}' which has no safe extension mapping.",
                    content_type_str
                );
                return Err("An internal server configuration error occurred.".into());
            }
        };

        let dir1 = &file_id[0..2];
        let dir2 = &file_id[2..4];
        let new_filename = format!("{}.{}", &file_id, file_ext);
        let dir_path = PathBuf::from(&config.media_path)
            .join("brochures")
            .join(dir1)
            .join(dir2);

        web::block({
            let dir_path = dir_path.clone();
            move || fs::create_dir_all(&dir_path)
        })
        .await??;

        let final_path = dir_path.join(&new_filename);
        let mut f = web::block({
            let final_path = final_path.clone();
            move || fs::File::create(final_path)
        })
        .await??;

        while let Some(chunk) = field.next().await {
            let data = chunk?;
            file_size += data.len() as u64;
            if file_size > max_file_size_bytes {
                drop(f);
                let _ = fs::remove_file(&final_path);
                return Err(format!("File is too large. Maximum size is {}MB.", max_file_size_mb).into());
            }
            f = web::block(move || f.write_all(&data).map(|_| f)).await??;
        }

        let public_url = format!("/media/brochures/{}/{}/{}", dir1, dir2, new_filename);
        return Ok(public_url.replace('\\', "/"));
    }

    Err("No file was uploaded.".into())
}
