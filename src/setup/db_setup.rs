use redb::{Database, CommitError, StorageError, TableError, TransactionError};
use rusqlite::{Connection, Result as RusqliteResult, Transaction};
use thiserror::Error;

use crate::models::db_operations::content_db_operations::{
    BLOG_CHRONOLOGICAL_INDEX, BLOG_METADATA, BLOG_POSTS, COLLEGES,
};

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Rusqlite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
    #[error("Redb storage error: {0}")]
    RedbStorage(#[from] StorageError),
    #[error("Redb transaction error: {0}")]
    RedbTransaction(#[from] TransactionError),
    #[error("Redb table error: {0}")]
    RedbTable(#[from] TableError),
    #[error("Redb commit error: {0}")]
    RedbCommit(#[from] CommitError),
}

pub fn setup_leads_db(conn: &mut Connection) -> Result<(), SetupError> {
    let tx = conn.transaction()?;

    println!("- Creating 'users' table...");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL CHECK(role IN ('admin')),
            is_active INTEGER NOT NULL DEFAULT 1,
            last_login_time TEXT
        )",
        [],
    )?;

    println!("- Creating 'settings' table...");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;

    println!("- Creating 'leads' table...");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS leads (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            phone TEXT NOT NULL,
            source TEXT NOT NULL,
            college_interest TEXT,
            message TEXT,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    println!("- Creating 'pg_listings' table...");
    // approved defaults to 0: nothing goes live without an explicit admin
    // decision, including legacy imports.
    tx.execute(
        "CREATE TABLE IF NOT EXISTS pg_listings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            locality TEXT NOT NULL,
            rent_per_month INTEGER NOT NULL,
            gender TEXT,
            amenities TEXT,
            contact_phone TEXT NOT NULL,
            approved INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    println!("- Creating 'pg_enquiries' table...");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS pg_enquiries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            listing_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            phone TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY (listing_id) REFERENCES pg_listings(id) ON DELETE CASCADE
        )",
        [],
    )?;

    println!("- Creating 'counseling_bookings' table...");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS counseling_bookings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            phone TEXT NOT NULL,
            email TEXT NOT NULL,
            preferred_slot TEXT,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    println!("- Creating 'college_reviews' table...");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS college_reviews (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            college_id TEXT NOT NULL,
            author_name TEXT NOT NULL,
            rating INTEGER NOT NULL CHECK(rating BETWEEN 1 AND 5),
            body TEXT NOT NULL,
            approved INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    println!("- Creating 'blog_comments' table...");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS blog_comments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            blog_id TEXT NOT NULL,
            author_name TEXT NOT NULL,
            body TEXT NOT NULL,
            approved INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    println!("- Creating 'success_stories' table...");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS success_stories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_name TEXT NOT NULL,
            college_name TEXT NOT NULL,
            batch_year TEXT,
            story TEXT NOT NULL,
            approved INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    println!("- Creating 'submission_flags' table...");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS submission_flags (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;

    seed_initial_settings(&tx)?;

    tx.commit()?;
    Ok(())
}

fn seed_initial_settings(tx: &Transaction) -> RusqliteResult<()> {
    println!("- Seeding initial settings...");
    let default_max_size = "10";
    tx.execute(
        "INSERT OR IGNORE INTO settings (key, value) VALUES ('max_file_upload_size_mb', ?1)",
        [&default_max_size],
    )?;
    println!("  > Default max file upload size set to: {} MB", default_max_size);

    // Secure Default: Start with an empty list. Admin must explicitly add types.
    let default_mime_types = "";
    tx.execute(
        "INSERT OR IGNORE INTO settings (key, value) VALUES ('allowed_mime_types', ?1)",
        [&default_mime_types],
    )?;
    println!("  > Default allowed MIME types set to: (empty - admin must configure)");

    let default_contact_email = "";
    tx.execute(
        "INSERT OR IGNORE INTO settings (key, value) VALUES ('contact_email', ?1)",
        [&default_contact_email],
    )?;
    println!("  > Default contact email set to: (empty - admin must configure)");

    Ok(())
}

pub fn setup_content_db(db: &Database) -> Result<(), SetupError> {
    let write_txn = db.begin_write()?;
    {
        println!("- Creating 'colleges' table in Redb...");
        write_txn.open_table(COLLEGES)?;

        println!("- Creating 'blog_posts' table in Redb...");
        write_txn.open_table(BLOG_POSTS)?;

        println!("- Creating 'blog_metadata' table in Redb...");
        write_txn.open_table(BLOG_METADATA)?;

        println!("- Creating 'blog_chronological_index' table in Redb...");
        write_txn.open_table(BLOG_CHRONOLOGICAL_INDEX)?;
    }
    write_txn.commit()?;
    Ok(())
}
