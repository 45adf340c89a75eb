use crate::models::{
    BlogComment, CollegeReview, CounselingBooking, Lead, PgEnquiry, PgListing, SuccessStory,
};
use chrono::Utc;
use rusqlite::{params, Connection, Error as RusqliteError};

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

// ====================================================================
// ============================ LEADS =================================
// ====================================================================

pub fn insert_lead(
    conn: &Connection,
    name: &str,
    email: &str,
    phone: &str,
    source: &str,
    college_interest: Option<&str>,
    message: Option<&str>,
) -> Result<i64, RusqliteError> {
    conn.execute(
        "INSERT INTO leads (name, email, phone, source, college_interest, message, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![name, email, phone, source, college_interest, message, now_rfc3339()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn read_leads(conn: &Connection, limit: u32, offset: u32) -> Result<Vec<Lead>, RusqliteError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, email, phone, source, college_interest, message, created_at
         FROM leads ORDER BY id DESC LIMIT ?1 OFFSET ?2",
    )?;
    let rows = stmt.query_map(params![limit, offset], |row| {
        Ok(Lead {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            phone: row.get(3)?,
            source: row.get(4)?,
            college_interest: row.get(5)?,
            message: row.get(6)?,
            created_at: row.get(7)?,
        })
    })?;
    Ok(rows.filter_map(|r| r.ok()).collect())
}

// ====================================================================
// =========================== PG LISTINGS ============================
// ====================================================================

/// New listings always start unapproved; an admin flips the flag. Rows
/// imported without an explicit approval never count as approved.
pub fn insert_pg_listing(
    conn: &Connection,
    title: &str,
    locality: &str,
    rent_per_month: i64,
    gender: Option<&str>,
    amenities: Option<&str>,
    contact_phone: &str,
) -> Result<i64, RusqliteError> {
    conn.execute(
        "INSERT INTO pg_listings (title, locality, rent_per_month, gender, amenities, contact_phone, approved, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)",
        params![title, locality, rent_per_month, gender, amenities, contact_phone, now_rfc3339()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn read_approved_pg_listings(
    conn: &Connection,
    locality_filter: Option<&str>,
    limit: u32,
    offset: u32,
) -> Result<Vec<PgListing>, RusqliteError> {
    let mut stmt = conn.prepare(
        "SELECT id, title, locality, rent_per_month, gender, amenities, contact_phone, approved, created_at
         FROM pg_listings
         WHERE approved = 1 AND (?1 IS NULL OR locality LIKE ?1)
         ORDER BY id DESC LIMIT ?2 OFFSET ?3",
    )?;
    let pattern = locality_filter.map(|l| format!("%{}%", l));
    let rows = stmt.query_map(params![pattern, limit, offset], map_pg_listing)?;
    Ok(rows.filter_map(|r| r.ok()).collect())
}

pub fn read_pending_pg_listings(conn: &Connection) -> Result<Vec<PgListing>, RusqliteError> {
    let mut stmt = conn.prepare(
        "SELECT id, title, locality, rent_per_month, gender, amenities, contact_phone, approved, created_at
         FROM pg_listings WHERE approved = 0 ORDER BY id DESC",
    )?;
    let rows = stmt.query_map([], map_pg_listing)?;
    Ok(rows.filter_map(|r| r.ok()).collect())
}

fn map_pg_listing(row: &rusqlite::Row<'_>) -> Result<PgListing, RusqliteError> {
    Ok(PgListing {
        id: row.get(0)?,
        title: row.get(1)?,
        locality: row.get(2)?,
        rent_per_month: row.get(3)?,
        gender: row.get(4)?,
        amenities: row.get(5)?,
        contact_phone: row.get(6)?,
        approved: row.get(7)?,
        created_at: row.get(8)?,
    })
}

pub fn approve_pg_listing(conn: &Connection, id: i64) -> Result<usize, RusqliteError> {
    conn.execute("UPDATE pg_listings SET approved = 1 WHERE id = ?1", [id])
}

pub fn delete_pg_listing(conn: &Connection, id: i64) -> Result<usize, RusqliteError> {
    conn.execute("DELETE FROM pg_listings WHERE id = ?1", [id])
}

pub fn insert_pg_enquiry(
    conn: &Connection,
    listing_id: i64,
    name: &str,
    phone: &str,
) -> Result<i64, RusqliteError> {
    conn.execute(
        "INSERT INTO pg_enquiries (listing_id, name, phone, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![listing_id, name, phone, now_rfc3339()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn read_pg_enquiries(conn: &Connection, limit: u32, offset: u32) -> Result<Vec<PgEnquiry>, RusqliteError> {
    let mut stmt = conn.prepare(
        "SELECT id, listing_id, name, phone, created_at
         FROM pg_enquiries ORDER BY id DESC LIMIT ?1 OFFSET ?2",
    )?;
    let rows = stmt.query_map(params![limit, offset], |row| {
        Ok(PgEnquiry {
            id: row.get(0)?,
            listing_id: row.get(1)?,
            name: row.get(2)?,
            phone: row.get(3)?,
            created_at: row.get(4)?,
        })
    })?;
    Ok(rows.filter_map(|r| r.ok()).collect())
}

// ====================================================================
// ======================= COUNSELING BOOKINGS ========================
// ====================================================================

pub fn insert_counseling_booking(
    conn: &Connection,
    name: &str,
    phone: &str,
    email: &str,
    preferred_slot: Option<&str>,
) -> Result<i64, RusqliteError> {
    conn.execute(
        "INSERT INTO counseling_bookings (name, phone, email, preferred_slot, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![name, phone, email, preferred_slot, now_rfc3339()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn read_counseling_bookings(
    conn: &Connection,
    limit: u32,
    offset: u32,
) -> Result<Vec<CounselingBooking>, RusqliteError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, phone, email, preferred_slot, created_at
         FROM counseling_bookings ORDER BY id DESC LIMIT ?1 OFFSET ?2",
    )?;
    let rows = stmt.query_map(params![limit, offset], |row| {
        Ok(CounselingBooking {
            id: row.get(0)?,
            name: row.get(1)?,
            phone: row.get(2)?,
            email: row.get(3)?,
            preferred_slot: row.get(4)?,
            created_at: row.get(5)?,
        })
    })?;
    Ok(rows.filter_map(|r| r.ok()).collect())
}

// ====================================================================
// ======================== COLLEGE REVIEWS ===========================
// ====================================================================

pub fn insert_college_review(
    conn: &Connection,
    college_id: &str,
    author_name: &str,
    rating: u8,
    body: &str,
) -> Result<i64, RusqliteError> {
    conn.execute(
        "INSERT INTO college_reviews (college_id, author_name, rating, body, approved, created_at)
         VALUES (?1, ?2, ?3, ?4, 0, ?5)",
        params![college_id, author_name, rating, body, now_rfc3339()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn read_approved_reviews_for_college(
    conn: &Connection,
    college_id: &str,
) -> Result<Vec<CollegeReview>, RusqliteError> {
    let mut stmt = conn.prepare(
        "SELECT id, college_id, author_name, rating, body, approved, created_at
         FROM college_reviews WHERE college_id = ?1 AND approved = 1 ORDER BY id DESC",
    )?;
    let rows = stmt.query_map([college_id], map_review)?;
    Ok(rows.filter_map(|r| r.ok()).collect())
}

pub fn read_pending_reviews(conn: &Connection) -> Result<Vec<CollegeReview>, RusqliteError> {
    let mut stmt = conn.prepare(
        "SELECT id, college_id, author_name, rating, body, approved, created_at
         FROM college_reviews WHERE approved = 0 ORDER BY id DESC",
    )?;
    let rows = stmt.query_map([], map_review)?;
    Ok(rows.filter_map(|r| r.ok()).collect())
}

fn map_review(row: &rusqlite::Row<'_>) -> Result<CollegeReview, RusqliteError> {
    Ok(CollegeReview {
        id: row.get(0)?,
        college_id: row.get(1)?,
        author_name: row.get(2)?,
        rating: row.get(3)?,
        body: row.get(4)?,
        approved: row.get(5)?,
        created_at: row.get(6)?,
    })
}

pub fn approve_review(conn: &Connection, id: i64) -> Result<usize, RusqliteError> {
    conn.execute("UPDATE college_reviews SET approved = 1 WHERE id = ?1", [id])
}

pub fn delete_review(conn: &Connection, id: i64) -> Result<usize, RusqliteError> {
    conn.execute("DELETE FROM college_reviews WHERE id = ?1", [id])
}

// ====================================================================
// ========================= BLOG COMMENTS ============================
// ====================================================================

pub fn insert_blog_comment(
    conn: &Connection,
    blog_id: &str,
    author_name: &str,
    body: &str,
) -> Result<i64, RusqliteError> {
    conn.execute(
        "INSERT INTO blog_comments (blog_id, author_name, body, approved, created_at)
         VALUES (?1, ?2, ?3, 0, ?4)",
        params![blog_id, author_name, body, now_rfc3339()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn read_approved_comments_for_blog(
    conn: &Connection,
    blog_id: &str,
) -> Result<Vec<BlogComment>, RusqliteError> {
    let mut stmt = conn.prepare(
        "SELECT id, blog_id, author_name, body, approved, created_at
         FROM blog_comments WHERE blog_id = ?1 AND approved = 1 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([blog_id], map_comment)?;
    Ok(rows.filter_map(|r| r.ok()).collect())
}

pub fn read_pending_comments(conn: &Connection) -> Result<Vec<BlogComment>, RusqliteError> {
    let mut stmt = conn.prepare(
        "SELECT id, blog_id, author_name, body, approved, created_at
         FROM blog_comments WHERE approved = 0 ORDER BY id DESC",
    )?;
    let rows = stmt.query_map([], map_comment)?;
    Ok(rows.filter_map(|r| r.ok()).collect())
}

fn map_comment(row: &rusqlite::Row<'_>) -> Result<BlogComment, RusqliteError> {
    Ok(BlogComment {
        id: row.get(0)?,
        blog_id: row.get(1)?,
        author_name: row.get(2)?,
        body: row.get(3)?,
        approved: row.get(4)?,
        created_at: row.get(5)?,
    })
}

pub fn approve_comment(conn: &Connection, id: i64) -> Result<usize, RusqliteError> {
    conn.execute("UPDATE blog_comments SET approved = 1 WHERE id = ?1", [id])
}

pub fn delete_comment(conn: &Connection, id: i64) -> Result<usize, RusqliteError> {
    conn.execute("DELETE FROM blog_comments WHERE id = ?1", [id])
}

// ====================================================================
// ======================== SUCCESS STORIES ===========================
// ====================================================================

pub fn insert_success_story(
    conn: &Connection,
    student_name: &str,
    college_name: &str,
    batch_year: Option<&str>,
    story: &str,
) -> Result<i64, RusqliteError> {
    conn.execute(
        "INSERT INTO success_stories (student_name, college_name, batch_year, story, approved, created_at)
         VALUES (?1, ?2, ?3, ?4, 0, ?5)",
        params![student_name, college_name, batch_year, story, now_rfc3339()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn read_approved_success_stories(
    conn: &Connection,
    limit: u32,
    offset: u32,
) -> Result<Vec<SuccessStory>, RusqliteError> {
    let mut stmt = conn.prepare(
        "SELECT id, student_name, college_name, batch_year, story, approved, created_at
         FROM success_stories WHERE approved = 1 ORDER BY id DESC LIMIT ?1 OFFSET ?2",
    )?;
    let rows = stmt.query_map(params![limit, offset], map_story)?;
    Ok(rows.filter_map(|r| r.ok()).collect())
}

pub fn read_pending_success_stories(conn: &Connection) -> Result<Vec<SuccessStory>, RusqliteError> {
    let mut stmt = conn.prepare(
        "SELECT id, student_name, college_name, batch_year, story, approved, created_at
         FROM success_stories WHERE approved = 0 ORDER BY id DESC",
    )?;
    let rows = stmt.query_map([], map_story)?;
    Ok(rows.filter_map(|r| r.ok()).collect())
}

fn map_story(row: &rusqlite::Row<'_>) -> Result<SuccessStory, RusqliteError> {
    Ok(SuccessStory {
        id: row.get(0)?,
        student_name: row.get(1)?,
        college_name: row.get(2)?,
        batch_year: row.get(3)?,
        story: row.get(4)?,
        approved: row.get(5)?,
        created_at: row.get(6)?,
    })
}

pub fn approve_success_story(conn: &Connection, id: i64) -> Result<usize, RusqliteError> {
    conn.execute("UPDATE success_stories SET approved = 1 WHERE id = ?1", [id])
}

pub fn delete_success_story(conn: &Connection, id: i64) -> Result<usize, RusqliteError> {
    conn.execute("DELETE FROM success_stories WHERE id = ?1", [id])
}
