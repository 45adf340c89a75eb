use redb::{Database, ReadableTable, TableDefinition, CommitError, StorageError, TableError, TransactionError};
use crate::models::{BlogMetadata, BlogSummary, College, CollegeDetails, FullBlogPost};
use uuid::Uuid;
use chrono::Utc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Redb storage error: {0}")]
    RedbStorage(#[from] StorageError),
    #[error("Redb transaction error: {0}")]
    RedbTransaction(#[from] TransactionError),
    #[error("Redb table error: {0}")]
    RedbTable(#[from] TableError),
    #[error("Redb commit error: {0}")]
    RedbCommit(#[from] CommitError),
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("UUID parse error: {0}")]
    Uuid(#[from] uuid::Error),
    #[error("Item not found in database: {0}")]
    NotFound(String),
}

// --- Tables for colleges ---
pub const COLLEGES: TableDefinition<&[u8; 16], &str> = TableDefinition::new("colleges");

// --- Tables for blog posts ---
pub const BLOG_POSTS: TableDefinition<&[u8; 16], &str> = TableDefinition::new("blog_posts");
pub const BLOG_METADATA: TableDefinition<&[u8; 16], &str> = TableDefinition::new("blog_metadata");
// Chronological index for efficient "latest posts" listing.
pub const BLOG_CHRONOLOGICAL_INDEX: TableDefinition<(i64, &[u8; 16]), ()> =
    TableDefinition::new("blog_chronological_index");

// ====================================================================
// ======================= COLLEGE OPERATIONS =========================
// ====================================================================

pub fn create_college(db: &Database, details: &CollegeDetails) -> Result<String, DbError> {
    let college_uuid = Uuid::new_v4();
    let record = CollegeDetails {
        created_at: Utc::now(),
        last_updated_at: None,
        ..details.clone()
    };
    let record_json = serde_json::to_string(&record)?;

    let write_txn = db.begin_write()?;
    {
        let mut colleges_table = write_txn.open_table(COLLEGES)?;
        colleges_table.insert(&college_uuid.into_bytes(), record_json.as_str())?;
    }
    write_txn.commit()?;

    Ok(college_uuid.to_string())
}

pub fn read_college(db: &Database, id: &str) -> Option<College> {
    let college_uuid = Uuid::parse_str(id).ok()?;
    let id_bytes = college_uuid.into_bytes();

    let read_txn = db.begin_read().ok()?;
    let colleges_table = read_txn.open_table(COLLEGES).ok()?;

    let guard = colleges_table.get(&id_bytes).ok().flatten()?;
    let details: CollegeDetails = serde_json::from_str(guard.value()).ok()?;
    Some(College {
        id: college_uuid.to_string(),
        details,
    })
}

pub fn update_college(db: &Database, id: &str, details: &CollegeDetails) -> Result<(), DbError> {
    let college_uuid = Uuid::parse_str(id)?;
    let id_bytes = college_uuid.into_bytes();

    let write_txn = db.begin_write()?;
    {
        let mut colleges_table = write_txn.open_table(COLLEGES)?;

        // Preserve the original creation time across edits.
        let old_details: CollegeDetails = {
            let guard = colleges_table
                .get(&id_bytes)?
                .ok_or_else(|| DbError::NotFound(id.to_string()))?;
            serde_json::from_str(guard.value())?
        };

        let new_details = CollegeDetails {
            created_at: old_details.created_at,
            last_updated_at: Some(Utc::now()),
            ..details.clone()
        };
        let new_json = serde_json::to_string(&new_details)?;
        colleges_table.insert(&id_bytes, new_json.as_str())?;
    }
    write_txn.commit()?;
    Ok(())
}

pub fn delete_college(db: &Database, id: &str) -> Result<(), DbError> {
    let college_uuid = Uuid::parse_str(id)?;
    let id_bytes = college_uuid.into_bytes();

    let write_txn = db.begin_write()?;
    {
        let mut colleges_table = write_txn.open_table(COLLEGES)?;
        colleges_table.remove(&id_bytes)?;
    }
    write_txn.commit()?;
    Ok(())
}

/// Full table scan, sorted by name. College counts stay in the hundreds, so
/// an index is not worth its upkeep here.
pub fn read_all_colleges(db: &Database) -> Result<Vec<College>, DbError> {
    let read_txn = db.begin_read()?;
    let colleges_table = read_txn.open_table(COLLEGES)?;

    let mut colleges: Vec<College> = colleges_table
        .iter()?
        .filter_map(|res| res.ok())
        .filter_map(|(id_bytes, details_str)| {
            let college_uuid = Uuid::from_bytes(*id_bytes.value());
            serde_json::from_str::<CollegeDetails>(details_str.value())
                .ok()
                .map(|details| College {
                    id: college_uuid.to_string(),
                    details,
                })
        })
        .collect();

    colleges.sort_by(|a, b| {
        a.details
            .college_name
            .to_lowercase()
            .cmp(&b.details.college_name.to_lowercase())
    });
    Ok(colleges)
}

// ====================================================================
// ====================== BLOG POST OPERATIONS ========================
// ====================================================================

pub fn create_blog_post(
    db: &Database,
    title: &str,
    slug: Option<&str>,
    summary: &str,
    content: &str,
    tags_str: &str,
    cover_image: Option<&str>,
) -> Result<String, DbError> {
    let post_uuid = Uuid::new_v4();
    let created_at = Utc::now();

    let tags: Vec<String> = tags_str
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    let metadata = BlogMetadata {
        title: title.to_string(),
        slug: slug.map(|s| s.to_string()).filter(|s| !s.trim().is_empty()),
        summary: summary.to_string(),
        cover_image: cover_image.map(|s| s.to_string()),
        tags,
        created_at,
        last_updated_at: None,
    };
    let metadata_json = serde_json::to_string(&metadata)?;

    let write_txn = db.begin_write()?;
    {
        let mut posts_table = write_txn.open_table(BLOG_POSTS)?;
        let mut metadata_table = write_txn.open_table(BLOG_METADATA)?;
        let mut chrono_index = write_txn.open_table(BLOG_CHRONOLOGICAL_INDEX)?;

        let post_id_bytes = post_uuid.into_bytes();
        posts_table.insert(&post_id_bytes, content)?;
        metadata_table.insert(&post_id_bytes, metadata_json.as_str())?;

        // Negated timestamp keeps iteration order newest-first.
        let timestamp = -created_at.timestamp();
        chrono_index.insert((timestamp, &post_id_bytes), ())?;
    }
    write_txn.commit()?;

    Ok(post_uuid.to_string())
}

pub fn read_blog_post(db: &Database, id: &str) -> Option<FullBlogPost> {
    let post_uuid = Uuid::parse_str(id).ok()?;
    let post_id_bytes = post_uuid.into_bytes();

    let read_txn = db.begin_read().ok()?;
    let posts_table = read_txn.open_table(BLOG_POSTS).ok()?;
    let metadata_table = read_txn.open_table(BLOG_METADATA).ok()?;

    let content_guard = posts_table.get(&post_id_bytes).ok().flatten()?;
    let meta_guard = metadata_table.get(&post_id_bytes).ok().flatten()?;

    let content = content_guard.value().to_string();
    let metadata: BlogMetadata = serde_json::from_str(meta_guard.value()).ok()?;

    Some(FullBlogPost {
        id: post_uuid.to_string(),
        metadata,
        content,
    })
}

pub fn update_blog_post(
    db: &Database,
    post_id: &str,
    title: &str,
    slug: Option<&str>,
    summary: &str,
    content: &str,
    tags_str: &str,
    cover_image: Option<&str>,
) -> Result<(), DbError> {
    let post_uuid = Uuid::parse_str(post_id)?;
    let post_id_bytes = post_uuid.into_bytes();

    let write_txn = db.begin_write()?;
    {
        let mut posts_table = write_txn.open_table(BLOG_POSTS)?;
        let mut metadata_table = write_txn.open_table(BLOG_METADATA)?;

        let old_meta: BlogMetadata = {
            let guard = metadata_table
                .get(&post_id_bytes)?
                .ok_or_else(|| DbError::NotFound("Blog post metadata not found".to_string()))?;
            serde_json::from_str(guard.value())?
        };

        let tags: Vec<String> = tags_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        // created_at is preserved, so the chronological index key is stable
        // and needs no rewrite.
        let new_meta = BlogMetadata {
            title: title.to_string(),
            slug: slug.map(|s| s.to_string()).filter(|s| !s.trim().is_empty()),
            summary: summary.to_string(),
            cover_image: cover_image.map(|s| s.to_string()),
            tags,
            created_at: old_meta.created_at,
            last_updated_at: Some(Utc::now()),
        };
        let new_meta_json = serde_json::to_string(&new_meta)?;

        posts_table.insert(&post_id_bytes, content)?;
        metadata_table.insert(&post_id_bytes, new_meta_json.as_str())?;
    }
    write_txn.commit()?;
    Ok(())
}

pub fn delete_blog_post(db: &Database, post_id: &str) -> Result<(), DbError> {
    let post_uuid = Uuid::parse_str(post_id)?;
    let post_id_bytes = post_uuid.into_bytes();

    let write_txn = db.begin_write()?;
    {
        let mut posts_table = write_txn.open_table(BLOG_POSTS)?;
        let mut metadata_table = write_txn.open_table(BLOG_METADATA)?;
        let mut chrono_index = write_txn.open_table(BLOG_CHRONOLOGICAL_INDEX)?;

        let meta_to_delete: Option<BlogMetadata> = metadata_table
            .get(&post_id_bytes)?
            .and_then(|guard| serde_json::from_str(guard.value()).ok());

        if let Some(meta) = meta_to_delete {
            let timestamp = -meta.created_at.timestamp();
            chrono_index.remove((timestamp, &post_id_bytes))?;
        }

        posts_table.remove(&post_id_bytes)?;
        metadata_table.remove(&post_id_bytes)?;
    }
    write_txn.commit()?;
    Ok(())
}

pub fn read_latest_blog_summaries(
    db: &Database,
    limit: u32,
    offset: u32,
) -> Result<Vec<BlogSummary>, DbError> {
    let read_txn = db.begin_read()?;
    let chrono_index = read_txn.open_table(BLOG_CHRONOLOGICAL_INDEX)?;
    let metadata_table = read_txn.open_table(BLOG_METADATA)?;

    let posts = chrono_index
        .iter()?
        .skip(offset as usize)
        .take(limit as usize)
        .filter_map(|item_result| {
            item_result.ok().and_then(|(key, _value)| {
                let post_id_bytes = key.value().1;
                metadata_table.get(post_id_bytes).ok().flatten().and_then(|meta_str| {
                    let post_uuid = Uuid::from_bytes(*post_id_bytes);
                    serde_json::from_str(meta_str.value()).ok().map(|metadata| BlogSummary {
                        id: post_uuid.to_string(),
                        metadata,
                    })
                })
            })
        })
        .collect();
    Ok(posts)
}

/// Every post, newest first. Used by the offline sitemap generator.
pub fn read_all_blog_summaries(db: &Database) -> Result<Vec<BlogSummary>, DbError> {
    read_latest_blog_summaries(db, u32::MAX, 0)
}
