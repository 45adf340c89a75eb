use crate::models::db_operations::{content_db_operations, leads_db_operations, users_db_operations};
use crate::models::{BlogSummary, College, CollegeSummary, Course, FullBlogPost};
use crate::seo::course_level::normalize_course_level;
use crate::seo::slug::{create_course_slug, extract_college_id_from_slug};
use crate::DbPool;
use actix_web::web;
use redb::Database;

pub fn verify_admin_credentials(
    pool: &web::Data<DbPool>,
    username: &str,
    password: &str,
) -> Option<(String, String)> {
    if let Ok(conn) = pool.get() {
        users_db_operations::verify_credentials(&conn, username, password)
    } else {
        None
    }
}

/// Outcome of resolving an incoming detail-page slug: the entity plus, when
/// the slug text has drifted from live data, the canonical slug the caller
/// must redirect to.
pub enum Resolution<T> {
    Canonical(T),
    Drifted { entity: T, canonical_slug: String },
    NotFound,
}

/// Resolve a college slug to its record. Only the trailing identity token
/// (or a bare legacy UUID) matters; the readable prefix is never parsed.
pub fn resolve_college_slug(db: &Database, slug: &str) -> Resolution<College> {
    let id = match extract_college_id_from_slug(slug) {
        Some(id) => id,
        None => return Resolution::NotFound,
    };
    let college = match content_db_operations::read_college(db, &id) {
        Some(college) => college,
        None => return Resolution::NotFound,
    };

    let canonical_slug = college.slug();
    if canonical_slug == slug {
        Resolution::Canonical(college)
    } else {
        Resolution::Drifted {
            entity: college,
            canonical_slug,
        }
    }
}

/// Resolve a blog post by its authoritative id and report whether the
/// cosmetic slug segment is still current.
pub fn resolve_blog_post(db: &Database, slug: &str, id: &str) -> Resolution<FullBlogPost> {
    let post = match content_db_operations::read_blog_post(db, id) {
        Some(post) => post,
        None => return Resolution::NotFound,
    };

    let canonical_slug = post.metadata.slug_token();
    if canonical_slug == slug {
        Resolution::Canonical(post)
    } else {
        Resolution::Drifted {
            entity: post,
            canonical_slug,
        }
    }
}

/// Slug for the course at `index` in its parent's array.
pub fn course_slug_at(course: &Course, index: usize) -> String {
    let level = normalize_course_level(&course.level);
    create_course_slug(&course.name, &level, index)
}

// Slug minus its trailing numeric index, for the reorder fallback.
fn course_slug_stem(slug: &str) -> &str {
    match slug.rsplit_once('-') {
        Some((stem, tail)) if tail.chars().all(|c| c.is_ascii_digit()) && !tail.is_empty() => stem,
        _ => slug,
    }
}

/// Find a course by its slug. The embedded array index is the primary key;
/// when it is stale (the admin reordered the array) the current array is
/// rescanned for the first course whose recomputed slug stem matches.
/// Duplicate name+level pairs resolve to the first occurrence.
pub fn find_course_in_college<'a>(
    college: &'a College,
    course_slug: &str,
) -> Option<(usize, &'a Course)> {
    if let Some(index) = crate::seo::slug::parse_course_slug(course_slug) {
        if let Some(course) = college.details.courses.get(index) {
            if course_slug_at(course, index) == course_slug {
                return Some((index, course));
            }
        }
    }

    let wanted_stem = course_slug_stem(course_slug).to_string();
    college
        .details
        .courses
        .iter()
        .enumerate()
        .find(|(index, course)| course_slug_stem(&course_slug_at(course, *index)) == wanted_stem)
}

/// College summaries for the listing page, optionally filtered by city
/// (case-insensitive substring, the `ilike` equivalent).
pub fn fetch_college_summaries(
    db: &web::Data<Database>,
    city_filter: Option<&str>,
    limit: u32,
    offset: u32,
) -> Result<Vec<CollegeSummary>, content_db_operations::DbError> {
    let colleges = content_db_operations::read_all_colleges(db)?;
    let needle = city_filter.map(|c| c.to_lowercase());

    let summaries = colleges
        .iter()
        .filter(|college| match &needle {
            Some(needle) => college
                .details
                .city
                .as_deref()
                .map(|city| city.to_lowercase().contains(needle))
                .unwrap_or(false),
            None => true,
        })
        .skip(offset as usize)
        .take(limit as usize)
        .map(College::summary)
        .collect();
    Ok(summaries)
}

pub fn fetch_latest_blog_summaries(
    db: &web::Data<Database>,
    limit: u32,
    offset: u32,
) -> Result<Vec<BlogSummary>, content_db_operations::DbError> {
    content_db_operations::read_latest_blog_summaries(db, limit, offset)
}

pub fn fetch_approved_reviews(
    pool: &web::Data<DbPool>,
    college_id: &str,
) -> Result<Vec<crate::models::CollegeReview>, rusqlite::Error> {
    let conn = pool
        .get()
        .map_err(|_| rusqlite::Error::InvalidQuery)?;
    leads_db_operations::read_approved_reviews_for_college(&conn, college_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CollegeDetails, Course};
    use chrono::Utc;

    fn college_with_courses(courses: Vec<Course>) -> College {
        College {
            id: "123e4567-e89b-12d3-a456-426614174000".to_string(),
            details: CollegeDetails {
                college_name: "Test College".to_string(),
                city: None,
                state: None,
                description: None,
                website: None,
                established_year: None,
                image_url: None,
                courses,
                created_at: Utc::now(),
                last_updated_at: None,
            },
        }
    }

    fn course(name: &str, level: &str) -> Course {
        Course {
            name: name.to_string(),
            level: level.to_string(),
            brochure_url: None,
            subcategories: vec![],
        }
    }

    #[test]
    fn course_lookup_by_index() {
        let college = college_with_courses(vec![course("B.Tech", "UG"), course("MBA", "PG")]);
        let (index, found) = find_course_in_college(&college, "mba-pg-1").unwrap();
        assert_eq!(index, 1);
        assert_eq!(found.name, "MBA");
    }

    #[test]
    fn course_lookup_falls_back_after_reorder() {
        // "MBA" used to be at index 1; the admin reordered and it now sits
        // at index 3. The old bookmarked slug must still resolve to MBA.
        let college = college_with_courses(vec![
            course("B.Tech", "UG"),
            course("B.Sc", "UG"),
            course("BBA", "UG"),
            course("MBA", "PG"),
        ]);
        let (index, found) = find_course_in_college(&college, "mba-pg-1").unwrap();
        assert_eq!(index, 3);
        assert_eq!(found.name, "MBA");
    }

    #[test]
    fn course_lookup_duplicate_slugs_pick_first() {
        let college = college_with_courses(vec![course("MBA", "PG"), course("MBA", "PG")]);
        let (index, _) = find_course_in_college(&college, "mba-pg-9").unwrap();
        assert_eq!(index, 0);
    }

    #[test]
    fn course_lookup_missing_course_is_none() {
        let college = college_with_courses(vec![course("B.Tech", "UG")]);
        assert!(find_course_in_college(&college, "mba-pg-0").is_none());
        assert!(find_course_in_college(&college, "").is_none());
    }

    #[test]
    fn course_slug_stem_strips_only_numeric_tail() {
        assert_eq!(course_slug_stem("mba-pg-3"), "mba-pg");
        assert_eq!(course_slug_stem("mba-pg"), "mba-pg");
        assert_eq!(course_slug_stem("b-tech-ug-12"), "b-tech-ug");
    }
}
