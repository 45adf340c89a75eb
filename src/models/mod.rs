use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::seo::slug::{create_blog_slug, create_college_slug};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CourseSubcategory {
    pub name: String,
    pub fee: Option<String>,
    pub duration: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Course {
    pub name: String,
    /// Free-text admin input; normalized through `seo::course_level` at
    /// every point of use, never compared raw.
    pub level: String,
    pub brochure_url: Option<String>,
    #[serde(default)]
    pub subcategories: Vec<CourseSubcategory>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CollegeDetails {
    pub college_name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub established_year: Option<u16>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub courses: Vec<Course>,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Clone)]
pub struct College {
    pub id: String,
    pub details: CollegeDetails,
}

impl College {
    /// Canonical slug, recomputed from live data on demand.
    pub fn slug(&self) -> String {
        create_college_slug(&self.id, &self.details.college_name)
    }

    pub fn summary(&self) -> CollegeSummary {
        CollegeSummary {
            id: self.id.clone(),
            slug: self.slug(),
            college_name: self.details.college_name.clone(),
            city: self.details.city.clone(),
            course_count: self.details.courses.len(),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct CollegeSummary {
    pub id: String,
    pub slug: String,
    pub college_name: String,
    pub city: Option<String>,
    pub course_count: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BlogMetadata {
    pub title: String,
    /// Admin-entered slug column; may go stale after a rename. Cosmetic
    /// only — the row id is the authoritative identity.
    pub slug: Option<String>,
    pub summary: String,
    pub cover_image: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
}

impl BlogMetadata {
    pub fn slug_token(&self) -> String {
        create_blog_slug(self.slug.as_deref(), &self.title)
    }
}

#[derive(Serialize)]
pub struct FullBlogPost {
    pub id: String,
    pub metadata: BlogMetadata,
    pub content: String,
}

#[derive(Serialize, Clone)]
pub struct BlogSummary {
    pub id: String,
    pub metadata: BlogMetadata,
}

#[derive(Debug, Serialize)]
pub struct Lead {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Which surface captured the lead: "popup", "contact", "emi",
    /// "mentorship".
    pub source: String,
    pub college_interest: Option<String>,
    pub message: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct PgListing {
    pub id: i64,
    pub title: String,
    pub locality: String,
    pub rent_per_month: i64,
    pub gender: Option<String>,
    pub amenities: Option<String>,
    pub contact_phone: String,
    pub approved: bool,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct PgEnquiry {
    pub id: i64,
    pub listing_id: i64,
    pub name: String,
    pub phone: String,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct CounselingBooking {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub preferred_slot: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct CollegeReview {
    pub id: i64,
    pub college_id: String,
    pub author_name: String,
    pub rating: u8,
    pub body: String,
    pub approved: bool,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct BlogComment {
    pub id: i64,
    pub blog_id: String,
    pub author_name: String,
    pub body: String,
    pub approved: bool,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct SuccessStory {
    pub id: i64,
    pub student_name: String,
    pub college_name: String,
    pub batch_year: Option<String>,
    pub story: String,
    pub approved: bool,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct AdminUser {
    pub id: i32,
    pub username: String,
    pub role: String,
    pub is_active: bool,
    pub last_login_time: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Notification {
    pub message: String,
    pub r#type: String, // 'success' or 'error'
}

pub mod db_operations;
