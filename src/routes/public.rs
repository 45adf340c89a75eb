use crate::helper::{emi_helpers, form_helpers, public_helpers, sanitization_helpers};
use crate::helper::public_helpers::Resolution;
use crate::lock::{
    has_lead_flag, set_lead_flag, SessionLockStore, SqliteLockStore, SubmissionLock,
    LEAD_GLOBAL_TTL_SECONDS,
};
use crate::models::db_operations::{content_db_operations, leads_db_operations};
use crate::models::{College, Course, Lead};
use crate::seo::course_level::normalize_course_level;
use crate::seo::slug::{blog_path, college_path, course_path};
use crate::AppState;
use actix_session::Session;
use actix_web::{web, HttpResponse, Responder};
use redb::Database;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Deserialize)]
pub struct ApiQuery {
    limit: Option<u32>,
    offset: Option<u32>,
    city: Option<String>,
    locality: Option<String>,
}

#[derive(Deserialize)]
pub struct EmiQuery {
    principal: f64,
    annual_rate_pct: f64,
    tenure_months: u32,
}

#[derive(Serialize)]
struct CoursePayload {
    slug: String,
    name: String,
    level_token: String,
    level_label: String,
    brochure_url: Option<String>,
    subcategories: Vec<crate::models::CourseSubcategory>,
}

pub fn config_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/is_server_active", web::get().to(is_server_active))
            .route("/colleges", web::get().to(list_colleges))
            .route("/colleges/{slug}/courses/{course_slug}", web::get().to(get_course_by_slug))
            .route("/colleges/{slug}/courses", web::get().to(list_college_courses))
            .route("/colleges/{slug}/reviews", web::get().to(list_college_reviews))
            .route("/colleges/{slug}/reviews", web::post().to(submit_college_review))
            .route("/colleges/{slug}", web::get().to(get_college_by_slug))
            .route("/blog/latest", web::get().to(get_latest_blog_posts))
            .route("/blog/{slug}/{id}", web::get().to(get_blog_post))
            .route("/blog/{id}/comments", web::post().to(submit_blog_comment))
            .route("/blog/{id}", web::get().to(get_blog_post_legacy))
            .route("/leads", web::post().to(submit_lead))
            .route("/submissions/{name}", web::get().to(submission_status))
            .route("/submissions/{name}/clear", web::post().to(clear_submission))
            .route("/pg_listings", web::get().to(list_pg_listings))
            .route("/pg_listings/{id}/enquiries", web::post().to(submit_pg_enquiry))
            .route("/counseling_bookings", web::post().to(submit_counseling_booking))
            .route("/success_stories", web::get().to(list_success_stories))
            .route("/success_stories", web::post().to(submit_success_story))
            .route("/emi", web::get().to(emi_quote)),
    );
}

async fn is_server_active() -> impl Responder {
    HttpResponse::Ok().body("active")
}

fn not_found(what: &str) -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "error": format!("{} not found", what) }))
}

fn redirect_to(path: &str) -> HttpResponse {
    // 308 keeps crawlers converging on one canonical URL while old links
    // stay alive indefinitely.
    HttpResponse::PermanentRedirect()
        .append_header(("location", path.to_string()))
        .finish()
}

// ====================================================================
// ============================ COLLEGES ==============================
// ====================================================================

async fn list_colleges(db: web::Data<Database>, query: web::Query<ApiQuery>) -> impl Responder {
    let limit = query.limit.unwrap_or(50);
    let offset = query.offset.unwrap_or(0);

    match public_helpers::fetch_college_summaries(&db, query.city.as_deref(), limit, offset) {
        Ok(summaries) => HttpResponse::Ok().json(summaries),
        Err(e) => {
            log::error!("Failed to fetch college summaries: {}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

async fn get_college_by_slug(slug: web::Path<String>, db: web::Data<Database>) -> impl Responder {
    match public_helpers::resolve_college_slug(&db, &slug) {
        Resolution::Canonical(college) => HttpResponse::Ok().json(json!({
            "id": college.id,
            "slug": college.slug(),
            "details": college.details,
        })),
        Resolution::Drifted { canonical_slug, .. } => {
            redirect_to(&format!("/api{}", college_path(&canonical_slug)))
        }
        Resolution::NotFound => not_found("College"),
    }
}

fn course_payload(course: &Course, index: usize) -> CoursePayload {
    let level = normalize_course_level(&course.level);
    CoursePayload {
        slug: public_helpers::course_slug_at(course, index),
        name: course.name.clone(),
        level_token: level.canonical_token(),
        level_label: level.display_label(),
        brochure_url: course.brochure_url.clone(),
        subcategories: course.subcategories.clone(),
    }
}

fn resolve_college_or_respond(db: &Database, slug: &str, tail: &str) -> Result<College, HttpResponse> {
    match public_helpers::resolve_college_slug(db, slug) {
        Resolution::Canonical(college) => Ok(college),
        Resolution::Drifted { canonical_slug, .. } => Err(redirect_to(&format!(
            "/api{}{}",
            college_path(&canonical_slug),
            tail
        ))),
        Resolution::NotFound => Err(not_found("College")),
    }
}

async fn list_college_courses(slug: web::Path<String>, db: web::Data<Database>) -> impl Responder {
    let college = match resolve_college_or_respond(&db, &slug, "/courses") {
        Ok(college) => college,
        Err(response) => return response,
    };

    let mut courses: Vec<CoursePayload> = college
        .details
        .courses
        .iter()
        .enumerate()
        .map(|(index, course)| course_payload(course, index))
        .collect();

    // Grouped presentation order; the slugs keep their original indices.
    courses.sort_by(|a, b| {
        let rank_a = normalize_course_level(&a.level_token).sort_rank();
        let rank_b = normalize_course_level(&b.level_token).sort_rank();
        rank_a.cmp(&rank_b).then_with(|| a.name.cmp(&b.name))
    });

    HttpResponse::Ok().json(json!({
        "college": college.summary(),
        "courses": courses,
    }))
}

async fn get_course_by_slug(
    path: web::Path<(String, String)>,
    db: web::Data<Database>,
) -> impl Responder {
    let (college_slug, course_slug) = path.into_inner();

    let college = match public_helpers::resolve_college_slug(&db, &college_slug) {
        Resolution::Canonical(college) => college,
        Resolution::Drifted { entity, canonical_slug } => {
            // Re-anchor the course slug under the canonical college slug in
            // one hop, fixing a stale index at the same time if possible.
            let target = match public_helpers::find_course_in_college(&entity, &course_slug) {
                Some((index, course)) => public_helpers::course_slug_at(course, index),
                None => course_slug.clone(),
            };
            return redirect_to(&format!("/api{}", course_path(&canonical_slug, &target)));
        }
        Resolution::NotFound => return not_found("College"),
    };

    match public_helpers::find_course_in_college(&college, &course_slug) {
        Some((index, course)) => HttpResponse::Ok().json(json!({
            "college": college.summary(),
            "course": course_payload(course, index),
        })),
        None => not_found("Course"),
    }
}

async fn list_college_reviews(
    slug: web::Path<String>,
    db: web::Data<Database>,
    pool: web::Data<crate::DbPool>,
) -> impl Responder {
    let college = match resolve_college_or_respond(&db, &slug, "/reviews") {
        Ok(college) => college,
        Err(response) => return response,
    };

    match public_helpers::fetch_approved_reviews(&pool, &college.id) {
        Ok(reviews) => HttpResponse::Ok().json(reviews),
        Err(e) => {
            log::error!("Failed to fetch reviews for college {}: {}", college.id, e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

async fn submit_college_review(
    slug: web::Path<String>,
    db: web::Data<Database>,
    pool: web::Data<crate::DbPool>,
    form: web::Bytes,
) -> impl Responder {
    let college = match resolve_college_or_respond(&db, &slug, "/reviews") {
        Ok(college) => college,
        Err(response) => return response,
    };

    let parsed = match form_helpers::parse_form(&form) {
        Ok(p) => p,
        Err(response) => return response,
    };

    let author_name = match form_helpers::required_field(&parsed, "author_name") {
        Ok(v) => sanitization_helpers::strip_all_html(v),
        Err(response) => return response,
    };
    let body = match form_helpers::required_field(&parsed, "body") {
        Ok(v) => sanitization_helpers::strip_all_html(v),
        Err(response) => return response,
    };
    let rating = parsed
        .get("rating")
        .and_then(|r| r.trim().parse::<u8>().ok())
        .filter(|r| (1..=5).contains(r));
    let rating = match rating {
        Some(r) => r,
        None => {
            return HttpResponse::BadRequest()
                .json(json!({ "error": "Field 'rating' must be an integer from 1 to 5." }))
        }
    };

    let conn = match pool.get() {
        Ok(c) => c,
        Err(e) => {
            log::error!("Database pool error on review submit: {}", e);
            return HttpResponse::InternalServerError().finish();
        }
    };

    match leads_db_operations::insert_college_review(&conn, &college.id, &author_name, rating, &body) {
        Ok(id) => HttpResponse::Ok().json(json!({ "id": id, "status": "pending_approval" })),
        Err(e) => {
            log::error!("Failed to insert review for college {}: {}", college.id, e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

// ====================================================================
// ============================== BLOG ================================
// ====================================================================

async fn get_latest_blog_posts(db: web::Data<Database>, query: web::Query<ApiQuery>) -> impl Responder {
    let limit = query.limit.unwrap_or(10);
    let offset = query.offset.unwrap_or(0);

    match public_helpers::fetch_latest_blog_summaries(&db, limit, offset) {
        Ok(posts) => HttpResponse::Ok().json(posts),
        Err(e) => {
            log::error!("Failed to fetch latest blog posts: {}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

async fn get_blog_post(
    path: web::Path<(String, String)>,
    db: web::Data<Database>,
    pool: web::Data<crate::DbPool>,
) -> impl Responder {
    let (slug, id) = path.into_inner();

    match public_helpers::resolve_blog_post(&db, &slug, &id) {
        Resolution::Canonical(post) => {
            let comments = pool
                .get()
                .ok()
                .and_then(|conn| {
                    leads_db_operations::read_approved_comments_for_blog(&conn, &post.id).ok()
                })
                .unwrap_or_default();
            HttpResponse::Ok().json(json!({ "post": post, "comments": comments }))
        }
        Resolution::Drifted { entity, canonical_slug } => {
            redirect_to(&format!("/api{}", blog_path(&canonical_slug, &entity.id)))
        }
        Resolution::NotFound => not_found("Blog post"),
    }
}

/// Legacy `/blog/{id}` links: identity only, no slug segment. Always
/// answered with a redirect to the canonical two-segment path.
async fn get_blog_post_legacy(id: web::Path<String>, db: web::Data<Database>) -> impl Responder {
    match content_db_operations::read_blog_post(&db, &id) {
        Some(post) => {
            let slug = post.metadata.slug_token();
            redirect_to(&format!("/api{}", blog_path(&slug, &post.id)))
        }
        None => not_found("Blog post"),
    }
}

async fn submit_blog_comment(
    id: web::Path<String>,
    db: web::Data<Database>,
    pool: web::Data<crate::DbPool>,
    form: web::Bytes,
) -> impl Responder {
    let post = match content_db_operations::read_blog_post(&db, &id) {
        Some(post) => post,
        None => return not_found("Blog post"),
    };

    let parsed = match form_helpers::parse_form(&form) {
        Ok(p) => p,
        Err(response) => return response,
    };
    let author_name = match form_helpers::required_field(&parsed, "author_name") {
        Ok(v) => sanitization_helpers::strip_all_html(v),
        Err(response) => return response,
    };
    let body = match form_helpers::required_field(&parsed, "body") {
        Ok(v) => sanitization_helpers::strip_all_html(v),
        Err(response) => return response,
    };

    let conn = match pool.get() {
        Ok(c) => c,
        Err(e) => {
            log::error!("Database pool error on comment submit: {}", e);
            return HttpResponse::InternalServerError().finish();
        }
    };

    match leads_db_operations::insert_blog_comment(&conn, &post.id, &author_name, &body) {
        Ok(comment_id) => {
            HttpResponse::Ok().json(json!({ "id": comment_id, "status": "pending_approval" }))
        }
        Err(e) => {
            log::error!("Failed to insert comment for blog {}: {}", post.id, e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

// ====================================================================
// ======================= LEADS & SUBMISSIONS ========================
// ====================================================================

async fn submit_lead(
    session: Session,
    state: web::Data<AppState>,
    pool: web::Data<crate::DbPool>,
    form: web::Bytes,
) -> impl Responder {
    let parsed = match form_helpers::parse_form(&form) {
        Ok(p) => p,
        Err(response) => return response,
    };

    let name = match form_helpers::required_field(&parsed, "name") {
        Ok(v) => sanitization_helpers::strip_all_html(v),
        Err(response) => return response,
    };
    let email = match form_helpers::required_field(&parsed, "email") {
        Ok(v) => v.to_string(),
        Err(response) => return response,
    };
    if !email.contains('@') {
        return HttpResponse::BadRequest()
            .json(json!({ "error": "Field 'email' must be a valid address." }));
    }
    let phone = match form_helpers::required_field(&parsed, "phone") {
        Ok(v) => v.to_string(),
        Err(response) => return response,
    };
    let source = form_helpers::optional_field(&parsed, "source").unwrap_or("popup");
    let college_interest = form_helpers::optional_field(&parsed, "college_interest")
        .map(sanitization_helpers::strip_all_html);
    let message = form_helpers::optional_field(&parsed, "message")
        .map(sanitization_helpers::strip_all_html);

    let conn = match pool.get() {
        Ok(c) => c,
        Err(e) => {
            log::error!("Database pool error on lead submit: {}", e);
            return HttpResponse::InternalServerError()
                .json(json!({ "error": "Could not save your request. Please try again." }));
        }
    };

    let lead_id = match leads_db_operations::insert_lead(
        &conn,
        &name,
        &email,
        &phone,
        source,
        college_interest.as_deref(),
        message.as_deref(),
    ) {
        Ok(id) => id,
        Err(e) => {
            // The lock stays untouched: a failed write must not suppress
            // the form on retry.
            log::error!("Failed to insert lead: {}", e);
            return HttpResponse::InternalServerError()
                .json(json!({ "error": "Could not save your request. Please try again." }));
        }
    };

    let lead = Lead {
        id: lead_id,
        name,
        email,
        phone,
        source: source.to_string(),
        college_interest,
        message,
        created_at: chrono::Utc::now().to_rfc3339(),
    };
    state.notifier.lead_created(&lead);

    // Confirmed write: now raise the cooldown lock and the legacy flag.
    let session_store = SessionLockStore::new(&session);
    let lock = SubmissionLock::lead_global();
    state.lock_hub.mark(&lock, &session_store);
    set_lead_flag(&session_store, &SqliteLockStore::new(&conn));

    HttpResponse::Ok().json(json!({ "id": lead.id, "status": "received" }))
}

async fn submission_status(
    name: web::Path<String>,
    session: Session,
    pool: web::Data<crate::DbPool>,
) -> impl Responder {
    let session_store = SessionLockStore::new(&session);
    let lock = SubmissionLock::new(name.as_str(), LEAD_GLOBAL_TTL_SECONDS);
    let has_submitted = lock.has_submitted(&session_store);

    let lead_flag = match pool.get() {
        Ok(conn) => has_lead_flag(&session_store, &SqliteLockStore::new(&conn)),
        Err(_) => has_lead_flag(&session_store, &session_store),
    };

    HttpResponse::Ok().json(json!({
        "name": name.as_str(),
        "has_submitted": has_submitted,
        "lead_flag": lead_flag,
    }))
}

async fn clear_submission(
    name: web::Path<String>,
    session: Session,
    state: web::Data<AppState>,
) -> impl Responder {
    let session_store = SessionLockStore::new(&session);
    let lock = SubmissionLock::new(name.as_str(), LEAD_GLOBAL_TTL_SECONDS);
    state.lock_hub.clear(&lock, &session_store);

    HttpResponse::Ok().json(json!({ "name": name.as_str(), "has_submitted": false }))
}

// ====================================================================
// ==================== PG / BOOKINGS / STORIES =======================
// ====================================================================

async fn list_pg_listings(pool: web::Data<crate::DbPool>, query: web::Query<ApiQuery>) -> impl Responder {
    let limit = query.limit.unwrap_or(20);
    let offset = query.offset.unwrap_or(0);

    let conn = match pool.get() {
        Ok(c) => c,
        Err(e) => {
            log::error!("Database pool error on PG listing fetch: {}", e);
            return HttpResponse::InternalServerError().finish();
        }
    };

    match leads_db_operations::read_approved_pg_listings(&conn, query.locality.as_deref(), limit, offset) {
        Ok(listings) => HttpResponse::Ok().json(listings),
        Err(e) => {
            log::error!("Failed to fetch PG listings: {}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

async fn submit_pg_enquiry(
    listing_id: web::Path<i64>,
    pool: web::Data<crate::DbPool>,
    form: web::Bytes,
) -> impl Responder {
    let parsed = match form_helpers::parse_form(&form) {
        Ok(p) => p,
        Err(response) => return response,
    };
    let name = match form_helpers::required_field(&parsed, "name") {
        Ok(v) => sanitization_helpers::strip_all_html(v),
        Err(response) => return response,
    };
    let phone = match form_helpers::required_field(&parsed, "phone") {
        Ok(v) => v.to_string(),
        Err(response) => return response,
    };

    let conn = match pool.get() {
        Ok(c) => c,
        Err(e) => {
            log::error!("Database pool error on PG enquiry submit: {}", e);
            return HttpResponse::InternalServerError().finish();
        }
    };

    match leads_db_operations::insert_pg_enquiry(&conn, *listing_id, &name, &phone) {
        Ok(id) => HttpResponse::Ok().json(json!({ "id": id, "status": "received" })),
        Err(e) => {
            log::error!("Failed to insert PG enquiry for listing {}: {}", listing_id, e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

async fn submit_counseling_booking(pool: web::Data<crate::DbPool>, form: web::Bytes) -> impl Responder {
    let parsed = match form_helpers::parse_form(&form) {
        Ok(p) => p,
        Err(response) => return response,
    };
    let name = match form_helpers::required_field(&parsed, "name") {
        Ok(v) => sanitization_helpers::strip_all_html(v),
        Err(response) => return response,
    };
    let phone = match form_helpers::required_field(&parsed, "phone") {
        Ok(v) => v.to_string(),
        Err(response) => return response,
    };
    let email = match form_helpers::required_field(&parsed, "email") {
        Ok(v) => v.to_string(),
        Err(response) => return response,
    };
    let preferred_slot = form_helpers::optional_field(&parsed, "preferred_slot");

    let conn = match pool.get() {
        Ok(c) => c,
        Err(e) => {
            log::error!("Database pool error on booking submit: {}", e);
            return HttpResponse::InternalServerError().finish();
        }
    };

    match leads_db_operations::insert_counseling_booking(&conn, &name, &phone, &email, preferred_slot) {
        Ok(id) => HttpResponse::Ok().json(json!({ "id": id, "status": "received" })),
        Err(e) => {
            log::error!("Failed to insert counseling booking: {}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

async fn list_success_stories(pool: web::Data<crate::DbPool>, query: web::Query<ApiQuery>) -> impl Responder {
    let limit = query.limit.unwrap_or(20);
    let offset = query.offset.unwrap_or(0);

    let conn = match pool.get() {
        Ok(c) => c,
        Err(e) => {
            log::error!("Database pool error on success story fetch: {}", e);
            return HttpResponse::InternalServerError().finish();
        }
    };

    match leads_db_operations::read_approved_success_stories(&conn, limit, offset) {
        Ok(stories) => HttpResponse::Ok().json(stories),
        Err(e) => {
            log::error!("Failed to fetch success stories: {}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

async fn submit_success_story(pool: web::Data<crate::DbPool>, form: web::Bytes) -> impl Responder {
    let parsed = match form_helpers::parse_form(&form) {
        Ok(p) => p,
        Err(response) => return response,
    };
    let student_name = match form_helpers::required_field(&parsed, "student_name") {
        Ok(v) => sanitization_helpers::strip_all_html(v),
        Err(response) => return response,
    };
    let college_name = match form_helpers::required_field(&parsed, "college_name") {
        Ok(v) => sanitization_helpers::strip_all_html(v),
        Err(response) => return response,
    };
    let story = match form_helpers::required_field(&parsed, "story") {
        Ok(v) => sanitization_helpers::sanitize_markdown_content(v),
        Err(response) => return response,
    };
    let batch_year = form_helpers::optional_field(&parsed, "batch_year");

    let conn = match pool.get() {
        Ok(c) => c,
        Err(e) => {
            log::error!("Database pool error on success story submit: {}", e);
            return HttpResponse::InternalServerError().finish();
        }
    };

    match leads_db_operations::insert_success_story(&conn, &student_name, &college_name, batch_year, &story) {
        Ok(id) => HttpResponse::Ok().json(json!({ "id": id, "status": "pending_approval" })),
        Err(e) => {
            log::error!("Failed to insert success story: {}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

// ====================================================================
// =============================== EMI ================================
// ====================================================================

async fn emi_quote(query: web::Query<EmiQuery>) -> impl Responder {
    match emi_helpers::calculate_emi(query.principal, query.annual_rate_pct, query.tenure_months) {
        Some(quote) => HttpResponse::Ok().json(quote),
        None => HttpResponse::BadRequest().json(json!({
            "error": "principal must be positive, rate non-negative, and tenure at least one month."
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock::LockHub;
    use crate::models::db_operations::leads_db_operations;
    use crate::models::CollegeDetails;
    use crate::notify::testing::CountingNotifier;
    use crate::notify::LeadNotifier;
    use crate::setup::db_setup;
    use actix_session::storage::CookieSessionStore;
    use actix_session::SessionMiddleware;
    use actix_web::cookie::{Cookie, Key};
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use chrono::Utc;
    use r2d2_sqlite::SqliteConnectionManager;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    fn temp_content_db() -> web::Data<Database> {
        let path = std::env::temp_dir().join(format!("admitbase-test-{}.redb", uuid::Uuid::new_v4()));
        let db = Database::create(&path).expect("create temp content db");
        db_setup::setup_content_db(&db).expect("setup content db");
        web::Data::new(db)
    }

    fn test_pool() -> web::Data<crate::DbPool> {
        // A single pooled connection keeps the in-memory database alive and
        // shared for the whole test.
        let manager = SqliteConnectionManager::memory();
        let pool = r2d2::Pool::builder().max_size(1).build(manager).expect("build pool");
        {
            let mut conn = pool.get().expect("pool conn");
            db_setup::setup_leads_db(&mut conn).expect("setup leads db");
        }
        web::Data::new(pool)
    }

    fn test_state(notifier: Arc<dyn LeadNotifier>) -> web::Data<AppState> {
        web::Data::new(AppState {
            lock_hub: Arc::new(LockHub::new()),
            notifier,
        })
    }

    fn sample_details(name: &str, courses: Vec<crate::models::Course>) -> CollegeDetails {
        CollegeDetails {
            college_name: name.to_string(),
            city: Some("Delhi".to_string()),
            state: None,
            description: None,
            website: None,
            established_year: None,
            image_url: None,
            courses,
            created_at: Utc::now(),
            last_updated_at: None,
        }
    }

    fn course(name: &str, level: &str) -> crate::models::Course {
        crate::models::Course {
            name: name.to_string(),
            level: level.to_string(),
            brochure_url: None,
            subcategories: vec![],
        }
    }

    macro_rules! test_app {
        ($content:expr, $pool:expr, $state:expr) => {
            test::init_service(
                App::new()
                    .app_data($content.clone())
                    .app_data($pool.clone())
                    .app_data($state.clone())
                    .wrap(
                        SessionMiddleware::builder(CookieSessionStore::default(), Key::from(&[7u8; 64]))
                            .cookie_secure(false)
                            .build(),
                    )
                    .configure(config_api),
            )
            .await
        };
    }

    fn session_cookie<B>(resp: &actix_web::dev::ServiceResponse<B>) -> Option<Cookie<'static>> {
        resp.response().cookies().next().map(|c| c.into_owned())
    }

    fn location<B>(resp: &actix_web::dev::ServiceResponse<B>) -> String {
        resp.headers()
            .get("location")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    #[actix_web::test]
    async fn college_slug_resolves_and_legacy_uuid_redirects() {
        let content = temp_content_db();
        let pool = test_pool();
        let state = test_state(Arc::new(crate::notify::LogNotifier));
        let app = test_app!(content, pool, state);

        let id = content_db_operations::create_college(
            &content,
            &sample_details("Indian Institute of Tech", vec![]),
        )
        .expect("create college");
        let college = content_db_operations::read_college(&content, &id).expect("read college");
        let slug = college.slug();
        assert!(slug.starts_with("indian-institute-of-tech-"));

        // Canonical slug answers 200 with the same id.
        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri(&format!("/api/colleges/{}", slug)).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["id"], serde_json::Value::String(id.clone()));

        // A bare legacy UUID keeps working via a permanent redirect.
        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri(&format!("/api/colleges/{}", id)).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::PERMANENT_REDIRECT);
        assert_eq!(location(&resp), format!("/api/colleges/{}", slug));

        // Garbage never crashes, it is a 404 payload.
        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/colleges/not-a-real-slug!").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn renamed_college_old_slug_redirects_to_new_canonical() {
        let content = temp_content_db();
        let pool = test_pool();
        let state = test_state(Arc::new(crate::notify::LogNotifier));
        let app = test_app!(content, pool, state);

        let id = content_db_operations::create_college(&content, &sample_details("Old Name", vec![]))
            .expect("create college");
        let old_slug = content_db_operations::read_college(&content, &id).unwrap().slug();

        content_db_operations::update_college(&content, &id, &sample_details("Brand New Name", vec![]))
            .expect("rename college");
        let new_slug = content_db_operations::read_college(&content, &id).unwrap().slug();
        assert_ne!(old_slug, new_slug);

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri(&format!("/api/colleges/{}", old_slug)).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::PERMANENT_REDIRECT);
        assert_eq!(location(&resp), format!("/api/colleges/{}", new_slug));
    }

    #[actix_web::test]
    async fn blog_canonical_stale_and_legacy_paths() {
        let content = temp_content_db();
        let pool = test_pool();
        let state = test_state(Arc::new(crate::notify::LogNotifier));
        let app = test_app!(content, pool, state);

        let id = content_db_operations::create_blog_post(
            &content,
            "Launch Week",
            None,
            "What changed",
            "Full text",
            "news",
            None,
        )
        .expect("create post");

        // Canonical path.
        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri(&format!("/api/blog/launch-week/{}", id)).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["post"]["id"], serde_json::Value::String(id.clone()));

        // Stale slug (post renamed after publishing): id wins, redirect to
        // the recomputed canonical slug.
        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri(&format!("/api/blog/some-old-title/{}", id)).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::PERMANENT_REDIRECT);
        assert_eq!(location(&resp), format!("/api/blog/launch-week/{}", id));

        // Legacy single-segment alias.
        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri(&format!("/api/blog/{}", id)).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::PERMANENT_REDIRECT);
        assert_eq!(location(&resp), format!("/api/blog/launch-week/{}", id));

        // Unknown id degrades to not-found.
        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/blog/launch-week/00000000-0000-0000-0000-00000000dead")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn reordered_course_array_still_resolves_old_slug() {
        let content = temp_content_db();
        let pool = test_pool();
        let state = test_state(Arc::new(crate::notify::LogNotifier));
        let app = test_app!(content, pool, state);

        // "MBA" once sat at index 1 (slug mba-pg-1); after a reorder it is
        // at index 3.
        let id = content_db_operations::create_college(
            &content,
            &sample_details(
                "Test College",
                vec![
                    course("B.Tech", "UG"),
                    course("B.Sc", "UG"),
                    course("BBA", "UG"),
                    course("MBA", "PG"),
                ],
            ),
        )
        .expect("create college");
        let slug = content_db_operations::read_college(&content, &id).unwrap().slug();

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/colleges/{}/courses/mba-pg-1", slug))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["course"]["name"], "MBA");
        assert_eq!(body["course"]["slug"], "mba-pg-3");

        // A course that never existed is a 404, not a crash.
        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/colleges/{}/courses/astrophysics-pg-0", slug))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn lead_submission_locks_the_session_and_notifies_once() {
        let content = temp_content_db();
        let pool = test_pool();
        let notifier = Arc::new(CountingNotifier::default());
        let state = test_state(notifier.clone());
        let app = test_app!(content, pool, state);

        // Fresh session: nothing locked.
        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/submissions/lead-global").to_request(),
        )
        .await;
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["has_submitted"], false);
        assert_eq!(body["lead_flag"], false);

        // Submit a lead.
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/leads")
                .insert_header(("content-type", "application/x-www-form-urlencoded"))
                .set_payload("name=Asha&email=asha%40example.com&phone=9999999999&source=popup")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 1);
        let cookie = session_cookie(&resp).expect("session cookie after lead submit");

        // Same browser session: the popup sees the cooldown and stays shut.
        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/submissions/lead-global")
                .cookie(cookie.clone())
                .to_request(),
        )
        .await;
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["has_submitted"], true);
        assert_eq!(body["lead_flag"], true);

        // A different session has no cooldown, but the durable legacy flag
        // is visible across sessions.
        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/submissions/lead-global").to_request(),
        )
        .await;
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["has_submitted"], false);
        assert_eq!(body["lead_flag"], true);

        // Explicit unlock flips the signal immediately.
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/submissions/lead-global/clear")
                .cookie(cookie.clone())
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let cleared_cookie = session_cookie(&resp).unwrap_or(cookie);

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/submissions/lead-global")
                .cookie(cleared_cookie)
                .to_request(),
        )
        .await;
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["has_submitted"], false);
    }

    #[actix_web::test]
    async fn rejected_lead_never_marks_the_lock() {
        let content = temp_content_db();
        let pool = test_pool();
        let notifier = Arc::new(CountingNotifier::default());
        let state = test_state(notifier.clone());
        let app = test_app!(content, pool, state);

        // Missing email: 400, no notification, no lock.
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/leads")
                .insert_header(("content-type", "application/x-www-form-urlencoded"))
                .set_payload("name=Asha&phone=9999999999")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 0);

        let maybe_cookie = session_cookie(&resp);
        let mut req = test::TestRequest::get().uri("/api/submissions/lead-global");
        if let Some(cookie) = maybe_cookie {
            req = req.cookie(cookie);
        }
        let resp = test::call_service(&app, req.to_request()).await;
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["has_submitted"], false);
        assert_eq!(body["lead_flag"], false);
    }

    #[actix_web::test]
    async fn reviews_stay_hidden_until_approved() {
        let content = temp_content_db();
        let pool = test_pool();
        let state = test_state(Arc::new(crate::notify::LogNotifier));
        let app = test_app!(content, pool, state);

        let id = content_db_operations::create_college(&content, &sample_details("Review U", vec![]))
            .expect("create college");
        let slug = content_db_operations::read_college(&content, &id).unwrap().slug();

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("/api/colleges/{}/reviews", slug))
                .insert_header(("content-type", "application/x-www-form-urlencoded"))
                .set_payload("author_name=Asha&rating=5&body=Great+mentors")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        let review_id = body["id"].as_i64().expect("review id");

        // Unapproved by default: the public listing is empty.
        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri(&format!("/api/colleges/{}/reviews", slug)).to_request(),
        )
        .await;
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body.as_array().map(|a| a.len()), Some(0));

        {
            let conn = pool.get().expect("pool conn");
            leads_db_operations::approve_review(&conn, review_id).expect("approve review");
        }

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri(&format!("/api/colleges/{}/reviews", slug)).to_request(),
        )
        .await;
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body.as_array().map(|a| a.len()), Some(1));
        assert_eq!(body[0]["author_name"], "Asha");
    }

    #[actix_web::test]
    async fn emi_endpoint_is_pure_arithmetic() {
        let content = temp_content_db();
        let pool = test_pool();
        let state = test_state(Arc::new(crate::notify::LogNotifier));
        let app = test_app!(content, pool, state);

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/emi?principal=120000&annual_rate_pct=0&tenure_months=12")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["monthly_installment"], 10000.0);

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/emi?principal=0&annual_rate_pct=10&tenure_months=12")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
