use crate::config::Config;
use crate::helper::{admin_helpers, form_helpers, public_helpers, sanitization_helpers};
use crate::middleware::AuthenticatedAdmin;
use crate::models::db_operations::{content_db_operations, leads_db_operations, users_db_operations};
use crate::models::{CollegeDetails, Course, Notification};
use actix_csrf::extractor::{Csrf, CsrfGuarded, CsrfToken};
use actix_session::Session;
use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use redb::Database;
use serde::Deserialize;
use tera::{Context, Tera};

#[derive(Deserialize)]
struct LoginForm {
    csrf_token: CsrfToken,
    username: String,
    password: String,
}

impl CsrfGuarded for LoginForm {
    fn csrf_token(&self) -> &CsrfToken {
        &self.csrf_token
    }
}

pub fn config_login(cfg: &mut web::ServiceConfig) {
    cfg.route("/login", web::get().to(show_admin_login_form))
        .route("/login", web::post().to(handle_admin_login))
        .route("/logout", web::post().to(handle_admin_logout));
}

pub fn config_dashboard(cfg: &mut web::ServiceConfig) {
    cfg.route("/dashboard", web::get().to(show_admin_dashboard))
        .route("/update_settings", web::post().to(update_settings_action))
        .route("/create_college", web::post().to(create_college_action))
        .route("/update_college", web::post().to(update_college_action))
        .route("/delete_college", web::post().to(delete_college_action))
        .route("/create_blog", web::post().to(create_blog_action))
        .route("/update_blog", web::post().to(update_blog_action))
        .route("/delete_blog", web::post().to(delete_blog_action))
        .route("/create_pg_listing", web::post().to(create_pg_listing_action))
        .route("/upload_brochure", web::post().to(upload_brochure_action))
        .route("/moderate", web::post().to(moderate_action));
}

fn set_notification(session: &Session, message: &str, r#type: &str) {
    let notification = Notification {
        message: message.to_string(),
        r#type: r#type.to_string(),
    };
    if session.insert("notification", &notification).is_err() {
        log::warn!("Could not store admin notification in session.");
    }
}

fn dashboard_url(config: &Config) -> String {
    format!("/management/{}/dashboard", config.admin_url_prefix)
}

fn back_to_dashboard(config: &Config) -> HttpResponse {
    HttpResponse::Found()
        .append_header(("location", dashboard_url(config)))
        .finish()
}

// ====================================================================
// ======================== LOGIN / LOGOUT ===========================
// ====================================================================

async fn show_admin_login_form(
    session: Session,
    tera: web::Data<Tera>,
    token: CsrfToken,
    config: web::Data<Config>,
) -> impl Responder {
    let admin_url_prefix = &config.admin_url_prefix;
    if session.get::<String>("role").unwrap_or(None) == Some("admin".to_string()) {
        return back_to_dashboard(&config);
    }

    let mut ctx = Context::new();
    ctx.insert("admin_url_prefix", admin_url_prefix);
    ctx.insert("csrf_token", token.get());

    if let Ok(Some(error)) = session.get::<String>("error") {
        ctx.insert("error", &error);
        session.remove("error");
    }

    match tera.render("admin/login.html", &ctx) {
        Ok(rendered) => HttpResponse::Ok().content_type("text/html; charset=utf-8").body(rendered),
        Err(_) => HttpResponse::InternalServerError().body("Template error"),
    }
}

async fn handle_admin_login(
    session: Session,
    pool: web::Data<crate::DbPool>,
    form: Csrf<web::Form<LoginForm>>,
    config: web::Data<Config>,
) -> impl Responder {
    let admin_url_prefix = &config.admin_url_prefix;
    let login_url = format!("/management/{}/login", admin_url_prefix);

    let login_data = form.into_inner();

    if let Some((user, role)) =
        public_helpers::verify_admin_credentials(&pool, &login_data.username, &login_data.password)
    {
        if role == "admin" {
            if session.insert("username", user.clone()).is_err()
                || session.insert("role", role).is_err()
            {
                log::error!("Failed to write admin session for '{}'.", user);
                return HttpResponse::InternalServerError().finish();
            }
            session.remove("error");
            if let Ok(conn) = pool.get() {
                if let Err(e) = users_db_operations::update_last_login_time(&conn, &user) {
                    log::warn!("Could not record last login for '{}': {}", user, e);
                }
            }
            return back_to_dashboard(&config);
        }
    }

    if session.insert("error", "Invalid credentials or account suspended.").is_err() {
        log::warn!("Could not store login error in session.");
    }
    HttpResponse::Found().append_header(("location", login_url)).finish()
}

async fn handle_admin_logout(session: Session, config: web::Data<Config>) -> impl Responder {
    let login_url = format!("/management/{}/login", config.admin_url_prefix);
    session.clear();
    HttpResponse::Found().append_header(("location", login_url)).finish()
}

// ====================================================================
// ============================ DASHBOARD =============================
// ====================================================================

async fn show_admin_dashboard(
    auth_user: AuthenticatedAdmin,
    session: Session,
    tera: web::Data<Tera>,
    pool: web::Data<crate::DbPool>,
    db: web::Data<Database>,
    token: CsrfToken,
    config: web::Data<Config>,
) -> impl Responder {
    let mut ctx = Context::new();
    ctx.insert("admin_url_prefix", &config.admin_url_prefix);
    ctx.insert("user", &auth_user);
    ctx.insert("csrf_token", token.get());

    if let Ok(Some(notification)) = session.get::<Notification>("notification") {
        ctx.insert("notification", &notification);
        session.remove("notification");
    }

    let settings = match pool.get() {
        Ok(conn) => admin_helpers::get_settings(&conn),
        Err(e) => {
            log::error!("Could not get DB connection from pool for settings: {}", e);
            admin_helpers::Settings {
                max_file_upload_size_mb: "0".to_string(),
                allowed_mime_types: "".to_string(),
                contact_email: "".to_string(),
            }
        }
    };
    ctx.insert("settings", &settings);

    match admin_helpers::fetch_all_admins(&pool) {
        Ok(admins) => ctx.insert("admins", &admins),
        Err(e) => {
            log::error!("Failed to fetch admin accounts: {}", e);
            ctx.insert("admins", &Vec::<String>::new());
        }
    }

    match content_db_operations::read_all_colleges(&db) {
        Ok(colleges) => {
            let summaries: Vec<_> = colleges.iter().map(|c| c.summary()).collect();
            ctx.insert("colleges", &summaries);
        }
        Err(e) => {
            log::error!("Failed to fetch colleges for admin dashboard: {}", e);
            ctx.insert("colleges", &Vec::<String>::new());
        }
    }

    match content_db_operations::read_latest_blog_summaries(&db, 50, 0) {
        Ok(posts) => ctx.insert("blog_posts", &posts),
        Err(e) => {
            log::error!("Failed to fetch blog posts for admin dashboard: {}", e);
            ctx.insert("blog_posts", &Vec::<String>::new());
        }
    }

    match admin_helpers::fetch_leads(&pool, 100, 0) {
        Ok(leads) => ctx.insert("leads", &leads),
        Err(e) => {
            log::error!("Failed to fetch leads for admin dashboard: {}", e);
            ctx.insert("leads", &Vec::<String>::new());
        }
    }

    match admin_helpers::fetch_pg_enquiries(&pool, 100, 0) {
        Ok(enquiries) => ctx.insert("pg_enquiries", &enquiries),
        Err(e) => {
            log::error!("Failed to fetch PG enquiries: {}", e);
            ctx.insert("pg_enquiries", &Vec::<String>::new());
        }
    }

    match admin_helpers::fetch_counseling_bookings(&pool, 100, 0) {
        Ok(bookings) => ctx.insert("counseling_bookings", &bookings),
        Err(e) => {
            log::error!("Failed to fetch counseling bookings: {}", e);
            ctx.insert("counseling_bookings", &Vec::<String>::new());
        }
    }

    match admin_helpers::fetch_pending_reviews(&pool) {
        Ok(reviews) => ctx.insert("pending_reviews", &reviews),
        Err(e) => {
            log::error!("Failed to fetch pending reviews: {}", e);
            ctx.insert("pending_reviews", &Vec::<String>::new());
        }
    }

    match admin_helpers::fetch_pending_comments(&pool) {
        Ok(comments) => ctx.insert("pending_comments", &comments),
        Err(e) => {
            log::error!("Failed to fetch pending comments: {}", e);
            ctx.insert("pending_comments", &Vec::<String>::new());
        }
    }

    match admin_helpers::fetch_pending_pg_listings(&pool) {
        Ok(listings) => ctx.insert("pending_pg_listings", &listings),
        Err(e) => {
            log::error!("Failed to fetch pending PG listings: {}", e);
            ctx.insert("pending_pg_listings", &Vec::<String>::new());
        }
    }

    match admin_helpers::fetch_pending_success_stories(&pool) {
        Ok(stories) => ctx.insert("pending_success_stories", &stories),
        Err(e) => {
            log::error!("Failed to fetch pending success stories: {}", e);
            ctx.insert("pending_success_stories", &Vec::<String>::new());
        }
    }

    match tera.render("admin/dashboard.html", &ctx) {
        Ok(rendered) => HttpResponse::Ok().content_type("text/html; charset=utf-8").body(rendered),
        Err(err) => {
            log::error!("Template rendering error: {}", err);
            HttpResponse::InternalServerError().body("Error rendering admin dashboard.")
        }
    }
}

async fn update_settings_action(
    session: Session,
    pool: web::Data<crate::DbPool>,
    form: web::Bytes,
    config: web::Data<Config>,
) -> impl Responder {
    let parsed = match form_helpers::parse_form(&form) {
        Ok(p) => p,
        Err(response) => return response,
    };

    let max_size = parsed.get("max_file_upload_size_mb").map(|s| s.trim()).unwrap_or("10");
    let mime_types = parsed.get("allowed_mime_types").map(|s| s.trim()).unwrap_or("");
    let contact_email = parsed.get("contact_email").map(|s| s.trim()).unwrap_or("");

    if max_size.parse::<u64>().is_err() {
        set_notification(&session, "Invalid max file size. It must be a whole number.", "error");
        return back_to_dashboard(&config);
    }

    let results = [
        admin_helpers::update_setting(&pool, "max_file_upload_size_mb", max_size),
        admin_helpers::update_setting(&pool, "allowed_mime_types", mime_types),
        admin_helpers::update_setting(&pool, "contact_email", contact_email),
    ];

    if results.iter().all(|r| r.is_ok()) {
        set_notification(&session, "Settings updated successfully.", "success");
    } else {
        log::error!("Failed to update one or more settings.");
        set_notification(&session, "Failed to update settings in database.", "error");
    }
    back_to_dashboard(&config)
}

// ====================================================================
// ======================= COLLEGE MANAGEMENT ========================
// ====================================================================

fn college_details_from_form(
    parsed: &std::collections::HashMap<String, String>,
) -> Result<CollegeDetails, String> {
    let college_name = parsed
        .get("college_name")
        .map(|s| sanitization_helpers::strip_all_html(s.trim()))
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "College name is required.".to_string())?;

    let courses: Vec<Course> = match parsed.get("courses_json").map(|s| s.trim()).filter(|s| !s.is_empty()) {
        Some(json) => serde_json::from_str(json)
            .map_err(|e| format!("Invalid courses JSON: {}", e))?,
        None => Vec::new(),
    };

    let established_year = parsed
        .get("established_year")
        .and_then(|s| s.trim().parse::<u16>().ok());

    let opt = |key: &str| {
        parsed
            .get(key)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };

    Ok(CollegeDetails {
        college_name,
        city: opt("city"),
        state: opt("state"),
        description: opt("description").map(|d| sanitization_helpers::sanitize_markdown_content(&d)),
        website: opt("website"),
        established_year,
        image_url: opt("image_url"),
        courses,
        created_at: Utc::now(),
        last_updated_at: None,
    })
}

async fn create_college_action(
    session: Session,
    db: web::Data<Database>,
    form: web::Bytes,
    config: web::Data<Config>,
) -> impl Responder {
    let parsed = match form_helpers::parse_form(&form) {
        Ok(p) => p,
        Err(response) => return response,
    };

    match college_details_from_form(&parsed) {
        Ok(details) => match admin_helpers::create_college(&db, &details) {
            Ok(id) => {
                set_notification(&session, &format!("College '{}' created (id {}).", details.college_name, id), "success");
            }
            Err(e) => {
                log::error!("Failed to create college: {}", e);
                set_notification(&session, "Failed to create college.", "error");
            }
        },
        Err(message) => set_notification(&session, &message, "error"),
    }
    back_to_dashboard(&config)
}

async fn update_college_action(
    session: Session,
    db: web::Data<Database>,
    form: web::Bytes,
    config: web::Data<Config>,
) -> impl Responder {
    let parsed = match form_helpers::parse_form(&form) {
        Ok(p) => p,
        Err(response) => return response,
    };

    let college_id = match parsed.get("college_id").map(|s| s.trim()) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            set_notification(&session, "Missing college id.", "error");
            return back_to_dashboard(&config);
        }
    };

    match college_details_from_form(&parsed) {
        Ok(details) => match admin_helpers::update_college(&db, &college_id, &details) {
            Ok(_) => set_notification(&session, "College updated successfully.", "success"),
            Err(e) => {
                log::error!("Failed to update college {}: {}", college_id, e);
                set_notification(&session, "Failed to update college.", "error");
            }
        },
        Err(message) => set_notification(&session, &message, "error"),
    }
    back_to_dashboard(&config)
}

async fn delete_college_action(
    session: Session,
    db: web::Data<Database>,
    form: web::Bytes,
    config: web::Data<Config>,
) -> impl Responder {
    let parsed = match form_helpers::parse_form(&form) {
        Ok(p) => p,
        Err(response) => return response,
    };

    if let Some(college_id) = parsed.get("college_id").map(|s| s.trim()).filter(|s| !s.is_empty()) {
        match admin_helpers::delete_college(&db, college_id) {
            Ok(_) => set_notification(&session, "College deleted.", "success"),
            Err(e) => {
                log::error!("Failed to delete college {}: {}", college_id, e);
                set_notification(&session, "Failed to delete college.", "error");
            }
        }
    } else {
        set_notification(&session, "Missing college id.", "error");
    }
    back_to_dashboard(&config)
}

// ====================================================================
// ========================= BLOG MANAGEMENT =========================
// ====================================================================

async fn create_blog_action(
    session: Session,
    db: web::Data<Database>,
    form: web::Bytes,
    config: web::Data<Config>,
) -> impl Responder {
    let parsed = match form_helpers::parse_form(&form) {
        Ok(p) => p,
        Err(response) => return response,
    };

    let title = parsed
        .get("title")
        .map(|s| sanitization_helpers::strip_all_html(s.trim()))
        .filter(|s| !s.is_empty());
    let content = parsed.get("content").map(|s| s.as_str()).unwrap_or("");

    match title {
        Some(title) if !content.trim().is_empty() => {
            let clean_content = sanitization_helpers::sanitize_markdown_content(content);
            let result = content_db_operations::create_blog_post(
                &db,
                &title,
                parsed.get("slug").map(|s| s.as_str()),
                parsed.get("summary").map(|s| s.as_str()).unwrap_or(""),
                &clean_content,
                parsed.get("tags").map(|s| s.as_str()).unwrap_or(""),
                parsed.get("cover_image").map(|s| s.as_str()).filter(|s| !s.trim().is_empty()),
            );
            match result {
                Ok(id) => set_notification(&session, &format!("Post '{}' published (id {}).", title, id), "success"),
                Err(e) => {
                    log::error!("Failed to create blog post: {}", e);
                    set_notification(&session, "Failed to create blog post.", "error");
                }
            }
        }
        _ => set_notification(&session, "Title and content are required.", "error"),
    }
    back_to_dashboard(&config)
}

async fn update_blog_action(
    session: Session,
    db: web::Data<Database>,
    form: web::Bytes,
    config: web::Data<Config>,
) -> impl Responder {
    let parsed = match form_helpers::parse_form(&form) {
        Ok(p) => p,
        Err(response) => return response,
    };

    let post_id = match parsed.get("post_id").map(|s| s.trim()) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            set_notification(&session, "Missing post id.", "error");
            return back_to_dashboard(&config);
        }
    };

    let title = parsed
        .get("title")
        .map(|s| sanitization_helpers::strip_all_html(s.trim()))
        .filter(|s| !s.is_empty());
    let content = parsed.get("content").map(|s| s.as_str()).unwrap_or("");

    match title {
        Some(title) if !content.trim().is_empty() => {
            let clean_content = sanitization_helpers::sanitize_markdown_content(content);
            let result = content_db_operations::update_blog_post(
                &db,
                &post_id,
                &title,
                parsed.get("slug").map(|s| s.as_str()),
                parsed.get("summary").map(|s| s.as_str()).unwrap_or(""),
                &clean_content,
                parsed.get("tags").map(|s| s.as_str()).unwrap_or(""),
                parsed.get("cover_image").map(|s| s.as_str()).filter(|s| !s.trim().is_empty()),
            );
            match result {
                Ok(_) => set_notification(&session, "Post updated successfully.", "success"),
                Err(e) => {
                    log::error!("Failed to update blog post {}: {}", post_id, e);
                    set_notification(&session, "Failed to update blog post.", "error");
                }
            }
        }
        _ => set_notification(&session, "Title and content are required.", "error"),
    }
    back_to_dashboard(&config)
}

async fn delete_blog_action(
    session: Session,
    db: web::Data<Database>,
    form: web::Bytes,
    config: web::Data<Config>,
) -> impl Responder {
    let parsed = match form_helpers::parse_form(&form) {
        Ok(p) => p,
        Err(response) => return response,
    };

    if let Some(post_id) = parsed.get("post_id").map(|s| s.trim()).filter(|s| !s.is_empty()) {
        match content_db_operations::delete_blog_post(&db, post_id) {
            Ok(_) => set_notification(&session, "Post deleted.", "success"),
            Err(e) => {
                log::error!("Failed to delete blog post {}: {}", post_id, e);
                set_notification(&session, "Failed to delete blog post.", "error");
            }
        }
    } else {
        set_notification(&session, "Missing post id.", "error");
    }
    back_to_dashboard(&config)
}

// ====================================================================
// ================= PG LISTINGS & MODERATION QUEUE ==================
// ====================================================================

async fn create_pg_listing_action(
    session: Session,
    pool: web::Data<crate::DbPool>,
    form: web::Bytes,
    config: web::Data<Config>,
) -> impl Responder {
    let parsed = match form_helpers::parse_form(&form) {
        Ok(p) => p,
        Err(response) => return response,
    };

    let title = parsed.get("title").map(|s| s.trim()).unwrap_or("");
    let locality = parsed.get("locality").map(|s| s.trim()).unwrap_or("");
    let contact_phone = parsed.get("contact_phone").map(|s| s.trim()).unwrap_or("");
    let rent = parsed.get("rent_per_month").and_then(|s| s.trim().parse::<i64>().ok());

    match (title.is_empty(), locality.is_empty(), contact_phone.is_empty(), rent) {
        (false, false, false, Some(rent)) => {
            let conn = match pool.get() {
                Ok(c) => c,
                Err(e) => {
                    log::error!("Database pool error on PG listing create: {}", e);
                    set_notification(&session, "A database connection error occurred.", "error");
                    return back_to_dashboard(&config);
                }
            };
            let result = leads_db_operations::insert_pg_listing(
                &conn,
                title,
                locality,
                rent,
                parsed.get("gender").map(|s| s.trim()).filter(|s| !s.is_empty()),
                parsed.get("amenities").map(|s| s.trim()).filter(|s| !s.is_empty()),
                contact_phone,
            );
            match result {
                Ok(id) => set_notification(
                    &session,
                    &format!("PG listing '{}' created (id {}); approve it to publish.", title, id),
                    "success",
                ),
                Err(e) => {
                    log::error!("Failed to create PG listing: {}", e);
                    set_notification(&session, "Failed to create PG listing.", "error");
                }
            }
        }
        _ => set_notification(&session, "Title, locality, rent, and contact phone are required.", "error"),
    }
    back_to_dashboard(&config)
}

async fn upload_brochure_action(
    session: Session,
    pool: web::Data<crate::DbPool>,
    config: web::Data<Config>,
    payload: actix_multipart::Multipart,
) -> impl Responder {
    match admin_helpers::save_brochure_file(config.clone(), pool.clone(), payload).await {
        Ok(public_url) => {
            set_notification(
                &session,
                &format!("Brochure uploaded. Public URL: {}", public_url),
                "success",
            );
        }
        Err(e) => {
            log::error!("Brochure upload failed: {}", e);
            set_notification(&session, &format!("Upload failed: {}", e), "error");
        }
    }
    back_to_dashboard(&config)
}

/// One endpoint for the approve/delete moderation queue. The form names the
/// item kind, the action, and the row id.
async fn moderate_action(
    session: Session,
    pool: web::Data<crate::DbPool>,
    form: web::Bytes,
    config: web::Data<Config>,
) -> impl Responder {
    let parsed = match form_helpers::parse_form(&form) {
        Ok(p) => p,
        Err(response) => return response,
    };

    let kind = parsed.get("kind").map(|s| s.trim()).unwrap_or("");
    let action = parsed.get("action").map(|s| s.trim()).unwrap_or("");
    let id = parsed.get("id").and_then(|s| s.trim().parse::<i64>().ok()).unwrap_or(0);

    if id == 0 {
        set_notification(&session, "Invalid item id.", "error");
        return back_to_dashboard(&config);
    }

    let result = match (kind, action) {
        ("review", "approve") => admin_helpers::approve_review(&pool, id),
        ("review", "delete") => admin_helpers::delete_review(&pool, id),
        ("comment", "approve") => admin_helpers::approve_comment(&pool, id),
        ("comment", "delete") => admin_helpers::delete_comment(&pool, id),
        ("pg_listing", "approve") => admin_helpers::approve_pg_listing(&pool, id),
        ("pg_listing", "delete") => admin_helpers::delete_pg_listing(&pool, id),
        ("success_story", "approve") => admin_helpers::approve_success_story(&pool, id),
        _ => {
            set_notification(&session, "Unknown moderation action.", "error");
            return back_to_dashboard(&config);
        }
    };

    match result {
        Ok(0) => set_notification(&session, "Item not found.", "error"),
        Ok(_) => set_notification(&session, &format!("{} {}d.", kind, action), "success"),
        Err(e) => {
            log::error!("Moderation action {}/{} on id {} failed: {}", kind, action, id, e);
            set_notification(&session, "Moderation action failed.", "error");
        }
    }
    back_to_dashboard(&config)
}
