use actix_web::{dev, guard, FromRequest, HttpRequest};
use actix_session::{Session, SessionExt};
use serde::Serialize;
use std::env;
use std::future::{ready, Ready};

#[derive(Serialize)]
pub struct AuthenticatedAdmin {
    pub username: String,
}

impl FromRequest for AuthenticatedAdmin {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let session = req.get_session();
        let is_admin = session.get::<String>("role").unwrap_or(None) == Some("admin".to_string());
        match (is_admin, session.get::<String>("username").unwrap_or(None)) {
            (true, Some(username)) => ready(Ok(AuthenticatedAdmin { username })),
            _ => ready(Err(actix_web::error::ErrorUnauthorized("Not logged in."))),
        }
    }
}

pub fn admin_guard(session: &Session) -> bool {
    session.get::<String>("role").unwrap_or(None) == Some("admin".to_string())
}

pub fn ip_guard(ctx: &guard::GuardContext) -> bool {
    let allowed_ips_str = match env::var("ADMIN_LOGIN_ACCEPT_IP") {
        Ok(val) => val,
        Err(_) => {
            log::warn!("ADMIN_LOGIN_ACCEPT_IP is not set. Denying all admin login attempts.");
            return false;
        }
    };

    if allowed_ips_str.trim() == "*" {
        return true;
    }

    // Get the real IP, considering reverse proxies
    let request_ip = ctx.head().headers()
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next()) // Take the first IP if there's a list
        .map(|s| s.trim().to_string())
        .or_else(|| {
            ctx.head().peer_addr.map(|addr| addr.ip().to_string())
        });

    let peer_addr = match request_ip {
        Some(ip) => ip,
        None => {
            log::warn!("Could not determine peer IP address for admin login attempt.");
            return false;
        }
    };

    let is_allowed = allowed_ips_str.split(',').any(|ip| ip.trim() == peer_addr);

    if !is_allowed {
        log::warn!("Blocked admin login attempt from unauthorized IP: {}", peer_addr);
    }

    is_allowed
}
