use actix_web::{web, HttpResponse};
use std::collections::HashMap;
use url::form_urlencoded;

/// Parses URL-encoded form data from bytes, handling potential UTF-8 errors gracefully.
pub fn parse_form(form_bytes: &web::Bytes) -> Result<HashMap<String, String>, HttpResponse> {
    let body = match String::from_utf8(form_bytes.to_vec()) {
        Ok(s) => s,
        Err(_) => return Err(HttpResponse::BadRequest().body("Invalid UTF-8 in request body.")),
    };
    Ok(form_urlencoded::parse(body.as_bytes()).into_owned().collect())
}

/// Pulls a mandatory, non-blank field out of a parsed form.
pub fn required_field<'a>(
    parsed: &'a HashMap<String, String>,
    name: &str,
) -> Result<&'a str, HttpResponse> {
    match parsed.get(name).map(|s| s.trim()) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(HttpResponse::BadRequest()
            .json(serde_json::json!({ "error": format!("Field '{}' is required.", name) }))),
    }
}

/// Optional field: present and non-blank, or `None`.
pub fn optional_field<'a>(parsed: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    parsed
        .get(name)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}
