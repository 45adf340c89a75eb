//! Slug codec shared by the live routes and the offline sitemap tooling.
//!
//! College slugs carry a base-36 encoding of the record UUID as their
//! trailing token, so the human-readable prefix can drift freely when a
//! college is renamed without breaking old links. Blog identity travels in a
//! separate path segment; course identity is positional within the parent
//! college. All functions here are pure and total.

use regex::Regex;
use uuid::Uuid;

use crate::seo::course_level::CourseLevel;

/// Token returned for empty or all-punctuation input.
pub const SLUG_FALLBACK: &str = "item";

/// Normalize arbitrary text into a lowercase, hyphen-separated, ASCII-only
/// URL token. Diacritics are folded, runs of anything else collapse into a
/// single hyphen, and edge hyphens are trimmed. Never returns an empty
/// string and never fails.
pub fn slugify(text: &str) -> String {
    let folded = fold_diacritics(&text.to_lowercase());
    let re = Regex::new(r"[^a-z0-9]+").unwrap();
    let replaced = re.replace_all(folded.trim(), "-");
    let slug = replaced.trim_matches('-');
    if slug.is_empty() {
        SLUG_FALLBACK.to_string()
    } else {
        slug.to_string()
    }
}

// Latin diacritics seen in admin-entered college and author names. Anything
// not covered simply drops out at the regex stage.
fn fold_diacritics(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' => out.push('a'),
            'æ' => out.push_str("ae"),
            'ç' | 'ć' | 'č' => out.push('c'),
            'đ' | 'ď' => out.push('d'),
            'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ě' => out.push('e'),
            'ì' | 'í' | 'î' | 'ï' | 'ī' => out.push('i'),
            'ł' => out.push('l'),
            'ñ' | 'ń' => out.push('n'),
            'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' => out.push('o'),
            'œ' => out.push_str("oe"),
            'ř' => out.push('r'),
            'š' | 'ś' => out.push('s'),
            'ß' => out.push_str("ss"),
            'ť' | 'ţ' => out.push('t'),
            'ù' | 'ú' | 'û' | 'ü' | 'ū' => out.push('u'),
            'ý' | 'ÿ' => out.push('y'),
            'ž' | 'ź' | 'ż' => out.push('z'),
            _ => out.push(c),
        }
    }
    out
}

const BASE36_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Encode a 128-bit value in lowercase base-36.
pub fn encode_base36(mut value: u128) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut reversed = String::new();
    while value > 0 {
        reversed.push(BASE36_ALPHABET[(value % 36) as usize] as char);
        value /= 36;
    }
    reversed.chars().rev().collect()
}

/// Decode a base-36 token back into a 128-bit value. Case-insensitive.
/// Returns `None` on empty input, foreign characters, or overflow.
pub fn decode_base36(token: &str) -> Option<u128> {
    if token.is_empty() {
        return None;
    }
    let mut value: u128 = 0;
    for c in token.chars() {
        let digit = c.to_digit(36)? as u128;
        value = value.checked_mul(36)?.checked_add(digit)?;
    }
    Some(value)
}

/// Build the canonical slug for a college: slugified name plus a base-36
/// rendering of the UUID as the identity token. A malformed id degrades to
/// the bare name slug rather than failing.
pub fn create_college_slug(id: &str, college_name: &str) -> String {
    let name_slug = slugify(college_name);
    match Uuid::parse_str(id) {
        Ok(uuid) => format!("{}-{}", name_slug, encode_base36(uuid.as_u128())),
        Err(_) => name_slug,
    }
}

/// Recover the college UUID from an incoming slug.
///
/// Accepts either the canonical `{name}-{base36}` form (only the trailing
/// token is inspected, the name part never matters) or a bare legacy UUID
/// kept alive for old links. Returns the hyphenated lowercase UUID string,
/// or `None` when neither pattern yields one.
pub fn extract_college_id_from_slug(slug: &str) -> Option<String> {
    if let Ok(uuid) = Uuid::parse_str(slug) {
        return Some(uuid.to_string());
    }

    let token = slug.rsplit('-').next()?;
    let value = decode_base36(token)?;
    let hex = format!("{:032x}", value);
    let candidate = format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    );
    Uuid::parse_str(&candidate).ok().map(|u| u.to_string())
}

/// Cosmetic slug for a blog post: the admin-entered slug column wins when
/// present, otherwise the title. Identity rides in the id path segment, so
/// this text is free to drift.
pub fn create_blog_slug(slug_field: Option<&str>, title: &str) -> String {
    match slug_field {
        Some(s) if !s.trim().is_empty() => slugify(s),
        _ => slugify(title),
    }
}

/// Slug for a course inside a college's `courses` array. Identity is the
/// array index; the name and level tokens are cosmetic.
pub fn create_course_slug(course_name: &str, level: &CourseLevel, index: usize) -> String {
    format!("{}-{}-{}", slugify(course_name), level.slug_token(), index)
}

/// Best-effort extraction of the trailing array index from a course slug.
pub fn parse_course_slug(slug: &str) -> Option<usize> {
    slug.rsplit('-').next()?.parse().ok()
}

/// Canonical site path for a college detail page.
pub fn college_path(college_slug: &str) -> String {
    format!("/colleges/{}", college_slug)
}

/// Canonical site path for a course detail page.
pub fn course_path(college_slug: &str, course_slug: &str) -> String {
    format!("/colleges/{}/courses/{}", college_slug, course_slug)
}

/// Canonical site path for a blog post. The id segment is authoritative.
pub fn blog_path(blog_slug: &str, id: &str) -> String {
    format!("/blog/{}/{}", blog_slug, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seo::course_level::normalize_course_level;

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("Indian Institute of Tech"), "indian-institute-of-tech");
        assert_eq!(slugify("  B.Tech (CSE) -- 2024  "), "b-tech-cse-2024");
    }

    #[test]
    fn slugify_is_idempotent() {
        for input in ["Hello World!", "déjà vu", "--a--b--", "ALL CAPS", "item"] {
            let once = slugify(input);
            assert_eq!(slugify(&once), once, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn slugify_is_total() {
        assert_eq!(slugify(""), SLUG_FALLBACK);
        assert_eq!(slugify("!!!"), SLUG_FALLBACK);
        assert_eq!(slugify("   "), SLUG_FALLBACK);
        assert_eq!(slugify("---"), SLUG_FALLBACK);
    }

    #[test]
    fn slugify_folds_diacritics() {
        assert_eq!(slugify("École Polytechnique"), "ecole-polytechnique");
        assert_eq!(slugify("Universität zu Köln"), "universitat-zu-koln");
    }

    #[test]
    fn base36_round_trip() {
        for value in [0u128, 1, 35, 36, u128::MAX, 0x123e4567e89b12d3a456426614174000] {
            assert_eq!(decode_base36(&encode_base36(value)), Some(value));
        }
    }

    #[test]
    fn decode_base36_rejects_garbage() {
        assert_eq!(decode_base36(""), None);
        assert_eq!(decode_base36("not base36!"), None);
        // 26 chars of 'z' overflows 128 bits.
        assert_eq!(decode_base36(&"z".repeat(26)), None);
    }

    #[test]
    fn college_slug_round_trip() {
        let id = "123e4567-e89b-12d3-a456-426614174000";
        let slug = create_college_slug(id, "Indian Institute of Tech");
        assert!(slug.starts_with("indian-institute-of-tech-"));
        assert_eq!(extract_college_id_from_slug(&slug).as_deref(), Some(id));
    }

    #[test]
    fn college_slug_round_trip_uppercase_id() {
        let slug = create_college_slug("123E4567-E89B-12D3-A456-426614174000", "Test College");
        assert_eq!(
            extract_college_id_from_slug(&slug).as_deref(),
            Some("123e4567-e89b-12d3-a456-426614174000")
        );
    }

    #[test]
    fn legacy_raw_uuid_passes_through() {
        let id = "123e4567-e89b-12d3-a456-426614174000";
        assert_eq!(extract_college_id_from_slug(id).as_deref(), Some(id));
    }

    #[test]
    fn malformed_college_id_degrades_to_name_slug() {
        assert_eq!(create_college_slug("not-a-uuid", "Some College"), "some-college");
    }

    #[test]
    fn extract_rejects_unresolvable_slug() {
        assert_eq!(extract_college_id_from_slug(""), None);
        assert_eq!(extract_college_id_from_slug("no/token/here!"), None);
    }

    #[test]
    fn blog_slug_prefers_slug_field() {
        assert_eq!(create_blog_slug(Some("top-mba-colleges"), "ignored"), "top-mba-colleges");
        assert_eq!(create_blog_slug(Some("   "), "Fallback Title"), "fallback-title");
        assert_eq!(create_blog_slug(None, "Fallback Title"), "fallback-title");
    }

    #[test]
    fn course_slug_is_stable_and_parses() {
        let level = normalize_course_level("UG");
        let a = create_course_slug("B.Tech", &level, 2);
        let b = create_course_slug("B.Tech", &level, 2);
        assert_eq!(a, b);
        assert_eq!(a, "b-tech-ug-2");
        assert_eq!(parse_course_slug(&a), Some(2));
    }

    #[test]
    fn parse_course_slug_tolerates_missing_index() {
        assert_eq!(parse_course_slug("mba-pg"), None);
        assert_eq!(parse_course_slug(""), None);
        assert_eq!(parse_course_slug("mba-pg-17"), Some(17));
    }
}
