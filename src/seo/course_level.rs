//! Canonical course levels and the alias table that absorbs years of
//! free-text admin input ("Ph.D.", "post graduation", "working profs").
//!
//! Every level-string comparison in the crate goes through here. Unknown
//! values are never rejected: they canonicalize into a stable derived token
//! so that identical inputs keep producing identical slugs.

use crate::seo::slug::slugify;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CourseLevel {
    Ug,
    Pg,
    UgPg,
    Certificate,
    Diploma,
    Doctoral,
    WorkingProfessionals,
    /// Unrecognized admin input, carried as its derived canonical token
    /// (uppercase, underscore-joined).
    Other(String),
}

impl CourseLevel {
    /// Canonical storage/comparison token.
    pub fn canonical_token(&self) -> String {
        match self {
            CourseLevel::Ug => "UG".to_string(),
            CourseLevel::Pg => "PG".to_string(),
            CourseLevel::UgPg => "UG_PG".to_string(),
            CourseLevel::Certificate => "CERTIFICATE".to_string(),
            CourseLevel::Diploma => "DIPLOMA".to_string(),
            CourseLevel::Doctoral => "DOCTORAL".to_string(),
            CourseLevel::WorkingProfessionals => "WORKING_PROFESSIONALS".to_string(),
            CourseLevel::Other(token) => token.clone(),
        }
    }

    /// Human-facing label for listings and the admin dashboard.
    pub fn display_label(&self) -> String {
        match self {
            CourseLevel::Ug => "Undergraduate".to_string(),
            CourseLevel::Pg => "Postgraduate".to_string(),
            CourseLevel::UgPg => "UG & PG".to_string(),
            CourseLevel::Certificate => "Certificate".to_string(),
            CourseLevel::Diploma => "Diploma".to_string(),
            CourseLevel::Doctoral => "Doctoral".to_string(),
            CourseLevel::WorkingProfessionals => "Working Professionals".to_string(),
            CourseLevel::Other(token) => title_case(token),
        }
    }

    /// URL-facing token used inside course slugs.
    pub fn slug_token(&self) -> String {
        match self {
            CourseLevel::Ug => "ug".to_string(),
            CourseLevel::Pg => "pg".to_string(),
            CourseLevel::UgPg => "ug-pg".to_string(),
            CourseLevel::Certificate => "certificate".to_string(),
            CourseLevel::Diploma => "diploma".to_string(),
            CourseLevel::Doctoral => "doctoral".to_string(),
            CourseLevel::WorkingProfessionals => "working-professionals".to_string(),
            CourseLevel::Other(token) => slugify(&token.replace('_', " ")),
        }
    }

    /// Stable ordering for grouped course listings.
    pub fn sort_rank(&self) -> u8 {
        match self {
            CourseLevel::Ug => 0,
            CourseLevel::Pg => 1,
            CourseLevel::UgPg => 2,
            CourseLevel::Diploma => 3,
            CourseLevel::Certificate => 4,
            CourseLevel::Doctoral => 5,
            CourseLevel::WorkingProfessionals => 6,
            CourseLevel::Other(_) => 7,
        }
    }
}

/// Map raw admin input to a canonical level. Matching is case, whitespace,
/// and punctuation insensitive. Empty input falls back to UG; unknown input
/// becomes a stable `Other` token instead of an error.
pub fn normalize_course_level(raw: &str) -> CourseLevel {
    let key = normalize_key(raw);
    if key.is_empty() {
        return CourseLevel::Ug;
    }
    lookup_alias(&key).unwrap_or_else(|| CourseLevel::Other(derive_token(raw)))
}

/// Inverse lookup for the URL-facing level token. Known tokens hit the
/// static table; anything else is re-derived from a hyphen-to-space guess.
/// Only empty input yields `None`.
pub fn course_level_from_slug_token(token: &str) -> Option<CourseLevel> {
    let level = match token {
        "ug" => CourseLevel::Ug,
        "pg" => CourseLevel::Pg,
        "ug-pg" => CourseLevel::UgPg,
        "certificate" => CourseLevel::Certificate,
        "diploma" => CourseLevel::Diploma,
        "doctoral" => CourseLevel::Doctoral,
        "working-professionals" => CourseLevel::WorkingProfessionals,
        _ => {
            if token.trim().is_empty() {
                return None;
            }
            normalize_course_level(&token.replace('-', " "))
        }
    };
    Some(level)
}

// The one alias table. Keys are `normalize_key` output: uppercase with all
// non-alphanumerics removed, so "Ph.D.", "ph d" and "PHD" collapse together.
// New aliases are a one-line addition to the matching arm.
fn lookup_alias(key: &str) -> Option<CourseLevel> {
    let level = match key {
        "UG" | "UNDERGRADUATE" | "UNDERGRAD" | "BACHELOR" | "BACHELORS" | "GRADUATION" => {
            CourseLevel::Ug
        }
        "PG" | "POSTGRADUATE" | "POSTGRAD" | "POSTGRADUATION" | "MASTER" | "MASTERS" => {
            CourseLevel::Pg
        }
        "UGPG" | "UGANDPG" | "UGPGBOTH" => CourseLevel::UgPg,
        "CERTIFICATE" | "CERTIFICATION" | "CERT" => CourseLevel::Certificate,
        "DIPLOMA" | "PGDIPLOMA" | "ADVANCEDDIPLOMA" => CourseLevel::Diploma,
        "DOCTORAL" | "DOCTORATE" | "PHD" | "DPHIL" => CourseLevel::Doctoral,
        "WORKINGPROFESSIONALS" | "WORKINGPROFESSIONAL" | "FORWORKINGPROFESSIONALS"
        | "EXECUTIVE" => CourseLevel::WorkingProfessionals,
        _ => return None,
    };
    Some(level)
}

fn normalize_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

// Derived token for unknown input: uppercase words joined by underscores.
// Deterministic, so repeated identical inputs agree.
fn derive_token(raw: &str) -> String {
    let token: Vec<String> = raw
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| part.to_ascii_uppercase())
        .collect();
    token.join("_")
}

fn title_case(token: &str) -> String {
    token
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => {
                    first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doctoral_aliases_converge() {
        assert_eq!(normalize_course_level("phd"), CourseLevel::Doctoral);
        assert_eq!(normalize_course_level("Ph.D."), CourseLevel::Doctoral);
        assert_eq!(normalize_course_level("DOCTORATE"), CourseLevel::Doctoral);
        assert_eq!(normalize_course_level("phd").canonical_token(), "DOCTORAL");
    }

    #[test]
    fn common_aliases_resolve() {
        assert_eq!(normalize_course_level("under graduate"), CourseLevel::Ug);
        assert_eq!(normalize_course_level("Post-Graduation"), CourseLevel::Pg);
        assert_eq!(normalize_course_level("ug & pg"), CourseLevel::UgPg);
        assert_eq!(
            normalize_course_level("For Working Professionals"),
            CourseLevel::WorkingProfessionals
        );
    }

    #[test]
    fn empty_input_falls_back_to_ug() {
        assert_eq!(normalize_course_level(""), CourseLevel::Ug);
        assert_eq!(normalize_course_level("  .  "), CourseLevel::Ug);
    }

    #[test]
    fn unknown_input_derives_stable_token() {
        let a = normalize_course_level("Online MBA!");
        let b = normalize_course_level("Online MBA!");
        assert_eq!(a, b);
        assert_eq!(a, CourseLevel::Other("ONLINE_MBA".to_string()));
        assert_eq!(a.slug_token(), "online-mba");
        assert_eq!(a.display_label(), "Online Mba");
    }

    #[test]
    fn slug_tokens_round_trip() {
        for level in [
            CourseLevel::Ug,
            CourseLevel::Pg,
            CourseLevel::UgPg,
            CourseLevel::Certificate,
            CourseLevel::Diploma,
            CourseLevel::Doctoral,
            CourseLevel::WorkingProfessionals,
            CourseLevel::Other("ONLINE_MBA".to_string()),
        ] {
            let token = level.slug_token();
            assert_eq!(course_level_from_slug_token(&token), Some(level));
        }
    }

    #[test]
    fn slug_token_lookup_rejects_empty_only() {
        assert_eq!(course_level_from_slug_token(""), None);
        assert_eq!(course_level_from_slug_token("   "), None);
        assert!(course_level_from_slug_token("evening-batch").is_some());
    }

    #[test]
    fn sort_ranks_are_stable() {
        assert!(CourseLevel::Ug.sort_rank() < CourseLevel::Pg.sort_rank());
        assert!(CourseLevel::Doctoral.sort_rank() < CourseLevel::Other("X".into()).sort_rank());
    }
}
