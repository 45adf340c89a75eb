//! Sitemap and llms.txt builders.
//!
//! Pure string generation over already-loaded records, so the exact same
//! slug codec feeds the live site and the offline batch output. The CLI in
//! `sitemap_cli` does the store walking and file writing.

use crate::helper::public_helpers::course_slug_at;
use crate::models::{BlogSummary, College};
use crate::seo::slug::{blog_path, college_path, course_path};

/// Every public URL the site exposes, canonical slugs throughout.
pub fn site_urls(base_url: &str, colleges: &[College], blogs: &[BlogSummary]) -> Vec<String> {
    let base = base_url.trim_end_matches('/');
    let mut urls = vec![
        format!("{}/", base),
        format!("{}/colleges", base),
        format!("{}/blog", base),
    ];

    for college in colleges {
        let slug = college.slug();
        urls.push(format!("{}{}", base, college_path(&slug)));
        urls.push(format!("{}{}/courses", base, college_path(&slug)));
        for (index, course) in college.details.courses.iter().enumerate() {
            let course_slug = course_slug_at(course, index);
            urls.push(format!("{}{}", base, course_path(&slug, &course_slug)));
        }
    }

    for post in blogs {
        urls.push(format!(
            "{}{}",
            base,
            blog_path(&post.metadata.slug_token(), &post.id)
        ));
    }

    urls
}

/// Render a sitemap for the given URLs. `lastmod` is a `YYYY-MM-DD` date
/// supplied by the caller so output stays deterministic.
pub fn build_sitemap_xml(urls: &[String], lastmod: &str) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n");
    for url in urls {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(url)));
        xml.push_str(&format!("    <lastmod>{}</lastmod>\n", escape_xml(lastmod)));
        xml.push_str("  </url>\n");
    }
    xml.push_str("</urlset>\n");
    xml
}

/// LLM-discovery text file: a short site summary plus canonical links.
pub fn build_llms_txt(base_url: &str, colleges: &[College], blogs: &[BlogSummary]) -> String {
    let base = base_url.trim_end_matches('/');
    let mut out = String::from("# Admitbase\n\n");
    out.push_str("College-admission counseling: college profiles, course listings, and admissions guidance.\n\n");

    out.push_str("## Colleges\n");
    for college in colleges {
        out.push_str(&format!(
            "- [{}]({}{})\n",
            college.details.college_name,
            base,
            college_path(&college.slug())
        ));
    }

    out.push_str("\n## Blog\n");
    for post in blogs {
        out.push_str(&format!(
            "- [{}]({}{})\n",
            post.metadata.title,
            base,
            blog_path(&post.metadata.slug_token(), &post.id)
        ));
    }

    out
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BlogMetadata, CollegeDetails, Course};
    use chrono::Utc;

    fn sample_college() -> College {
        College {
            id: "123e4567-e89b-12d3-a456-426614174000".to_string(),
            details: CollegeDetails {
                college_name: "Indian Institute of Tech".to_string(),
                city: Some("Delhi".to_string()),
                state: None,
                description: None,
                website: None,
                established_year: None,
                image_url: None,
                courses: vec![Course {
                    name: "MBA".to_string(),
                    level: "PG".to_string(),
                    brochure_url: None,
                    subcategories: vec![],
                }],
                created_at: Utc::now(),
                last_updated_at: None,
            },
        }
    }

    fn sample_blog() -> BlogSummary {
        BlogSummary {
            id: "00000000-0000-0000-0000-000000000001".to_string(),
            metadata: BlogMetadata {
                title: "Top MBA Colleges".to_string(),
                slug: None,
                summary: "".to_string(),
                cover_image: None,
                tags: vec![],
                created_at: Utc::now(),
                last_updated_at: None,
            },
        }
    }

    #[test]
    fn urls_use_the_canonical_slug_codec() {
        let college = sample_college();
        let urls = site_urls("https://example.com/", &[college.clone()], &[sample_blog()]);

        let college_url = format!("https://example.com/colleges/{}", college.slug());
        assert!(urls.contains(&college_url));
        assert!(urls.contains(&format!("{}/courses", college_url)));
        assert!(urls.contains(&format!("{}/courses/mba-pg-0", college_url)));
        assert!(urls.contains(
            &"https://example.com/blog/top-mba-colleges/00000000-0000-0000-0000-000000000001"
                .to_string()
        ));
    }

    #[test]
    fn sitemap_xml_wraps_every_url() {
        let urls = vec!["https://example.com/a?x=1&y=2".to_string()];
        let xml = build_sitemap_xml(&urls, "2026-08-07");
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<loc>https://example.com/a?x=1&amp;y=2</loc>"));
        assert!(xml.contains("<lastmod>2026-08-07</lastmod>"));
        assert!(xml.trim_end().ends_with("</urlset>"));
    }

    #[test]
    fn llms_txt_lists_colleges_and_posts() {
        let out = build_llms_txt("https://example.com", &[sample_college()], &[sample_blog()]);
        assert!(out.contains("Indian Institute of Tech"));
        assert!(out.contains("Top MBA Colleges"));
        assert!(out.contains("/blog/top-mba-colleges/"));
    }
}
