//! Slug derivation for on-disk workflow directories.

use chrono::Utc;

/// Maximum slug length after truncation.
const MAX_SLUG_LEN: usize = 40;

/// Derive a URL-safe slug from a title: lowercase, runs of non-alphanumeric
/// characters collapse to a single `-`, leading/trailing dashes are trimmed,
/// and the result is truncated to 40 characters.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for character in title.chars() {
        if character.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(character.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug.truncate(MAX_SLUG_LEN);
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Derive a slug that does not collide with `existing`, appending `-1`,
/// `-2`, … until unique.
pub fn generate_unique_slug(title: &str, existing: &[String]) -> String {
    let base = slugify(title);
    if !existing.iter().any(|slug| *slug == base) {
        return base;
    }

    let mut counter = 1usize;
    loop {
        let candidate = format!("{base}-{counter}");
        if !existing.iter().any(|slug| *slug == candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Lexicographically sortable workflow identifier: a timestamp prefix
/// followed by the slugified title.
pub fn timestamped_id(title: &str) -> String {
    let prefix = Utc::now().format("%Y%m%d%H%M%S");
    let base = slugify(title);
    if base.is_empty() {
        prefix.to_string()
    } else {
        format!("{prefix}-{base}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_dashes() {
        assert_eq!(slugify("My Workflow"), "my-workflow");
        assert_eq!(slugify("Deploy -- to (prod)!"), "deploy-to-prod");
    }

    #[test]
    fn collapses_non_alphanumeric_runs() {
        assert_eq!(slugify("a___b...c"), "a-b-c");
    }

    #[test]
    fn trims_leading_and_trailing_dashes() {
        assert_eq!(slugify("  hello  "), "hello");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn truncates_to_forty_characters() {
        let slug = slugify("a".repeat(120).as_str());
        assert_eq!(slug.len(), 40);
    }

    #[test]
    fn truncation_never_ends_with_dash() {
        // The 40th character lands on a separator; trimming keeps the slug clean.
        let title = format!("{} {}", "a".repeat(39), "b".repeat(10));
        let slug = slugify(&title);
        assert!(slug.len() <= 40);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn slugs_match_the_documented_shape() {
        for title in ["My Workflow", "  x  ", "Ünïcode titlé", "123 go", "!!!"] {
            let slug = slugify(title);
            assert!(slug.len() <= 40);
            assert!(!slug.starts_with('-') && !slug.ends_with('-'), "slug {slug:?} has edge dash");
            assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        }
    }

    #[test]
    fn timestamped_ids_sort_by_creation() {
        let id = timestamped_id("My Workflow");
        assert!(id.ends_with("-my-workflow"));
        assert_eq!(id.split('-').next().map(str::len), Some(14));
    }

    #[test]
    fn unique_slug_appends_counters() {
        let existing = vec!["my-workflow".to_string(), "my-workflow-1".to_string()];
        assert_eq!(generate_unique_slug("My Workflow", &existing), "my-workflow-2");
        assert_eq!(generate_unique_slug("Other", &existing), "other");
    }
}
