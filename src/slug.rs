//! URL-safe slug generation for surveys.
//!
//! Slugs are globally unique. Collisions are resolved by appending a
//! numeric suffix (`my-survey`, `my-survey-2`, ...), bounded by
//! [`MAX_SLUG_ATTEMPTS`] so pathological title collisions cannot loop
//! forever.

/// Upper bound on suffix attempts per title.
pub const MAX_SLUG_ATTEMPTS: usize = 50;

/// Lowercase, replace every non-alphanumeric run with a single `-`,
/// trim dashes. Empty titles fall back to `"survey"`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_dash = true;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        "survey".to_string()
    } else {
        slug
    }
}

/// Candidate slugs for a title, in preference order: the base slug,
/// then suffixed variants up to the attempt bound.
pub fn candidates(title: &str) -> impl Iterator<Item = String> {
    let base = slugify(title);
    (0..MAX_SLUG_ATTEMPTS).map(move |i| {
        if i == 0 {
            base.clone()
        } else {
            format!("{}-{}", base, i + 1)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Customer Feedback 2026"), "customer-feedback-2026");
        assert_eq!(slugify("  Édition spéciale!  "), "dition-sp-ciale");
        assert_eq!(slugify("---"), "survey");
        assert_eq!(slugify(""), "survey");
    }

    #[test]
    fn test_candidates_order_and_bound() {
        let all: Vec<String> = candidates("My Survey").collect();
        assert_eq!(all.len(), MAX_SLUG_ATTEMPTS);
        assert_eq!(all[0], "my-survey");
        assert_eq!(all[1], "my-survey-2");
        assert_eq!(all[2], "my-survey-3");
    }
}
