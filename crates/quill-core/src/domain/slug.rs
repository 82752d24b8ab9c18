//! Slug derivation for posts and categories.

/// Derive a URL-safe slug from a title.
///
/// Lowercased ASCII alphanumerics; every other run of characters collapses
/// into a single hyphen. Titles with no alphanumeric content produce an
/// empty slug, which callers must reject.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut gap = false;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if gap && !slug.is_empty() {
                slug.push('-');
            }
            gap = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            gap = true;
        }
    }
    slug
}

/// Candidate slugs for a base: the base itself, then `base-2`, `base-3`, ...
///
/// Callers walk the sequence until they find one the store does not hold,
/// which keeps slugs unique without ever mutating an existing one.
pub fn candidates(base: &str) -> impl Iterator<Item = String> + '_ {
    std::iter::once(base.to_string()).chain((2u32..).map(move |n| format!("{base}-{n}")))
}
