//! Slug and key generation
//!
//! Reviews and lists get a slug with a random suffix so that two entries
//! whose names normalize identically still land on different keys. Ratings
//! pool entries use the suffix-free form: identical `(name, city)` pairs must
//! collide so a re-import overwrites the earlier record.

use rand::Rng;

/// Alphabet used for random slug suffixes
const SUFFIX_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Length of the random suffix appended to review and list slugs
pub const SUFFIX_LEN: usize = 4;

/// Lowercase `text` and collapse every run of characters outside `[a-z0-9]`
/// into a single hyphen, with no hyphen at either end.
///
/// Non-ASCII letters count as separators: `"Café Lola"` becomes `"caf-lola"`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for ch in text.to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Last element of a location list (the city), or `""` when empty
pub fn city_of(locations: &[String]) -> &str {
    locations.last().map(String::as_str).unwrap_or("")
}

/// Random lowercase alphanumeric string of `len` characters
pub fn random_suffix(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| SUFFIX_CHARS[rng.gen_range(0..SUFFIX_CHARS.len())] as char)
        .collect()
}

/// Generate a review or list slug: `slugify(name + " " + city)` plus a
/// random suffix.
///
/// Generated once at creation and never changed afterwards. When the name
/// and city contain nothing alphanumeric the slug is the suffix alone.
pub fn generate_slug(name: &str, locations: &[String]) -> String {
    let base = slugify(&format!("{} {}", name, city_of(locations)));
    let suffix = random_suffix(SUFFIX_LEN);

    if base.is_empty() {
        suffix
    } else {
        format!("{}-{}", base, suffix)
    }
}

/// Ratings pool de-duplication key: `slugify(name + " " + city)`, no suffix
pub fn pool_key(name: &str, locations: &[String]) -> String {
    slugify(&format!("{} {}", name, city_of(locations)))
}

/// Normalize a restaurant name for matching
///
/// Strips every non-alphanumeric character rather than collapsing runs, so
/// `"O-Ku"` and `"O Ku"` compare equal even though their slugs differ.
pub fn normalize_for_match(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}
