//! URL slugs: derivation from titles and per-table uniqueness.

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use models::{blog_post, product, product_category};

use crate::errors::ServiceError;

pub const MAX_SLUG_LEN: usize = 96;
const FALLBACK: &str = "item";
const MAX_ATTEMPTS: u32 = 1000;

/// Derive a slug: ASCII-transliterate, lowercase, keep `[a-z0-9]`, join the
/// rest with single dashes.
pub fn slugify(input: &str) -> String {
    let ascii = deunicode::deunicode(input);
    let mut out = String::with_capacity(ascii.len());
    let mut pending_dash = false;
    for ch in ascii.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    let out = truncate_slug(&out, MAX_SLUG_LEN);
    if out.is_empty() { FALLBACK.to_string() } else { out }
}

/// Cut to at most `max` bytes without leaving a trailing dash.
fn truncate_slug(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    // Slugs are pure ASCII so any byte index is a char boundary.
    s[..max].trim_end_matches('-').to_string()
}

pub fn validate_slug(s: &str) -> Result<(), ServiceError> {
    if s.is_empty() || s.len() > MAX_SLUG_LEN {
        return Err(ServiceError::Validation(format!("slug must be 1..={MAX_SLUG_LEN} characters")));
    }
    if !s.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-') {
        return Err(ServiceError::Validation("slug may contain only a-z, 0-9 and '-'".into()));
    }
    if s.starts_with('-') || s.ends_with('-') || s.contains("--") {
        return Err(ServiceError::Validation("slug has misplaced '-'".into()));
    }
    Ok(())
}

/// `base` for the first attempt, `base-n` afterwards; keeps the length bound.
pub fn next_candidate(base: &str, n: u32) -> String {
    if n <= 1 {
        return base.to_string();
    }
    let suffix = format!("-{n}");
    let head = truncate_slug(base, MAX_SLUG_LEN - suffix.len());
    format!("{head}{suffix}")
}

/// Tables that own a slug column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlugKind {
    Product,
    Post,
    Category,
}

/// Whether `slug` is used by a row other than `exclude`.
pub async fn is_taken(
    db: &DatabaseConnection,
    kind: SlugKind,
    slug: &str,
    exclude: Option<Uuid>,
) -> Result<bool, ServiceError> {
    let count = match kind {
        SlugKind::Product => {
            let mut q = product::Entity::find().filter(product::Column::Slug.eq(slug));
            if let Some(id) = exclude { q = q.filter(product::Column::Id.ne(id)); }
            q.count(db).await?
        }
        SlugKind::Post => {
            let mut q = blog_post::Entity::find().filter(blog_post::Column::Slug.eq(slug));
            if let Some(id) = exclude { q = q.filter(blog_post::Column::Id.ne(id)); }
            q.count(db).await?
        }
        SlugKind::Category => {
            let mut q = product_category::Entity::find().filter(product_category::Column::Slug.eq(slug));
            if let Some(id) = exclude { q = q.filter(product_category::Column::Id.ne(id)); }
            q.count(db).await?
        }
    };
    Ok(count > 0)
}

/// Resolve the slug to store.
///
/// An explicit slug must be valid and free, otherwise `Conflict`. A slug derived
/// from `title` gets `-2`, `-3`, ... appended until it is free.
pub async fn resolve(
    db: &DatabaseConnection,
    kind: SlugKind,
    explicit: Option<&str>,
    title: &str,
    exclude: Option<Uuid>,
) -> Result<String, ServiceError> {
    if let Some(s) = explicit.map(str::trim).filter(|s| !s.is_empty()) {
        validate_slug(s)?;
        if is_taken(db, kind, s, exclude).await? {
            return Err(ServiceError::Conflict(format!("slug '{s}' already in use")));
        }
        return Ok(s.to_string());
    }

    let base = slugify(title);
    for n in 1..=MAX_ATTEMPTS {
        let c = next_candidate(&base, n);
        if !is_taken(db, kind, &c, exclude).await? {
            return Ok(c);
        }
    }
    Err(ServiceError::Conflict(format!("no free slug for '{base}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_basic_titles() {
        assert_eq!(slugify("Precision CNC Machining"), "precision-cnc-machining");
        assert_eq!(slugify("  Hello,   World!  "), "hello-world");
        assert_eq!(slugify("M8 x 40 — Hex Bolt"), "m8-x-40-hex-bolt");
    }

    #[test]
    fn slugify_transliterates_unicode() {
        assert_eq!(slugify("Édition spéciale Ölfilter"), "edition-speciale-olfilter");
    }

    #[test]
    fn slugify_empty_falls_back() {
        assert_eq!(slugify("!!!"), "item");
        assert_eq!(slugify(""), "item");
    }

    #[test]
    fn slugify_truncates_without_trailing_dash() {
        let long = "word ".repeat(40);
        let s = slugify(&long);
        assert!(s.len() <= MAX_SLUG_LEN);
        assert!(!s.ends_with('-'));
        assert!(validate_slug(&s).is_ok());
    }

    #[test]
    fn validate_rejects_bad_slugs() {
        assert!(validate_slug("good-slug-1").is_ok());
        assert!(validate_slug("Bad").is_err());
        assert!(validate_slug("-lead").is_err());
        assert!(validate_slug("trail-").is_err());
        assert!(validate_slug("dou--ble").is_err());
        assert!(validate_slug("").is_err());
        assert!(validate_slug("with space").is_err());
    }

    #[test]
    fn candidate_appends_counter_within_bound() {
        assert_eq!(next_candidate("gear", 1), "gear");
        assert_eq!(next_candidate("gear", 3), "gear-3");
        let base = "a".repeat(MAX_SLUG_LEN);
        let c = next_candidate(&base, 12);
        assert_eq!(c.len(), MAX_SLUG_LEN);
        assert!(c.ends_with("-12"));
    }

    #[test]
    fn kind_deserializes_lowercase() {
        let k: SlugKind = serde_json::from_str("\"category\"").unwrap();
        assert_eq!(k, SlugKind::Category);
    }
}
