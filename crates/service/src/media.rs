//! Product gallery rules and upload URL rewriting.
//!
//! Rows store upload references as relative `/uploads/<file>` paths so the
//! public host can change without a data migration. Responses carry absolute
//! URLs built from the configured public base.

use models::json::{ProductImage, ProductImages};

use crate::errors::ServiceError;

pub const UPLOADS_PREFIX: &str = "/uploads/";

/// Rewrites image URLs between stored (relative) and public (absolute) form.
#[derive(Clone, Debug, Default)]
pub struct MediaUrls {
    public_base: String,
}

impl MediaUrls {
    pub fn new(public_base: &str) -> Self {
        Self { public_base: public_base.trim_end_matches('/').to_string() }
    }

    pub fn public_base(&self) -> &str { &self.public_base }

    /// Turn any URL pointing at our uploads into `/uploads/<file>`.
    ///
    /// Handles the configured base and any `scheme://host/uploads/..` form;
    /// URLs on other paths or hosts are left untouched.
    pub fn to_stored(&self, url: &str) -> String {
        let url = url.trim();
        if !self.public_base.is_empty() {
            if let Some(rest) = url.strip_prefix(&self.public_base) {
                if rest.starts_with(UPLOADS_PREFIX) {
                    return rest.to_string();
                }
            }
        }
        if url.starts_with(UPLOADS_PREFIX) {
            return url.to_string();
        }
        if let Some(path) = strip_origin(url) {
            if path.starts_with(UPLOADS_PREFIX) && self.public_base.is_empty() {
                return path.to_string();
            }
        }
        if let Some(rest) = url.strip_prefix("uploads/") {
            return format!("{UPLOADS_PREFIX}{rest}");
        }
        url.to_string()
    }

    /// Prefix relative upload paths with the public base.
    pub fn to_public(&self, url: &str) -> String {
        if url.starts_with(UPLOADS_PREFIX) && !self.public_base.is_empty() {
            format!("{}{}", self.public_base, url)
        } else {
            url.to_string()
        }
    }

    pub fn gallery_to_stored(&self, images: &mut [ProductImage]) {
        for img in images.iter_mut() {
            img.url = self.to_stored(&img.url);
        }
    }

    pub fn gallery_to_public(&self, images: &mut [ProductImage]) {
        for img in images.iter_mut() {
            img.url = self.to_public(&img.url);
        }
    }
}

/// Path part of an absolute `http(s)://host/path` URL.
fn strip_origin(url: &str) -> Option<&str> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    rest.find('/').map(|i| &rest[i..])
}

/// Clean up a gallery so exactly one image is the cover.
///
/// Blank URLs are dropped and duplicates removed (first occurrence wins). The
/// first flagged image keeps the flag; if none is flagged the first image
/// becomes the cover.
pub fn normalize_gallery(images: Vec<ProductImage>) -> Vec<ProductImage> {
    let mut out: Vec<ProductImage> = Vec::with_capacity(images.len());
    for mut img in images {
        img.url = img.url.trim().to_string();
        img.alt = img.alt.trim().to_string();
        if img.url.is_empty() || out.iter().any(|o| o.url == img.url) {
            continue;
        }
        out.push(img);
    }

    let cover_idx = out.iter().position(|i| i.is_cover).unwrap_or(0);
    for (i, img) in out.iter_mut().enumerate() {
        img.is_cover = i == cover_idx;
    }
    out
}

pub fn cover_of(images: &[ProductImage]) -> Option<&ProductImage> {
    images.iter().find(|i| i.is_cover).or_else(|| images.first())
}

/// Move the cover flag to the image with `url`.
pub fn set_cover(images: &mut ProductImages, url: &str) -> Result<(), ServiceError> {
    let url = url.trim();
    let idx = images
        .0
        .iter()
        .position(|i| i.url == url)
        .ok_or_else(|| ServiceError::NotFound(format!("image '{url}' not in gallery")))?;
    for (i, img) in images.0.iter_mut().enumerate() {
        img.is_cover = i == idx;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn img(url: &str, cover: bool) -> ProductImage {
        ProductImage { url: url.into(), alt: String::new(), is_cover: cover }
    }

    #[test]
    fn first_image_becomes_cover_when_none_flagged() {
        let g = normalize_gallery(vec![img("/uploads/a.png", false), img("/uploads/b.png", false)]);
        assert!(g[0].is_cover);
        assert!(!g[1].is_cover);
    }

    #[test]
    fn only_first_flagged_image_keeps_cover() {
        let g = normalize_gallery(vec![
            img("/uploads/a.png", false),
            img("/uploads/b.png", true),
            img("/uploads/c.png", true),
        ]);
        let covers: Vec<_> = g.iter().filter(|i| i.is_cover).map(|i| i.url.as_str()).collect();
        assert_eq!(covers, vec!["/uploads/b.png"]);
    }

    #[test]
    fn blanks_and_duplicates_are_dropped() {
        let g = normalize_gallery(vec![img("  ", true), img("/uploads/a.png", false), img("/uploads/a.png", true)]);
        assert_eq!(g.len(), 1);
        assert!(g[0].is_cover);
    }

    #[test]
    fn empty_gallery_stays_empty() {
        assert!(normalize_gallery(vec![]).is_empty());
        assert!(cover_of(&[]).is_none());
    }

    #[test]
    fn set_cover_moves_flag() {
        let mut g = ProductImages(normalize_gallery(vec![img("/uploads/a.png", true), img("/uploads/b.png", false)]));
        set_cover(&mut g, "/uploads/b.png").unwrap();
        assert_eq!(cover_of(&g.0).unwrap().url, "/uploads/b.png");
        assert!(!g.0[0].is_cover);
        assert!(matches!(set_cover(&mut g, "/uploads/zzz.png"), Err(ServiceError::NotFound(_))));
    }

    #[test]
    fn stored_form_strips_public_base() {
        let m = MediaUrls::new("https://cdn.example.com/");
        assert_eq!(m.to_stored("https://cdn.example.com/uploads/a.png"), "/uploads/a.png");
        assert_eq!(m.to_stored("/uploads/a.png"), "/uploads/a.png");
        assert_eq!(m.to_stored("uploads/a.png"), "/uploads/a.png");
        assert_eq!(m.to_stored("https://other.org/uploads/x.png"), "https://other.org/uploads/x.png");
        assert_eq!(m.to_stored("https://cdn.example.com/img/a.png"), "https://cdn.example.com/img/a.png");
    }

    #[test]
    fn stored_form_without_base_strips_any_origin() {
        let m = MediaUrls::new("");
        assert_eq!(m.to_stored("http://localhost:8080/uploads/a.png"), "/uploads/a.png");
        assert_eq!(m.to_stored("https://example.com/pic.png"), "https://example.com/pic.png");
    }

    #[test]
    fn public_form_prefixes_relative_uploads() {
        let m = MediaUrls::new("https://cdn.example.com");
        assert_eq!(m.to_public("/uploads/a.png"), "https://cdn.example.com/uploads/a.png");
        assert_eq!(m.to_public("https://x.org/b.png"), "https://x.org/b.png");
        assert_eq!(MediaUrls::new("").to_public("/uploads/a.png"), "/uploads/a.png");
    }
}
