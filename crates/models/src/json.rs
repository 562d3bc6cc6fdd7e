//! Typed JSONB column payloads.

use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

/// One gallery entry of a product.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub url: String,
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub is_cover: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct ProductImages(pub Vec<ProductImage>);

/// Label/value row of a product's technical data sheet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecEntry {
    pub label: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct Specifications(pub Vec<SpecEntry>);

#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct Tags(pub Vec<String>);

impl Tags {
    /// Trim, lowercase, drop empties and duplicates while keeping first-seen order.
    pub fn normalized<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for t in raw {
            let t = t.as_ref().trim().to_lowercase();
            if !t.is_empty() && !out.contains(&t) {
                out.push(t);
            }
        }
        Tags(out)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_normalized() {
        let t = Tags::normalized([" Steel ", "steel", "", "CNC"]);
        assert_eq!(t.0, vec!["steel".to_string(), "cnc".to_string()]);
        assert!(t.contains("cnc"));
    }

    #[test]
    fn images_serialize_as_plain_array() {
        let imgs = ProductImages(vec![ProductImage { url: "/uploads/a.png".into(), alt: String::new(), is_cover: true }]);
        let v = serde_json::to_value(&imgs).unwrap();
        assert!(v.is_array());
        assert_eq!(v[0]["is_cover"], true);
        let back: ProductImages = serde_json::from_str(r#"[{"url":"/uploads/b.png"}]"#).unwrap();
        assert!(!back.0[0].is_cover);
    }
}
