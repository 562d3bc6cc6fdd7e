//! Database-backed CMS services, one module per table.

use sea_orm::sea_query::{Expr, SimpleExpr};
use serde::{Deserialize, Deserializer};

pub mod category_service;
pub mod product_service;
pub mod post_service;
pub mod quote_service;
pub mod contact_service;
pub mod stats_service;

/// Distinguish a missing field (`None`) from an explicit `null` (`Some(None)`).
pub fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

/// `%term%` with LIKE wildcards in the user input escaped.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Case-insensitive match of `term` against any of the given text columns.
pub(crate) fn ilike_any(columns: &[&str], term: &str) -> SimpleExpr {
    let sql = columns
        .iter()
        .map(|c| format!("COALESCE({c}, '') ILIKE ?"))
        .collect::<Vec<_>>()
        .join(" OR ");
    let pattern = like_pattern(term);
    Expr::cust_with_values(format!("({sql})"), columns.iter().map(|_| pattern.clone()))
}

/// JSONB array column contains `tag`.
pub(crate) fn jsonb_has_tag(column: &str, tag: &str) -> SimpleExpr {
    let needle = serde_json::json!([tag.trim().to_lowercase()]).to_string();
    Expr::cust_with_values(format!("{column} @> CAST(? AS jsonb)"), [needle])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize, Default)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        category_id: Option<Option<u32>>,
    }

    #[test]
    fn double_option_distinguishes_null_from_missing() {
        let missing: Patch = serde_json::from_str("{}").unwrap();
        let null: Patch = serde_json::from_str(r#"{"category_id":null}"#).unwrap();
        let set: Patch = serde_json::from_str(r#"{"category_id":7}"#).unwrap();
        assert_eq!(missing.category_id, None);
        assert_eq!(null.category_id, Some(None));
        assert_eq!(set.category_id, Some(Some(7)));
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(" 50%_off "), "%50\\%\\_off%");
    }
}
