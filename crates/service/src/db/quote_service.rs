use std::collections::HashMap;

use chrono::Utc;
use common::pagination::{Page, Pagination};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument};
use uuid::Uuid;

use models::quote::{self, QuoteStatus};
use models::{product, validation};

use crate::errors::ServiceError;

pub const MAX_DETAIL_KEYS: usize = 50;

/// Public quote request as posted by the wizard.
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteInput {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub product_id: Option<Uuid>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub quantity: Option<i32>,
    pub message: String,
    #[serde(default)]
    pub details: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuoteReceipt {
    pub id: Uuid,
    pub status: QuoteStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuotePatch {
    pub status: Option<String>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub admin_notes: Option<Option<String>>,
}

/// Wizard answers must be a JSON object of bounded size; absent or `null` becomes `{}`.
fn validate_details(details: Option<Value>) -> Result<Value, ServiceError> {
    match details {
        None | Some(Value::Null) => Ok(Value::Object(Default::default())),
        Some(Value::Object(map)) => {
            if map.len() > MAX_DETAIL_KEYS {
                return Err(ServiceError::Validation(format!("details may hold at most {MAX_DETAIL_KEYS} keys")));
            }
            Ok(Value::Object(map))
        }
        Some(_) => Err(ServiceError::Validation("details must be a JSON object".into())),
    }
}

#[instrument(skip(db, input), fields(email = %input.email))]
pub async fn submit_quote(db: &DatabaseConnection, input: QuoteInput) -> Result<QuoteReceipt, ServiceError> {
    let details = validate_details(input.details)?;
    let mut product_name = input.product_name.filter(|n| !n.trim().is_empty());
    if let Some(pid) = input.product_id {
        let p = product::Entity::find_by_id(pid)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::Validation(format!("product {pid} does not exist")))?;
        if product_name.is_none() {
            product_name = Some(p.name);
        }
    }

    let created = quote::create(db, quote::NewQuote {
        name: input.name,
        email: input.email,
        phone: input.phone,
        company: input.company,
        product_id: input.product_id,
        product_name,
        quantity: input.quantity,
        message: input.message,
        details,
    })
    .await?;
    info!(id = %created.id, product = ?created.product_id, "quote_submitted");
    Ok(QuoteReceipt { id: created.id, status: created.status })
}

pub fn parse_status(s: &str) -> Result<QuoteStatus, ServiceError> {
    Ok(QuoteStatus::parse(s)?)
}

/// Newest first, optionally restricted to one status.
pub async fn list_quotes(db: &DatabaseConnection, status: Option<QuoteStatus>, opts: Pagination) -> Result<Page<quote::Model>, ServiceError> {
    let mut q = quote::Entity::find();
    if let Some(s) = status {
        q = q.filter(quote::Column::Status.eq(s));
    }
    let (page_idx, per_page) = opts.normalize();
    let paginator = q.order_by_desc(quote::Column::CreatedAt).paginate(db, per_page);
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(page_idx).await?;
    Ok(Page::new(items, total, opts))
}

pub async fn get_quote(db: &DatabaseConnection, id: Uuid) -> Result<Option<quote::Model>, ServiceError> {
    Ok(quote::Entity::find_by_id(id).one(db).await?)
}

#[instrument(skip(db, patch))]
pub async fn update_quote(db: &DatabaseConnection, id: Uuid, patch: QuotePatch) -> Result<quote::Model, ServiceError> {
    let existing = get_quote(db, id).await?.ok_or_else(|| ServiceError::not_found("quote"))?;
    let mut am: quote::ActiveModel = existing.into();
    if let Some(s) = patch.status.as_deref() {
        am.status = Set(parse_status(s)?);
    }
    if let Some(notes) = patch.admin_notes {
        am.admin_notes = Set(validation::optional_text("admin_notes", notes.as_deref(), 5000)?);
    }
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await?;
    info!(id = %updated.id, status = updated.status.as_str(), "quote_updated");
    Ok(updated)
}

pub async fn delete_quote(db: &DatabaseConnection, id: Uuid) -> Result<bool, ServiceError> {
    let res = quote::Entity::delete_by_id(id).exec(db).await?;
    if res.rows_affected > 0 {
        info!(id = %id, "quote_deleted");
    }
    Ok(res.rows_affected > 0)
}

/// Count per status; every status is present, zero when unused.
pub async fn counts_by_status(db: &DatabaseConnection) -> Result<HashMap<QuoteStatus, u64>, ServiceError> {
    let rows: Vec<(QuoteStatus, i64)> = quote::Entity::find()
        .select_only()
        .column(quote::Column::Status)
        .column_as(quote::Column::Id.count(), "count")
        .group_by(quote::Column::Status)
        .into_tuple()
        .all(db)
        .await?;
    let mut out: HashMap<QuoteStatus, u64> = QuoteStatus::ALL.iter().map(|s| (*s, 0)).collect();
    for (s, n) in rows {
        out.insert(s, n.max(0) as u64);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use crate::test_support::get_db;

    #[test]
    fn details_must_be_a_small_object() {
        assert_eq!(validate_details(None).unwrap(), json!({}));
        assert_eq!(validate_details(Some(Value::Null)).unwrap(), json!({}));
        assert!(validate_details(Some(json!({"material": "steel"}))).is_ok());
        assert!(validate_details(Some(json!(["a"]))).is_err());

        let big: serde_json::Map<String, Value> = (0..=MAX_DETAIL_KEYS).map(|i| (format!("k{i}"), json!(i))).collect();
        assert!(matches!(validate_details(Some(Value::Object(big))), Err(ServiceError::Validation(_))));
    }

    #[test]
    fn unknown_status_is_a_validation_error() {
        assert!(parse_status("Quoted").is_ok());
        assert!(matches!(parse_status("lost"), Err(ServiceError::Model(_))));
    }

    #[test]
    fn patch_distinguishes_cleared_notes() {
        let p: QuotePatch = serde_json::from_str(r#"{"admin_notes":null}"#).unwrap();
        assert_eq!(p.admin_notes, Some(None));
        assert!(p.status.is_none());
    }

    #[tokio::test]
    async fn quote_flow_copies_product_name() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };

        let p = product::create(&db, product::NewProduct {
            name: "Gear pump GP-20".into(),
            slug: format!("gear-pump-{}", Uuid::new_v4().simple()),
            ..Default::default()
        })
        .await?;

        let receipt = submit_quote(&db, QuoteInput {
            name: "Ana".into(),
            email: "Ana@Example.com".into(),
            phone: None,
            company: Some("ACME".into()),
            product_id: Some(p.id),
            product_name: None,
            quantity: Some(200),
            message: "Need pricing".into(),
            details: Some(json!({"finish": "anodized"})),
        })
        .await?;
        assert_eq!(receipt.status, QuoteStatus::Pending);

        let q = get_quote(&db, receipt.id).await?.expect("quote stored");
        assert_eq!(q.product_name.as_deref(), Some("Gear pump GP-20"));
        assert_eq!(q.email, "ana@example.com");

        let updated = update_quote(&db, q.id, QuotePatch { status: Some("quoted".into()), admin_notes: Some(Some("sent PDF".into())) }).await?;
        assert_eq!(updated.status, QuoteStatus::Quoted);
        assert_eq!(updated.admin_notes.as_deref(), Some("sent PDF"));

        let counts = counts_by_status(&db).await?;
        assert!(counts[&QuoteStatus::Quoted] >= 1);
        assert_eq!(counts.len(), QuoteStatus::ALL.len());

        let page = list_quotes(&db, Some(QuoteStatus::Quoted), Pagination::default()).await?;
        assert!(page.items.iter().all(|x| x.status == QuoteStatus::Quoted));

        let missing = submit_quote(&db, QuoteInput {
            name: "Ana".into(),
            email: "ana@example.com".into(),
            phone: None,
            company: None,
            product_id: Some(Uuid::new_v4()),
            product_name: None,
            quantity: None,
            message: "x".into(),
            details: None,
        })
        .await;
        assert!(matches!(missing, Err(ServiceError::Validation(_))));

        assert!(delete_quote(&db, q.id).await?);
        product::Entity::delete_by_id(p.id).exec(&db).await?;
        Ok(())
    }
}
