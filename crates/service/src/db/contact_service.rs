use common::pagination::{Page, Pagination};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use models::contact_message;

use crate::errors::ServiceError;

#[derive(Debug, Clone, Deserialize)]
pub struct ContactInput {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    pub message: String,
}

pub async fn submit_message(db: &DatabaseConnection, input: ContactInput) -> Result<contact_message::Model, ServiceError> {
    let created = contact_message::create(
        db,
        &input.name,
        &input.email,
        input.phone.as_deref(),
        input.subject.as_deref(),
        &input.message,
    )
    .await?;
    info!(id = %created.id, "contact_message_received");
    Ok(created)
}

/// Newest first; `unread = Some(true)` keeps unread messages only.
pub async fn list_messages(db: &DatabaseConnection, unread: Option<bool>, opts: Pagination) -> Result<Page<contact_message::Model>, ServiceError> {
    let mut q = contact_message::Entity::find();
    if let Some(unread) = unread {
        q = q.filter(contact_message::Column::IsRead.eq(!unread));
    }
    let (page_idx, per_page) = opts.normalize();
    let paginator = q.order_by_desc(contact_message::Column::CreatedAt).paginate(db, per_page);
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(page_idx).await?;
    Ok(Page::new(items, total, opts))
}

pub async fn mark_read(db: &DatabaseConnection, id: Uuid, read: bool) -> Result<contact_message::Model, ServiceError> {
    let existing = contact_message::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("message"))?;
    if existing.is_read == read {
        return Ok(existing);
    }
    let mut am: contact_message::ActiveModel = existing.into();
    am.is_read = Set(read);
    let updated = am.update(db).await?;
    info!(id = %id, read, "contact_message_marked");
    Ok(updated)
}

pub async fn delete_message(db: &DatabaseConnection, id: Uuid) -> Result<bool, ServiceError> {
    let res = contact_message::Entity::delete_by_id(id).exec(db).await?;
    if res.rows_affected > 0 {
        info!(id = %id, "contact_message_deleted");
    }
    Ok(res.rows_affected > 0)
}

pub async fn unread_count(db: &DatabaseConnection) -> Result<u64, ServiceError> {
    Ok(contact_message::Entity::find()
        .filter(contact_message::Column::IsRead.eq(false))
        .count(db)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;

    fn input(email: &str, message: &str) -> ContactInput {
        ContactInput { name: "Lee".into(), email: email.into(), phone: None, subject: Some("Lead time".into()), message: message.into() }
    }

    #[tokio::test]
    async fn contact_inbox_flow() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };

        let m = submit_message(&db, input("lee@example.com", "How long for 5k units?")).await?;
        assert!(!m.is_read);
        let before = unread_count(&db).await?;
        assert!(before >= 1);

        let unread = list_messages(&db, Some(true), Pagination::new(1, 100)).await?;
        assert!(unread.items.iter().all(|x| !x.is_read));

        let read = mark_read(&db, m.id, true).await?;
        assert!(read.is_read);
        assert!(mark_read(&db, m.id, true).await?.is_read);

        assert!(matches!(submit_message(&db, input("not-an-email", "hi")).await, Err(ServiceError::Model(_))));
        assert!(matches!(submit_message(&db, input("a@b.co", &"x".repeat(5001))).await, Err(ServiceError::Model(_))));

        assert!(delete_message(&db, m.id).await?);
        assert!(matches!(mark_read(&db, m.id, false).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }
}
