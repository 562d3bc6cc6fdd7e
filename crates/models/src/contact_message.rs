use sea_orm::{entity::prelude::*, Set, DatabaseConnection};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{errors::ModelError, validation};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contact_message")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub async fn create(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
    phone: Option<&str>,
    subject: Option<&str>,
    message: &str,
) -> Result<Model, ModelError> {
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(validation::required_text("name", name, 120)?),
        email: Set(validation::email(email)?),
        phone: Set(validation::phone(phone)?),
        subject: Set(validation::optional_text("subject", subject, 200)?),
        message: Set(validation::required_text("message", message, 5000)?),
        is_read: Set(false),
        created_at: Set(Utc::now().into()),
    };
    am.insert(db).await.map_err(ModelError::from)
}
