use sea_orm::{entity::prelude::*, Set, DatabaseConnection, QueryFilter};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{errors::ModelError, validation};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "admin_user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub password_algorithm: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub last_login_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_email(email: &str) -> Result<String, ModelError> {
    validation::email(email)
}

pub fn validate_name(name: &str) -> Result<String, ModelError> {
    validation::required_text("name", name, 120)
}

pub async fn create(
    db: &DatabaseConnection,
    email: &str,
    name: &str,
    password_hash: String,
    algorithm: &str,
) -> Result<Model, ModelError> {
    let email = validate_email(email)?;
    let name = validate_name(name)?;
    if password_hash.trim().is_empty() {
        return Err(ModelError::Validation("password hash required".into()));
    }
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        name: Set(name),
        password_hash: Set(password_hash),
        password_algorithm: Set(algorithm.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        last_login_at: Set(None),
    };
    am.insert(db).await.map_err(ModelError::from)
}

pub async fn find_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<Model>, ModelError> {
    Entity::find()
        .filter(Column::Email.eq(email.trim().to_ascii_lowercase()))
        .one(db)
        .await
        .map_err(ModelError::from)
}

pub async fn set_password(db: &DatabaseConnection, id: Uuid, password_hash: String, algorithm: &str) -> Result<Model, ModelError> {
    let mut am: ActiveModel = Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(ModelError::from)?
        .ok_or_else(|| ModelError::Validation("admin user not found".into()))?
        .into();
    am.password_hash = Set(password_hash);
    am.password_algorithm = Set(algorithm.to_string());
    am.updated_at = Set(Utc::now().into());
    am.update(db).await.map_err(ModelError::from)
}

pub async fn touch_last_login(db: &DatabaseConnection, id: Uuid) -> Result<(), ModelError> {
    let am = ActiveModel {
        id: Set(id),
        last_login_at: Set(Some(Utc::now().into())),
        ..Default::default()
    };
    am.update(db).await.map_err(ModelError::from)?;
    Ok(())
}
