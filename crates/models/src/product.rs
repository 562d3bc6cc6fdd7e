use sea_orm::{entity::prelude::*, Set, DatabaseConnection};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    errors::ModelError,
    json::{ProductImages, Specifications, Tags},
    product_category, validation,
};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub summary: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    #[sea_orm(column_type = "JsonBinary")]
    pub images: ProductImages,
    #[sea_orm(column_type = "JsonBinary")]
    pub specifications: Specifications,
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: Tags,
    pub featured: bool,
    pub published: bool,
    pub sort_order: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product_category::Entity",
        from = "Column::CategoryId",
        to = "super::product_category::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Category,
}

impl Related<product_category::Entity> for Entity {
    fn to() -> RelationDef { Relation::Category.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_name(name: &str) -> Result<String, ModelError> {
    validation::required_text("name", name, 200)
}

/// Fields for a new product row; text fields are validated here, slug and
/// gallery are expected to be prepared by the caller.
#[derive(Clone, Debug, Default)]
pub struct NewProduct {
    pub name: String,
    pub slug: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub images: ProductImages,
    pub specifications: Specifications,
    pub tags: Tags,
    pub featured: bool,
    pub published: bool,
    pub sort_order: i32,
}

pub async fn create(db: &DatabaseConnection, input: NewProduct) -> Result<Model, ModelError> {
    let name = validate_name(&input.name)?;
    let summary = validation::optional_text("summary", input.summary.as_deref(), 500)?;
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        slug: Set(input.slug),
        summary: Set(summary),
        description: Set(input.description),
        category_id: Set(input.category_id),
        images: Set(input.images),
        specifications: Set(input.specifications),
        tags: Set(input.tags),
        featured: Set(input.featured),
        published: Set(input.published),
        sort_order: Set(input.sort_order),
        created_at: Set(now),
        updated_at: Set(now),
    };
    am.insert(db).await.map_err(ModelError::from)
}
