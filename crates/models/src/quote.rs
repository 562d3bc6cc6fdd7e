use sea_orm::{entity::prelude::*, Set, DatabaseConnection};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{errors::ModelError, product, validation};

/// Where a quote request stands. Admins may set any value at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "contacted")]
    Contacted,
    #[sea_orm(string_value = "quoted")]
    Quoted,
    #[sea_orm(string_value = "closed")]
    Closed,
}

impl QuoteStatus {
    pub const ALL: [QuoteStatus; 4] = [Self::Pending, Self::Contacted, Self::Quoted, Self::Closed];

    pub fn parse(s: &str) -> Result<Self, ModelError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "contacted" => Ok(Self::Contacted),
            "quoted" => Ok(Self::Quoted),
            "closed" => Ok(Self::Closed),
            other => Err(ModelError::Validation(format!("unknown quote status '{other}'"))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Contacted => "contacted",
            Self::Quoted => "quoted",
            Self::Closed => "closed",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "quote")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub product_id: Option<Uuid>,
    pub product_name: Option<String>,
    pub quantity: Option<i32>,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub details: Json,
    pub status: QuoteStatus,
    #[sea_orm(column_type = "Text", nullable)]
    pub admin_notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Product,
}

impl Related<product::Entity> for Entity {
    fn to() -> RelationDef { Relation::Product.def() }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Debug)]
pub struct NewQuote {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub product_id: Option<Uuid>,
    pub product_name: Option<String>,
    pub quantity: Option<i32>,
    pub message: String,
    pub details: Json,
}

pub async fn create(db: &DatabaseConnection, input: NewQuote) -> Result<Model, ModelError> {
    let name = validation::required_text("name", &input.name, 120)?;
    let email = validation::email(&input.email)?;
    let phone = validation::phone(input.phone.as_deref())?;
    let company = validation::optional_text("company", input.company.as_deref(), 160)?;
    let product_name = validation::optional_text("product_name", input.product_name.as_deref(), 200)?;
    let message = validation::required_text("message", &input.message, 5000)?;
    if let Some(q) = input.quantity {
        if q < 1 {
            return Err(ModelError::Validation("quantity must be >= 1".into()));
        }
    }
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        email: Set(email),
        phone: Set(phone),
        company: Set(company),
        product_id: Set(input.product_id),
        product_name: Set(product_name),
        quantity: Set(input.quantity),
        message: Set(message),
        details: Set(input.details),
        status: Set(QuoteStatus::Pending),
        admin_notes: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };
    am.insert(db).await.map_err(ModelError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_status_round_trips_through_parse() {
        for s in QuoteStatus::ALL {
            assert_eq!(QuoteStatus::parse(s.as_str()).unwrap(), s);
        }
        assert!(QuoteStatus::parse("won").is_err());
    }
}
