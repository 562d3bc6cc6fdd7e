use sea_orm::{entity::prelude::*, Set, DatabaseConnection};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{errors::ModelError, json::Tags, validation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "published")]
    Published,
}

impl PostStatus {
    pub fn parse(s: &str) -> Result<Self, ModelError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            other => Err(ModelError::Validation(format!("unknown post status '{other}'"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "blog_post")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(column_type = "Text")]
    pub excerpt: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub cover_image: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: Tags,
    pub author: String,
    pub status: PostStatus,
    pub published_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_title(title: &str) -> Result<String, ModelError> {
    validation::required_text("title", title, 200)
}

pub fn validate_author(author: &str) -> Result<String, ModelError> {
    validation::required_text("author", author, 120)
}

#[derive(Clone, Debug)]
pub struct NewPost {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub cover_image: Option<String>,
    pub tags: Tags,
    pub author: String,
    pub status: PostStatus,
}

pub async fn create(db: &DatabaseConnection, input: NewPost) -> Result<Model, ModelError> {
    let title = validate_title(&input.title)?;
    let author = validate_author(&input.author)?;
    let now = Utc::now().into();
    let published_at = match input.status {
        PostStatus::Published => Some(now),
        PostStatus::Draft => None,
    };
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(title),
        slug: Set(input.slug),
        excerpt: Set(input.excerpt),
        content: Set(input.content),
        cover_image: Set(input.cover_image),
        tags: Set(input.tags),
        author: Set(author),
        status: Set(input.status),
        published_at: Set(published_at),
        created_at: Set(now),
        updated_at: Set(now),
    };
    am.insert(db).await.map_err(ModelError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parse_is_case_insensitive() {
        assert_eq!(PostStatus::parse("Published").unwrap(), PostStatus::Published);
        assert_eq!(PostStatus::parse(" draft ").unwrap(), PostStatus::Draft);
        assert!(PostStatus::parse("archived").is_err());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_value(PostStatus::Draft).unwrap(), "draft");
    }
}
