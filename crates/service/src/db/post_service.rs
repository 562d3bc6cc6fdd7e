use std::collections::BTreeMap;

use chrono::Utc;
use common::pagination::{Page, Pagination};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use models::blog_post::{self, PostStatus};
use models::json::Tags;
use models::validation;

use crate::content::{excerpt_from_html, sanitize_html, EXCERPT_CHARS};
use crate::errors::ServiceError;
use crate::media::MediaUrls;
use crate::slug::{self, SlugKind};

const MAX_EXCERPT: usize = 1000;
const MAX_CONTENT: usize = 200_000;

#[derive(Debug, Clone, Deserialize)]
pub struct PostInput {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub author: String,
    #[serde(default = "default_status")]
    pub status: PostStatus,
}

fn default_status() -> PostStatus { PostStatus::Draft }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostPatch {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub cover_image: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub author: Option<String>,
    pub status: Option<PostStatus>,
}

#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub status: Option<PostStatus>,
    pub tag: Option<String>,
    pub q: Option<String>,
    /// Admin listing; otherwise only published posts are visible.
    pub include_drafts: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: u64,
}

fn to_public(mut post: blog_post::Model, urls: &MediaUrls) -> blog_post::Model {
    post.cover_image = post.cover_image.map(|u| urls.to_public(&u));
    post
}

fn stored_cover(cover: Option<&str>, urls: &MediaUrls) -> Option<String> {
    cover.map(str::trim).filter(|c| !c.is_empty()).map(|c| urls.to_stored(c))
}

/// Use the given excerpt, or derive one from the sanitized content when blank.
fn resolve_excerpt(given: Option<&str>, content: &str) -> Result<String, ServiceError> {
    match validation::optional_text("excerpt", given, MAX_EXCERPT)? {
        Some(e) => Ok(e),
        None => Ok(excerpt_from_html(content, EXCERPT_CHARS)),
    }
}

fn clean_content(raw: &str) -> Result<String, ServiceError> {
    if raw.chars().count() > MAX_CONTENT {
        return Err(ServiceError::Validation(format!("content exceeds {MAX_CONTENT} characters")));
    }
    Ok(sanitize_html(raw))
}

pub async fn list_posts(
    db: &DatabaseConnection,
    filter: &PostFilter,
    opts: Pagination,
    urls: &MediaUrls,
) -> Result<Page<blog_post::Model>, ServiceError> {
    let mut cond = Condition::all();
    if !filter.include_drafts {
        cond = cond.add(blog_post::Column::Status.eq(PostStatus::Published));
    } else if let Some(s) = filter.status {
        cond = cond.add(blog_post::Column::Status.eq(s));
    }
    if let Some(tag) = filter.tag.as_deref().filter(|t| !t.trim().is_empty()) {
        cond = cond.add(super::jsonb_has_tag("tags", tag));
    }
    if let Some(q) = filter.q.as_deref().filter(|q| !q.trim().is_empty()) {
        cond = cond.add(super::ilike_any(&["title", "excerpt"], q));
    }

    let mut query = blog_post::Entity::find().filter(cond);
    query = if filter.include_drafts {
        query.order_by_desc(blog_post::Column::UpdatedAt)
    } else {
        query.order_by_desc(blog_post::Column::PublishedAt)
    };
    let (page_idx, per_page) = opts.normalize();
    let paginator = query.order_by_desc(blog_post::Column::CreatedAt).paginate(db, per_page);
    let total = paginator.num_items().await?;
    let rows = paginator.fetch_page(page_idx).await?;
    let items = rows.into_iter().map(|p| to_public(p, urls)).collect();
    Ok(Page::new(items, total, opts))
}

pub async fn get_post(db: &DatabaseConnection, id: Uuid, urls: &MediaUrls) -> Result<Option<blog_post::Model>, ServiceError> {
    Ok(blog_post::Entity::find_by_id(id).one(db).await?.map(|p| to_public(p, urls)))
}

/// Public lookup; drafts are invisible.
pub async fn get_published_by_slug(db: &DatabaseConnection, slug: &str, urls: &MediaUrls) -> Result<Option<blog_post::Model>, ServiceError> {
    Ok(blog_post::Entity::find()
        .filter(blog_post::Column::Slug.eq(slug))
        .filter(blog_post::Column::Status.eq(PostStatus::Published))
        .one(db)
        .await?
        .map(|p| to_public(p, urls)))
}

#[instrument(skip(db, input, urls), fields(title = %input.title))]
pub async fn create_post(db: &DatabaseConnection, input: PostInput, urls: &MediaUrls) -> Result<blog_post::Model, ServiceError> {
    let title = blog_post::validate_title(&input.title)?;
    let slug = slug::resolve(db, SlugKind::Post, input.slug.as_deref(), &title, None).await?;
    let content = clean_content(&input.content)?;
    let excerpt = resolve_excerpt(input.excerpt.as_deref(), &content)?;

    let created = blog_post::create(db, blog_post::NewPost {
        title,
        slug,
        excerpt,
        content,
        cover_image: stored_cover(input.cover_image.as_deref(), urls),
        tags: Tags::normalized(&input.tags),
        author: input.author,
        status: input.status,
    })
    .await?;
    info!(id = %created.id, slug = %created.slug, status = ?created.status, "post_created");
    Ok(to_public(created, urls))
}

#[instrument(skip(db, patch, urls))]
pub async fn update_post(db: &DatabaseConnection, id: Uuid, patch: PostPatch, urls: &MediaUrls) -> Result<blog_post::Model, ServiceError> {
    let existing = blog_post::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("post"))?;
    let mut am: blog_post::ActiveModel = existing.clone().into();

    let title = match patch.title.as_deref() {
        Some(t) => {
            let t = blog_post::validate_title(t)?;
            am.title = Set(t.clone());
            t
        }
        None => existing.title.clone(),
    };
    if let Some(s) = patch.slug.as_deref() {
        let s = s.trim();
        if s != existing.slug {
            let explicit = if s.is_empty() { None } else { Some(s) };
            am.slug = Set(slug::resolve(db, SlugKind::Post, explicit, &title, Some(id)).await?);
        }
    }

    let content = match patch.content.as_deref() {
        Some(c) => {
            let c = clean_content(c)?;
            am.content = Set(c.clone());
            c
        }
        None => existing.content.clone(),
    };
    match patch.excerpt.as_deref() {
        Some(e) => am.excerpt = Set(resolve_excerpt(Some(e), &content)?),
        None if patch.content.is_some() => {
            // keep hand-written excerpts; refresh ones derived from the old content
            if existing.excerpt == excerpt_from_html(&existing.content, EXCERPT_CHARS) {
                am.excerpt = Set(excerpt_from_html(&content, EXCERPT_CHARS));
            }
        }
        None => {}
    }

    if let Some(cover) = patch.cover_image {
        am.cover_image = Set(stored_cover(cover.as_deref(), urls));
    }
    if let Some(tags) = patch.tags {
        am.tags = Set(Tags::normalized(&tags));
    }
    if let Some(author) = patch.author.as_deref() {
        am.author = Set(blog_post::validate_author(author)?);
    }
    if let Some(status) = patch.status {
        am.status = Set(status);
        // first publish stamps the date; unpublishing keeps it
        if status == PostStatus::Published && existing.published_at.is_none() {
            am.published_at = Set(Some(Utc::now().into()));
        }
    }
    am.updated_at = Set(Utc::now().into());

    let updated = am.update(db).await?;
    info!(id = %updated.id, status = ?updated.status, "post_updated");
    Ok(to_public(updated, urls))
}

pub async fn delete_post(db: &DatabaseConnection, id: Uuid) -> Result<bool, ServiceError> {
    let res = blog_post::Entity::delete_by_id(id).exec(db).await?;
    if res.rows_affected > 0 {
        info!(id = %id, "post_deleted");
    }
    Ok(res.rows_affected > 0)
}

/// Distinct tags over published posts, most used first.
pub async fn tag_counts(db: &DatabaseConnection) -> Result<Vec<TagCount>, ServiceError> {
    let rows: Vec<Tags> = blog_post::Entity::find()
        .select_only()
        .column(blog_post::Column::Tags)
        .filter(blog_post::Column::Status.eq(PostStatus::Published))
        .into_tuple()
        .all(db)
        .await?;
    Ok(count_tags(rows))
}

fn count_tags(rows: Vec<Tags>) -> Vec<TagCount> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for tags in rows {
        for t in tags.0 {
            *counts.entry(t).or_default() += 1;
        }
    }
    let mut out: Vec<TagCount> = counts.into_iter().map(|(tag, count)| TagCount { tag, count }).collect();
    // BTreeMap order is alphabetical, stable sort keeps it within equal counts
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;

    #[test]
    fn blank_excerpt_is_derived_from_content() {
        assert_eq!(resolve_excerpt(Some("  "), "<p>Hello <b>there</b></p>").unwrap(), "Hello there");
        assert_eq!(resolve_excerpt(Some("Custom"), "<p>x</p>").unwrap(), "Custom");
        assert_eq!(resolve_excerpt(None, "").unwrap(), "");
    }

    #[test]
    fn tags_are_counted_most_used_first() {
        let rows = vec![
            Tags(vec!["steel".into(), "news".into()]),
            Tags(vec!["steel".into()]),
            Tags(vec!["aluminium".into()]),
        ];
        let counts = count_tags(rows);
        assert_eq!(counts[0], TagCount { tag: "steel".into(), count: 2 });
        assert_eq!(counts[1].tag, "aluminium");
        assert_eq!(counts[2].tag, "news");
    }

    #[test]
    fn oversized_content_is_rejected() {
        let huge = "a".repeat(MAX_CONTENT + 1);
        assert!(matches!(clean_content(&huge), Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn publish_lifecycle_keeps_first_published_at() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let urls = MediaUrls::new("https://cdn.example.com");

        let title = format!("Plant tour {}", Uuid::new_v4().simple());
        let draft = create_post(&db, PostInput {
            title: title.clone(),
            slug: None,
            excerpt: None,
            content: "<p>Our new <script>x()</script>press line.</p>".into(),
            cover_image: Some("https://cdn.example.com/uploads/tour.jpg".into()),
            tags: vec!["Factory".into()],
            author: "Editor".into(),
            status: PostStatus::Draft,
        }, &urls)
        .await?;
        assert!(draft.published_at.is_none());
        assert!(!draft.content.contains("script"));
        assert_eq!(draft.excerpt, "Our new press line.");
        assert_eq!(draft.cover_image.as_deref(), Some("https://cdn.example.com/uploads/tour.jpg"));
        assert!(get_published_by_slug(&db, &draft.slug, &urls).await?.is_none());

        let published = update_post(&db, draft.id, PostPatch { status: Some(PostStatus::Published), ..Default::default() }, &urls).await?;
        let first = published.published_at.expect("published_at set");

        let unpublished = update_post(&db, draft.id, PostPatch { status: Some(PostStatus::Draft), ..Default::default() }, &urls).await?;
        assert_eq!(unpublished.published_at, Some(first));

        let again = update_post(&db, draft.id, PostPatch {
            status: Some(PostStatus::Published),
            content: Some("<p>Updated body</p>".into()),
            ..Default::default()
        }, &urls)
        .await?;
        assert_eq!(again.published_at, Some(first));
        assert_eq!(again.excerpt, "Updated body");

        let tags = tag_counts(&db).await?;
        assert!(tags.iter().any(|t| t.tag == "factory" && t.count >= 1));

        let filter = PostFilter { tag: Some("factory".into()), q: Some(title), ..Default::default() };
        let page = list_posts(&db, &filter, Pagination::default(), &urls).await?;
        assert!(page.items.iter().any(|p| p.id == draft.id));

        assert!(delete_post(&db, draft.id).await?);
        Ok(())
    }
}
