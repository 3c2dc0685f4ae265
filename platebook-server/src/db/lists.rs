//! Curated list store

use platebook_common::models::{FoodList, ListInput, ListPatch, Review};
use platebook_common::{time, Error, Result};
use serde::Serialize;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use super::{from_json, reviews, to_json};

/// A list together with the reviews it references
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedList {
    #[serde(flatten)]
    pub list: FoodList,
    /// Referenced reviews in list order; ids with no stored review are skipped
    pub reviews: Vec<Review>,
}

/// All lists, newest first
pub async fn list_lists(pool: &SqlitePool) -> Result<Vec<FoodList>> {
    let rows = sqlx::query(
        "SELECT id, title, description, cover_image, items, review_ids, created_at \
         FROM lists ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(list_from_row).collect()
}

pub async fn get_list(pool: &SqlitePool, id: &str) -> Result<Option<FoodList>> {
    let row = sqlx::query(
        "SELECT id, title, description, cover_image, items, review_ids, created_at \
         FROM lists WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(|r| list_from_row(&r)).transpose()
}

pub async fn create_list(pool: &SqlitePool, input: ListInput) -> Result<FoodList> {
    if input.title.trim().is_empty() {
        return Err(Error::InvalidInput("List title is required".to_string()));
    }

    let list = input.into_list(time::now_rfc3339());
    save_list(pool, &list).await?;

    tracing::info!(id = %list.id, items = list.items.len(), "Created list");
    Ok(list)
}

pub async fn update_list(pool: &SqlitePool, id: &str, patch: ListPatch) -> Result<FoodList> {
    let mut list = get_list(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("List not found: {}", id)))?;

    list.apply(patch);
    save_list(pool, &list).await?;

    tracing::info!(id = %id, "Updated list");
    Ok(list)
}

pub async fn delete_list(pool: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM lists WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Load a list and the reviews behind its review items
pub async fn resolve_list(pool: &SqlitePool, id: &str) -> Result<Option<ResolvedList>> {
    let Some(list) = get_list(pool, id).await? else {
        return Ok(None);
    };

    let mut resolved = Vec::with_capacity(list.review_ids.len());
    for review_id in &list.review_ids {
        match reviews::get_review(pool, review_id).await? {
            Some(review) => resolved.push(review),
            None => tracing::debug!(list = %id, review = %review_id, "List references missing review"),
        }
    }

    Ok(Some(ResolvedList {
        list,
        reviews: resolved,
    }))
}

async fn save_list(pool: &SqlitePool, list: &FoodList) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO lists (id, title, description, cover_image, items, review_ids, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            title = excluded.title,
            description = excluded.description,
            cover_image = excluded.cover_image,
            items = excluded.items,
            review_ids = excluded.review_ids
        "#,
    )
    .bind(&list.id)
    .bind(&list.title)
    .bind(&list.description)
    .bind(&list.cover_image)
    .bind(to_json(&list.items)?)
    .bind(to_json(&list.review_ids)?)
    .bind(&list.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

fn list_from_row(row: &SqliteRow) -> Result<FoodList> {
    let items: String = row.get("items");
    let review_ids: String = row.get("review_ids");

    let list = FoodList {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        cover_image: row.get("cover_image"),
        items: from_json(&items)?,
        review_ids: from_json(&review_ids)?,
        created_at: row.get("created_at"),
    };

    Ok(list.upgrade_legacy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;
    use platebook_common::models::{ListItem, ReviewInput};

    fn items() -> Vec<ListItem> {
        vec![
            ListItem::Review { review_id: "r1".into() },
            ListItem::Restaurant { name: "X".into() },
        ]
    }

    #[tokio::test]
    async fn test_create_projects_review_ids() {
        let pool = connect_in_memory().await.unwrap();
        let created = create_list(
            &pool,
            ListInput { title: "Date Night".into(), items: items(), ..Default::default() },
        )
        .await
        .unwrap();

        let stored = get_list(&pool, &created.id).await.unwrap().unwrap();
        assert_eq!(stored.review_ids, vec!["r1"]);
        assert_eq!(stored.items, items());
    }

    #[tokio::test]
    async fn test_create_requires_title() {
        let pool = connect_in_memory().await.unwrap();
        let err = create_list(&pool, ListInput::default()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_update_replaces_items() {
        let pool = connect_in_memory().await.unwrap();
        let created = create_list(
            &pool,
            ListInput { title: "Brunch".into(), items: items(), ..Default::default() },
        )
        .await
        .unwrap();

        let patch = ListPatch {
            items: Some(vec![ListItem::Review { review_id: "r9".into() }]),
            ..Default::default()
        };
        let updated = update_list(&pool, &created.id, patch).await.unwrap();
        assert_eq!(updated.review_ids, vec!["r9"]);
        assert_eq!(updated.created_at, created.created_at);

        let stored = get_list(&pool, &created.id).await.unwrap().unwrap();
        assert_eq!(stored.review_ids, vec!["r9"]);
    }

    #[tokio::test]
    async fn test_list_lists_newest_first() {
        let pool = connect_in_memory().await.unwrap();
        for (title, at) in [("Old", "2024-01-01T00:00:00.000Z"), ("New", "2025-01-01T00:00:00.000Z")] {
            create_list(
                &pool,
                ListInput { title: title.into(), created_at: Some(at.into()), ..Default::default() },
            )
            .await
            .unwrap();
        }

        let titles: Vec<String> = list_lists(&pool).await.unwrap().into_iter().map(|l| l.title).collect();
        assert_eq!(titles, vec!["New", "Old"]);
    }

    #[tokio::test]
    async fn test_legacy_row_is_upgraded() {
        let pool = connect_in_memory().await.unwrap();
        sqlx::query(
            "INSERT INTO lists (id, title, items, review_ids, created_at) \
             VALUES ('legacy', 'Legacy', '[]', '[\"a\",\"b\"]', '2023-01-01T00:00:00Z')",
        )
        .execute(&pool)
        .await
        .unwrap();

        let list = get_list(&pool, "legacy").await.unwrap().unwrap();
        assert_eq!(list.items.len(), 2);
        assert_eq!(list.items[0], ListItem::Review { review_id: "a".into() });
    }

    #[tokio::test]
    async fn test_resolve_skips_missing_reviews() {
        let pool = connect_in_memory().await.unwrap();
        let review = reviews::create_review(
            &pool,
            ReviewInput { name: "Albi".into(), slug: Some("albi".into()), ..Default::default() },
        )
        .await
        .unwrap();

        let list = create_list(
            &pool,
            ListInput {
                title: "Favorites".into(),
                items: vec![
                    ListItem::Review { review_id: "gone".into() },
                    ListItem::Review { review_id: review.slug.clone() },
                ],
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let resolved = resolve_list(&pool, &list.id).await.unwrap().unwrap();
        assert_eq!(resolved.reviews.len(), 1);
        assert_eq!(resolved.reviews[0].slug, "albi");

        assert!(resolve_list(&pool, "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let pool = connect_in_memory().await.unwrap();
        let list = create_list(&pool, ListInput { title: "T".into(), ..Default::default() })
            .await
            .unwrap();

        assert!(delete_list(&pool, &list.id).await.unwrap());
        assert!(get_list(&pool, &list.id).await.unwrap().is_none());
    }
}
