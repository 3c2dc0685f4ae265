//! Review store
//!
//! Reviews are keyed by slug. The public site reads them newest-first by
//! visit date; the admin console creates, edits and deletes them.

use platebook_common::models::{Review, ReviewInput, ReviewPatch};
use platebook_common::{Error, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use super::{from_json, to_json};

const SELECT_COLUMNS: &str = "SELECT slug, name, headline, rating, price, cuisine, location, \
     date, image, gallery, content, order_highlights FROM reviews";

/// All reviews, newest visit date first
pub async fn list_reviews(pool: &SqlitePool) -> Result<Vec<Review>> {
    let sql = format!("{} ORDER BY date DESC, name ASC", SELECT_COLUMNS);
    let rows = sqlx::query(&sql).fetch_all(pool).await?;

    rows.iter().map(review_from_row).collect()
}

/// The `count` most recent reviews, for the home page
pub async fn latest_reviews(pool: &SqlitePool, count: i64) -> Result<Vec<Review>> {
    let sql = format!("{} ORDER BY date DESC, name ASC LIMIT ?", SELECT_COLUMNS);
    let rows = sqlx::query(&sql).bind(count.max(0)).fetch_all(pool).await?;

    rows.iter().map(review_from_row).collect()
}

pub async fn get_review(pool: &SqlitePool, slug: &str) -> Result<Option<Review>> {
    let sql = format!("{} WHERE slug = ?", SELECT_COLUMNS);
    let row = sqlx::query(&sql).bind(slug).fetch_optional(pool).await?;

    row.map(|r| review_from_row(&r)).transpose()
}

/// Store a new review
///
/// Fails with [`Error::Conflict`] when a review already exists at the slug.
pub async fn create_review(pool: &SqlitePool, input: ReviewInput) -> Result<Review> {
    let review = input.into_review();

    if review.name.trim().is_empty() {
        return Err(Error::InvalidInput("Review name is required".to_string()));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO reviews (slug, name, headline, rating, price, cuisine, location,
                             date, image, gallery, content, order_highlights)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(slug) DO NOTHING
        "#,
    )
    .bind(&review.slug)
    .bind(&review.name)
    .bind(&review.headline)
    .bind(review.rating)
    .bind(&review.price)
    .bind(to_json(&review.cuisine)?)
    .bind(to_json(&review.location)?)
    .bind(&review.date)
    .bind(&review.image)
    .bind(to_json(&review.gallery)?)
    .bind(to_json(&review.content)?)
    .bind(to_json(&review.order_highlights)?)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::Conflict(format!(
            "Review already exists: {}",
            review.slug
        )));
    }

    tracing::info!(slug = %review.slug, "Created review");
    Ok(review)
}

/// Overwrite every column of an existing review
async fn save_review(pool: &SqlitePool, review: &Review) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE reviews SET
            name = ?, headline = ?, rating = ?, price = ?, cuisine = ?, location = ?,
            date = ?, image = ?, gallery = ?, content = ?, order_highlights = ?
        WHERE slug = ?
        "#,
    )
    .bind(&review.name)
    .bind(&review.headline)
    .bind(review.rating)
    .bind(&review.price)
    .bind(to_json(&review.cuisine)?)
    .bind(to_json(&review.location)?)
    .bind(&review.date)
    .bind(&review.image)
    .bind(to_json(&review.gallery)?)
    .bind(to_json(&review.content)?)
    .bind(to_json(&review.order_highlights)?)
    .bind(&review.slug)
    .execute(pool)
    .await?;

    Ok(())
}

/// Merge a patch into a stored review
pub async fn update_review(pool: &SqlitePool, slug: &str, patch: ReviewPatch) -> Result<Review> {
    let mut review = get_review(pool, slug)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Review not found: {}", slug)))?;

    review.apply(patch);
    save_review(pool, &review).await?;

    tracing::info!(slug = %slug, "Updated review");
    Ok(review)
}

/// Delete a review; returns whether it existed
pub async fn delete_review(pool: &SqlitePool, slug: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM reviews WHERE slug = ?")
        .bind(slug)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

fn review_from_row(row: &SqliteRow) -> Result<Review> {
    let slug: String = row.get("slug");
    let cuisine: String = row.get("cuisine");
    let location: String = row.get("location");
    let gallery: String = row.get("gallery");
    let content: String = row.get("content");
    let order_highlights: String = row.get("order_highlights");

    Ok(Review {
        id: slug.clone(),
        name: row.get("name"),
        headline: row.get("headline"),
        rating: row.get("rating"),
        price: row.get("price"),
        cuisine: from_json(&cuisine)?,
        location: from_json(&location)?,
        date: row.get("date"),
        image: row.get("image"),
        gallery: from_json(&gallery)?,
        content: from_json(&content)?,
        order_highlights: from_json(&order_highlights)?,
        slug,
    })
}
