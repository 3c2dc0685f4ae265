//! Ratings pool store
//!
//! De-duplicated places imported from screenshots, videos and bulk ingest,
//! keyed by [`pool_key`]. Every write is a full overwrite of the record at
//! that key; re-importing a place refreshes `created_at` and keeps no history.

use platebook_common::slug::{normalize_for_match, pool_key};
use platebook_common::{time, Place, PlaceDraft, Result};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use super::{from_json, to_json};

/// Write a place at its derived key, stamping `created_at = now`
pub async fn upsert(pool: &SqlitePool, draft: &PlaceDraft) -> Result<Place> {
    let place = Place {
        id: pool_key(&draft.name, &draft.location),
        name: draft.name.clone(),
        rating: draft.rating,
        price: draft.price.clone(),
        cuisine: draft.cuisine.clone(),
        location: draft.location.clone(),
        created_at: time::now_rfc3339(),
    };

    sqlx::query(
        r#"
        INSERT INTO ratings_pool (id, name, rating, price, cuisine, location, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            rating = excluded.rating,
            price = excluded.price,
            cuisine = excluded.cuisine,
            location = excluded.location,
            created_at = excluded.created_at
        "#,
    )
    .bind(&place.id)
    .bind(&place.name)
    .bind(place.rating)
    .bind(&place.price)
    .bind(to_json(&place.cuisine)?)
    .bind(to_json(&place.location)?)
    .bind(&place.created_at)
    .execute(pool)
    .await?;

    Ok(place)
}

/// Upsert each draft in input order
///
/// Not transactional: the first failure stops the batch, leaving earlier
/// writes committed and the rest unattempted.
pub async fn bulk_upsert(pool: &SqlitePool, drafts: &[PlaceDraft]) -> Result<Vec<Place>> {
    let mut saved = Vec::with_capacity(drafts.len());

    for draft in drafts {
        saved.push(upsert(pool, draft).await?);
    }

    tracing::debug!(count = saved.len(), "Bulk upserted places");
    Ok(saved)
}

/// Load a single place by key
pub async fn get(pool: &SqlitePool, id: &str) -> Result<Option<Place>> {
    let row = sqlx::query(
        "SELECT id, name, rating, price, cuisine, location, created_at FROM ratings_pool WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(|r| place_from_row(&r)).transpose()
}

/// Every place, ordered by name ascending
pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Place>> {
    let rows = sqlx::query(
        "SELECT id, name, rating, price, cuisine, location, created_at FROM ratings_pool ORDER BY name ASC",
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(place_from_row).collect()
}

/// Case- and punctuation-insensitive substring search on `name`
///
/// A blank term returns the whole pool.
pub async fn search(pool: &SqlitePool, term: &str) -> Result<Vec<Place>> {
    let all = list_all(pool).await?;
    if term.trim().is_empty() {
        return Ok(all);
    }

    let needle = normalize_for_match(term);
    Ok(all
        .into_iter()
        .filter(|p| normalize_for_match(&p.name).contains(&needle))
        .collect())
}

/// Two-tier match for pre-filling forms
///
/// 1. normalized name equal and at least one location element shared
/// 2. normalized name equal, location ignored
pub async fn find_match(
    pool: &SqlitePool,
    name: &str,
    locations: &[String],
) -> Result<Option<Place>> {
    let all = list_all(pool).await?;
    Ok(best_match(all, name, locations))
}

/// Pure form of [`find_match`] over an already loaded pool
pub fn best_match(places: Vec<Place>, name: &str, locations: &[String]) -> Option<Place> {
    let needle = normalize_for_match(name);
    let same_name: Vec<Place> = places
        .into_iter()
        .filter(|p| normalize_for_match(&p.name) == needle)
        .collect();

    let located = same_name
        .iter()
        .position(|p| p.location.iter().any(|loc| locations.contains(loc)));

    match located {
        Some(index) => same_name.into_iter().nth(index),
        None => same_name.into_iter().next(),
    }
}

/// Delete a place; returns whether it existed
pub async fn delete(pool: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM ratings_pool WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Number of places in the pool
pub async fn count(pool: &SqlitePool) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM ratings_pool")
        .fetch_one(pool)
        .await?;

    Ok(count)
}

fn place_from_row(row: &SqliteRow) -> Result<Place> {
    let cuisine: String = row.get("cuisine");
    let location: String = row.get("location");

    Ok(Place {
        id: row.get("id"),
        name: row.get("name"),
        rating: row.get("rating"),
        price: row.get("price"),
        cuisine: from_json(&cuisine)?,
        location: from_json(&location)?,
        created_at: row.get("created_at"),
    })
}

// ============================================================================
// Picker filters and facets
// ============================================================================

/// Sort order for the admin place picker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolSort {
    /// Name ascending
    #[default]
    Name,
    /// Rating descending
    Rating,
}

/// Exact-membership filters; `None` means "any"
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoolFilter {
    pub cuisine: Option<String>,
    pub location: Option<String>,
    pub price: Option<String>,
    pub sort: PoolSort,
}

/// Apply picker filters to a name-ordered list of places
pub fn apply_filter(places: Vec<Place>, filter: &PoolFilter) -> Vec<Place> {
    let mut matched: Vec<Place> = places
        .into_iter()
        .filter(|p| filter.cuisine.as_ref().map_or(true, |c| p.cuisine.contains(c)))
        .filter(|p| filter.location.as_ref().map_or(true, |l| p.location.contains(l)))
        .filter(|p| filter.price.as_ref().map_or(true, |price| &p.price == price))
        .collect();

    match filter.sort {
        PoolSort::Name => matched.sort_by(|a, b| a.name.cmp(&b.name)),
        PoolSort::Rating => matched.sort_by(|a, b| b.rating.total_cmp(&a.rating)),
    }

    matched
}

/// Distinct filter values present in a set of places
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PoolFacets {
    pub cuisines: Vec<String>,
    pub locations: Vec<String>,
    /// Ordered by length, so "$" < "$$" < "$$$"
    pub prices: Vec<String>,
}

pub fn facets(places: &[Place]) -> PoolFacets {
    let mut cuisines: Vec<String> = places.iter().flat_map(|p| p.cuisine.clone()).collect();
    cuisines.sort();
    cuisines.dedup();

    let mut locations: Vec<String> = places.iter().flat_map(|p| p.location.clone()).collect();
    locations.sort();
    locations.dedup();

    let mut prices: Vec<String> = places
        .iter()
        .map(|p| p.price.clone())
        .filter(|p| !p.is_empty())
        .collect();
    prices.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
    prices.dedup();

    PoolFacets {
        cuisines,
        locations,
        prices,
    }
}
