//! Review, list and site-settings records
//!
//! Wire format is camelCase JSON, matching what the public site and the
//! admin console exchange.

use serde::{Deserialize, Serialize};

use crate::slug::generate_slug;

// ============================================================================
// Reviews
// ============================================================================

/// Full restaurant review; `id` and `slug` are the same storage key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub name: String,
    pub headline: String,
    /// 0-10 scale
    pub rating: f64,
    pub price: String,
    pub cuisine: Vec<String>,
    pub location: Vec<String>,
    /// Visit date as entered by the author (sortable `YYYY-MM-DD` expected)
    pub date: String,
    /// Cover image URL
    pub image: String,
    #[serde(default)]
    pub gallery: Vec<String>,
    /// Review paragraphs
    pub content: Vec<String>,
    pub order_highlights: Vec<String>,
    pub slug: String,
}

/// Review as submitted by the admin form on creation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReviewInput {
    pub name: String,
    pub headline: String,
    pub rating: f64,
    pub price: String,
    pub cuisine: Vec<String>,
    pub location: Vec<String>,
    pub date: String,
    pub image: String,
    pub gallery: Vec<String>,
    pub content: Vec<String>,
    pub order_highlights: Vec<String>,
    /// Pre-generated slug (the form generates one to upload images first)
    pub slug: Option<String>,
}

impl ReviewInput {
    /// Build the stored review, generating the slug if none was supplied
    pub fn into_review(self) -> Review {
        let slug = match self.slug {
            Some(slug) if !slug.trim().is_empty() => slug,
            _ => generate_slug(&self.name, &self.location),
        };

        Review {
            id: slug.clone(),
            name: self.name,
            headline: self.headline,
            rating: self.rating,
            price: self.price,
            cuisine: self.cuisine,
            location: self.location,
            date: self.date,
            image: self.image,
            gallery: self.gallery,
            content: non_blank(self.content),
            order_highlights: self.order_highlights,
            slug,
        }
    }
}

/// Partial review update; absent fields are left untouched.
///
/// There is no slug field: a slug never changes after creation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReviewPatch {
    pub name: Option<String>,
    pub headline: Option<String>,
    pub rating: Option<f64>,
    pub price: Option<String>,
    pub cuisine: Option<Vec<String>>,
    pub location: Option<Vec<String>>,
    pub date: Option<String>,
    pub image: Option<String>,
    pub gallery: Option<Vec<String>>,
    pub content: Option<Vec<String>>,
    pub order_highlights: Option<Vec<String>>,
}

impl Review {
    /// Merge a patch into this review
    pub fn apply(&mut self, patch: ReviewPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(headline) = patch.headline {
            self.headline = headline;
        }
        if let Some(rating) = patch.rating {
            self.rating = rating;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(cuisine) = patch.cuisine {
            self.cuisine = cuisine;
        }
        if let Some(location) = patch.location {
            self.location = location;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(image) = patch.image {
            self.image = image;
        }
        if let Some(gallery) = patch.gallery {
            self.gallery = gallery;
        }
        if let Some(content) = patch.content {
            self.content = non_blank(content);
        }
        if let Some(order_highlights) = patch.order_highlights {
            self.order_highlights = order_highlights;
        }
    }
}

fn non_blank(paragraphs: Vec<String>) -> Vec<String> {
    paragraphs
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .collect()
}

// ============================================================================
// Lists
// ============================================================================

/// One entry of a curated list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ListItem {
    /// Link to a full review
    Review {
        #[serde(rename = "reviewId")]
        review_id: String,
    },
    /// Restaurant named without a review
    Restaurant { name: String },
    /// Place picked from the ratings pool
    Beli {
        #[serde(rename = "beliId")]
        beli_id: String,
        name: String,
        rating: f64,
    },
}

/// Review ids referenced by `items`, in item order
pub fn review_ids_of(items: &[ListItem]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| match item {
            ListItem::Review { review_id } => Some(review_id.clone()),
            _ => None,
        })
        .collect()
}

/// Curated list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodList {
    pub id: String,
    pub title: String,
    pub description: String,
    pub cover_image: String,
    #[serde(default)]
    pub items: Vec<ListItem>,
    /// Projection of the review items, kept for readers that predate `items`
    #[serde(default)]
    pub review_ids: Vec<String>,
    pub created_at: String,
}

impl FoodList {
    /// Lists written before `items` existed only carry `reviewIds`
    pub fn upgrade_legacy(mut self) -> Self {
        if self.items.is_empty() && !self.review_ids.is_empty() {
            self.items = self
                .review_ids
                .iter()
                .map(|id| ListItem::Review { review_id: id.clone() })
                .collect();
        }
        self
    }
}

/// List as submitted on creation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListInput {
    pub title: String,
    pub description: String,
    pub cover_image: String,
    pub items: Vec<ListItem>,
    pub created_at: Option<String>,
}

impl ListInput {
    /// Build the stored list under a freshly generated id
    pub fn into_list(self, now: String) -> FoodList {
        let review_ids = review_ids_of(&self.items);

        FoodList {
            id: generate_slug(&self.title, &[]),
            title: self.title,
            description: self.description,
            cover_image: self.cover_image,
            items: self.items,
            review_ids,
            created_at: self.created_at.unwrap_or(now),
        }
    }
}

/// Partial list update
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub items: Option<Vec<ListItem>>,
}

impl FoodList {
    /// Merge a patch; `review_ids` follows `items` whenever items change
    pub fn apply(&mut self, patch: ListPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(cover_image) = patch.cover_image {
            self.cover_image = cover_image;
        }
        if let Some(items) = patch.items {
            self.review_ids = review_ids_of(&items);
            self.items = items;
        }
    }
}

// ============================================================================
// Site settings
// ============================================================================

pub const DEFAULT_PROFILE_IMAGE: &str = "/images/profile.jpg";
pub const DEFAULT_BELI_LINK: &str = "https://beliapp.co/app/alliestevens";

/// Single site-wide settings document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettings {
    pub profile_image: String,
    pub beli_link: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            profile_image: DEFAULT_PROFILE_IMAGE.to_string(),
            beli_link: DEFAULT_BELI_LINK.to_string(),
        }
    }
}

/// Partial settings update
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteSettingsPatch {
    pub profile_image: Option<String>,
    pub beli_link: Option<String>,
}
