//! Settings database operations
//!
//! Key/value accessors over the `settings` table. The site-settings document
//! is stored as one row per field; an absent or empty value reads back as the
//! field's default.

use platebook_common::models::{SiteSettings, SiteSettingsPatch};
use platebook_common::{Error, Result};
use sqlx::{Pool, Sqlite};

const KEY_PROFILE_IMAGE: &str = "profile_image";
const KEY_BELI_LINK: &str = "beli_link";

/// Current site settings with defaults filled in
pub async fn get_site_settings(db: &Pool<Sqlite>) -> Result<SiteSettings> {
    let defaults = SiteSettings::default();

    let profile_image = get_setting::<String>(db, KEY_PROFILE_IMAGE)
        .await?
        .filter(|v| !v.is_empty())
        .unwrap_or(defaults.profile_image);
    let beli_link = get_setting::<String>(db, KEY_BELI_LINK)
        .await?
        .filter(|v| !v.is_empty())
        .unwrap_or(defaults.beli_link);

    Ok(SiteSettings {
        profile_image,
        beli_link,
    })
}

/// Write the supplied fields and return the merged document
pub async fn update_site_settings(
    db: &Pool<Sqlite>,
    patch: SiteSettingsPatch,
) -> Result<SiteSettings> {
    if let Some(profile_image) = patch.profile_image {
        set_setting(db, KEY_PROFILE_IMAGE, profile_image).await?;
    }
    if let Some(beli_link) = patch.beli_link {
        set_setting(db, KEY_BELI_LINK, beli_link).await?;
    }

    get_site_settings(db).await
}

/// Generic setting getter
pub async fn get_setting<T>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await
        .map_err(Error::Database)?;

    match row {
        Some((value,)) => {
            let parsed = value
                .parse::<T>()
                .map_err(|e| Error::Config(format!("Parse setting failed: {}", e)))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Generic setting setter
pub async fn set_setting<T>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()>
where
    T: std::fmt::Display,
{
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value.to_string())
    .execute(db)
    .await
    .map_err(Error::Database)?;

    Ok(())
}
