//! # Platebook Common Library
//!
//! Shared code for the Platebook services including:
//! - Slug and pool-key generation
//! - Place normalization for loosely-typed import payloads
//! - Review, list and site-settings record types
//! - Configuration loading
//! - Timestamp helpers

pub mod config;
pub mod error;
pub mod models;
pub mod place;
pub mod slug;
pub mod time;

pub use error::{Error, Result};
pub use place::{Place, PlaceDraft, RawPlace};
