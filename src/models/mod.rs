use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub mod page_metadata;

pub use page_metadata::PageMetadata;

// ============================================================================
// User Models
// ============================================================================

/// Internal database row. Not serializable — use UserDto for API responses
/// to avoid accidentally exposing password_hash.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Public user shape returned by all API responses.
#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        UserDto {
            id: user.id,
            email: user.email,
            name: user.name,
            address: user.address,
            created_at: user.created_at,
        }
    }
}

// ============================================================================
// Wishlist Models
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Wishlist {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Wishlist enriched with a live item count for listing responses.
#[derive(Debug, FromRow, Serialize)]
pub struct WishlistDto {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Full wishlist detail: the list plus all of its items.
#[derive(Debug, Serialize)]
pub struct WishlistDetailDto {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<WishlistItem>,
}

impl WishlistDetailDto {
    pub fn from_parts(wishlist: Wishlist, items: Vec<WishlistItem>) -> Self {
        WishlistDetailDto {
            id: wishlist.id,
            owner_id: wishlist.owner_id,
            title: wishlist.title,
            description: wishlist.description,
            created_at: wishlist.created_at,
            items,
        }
    }
}

// ============================================================================
// Wishlist Item Models
// ============================================================================

/// A single wish. `price` is NUMERIC(10,2) in the database; `link` and `image`
/// are usually seeded from a scraped `PageMetadata`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WishlistItem {
    pub id: Uuid,
    pub wishlist_id: Uuid,
    pub name: String,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub image: Option<String>,
    pub purchased: bool,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Share Models
// ============================================================================

/// A user a wishlist has been shared with, for the share listing.
#[derive(Debug, FromRow, Serialize)]
pub struct ShareDto {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Scrape Models
// ============================================================================

/// Response body of POST /api/parse-url.
///
/// On success `error` is absent. On any scrape failure the endpoint still
/// returns 200 with four empty fields plus the advisory message — the client
/// falls back to manual entry either way.
#[derive(Debug, Serialize, Deserialize)]
pub struct ScrapeResponse {
    #[serde(flatten)]
    pub metadata: PageMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScrapeResponse {
    pub fn success(metadata: PageMetadata) -> Self {
        ScrapeResponse {
            metadata,
            error: None,
        }
    }

    pub fn unavailable() -> Self {
        ScrapeResponse {
            metadata: PageMetadata::default(),
            error: Some("Could not parse this URL. Please enter details manually.".into()),
        }
    }
}
