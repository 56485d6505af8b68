use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use super::shared::{fetch_wishlist, require_access, require_owner, validation_error};
use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
    models::WishlistItem,
    state::AppState,
};

// ============================================================================
// Input validation
// ============================================================================

/// Item fields mirror `PageMetadata` so a scrape result can seed the form
/// directly; everything except the name stays optional.
#[derive(Debug, serde::Deserialize, Validate)]
pub struct CreateItemRequest {
    #[validate(length(min = 1, max = 255, message = "Item name must be 1–255 characters"))]
    pub name: String,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    #[validate(url(message = "Link must be a valid URL"))]
    pub link: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, serde::Deserialize, Validate)]
pub struct UpdateItemRequest {
    #[validate(length(min = 1, max = 255, message = "Item name must be 1–255 characters"))]
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    #[validate(url(message = "Link must be a valid URL"))]
    pub link: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
pub struct SetPurchasedRequest {
    pub purchased: bool,
}

// ============================================================================
// Helpers
// ============================================================================

async fn fetch_item(pool: &sqlx::PgPool, item_id: Uuid) -> AppResult<WishlistItem> {
    sqlx::query_as::<_, WishlistItem>(
        "SELECT id, wishlist_id, name, price, description, link, image, purchased, created_at
         FROM wishlist_items WHERE id = $1",
    )
    .bind(item_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Item not found".into()))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/wishlists/:id/items — owner only.
pub async fn create_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(wishlist_id): Path<Uuid>,
    Json(req): Json<CreateItemRequest>,
) -> AppResult<(StatusCode, Json<WishlistItem>)> {
    req.validate().map_err(validation_error)?;

    let wishlist = fetch_wishlist(&state.pool, wishlist_id).await?;
    require_owner(&wishlist, auth.user_id)?;

    let item = sqlx::query_as::<_, WishlistItem>(
        "INSERT INTO wishlist_items (wishlist_id, name, price, description, link, image)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING id, wishlist_id, name, price, description, link, image, purchased, created_at",
    )
    .bind(wishlist_id)
    .bind(&req.name)
    .bind(req.price)
    .bind(&req.description)
    .bind(&req.link)
    .bind(&req.image)
    .fetch_one(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

/// PATCH /api/items/:id — owner only.
pub async fn update_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(item_id): Path<Uuid>,
    Json(req): Json<UpdateItemRequest>,
) -> AppResult<Json<WishlistItem>> {
    req.validate().map_err(validation_error)?;

    let item = fetch_item(&state.pool, item_id).await?;
    let wishlist = fetch_wishlist(&state.pool, item.wishlist_id).await?;
    require_owner(&wishlist, auth.user_id)?;

    let updated = sqlx::query_as::<_, WishlistItem>(
        "UPDATE wishlist_items
         SET name        = COALESCE($1, name),
             price       = COALESCE($2, price),
             description = COALESCE($3, description),
             link        = COALESCE($4, link),
             image       = COALESCE($5, image)
         WHERE id = $6
         RETURNING id, wishlist_id, name, price, description, link, image, purchased, created_at",
    )
    .bind(&req.name)
    .bind(req.price)
    .bind(&req.description)
    .bind(&req.link)
    .bind(&req.image)
    .bind(item_id)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(updated))
}

/// DELETE /api/items/:id — owner only.
pub async fn delete_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let item = fetch_item(&state.pool, item_id).await?;
    let wishlist = fetch_wishlist(&state.pool, item.wishlist_id).await?;
    require_owner(&wishlist, auth.user_id)?;

    sqlx::query("DELETE FROM wishlist_items WHERE id = $1")
        .bind(item_id)
        .execute(&state.pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/items/:id/purchased — anyone the list is shared with (and the
/// owner) can mark an item as bought or un-bought.
pub async fn set_purchased(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(item_id): Path<Uuid>,
    Json(req): Json<SetPurchasedRequest>,
) -> AppResult<Json<WishlistItem>> {
    let item = fetch_item(&state.pool, item_id).await?;
    let wishlist = fetch_wishlist(&state.pool, item.wishlist_id).await?;
    require_access(&state.pool, &wishlist, auth.user_id).await?;

    let updated = sqlx::query_as::<_, WishlistItem>(
        "UPDATE wishlist_items
         SET purchased = $1
         WHERE id = $2
         RETURNING id, wishlist_id, name, price, description, link, image, purchased, created_at",
    )
    .bind(req.purchased)
    .bind(item_id)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(updated))
}
