use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use super::shared::{fetch_wishlist, require_access, require_owner, validation_error};
use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
    models::{ShareDto, User, Wishlist, WishlistDetailDto, WishlistDto, WishlistItem},
    state::AppState,
};

// ============================================================================
// Input validation
// ============================================================================

#[derive(Debug, serde::Deserialize, Validate)]
pub struct CreateWishlistRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1–255 characters"))]
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, serde::Deserialize, Validate)]
pub struct UpdateWishlistRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1–255 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, serde::Deserialize, Validate)]
pub struct ShareRequest {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/wishlists — the caller's own lists, oldest first, with item counts.
pub async fn list_wishlists(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<WishlistDto>>> {
    let wishlists = sqlx::query_as::<_, WishlistDto>(
        "SELECT w.id, w.owner_id, w.title, w.description, w.created_at,
                COUNT(i.id)::BIGINT AS item_count
         FROM   wishlists w
         LEFT JOIN wishlist_items i ON i.wishlist_id = w.id
         WHERE  w.owner_id = $1
         GROUP BY w.id
         ORDER BY w.created_at ASC",
    )
    .bind(auth.user_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(wishlists))
}

/// GET /api/wishlists/shared — lists other users have shared with the caller.
pub async fn list_shared_wishlists(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<WishlistDto>>> {
    let wishlists = sqlx::query_as::<_, WishlistDto>(
        "SELECT w.id, w.owner_id, w.title, w.description, w.created_at,
                COUNT(i.id)::BIGINT AS item_count
         FROM   wishlist_shares s
         JOIN   wishlists w ON w.id = s.wishlist_id
         LEFT JOIN wishlist_items i ON i.wishlist_id = w.id
         WHERE  s.user_id = $1
         GROUP BY w.id
         ORDER BY w.created_at ASC",
    )
    .bind(auth.user_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(wishlists))
}

/// POST /api/wishlists
pub async fn create_wishlist(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateWishlistRequest>,
) -> AppResult<(StatusCode, Json<Wishlist>)> {
    req.validate().map_err(validation_error)?;

    let wishlist = sqlx::query_as::<_, Wishlist>(
        "INSERT INTO wishlists (owner_id, title, description)
         VALUES ($1, $2, $3)
         RETURNING id, owner_id, title, description, created_at",
    )
    .bind(auth.user_id)
    .bind(&req.title)
    .bind(&req.description)
    .fetch_one(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(wishlist)))
}

/// GET /api/wishlists/:id — the list plus its items (owner or share recipient).
pub async fn get_wishlist(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(wishlist_id): Path<Uuid>,
) -> AppResult<Json<WishlistDetailDto>> {
    let wishlist = fetch_wishlist(&state.pool, wishlist_id).await?;
    require_access(&state.pool, &wishlist, auth.user_id).await?;

    let items = sqlx::query_as::<_, WishlistItem>(
        "SELECT id, wishlist_id, name, price, description, link, image, purchased, created_at
         FROM wishlist_items
         WHERE wishlist_id = $1
         ORDER BY created_at ASC",
    )
    .bind(wishlist_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(WishlistDetailDto::from_parts(wishlist, items)))
}

/// PATCH /api/wishlists/:id — owner only.
pub async fn update_wishlist(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(wishlist_id): Path<Uuid>,
    Json(req): Json<UpdateWishlistRequest>,
) -> AppResult<Json<Wishlist>> {
    req.validate().map_err(validation_error)?;

    let wishlist = fetch_wishlist(&state.pool, wishlist_id).await?;
    require_owner(&wishlist, auth.user_id)?;

    let updated = sqlx::query_as::<_, Wishlist>(
        "UPDATE wishlists
         SET title       = COALESCE($1, title),
             description = COALESCE($2, description)
         WHERE id = $3
         RETURNING id, owner_id, title, description, created_at",
    )
    .bind(&req.title)
    .bind(&req.description)
    .bind(wishlist_id)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(updated))
}

/// DELETE /api/wishlists/:id — owner only; items and shares cascade.
pub async fn delete_wishlist(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(wishlist_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let wishlist = fetch_wishlist(&state.pool, wishlist_id).await?;
    require_owner(&wishlist, auth.user_id)?;

    sqlx::query("DELETE FROM wishlists WHERE id = $1")
        .bind(wishlist_id)
        .execute(&state.pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/wishlists/:id/share — grant another user (by email) read access.
pub async fn share_wishlist(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(wishlist_id): Path<Uuid>,
    Json(req): Json<ShareRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    req.validate().map_err(validation_error)?;

    let wishlist = fetch_wishlist(&state.pool, wishlist_id).await?;
    require_owner(&wishlist, auth.user_id)?;

    let target = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(&req.email)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    if target.id == auth.user_id {
        return Err(AppError::Validation(
            "You cannot share a wishlist with yourself".into(),
        ));
    }

    // Unique-pair constraint maps duplicates to 409 via From<sqlx::Error>.
    sqlx::query("INSERT INTO wishlist_shares (wishlist_id, user_id) VALUES ($1, $2)")
        .bind(wishlist_id)
        .bind(target.id)
        .execute(&state.pool)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Wishlist shared", "user_id": target.id })),
    ))
}

/// GET /api/wishlists/:id/shares — who the list is shared with (owner only).
pub async fn list_shares(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(wishlist_id): Path<Uuid>,
) -> AppResult<Json<Vec<ShareDto>>> {
    let wishlist = fetch_wishlist(&state.pool, wishlist_id).await?;
    require_owner(&wishlist, auth.user_id)?;

    let shares = sqlx::query_as::<_, ShareDto>(
        "SELECT u.id AS user_id, u.email, u.name, s.created_at
         FROM wishlist_shares s
         JOIN users u ON u.id = s.user_id
         WHERE s.wishlist_id = $1
         ORDER BY s.created_at ASC",
    )
    .bind(wishlist_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(shares))
}

/// DELETE /api/wishlists/:id/share/:user_id — revoke a share (owner only).
pub async fn unshare_wishlist(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((wishlist_id, user_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    let wishlist = fetch_wishlist(&state.pool, wishlist_id).await?;
    require_owner(&wishlist, auth.user_id)?;

    let result = sqlx::query(
        "DELETE FROM wishlist_shares WHERE wishlist_id = $1 AND user_id = $2",
    )
    .bind(wishlist_id)
    .bind(user_id)
    .execute(&state.pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Share not found".into()));
    }

    Ok(StatusCode::NO_CONTENT)
}
