use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::Wishlist,
};

/// Collapse validator errors into a single 400 message.
pub fn validation_error(e: validator::ValidationErrors) -> AppError {
    AppError::Validation(
        e.field_errors()
            .values()
            .flat_map(|v| v.iter())
            .filter_map(|e| e.message.as_ref())
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join(", "),
    )
}

/// Fetch a wishlist row, returning 404 if it does not exist.
pub async fn fetch_wishlist(pool: &sqlx::PgPool, wishlist_id: Uuid) -> AppResult<Wishlist> {
    sqlx::query_as::<_, Wishlist>(
        "SELECT id, owner_id, title, description, created_at
         FROM wishlists WHERE id = $1",
    )
    .bind(wishlist_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Wishlist not found".into()))
}

/// Verify the user may view the wishlist: owner, or someone it was shared
/// with.
///
/// Returns 404 (not 403) for everyone else — this prevents leaking wishlist
/// existence to users it was never shared with.
pub async fn require_access(
    pool: &sqlx::PgPool,
    wishlist: &Wishlist,
    user_id: Uuid,
) -> AppResult<()> {
    if wishlist.owner_id == user_id {
        return Ok(());
    }

    let shared = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM wishlist_shares WHERE wishlist_id = $1 AND user_id = $2)",
    )
    .bind(wishlist.id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    if shared {
        Ok(())
    } else {
        Err(AppError::NotFound("Wishlist not found".into()))
    }
}

/// Verify the user owns the wishlist. Used for mutations — a share recipient
/// can see the list but only the owner may change it.
pub fn require_owner(wishlist: &Wishlist, user_id: Uuid) -> AppResult<()> {
    if wishlist.owner_id == user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Only the wishlist owner can do that".into(),
        ))
    }
}
