//! Wishlist, item, and sharing flows. These need a Postgres instance; they
//! skip themselves when DATABASE_URL is unset.

mod common;

use axum::http::StatusCode;
use serde_json::json;

macro_rules! require_pool {
    () => {
        match common::try_test_pool().await {
            Some(pool) => pool,
            None => {
                eprintln!("skipping: DATABASE_URL not set");
                return;
            }
        }
    };
}

#[tokio::test]
async fn create_and_list_wishlists() {
    let pool = require_pool!();
    let app = common::create_test_app(pool.clone());
    let token =
        common::register_and_get_token(app, &common::unique_email(), "securepassword123").await;

    let app = common::create_test_app(pool.clone());
    let created = common::create_wishlist(app, &token, "Birthday Wishlist").await;
    assert_eq!(created["title"], "Birthday Wishlist");

    let app = common::create_test_app(pool);
    let (status, body) = common::get_authed(app, "/api/wishlists", &token).await;

    assert_eq!(status, StatusCode::OK);
    let lists = body.as_array().unwrap();
    assert_eq!(lists.len(), 1);
    assert_eq!(lists[0]["title"], "Birthday Wishlist");
    assert_eq!(lists[0]["item_count"], 0);
}

#[tokio::test]
async fn create_wishlist_requires_title() {
    let pool = require_pool!();
    let app = common::create_test_app(pool.clone());
    let token =
        common::register_and_get_token(app, &common::unique_email(), "securepassword123").await;

    let app = common::create_test_app(pool);
    let (status, _) =
        common::post_json_authed(app, "/api/wishlists", &token, json!({ "title": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn wishlist_detail_includes_items() {
    let pool = require_pool!();
    let app = common::create_test_app(pool.clone());
    let token =
        common::register_and_get_token(app, &common::unique_email(), "securepassword123").await;

    let app = common::create_test_app(pool.clone());
    let wishlist = common::create_wishlist(app, &token, "Christmas Wishlist").await;
    let wishlist_id = wishlist["id"].as_str().unwrap();

    let app = common::create_test_app(pool.clone());
    common::create_item(app, &token, wishlist_id, "Nintendo Switch").await;

    let app = common::create_test_app(pool);
    let uri = format!("/api/wishlists/{wishlist_id}");
    let (status, body) = common::get_authed(app, &uri, &token).await;

    assert_eq!(status, StatusCode::OK);
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "Nintendo Switch");
    assert_eq!(items[0]["purchased"], false);
}

#[tokio::test]
async fn strangers_get_404_not_403() {
    let pool = require_pool!();
    let app = common::create_test_app(pool.clone());
    let owner =
        common::register_and_get_token(app, &common::unique_email(), "securepassword123").await;
    let app = common::create_test_app(pool.clone());
    let stranger =
        common::register_and_get_token(app, &common::unique_email(), "securepassword123").await;

    let app = common::create_test_app(pool.clone());
    let wishlist = common::create_wishlist(app, &owner, "Secret List").await;
    let wishlist_id = wishlist["id"].as_str().unwrap();

    let app = common::create_test_app(pool);
    let uri = format!("/api/wishlists/{wishlist_id}");
    let (status, _) = common::get_authed(app, &uri, &stranger).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_and_delete_are_owner_only() {
    let pool = require_pool!();
    let app = common::create_test_app(pool.clone());
    let owner =
        common::register_and_get_token(app, &common::unique_email(), "securepassword123").await;
    let app = common::create_test_app(pool.clone());
    let other =
        common::register_and_get_token(app, &common::unique_email(), "securepassword123").await;

    let app = common::create_test_app(pool.clone());
    let wishlist = common::create_wishlist(app, &owner, "Mine").await;
    let wishlist_id = wishlist["id"].as_str().unwrap();
    let uri = format!("/api/wishlists/{wishlist_id}");

    // Non-owner cannot rename it.
    let app = common::create_test_app(pool.clone());
    let (status, _) =
        common::patch_json_authed(app, &uri, &other, json!({ "title": "Stolen" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Owner can.
    let app = common::create_test_app(pool.clone());
    let (status, body) =
        common::patch_json_authed(app, &uri, &owner, json!({ "title": "Renamed" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Renamed");

    // Owner deletes; the list is gone.
    let app = common::create_test_app(pool.clone());
    let (status, _) = common::delete_authed(app, &uri, &owner).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let app = common::create_test_app(pool);
    let (status, _) = common::get_authed(app, &uri, &owner).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn share_grants_read_access_and_purchase_marking() {
    let pool = require_pool!();
    let owner_email = common::unique_email();
    let friend_email = common::unique_email();

    let app = common::create_test_app(pool.clone());
    let owner = common::register_and_get_token(app, &owner_email, "securepassword123").await;
    let app = common::create_test_app(pool.clone());
    let friend = common::register_and_get_token(app, &friend_email, "securepassword123").await;

    let app = common::create_test_app(pool.clone());
    let wishlist = common::create_wishlist(app, &owner, "Birthday").await;
    let wishlist_id = wishlist["id"].as_str().unwrap();

    let app = common::create_test_app(pool.clone());
    let item = common::create_item(app, &owner, wishlist_id, "Headphones").await;
    let item_id = item["id"].as_str().unwrap();

    // Share with the friend by email.
    let app = common::create_test_app(pool.clone());
    let share_uri = format!("/api/wishlists/{wishlist_id}/share");
    let (status, _) =
        common::post_json_authed(app, &share_uri, &owner, json!({ "email": friend_email })).await;
    assert_eq!(status, StatusCode::CREATED);

    // The friend now sees it under shared lists.
    let app = common::create_test_app(pool.clone());
    let (status, body) = common::get_authed(app, "/api/wishlists/shared", &friend).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["item_count"], 1);

    // And can open the detail view.
    let app = common::create_test_app(pool.clone());
    let (status, _) = common::get_authed(
        app,
        &format!("/api/wishlists/{wishlist_id}"),
        &friend,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // And can mark the item purchased.
    let app = common::create_test_app(pool.clone());
    let (status, body) = common::patch_json_authed(
        app,
        &format!("/api/items/{item_id}/purchased"),
        &friend,
        json!({ "purchased": true }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["purchased"], true);

    // But cannot edit the item itself.
    let app = common::create_test_app(pool);
    let (status, _) = common::patch_json_authed(
        app,
        &format!("/api/items/{item_id}"),
        &friend,
        json!({ "name": "Hijacked" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn share_errors() {
    let pool = require_pool!();
    let owner_email = common::unique_email();
    let friend_email = common::unique_email();

    let app = common::create_test_app(pool.clone());
    let owner = common::register_and_get_token(app, &owner_email, "securepassword123").await;
    let app = common::create_test_app(pool.clone());
    let _friend = common::register_and_get_token(app, &friend_email, "securepassword123").await;

    let app = common::create_test_app(pool.clone());
    let wishlist = common::create_wishlist(app, &owner, "Birthday").await;
    let wishlist_id = wishlist["id"].as_str().unwrap();
    let share_uri = format!("/api/wishlists/{wishlist_id}/share");

    // Unknown email.
    let app = common::create_test_app(pool.clone());
    let (status, _) = common::post_json_authed(
        app,
        &share_uri,
        &owner,
        json!({ "email": common::unique_email() }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Self-share.
    let app = common::create_test_app(pool.clone());
    let (status, _) =
        common::post_json_authed(app, &share_uri, &owner, json!({ "email": owner_email })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Duplicate share.
    let app = common::create_test_app(pool.clone());
    let (status, _) =
        common::post_json_authed(app, &share_uri, &owner, json!({ "email": friend_email })).await;
    assert_eq!(status, StatusCode::CREATED);

    let app = common::create_test_app(pool);
    let (status, _) =
        common::post_json_authed(app, &share_uri, &owner, json!({ "email": friend_email })).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn unshare_revokes_access() {
    let pool = require_pool!();
    let owner_email = common::unique_email();
    let friend_email = common::unique_email();

    let app = common::create_test_app(pool.clone());
    let owner = common::register_and_get_token(app, &owner_email, "securepassword123").await;
    let app = common::create_test_app(pool.clone());
    let friend = common::register_and_get_token(app, &friend_email, "securepassword123").await;

    let app = common::create_test_app(pool.clone());
    let wishlist = common::create_wishlist(app, &owner, "Birthday").await;
    let wishlist_id = wishlist["id"].as_str().unwrap();

    let app = common::create_test_app(pool.clone());
    let share_uri = format!("/api/wishlists/{wishlist_id}/share");
    let (status, body) =
        common::post_json_authed(app, &share_uri, &owner, json!({ "email": friend_email })).await;
    assert_eq!(status, StatusCode::CREATED);
    let friend_id = body["user_id"].as_str().unwrap();

    // Listed among shares.
    let app = common::create_test_app(pool.clone());
    let (status, body) = common::get_authed(
        app,
        &format!("/api/wishlists/{wishlist_id}/shares"),
        &owner,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    // Revoke, then the friend is locked out again.
    let app = common::create_test_app(pool.clone());
    let (status, _) = common::delete_authed(
        app,
        &format!("/api/wishlists/{wishlist_id}/share/{friend_id}"),
        &owner,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let app = common::create_test_app(pool);
    let (status, _) = common::get_authed(
        app,
        &format!("/api/wishlists/{wishlist_id}"),
        &friend,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn items_cannot_be_added_to_another_users_list() {
    let pool = require_pool!();
    let app = common::create_test_app(pool.clone());
    let owner =
        common::register_and_get_token(app, &common::unique_email(), "securepassword123").await;
    let app = common::create_test_app(pool.clone());
    let other =
        common::register_and_get_token(app, &common::unique_email(), "securepassword123").await;

    let app = common::create_test_app(pool.clone());
    let wishlist = common::create_wishlist(app, &owner, "Mine").await;
    let wishlist_id = wishlist["id"].as_str().unwrap();

    let app = common::create_test_app(pool);
    let (status, _) = common::post_json_authed(
        app,
        &format!("/api/wishlists/{wishlist_id}/items"),
        &other,
        json!({ "name": "Sneaky" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn item_crud_round_trip() {
    let pool = require_pool!();
    let app = common::create_test_app(pool.clone());
    let token =
        common::register_and_get_token(app, &common::unique_email(), "securepassword123").await;

    let app = common::create_test_app(pool.clone());
    let wishlist = common::create_wishlist(app, &token, "Gifts").await;
    let wishlist_id = wishlist["id"].as_str().unwrap();

    let app = common::create_test_app(pool.clone());
    let (status, item) = common::post_json_authed(
        app,
        &format!("/api/wishlists/{wishlist_id}/items"),
        &token,
        json!({
            "name": "Nintendo Switch",
            "price": "299.99",
            "description": "Gaming console",
            "link": "https://example.com/switch",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(item["name"], "Nintendo Switch");
    let item_id = item["id"].as_str().unwrap();

    let app = common::create_test_app(pool.clone());
    let (status, updated) = common::patch_json_authed(
        app,
        &format!("/api/items/{item_id}"),
        &token,
        json!({ "price": "249.99" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["price"], "249.99");
    assert_eq!(updated["name"], "Nintendo Switch");

    let app = common::create_test_app(pool.clone());
    let (status, _) =
        common::delete_authed(app, &format!("/api/items/{item_id}"), &token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let app = common::create_test_app(pool);
    let (status, body) = common::get_authed(app, &format!("/api/wishlists/{wishlist_id}"), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 0);
}
