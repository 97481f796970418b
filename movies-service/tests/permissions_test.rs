mod common;

use axum::http::{Method, StatusCode};
use common::{admin, user, TestApp};
use serde_json::json;

const ANA: &str = "ana@example.com";
const BOB: &str = "bob@example.com";
const ROOT: &str = "root@example.com";

async fn setup() -> TestApp {
    let app = TestApp::new();
    app.seed_user(ANA, &user()).await;
    app.seed_user(BOB, &user()).await;
    app.seed_user(ROOT, &admin()).await;
    app
}

#[tokio::test]
async fn test_friendship_granted_by_owner_opens_comment_list() {
    let app = setup().await;
    let comment = app.seed_comment(BOB, "tt0133093", 9).await;
    let ana = app.token_for(ANA, &user());
    let bob = app.token_for(BOB, &user());
    let uri = format!("/users/{}/comments", BOB);

    let response = app.call(Method::GET, &uri, Some(&ana), None).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .call(
            Method::POST,
            &format!("/users/{}/friends", BOB),
            Some(&bob),
            Some(json!({ "email": ANA })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    // No new token needed: the relation is read per request.
    let response = app.call(Method::GET, &uri, Some(&ana), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()[0]["id"], comment.id);

    let response = app
        .call(
            Method::DELETE,
            &format!("/users/{}/friends/{}", BOB, ANA),
            Some(&bob),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app.call(Method::GET, &uri, Some(&ana), None).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_one_sided_edge_only_grants_the_listed_user() {
    let app = setup().await;
    app.seed_comment(BOB, "tt0133093", 9).await;
    // Ana lists Bob, Bob does not list Ana.
    app.store.insert_friend_edge(ANA, BOB);

    let ana = app.token_for(ANA, &user());
    let response = app
        .call(Method::GET, &format!("/users/{}/comments", BOB), Some(&ana), None)
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let bob = app.token_for(BOB, &user());
    let response = app
        .call(Method::GET, &format!("/users/{}/comments", ANA), Some(&bob), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_owner_and_admin_read_comments() {
    let app = setup().await;
    app.seed_comment(BOB, "tt0133093", 9).await;
    let uri = format!("/users/{}/comments", BOB);

    let bob = app.token_for(BOB, &user());
    let response = app.call(Method::GET, &uri, Some(&bob), None).await;
    assert_eq!(response.status, StatusCode::OK);

    let root = app.token_for(ROOT, &admin());
    let response = app.call(Method::GET, &uri, Some(&root), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json().as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_comment_delete_policy() {
    let app = setup().await;
    let ana = app.token_for(ANA, &user());
    let bob = app.token_for(BOB, &user());
    let root = app.token_for(ROOT, &admin());

    let first = app.seed_comment(BOB, "tt0133093", 9).await;
    let second = app.seed_comment(BOB, "tt0133093", 4).await;

    let response = app
        .call(Method::DELETE, &format!("/comments/{}", first.id), Some(&ana), None)
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .call(Method::DELETE, &format!("/comments/{}", first.id), Some(&bob), None)
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let response = app
        .call(Method::DELETE, &format!("/comments/{}", second.id), Some(&root), None)
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    // Existence is checked before permission.
    let response = app
        .call(Method::DELETE, &format!("/comments/{}", first.id), Some(&ana), None)
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_comment_update_is_author_only() {
    let app = setup().await;
    let comment = app.seed_comment(BOB, "tt0133093", 9).await;
    let uri = format!("/comments/{}", comment.id);

    let root = app.token_for(ROOT, &admin());
    let response = app
        .call(Method::PATCH, &uri, Some(&root), Some(json!({ "rating": 1 })))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let bob = app.token_for(BOB, &user());
    let response = app
        .call(Method::PATCH, &uri, Some(&bob), Some(json!({ "rating": 7 })))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["rating"], 7);
}

#[tokio::test]
async fn test_profile_changes_limited_to_self_or_admin() {
    let app = setup().await;
    let uri = format!("/users/{}", BOB);
    let body = json!({ "country": "Portugal" });

    let ana = app.token_for(ANA, &user());
    let response = app
        .call(Method::PATCH, &uri, Some(&ana), Some(body.clone()))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let root = app.token_for(ROOT, &admin());
    let response = app
        .call(Method::PATCH, &uri, Some(&root), Some(body))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["country"], "Portugal");

    let response = app.call(Method::DELETE, &uri, Some(&ana), None).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_friend_lists_are_edited_only_by_their_owner() {
    let app = setup().await;
    let root = app.token_for(ROOT, &admin());

    let response = app
        .call(
            Method::POST,
            &format!("/users/{}/friends", BOB),
            Some(&root),
            Some(json!({ "email": ANA })),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_user_is_not_found_for_any_caller() {
    let app = setup().await;
    let ana = app.token_for(ANA, &user());

    let response = app
        .call(Method::GET, "/users/ghost@example.com/comments", Some(&ana), None)
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json()["error"], "User not found");
}
