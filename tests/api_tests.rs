mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use common::{client_cookie, create_test_app, TestApp};

async fn create_list(app: &TestApp, client_id: Uuid, name: &str) -> String {
    let (cookie, value) = client_cookie(client_id);
    let response = app
        .server
        .post("/api/v1/lists")
        .add_header(cookie, value)
        .json(&json!({ "name": name }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let list: Value = response.json();
    list["id"].as_str().unwrap().to_string()
}

async fn add_item(app: &TestApp, client_id: Uuid, list_id: &str, tmdb_id: u64) -> Value {
    let (cookie, value) = client_cookie(client_id);
    let response = app
        .server
        .post(&format!("/api/v1/lists/{}/items", list_id))
        .add_header(cookie, value)
        .json(&json!({ "tmdb_id": tmdb_id }))
        .await;
    response.json()
}

fn item_titles(detail: &Value) -> Vec<String> {
    detail["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["title"].as_str().unwrap().to_string())
        .collect()
}

fn item_ranks(detail: &Value) -> Vec<i64> {
    detail["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["rank"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app();
    let response = app.server.get("/health").await;
    response.assert_status_ok();
    response.assert_json(&json!({ "status": "healthy" }));
}

#[tokio::test]
async fn test_new_browser_is_issued_client_cookie() {
    let app = create_test_app();
    let response = app.server.get("/health").await;
    let cookie = response.header("set-cookie");
    assert!(cookie.to_str().unwrap().starts_with("ff_client="));
}

#[tokio::test]
async fn test_anonymous_title_detail_offers_sign_in() {
    let app = create_test_app();
    let response = app.server.get("/api/v1/titles/movie/27205").await;
    response.assert_status_ok();

    let view: Value = response.json();
    assert_eq!(view["title"], "Title 27205");
    assert_eq!(view["runtime"], "2h 28m");
    assert_eq!(view["watchlist_action"], "sign_in");
    assert_eq!(view["review_action"], "sign_in");
    // Credits failed upstream; the rest of the screen still renders
    assert!(view["credits"].is_null());
    assert!(view["credits_error"].is_string());
}

#[tokio::test]
async fn test_unknown_title_is_not_found() {
    let app = create_test_app();
    let response = app.server.get("/api/v1/titles/movie/999999").await;
    response.assert_status(StatusCode::NOT_FOUND);

    let response = app.server.get("/api/v1/titles/person/1").await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_anonymous_watchlist_add_redirects_to_sign_in() {
    let app = create_test_app();
    let response = app.server.post("/api/v1/titles/movie/27205/watchlist").await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let body: Value = response.json();
    assert_eq!(body["redirect"], "/sign-in");
    assert_eq!(app.store.watchlist_len(), 0);
}

#[tokio::test]
async fn test_duplicate_watchlist_add_is_a_notice() {
    let app = create_test_app();
    let client_id = app.signed_in_client("viewer@example.com").await;
    let (cookie, value) = client_cookie(client_id);

    let first = app
        .server
        .post("/api/v1/titles/movie/27205/watchlist")
        .add_header(cookie.clone(), value.clone())
        .await;
    first.assert_status(StatusCode::CREATED);
    let created: Value = first.json();
    assert_eq!(created["status"], "created");
    assert_eq!(created["record"]["title"], "Title 27205");

    let second = app
        .server
        .post("/api/v1/titles/movie/27205/watchlist")
        .add_header(cookie.clone(), value.clone())
        .await;
    second.assert_status_ok();
    let notice: Value = second.json();
    assert_eq!(notice["status"], "already_exists");
    assert_eq!(app.store.watchlist_len(), 1);

    // The detail screen now offers removal
    let view: Value = app
        .server
        .get("/api/v1/titles/movie/27205")
        .add_header(cookie, value)
        .await
        .json();
    assert_eq!(view["watchlist_action"], "remove");
}

#[tokio::test]
async fn test_review_lifecycle_and_account_stats() {
    let app = create_test_app();
    let client_id = app.signed_in_client("critic@example.com").await;
    let (cookie, value) = client_cookie(client_id);

    let response = app
        .server
        .post("/api/v1/titles/movie/27205/reviews")
        .add_header(cookie.clone(), value.clone())
        .json(&json!({ "rating": 4, "body": "Dreams within dreams" }))
        .await;
    response.assert_status(StatusCode::CREATED);

    let response = app
        .server
        .post("/api/v1/titles/movie/238/reviews")
        .add_header(cookie.clone(), value.clone())
        .json(&json!({ "rating": 6, "body": "Too good" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let account: Value = app
        .server
        .get("/api/v1/account")
        .add_header(cookie.clone(), value.clone())
        .await
        .json();
    assert_eq!(account["reviews"].as_array().unwrap().len(), 1);
    assert_eq!(account["stats"]["average_rating"], 4.0);
    assert_eq!(account["stats"]["review_count"], 1);

    let response = app
        .server
        .delete("/api/v1/account/reviews/movie/27205")
        .add_header(cookie.clone(), value.clone())
        .await;
    response.assert_status(StatusCode::NO_CONTENT);

    let response = app
        .server
        .delete("/api/v1/account/reviews/movie/27205")
        .add_header(cookie, value)
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_top_rated_pagination_flags() {
    let app = create_test_app();

    let first: Value = app.server.get("/api/v1/top-rated-movies/1").await.json();
    assert_eq!(first["pagination"]["previous_disabled"], true);
    assert_eq!(first["pagination"]["next_disabled"], false);
    assert_eq!(first["pagination"]["next_page"], 2);

    let last: Value = app.server.get("/api/v1/top-rated-tv-shows/3").await.json();
    assert_eq!(last["media_type"], "tv");
    assert_eq!(last["pagination"]["previous_page"], 2);
    assert_eq!(last["pagination"]["next_disabled"], true);

    let response = app.server.get("/api/v1/top-rated-movies/0").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = app.server.get("/api/v1/top-rated-movies/abc").await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_header_search() {
    let app = create_test_app();

    let view: Value = app.server.get("/api/v1/search?q=inception").await.json();
    assert_eq!(view["results"].as_array().unwrap().len(), 2);

    let blank: Value = app.server.get("/api/v1/search?q=%20").await.json();
    assert!(blank["results"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_list_search_requires_session() {
    let app = create_test_app();
    let response = app.server.get("/api/v1/lists/search?q=up").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_reorder_renumbers_ranks() {
    let app = create_test_app();
    let client_id = app.signed_in_client("ranker@example.com").await;
    let list_id = create_list(&app, client_id, "Favourites").await;

    for tmdb_id in [1, 2, 3] {
        let outcome = add_item(&app, client_id, &list_id, tmdb_id).await;
        assert_eq!(outcome["status"], "created");
    }

    let duplicate = add_item(&app, client_id, &list_id, 2).await;
    assert_eq!(duplicate["status"], "already_exists");

    let (cookie, value) = client_cookie(client_id);
    let response = app
        .server
        .post(&format!("/api/v1/lists/{}/reorder", list_id))
        .add_header(cookie.clone(), value.clone())
        .json(&json!({ "source": 2, "destination": 0 }))
        .await;
    response.assert_status_ok();

    let detail: Value = response.json();
    assert_eq!(item_titles(&detail), ["Title 3", "Title 1", "Title 2"]);
    assert_eq!(item_ranks(&detail), [1, 2, 3]);
    assert_eq!(detail["items"][0]["can_move_left"], false);

    let out_of_range = app
        .server
        .post(&format!("/api/v1/lists/{}/reorder", list_id))
        .add_header(cookie, value)
        .json(&json!({ "source": 0, "destination": 7 }))
        .await;
    out_of_range.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_move_and_remove() {
    let app = create_test_app();
    let client_id = app.signed_in_client("mover@example.com").await;
    let list_id = create_list(&app, client_id, "Weekend").await;

    let first = add_item(&app, client_id, &list_id, 10).await;
    add_item(&app, client_id, &list_id, 20).await;
    let first_id = first["record"]["id"].as_str().unwrap().to_string();

    let (cookie, value) = client_cookie(client_id);
    let detail: Value = app
        .server
        .post(&format!("/api/v1/lists/{}/items/{}/move", list_id, first_id))
        .add_header(cookie.clone(), value.clone())
        .json(&json!({ "direction": "right" }))
        .await
        .json();
    assert_eq!(item_titles(&detail), ["Title 20", "Title 10"]);

    let response = app
        .server
        .delete(&format!("/api/v1/lists/{}/items/{}", list_id, first_id))
        .add_header(cookie.clone(), value.clone())
        .await;
    response.assert_status(StatusCode::NO_CONTENT);

    let detail: Value = app
        .server
        .get(&format!("/api/v1/lists/{}", list_id))
        .add_header(cookie, value)
        .await
        .json();
    assert_eq!(item_titles(&detail), ["Title 20"]);
}

#[tokio::test]
async fn test_lists_are_private_to_their_owner() {
    let app = create_test_app();
    let owner = app.signed_in_client("owner@example.com").await;
    let list_id = create_list(&app, owner, "Mine").await;

    let other = app.signed_in_client("other@example.com").await;
    let (cookie, value) = client_cookie(other);
    let response = app
        .server
        .get(&format!("/api/v1/lists/{}", list_id))
        .add_header(cookie, value)
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_blank_list_name_rejected() {
    let app = create_test_app();
    let client_id = app.signed_in_client("namer@example.com").await;
    let (cookie, value) = client_cookie(client_id);

    let response = app
        .server
        .post("/api/v1/lists")
        .add_header(cookie, value)
        .json(&json!({ "name": "   " }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_snapshot_of_empty_list_is_rejected() {
    let app = create_test_app();
    let client_id = app.signed_in_client("sharer@example.com").await;
    let list_id = create_list(&app, client_id, "Empty").await;
    let (cookie, value) = client_cookie(client_id);

    let response = app
        .server
        .get(&format!("/api/v1/lists/{}/snapshot", list_id))
        .add_header(cookie, value)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_snapshot_downloads_svg() {
    let app = create_test_app();
    let client_id = app.signed_in_client("sharer@example.com").await;
    let list_id = create_list(&app, client_id, "Top Picks").await;
    add_item(&app, client_id, &list_id, 27205).await;
    let (cookie, value) = client_cookie(client_id);

    let response = app
        .server
        .get(&format!("/api/v1/lists/{}/snapshot", list_id))
        .add_header(cookie, value)
        .await;
    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "image/svg+xml");
    assert!(response
        .header("content-disposition")
        .to_str()
        .unwrap()
        .contains("top_picks_movie_list.svg"));
    assert!(response.text().contains("Title 27205"));
}

#[tokio::test]
async fn test_session_lifecycle() {
    let app = create_test_app();
    let client_id = Uuid::new_v4();
    let (cookie, value) = client_cookie(client_id);

    let status: Value = app
        .server
        .get("/auth/session")
        .add_header(cookie.clone(), value.clone())
        .await
        .json();
    assert_eq!(status["signed_in"], false);

    let response = app
        .server
        .post("/auth/sign-in")
        .add_header(cookie.clone(), value.clone())
        .json(&json!({ "email": "viewer@example.com", "password": "wrong" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = app
        .server
        .post("/auth/sign-in")
        .add_header(cookie.clone(), value.clone())
        .json(&json!({ "email": "viewer@example.com", "password": common::PASSWORD }))
        .await;
    response.assert_status_ok();
    let status: Value = response.json();
    assert_eq!(status["signed_in"], true);
    assert_eq!(status["user"]["display_name"], "viewer");
    assert!(status.get("access_token").is_none());

    let status: Value = app
        .server
        .post("/auth/sign-out")
        .add_header(cookie.clone(), value.clone())
        .await
        .json();
    assert_eq!(status["signed_in"], false);

    let response = app
        .server
        .get("/api/v1/account")
        .add_header(cookie, value)
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_rejected_refresh_clears_session() {
    let app = create_test_app();
    let client_id = app.signed_in_client("expiring@example.com").await;
    let (cookie, value) = client_cookie(client_id);

    let response = app
        .server
        .post("/auth/refresh")
        .add_header(cookie.clone(), value.clone())
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let status: Value = app
        .server
        .get("/auth/session")
        .add_header(cookie, value)
        .await
        .json();
    assert_eq!(status["signed_in"], false);
}

#[tokio::test]
async fn test_sign_up_awaiting_confirmation() {
    let app = create_test_app();
    let response = app
        .server
        .post("/auth/sign-up")
        .json(&json!({ "email": "new@confirm.test", "password": "secret" }))
        .await;
    response.assert_status(StatusCode::ACCEPTED);
    let body: Value = response.json();
    assert_eq!(body["status"], "confirmation_required");
}

#[tokio::test]
async fn test_oauth_redirects_to_provider() {
    let app = create_test_app();
    let response = app.server.get("/auth/oauth/google").await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(
        response.header("location"),
        "https://auth.example.com/authorize?provider=google"
    );

    let response = app.server.get("/auth/oauth/myspace").await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ai_recommendation_resolves_title() {
    let app = create_test_app();
    let response = app
        .server
        .post("/api/v1/ai/recommendations")
        .json(&json!({ "mood": "nostalgic", "duration": "90 minutes" }))
        .await;
    response.assert_status_ok();

    let view: Value = response.json();
    assert_eq!(view["suggestion"]["tmdb_id"], 14160);
    assert_eq!(view["title"]["title"], "Title 14160");
    assert_eq!(view["title"]["link"], "/movie/14160");

    let response = app
        .server
        .post("/api/v1/ai/recommendations")
        .json(&json!({ "mood": "", "duration": "90 minutes" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_home_feeds() {
    let app = create_test_app();
    let response = app.server.get("/api/v1/home").await;
    response.assert_status_ok();

    let view: Value = response.json();
    assert!(view["featured"].is_object());
    assert_eq!(view["sections"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_top_rated_past_last_page_serves_last_page() {
    let app = create_test_app();

    let view: Value = app.server.get("/api/v1/top-rated-movies/50").await.json();
    assert_eq!(view["pagination"]["current"], 3);
    assert_eq!(view["pagination"]["next_disabled"], true);
    assert!(!view["titles"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_cleared_search_box_supersedes_slow_search() {
    let app = create_test_app();
    let (cookie, value) = client_cookie(Uuid::new_v4());

    let slow = async {
        app.server
            .get("/api/v1/search?q=slow%20burn")
            .add_header(cookie.clone(), value.clone())
            .await
    };
    let cleared = async {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        app.server
            .get("/api/v1/search?q=")
            .add_header(cookie.clone(), value.clone())
            .await
    };
    let (slow, cleared) = tokio::join!(slow, cleared);

    slow.assert_status(StatusCode::NO_CONTENT);
    cleared.assert_status_ok();
    let view: Value = cleared.json();
    assert!(view["results"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_newer_search_supersedes_slow_search() {
    let app = create_test_app();
    let (cookie, value) = client_cookie(Uuid::new_v4());

    let slow = async {
        app.server
            .get("/api/v1/search?q=slow%20burn")
            .add_header(cookie.clone(), value.clone())
            .await
    };
    let newer = async {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        app.server
            .get("/api/v1/search?q=inception")
            .add_header(cookie.clone(), value.clone())
            .await
    };
    let (slow, newer) = tokio::join!(slow, newer);

    slow.assert_status(StatusCode::NO_CONTENT);
    newer.assert_status_ok();
}

#[tokio::test]
async fn test_anonymous_browsers_leave_no_session_state() {
    let app = create_test_app();

    for _ in 0..50 {
        app.server
            .get("/api/v1/search?q=x")
            .await
            .assert_status_ok();
    }
    app.server.get("/api/v1/home").await.assert_status_ok();
    assert!(app.sessions.is_empty());

    let client_id = app.signed_in_client("keeper@example.com").await;
    assert_eq!(app.sessions.len(), 1);

    let (cookie, value) = client_cookie(client_id);
    app.server
        .post("/auth/sign-out")
        .add_header(cookie, value)
        .await
        .assert_status_ok();
    assert!(app.sessions.is_empty());
}
