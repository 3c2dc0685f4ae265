//! Review, list and settings API tests

mod helpers;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use helpers::*;
use serde_json::json;

fn review_payload(slug: &str, name: &str, date: &str) -> serde_json::Value {
    json!({
        "slug": slug,
        "name": name,
        "headline": "Worth the wait",
        "rating": 8.5,
        "price": "$$",
        "cuisine": ["Japanese"],
        "location": ["Midtown", "New York"],
        "date": date,
        "image": "",
        "content": ["First paragraph.", "   ", "Second paragraph."],
        "orderHighlights": ["Uni"]
    })
}

// ============================================================================
// Reviews
// ============================================================================

#[tokio::test]
async fn test_review_lifecycle() {
    let app = test_app(None).await;

    let (status, created) = send_json(
        &app,
        admin_json("POST", "/api/admin/reviews", review_payload("r1", "Sushi Place", "2024-03-01")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], "r1");
    assert_eq!(created["content"], json!(["First paragraph.", "Second paragraph."]));
    assert_eq!(created["gallery"], json!([]));

    let (status, fetched) = send_json(&app, get("/api/reviews/r1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "Sushi Place");
    assert_eq!(fetched["orderHighlights"], json!(["Uni"]));

    let (status, updated) = send_json(
        &app,
        admin_json("PUT", "/api/admin/reviews/r1", json!({ "rating": 9.0, "headline": "Better" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["rating"].as_f64(), Some(9.0));
    assert_eq!(updated["headline"], "Better");
    assert_eq!(updated["name"], "Sushi Place");
    assert_eq!(updated["slug"], "r1");

    let (status, body) = send_json(&app, admin_json("DELETE", "/api/admin/reviews/r1", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], true);

    let (status, _) = send_json(&app, get("/api/reviews/r1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send_json(&app, admin_json("DELETE", "/api/admin/reviews/r1", json!({}))).await;
    assert_eq!(body["deleted"], false);
}

#[tokio::test]
async fn test_review_generated_slug_and_duplicates() {
    let app = test_app(None).await;
    let mut payload = review_payload("", "Sakura Omakase", "2024-01-01");
    payload.as_object_mut().unwrap().remove("slug");

    let (status, created) = send_json(&app, admin_json("POST", "/api/admin/reviews", payload)).await;
    assert_eq!(status, StatusCode::CREATED);
    let slug = created["slug"].as_str().unwrap().to_string();
    assert!(slug.starts_with("sakura-omakase-new-york-"));
    assert_eq!(created["id"], slug.as_str());

    let (status, _) = send_json(
        &app,
        admin_json("POST", "/api/admin/reviews", review_payload(&slug, "Other", "2024-01-02")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_review_validation_and_missing() {
    let app = test_app(None).await;

    let (status, _) = send_json(
        &app,
        admin_json("POST", "/api/admin/reviews", review_payload("r1", "  ", "2024-01-01")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(
        &app,
        admin_json("PUT", "/api/admin/reviews/nope", json!({ "rating": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reviews_ordered_newest_first() {
    let app = test_app(None).await;
    for (slug, date) in [("a", "2024-01-01"), ("b", "2024-03-01"), ("c", "2024-02-01")] {
        send_json(&app, admin_json("POST", "/api/admin/reviews", review_payload(slug, slug, date))).await;
    }

    let (_, all) = send_json(&app, get("/api/reviews")).await;
    let slugs: Vec<_> = all.as_array().unwrap().iter().map(|r| r["slug"].clone()).collect();
    assert_eq!(slugs, vec![json!("b"), json!("c"), json!("a")]);

    let (_, latest) = send_json(&app, get("/api/reviews/latest?count=2")).await;
    assert_eq!(latest.as_array().unwrap().len(), 2);
    assert_eq!(latest[0]["slug"], "b");
}

#[tokio::test]
async fn test_review_cover_upload() {
    let app = test_app(None).await;

    let (status, body) = send_json(
        &app,
        admin_multipart("/api/admin/reviews/r1/cover", &[("image", "cover.png", "image/png", b"png")]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["url"].as_str().unwrap().ends_with("/cover.png"));
    assert_eq!(body["path"], "reviews/r1/cover.png");
    assert!(app.storage_dir.path().join("reviews/r1/cover.png").is_file());
}

#[tokio::test]
async fn test_review_gallery_upload() {
    let app = test_app(None).await;

    let (status, body) = send_json(
        &app,
        admin_multipart(
            "/api/admin/reviews/r1/gallery",
            &[
                ("image", "one.jpg", "image/jpeg", b"one"),
                ("file", "two.webp", "image/webp", b"two"),
            ],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let uploads = body["uploads"].as_array().unwrap();
    assert_eq!(uploads.len(), 2);
    assert!(uploads[0]["path"].as_str().unwrap().ends_with("-0.jpg"));
    assert!(uploads[1]["path"].as_str().unwrap().ends_with("-1.webp"));
}

// ============================================================================
// Lists
// ============================================================================

#[tokio::test]
async fn test_list_items_project_review_ids() {
    let app = test_app(None).await;
    send_json(
        &app,
        admin_json("POST", "/api/admin/reviews", review_payload("r1", "Sushi Place", "2024-03-01")),
    )
    .await;

    let (status, created) = send_json(
        &app,
        admin_json(
            "POST",
            "/api/admin/lists",
            json!({
                "title": "Best Sushi",
                "description": "Raw fish, ranked",
                "items": [
                    { "type": "review", "reviewId": "r1" },
                    { "type": "restaurant", "name": "X" }
                ]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["reviewIds"], json!(["r1"]));
    let id = created["id"].as_str().unwrap().to_string();
    assert!(id.starts_with("best-sushi-"));

    let (status, resolved) = send_json(&app, get(&format!("/api/lists/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resolved["title"], "Best Sushi");
    assert_eq!(resolved["items"].as_array().unwrap().len(), 2);
    assert_eq!(resolved["reviews"][0]["slug"], "r1");

    let (status, updated) = send_json(
        &app,
        admin_json(
            "PUT",
            &format!("/api/admin/lists/{}", id),
            json!({ "items": [{ "type": "beli", "beliId": "x-dc", "name": "X", "rating": 8.1 }] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["reviewIds"], json!([]));
    assert_eq!(updated["description"], "Raw fish, ranked");

    let (_, all) = send_json(&app, get("/api/lists")).await;
    assert_eq!(all.as_array().unwrap().len(), 1);

    let (_, body) = send_json(&app, admin_json("DELETE", &format!("/api/admin/lists/{}", id), json!({}))).await;
    assert_eq!(body["deleted"], true);
    let (status, _) = send_json(&app, get(&format!("/api/lists/{}", id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_requires_title() {
    let app = test_app(None).await;

    let (status, _) = send_json(&app, admin_json("POST", "/api/admin/lists", json!({ "title": "" }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Settings
// ============================================================================

#[tokio::test]
async fn test_settings_defaults_and_merge() {
    let app = test_app(None).await;

    let (status, defaults) = send_json(&app, get("/api/settings")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(defaults["profileImage"], "/images/profile.jpg");
    assert_eq!(defaults["beliLink"], "https://beliapp.co/app/alliestevens");

    let (status, updated) = send_json(
        &app,
        admin_json("PUT", "/api/admin/settings", json!({ "beliLink": "https://beliapp.co/app/me" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["beliLink"], "https://beliapp.co/app/me");
    assert_eq!(updated["profileImage"], "/images/profile.jpg");

    let (_, fetched) = send_json(&app, get("/api/settings")).await;
    assert_eq!(fetched, updated);
}

#[tokio::test]
async fn test_settings_rejects_non_http_link() {
    let app = test_app(None).await;

    let (status, _) = send_json(
        &app,
        admin_json("PUT", "/api/admin/settings", json!({ "beliLink": "javascript:alert(1)" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_profile_image_upload() {
    let app = test_app(None).await;

    let (status, body) = send_json(
        &app,
        admin_multipart("/api/admin/settings/profile-image", &[("image", "me.webp", "image/webp", b"webp")]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["path"], "site/profile.webp");
    assert_eq!(body["url"], "http://localhost:5740/files/site/profile.webp");
}

// ============================================================================
// Request body rejections
// ============================================================================

fn admin_body(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", ADMIN_TOKEN))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_malformed_bodies_render_json_errors() {
    let app = test_app(None).await;

    for (method, uri) in [
        ("POST", "/api/admin/reviews"),
        ("POST", "/api/admin/lists"),
        ("PUT", "/api/admin/settings"),
    ] {
        let (status, body) = send_json(&app, admin_body(method, uri, "{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["code"], "BAD_REQUEST", "{uri}");
        assert!(body["error"].is_string(), "{uri}");
    }
}

#[tokio::test]
async fn test_wrong_field_types_render_json_errors() {
    let app = test_app(None).await;

    let cases = [
        ("POST", "/api/admin/reviews", json!({ "name": "X", "content": "not a list" })),
        ("PUT", "/api/admin/lists/x", json!({ "items": 7 })),
        ("PUT", "/api/admin/settings", json!({ "beliLink": 42 })),
    ];
    for (method, uri, payload) in cases {
        let (status, body) = send_json(&app, admin_json(method, uri, payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["code"], "BAD_REQUEST", "{uri}");
    }
}

#[tokio::test]
async fn test_missing_content_type_renders_json_error() {
    let app = test_app(None).await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/admin/lists")
        .header(header::AUTHORIZATION, format!("Bearer {}", ADMIN_TOKEN))
        .body(Body::from(r#"{"title":"x"}"#))
        .unwrap();

    let (status, body) = send_json(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}
