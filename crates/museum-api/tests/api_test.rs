//! End-to-end tests driving the HTTP router against an in-memory store.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use tower::ServiceExt;

use museum_api::router::api_router;
use museum_api::state::{AppState, AppStateInner};
use museum_db::Database;
use museum_db::models::NewArtwork;
use museum_types::api::Claims;
use museum_types::models::Role;

struct TestApp {
    router: Router,
    state: AppState,
}

impl TestApp {
    fn new() -> Self {
        let db = Database::open_in_memory().unwrap();
        let state: AppState = Arc::new(
            AppStateInner::new(db, "integration-secret").with_admins(vec!["curator".into()]),
        );
        Self {
            router: api_router(state.clone()),
            state,
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
        };
        (status, value)
    }

    /// Registers a user and returns `(user id, token)`.
    async fn register(&self, username: &str) -> (i64, String) {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/register",
                None,
                Some(json!({ "username": username, "password": "pw1" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register {username}: {body}");
        (
            body["user"]["id"].as_i64().unwrap(),
            body["token"].as_str().unwrap().to_string(),
        )
    }

    fn add_artwork(&self, title: &str, is_premium: bool) -> i64 {
        self.state
            .db
            .insert_artwork(&NewArtwork {
                title,
                description: "On loan from the permanent collection",
                image_url: "/img/artwork.jpg",
                video_url: Some("/video/artwork.mp4"),
                category_id: 1,
                is_premium,
                comments_enabled: true,
                display_order: 0,
                aspect_ratio: 0.75,
            })
            .unwrap()
    }

    fn like_rows(&self, user_id: i64, artwork_id: i64) -> i64 {
        self.state
            .db
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM likes WHERE user_id = ?1 AND artwork_id = ?2",
                    [user_id, artwork_id],
                    |r| r.get(0),
                )?)
            })
            .unwrap()
    }
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let app = TestApp::new();
    app.register("alice").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/register",
            None,
            Some(json!({ "username": "alice", "password": "pw1" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "DuplicateUsername");
}

#[tokio::test]
async fn login_and_current_user() {
    let app = TestApp::new();
    let (alice_id, _) = app.register("alice").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "username": "alice", "password": "pw1" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["user"].get("password").is_none());
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = app.send(Method::GET, "/api/user", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], alice_id);
    assert_eq!(body["role"], "user");
    assert_eq!(body["isPremium"], false);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "username": "alice", "password": "nope" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send(Method::GET, "/api/user", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send(Method::GET, "/api/user", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn premium_artwork_is_gated() {
    let app = TestApp::new();
    for title in ["Sunflowers", "Starry Night", "Irises"] {
        app.add_artwork(title, false);
    }
    let premium = app.add_artwork("The Kiss", true);
    assert_eq!(premium, 4);

    let (status, body) = app.send(Method::GET, "/api/artworks/4", None, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "PremiumRequired");

    let (_, visitor) = app.register("visitor").await;
    let (status, _) = app.send(Method::GET, "/api/artworks/4", Some(&visitor), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, admin) = app.register("curator").await;
    let (status, body) = app.send(Method::GET, "/api/artworks/4", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "The Kiss");
    assert_eq!(body["videoUrl"], "/video/artwork.mp4");
    assert_eq!(body["locked"], false);

    // Upgrading takes effect on the same token
    let (status, body) = app.send(Method::POST, "/api/user/premium", Some(&visitor), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isPremium"], true);
    let (status, _) = app.send(Method::GET, "/api/artworks/4", Some(&visitor), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.send(Method::GET, "/api/artworks/99", Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_shows_locked_previews() {
    let app = TestApp::new();
    app.add_artwork("Free", false);
    app.add_artwork("Members only", true);

    let (status, body) = app.send(Method::GET, "/api/artworks", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["locked"], false);
    assert_eq!(items[0]["videoUrl"], "/video/artwork.mp4");
    assert_eq!(items[1]["locked"], true);
    assert_eq!(items[1]["videoUrl"], Value::Null);

    let (_, admin) = app.register("curator").await;
    let (_, body) = app.send(Method::GET, "/api/artworks", Some(&admin), None).await;
    assert_eq!(body[1]["locked"], false);

    let (_, body) = app.send(Method::GET, "/api/artworks?categoryId=2", None, None).await;
    assert!(body.as_array().unwrap().is_empty());

    let (_, body) = app.send(Method::GET, "/api/artworks?limit=1&offset=1", None, None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["title"], "Members only");
}

#[tokio::test]
async fn toggle_like_twice_leaves_no_record() {
    let app = TestApp::new();
    for i in 1..=6 {
        app.state
            .db
            .create_user(&format!("filler{i}"), "00.00", Role::User)
            .unwrap()
            .unwrap();
    }
    let (user_id, token) = app.register("alice").await;
    assert_eq!(user_id, 7);
    app.add_artwork("One", false);
    let artwork = app.add_artwork("Two", false);
    assert_eq!(artwork, 2);

    let (status, body) = app.send(Method::POST, "/api/artworks/2/like", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "liked": true }));
    assert_eq!(app.like_rows(7, 2), 1);

    let (_, body) = app.send(Method::POST, "/api/artworks/2/like", Some(&token), None).await;
    assert_eq!(body, json!({ "liked": false }));
    assert_eq!(app.like_rows(7, 2), 0);
}

#[tokio::test]
async fn interactions_require_auth_and_existing_artwork() {
    let app = TestApp::new();
    let artwork = app.add_artwork("Guernica", false);
    let (_, token) = app.register("alice").await;

    let (status, _) = app
        .send(Method::POST, &format!("/api/artworks/{artwork}/like"), None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send(Method::POST, "/api/artworks/404/bookmark", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app
        .send(Method::POST, &format!("/api/artworks/{artwork}/bookmark"), Some(&token), None)
        .await;
    assert_eq!(body, json!({ "bookmarked": true }));

    let (status, body) = app
        .send(Method::GET, &format!("/api/artworks/{artwork}/user-actions"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "liked": false, "bookmarked": true }));
}

#[tokio::test]
async fn views_count_every_call() {
    let app = TestApp::new();
    let artwork = app.add_artwork("Mona Lisa", true);

    let uri = format!("/api/artworks/{artwork}/view");
    let (status, body) = app.send(Method::POST, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "views": 1 }));
    let (_, body) = app.send(Method::POST, &uri, None, None).await;
    assert_eq!(body, json!({ "views": 2 }));

    let (status, _) = app.send(Method::POST, "/api/artworks/77/view", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn disabled_comments_reject_everyone() {
    let app = TestApp::new();
    let artwork = app.add_artwork("The Scream", false);
    let (_, alice) = app.register("alice").await;
    let (_, admin) = app.register("curator").await;

    let toggle = format!("/api/artworks/{artwork}/comments/toggle");
    let (status, _) = app.send(Method::POST, &toggle, Some(&alice), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.send(Method::POST, &toggle, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "commentsEnabled": false }));

    let comments = format!("/api/artworks/{artwork}/comments");
    for token in [&alice, &admin] {
        let (status, body) = app
            .send(Method::POST, &comments, Some(token.as_str()), Some(json!({ "content": "hello" })))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "CommentsDisabled");
    }

    let (_, body) = app.send(Method::POST, &toggle, Some(&admin), None).await;
    assert_eq!(body, json!({ "commentsEnabled": true }));
    let (status, _) = app
        .send(Method::POST, &comments, Some(&alice), Some(json!({ "content": "hello" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn comment_lifecycle_and_ownership() {
    let app = TestApp::new();
    let artwork = app.add_artwork("Nighthawks", false);
    let (alice_id, alice) = app.register("alice").await;
    let (_, bob) = app.register("bob").await;
    let (_, admin) = app.register("curator").await;

    let comments = format!("/api/artworks/{artwork}/comments");
    let (status, _) = app
        .send(Method::POST, &comments, None, Some(json!({ "content": "anon" })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .send(Method::POST, &comments, Some(&alice), Some(json!({ "content": "   " })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ValidationError");

    let mut ids = Vec::new();
    for text in ["first", "second"] {
        let (status, body) = app
            .send(Method::POST, &comments, Some(&alice), Some(json!({ "content": text })))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["userId"], alice_id);
        assert_eq!(body["username"], "alice");
        ids.push(body["id"].as_i64().unwrap());
    }

    let (status, body) = app.send(Method::GET, &comments, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["content"], "first");
    assert_eq!(body[1]["content"], "second");

    // Reports never remove the comment and count once per reporter
    let report = format!("/api/comments/{}/report", ids[0]);
    let (status, body) = app.send(Method::POST, &report, Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "reported": true, "reports": 1 }));
    let (_, body) = app.send(Method::POST, &report, Some(&bob), None).await;
    assert_eq!(body["reports"], 1);

    let (status, body) = app
        .send(Method::DELETE, &format!("/api/comments/{}", ids[0]), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Forbidden");

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/comments/{}", ids[0]), Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app.send(Method::POST, &report, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "CommentNotFound");

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/comments/{}", ids[1]), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/comments/{}", ids[1]), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app.send(Method::GET, &comments, None, None).await;
    assert!(body.as_array().unwrap().is_empty());

    let (status, _) = app.send(Method::GET, "/api/artworks/500/comments", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_artwork_validates_and_applies_defaults() {
    let app = TestApp::new();
    let (_, token) = app.register("alice").await;

    let payload = json!({
        "title": "Composition VIII",
        "description": "Kandinsky",
        "imageUrl": "/img/composition.jpg",
        "categoryId": 1
    });

    let (status, _) = app
        .send(Method::POST, "/api/artworks", None, Some(payload.clone()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut missing_title = payload.clone();
    missing_title["title"] = json!(" ");
    let (status, body) = app
        .send(Method::POST, "/api/artworks", Some(&token), Some(missing_title))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ValidationError");

    let mut bad_category = payload.clone();
    bad_category["categoryId"] = json!(42);
    let (status, _) = app
        .send(Method::POST, "/api/artworks", Some(&token), Some(bad_category))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send(Method::POST, "/api/artworks", Some(&token), Some(payload))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["isPremium"], false);
    assert_eq!(body["commentsEnabled"], true);
    assert_eq!(body["displayOrder"], 0);
    assert_eq!(body["aspectRatio"], 1.0);
    assert_eq!(body["views"], 0);
}

#[tokio::test]
async fn admin_sets_premium_status() {
    let app = TestApp::new();
    let artwork = app.add_artwork("Girl with a Pearl Earring", false);
    let (_, alice) = app.register("alice").await;
    let (_, admin) = app.register("curator").await;

    let uri = format!("/api/artworks/{artwork}/premium");
    let (status, _) = app
        .send(Method::POST, &uri, Some(&alice), Some(json!({ "isPremium": true })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(Method::POST, &uri, Some(&admin), Some(json!({ "isPremium": true })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "isPremium": true }));

    let (status, _) = app
        .send(Method::GET, &format!("/api/artworks/{artwork}"), Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(Method::POST, "/api/artworks/999/premium", Some(&admin), Some(json!({ "isPremium": true })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_promotes_user() {
    let app = TestApp::new();
    let (alice_id, alice) = app.register("alice").await;
    let (_, admin) = app.register("curator").await;

    let uri = format!("/api/users/{alice_id}/role");
    let (status, _) = app
        .send(Method::POST, &uri, Some(&alice), Some(json!({ "role": "admin" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(Method::POST, &uri, Some(&admin), Some(json!({ "role": "admin" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "admin");

    let (_, body) = app.send(Method::GET, "/api/user", Some(&alice), None).await;
    assert_eq!(body["role"], "admin");
}

#[tokio::test]
async fn categories_are_ordered_and_extendable() {
    let app = TestApp::new();

    let (status, body) = app.send(Method::GET, "/api/categories", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Painting", "Sculpture", "Photography", "Digital Art"]);

    let category = json!({ "name": "Textiles", "description": "Woven works", "displayOrder": 0 });
    let (status, _) = app
        .send(Method::POST, "/api/categories", None, Some(category.clone()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, token) = app.register("alice").await;
    let (status, body) = app
        .send(Method::POST, "/api/categories", Some(&token), Some(category))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Textiles");

    let (_, body) = app.send(Method::GET, "/api/categories", None, None).await;
    assert_eq!(body[0]["name"], "Textiles");
}

#[tokio::test]
async fn ad_slots_are_admin_configured() {
    let app = TestApp::new();
    let (_, alice) = app.register("alice").await;
    let (_, admin) = app.register("curator").await;

    let ad = json!({ "imageUrl": "/ads/spring.png", "linkUrl": "https://shop.example/spring" });
    let (status, _) = app
        .send(Method::PUT, "/api/ads/home-banner", Some(&alice), Some(ad.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(Method::PUT, "/api/ads/home-banner", Some(&admin), Some(ad))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slot"], "home-banner");
    assert_eq!(body["enabled"], true);

    let hidden = json!({ "imageUrl": "/ads/x.png", "linkUrl": "https://x.example", "enabled": false });
    app.send(Method::PUT, "/api/ads/sidebar", Some(&admin), Some(hidden)).await;

    let (status, body) = app.send(Method::GET, "/api/ads", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let slots = body.as_array().unwrap();
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0]["linkUrl"], "https://shop.example/spring");
}

#[tokio::test]
async fn comment_length_is_capped() {
    let app = TestApp::new();
    let artwork = app.add_artwork("The Garden of Earthly Delights", false);
    let (_, alice) = app.register("alice").await;
    let comments = format!("/api/artworks/{artwork}/comments");

    let (status, body) = app
        .send(Method::POST, &comments, Some(&alice), Some(json!({ "content": "x".repeat(2001) })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ValidationError");

    let (status, body) = app
        .send(Method::POST, &comments, Some(&alice), Some(json!({ "content": "x".repeat(2000) })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["content"].as_str().unwrap().len(), 2000);
}

#[tokio::test]
async fn listing_limit_is_clamped_over_http() {
    let app = TestApp::new();
    for i in 0..205 {
        app.add_artwork(&format!("Study {i}"), false);
    }

    let count = |body: &Value| body.as_array().unwrap().len();
    let (_, body) = app.send(Method::GET, "/api/artworks", None, None).await;
    assert_eq!(count(&body), 50);
    let (_, body) = app.send(Method::GET, "/api/artworks?limit=0", None, None).await;
    assert_eq!(count(&body), 1);
    let (_, body) = app.send(Method::GET, "/api/artworks?limit=500", None, None).await;
    assert_eq!(count(&body), 200);
    let (_, body) = app.send(Method::GET, "/api/artworks?limit=500&offset=200", None, None).await;
    assert_eq!(count(&body), 5);
}

#[tokio::test]
async fn stale_tokens_resolve_to_anonymous() {
    let app = TestApp::new();
    let (alice_id, _) = app.register("alice").await;
    app.add_artwork("Members only", true);

    let sign = |sub: i64, exp: i64| {
        let claims = Claims {
            sub,
            username: "alice".into(),
            exp: exp as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"integration-secret"),
        )
        .unwrap()
    };
    let now = chrono::Utc::now().timestamp();
    let expired = sign(alice_id, now - 3600);
    let missing_user = sign(9999, now + 3600);
    let wrong_secret = encode(
        &Header::default(),
        &Claims {
            sub: alice_id,
            username: "alice".into(),
            exp: (now + 3600) as usize,
        },
        &EncodingKey::from_secret(b"some-other-secret"),
    )
    .unwrap();

    for token in [&expired, &missing_user, &wrong_secret] {
        let (status, body) = app.send(Method::GET, "/api/user", Some(token.as_str()), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized");

        // Public routes still answer, with anonymous visibility
        let (status, body) = app.send(Method::GET, "/api/artworks", Some(token.as_str()), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["locked"], true);
    }

    let fresh = sign(alice_id, now + 3600);
    let (status, body) = app.send(Method::GET, "/api/user", Some(&fresh), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], alice_id);
}
