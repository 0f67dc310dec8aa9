//! Integration tests for the LeetSight backend.

use std::sync::Arc;

use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::auth::IdTokenVerifier;
use crate::config::{Config, GOOGLE_JWKS_URL};
use crate::db::{init_database, Repository};
use crate::search::SearchIndex;
use crate::{create_router, AppState};

const ADMIN_KEY: &str = "test-admin-key";
const AUTH_SECRET: &str = "test-auth-secret";

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_psk(Some(ADMIN_KEY.to_string())).await
    }

    async fn with_psk(psk: Option<String>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");
        let index_path = temp_dir.path().join("index");

        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let repo = Arc::new(Repository::new(pool));

        let search = Arc::new(SearchIndex::open(&index_path).expect("Failed to init search"));

        let config = Config {
            db_path,
            index_path,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            admin_psk: psk,
            google_client_id: None,
            google_jwks_url: GOOGLE_JWKS_URL.to_string(),
            auth_secret: Some(AUTH_SECRET.to_string()),
            default_page_size: 10,
            max_page_size: 100,
        };
        let verifier = Arc::new(IdTokenVerifier::from_config(&config));

        let state = AppState {
            repo,
            search,
            config: Arc::new(config),
            verifier,
        };

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        TestFixture {
            client: Client::new(),
            base_url,
            _temp_dir: temp_dir,
        }
    }

    /// Fixture with the standard posts already ingested.
    async fn seeded() -> Self {
        let fixture = Self::new().await;
        for post in sample_posts() {
            let resp = fixture
                .admin(fixture.client.put(fixture.url("/api/v1/admin/posts")))
                .json(&post)
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::CREATED);
        }
        fixture
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn admin(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("x-api-key", ADMIN_KEY)
    }

    async fn get_json(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut request = self.client.get(self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let resp = request.send().await.unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap_or(Value::Null))
    }

    /// Ids of the questions of a post, in extraction order.
    async fn question_ids(&self, topic_id: i64) -> Vec<String> {
        let (_, body) = self
            .get_json(&format!("/api/v1/posts/{}/questions", topic_id), None)
            .await;
        body["questions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|q| q["id"].as_str().unwrap().to_string())
            .collect()
    }
}

fn token_for(sub: &str, email: &str) -> String {
    let claims = json!({
        "sub": sub,
        "email": email,
        "name": format!("User {}", sub),
        "picture": "https://example.com/avatar.png",
        "exp": chrono::Utc::now().timestamp() + 3600,
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(AUTH_SECRET.as_bytes()),
    )
    .unwrap()
}

fn sample_posts() -> Vec<Value> {
    vec![
        // Shaped like the extraction pipeline output
        json!({
            "topic_id": 101,
            "title": "Google L4 onsite",
            "slug": "google-l4-onsite",
            "leetcode_created_at": "2024-03-10T12:00:00Z",
            "yoe": 3,
            "views": 120,
            "tags": ["google", "onsite"],
            "companies_mentioned_in_post": ["Google"],
            "questions_extracted": [
                {
                    "original_question_text": "Design a rate limiter",
                    "refined_role": "SDE II",
                    "refined_company": "Google",
                    "tags": ["system design"],
                    "similar_leetcode_questions": [
                        { "source": "LC 359", "similarity_score": 0.82 }
                    ]
                },
                {
                    "original_question_text": "Merge overlapping intervals",
                    "refined_role": "SDE II",
                    "refined_company": "Google",
                    "tags": ["arrays"]
                }
            ]
        }),
        json!({
            "topic_id": 202,
            "title": "Amazon phone screen",
            "leetcode_created_at": "2024-05-02T09:30:00Z",
            "companies": ["Amazon"],
            "questions": [
                {
                    "question_text": "Implement an LRU cache",
                    "role": "SDE I",
                    "company": "Amazon",
                    "tags": ["design"]
                },
                {
                    "question_text": "Two sum",
                    "company": "Amazon",
                    "tags": ["hash map"]
                }
            ]
        }),
        // No extracted questions: hidden from the feeds
        json!({
            "topic_id": 303,
            "title": "Offer negotiation tips",
            "leetcode_created_at": "2024-06-01T00:00:00Z",
            "companies": ["Meta"]
        }),
    ]
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_admin_requires_psk() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/v1/admin/reindex"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "UNAUTHORIZED");

    let resp = fixture
        .client
        .post(fixture.url("/api/v1/admin/reindex"))
        .header("x-api-key", "wrong-key")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = fixture
        .client
        .post(fixture.url("/api/v1/admin/reindex"))
        .bearer_auth(ADMIN_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_admin_disabled_without_psk() {
    let fixture = TestFixture::with_psk(None).await;

    let resp = fixture
        .client
        .post(fixture.url("/api/v1/admin/reindex"))
        .header("x-api-key", "anything")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn test_ingest_is_idempotent() {
    let fixture = TestFixture::seeded().await;
    let before = fixture.question_ids(101).await;
    assert_eq!(before.len(), 2);

    let resp = fixture
        .admin(fixture.client.put(fixture.url("/api/v1/admin/posts")))
        .json(&sample_posts()[0])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["created"], false);
    assert_eq!(body["questions"], 2);
    assert_eq!(body["removed_questions"], 0);

    assert_eq!(fixture.question_ids(101).await, before);
}

#[tokio::test]
async fn test_reingest_drops_missing_questions() {
    let fixture = TestFixture::seeded().await;
    let token = token_for("google-ada", "ada@example.com");
    let ids = fixture.question_ids(101).await;
    let (kept_id, dropped_id) = (&ids[0], &ids[1]);

    let (_, before) = fixture
        .get_json("/api/company-questions?company=Google", None)
        .await;
    let first_seen = before["questions"][0]["firstSeenAt"].clone();

    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/v1/users/me/question-status/{}", dropped_id)))
        .bearer_auth(&token)
        .json(&json!({ "is_done": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let list: Value = fixture
        .client
        .post(fixture.url("/api/v1/lists"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Google prep" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let list_id = list["id"].as_str().unwrap().to_string();
    for question_id in [kept_id, dropped_id] {
        let resp = fixture
            .client
            .post(fixture.url(&format!("/api/v1/lists/{}/questions/{}", list_id, question_id)))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    // Timestamps have second precision
    tokio::time::sleep(tokio::time::Duration::from_millis(1100)).await;

    let mut post = sample_posts()[0].clone();
    post["questions_extracted"] = json!([
        { "original_question_text": "Design a rate limiter", "refined_company": "Google" }
    ]);
    let resp = fixture
        .admin(fixture.client.put(fixture.url("/api/v1/admin/posts")))
        .json(&post)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["removed_questions"], 1);
    assert_eq!(fixture.question_ids(101).await, vec![kept_id.clone()]);

    // Entries of the dropped question go with it
    let (_, detail) = fixture
        .get_json(&format!("/api/v1/lists/{}", list_id), Some(&token))
        .await;
    assert_eq!(detail["questions_count"], 1);
    assert_eq!(detail["questions"].as_array().unwrap().len(), 1);
    assert_eq!(detail["questions"][0]["id"], kept_id.as_str());

    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/v1/users/me/question-status/{}", dropped_id)))
        .bearer_auth(&token)
        .json(&json!({ "is_done": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let (_, after) = fixture
        .get_json("/api/company-questions?company=Google", None)
        .await;
    assert_eq!(after["totalQuestions"], 1);
    assert_eq!(after["questions"][0]["firstSeenAt"], first_seen);
    assert_ne!(after["questions"][0]["lastSeenAt"], first_seen);
}

#[tokio::test]
async fn test_ingest_validation() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .admin(fixture.client.put(fixture.url("/api/v1/admin/posts")))
        .json(&json!({ "topic_id": 1, "title": "  " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = fixture
        .admin(fixture.client.put(fixture.url("/api/v1/admin/posts")))
        .json(&json!({ "topic_id": 1, "title": "x", "leetcode_created_at": "yesterday" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_list_posts() {
    let fixture = TestFixture::seeded().await;

    let (status, body) = fixture.get_json("/api/v1/posts", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["total_records"], 2);
    assert_eq!(body["current_page"], 1);
    assert_eq!(body["total_pages"], 1);
    assert_eq!(body["has_next_page"], false);

    let items = body["items"].as_array().unwrap();
    assert_eq!(items[0]["topic_id"], 202);
    assert_eq!(items[1]["topic_id"], 101);
    assert_eq!(items[1]["questions_extracted"], 2);
    assert_eq!(items[1]["roles"], json!(["SDE II"]));
    assert_eq!(items[1]["companies"][0]["name"], "Google");
    assert_eq!(items[1]["likes_count"], 0);
    assert_eq!(items[1]["is_liked"], false);
}

#[tokio::test]
async fn test_list_posts_filters() {
    let fixture = TestFixture::seeded().await;

    let (_, companies) = fixture.get_json("/api/v1/companies", None).await;
    let google_id = companies
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == "Google")
        .unwrap()["id"]
        .as_i64()
        .unwrap();

    let (_, body) = fixture
        .get_json(&format!("/api/v1/posts?company_id={}", google_id), None)
        .await;
    assert_eq!(body["total_records"], 1);
    assert_eq!(body["items"][0]["topic_id"], 101);

    let (_, body) = fixture.get_json("/api/v1/posts?role=SDE%20I", None).await;
    assert_eq!(body["total_records"], 1);
    assert_eq!(body["items"][0]["topic_id"], 202);

    let (_, body) = fixture.get_json("/api/v1/posts?role=All%20Roles", None).await;
    assert_eq!(body["total_records"], 2);

    // End date is inclusive
    let (_, body) = fixture
        .get_json("/api/v1/posts?start_date=2024-03-01&end_date=2024-03-10", None)
        .await;
    assert_eq!(body["total_records"], 1);
    assert_eq!(body["items"][0]["topic_id"], 101);
}

#[tokio::test]
async fn test_list_posts_bad_dates() {
    let fixture = TestFixture::seeded().await;

    let (status, body) = fixture.get_json("/api/v1/posts?start_date=03/01/2024", None).await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "BAD_REQUEST");

    let (status, _) = fixture
        .get_json("/api/v1/posts?start_date=2024-05-01&end_date=2024-04-01", None)
        .await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_list_posts_pagination() {
    let fixture = TestFixture::seeded().await;

    let (_, body) = fixture.get_json("/api/v1/posts?limit=1", None).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["total_pages"], 2);
    assert_eq!(body["has_next_page"], true);

    let (_, body) = fixture.get_json("/api/v1/posts?limit=1&skip=1", None).await;
    assert_eq!(body["items"][0]["topic_id"], 101);
    assert_eq!(body["current_page"], 2);
    assert_eq!(body["has_next_page"], false);
}

#[tokio::test]
async fn test_huge_skip_does_not_overflow() {
    let fixture = TestFixture::seeded().await;

    let (status, body) = fixture
        .get_json("/api/v1/posts?skip=9223372036854775807", None)
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["items"], json!([]));
    assert_eq!(body["total_records"], 2);
    assert_eq!(body["has_next_page"], false);

    let (status, _) = fixture
        .get_json("/api/v1/lists?skip=9223372036854775807&limit=100", None)
        .await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn test_companies_and_roles() {
    let fixture = TestFixture::seeded().await;

    let (status, body) = fixture.get_json("/api/v1/companies", None).await;
    assert_eq!(status, 200);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Amazon", "Google", "Meta"]);

    let amazon_id = body[0]["id"].as_i64().unwrap();
    let (status, roles) = fixture
        .get_json(&format!("/api/v1/companies/{}/roles", amazon_id), None)
        .await;
    assert_eq!(status, 200);
    assert_eq!(roles, json!(["SDE I"]));

    let (status, _) = fixture.get_json("/api/v1/companies/9999/roles", None).await;
    assert_eq!(status, 404);

    // Companies named only by a question are linked to its post
    let resp = fixture
        .admin(fixture.client.put(fixture.url("/api/v1/admin/posts")))
        .json(&json!({
            "topic_id": 404,
            "title": "Netflix loop",
            "leetcode_created_at": "2024-07-01T00:00:00Z",
            "questions": [{ "question_text": "Design a CDN", "company": "Netflix" }]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let (_, body) = fixture.get_json("/api/v1/companies", None).await;
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Amazon", "Google", "Meta", "Netflix"]);
}

#[tokio::test]
async fn test_post_questions() {
    let fixture = TestFixture::seeded().await;

    let (status, body) = fixture.get_json("/api/v1/posts/101/questions", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["post"]["title"], "Google L4 onsite");
    assert_eq!(body["post"]["slug"], "google-l4-onsite");

    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0]["question_text"], "Design a rate limiter");
    assert_eq!(questions[0]["similar_questions"][0]["source"], "LC 359");
    assert_eq!(questions[0]["companies"][0]["name"], "Google");
    assert_eq!(questions[0]["is_done"], false);
    assert_eq!(questions[0]["saved_in_lists"], json!([]));

    let (status, _) = fixture.get_json("/api/v1/posts/999/questions", None).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_user_auth() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/api/v1/users/me", None).await;
    assert_eq!(status, 401);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = fixture.get_json("/api/v1/users/me", Some("not-a-jwt")).await;
    assert_eq!(status, 401);

    let token = token_for("google-ada", "ada@example.com");
    let (status, body) = fixture.get_json("/api/v1/users/me", Some(&token)).await;
    assert_eq!(status, 200);
    assert_eq!(body["id"], "google-ada");
    assert_eq!(body["username"], "ada");
    assert_eq!(body["full_name"], "User google-ada");

    // Anonymous routes still reject a bad token
    let (status, _) = fixture.get_json("/api/v1/posts", Some("not-a-jwt")).await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn test_question_status() {
    let fixture = TestFixture::seeded().await;
    let token = token_for("google-ada", "ada@example.com");
    let question_id = fixture.question_ids(101).await[0].clone();

    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/v1/users/me/question-status/{}", question_id)))
        .bearer_auth(&token)
        .json(&json!({ "is_done": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["is_done"], true);

    let (_, body) = fixture
        .get_json("/api/v1/posts/101/questions", Some(&token))
        .await;
    assert_eq!(body["questions"][0]["is_done"], true);
    assert_eq!(body["questions"][1]["is_done"], false);

    // Done flags are per user
    let other = token_for("google-bob", "bob@example.com");
    let (_, body) = fixture
        .get_json("/api/v1/posts/101/questions", Some(&other))
        .await;
    assert_eq!(body["questions"][0]["is_done"], false);

    let resp = fixture
        .client
        .put(fixture.url("/api/v1/users/me/question-status/missing"))
        .bearer_auth(&token)
        .json(&json!({ "is_done": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_post_reactions() {
    let fixture = TestFixture::seeded().await;
    let token = token_for("google-ada", "ada@example.com");

    let resp = fixture
        .client
        .post(fixture.url("/api/v1/posts/101/like"))
        .bearer_auth(&token)
        .json(&json!({ "is_like": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "added");
    assert_eq!(body["item_id"], "101");
    assert_eq!(body["likes_count"], 1);
    assert_eq!(body["is_liked"], true);

    let resp = fixture
        .client
        .post(fixture.url("/api/v1/posts/101/like"))
        .bearer_auth(&token)
        .json(&json!({ "is_like": false }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "updated");
    assert_eq!(body["likes_count"], 0);
    assert_eq!(body["dislikes_count"], 1);
    assert_eq!(body["is_disliked"], true);

    let (_, feed) = fixture.get_json("/api/v1/posts", Some(&token)).await;
    assert_eq!(feed["items"][1]["is_disliked"], true);

    let resp = fixture
        .client
        .delete(fixture.url("/api/v1/posts/101/like"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "removed");
    assert_eq!(body["is_like"], Value::Null);
    assert_eq!(body["dislikes_count"], 0);

    let resp = fixture
        .client
        .post(fixture.url("/api/v1/posts/999/like"))
        .bearer_auth(&token)
        .json(&json!({ "is_like": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = fixture
        .client
        .post(fixture.url("/api/v1/posts/101/like"))
        .json(&json!({ "is_like": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_list_lifecycle() {
    let fixture = TestFixture::seeded().await;
    let owner = token_for("google-ada", "ada@example.com");
    let other = token_for("google-bob", "bob@example.com");
    let question_id = fixture.question_ids(202).await[0].clone();

    let resp = fixture
        .client
        .post(fixture.url("/api/v1/lists"))
        .bearer_auth(&owner)
        .json(&json!({ "name": "  Design prep ", "tags": ["design", "design"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let list: Value = resp.json().await.unwrap();
    let list_id = list["id"].as_str().unwrap().to_string();
    assert_eq!(list["name"], "Design prep");
    assert_eq!(list["is_public"], false);
    assert_eq!(list["tags"], json!(["design"]));
    assert_eq!(list["questions_count"], 0);
    assert_eq!(list["user"]["username"], "ada");

    // Add twice, the second add is a no-op
    for _ in 0..2 {
        let resp = fixture
            .client
            .post(fixture.url(&format!("/api/v1/lists/{}/questions/{}", list_id, question_id)))
            .bearer_auth(&owner)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["action_performed"], "add");
        assert_eq!(body["questions_count"], 1);
    }

    let (status, detail) = fixture
        .get_json(&format!("/api/v1/lists/{}", list_id), Some(&owner))
        .await;
    assert_eq!(status, 200);
    assert_eq!(detail["questions"][0]["id"], question_id.as_str());
    assert_eq!(detail["questions"][0]["saved_in_lists"], json!([list_id.clone()]));
    assert_eq!(detail["views"], 0);

    // Private lists are hidden from everyone else
    let (status, _) = fixture
        .get_json(&format!("/api/v1/lists/{}", list_id), Some(&other))
        .await;
    assert_eq!(status, 404);
    let (status, _) = fixture
        .get_json(&format!("/api/v1/lists/{}", list_id), None)
        .await;
    assert_eq!(status, 404);

    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/v1/lists/{}", list_id)))
        .bearer_auth(&other)
        .json(&json!({ "is_public": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/v1/lists/{}", list_id)))
        .bearer_auth(&owner)
        .json(&json!({ "is_public": true, "description": "LLD questions" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let updated: Value = resp.json().await.unwrap();
    assert_eq!(updated["is_public"], true);
    assert_eq!(updated["name"], "Design prep");
    assert_eq!(updated["description"], "LLD questions");

    // Views by others are counted
    let (status, detail) = fixture
        .get_json(&format!("/api/v1/lists/{}", list_id), Some(&other))
        .await;
    assert_eq!(status, 200);
    assert_eq!(detail["views"], 1);
    assert_eq!(detail["questions"][0]["saved_in_lists"], json!([]));

    let resp = fixture
        .client
        .post(fixture.url(&format!("/api/v1/lists/{}/questions/{}", list_id, question_id)))
        .bearer_auth(&owner)
        .json(&json!({ "action": "remove" }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["action_performed"], "remove");
    assert_eq!(body["questions_count"], 0);

    let resp = fixture
        .client
        .delete(fixture.url(&format!("/api/v1/lists/{}", list_id)))
        .bearer_auth(&other)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = fixture
        .client
        .delete(fixture.url(&format!("/api/v1/lists/{}", list_id)))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    let (status, _) = fixture
        .get_json(&format!("/api/v1/lists/{}", list_id), Some(&owner))
        .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_list_validation() {
    let fixture = TestFixture::new().await;
    let token = token_for("google-ada", "ada@example.com");

    let resp = fixture
        .client
        .post(fixture.url("/api/v1/lists"))
        .bearer_auth(&token)
        .json(&json!({ "name": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let resp = fixture
        .client
        .post(fixture.url("/api/v1/lists"))
        .bearer_auth(&token)
        .json(&json!({ "name": "x".repeat(101) }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = fixture
        .client
        .post(fixture.url("/api/v1/lists"))
        .json(&json!({ "name": "Graphs" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_malformed_input_uses_error_body() {
    let fixture = TestFixture::seeded().await;
    let token = token_for("google-ada", "ada@example.com");

    let resp = fixture
        .client
        .post(fixture.url("/api/v1/lists"))
        .bearer_auth(&token)
        .json(&json!({ "name": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "BAD_REQUEST");
    assert!(body["error"].is_string());

    let resp = fixture
        .client
        .post(fixture.url("/api/v1/feedback"))
        .bearer_auth(&token)
        .body("not json")
        .header("content-type", "application/json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "BAD_REQUEST");

    let (status, body) = fixture.get_json("/api/v1/posts/abc/questions", None).await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "BAD_REQUEST");

    let (status, body) = fixture.get_json("/api/v1/posts?skip=lots", None).await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "BAD_REQUEST");

    // A list toggle with a mistyped body is rejected rather than defaulted
    let list: Value = fixture
        .client
        .post(fixture.url("/api/v1/lists"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Graphs" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let question_id = &fixture.question_ids(101).await[0];
    let resp = fixture
        .client
        .post(fixture.url(&format!(
            "/api/v1/lists/{}/questions/{}",
            list["id"].as_str().unwrap(),
            question_id
        )))
        .bearer_auth(&token)
        .json(&json!({ "action": "explode" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_public_and_own_lists() {
    let fixture = TestFixture::seeded().await;
    let ada = token_for("google-ada", "ada@example.com");
    let bob = token_for("google-bob", "bob@example.com");

    for (token, name, is_public) in [
        (&ada, "Graph drills", true),
        (&ada, "Secret stash", false),
        (&bob, "Bob's DP set", true),
    ] {
        let resp = fixture
            .client
            .post(fixture.url("/api/v1/lists"))
            .bearer_auth(token)
            .json(&json!({ "name": name, "is_public": is_public }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
    }

    let (_, body) = fixture.get_json("/api/v1/lists", None).await;
    assert_eq!(body["total_records"], 2);
    assert!(body["items"]
        .as_array()
        .unwrap()
        .iter()
        .all(|l| l["is_public"] == true));

    let (_, body) = fixture.get_json("/api/v1/lists?q=GRAPH", None).await;
    assert_eq!(body["total_records"], 1);
    assert_eq!(body["items"][0]["name"], "Graph drills");

    let (_, body) = fixture.get_json("/api/v1/users/me/lists", Some(&ada)).await;
    assert_eq!(body["total_records"], 2);

    let (status, _) = fixture.get_json("/api/v1/users/me/lists", None).await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn test_list_reactions() {
    let fixture = TestFixture::new().await;
    let ada = token_for("google-ada", "ada@example.com");
    let bob = token_for("google-bob", "bob@example.com");

    let mut ids = Vec::new();
    for is_public in [true, false] {
        let resp = fixture
            .client
            .post(fixture.url("/api/v1/lists"))
            .bearer_auth(&ada)
            .json(&json!({ "name": "Prep", "is_public": is_public }))
            .send()
            .await
            .unwrap();
        let body: Value = resp.json().await.unwrap();
        ids.push(body["id"].as_str().unwrap().to_string());
    }

    let resp = fixture
        .client
        .post(fixture.url(&format!("/api/v1/lists/{}/like", ids[0])))
        .bearer_auth(&bob)
        .json(&json!({ "is_like": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["likes_count"], 1);

    let (_, list) = fixture
        .get_json(&format!("/api/v1/lists/{}", ids[0]), Some(&bob))
        .await;
    assert_eq!(list["likes_count"], 1);
    assert_eq!(list["is_liked"], true);

    let (_, list) = fixture
        .get_json(&format!("/api/v1/lists/{}", ids[0]), Some(&ada))
        .await;
    assert_eq!(list["is_liked"], Value::Null);

    // Private lists of others cannot be reacted to
    let resp = fixture
        .client
        .post(fixture.url(&format!("/api/v1/lists/{}/like", ids[1])))
        .bearer_auth(&bob)
        .json(&json!({ "is_like": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_feedback() {
    let fixture = TestFixture::new().await;
    let token = token_for("google-ada", "ada@example.com");

    let resp = fixture
        .client
        .post(fixture.url("/api/v1/feedback"))
        .bearer_auth(&token)
        .json(&json!({ "type": "bug", "title": "Broken filter", "description": "Role filter resets" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    assert!(body["id"].as_str().is_some());

    let resp = fixture
        .client
        .post(fixture.url("/api/v1/feedback"))
        .bearer_auth(&token)
        .json(&json!({ "type": "rant", "title": "x", "description": "y" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Select type");

    let resp = fixture
        .client
        .post(fixture.url("/api/v1/feedback"))
        .json(&json!({ "type": "bug", "title": "x", "description": "y" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = fixture
        .admin(fixture.client.get(fixture.url("/api/v1/admin/feedback")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["total_records"], 1);
    assert_eq!(body["items"][0]["type"], "bug");
    assert_eq!(body["items"][0]["user_id"], "google-ada");
}

#[tokio::test]
async fn test_search_endpoint() {
    let fixture = TestFixture::seeded().await;

    let (status, body) = fixture.get_json("/api/v1/search?q=limiter", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["question"]["question_text"], "Design a rate limiter");
    assert!(body["items"][0]["score"].as_f64().unwrap() > 0.0);

    // Company names are searchable
    let (_, body) = fixture.get_json("/api/v1/search?q=amazon", None).await;
    assert_eq!(body["total"], 2);

    let (_, body) = fixture.get_json("/api/v1/search?q=", None).await;
    assert_eq!(body["items"], json!([]));

    let (status, _) = fixture
        .get_json("/api/v1/search?q=nosuchfield:cache", None)
        .await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_search_window_bounds() {
    let fixture = TestFixture::seeded().await;

    let (status, body) = fixture
        .get_json("/api/v1/search?q=design&offset=1000000000000", None)
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "BAD_REQUEST");

    let (status, _) = fixture
        .get_json("/api/v1/search?q=design&offset=18446744073709551615", None)
        .await;
    assert_eq!(status, 400);

    // Limit follows the configured page sizes
    let (status, body) = fixture
        .get_json("/api/v1/search?q=amazon&limit=1000&offset=1", None)
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["limit"], 100);
    assert_eq!(body["offset"], 1);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    let (_, body) = fixture.get_json("/api/v1/search?q=amazon", None).await;
    assert_eq!(body["limit"], 10);
}

#[tokio::test]
async fn test_reindex() {
    let fixture = TestFixture::seeded().await;

    let resp = fixture
        .admin(fixture.client.post(fixture.url("/api/v1/admin/reindex")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["indexed"], 4);

    let (_, body) = fixture.get_json("/api/v1/search?q=lru", None).await;
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn test_catalog_companies_and_roles() {
    let fixture = TestFixture::seeded().await;

    let (status, _) = fixture.get_json("/api/companies", None).await;
    assert_eq!(status, 401);

    let token = token_for("google-ada", "ada@example.com");
    let (status, body) = fixture.get_json("/api/companies", Some(&token)).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!(["Amazon", "Google"]));

    let (status, body) = fixture.get_json("/api/roles", None).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Company parameter is required");

    let (_, body) = fixture.get_json("/api/roles?company=Amazon", None).await;
    assert_eq!(body, json!(["N/A", "SDE I"]));
}

#[tokio::test]
async fn test_catalog_recent_posts() {
    let fixture = TestFixture::seeded().await;

    let (status, body) = fixture.get_json("/api/recent-posts", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["totalPosts"], 2);
    assert_eq!(body["currentPage"], 1);
    assert_eq!(body["totalPages"], 1);
    assert_eq!(body["posts"][0]["topicId"], 202);

    let (_, body) = fixture
        .get_json("/api/recent-posts?company=Google&page=1&limit=5", None)
        .await;
    assert_eq!(body["totalPosts"], 1);
    let post = &body["posts"][0];
    assert_eq!(post["topicId"], 101);
    assert_eq!(post["leetcodeCreatedAt"], "2024-03-10T12:00:00Z");
    assert_eq!(post["companies_mentioned_in_post"], json!(["Google"]));
    assert_eq!(post["questions_extracted"][0]["refined_company"], "Google");
    assert_eq!(
        post["questions_extracted"][0]["similar_leetcode_questions"][0]["source"],
        "LC 359"
    );

    let (_, body) = fixture
        .get_json("/api/recent-posts?company=All%20Companies&timePeriod=All%20Time", None)
        .await;
    assert_eq!(body["totalPosts"], 2);

    // Seeded posts are from 2024
    let (_, body) = fixture
        .get_json("/api/recent-posts?timePeriod=Last%20Week", None)
        .await;
    assert_eq!(body["totalPosts"], 0);
    assert_eq!(body["totalPages"], 1);
}

#[tokio::test]
async fn test_catalog_company_questions() {
    let fixture = TestFixture::seeded().await;

    let (status, _) = fixture.get_json("/api/company-questions", None).await;
    assert_eq!(status, 400);
    let (status, _) = fixture
        .get_json("/api/company-questions?company=All%20Companies", None)
        .await;
    assert_eq!(status, 400);

    let (status, body) = fixture
        .get_json("/api/company-questions?company=Amazon", None)
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["totalQuestions"], 2);
    assert_eq!(body["roleName"], "All Roles");
    assert_eq!(body["companyName"], "Amazon");

    let (_, body) = fixture
        .get_json(
            "/api/company-questions?company=Amazon&role=Unspecified%20Role%20(N%2FA)",
            None,
        )
        .await;
    assert_eq!(body["totalQuestions"], 1);
    assert_eq!(body["roleName"], "Unspecified Role (N/A)");
    let question = &body["questions"][0];
    assert_eq!(question["question_text"], "Two sum");
    assert_eq!(question["topicId"], 202);
    assert_eq!(question["role_name_context"], "N/A");
    assert_eq!(question["company_name_context"], "Amazon");

    let (_, body) = fixture
        .get_json("/api/company-questions?company=Google&limit=1&page=2", None)
        .await;
    assert_eq!(body["totalQuestions"], 2);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["currentPage"], 2);
    assert_eq!(body["questions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_catalog_post_detail() {
    let fixture = TestFixture::seeded().await;

    let (status, body) = fixture.get_json("/api/post-detail/abc", None).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Invalid Topic ID");

    let (status, _) = fixture.get_json("/api/post-detail/999", None).await;
    assert_eq!(status, 404);

    let (status, body) = fixture.get_json("/api/post-detail/202", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["topicId"], 202);
    assert_eq!(body["title"], "Amazon phone screen");
    assert_eq!(body["questions_extracted"].as_array().unwrap().len(), 2);
    assert_eq!(body["questions_extracted"][1]["refined_role"], "N/A");
}
