use std::sync::Arc;
use std::time::Duration;

use actix_web::dev::ServiceResponse;
use actix_web::http::StatusCode;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{App, test, web};
use chrono::NaiveDate;
use serde_json::{Value, json};

use scribe_core::domain::Identity;
use scribe_core::ports::{FixedClock, TokenService};
use scribe_core::{ContentStore, StoreConfig, StoreSnapshot, StoreStatus};
use scribe_infra::{InMemoryRemoteStore, JwtConfig, JwtTokenService};

use super::configure_routes;
use crate::state::AppState;

struct Harness {
    state: AppState,
    remote: Arc<InMemoryRemoteStore>,
    tokens: Arc<JwtTokenService>,
}

impl Harness {
    async fn new() -> Self {
        let remote = Arc::new(InMemoryRemoteStore::new());
        let store = Arc::new(ContentStore::with_clock(
            remote.clone(),
            Arc::new(FixedClock(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())),
            StoreConfig::default(),
        ));
        store.subscribe().await.unwrap();

        let tokens = Arc::new(JwtTokenService::new(JwtConfig {
            secret: "test-secret".to_string(),
            expiration_hours: 1,
            issuer: "scribe-test".to_string(),
        }));
        let token_service: Arc<dyn TokenService> = tokens.clone();
        let state = AppState::from_parts(store, Some(token_service));

        let harness = Self {
            state,
            remote,
            tokens,
        };
        harness.settle(|s| s.status == StoreStatus::Ready).await;
        harness
    }

    fn bearer(&self, identity: &Identity) -> (actix_web::http::header::HeaderName, String) {
        let token = self.tokens.generate_token(identity).unwrap();
        (AUTHORIZATION, format!("Bearer {}", token))
    }

    async fn settle<F>(&self, mut predicate: F) -> StoreSnapshot
    where
        F: FnMut(&StoreSnapshot) -> bool,
    {
        let mut rx = self.state.store.watch();
        let state = tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|s| predicate(s)))
            .await
            .expect("timed out waiting for store")
            .expect("store closed");
        state.clone()
    }

    async fn seed(&self, key: &str, record: Value) {
        self.remote.put_record("posts", key, record).await;
        let key = key.to_string();
        self.settle(|s| s.posts.iter().any(|p| p.id.as_str() == key))
            .await;
    }
}

fn amy() -> Identity {
    Identity::new("u-amy").with_display_name("Amy")
}

fn bob() -> Identity {
    Identity::new("u-bob").with_email("bob@example.com")
}

fn record(title: &str, category: &str, date: &str, tags: &[&str]) -> Value {
    json!({
        "title": title,
        "content": "Plain body text",
        "excerpt": "Short summary",
        "category": category,
        "tags": tags,
        "author": "Amy",
        "authorId": "u-amy",
        "date": date,
    })
}

fn new_post_body() -> Value {
    json!({
        "title": "Flexbox in Practice",
        "content": "Aligning things is easy now.",
        "excerpt": "A practical guide",
        "category": "CSS",
        "tags": "css, layout , ",
    })
}

async fn body_json<B: actix_web::body::MessageBody>(res: ServiceResponse<B>) -> Value {
    test::read_body_json(res).await
}

macro_rules! app {
    ($harness:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($harness.state.clone()))
                .configure(configure_routes),
        )
        .await
    };
}

/// GET `uri` and return the status with the decoded JSON body.
macro_rules! get_json {
    ($app:expr, $uri:expr) => {{
        let res = test::call_service($app, test::TestRequest::get().uri($uri).to_request()).await;
        let status = res.status();
        (status, body_json(res).await)
    }};
}

#[actix_web::test]
async fn test_health_reports_store_state() {
    let h = Harness::new().await;
    let app = app!(h);

    let (status, body) = get_json!(&app, "/api/health");

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"], "ready");
    assert_eq!(body["posts"], 0);
}

#[actix_web::test]
async fn test_create_requires_a_token() {
    let h = Harness::new().await;
    let app = app!(h);

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .set_json(new_post_body())
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(res).await;
    assert_eq!(body["title"], "Authentication Required");
    assert!(h.remote.records("posts").await.is_empty());
}

#[actix_web::test]
async fn test_create_then_read_after_sync() {
    let h = Harness::new().await;
    let app = app!(h);

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header(h.bearer(&amy()))
        .set_json(new_post_body())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    let body = body_json(res).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    h.settle(|s| s.posts.iter().any(|p| p.id.as_str() == id))
        .await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/posts/{}", id))
        .insert_header(h.bearer(&amy()))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let detail = body_json(res).await;

    assert_eq!(detail["post"]["title"], "Flexbox in Practice");
    assert_eq!(detail["post"]["author"], "Amy");
    assert_eq!(detail["post"]["authorId"], "u-amy");
    assert_eq!(detail["post"]["date"], "2024-06-01");
    assert_eq!(detail["post"]["tags"], json!(["css", "layout"]));
    assert_eq!(detail["post"]["readTime"], "5 min read");
    assert!(detail["post"]["image"].as_str().unwrap().starts_with("https://"));
    assert_eq!(detail["canEdit"], true);

    let (_, anonymous) = get_json!(&app, &format!("/api/posts/{}", id));
    assert_eq!(anonymous["canEdit"], false);
}

#[actix_web::test]
async fn test_invalid_post_lists_field_errors() {
    let h = Harness::new().await;
    let app = app!(h);

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header(h.bearer(&amy()))
        .set_json(json!({ "title": "  ", "category": "Cooking", "tags": [] }))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(res).await;
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["title", "content", "excerpt", "category", "tags"]);
    assert!(h.remote.records("posts").await.is_empty());
}

#[actix_web::test]
async fn test_malformed_json_is_a_problem_document() {
    let h = Harness::new().await;
    let app = app!(h);

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header(h.bearer(&amy()))
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = body_json(res).await;
    assert_eq!(body["status"], 400);
}

#[actix_web::test]
async fn test_only_the_author_may_edit_or_delete() {
    let h = Harness::new().await;
    h.seed("k1", record("Grid Basics", "CSS", "2024-01-10", &["css"]))
        .await;
    let app = app!(h);

    let edit = json!({
        "title": "Grid Basics, Revised",
        "content": "New body",
        "excerpt": "New summary",
        "category": "Design",
        "tags": ["grid"],
    });

    let req = test::TestRequest::put()
        .uri("/api/posts/k1")
        .insert_header(h.bearer(&bob()))
        .set_json(&edit)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri("/api/posts/k1")
        .insert_header(h.bearer(&bob()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::put()
        .uri("/api/posts/k1")
        .insert_header(h.bearer(&amy()))
        .set_json(&edit)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::ACCEPTED);

    let state = h
        .settle(|s| s.posts.iter().any(|p| p.title == "Grid Basics, Revised"))
        .await;
    let post = &state.posts[0];
    assert_eq!(post.category, "Design");
    assert_eq!(post.author, "Amy");
    assert_eq!(post.date, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
}

#[actix_web::test]
async fn test_delete_then_not_found() {
    let h = Harness::new().await;
    h.seed("k1", record("Short lived", "CSS", "2024-01-10", &["css"]))
        .await;
    let app = app!(h);

    let req = test::TestRequest::delete()
        .uri("/api/posts/k1")
        .insert_header(h.bearer(&amy()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::ACCEPTED);

    h.settle(|s| s.posts.is_empty()).await;
    let (status, body) = get_json!(&app, "/api/posts/k1");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["title"], "Not Found");

    let (_, results) = get_json!(&app, "/api/search?q=short");
    assert_eq!(results["total"], 0);
}

#[actix_web::test]
async fn test_edit_of_unknown_post_is_not_found() {
    let h = Harness::new().await;
    let app = app!(h);

    let req = test::TestRequest::delete()
        .uri("/api/posts/ghost")
        .insert_header(h.bearer(&amy()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_listing_featured_and_sorting() {
    let h = Harness::new().await;
    h.seed("a", record("beta post", "CSS", "2023-03-01", &["css"])).await;
    h.seed("b", record("Alpha post", "React", "2024-02-01", &["react"])).await;
    h.seed("c", record("gamma post", "CSS", "2023-12-01", &["css"])).await;
    let app = app!(h);

    let (_, listing) = get_json!(&app, "/api/posts");
    let titles: Vec<&str> = listing
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Alpha post", "gamma post", "beta post"]);

    let (_, featured) = get_json!(&app, "/api/posts/featured");
    assert_eq!(featured["title"], "Alpha post");

    let (_, by_title) = get_json!(&app, "/api/posts?sort=title&category=css");
    let titles: Vec<&str> = by_title
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["beta post", "gamma post"]);

    let (status, body) = get_json!(&app, "/api/posts?sort=popularity");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("popularity"));
}

#[actix_web::test]
async fn test_featured_on_empty_store_is_not_found() {
    let h = Harness::new().await;
    let app = app!(h);

    let (status, _) = get_json!(&app, "/api/posts/featured");
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_search_ranks_by_relevance() {
    let h = Harness::new().await;
    let mut grid = record("CSS Grid", "CSS", "2024-05-01", &["css"]);
    grid["excerpt"] = json!("Works nicely with React components");
    h.seed("grid", grid).await;
    h.seed(
        "hooks",
        record("React Hooks", "React", "2023-01-01", &["react", "hooks"]),
    )
    .await;
    h.seed("node", record("Node Streams", "Node.js", "2024-04-01", &["node"]))
        .await;
    let app = app!(h);

    let (status, body) = get_json!(&app, "/api/search?q=REACT");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sort"], "relevance");
    assert_eq!(body["total"], 2);
    assert_eq!(body["results"][0]["id"], "hooks");
    assert_eq!(body["results"][1]["id"], "grid");

    let (_, filtered) = get_json!(&app, "/api/search?q=react&category=CSS");
    assert_eq!(filtered["total"], 1);
    assert_eq!(filtered["results"][0]["id"], "grid");

    let (_, by_date) = get_json!(&app, "/api/search?q=react&sort=date");
    assert_eq!(by_date["results"][0]["id"], "grid");
}

#[actix_web::test]
async fn test_shared_query_state_drives_search() {
    let h = Harness::new().await;
    h.seed("a", record("Hooks deep dive", "React", "2024-01-01", &["react"]))
        .await;
    h.seed("b", record("Selectors", "CSS", "2024-01-02", &["css"])).await;
    let app = app!(h);

    let req = test::TestRequest::put()
        .uri("/api/search/query")
        .set_json(json!({ "query": "hooks", "category": "react" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["query"], "hooks");
    assert_eq!(body["category"], "React");

    let (_, results) = get_json!(&app, "/api/search");
    assert_eq!(results["query"], "hooks");
    assert_eq!(results["total"], 1);
    assert_eq!(results["results"][0]["id"], "a");

    let req = test::TestRequest::put()
        .uri("/api/search/query")
        .set_json(json!({ "query": "", "category": "Cooking" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_categories_with_counts() {
    let h = Harness::new().await;
    h.seed("a", record("One", "CSS", "2024-01-01", &["css"])).await;
    h.seed("b", record("Two", "CSS", "2024-01-02", &["css"])).await;
    h.seed("c", record("Three", "Cooking", "2024-01-03", &["food"])).await;
    let app = app!(h);

    let (_, categories) = get_json!(&app, "/api/categories");
    let categories = categories.as_array().unwrap();
    assert_eq!(categories.len(), 7);
    assert_eq!(categories[0], json!({ "name": "React", "count": 0 }));
    assert_eq!(categories[1], json!({ "name": "CSS", "count": 2 }));
    assert_eq!(categories[6], json!({ "name": "Cooking", "count": 1 }));

    let (status, css) = get_json!(&app, "/api/categories/css");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(css["name"], "CSS");
    assert_eq!(css["posts"].as_array().unwrap().len(), 2);

    let (_, empty) = get_json!(&app, "/api/categories/design");
    assert_eq!(empty["name"], "Design");
    assert!(empty["posts"].as_array().unwrap().is_empty());

    let (status, _) = get_json!(&app, "/api/categories/knitting");
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_rejected_write_surfaces_in_status() {
    let h = Harness::new().await;
    h.remote.reject_writes("permission denied").await;
    let app = app!(h);

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header(h.bearer(&amy()))
        .set_json(new_post_body())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

    let (_, status) = get_json!(&app, "/api/store/status");
    assert_eq!(status["status"], "ready");
    assert_eq!(status["loading"], false);
    assert_eq!(status["inFlight"], 0);
    assert_eq!(status["postCount"], 0);
    assert_eq!(status["failedMutations"][0]["kind"], "create");
    assert!(
        status["failedMutations"][0]["error"]
            .as_str()
            .unwrap()
            .contains("permission denied")
    );
}

#[actix_web::test]
async fn test_subscription_failure_keeps_serving_posts() {
    let h = Harness::new().await;
    h.seed("a", record("Still here", "CSS", "2024-01-01", &["css"])).await;
    h.remote.fail_subscribers("posts", "permission denied").await;
    h.settle(|s| s.status == StoreStatus::Error).await;
    let app = app!(h);

    let (_, status) = get_json!(&app, "/api/store/status");
    assert_eq!(status["status"], "error");
    assert!(status["error"].as_str().unwrap().contains("permission denied"));

    let (code, listing) = get_json!(&app, "/api/posts");
    assert_eq!(code, StatusCode::OK);
    assert_eq!(listing.as_array().unwrap().len(), 1);
}
