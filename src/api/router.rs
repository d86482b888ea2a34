use axum::{http::HeaderValue, middleware, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use super::health;
use super::middleware::{logging_middleware, metrics_middleware, security_headers_middleware};
use super::state::AppState;
use super::v1;
use crate::config::ServerConfig;
use crate::infrastructure::observability::{create_metrics_router, PrometheusMetrics};

/// Full router: probes, `/v1`, optional `/metrics`, and the middleware stack
pub fn create_router(
    state: AppState,
    server: &ServerConfig,
    metrics: Option<PrometheusMetrics>,
) -> Router {
    let mut router = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .nest("/v1", v1::create_v1_router())
        .with_state(state);

    if let Some(metrics) = metrics {
        router = router.merge(create_metrics_router(metrics));
    }

    // Last layer added runs first
    router
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&server.cors_origins))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// Any origin without credentials when no origins are configured
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::PATCH,
            axum::http::Method::DELETE,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ])
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::state::test_support::{test_config, test_state};
    use crate::domain::llm::MockLlmProvider;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, HeaderMap, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(llm: MockLlmProvider) -> (Router, crate::infrastructure::storage::Repositories) {
        let (state, repos, _) = test_state(llm);
        (create_router(state, &test_config().server, None), repos)
    }

    fn replying() -> MockLlmProvider {
        MockLlmProvider::replying("Dear Professor,\n\nThank you for your time.", 80)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = tokio_test::assert_ok!(app.clone().oneshot(request).await);
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, headers, body)
    }

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", "203.0.113.9")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn with_bearer(mut request: Request<Body>, token: &str) -> Request<Body> {
        request.headers_mut().insert(
            header::AUTHORIZATION,
            format!("Bearer {}", token).parse().unwrap(),
        );
        request
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    /// Sign up and log in; returns the access token and the refresh cookie pair
    async fn login(app: &Router, email: &str) -> (String, String) {
        let (status, _, _) = send(
            app,
            json_request(
                Method::POST,
                "/v1/auth/signup",
                json!({"email": email, "password": "password123", "username": "kim"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, headers, body) = send(
            app,
            json_request(
                Method::POST,
                "/v1/auth/login",
                json!({"email": email, "password": "password123"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let cookie = headers
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string();

        (body["data"]["accessToken"].as_str().unwrap().to_string(), cookie)
    }

    #[tokio::test]
    async fn test_health_and_request_id() {
        let (app, _) = app(replying());

        let (status, headers, body) = send(&app, get("/health")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["data"]["status"], "up");
        assert!(headers.contains_key("x-request-id"));
        assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    }

    #[tokio::test]
    async fn test_ready_on_memory_backend() {
        let (app, _) = app(replying());

        let (status, _, body) = send(&app, get("/ready")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["storage"], "memory");
    }

    #[tokio::test]
    async fn test_guest_generation_and_daily_limit() {
        let (app, _) = app(replying());
        let body = json!({"draft": "hello professor about the exam", "language": "en"});

        for _ in 0..3 {
            let (status, _, response) = send(
                &app,
                json_request(Method::POST, "/v1/ai/generate-email", body.clone()),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(response["data"]["email"], "Dear Professor,\n\nThank you for your time.");
            assert_eq!(response["data"]["metadata"]["tokensUsed"], 80);
        }

        let (status, _, response) = send(
            &app,
            json_request(Method::POST, "/v1/ai/generate-email", body),
        )
        .await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response["ok"], false);
        assert_eq!(response["error"]["code"], "FORBIDDEN");
        assert!(response["error"]["details"]["retryAfterSeconds"].as_u64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_invalid_body_is_bad_request() {
        let (app, _) = app(replying());

        let (status, _, body) = send(
            &app,
            json_request(
                Method::POST,
                "/v1/ai/generate-email",
                json!({"draft": "short", "language": "en"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");

        let request = Request::builder()
            .method(Method::POST)
            .uri("/v1/ai/generate-email")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, _, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["ok"], false);

        let request = Request::builder()
            .method(Method::POST)
            .uri("/v1/notes")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, _, _) = send(&app, request).await;
        // Auth is checked before the body is read
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_auth_flow_and_refresh_rotation() {
        let (app, _) = app(replying());
        let (access, cookie) = login(&app, "kim@example.com").await;

        let (status, _, me) = send(&app, with_bearer(get("/v1/users/me"), &access)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["data"]["email"], "kim@example.com");
        assert_eq!(me["data"]["tier"], "free");
        assert_eq!(me["data"]["usage"]["dailyLimit"], 10);

        let refresh = |cookie: String| {
            Request::builder()
                .method(Method::POST)
                .uri("/v1/auth/refresh")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap()
        };

        let (status, headers, body) = send(&app, refresh(cookie.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["accessToken"].is_string());
        assert!(headers.contains_key(header::SET_COOKIE));

        // The rotated-out session cannot be replayed
        let (status, _, body) = send(&app, refresh(cookie)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_duplicate_signup_conflicts() {
        let (app, _) = app(replying());
        login(&app, "lee@example.com").await;

        let (status, _, body) = send(
            &app,
            json_request(
                Method::POST,
                "/v1/auth/signup",
                json!({"email": "LEE@example.com", "password": "password123"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["message"], "Email already in use");
    }

    #[tokio::test]
    async fn test_free_user_advanced_request_forbidden() {
        let (app, _) = app(replying());
        let (access, _) = login(&app, "park@example.com").await;

        let request = with_bearer(
            json_request(
                Method::POST,
                "/v1/ai/generate-email",
                json!({"draft": "hello professor about the exam", "language": "en", "tone": "formal"}),
            ),
            &access,
        );
        let (status, _, body) = send(&app, request).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_generation_archives_for_user() {
        let (app, repos) = app(replying());
        let (access, _) = login(&app, "choi@example.com").await;

        let request = with_bearer(
            json_request(
                Method::POST,
                "/v1/ai/generate-email",
                json!({"draft": "hello professor about the exam", "language": "en"}),
            ),
            &access,
        );
        let (status, _, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _, list) = send(&app, with_bearer(get("/v1/archives"), &access)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list["data"]["total"], 1);
        let id = list["data"]["items"][0]["id"].as_str().unwrap().to_string();

        let (status, _, one) = send(
            &app,
            with_bearer(get(&format!("/v1/archives/{}", id)), &access),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(one["data"]["tone"], "neutral");

        let user = repos
            .users
            .get_by_email("choi@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.credit_balance(), 0);
    }

    #[tokio::test]
    async fn test_archive_access_rules() {
        let (app, _) = app(replying());

        let (status, _, body) = send(&app, get("/v1/archives")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["ok"], false);

        let (access, _) = login(&app, "jung@example.com").await;
        let (status, _, _) = send(
            &app,
            with_bearer(get("/v1/archives/not-a-uuid"), &access),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _, _) = send(
            &app,
            with_bearer(
                get("/v1/archives?from=2025-02-01&to=2025-01-01"),
                &access,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_notes_crud_and_star() {
        let (app, _) = app(replying());
        let (access, _) = login(&app, "han@example.com").await;

        let (status, _, created) = send(
            &app,
            with_bearer(
                json_request(
                    Method::POST,
                    "/v1/notes",
                    json!({"term": "  at your earliest convenience ", "example": "Please reply at your earliest convenience."}),
                ),
                &access,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["data"]["term"], "at your earliest convenience");
        assert_eq!(created["data"]["isStarred"], false);
        let id = created["data"]["id"].as_str().unwrap().to_string();

        let star = Request::builder()
            .method(Method::PATCH)
            .uri(format!("/v1/notes/{}/star", id))
            .body(Body::empty())
            .unwrap();
        let (status, _, starred) = send(&app, with_bearer(star, &access)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(starred["data"]["isStarred"], true);

        let (status, _, list) = send(&app, with_bearer(get("/v1/notes?q=EARLIEST"), &access)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list["data"]["pagination"]["total"], 1);
        assert_eq!(list["data"]["pagination"]["totalPages"], 1);

        let delete = Request::builder()
            .method(Method::DELETE)
            .uri(format!("/v1/notes/{}", id))
            .body(Body::empty())
            .unwrap();
        let (status, _, _) = send(&app, with_bearer(delete, &access)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _, _) = send(
            &app,
            with_bearer(get(&format!("/v1/notes/{}", id)), &access),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_template_create_from_text() {
        let (app, _) = app(replying());
        let (access, _) = login(&app, "yoon@example.com").await;

        let (status, _, body) = send(
            &app,
            with_bearer(
                json_request(
                    Method::POST,
                    "/v1/templates",
                    json!({"title": "Exam question", "content": "Dear Professor, ...", "tone": "formal"}),
                ),
                &access,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["creditCharged"], 0);

        let (_, _, list) = send(&app, with_bearer(get("/v1/templates"), &access)).await;
        assert_eq!(list["data"]["total"], 1);
        assert_eq!(list["data"]["items"][0]["title"], "Exam question");
    }
}
