use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::Context;
use axum::{
    Router,
    extract::State,
    http::{self, HeaderName, HeaderValue, Method},
    routing::get,
};
use platform_api::ApiResponse;
use platform_db::DbPool;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::{config::AppConfig, employees};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<AppConfig>,
}

#[derive(Clone, Debug)]
pub struct ServeConfig {
    addr: SocketAddr,
}

impl ServeConfig {
    pub fn new(host: IpAddr, port: u16) -> Self {
        Self {
            addr: SocketAddr::from((host, port)),
        }
    }
}

pub async fn serve(config: ServeConfig, state: AppState) -> anyhow::Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    info!(%config.addr, "employee directory listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();
    let allow_origin = if allowed.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed)
    };
    CorsLayer::new()
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .expose_headers([http::header::LOCATION])
        .allow_origin(allow_origin)
}

pub fn build_router(state: AppState) -> Router {
    let request_id = MakeRequestUuid;
    let header_name = HeaderName::from_static("x-request-id");
    Router::new()
        .route("/health", get(health_handler))
        .merge(employees::routes())
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(header_name.clone(), request_id))
                .layer(PropagateRequestIdLayer::new(header_name))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.cors_allowed_origins)),
        )
        .with_state(state)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthPayload {
    ok: bool,
    db_ok: bool,
    version: &'static str,
}

async fn health_handler(State(state): State<AppState>) -> ApiResponse<HealthPayload> {
    let db_ok = state.pool.ping().await.is_ok();
    ApiResponse::ok(HealthPayload {
        ok: db_ok,
        db_ok,
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        signal(SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{HeaderMap, Request, StatusCode, header},
    };
    use http_body_util::BodyExt;
    use migration::{Migrator, MigratorTrait};
    use platform_db::employees as repo;
    use sea_orm::Database;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        pool: DbPool,
    }

    struct Reply {
        status: StatusCode,
        headers: HeaderMap,
        body: Value,
    }

    impl TestApp {
        async fn new() -> Self {
            let pool = Database::connect("sqlite::memory:").await.unwrap();
            Migrator::up(&pool, None).await.unwrap();
            let router = build_router(AppState {
                pool: pool.clone(),
                config: Arc::new(AppConfig::default()),
            });
            Self { router, pool }
        }

        async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> Reply {
            let builder = Request::builder().method(method).uri(uri);
            let request = match body {
                Some(json) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json.to_string())),
                None => builder.body(Body::empty()),
            }
            .unwrap();
            self.send_request(request).await
        }

        async fn send_request(&self, request: Request<Body>) -> Reply {
            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let headers = response.headers().clone();
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let body = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            Reply {
                status,
                headers,
                body,
            }
        }

        async fn create(&self, name: &str, salary: f64) -> Value {
            let reply = self
                .send(
                    Method::POST,
                    "/employees",
                    Some(json!({
                        "name": name,
                        "email": format!("{}@example.com", name.to_lowercase()),
                        "salary": salary,
                    })),
                )
                .await;
            assert_eq!(reply.status, StatusCode::CREATED);
            reply.body["data"].clone()
        }

        async fn stored_count(&self) -> u64 {
            repo::count(&self.pool).await.unwrap()
        }
    }

    fn names(body: &Value) -> Vec<String> {
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|row| row["name"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn create_echoes_input_and_exposes_location() {
        let app = TestApp::new().await;
        let reply = app
            .send(
                Method::POST,
                "/employees",
                Some(json!({
                    "name": "Ann",
                    "email": "ann@example.com",
                    "phone": "555-0100",
                    "salary": 1250.5
                })),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED);
        assert_eq!(reply.body["isSuccess"], true);
        assert_eq!(reply.body["message"], "Employee created successfully.");
        let created = &reply.body["data"];
        assert_eq!(created["name"], "Ann");
        assert_eq!(created["email"], "ann@example.com");
        assert_eq!(created["phone"], "555-0100");
        assert_eq!(created["salary"], 1250.5);

        let id = created["id"].as_str().unwrap();
        assert_eq!(
            reply.headers.get(header::LOCATION).unwrap(),
            &format!("/employees/{id}")
        );

        let fetched = app.send(Method::GET, &format!("/employees/{id}"), None).await;
        assert_eq!(fetched.status, StatusCode::OK);
        assert_eq!(&fetched.body["data"], created);

        let by_query = app
            .send(Method::GET, &format!("/employees/ByIdQuery?id={id}"), None)
            .await;
        assert_eq!(by_query.status, StatusCode::OK);
        assert_eq!(&by_query.body["data"], created);
    }

    #[tokio::test]
    async fn invalid_create_persists_nothing() {
        let app = TestApp::new().await;
        let missing_email = app
            .send(
                Method::POST,
                "/employees",
                Some(json!({"name": "Ann", "salary": 10})),
            )
            .await;
        assert_eq!(missing_email.status, StatusCode::BAD_REQUEST);
        assert_eq!(missing_email.body["isSuccess"], false);
        assert_eq!(
            missing_email.body["data"]["email"],
            json!(["Email is required."])
        );

        let malformed = app
            .send(
                Method::POST,
                "/employees",
                Some(json!({"name": "A", "email": "nope", "salary": -5})),
            )
            .await;
        assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            malformed.body["data"],
            json!({
                "email": ["Invalid email address format."],
                "name": ["Name must be at least 2 characters."],
                "salary": ["Salary must be a positive value."]
            })
        );
        assert_eq!(app.stored_count().await, 0);
    }

    #[tokio::test]
    async fn undecodable_body_is_a_bad_request() {
        let app = TestApp::new().await;
        let request = Request::builder()
            .method(Method::POST)
            .uri("/employees")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let reply = app.send_request(request).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert_eq!(reply.body["isSuccess"], false);
        assert_eq!(app.stored_count().await, 0);
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let app = TestApp::new().await;
        let missing = format!("/employees/{}", uuid::Uuid::new_v4());
        for uri in [missing.as_str(), "/employees/not-a-uuid", "/employees/ByIdQuery"] {
            let reply = app.send(Method::GET, uri, None).await;
            assert_eq!(reply.status, StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(reply.body["message"], "Employee not found!");
        }

        let put = app
            .send(
                Method::PUT,
                &missing,
                Some(json!({"name": "Ann", "email": "ann@example.com", "salary": 1})),
            )
            .await;
        assert_eq!(put.status, StatusCode::NOT_FOUND);
        let patch = app.send(Method::PATCH, &missing, Some(json!([]))).await;
        assert_eq!(patch.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_all_succeeds_when_empty() {
        let app = TestApp::new().await;
        let reply = app.send(Method::GET, "/employees", None).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["data"], json!([]));
    }

    #[tokio::test]
    async fn full_update_replaces_every_field() {
        let app = TestApp::new().await;
        let created = app
            .send(
                Method::POST,
                "/employees",
                Some(json!({
                    "name": "Ann",
                    "email": "ann@example.com",
                    "phone": "555-0100",
                    "salary": 100
                })),
            )
            .await
            .body["data"]
            .clone();
        let uri = format!("/employees/{}", created["id"].as_str().unwrap());

        let reply = app
            .send(
                Method::PUT,
                &uri,
                Some(json!({"name": "Annie", "email": "annie@example.com", "salary": 200})),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["data"]["id"], created["id"]);
        assert_eq!(reply.body["data"]["name"], "Annie");
        assert_eq!(reply.body["data"]["phone"], Value::Null);
        assert_eq!(reply.body["data"]["salary"], 200.0);

        let invalid = app
            .send(
                Method::PUT,
                &uri,
                Some(json!({"name": "Annie", "salary": 200})),
            )
            .await;
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
        let fetched = app.send(Method::GET, &uri, None).await;
        assert_eq!(fetched.body["data"], reply.body["data"]);
    }

    #[tokio::test]
    async fn patch_applies_operations_in_order() {
        let app = TestApp::new().await;
        let created = app.create("Ann", 100.0).await;
        let uri = format!("/employees/{}", created["id"].as_str().unwrap());

        let unchanged = app.send(Method::PATCH, &uri, Some(json!([]))).await;
        assert_eq!(unchanged.status, StatusCode::OK);
        assert_eq!(unchanged.body["data"], created);

        let reply = app
            .send(
                Method::PATCH,
                &uri,
                Some(json!([
                    {"op": "replace", "path": "/salary", "value": 150},
                    {"op": "add", "path": "/phone", "value": "555-0101"}
                ])),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["data"]["salary"], 150.0);
        assert_eq!(reply.body["data"]["phone"], "555-0101");
        assert_eq!(reply.body["data"]["name"], "Ann");
    }

    #[tokio::test]
    async fn invalid_patch_leaves_record_untouched() {
        let app = TestApp::new().await;
        let created = app.create("Ann", 100.0).await;
        let uri = format!("/employees/{}", created["id"].as_str().unwrap());

        let reply = app
            .send(
                Method::PATCH,
                &uri,
                Some(json!([
                    {"op": "replace", "path": "/salary", "value": 999},
                    {"op": "replace", "path": "/name", "value": "A"}
                ])),
            )
            .await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            reply.body["data"]["name"],
            json!(["Name must be at least 2 characters."])
        );

        let bad_path = app
            .send(
                Method::PATCH,
                &uri,
                Some(json!([{"op": "replace", "path": "/id", "value": "x"}])),
            )
            .await;
        assert_eq!(bad_path.status, StatusCode::BAD_REQUEST);

        let fetched = app.send(Method::GET, &uri, None).await;
        assert_eq!(fetched.body["data"], created);
    }

    #[tokio::test]
    async fn second_delete_is_not_found() {
        let app = TestApp::new().await;
        let created = app.create("Ann", 100.0).await;
        let uri = format!("/employees/{}", created["id"].as_str().unwrap());

        let first = app.send(Method::DELETE, &uri, None).await;
        assert_eq!(first.status, StatusCode::NO_CONTENT);
        assert_eq!(first.body, Value::Null);

        let second = app.send(Method::DELETE, &uri, None).await;
        assert_eq!(second.status, StatusCode::NOT_FOUND);
        assert_eq!(second.body["message"], "Employee not found!");
        assert_eq!(app.stored_count().await, 0);
    }

    #[tokio::test]
    async fn sort_orders_by_salary() {
        let app = TestApp::new().await;
        for (name, salary) in [("Cy", 300.0), ("Al", 100.0), ("Bo", 200.0)] {
            app.create(name, salary).await;
        }
        let cases = [
            ("/employees/sort?sort=asc", ["Al", "Bo", "Cy"]),
            ("/employees/sort?sort=desc", ["Cy", "Bo", "Al"]),
            ("/employees/sort?sort=DeSc", ["Cy", "Bo", "Al"]),
            ("/employees/sort?sort=xyz", ["Al", "Bo", "Cy"]),
            ("/employees/sort", ["Al", "Bo", "Cy"]),
        ];
        for (uri, expected) in cases {
            let reply = app.send(Method::GET, uri, None).await;
            assert_eq!(reply.status, StatusCode::OK, "{uri}");
            assert_eq!(names(&reply.body), expected, "{uri}");
        }
    }

    #[tokio::test]
    async fn name_filter_reports_empty_results_as_not_found() {
        let app = TestApp::new().await;
        for name in ["Ann", "Bob", "Anna"] {
            app.create(name, 10.0).await;
        }

        let reply = app.send(Method::GET, "/employees/list?name=an", None).await;
        assert_eq!(reply.status, StatusCode::OK);
        let mut found = names(&reply.body);
        found.sort();
        assert_eq!(found, ["Ann", "Anna"]);

        let everyone = app.send(Method::GET, "/employees/list?name=", None).await;
        assert_eq!(names(&everyone.body).len(), 3);

        let none = app.send(Method::GET, "/employees/list?name=zzz", None).await;
        assert_eq!(none.status, StatusCode::NOT_FOUND);
        assert_eq!(none.body["message"], "No result for query 'zzz'");
        assert_eq!(none.body["data"], Value::Null);
    }

    #[tokio::test]
    async fn health_reports_database_state() {
        let app = TestApp::new().await;
        let reply = app.send(Method::GET, "/health", None).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["data"]["dbOk"], true);
        assert!(reply.headers.contains_key("x-request-id"));
    }
}
