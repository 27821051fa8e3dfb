//! Test backend and client wiring
//!
//! Spins up a small axum app that mimics the backend routes on an
//! OS-assigned port.

use axum::extract::{Multipart, Path};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use nutriadmin_client::{ApiClientConfig, ApiClients, ApiPaths};
use nutriadmin_session::{MemoryCookieJar, SessionConfig, SessionService};
use serde_json::{json, Value};
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tokio::net::TcpListener;

pub const VALID_TOKEN: &str = "header.payload.signature";
pub const PASSWORD: &str = "Nutri2024!";

static TRACING: LazyLock<()> = LazyLock::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_writer(std::io::sink)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
});

pub struct TestApp {
    pub address: String,
    pub session: Arc<SessionService>,
    pub clients: ApiClients,
}

impl TestApp {
    /// Clients with a custom JSON timeout, sharing this app's session
    pub fn clients_with_timeout(&self, timeout_seconds: u64) -> ApiClients {
        ApiClients::from_parts(
            ApiClientConfig::default()
                .with_base_url(&self.address)
                .with_timeout(timeout_seconds),
            ApiClientConfig::default().with_base_url(&self.address),
            ApiPaths::default(),
            self.session.clone(),
        )
        .expect("Failed to build clients")
    }
}

pub async fn spawn_app() -> TestApp {
    LazyLock::force(&TRACING);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, backend()).await.unwrap();
    });

    let address = format!("http://127.0.0.1:{}", port);
    let session = Arc::new(SessionService::new(
        Arc::new(MemoryCookieJar::new()),
        SessionConfig::default(),
    ));
    let clients = ApiClients::from_parts(
        ApiClientConfig::default().with_base_url(&address),
        ApiClientConfig::default()
            .with_base_url(&address)
            .with_timeout(30),
        ApiPaths::default(),
        session.clone(),
    )
    .expect("Failed to build clients");

    TestApp {
        address,
        session,
        clients,
    }
}

fn backend() -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/auth/admins", get(admins))
        .route("/auth/register/admin", post(register_admin))
        .route("/inventory/productos", get(products_down).post(create_product))
        .route("/inventory/productos/{id}", get(product).delete(delete_product))
        .route("/inventory/sabores", get(flavors))
        .route("/storage/upload", post(upload))
        .route("/storage/images/{id}", delete(delete_image))
        .route("/slow", get(slow))
        .route("/echo-auth", get(echo_auth))
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", VALID_TOKEN))
        .unwrap_or(false)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"message": "jwt expired"})),
    )
        .into_response()
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["password"] != json!(PASSWORD) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Credenciales inválidas"})),
        )
            .into_response();
    }
    Json(json!({
        "token": VALID_TOKEN,
        "user": {
            "_id": "65f1a2",
            "email": body["email"],
            "nombre": "Ana",
            "apellidoPaterno": "Lopez"
        }
    }))
    .into_response()
}

async fn me(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({"id": "65f1a2", "email": "ana@nutri.pe"})).into_response()
}

async fn admins(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({"data": [
        {"_id": "1", "email": "ana@nutri.pe", "nombre": "Ana", "apellidoPaterno": "Lopez",
         "departamento": "Ventas", "nivelAcceso": 3},
        {"_id": "2", "email": "bruno@nutri.pe", "nombre": "Bruno", "apellidoPaterno": "Rojas",
         "departamento": "Logística", "nivelAcceso": 5, "activo": false}
    ]}))
    .into_response()
}

async fn register_admin(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if body.get("dni").and_then(Value::as_str).map(str::len) != Some(8) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": ["dni must have 8 digits"]})),
        )
            .into_response();
    }
    let mut created = body;
    created["id"] = json!("99");
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn products_down() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"message": "database unavailable"})),
    )
        .into_response()
}

async fn create_product(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut created = body;
    created["id"] = json!(41);
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn product(Path(id): Path<String>) -> Response {
    if id == "missing" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Producto no encontrado"})),
        )
            .into_response();
    }
    Json(json!({"id": id, "nombre": "Whey Protein", "precio": 189.9, "stock": 12}))
        .into_response()
}

async fn delete_product(headers: HeaderMap, Path(_id): Path<String>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn flavors() -> Response {
    Json(json!([{"id": 1, "nombre": "Chocolate"}, {"id": 2, "nombre": "Vainilla"}]))
        .into_response()
}

async fn upload(headers: HeaderMap, mut multipart: Multipart) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let mut file_name = None;
    let mut size = 0;
    let mut folder = None;
    while let Some(field) = multipart.next_field().await.unwrap() {
        match field.name() {
            Some("file") => {
                file_name = field.file_name().map(str::to_string);
                size = field.bytes().await.unwrap().len();
            }
            Some("folder") => folder = Some(field.text().await.unwrap()),
            _ => {}
        }
    }

    let Some(file_name) = file_name else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "file is required"})),
        )
            .into_response();
    };
    let public_id = match &folder {
        Some(folder) => format!("{}/{}", folder, file_name),
        None => file_name.clone(),
    };

    Json(json!({
        "secure_url": format!("https://cdn.nutri.pe/{}", public_id),
        "public_id": public_id,
        "size": size,
        "requestContentType": content_type
    }))
    .into_response()
}

async fn delete_image(headers: HeaderMap, Path(id): Path<String>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({"deleted": id})).into_response()
}

async fn slow() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(3)).await;
    Json(json!({"ok": true}))
}

async fn echo_auth(headers: HeaderMap) -> Json<Value> {
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    Json(json!({"authorization": authorization}))
}
