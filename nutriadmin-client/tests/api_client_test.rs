//! End-to-end client behavior against a local test backend

mod helpers;

use helpers::{spawn_app, PASSWORD, VALID_TOKEN};
use nutriadmin_client::{AdminFilter, Catalog, ClientError};
use nutriadmin_session::UserRecord;
use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};

#[tokio::test]
async fn login_starts_session_with_token_and_user() {
    let app = spawn_app().await;

    let user = app
        .clients
        .auth()
        .login("ana@nutri.pe", PASSWORD)
        .await
        .expect("login should succeed");

    assert_eq!(user.id, "65f1a2");
    assert_eq!(user.display_name(), "Ana Lopez");
    assert_eq!(app.session.get_token().unwrap().as_deref(), Some(VALID_TOKEN));
    assert_eq!(app.session.get_user().unwrap(), Some(user));
    assert!(app.session.is_authenticated().unwrap());
}

#[tokio::test]
async fn failed_login_leaves_no_session() {
    let app = spawn_app().await;

    let err = app
        .clients
        .auth()
        .login("ana@nutri.pe", "wrong")
        .await
        .unwrap_err();

    match err {
        ClientError::Unauthorized { message, .. } => {
            assert_eq!(message, "Credenciales inválidas")
        }
        other => panic!("Expected Unauthorized, got {:?}", other),
    }
    assert!(!app.session.is_authenticated().unwrap());
}

#[tokio::test]
async fn bearer_header_follows_session_token() {
    let app = spawn_app().await;

    let anonymous: Value = app.clients.json_client().get("/echo-auth").await.unwrap();
    assert_eq!(anonymous["authorization"], Value::Null);

    app.session.set_token("some.jwt.value").unwrap();
    let authed: Value = app.clients.json_client().get("/echo-auth").await.unwrap();
    assert_eq!(authed["authorization"], json!("Bearer some.jwt.value"));

    // the multipart client reads the same session
    app.session.remove_token().unwrap();
    let form = Form::new().text("folder", "x");
    let err = app
        .clients
        .multipart_client()
        .post_multipart::<Value>("/storage/upload", form)
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn unauthorized_clears_session_and_propagates() {
    let app = spawn_app().await;
    app.session
        .start_session("stale.token.value", UserRecord::new("65f1a2"))
        .unwrap();

    let err = app.clients.auth().list_admins().await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(err.status(), Some(401));
    assert_eq!(app.session.get_token().unwrap(), None);
    assert_eq!(app.session.get_user().unwrap(), None);
    assert!(!app.session.is_authenticated().unwrap());
}

#[tokio::test]
async fn other_errors_keep_the_session() {
    let app = spawn_app().await;
    app.clients.auth().login("ana@nutri.pe", PASSWORD).await.unwrap();

    let err = app.clients.inventory().list_products().await.unwrap_err();
    match &err {
        ClientError::Http {
            status, message, ..
        } => {
            assert_eq!(*status, 500);
            assert_eq!(message, "database unavailable");
        }
        other => panic!("Expected Http error, got {:?}", other),
    }
    assert!(err.is_transient());

    let missing = app
        .clients
        .inventory()
        .get_product("missing")
        .await
        .unwrap_err();
    assert!(missing.is_not_found());

    assert!(app.session.is_authenticated().unwrap());
}

#[tokio::test]
async fn admin_listing_unwraps_data_and_filters() {
    let app = spawn_app().await;
    app.clients.auth().login("ana@nutri.pe", PASSWORD).await.unwrap();

    let admins = app.clients.auth().list_admins().await.unwrap();
    assert_eq!(admins.len(), 2);

    let logistics = app
        .clients
        .auth()
        .find_admins(&AdminFilter::default().department("logística"))
        .await
        .unwrap();
    assert_eq!(logistics.len(), 1);
    assert_eq!(logistics[0].full_name(), "Bruno Rojas");

    let active = app
        .clients
        .auth()
        .find_admins(&AdminFilter::default().active(true))
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].email, "ana@nutri.pe");
}

#[tokio::test]
async fn register_admin_surfaces_validation_messages() {
    let app = spawn_app().await;
    app.clients.auth().login("ana@nutri.pe", PASSWORD).await.unwrap();

    let created = app
        .clients
        .auth()
        .register_admin(&json!({
            "email": "luis@nutri.pe",
            "dni": "87654321",
            "password": "secreto123",
            "nombre": "Luis",
            "apellidoPaterno": "Torres",
            "apellidoMaterno": "Vega"
        }))
        .await
        .unwrap();
    assert_eq!(created["id"], json!("99"));

    let err = app
        .clients
        .auth()
        .register_admin(&json!({"dni": "123"}))
        .await
        .unwrap_err();
    match err {
        ClientError::Http {
            status, message, ..
        } => {
            assert_eq!(status, 400);
            assert_eq!(message, "dni must have 8 digits");
        }
        other => panic!("Expected Http error, got {:?}", other),
    }
}

#[tokio::test]
async fn upload_sends_multipart_with_file_and_folder() {
    let app = spawn_app().await;
    app.clients.auth().login("ana@nutri.pe", PASSWORD).await.unwrap();

    let image = app
        .clients
        .storage()
        .upload_image("whey.png", vec![0x89, 0x50, 0x4e, 0x47], Some("productos"))
        .await
        .unwrap();
    assert_eq!(image.url, "https://cdn.nutri.pe/productos/whey.png");
    assert_eq!(image.public_id.as_deref(), Some("productos/whey.png"));

    let part = Part::bytes(vec![1, 2, 3]).file_name("raw.bin");
    let echoed: Value = app
        .clients
        .multipart_client()
        .post_multipart("/storage/upload", Form::new().part("file", part))
        .await
        .unwrap();
    let content_type = echoed["requestContentType"].as_str().unwrap();
    assert!(content_type.starts_with("multipart/form-data; boundary="));
    assert_eq!(echoed["size"], json!(3));

    app.clients
        .storage()
        .delete_image("productos/whey.png")
        .await
        .unwrap();
}

#[tokio::test]
async fn upload_rejects_empty_file_without_calling_backend() {
    let app = spawn_app().await;

    let err = app
        .clients
        .storage()
        .upload_image("empty.png", Vec::new(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidRequest { .. }));
}

#[tokio::test]
async fn inventory_round_trip() {
    let app = spawn_app().await;
    app.clients.auth().login("ana@nutri.pe", PASSWORD).await.unwrap();

    let created = app
        .clients
        .inventory()
        .create_product(&json!({"nombre": "Creatina", "precio": 79.5, "stock": 30}))
        .await
        .unwrap();
    assert_eq!(created.id, "41");
    assert_eq!(created.stock, Some(30));

    let fetched = app.clients.inventory().get_product("7").await.unwrap();
    assert_eq!(fetched.nombre, "Whey Protein");

    app.clients.inventory().delete_product("41").await.unwrap();

    let flavors = app
        .clients
        .inventory()
        .list_catalog(Catalog::Flavors)
        .await
        .unwrap();
    let names: Vec<_> = flavors.iter().map(|f| f.nombre.as_str()).collect();
    assert_eq!(names, vec!["Chocolate", "Vainilla"]);
}

#[tokio::test]
async fn slow_backend_times_out() {
    let app = spawn_app().await;
    let clients = app.clients_with_timeout(1);

    let err = clients
        .json_client()
        .get::<Value>("/slow")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Timeout { .. }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn logout_clears_local_session() {
    let app = spawn_app().await;
    app.clients.auth().login("ana@nutri.pe", PASSWORD).await.unwrap();

    let me = app.clients.auth().me().await.unwrap();
    assert_eq!(me.email(), Some("ana@nutri.pe"));

    app.clients.auth().logout().unwrap();
    assert!(!app.session.is_authenticated().unwrap());

    let err = app.clients.auth().me().await.unwrap_err();
    assert!(err.is_unauthorized());
}
