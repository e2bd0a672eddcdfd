mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use rio_api::app::AppState;

use common::{accessory, admin_body, seed_super_admin, send, test_config, TestServer};

async fn enforced() -> Result<TestServer> {
    let state = AppState::in_memory(test_config(true));
    seed_super_admin(&state, "root@rio.pk", "root-pass").await?;
    TestServer::start_with_state(state).await
}

#[tokio::test]
async fn login_issues_token_and_stamps_last_login() -> Result<()> {
    let server = enforced().await?;

    let (status, body) =
        send(server.post("/api/auth/login", &json!({ "email": "ROOT@rio.pk", "password": "root-pass" }))).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(body["data"]["token"].as_str().map(|t| !t.is_empty()).unwrap_or(false));
    assert_eq!(body["data"]["expiresIn"], 168 * 3600);
    assert_eq!(body["data"]["admin"]["email"], "root@rio.pk");
    assert!(body["data"]["admin"]["lastLogin"].is_string(), "{}", body);
    assert!(body["data"]["admin"].get("password").is_none());

    let token = body["data"]["token"].as_str().unwrap_or_default();
    let (status, body) = send(server.get("/api/auth/whoami").bearer_auth(token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "root@rio.pk");
    assert_eq!(body["data"]["role"], "super_admin");
    assert_eq!(body["data"]["permissions"], json!(["super_admin"]));

    Ok(())
}

#[tokio::test]
async fn bad_credentials_are_indistinguishable() -> Result<()> {
    let server = enforced().await?;

    let (status, wrong_password) =
        send(server.post("/api/auth/login", &json!({ "email": "root@rio.pk", "password": "nope-nope" }))).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, unknown_email) =
        send(server.post("/api/auth/login", &json!({ "email": "ghost@rio.pk", "password": "nope-nope" }))).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password["message"], unknown_email["message"]);

    let (status, _) = send(server.post("/api/auth/login", &json!({ "email": "root@rio.pk" }))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn inactive_admin_cannot_log_in() -> Result<()> {
    let server = enforced().await?;
    let token = server.login("root@rio.pk", "root-pass").await?;

    let mut body = admin_body("paused@rio.pk", "paused-pass", "admin", &["view_products"]);
    body["status"] = json!("inactive");
    let (status, created) = send(server.post("/api/admins", &body).bearer_auth(&token)).await?;
    assert_eq!(status, StatusCode::CREATED, "{}", created);

    let (status, body) =
        send(server.post("/api/auth/login", &json!({ "email": "paused@rio.pk", "password": "paused-pass" }))).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    Ok(())
}

#[tokio::test]
async fn gated_routes_require_a_valid_token() -> Result<()> {
    let server = enforced().await?;

    // Catalog reads stay public
    let (status, _) = send(server.get("/api/products")).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(server.post("/api/products", &accessory("Case", "Spigen", 1500, 5))).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = send(server.get("/api/admins")).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(server.get("/api/admins").bearer_auth("not.a.token")).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(server.get("/api/auth/whoami")).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn permissions_gate_each_operation() -> Result<()> {
    let server = enforced().await?;
    let root = server.login("root@rio.pk", "root-pass").await?;

    let (status, _) = send(
        server
            .post("/api/admins", &admin_body("clerk@rio.pk", "clerk-pass", "admin", &["view_products", "add_products"]))
            .bearer_auth(&root),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    let clerk = server.login("clerk@rio.pk", "clerk-pass").await?;

    let (status, body) =
        send(server.post("/api/products", &accessory("Case", "Spigen", 1500, 5)).bearer_auth(&clerk)).await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let path = format!("/api/products/{}", body["data"]["id"].as_str().unwrap_or_default());

    let (status, _) = send(server.get("/api/products/stats/overview").bearer_auth(&clerk)).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(server.put(&path, &json!({ "price": 1400 })).bearer_auth(&clerk)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Permission 'edit_products' required");

    let (status, _) = send(server.delete(&path).bearer_auth(&clerk)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(server.get("/api/admins").bearer_auth(&clerk)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The super admin sentinel passes every gate
    let (status, _) = send(server.put(&path, &json!({ "price": 1400 })).bearer_auth(&root)).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(server.delete(&path).bearer_auth(&root)).await?;
    assert_eq!(status, StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn enforcement_off_leaves_routes_open() -> Result<()> {
    let server = TestServer::start(test_config(false)).await?;

    let (status, _) = send(server.get("/api/admins")).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(server.get("/api/products/stats/overview")).await?;
    assert_eq!(status, StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn health_and_root_describe_the_service() -> Result<()> {
    let server = TestServer::start(test_config(false)).await?;

    let (status, body) = send(server.get("/health")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");

    let (status, body) = send(server.get("/")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Rio Mobile API");

    Ok(())
}
