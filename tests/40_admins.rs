mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use common::{admin_body, send, test_config, TestServer};

#[tokio::test]
async fn admin_payloads_never_carry_the_password() -> Result<()> {
    let server = TestServer::start(test_config(false)).await?;

    let created = server
        .create_admin(admin_body("  Sana@Rio.PK ", "s3cret!", "admin", &["view_products", "edit_products"]))
        .await?;
    assert_eq!(created["email"], "sana@rio.pk");
    assert_eq!(created["status"], "active");
    assert_eq!(created["permissions"], json!(["view_products", "edit_products"]));
    assert!(created.get("password").is_none(), "{}", created);

    let (status, body) = send(server.get("/api/admins")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    for admin in body["data"].as_array().cloned().unwrap_or_default() {
        assert!(admin.get("password").is_none());
        assert!(admin.get("passwordHash").is_none());
    }

    let path = format!("/api/admins/{}", created["id"].as_str().unwrap_or_default());
    let (status, body) = send(server.get(&path)).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].get("password").is_none());

    Ok(())
}

#[tokio::test]
async fn duplicate_email_is_rejected_case_insensitively() -> Result<()> {
    let server = TestServer::start(test_config(false)).await?;
    server.create_admin(admin_body("ops@rio.pk", "s3cret!", "admin", &[])).await?;

    let (status, body) = send(server.post("/api/admins", &admin_body("OPS@rio.pk", "other-pass", "moderator", &[])))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "CONFLICT");
    assert_eq!(body["message"], "Admin with this email already exists");

    let (_, body) = send(server.get("/api/admins")).await?;
    assert_eq!(body["count"], 1);

    Ok(())
}

#[tokio::test]
async fn create_validates_fields() -> Result<()> {
    let server = TestServer::start(test_config(false)).await?;

    let (status, body) = send(server.post(
        "/api/admins",
        &json!({ "name": "Bilal", "email": "not-an-email", "password": "123", "role": "owner" }),
    ))
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["errors"].as_array().map(|e| e.len() >= 3).unwrap_or(false), "{}", body);

    Ok(())
}

#[tokio::test]
async fn update_without_password_keeps_the_credential() -> Result<()> {
    let server = TestServer::start(test_config(false)).await?;
    let created = server.create_admin(admin_body("hina@rio.pk", "first-pass", "admin", &[])).await?;
    let path = format!("/api/admins/{}", created["id"].as_str().unwrap_or_default());

    let (status, body) =
        send(server.put(&path, &json!({ "department": "Sales", "password": "", "role": "moderator" }))).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["department"], "Sales");
    assert_eq!(body["data"]["role"], "moderator");

    server.login("hina@rio.pk", "first-pass").await?;

    let (status, _) = send(server.put(&path, &json!({ "password": "second-pass" }))).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) =
        send(server.post("/api/auth/login", &json!({ "email": "hina@rio.pk", "password": "first-pass" }))).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    server.login("hina@rio.pk", "second-pass").await?;

    Ok(())
}

#[tokio::test]
async fn update_to_taken_email_conflicts() -> Result<()> {
    let server = TestServer::start(test_config(false)).await?;
    server.create_admin(admin_body("a@rio.pk", "s3cret!", "admin", &[])).await?;
    let b = server.create_admin(admin_body("b@rio.pk", "s3cret!", "admin", &[])).await?;
    let path = format!("/api/admins/{}", b["id"].as_str().unwrap_or_default());

    let (status, body) = send(server.put(&path, &json!({ "email": "A@rio.pk" }))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "CONFLICT");

    // Re-submitting its own address is not a conflict
    let (status, _) = send(server.put(&path, &json!({ "email": "b@rio.pk" }))).await?;
    assert_eq!(status, StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn delete_removes_the_admin() -> Result<()> {
    let server = TestServer::start(test_config(false)).await?;
    let created = server.create_admin(admin_body("temp@rio.pk", "s3cret!", "admin", &[])).await?;
    let path = format!("/api/admins/{}", created["id"].as_str().unwrap_or_default());

    let (status, body) = send(server.delete(&path)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Admin deleted successfully");
    assert_eq!(body["data"]["email"], "temp@rio.pk");

    let (status, _) = send(server.get(&path)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(server.delete(&path)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}
