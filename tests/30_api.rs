mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use backoffice_api::authz::Role;

async fn body_json(response: axum::response::Response) -> Result<Value> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn get(uri: String, auth: Option<String>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    builder.body(Body::empty()).expect("request")
}

fn post_json(uri: String, auth: String, payload: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", auth)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request")
}

#[tokio::test]
async fn root_describes_the_service() -> Result<()> {
    let (app, _) = common::test_app();

    let response = app.oneshot(get("/".to_string(), None)).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "Backoffice API");
    Ok(())
}

#[tokio::test]
async fn protected_routes_reject_missing_and_malformed_tokens() -> Result<()> {
    let (app, _) = common::test_app();

    let response = app
        .clone()
        .oneshot(get("/api/navigation".to_string(), None))
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(get(
            "/api/navigation".to_string(),
            Some("Bearer not-a-jwt".to_string()),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

fn section_titles(body: &Value) -> Vec<String> {
    body["data"]["sections"]
        .as_array()
        .expect("sections array")
        .iter()
        .map(|s| s["title"].as_str().expect("title").to_string())
        .collect()
}

#[tokio::test]
async fn global_navigation_is_shaped_by_the_callers_role() -> Result<()> {
    let (app, directory) = common::test_app();
    let user_id = common::seed_user(&directory, "user");
    let dev_id = common::seed_user(&directory, "dev");

    let response = app
        .clone()
        .oneshot(get(
            "/api/navigation".to_string(),
            Some(common::bearer(user_id, Role::User)),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await?;
    let titles = section_titles(&body);
    assert!(titles.iter().any(|t| t == "Overview"));
    assert!(!titles.iter().any(|t| t == "Platform"));

    let response = app
        .oneshot(get(
            "/api/navigation".to_string(),
            Some(common::bearer(dev_id, Role::Dev)),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await?;
    assert!(section_titles(&body).iter().any(|t| t == "Platform"));
    Ok(())
}

#[tokio::test]
async fn tokens_for_unknown_users_get_forbidden() -> Result<()> {
    let (app, _) = common::test_app();

    let response = app
        .oneshot(get(
            "/api/navigation".to_string(),
            Some(common::bearer(Uuid::new_v4(), Role::User)),
        ))
        .await?;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn organization_navigation_requires_standing() -> Result<()> {
    let (app, directory) = common::test_app();
    let owner_id = common::seed_user(&directory, "user");
    let outsider_id = common::seed_user(&directory, "user");
    let org = Uuid::new_v4();
    common::seed_membership(&directory, owner_id, org, "owner", "active");

    let response = app
        .clone()
        .oneshot(get(
            format!("/api/orgs/{}/navigation", org),
            Some(common::bearer(owner_id, Role::User)),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await?;
    assert!(section_titles(&body).iter().any(|t| t == "Organization"));

    let response = app
        .oneshot(get(
            format!("/api/orgs/{}/navigation", org),
            Some(common::bearer(outsider_id, Role::User)),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn presigned_uploads_are_gated_and_namespaced() -> Result<()> {
    let (app, directory) = common::test_app();
    let member_id = common::seed_user(&directory, "user");
    let invited_id = common::seed_user(&directory, "user");
    let org = Uuid::new_v4();
    common::seed_membership(&directory, member_id, org, "member", "active");
    common::seed_membership(&directory, invited_id, org, "member", "pending");

    let payload = json!({ "filename": "menu.pdf", "content_type": "application/pdf" });

    let response = app
        .clone()
        .oneshot(post_json(
            format!("/api/orgs/{}/uploads/presign", org),
            common::bearer(member_id, Role::User),
            &payload,
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await?;
    let key = body["data"]["key"].as_str().expect("key");
    assert!(key.starts_with(&org.to_string()));
    assert!(key.ends_with("/menu.pdf"));
    assert!(body["data"]["upload_url"]
        .as_str()
        .expect("upload_url")
        .contains("mock-bucket"));

    // A pending membership confers nothing
    let response = app
        .oneshot(post_json(
            format!("/api/orgs/{}/uploads/presign", org),
            common::bearer(invited_id, Role::User),
            &payload,
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn impersonation_endpoint_refuses_non_devs_and_self_targets() -> Result<()> {
    let (app, directory) = common::test_app();
    let admin_id = common::seed_user(&directory, "admin");
    let dev_id = common::seed_user(&directory, "dev");
    let target_id = common::seed_user(&directory, "user");

    // Global admins are not enough; impersonation is dev-only
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/admin/impersonate".to_string(),
            common::bearer(admin_id, Role::Admin),
            &json!({ "target_user_id": target_id, "reason": "support" }),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Acting on yourself is refused outright
    let response = app
        .oneshot(post_json(
            "/api/admin/impersonate".to_string(),
            common::bearer(dev_id, Role::Dev),
            &json!({ "target_user_id": dev_id, "reason": "testing" }),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn audit_log_is_dev_only() -> Result<()> {
    let (app, directory) = common::test_app();
    let admin_id = common::seed_user(&directory, "admin");

    let response = app
        .oneshot(get(
            "/api/admin/audit".to_string(),
            Some(common::bearer(admin_id, Role::Admin)),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    Ok(())
}
