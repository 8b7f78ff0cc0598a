/// Integration tests for the TaskDeck API
///
/// These tests require a running PostgreSQL database.
/// Run with: cargo test --test integration_test -- --test-threads=1
///
/// They exercise the full stack end-to-end:
/// - Registration, login, and token-based auth
/// - The response envelope and error mapping
/// - Org-scoped task CRUD with role checks
/// - Notifications and pagination metadata

mod common;

use axum::http::StatusCode;
use common::{get_request, json_request, send, TestContext};
use serde_json::json;
use taskdeck_shared::models::user::Role;
use uuid::Uuid;

#[tokio::test]
async fn test_health_endpoint_is_flat() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = send(&ctx.app, get_request("/health", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
    // Not wrapped in the envelope
    assert!(body.get("success").is_none());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_register_first_user_becomes_admin() {
    let ctx = TestContext::new().await.unwrap();
    let suffix = Uuid::new_v4();

    let (status, body) = send(
        &ctx.app,
        json_request(
            "POST",
            "/v1/auth/register",
            None,
            json!({
                "name": "Founder",
                "email": format!("founder-{}@example.com", suffix),
                "password": "long-enough-password",
                "orgName": "Fresh Org",
                "orgSlug": format!("fresh-org-{}", suffix),
                "role": "member"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "body: {}", body);
    assert_eq!(body["success"], true);
    assert!(body["data"]["token"].is_string());
    // Requested role is ignored for the first user of an org
    assert_eq!(body["data"]["user"]["role"], "admin");
    assert!(
        body["data"]["user"].get("passwordHash").is_none(),
        "password hash must never be serialized"
    );

    // Second user of the same org defaults to member
    let (status, body) = send(
        &ctx.app,
        json_request(
            "POST",
            "/v1/auth/register",
            None,
            json!({
                "name": "Second",
                "email": format!("second-{}@example.com", suffix),
                "password": "long-enough-password",
                "orgName": "Fresh Org",
                "orgSlug": format!("fresh-org-{}", suffix)
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "body: {}", body);
    assert_eq!(body["data"]["user"]["role"], "member");

    // Cleanup the org created through the API
    sqlx::query("DELETE FROM organizations WHERE slug = $1")
        .bind(format!("fresh-org-{}", suffix))
        .execute(&ctx.db)
        .await
        .unwrap();

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_login_and_me() {
    let ctx = TestContext::new().await.unwrap();
    let suffix = Uuid::new_v4();
    let email = format!("login-{}@example.com", suffix);
    let slug = format!("login-org-{}", suffix);

    let (status, _) = send(
        &ctx.app,
        json_request(
            "POST",
            "/v1/auth/register",
            None,
            json!({
                "name": "Login Tester",
                "email": email,
                "password": "correct-password-1",
                "orgName": "Login Org",
                "orgSlug": slug
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Wrong password is a uniform 401
    let (status, body) = send(
        &ctx.app,
        json_request(
            "POST",
            "/v1/auth/login",
            None,
            json!({ "email": email, "password": "wrong-password-1", "orgSlug": slug }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Invalid email or password");

    // Correct password returns a usable token
    let (status, body) = send(
        &ctx.app,
        json_request(
            "POST",
            "/v1/auth/login",
            None,
            json!({ "email": email, "password": "correct-password-1", "orgSlug": slug }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "body: {}", body);
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let (status, body) = send(&ctx.app, get_request("/v1/auth/me", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], email.as_str());

    sqlx::query("DELETE FROM organizations WHERE slug = $1")
        .bind(&slug)
        .execute(&ctx.db)
        .await
        .unwrap();

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_requests_without_token_are_rejected() {
    let ctx = TestContext::new().await.unwrap();

    let uri = format!("/v1/orgs/{}/tasks", ctx.org.id);
    let (status, body) = send(&ctx.app, get_request(&uri, None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let ctx = TestContext::new().await.unwrap();

    let uri = format!("/v1/orgs/{}/tasks", ctx.org.id);
    let (status, body) = send(&ctx.app, get_request(&uri, Some("not-a-jwt"))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_create_and_list_tasks() {
    let ctx = TestContext::new().await.unwrap();

    let uri = format!("/v1/orgs/{}/tasks", ctx.org.id);
    let (status, body) = send(
        &ctx.app,
        json_request(
            "POST",
            &uri,
            Some(&ctx.admin_token),
            json!({
                "title": "Write the runbook",
                "description": "for on-call",
                "priority": "high",
                "tags": ["ops"]
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "body: {}", body);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "todo");
    assert_eq!(body["data"]["priority"], "high");
    assert_eq!(body["data"]["createdBy"], ctx.admin.id.to_string());

    let (status, body) = send(&ctx.app, get_request(&uri, Some(&ctx.admin_token))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["meta"]["page"], 1);
    assert_eq!(body["meta"]["total"], 1);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_empty_title_is_rejected() {
    let ctx = TestContext::new().await.unwrap();

    let uri = format!("/v1/orgs/{}/tasks", ctx.org.id);
    let (status, body) = send(
        &ctx.app,
        json_request(
            "POST",
            &uri,
            Some(&ctx.admin_token),
            json!({ "title": "   " }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_org_path_mismatch_is_forbidden() {
    let ctx = TestContext::new().await.unwrap();

    // The route names a different org than the token's
    let uri = format!("/v1/orgs/{}/tasks", Uuid::new_v4());
    let (status, body) = send(&ctx.app, get_request(&uri, Some(&ctx.admin_token))).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_unknown_task_is_not_found() {
    let ctx = TestContext::new().await.unwrap();

    let uri = format!("/v1/orgs/{}/tasks/{}", ctx.org.id, Uuid::new_v4());
    let (status, body) = send(&ctx.app, get_request(&uri, Some(&ctx.admin_token))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_member_cannot_manage_users() {
    let ctx = TestContext::new().await.unwrap();
    let (_, member_token) = ctx.create_user(Role::Member).await.unwrap();

    let uri = format!("/v1/orgs/{}/users", ctx.org.id);
    let (status, body) = send(&ctx.app, get_request(&uri, Some(&member_token))).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);

    // The admin can list users
    let (status, _) = send(&ctx.app, get_request(&uri, Some(&ctx.admin_token))).await;
    assert_eq!(status, StatusCode::OK);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_member_list_is_scoped_to_own_tasks() {
    let ctx = TestContext::new().await.unwrap();
    let (member, member_token) = ctx.create_user(Role::Member).await.unwrap();

    let uri = format!("/v1/orgs/{}/tasks", ctx.org.id);

    // Admin creates one unassigned task and one assigned to the member
    for body in [
        json!({ "title": "Admin's own" }),
        json!({ "title": "For the member", "assigneeId": member.id }),
    ] {
        let (status, resp) = send(
            &ctx.app,
            json_request("POST", &uri, Some(&ctx.admin_token), body),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "body: {}", resp);
    }

    // Admin sees both
    let (_, body) = send(&ctx.app, get_request(&uri, Some(&ctx.admin_token))).await;
    assert_eq!(body["meta"]["total"], 2);

    // Member sees only the task assigned to them
    let (_, body) = send(&ctx.app, get_request(&uri, Some(&member_token))).await;
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["title"], "For the member");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_assignment_creates_notification_and_unread_count() {
    let ctx = TestContext::new().await.unwrap();
    let (member, member_token) = ctx.create_user(Role::Member).await.unwrap();

    let (_, body) = send(
        &ctx.app,
        get_request("/v1/notifications/unread-count", Some(&member_token)),
    )
    .await;
    assert_eq!(body["data"]["unreadCount"], 0);

    let uri = format!("/v1/orgs/{}/tasks", ctx.org.id);
    let (status, _) = send(
        &ctx.app,
        json_request(
            "POST",
            &uri,
            Some(&ctx.admin_token),
            json!({ "title": "Check the logs", "assigneeId": member.id }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = send(
        &ctx.app,
        get_request("/v1/notifications/unread-count", Some(&member_token)),
    )
    .await;
    assert_eq!(body["data"]["unreadCount"], 1);

    // List carries the unread count in meta; mark-all clears it
    let (_, body) = send(
        &ctx.app,
        get_request("/v1/notifications", Some(&member_token)),
    )
    .await;
    assert_eq!(body["meta"]["unreadCount"], 1);

    let (status, _) = send(
        &ctx.app,
        json_request(
            "PUT",
            "/v1/notifications/read-all",
            Some(&member_token),
            json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(
        &ctx.app,
        get_request("/v1/notifications/unread-count", Some(&member_token)),
    )
    .await;
    assert_eq!(body["data"]["unreadCount"], 0);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_template_lifecycle_and_spawn() {
    let ctx = TestContext::new().await.unwrap();
    let (member, member_token) = ctx.create_user(Role::Member).await.unwrap();

    let templates_uri = format!("/v1/orgs/{}/templates", ctx.org.id);

    // Members cannot create templates
    let (status, _) = send(
        &ctx.app,
        json_request(
            "POST",
            &templates_uri,
            Some(&member_token),
            json!({ "name": "denied", "title": "Nope" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Admin creates one with a default assignee
    let (status, body) = send(
        &ctx.app,
        json_request(
            "POST",
            &templates_uri,
            Some(&ctx.admin_token),
            json!({
                "name": "weekly-report",
                "title": "Write weekly report",
                "description": "numbers and narrative",
                "priority": "high",
                "assigneeId": member.id
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "body: {}", body);
    let template_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["priority"], "high");

    // Duplicate name within the org conflicts
    let (status, _) = send(
        &ctx.app,
        json_request(
            "POST",
            &templates_uri,
            Some(&ctx.admin_token),
            json!({ "name": "weekly-report", "title": "Another" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Members can list templates
    let (status, body) = send(
        &ctx.app,
        get_request(&templates_uri, Some(&member_token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);

    // Spawning carries the template's fields onto a fresh todo task
    let spawn_uri = format!("/v1/orgs/{}/tasks/from-template", ctx.org.id);
    let (status, body) = send(
        &ctx.app,
        json_request(
            "POST",
            &spawn_uri,
            Some(&ctx.admin_token),
            json!({ "templateId": template_id }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "body: {}", body);
    assert_eq!(body["data"]["title"], "Write weekly report");
    assert_eq!(body["data"]["status"], "todo");
    assert_eq!(body["data"]["priority"], "high");
    assert_eq!(body["data"]["assigneeId"], member.id.to_string());

    // Unknown template is 404
    let (status, _) = send(
        &ctx.app,
        json_request(
            "POST",
            &spawn_uri,
            Some(&ctx.admin_token),
            json!({ "templateId": Uuid::new_v4() }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Delete; spawned tasks are unaffected
    let delete_uri = format!("{}/{}", templates_uri, template_id);
    let (status, _) = send(
        &ctx.app,
        json_request("DELETE", &delete_uri, Some(&ctx.admin_token), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let tasks_uri = format!("/v1/orgs/{}/tasks", ctx.org.id);
    let (status, body) = send(&ctx.app, get_request(&tasks_uri, Some(&ctx.admin_token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_csv_export_requires_permission() {
    let ctx = TestContext::new().await.unwrap();
    let (_, member_token) = ctx.create_user(Role::Member).await.unwrap();

    let uri = format!("/v1/orgs/{}/reports/export/csv", ctx.org.id);

    let (status, _) = send(&ctx.app, get_request(&uri, Some(&member_token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let response = {
        use tower::ServiceExt;
        ctx.app
            .clone()
            .oneshot(get_request(&uri, Some(&ctx.admin_token)))
            .await
            .unwrap()
    };
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/csv"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let csv = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(csv.starts_with(
        "ID,Title,Description,Status,Priority,Assignee,Created By,Due Date,Created At,Updated At"
    ));

    ctx.cleanup().await.unwrap();
}
